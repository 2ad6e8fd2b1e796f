//! Analysis pipeline: calendar, race fields, per-horse history,
//! scoring and betting recommendations.
//!
//! Failures are scoped to the narrowest unit they affect. A horse with
//! no retrievable form drops out of scoring; a race or track that
//! cannot be processed carries its own error; only a calendar failure
//! fails the whole report.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Datelike, NaiveDate};
use futures::future::join_all;
use tracing::{info, warn};

use crate::betting;
use crate::config::AppConfig;
use crate::fetcher::DocumentFetcher;
use crate::form;
use crate::scoring::{self, ScoringContext};
use crate::scraper::{
    self,
    parsers::{CalendarParser, HorseHistoryParser, PremiershipParser, RaceFieldsParser},
};
use crate::types::{
    AnalysisReport, HorseForm, PremiershipEntry, Race, RaceAnalysis, Track, TrackAnalysis,
};

/// Jockey and trainer premiership tables for one state, loaded once per
/// analysis pass and shared read-only across every race.
#[derive(Debug, Default)]
struct StateRankings {
    jockeys: Vec<PremiershipEntry>,
    trainers: Vec<PremiershipEntry>,
}

pub struct Analyzer {
    fetcher: Arc<dyn DocumentFetcher>,
    config: Arc<AppConfig>,
}

impl Analyzer {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, config: AppConfig) -> Self {
        Self {
            fetcher,
            config: Arc::new(config),
        }
    }

    /// List the tracks racing on `date`.
    pub async fn list_tracks(&self, date: NaiveDate) -> anyhow::Result<Vec<Track>> {
        let url = scraper::calendar_url(date.year(), date.month());
        let html = self.fetcher.fetch(&url).await?;
        Ok(CalendarParser::parse(&html, date))
    }

    /// Run the full pipeline for `date`, optionally restricted to one
    /// track by name.
    pub async fn analyse(&self, date: NaiveDate, track_filter: Option<&str>) -> AnalysisReport {
        let started = Instant::now();

        let (tracks, error) = match self.analyse_tracks(date, track_filter).await {
            Ok(tracks) => (tracks, None),
            Err(e) => (Vec::new(), Some(format!("{e:#}"))),
        };

        AnalysisReport {
            date,
            tracks,
            elapsed_ms: started.elapsed().as_millis() as u64,
            error,
        }
    }

    async fn analyse_tracks(
        &self,
        date: NaiveDate,
        track_filter: Option<&str>,
    ) -> anyhow::Result<Vec<TrackAnalysis>> {
        let mut tracks = self.list_tracks(date).await?;
        if let Some(name) = track_filter {
            tracks.retain(|t| t.name.eq_ignore_ascii_case(name));
        }
        info!(date = %date, tracks = tracks.len(), "starting analysis");

        let rankings_by_state = self.load_rankings(&tracks).await;

        let mut analysed = Vec::with_capacity(tracks.len());
        for track in tracks {
            let rankings = rankings_by_state
                .get(&track.state)
                .cloned()
                .unwrap_or_default();
            analysed.push(self.analyse_track(track, rankings).await);
        }
        Ok(analysed)
    }

    /// Fetch premiership tables once per state appearing in the track
    /// list. A failed table degrades that state's rankings to empty.
    async fn load_rankings(&self, tracks: &[Track]) -> HashMap<String, Arc<StateRankings>> {
        let states: HashSet<&str> = tracks.iter().map(|t| t.state.as_str()).collect();

        let mut by_state = HashMap::new();
        for state in states {
            let jockeys = self
                .fetch_premiership(&scraper::jockey_premiership_url(state))
                .await;
            let trainers = self
                .fetch_premiership(&scraper::trainer_premiership_url(state))
                .await;
            by_state.insert(state.to_string(), Arc::new(StateRankings { jockeys, trainers }));
        }
        by_state
    }

    async fn fetch_premiership(&self, url: &str) -> Vec<PremiershipEntry> {
        match self.fetcher.fetch(url).await {
            Ok(html) => PremiershipParser::parse(&html),
            Err(e) => {
                warn!(url, error = %e, "premiership table unavailable");
                Vec::new()
            }
        }
    }

    async fn analyse_track(&self, track: Track, rankings: Arc<StateRankings>) -> TrackAnalysis {
        let html = match self.fetcher.fetch(&track.fields_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(track = %track.name, error = %e, "fields page unavailable");
                return TrackAnalysis {
                    track,
                    races: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        let races = RaceFieldsParser::parse(&html, &track);
        info!(track = %track.name, races = races.len(), "fields page parsed");

        let key = track.venue_key();
        let handles: Vec<_> = races
            .into_iter()
            .map(|race| {
                let fetcher = Arc::clone(&self.fetcher);
                let config = Arc::clone(&self.config);
                let rankings = Arc::clone(&rankings);
                let entry_id = scraper::race_entry_id(&key, race.number);
                let meta = (
                    race.number,
                    race.name.clone(),
                    race.distance,
                    race.condition.clone(),
                    race.start_time.clone(),
                );
                let handle = tokio::spawn(async move {
                    analyse_race(fetcher, config, race, rankings, entry_id).await
                });
                (meta, handle)
            })
            .collect();

        let mut analysed = Vec::with_capacity(handles.len());
        for ((number, name, distance, condition, start_time), handle) in handles {
            match handle.await {
                Ok(analysis) => analysed.push(analysis),
                Err(e) => analysed.push(RaceAnalysis {
                    race_number: number,
                    race_name: name,
                    distance,
                    condition,
                    start_time,
                    horses: Vec::new(),
                    recommendation: None,
                    error: Some(format!("analysis task failed: {e}")),
                }),
            }
        }
        analysed.sort_by_key(|r| r.race_number);

        TrackAnalysis {
            track,
            races: analysed,
            error: None,
        }
    }
}

async fn analyse_race(
    fetcher: Arc<dyn DocumentFetcher>,
    config: Arc<AppConfig>,
    race: Race,
    rankings: Arc<StateRankings>,
    entry_id: String,
) -> RaceAnalysis {
    let forms = load_horse_forms(&fetcher, &race).await;

    let ctx = ScoringContext {
        jockey_rankings: &rankings.jockeys,
        trainer_rankings: &rankings.trainers,
        champion_jockeys: &config.scoring.champion_jockeys,
        combinations: None,
    };

    let scored: Vec<_> = race
        .horses
        .iter()
        .filter_map(|horse| {
            forms
                .get(&horse.horse_code)
                .map(|form| scoring::score_horse(horse, &race, form, &ctx))
        })
        .collect();

    let (horses, recommendation, error) = if scored.is_empty() {
        warn!(race = %entry_id, "no horses with real form data");
        (
            Vec::new(),
            None,
            Some("no horses with real form data".to_string()),
        )
    } else {
        let mut ranked = betting::rank(scored);
        betting::mark_standouts(&mut ranked, &forms);
        let recommendation = betting::recommend(&ranked, &config.scoring.tiers);
        info!(
            race = %entry_id,
            scored = ranked.len(),
            top = %ranked[0].horse.name,
            "race scored"
        );
        (ranked, recommendation, None)
    };

    RaceAnalysis {
        race_number: race.number,
        race_name: race.name,
        distance: race.distance,
        condition: race.condition,
        start_time: race.start_time,
        horses,
        recommendation,
        error,
    }
}

/// Fetch and synthesize form for every runner concurrently. Horses
/// whose history cannot be fetched or parsed are simply absent from the
/// returned map.
async fn load_horse_forms(
    fetcher: &Arc<dyn DocumentFetcher>,
    race: &Race,
) -> HashMap<String, HorseForm> {
    let lookups = race.horses.iter().map(|horse| {
        let fetcher = Arc::clone(fetcher);
        let url = scraper::horse_form_url(&horse.horse_code, &horse.race_entry);
        let name = horse.name.clone();
        let code = horse.horse_code.clone();
        let form_string = horse.form.clone();
        let distance = race.distance;
        async move {
            let html = match fetcher.fetch(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(horse = %name, error = %e, "history page unavailable");
                    return None;
                }
            };
            let Some(history) = HorseHistoryParser::parse(&html, &name) else {
                warn!(horse = %name, "no form data in history page");
                return None;
            };
            Some((code, form::build_horse_form(history, &form_string, distance)))
        }
    });

    join_all(lookups).await.into_iter().flatten().collect()
}
