//! Horse row extractor: pulls runner rows out of a race container.
//!
//! Row candidates come from a cascade of selection strategies. Each
//! surviving candidate must yield every mandatory field or it produces
//! no horse at all; nothing is ever defaulted.

use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::debug;

use crate::types::Horse;

/// Extract every valid horse from a race container.
///
/// Saddle numbers are unique within a race; later duplicates are
/// dropped.
pub fn extract_horses(container: &ElementRef) -> Vec<Horse> {
    let mut horses: Vec<Horse> = Vec::new();

    for row in find_row_candidates(container) {
        let text = super::element_text(&row);

        if is_header_row(&text) || is_scratched(&row, &text) {
            continue;
        }

        let Some(horse) = extract_horse(&row, &text) else {
            continue;
        };

        if horses.iter().any(|h| h.saddle_number == horse.saddle_number) {
            debug!(saddle = horse.saddle_number, "duplicate saddle number dropped");
            continue;
        }
        horses.push(horse);
    }

    horses
}

/// Row-candidate cascade: class-based selectors, then generic rows with
/// a text-shape filter, then generic non-table elements with the same
/// filter.
fn find_row_candidates<'a>(container: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let class_based = select_rows(container, "tr[class*='horse'], tr[class*='runner']");
    if !class_based.is_empty() {
        return class_based;
    }

    let generic_rows: Vec<ElementRef<'a>> = select_rows(container, "tr")
        .into_iter()
        .filter(|row| looks_like_runner(&super::element_text(row)))
        .collect();
    if !generic_rows.is_empty() {
        return generic_rows;
    }

    select_rows(container, "div[class*='row'], li")
        .into_iter()
        .filter(|row| looks_like_runner(&super::element_text(row)))
        .collect()
}

fn select_rows<'a>(container: &ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(sel) => container.select(&sel).collect(),
        Err(_) => Vec::new(),
    }
}

fn looks_like_runner(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text
            .split_whitespace()
            .any(|w| w.len() >= 3 && w.chars().all(|c| c.is_alphabetic()))
}

/// A candidate is a header, not a horse, only when its text carries all
/// six column labels at once.
fn is_header_row(text: &str) -> bool {
    ["No", "Horse", "Trainer", "Jockey", "Barrier", "Weight"]
        .iter()
        .all(|label| text.contains(label))
}

fn is_scratched(row: &ElementRef, text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    if ["scratched", "scratching", "withdrawn"]
        .iter()
        .any(|kw| lowered.contains(kw))
    {
        return true;
    }

    if let Some(class) = row.value().attr("class") {
        if class.to_ascii_lowercase().contains("scratch") {
            return true;
        }
    }

    if let Ok(sel) = Selector::parse("[class*='scratch'], del, strike") {
        if row.select(&sel).next().is_some() {
            return true;
        }
    }

    false
}

/// Extract one horse from a surviving candidate row. Any missing
/// mandatory field rejects the whole horse.
fn extract_horse(row: &ElementRef, text: &str) -> Option<Horse> {
    let name = extract_name(row)?;
    let saddle_number = extract_saddle_number(row, text)?;
    let jockey = extract_person(row, "[class*='jockey']", "Jockey:")?;
    let trainer = extract_person(row, "[class*='trainer']", "Trainer:")?;
    let weight = extract_weight(row, text)?;
    let barrier = extract_barrier(row, text)?;
    let (horse_code, race_entry) = extract_history_link(row)?;

    Some(Horse {
        saddle_number,
        name,
        jockey,
        trainer,
        weight,
        barrier,
        odds: extract_odds(row, text),
        form: extract_form(row, text).unwrap_or_default(),
        horse_code,
        race_entry,
    })
}

fn extract_name(row: &ElementRef) -> Option<String> {
    for selector in [
        "a[href*='HorseFullForm']",
        "[class*='horse-name']",
        "td[class*='horse'] a",
    ] {
        if let Some(element) = select_first(row, selector) {
            let name = super::element_text(&element);
            if !super::is_placeholder_name(&name) {
                return Some(name);
            }
        }
    }
    None
}

fn extract_saddle_number(row: &ElementRef, text: &str) -> Option<u32> {
    for selector in ["[class*='saddle']", "[class*='tab-no']"] {
        if let Some(element) = select_first(row, selector) {
            if let Some(n) = first_number(&super::element_text(&element)) {
                if n > 0 {
                    return Some(n);
                }
            }
        }
    }

    // Positional fallback: the first number in 1..20 near the front
    // third of the text, or just after a horse/runner keyword. Known
    // fragile; it assumes the source's visual column order.
    let number_re = Regex::new(r"\d{1,2}").unwrap();
    let lowered = text.to_ascii_lowercase();
    let keyword_end = ["horse", "runner"]
        .iter()
        .filter_map(|kw| lowered.find(kw).map(|i| i + kw.len()))
        .min();

    for m in number_re.find_iter(text) {
        let n: u32 = m.as_str().parse().ok()?;
        if !(1..=20).contains(&n) {
            continue;
        }
        let near_front = m.start() <= text.len() / 3;
        let near_keyword =
            keyword_end.is_some_and(|end| m.start() >= end && m.start() <= end + 20);
        if near_front || near_keyword {
            return Some(n);
        }
    }
    None
}

fn extract_person(row: &ElementRef, selector: &str, label: &str) -> Option<String> {
    let element = select_first(row, selector)?;
    let raw = super::element_text(&element);
    let raw = raw.strip_prefix(label).unwrap_or(&raw).trim().to_string();
    let cleaned = super::clean_person_name(&raw);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn extract_weight(row: &ElementRef, text: &str) -> Option<f64> {
    let weight_re = Regex::new(r"(\d+(?:\.\d+)?)\s*kg").unwrap();

    if let Some(element) = select_first(row, "[class*='weight']") {
        let cell = super::element_text(&element);
        let candidate = weight_re
            .captures(&cell)
            .map(|c| c[1].to_string())
            .or_else(|| {
                let stripped = cell.trim();
                stripped.parse::<f64>().ok().map(|_| stripped.to_string())
            })?;
        let weight: f64 = candidate.parse().ok()?;
        return if weight > 0.0 { Some(weight) } else { None };
    }

    let caps = weight_re.captures(text)?;
    let weight: f64 = caps[1].parse().ok()?;
    if weight > 0.0 {
        Some(weight)
    } else {
        None
    }
}

fn extract_barrier(row: &ElementRef, text: &str) -> Option<u32> {
    for selector in ["[class*='barrier']", "[class*='gate']"] {
        if let Some(element) = select_first(row, selector) {
            if let Some(n) = first_number(&super::element_text(&element)) {
                if n > 0 {
                    return Some(n);
                }
            }
        }
    }

    let labelled_re = Regex::new(r"(?i)(?:barrier|gate)\s*(\d{1,2})").unwrap();
    if let Some(caps) = labelled_re.captures(text) {
        return caps[1].parse().ok();
    }

    // Second number in the row text, if it sits in barrier range.
    // Known fragile, same column-order assumption as saddle numbers.
    let number_re = Regex::new(r"\d{1,2}").unwrap();
    let numbers: Vec<u32> = number_re
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    if numbers.len() >= 2 && (1..=20).contains(&numbers[1]) {
        return Some(numbers[1]);
    }
    None
}

fn extract_odds(row: &ElementRef, text: &str) -> Option<f64> {
    if let Some(element) = select_first(row, "[class*='odds']") {
        let cell = super::element_text(&element);
        if let Ok(odds) = cell.trim().trim_start_matches('$').parse::<f64>() {
            return Some(odds);
        }
    }
    let re = Regex::new(r"\$(\d+(?:\.\d+)?)").unwrap();
    re.captures(text).and_then(|c| c[1].parse().ok())
}

/// Form string cascade: form-labelled sub-element, then the longest
/// digit/x span in the row text, then the same pattern scoped to
/// individual cells.
fn extract_form(row: &ElementRef, text: &str) -> Option<String> {
    let full_re = Regex::new(r"^[0-9xX]+$").unwrap();
    if let Some(element) = select_first(row, "[class*='form']") {
        let cell = super::element_text(&element);
        let trimmed = cell.trim();
        if full_re.is_match(trimmed) {
            return Some(trimmed.to_string());
        }
    }

    let span_re = Regex::new(r"[0-9xX]+").unwrap();
    let best = span_re
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|s| is_form_span(s) && s.len() >= 3)
        .max_by_key(|s| s.len());
    if let Some(span) = best {
        return Some(span.to_string());
    }

    let td_selector = Selector::parse("td").ok()?;
    for cell in row.select(&td_selector) {
        let cell_text = super::element_text(&cell);
        for m in span_re.find_iter(&cell_text) {
            let s = m.as_str();
            if is_form_span(s) && (3..=20).contains(&s.len()) {
                return Some(s.to_string());
            }
        }
    }
    None
}

fn is_form_span(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit()) && s.chars().any(|c| c == 'x' || c == 'X')
}

/// Identity code and race-entry token from the horse-history link.
/// The identity parameter is mandatory; its absence rejects the horse.
fn extract_history_link(row: &ElementRef) -> Option<(String, String)> {
    let anchor = select_first(row, "a[href*='HorseFullForm']")?;
    let href = anchor.value().attr("href")?;
    let (_, query) = href.split_once('?')?;

    let mut horse_code = None;
    let mut race_entry = String::new();
    for pair in query.split('&') {
        if let Some((name, value)) = pair.split_once('=') {
            if name.eq_ignore_ascii_case("horsecode") && !value.is_empty() {
                horse_code = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("racecode") {
                race_entry = value.to_string();
            }
        }
    }

    horse_code.map(|code| (code, race_entry))
}

fn select_first<'a>(row: &ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(selector).ok()?;
    row.select(&sel).next()
}

fn first_number(text: &str) -> Option<u32> {
    let re = Regex::new(r"\d+").unwrap();
    re.find(text)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn container(rows: &str) -> Html {
        Html::parse_document(&format!(
            "<html><body><table class=\"race-strip-fields\">{rows}</table></body></html>"
        ))
    }

    fn extract(rows: &str) -> Vec<Horse> {
        let document = container(rows);
        let sel = Selector::parse("table").unwrap();
        let table = document.select(&sel).next().unwrap();
        extract_horses(&table)
    }

    const FULL_ROW: &str = r#"<tr class="runner-row">
      <td class="saddle-number">3</td>
      <td><a href="/Horses/HorseFullForm.aspx?horsecode=H777&racecode=R3">Fast Lane</a></td>
      <td class="trainer">Mr C Waller</td>
      <td class="jockey">Ms R King (a1.5)</td>
      <td class="barrier">5</td>
      <td class="weight">57.5kg</td>
      <td class="last-form">21x43</td>
      <td class="odds">$4.60</td>
    </tr>"#;

    #[test]
    fn test_extracts_all_seven_fields() {
        let horses = extract(FULL_ROW);
        assert_eq!(horses.len(), 1);
        let h = &horses[0];
        assert_eq!(h.saddle_number, 3);
        assert_eq!(h.name, "Fast Lane");
        assert_eq!(h.jockey, "R King");
        assert_eq!(h.trainer, "C Waller");
        assert_eq!(h.weight, 57.5);
        assert_eq!(h.barrier, 5);
        assert_eq!(h.odds, Some(4.6));
        assert_eq!(h.form, "21x43");
        assert_eq!(h.horse_code, "H777");
        assert_eq!(h.race_entry, "R3");
    }

    #[test]
    fn test_header_row_requires_all_six_labels() {
        let header = r#"<tr class="runner-header"><td>No</td><td>Horse</td><td>Trainer</td>
          <td>Jockey</td><td>Barrier</td><td>Weight</td></tr>"#;
        let rows = format!("{header}{FULL_ROW}");
        assert_eq!(extract(&rows).len(), 1);

        // A row mentioning only some labels is not a header.
        let partial = FULL_ROW.replace("Fast Lane", "Horse Trainer Special");
        assert_eq!(extract(&partial).len(), 1);
    }

    #[test]
    fn test_scratched_rows_are_excluded() {
        let scratched = FULL_ROW.replace("$4.60", "SCRATCHED");
        assert!(extract(&scratched).is_empty());

        let marked = FULL_ROW.replace("runner-row", "runner-row scratched-runner");
        assert!(extract(&marked).is_empty());
    }

    #[test]
    fn test_missing_identity_code_rejects_horse() {
        let no_code = FULL_ROW.replace("horsecode=H777&", "");
        assert!(extract(&no_code).is_empty());
    }

    #[test]
    fn test_missing_weight_rejects_horse() {
        let no_weight = FULL_ROW.replace(r#"<td class="weight">57.5kg</td>"#, "");
        assert!(extract(&no_weight).is_empty());
    }

    #[test]
    fn test_placeholder_name_rejects_horse() {
        let placeholder = FULL_ROW.replace("Fast Lane", "TBA");
        assert!(extract(&placeholder).is_empty());
    }

    #[test]
    fn test_rejection_removes_exactly_one_row() {
        let second = FULL_ROW
            .replace("H777", "H778")
            .replace(">3<", ">4<")
            .replace("Fast Lane", "TBA");
        let rows = format!("{FULL_ROW}{second}");
        assert_eq!(extract(&rows).len(), 1);
    }

    #[test]
    fn test_duplicate_saddle_numbers_dedupe() {
        let duplicate = FULL_ROW.replace("H777", "H888").replace("Fast Lane", "Slow Lane");
        let rows = format!("{FULL_ROW}{duplicate}");
        let horses = extract(&rows);
        assert_eq!(horses.len(), 1);
        assert_eq!(horses[0].name, "Fast Lane");
    }

    #[test]
    fn test_odds_absence_is_not_a_rejection() {
        let no_odds = FULL_ROW.replace(r#"<td class="odds">$4.60</td>"#, "");
        let horses = extract(&no_odds);
        assert_eq!(horses.len(), 1);
        assert_eq!(horses[0].odds, None);
    }

    #[test]
    fn test_barrier_from_labelled_text_pattern() {
        let row = r#"<tr class="runner-row">
          <td class="saddle-number">7</td>
          <td><a href="/Horses/HorseFullForm.aspx?horsecode=H1&racecode=R1">Night Parade</a></td>
          <td class="trainer">G Waterhouse</td>
          <td class="jockey">T Berry</td>
          <td>Barrier 9</td>
          <td class="weight">55kg</td>
        </tr>"#;
        let horses = extract(row);
        assert_eq!(horses.len(), 1);
        assert_eq!(horses[0].barrier, 9);
    }
}
