use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::alias::canonical_field;

/// Canonical normalized output for one table row. Every field is always
/// present; unknown values stay as empty strings. `raw` preserves the encoded
/// prompt the row was derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub subject: String,
    pub start_time: String,
    pub end_time: String,
    pub teacher: String,
    pub room: String,
    pub weekday: String,
    pub date: String,
    pub group: String,
    pub subgroup: String,
    pub week_type: String,
    pub note: String,
    pub raw: String,
}

static HHMM_LOOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2})(?::?(\d{1,2}))?$").unwrap());
static HHMM_STRICT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{2}):(\d{2})$").unwrap());
static WORD_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*([0-9:.\-\s]{3,})\s*(?:до|to)\s*([0-9:.\-\s]{3,})\s*$").unwrap());
static DASH_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([0-9:.\-\s]{3,})\s*-\s*([0-9:.\-\s]{3,})\s*$").unwrap());
static ISO_DATE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap());

impl Lesson {
    /// A record is well-formed when it names a subject and its start time is
    /// either empty or a real `HH:MM` time of day.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.subject.is_empty() {
            return Err("subject must not be empty");
        }
        if !self.start_time.is_empty() && !is_canonical_hhmm(&self.start_time) {
            return Err("start_time must be HH:MM or empty");
        }
        Ok(())
    }
}

/// `HH:MM` shape with in-range hour and minute. Out-of-range input like
/// `25:00` survives `clean_hhmm` verbatim and must not pass validation.
fn is_canonical_hhmm(value: &str) -> bool {
    let Some(caps) = HHMM_STRICT.captures(value) else {
        return false;
    };
    let hh: u32 = caps[1].parse().unwrap_or(24);
    let mm: u32 = caps[2].parse().unwrap_or(60);
    hh <= 23 && mm <= 59
}

/// Punctuation stripped from both ends of a cell, on top of whitespace.
const EDGE_PUNCT: &[char] = &[',', ';', '|', ' '];

fn is_null_token(s: &str) -> bool {
    if matches!(s, "" | "-" | "—") {
        return true;
    }
    matches!(s.to_lowercase().as_str(), "nan" | "none" | "null")
}

/// Cleans a raw cell into a plain value: trims whitespace and stray edge
/// punctuation, and maps the usual spreadsheet junk tokens to empty.
pub fn clean_cell(raw: &str) -> String {
    let s = raw.trim().trim_matches(EDGE_PUNCT);
    if is_null_token(s) {
        return String::new();
    }
    s.to_string()
}

/// Variant applied to time fields: interior dashes must survive until
/// `clean_hhmm` canonicalizes them, so only edge punctuation is trimmed.
pub fn clean_time_cell(raw: &str) -> String {
    clean_cell(raw)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn clean_value(value: Option<&Value>) -> String {
    value.map(|v| clean_cell(&render_value(v))).unwrap_or_default()
}

fn clean_time_value(value: Option<&Value>) -> String {
    value.map(|v| clean_time_cell(&render_value(v))).unwrap_or_default()
}

/// Canonicalizes a single clock time: `9` → `09:00`, `9:5` → `09:05`,
/// `9.00`/`9-00` → `09:00`. Anything that does not look like a time comes
/// back trimmed but otherwise unchanged.
pub fn clean_hhmm(part: &str) -> String {
    let p = part.trim().replace(['.', '-'], ":");
    let Some(caps) = HHMM_LOOSE.captures(&p) else {
        return part.trim().to_string();
    };
    let hh: u32 = caps[1].parse().unwrap_or(0);
    let mm: u32 = caps
        .get(2)
        .map(|m| m.as_str().parse().unwrap_or(0))
        .unwrap_or(0);
    if hh > 23 || mm > 59 {
        return part.trim().to_string();
    }
    format!("{hh:02}:{mm:02}")
}

/// Splits a time-range string into `(start, end)` in `HH:MM` form.
///
/// Accepts `09:00-10:30`, `9:00 – 10:30`, `9.00–10.30`, `9-00—10-30`,
/// `09:00 до 10:30`, `09:00 to 10:30`. Without a recognized separator the
/// whole string is treated as a single start time.
pub fn split_time_range(s: &str) -> (String, String) {
    let t = s.trim();
    if t.is_empty() {
        return (String::new(), String::new());
    }

    if let Some(caps) = WORD_RANGE.captures(t) {
        return (clean_hhmm(&caps[1]), clean_hhmm(&caps[2]));
    }

    // Long dashes collapse to a plain hyphen before the left-right split.
    let dashed = t.replace(['—', '–'], "-");
    if let Some(caps) = DASH_RANGE.captures(&dashed) {
        return (clean_hhmm(&caps[1]), clean_hhmm(&caps[2]));
    }

    (clean_hhmm(t), String::new())
}

/// Normalizes the week-parity column. An ISO-date-shaped value is an
/// ambiguous signal (Excel leaking a date cell) and is deliberately dropped.
pub fn normalize_week_type(value: Option<&Value>) -> String {
    let s = clean_value(value);
    if s.is_empty() {
        return s;
    }

    let low = s.trim().to_lowercase();
    if low.starts_with("чет") {
        return "четная".to_string();
    }
    if low.starts_with("нечет") || low.starts_with("нечёт") {
        return "нечетная".to_string();
    }
    if matches!(low.as_str(), "оба" | "both" | "all") {
        return "оба".to_string();
    }
    if ISO_DATE_PREFIX.is_match(&low) {
        return String::new();
    }

    s
}

/// Overlays fallback pairs onto the model's parsed object, preserving the
/// key encounter order. Fallback values win on conflict; a non-object model
/// reply contributes nothing.
pub fn merge_fields(parsed: Option<&Value>, fallback: &[(String, String)]) -> Vec<(String, Value)> {
    let mut merged: Vec<(String, Value)> = Vec::new();
    if let Some(Value::Object(map)) = parsed {
        for (key, value) in map {
            upsert(&mut merged, key.clone(), value.clone());
        }
    }
    for (key, value) in fallback {
        upsert(&mut merged, key.clone(), Value::String(value.clone()));
    }
    merged
}

fn upsert(fields: &mut Vec<(String, Value)>, key: String, value: Value) {
    if let Some(slot) = fields.iter_mut().find(|(k, _)| *k == key) {
        slot.1 = value;
    } else {
        fields.push((key, value));
    }
}

fn field_upsert(fields: &mut Vec<(&'static str, Value)>, key: &'static str, value: Value) {
    if let Some(slot) = fields.iter_mut().find(|(k, _)| *k == key) {
        slot.1 = value;
    } else {
        fields.push((key, value));
    }
}

fn field_get<'a>(fields: &'a [(&'static str, Value)], key: &str) -> Option<&'a Value> {
    fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
}

fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn is_unset(value: Option<&Value>) -> bool {
    value.map(value_truthy) != Some(true)
}

/// Maps a merged alias→value list onto the fixed lesson schema.
///
/// Unknown keys are dropped, a `time` value (string range or structured
/// start/end object) feeds start_time/end_time when they are not already
/// set, every field runs through the cell cleaner, and the time fields get a
/// final strict `HH:MM` pass.
pub fn normalize_record(merged: &[(String, Value)], original_row: &str) -> Lesson {
    let mut fields: Vec<(&'static str, Value)> = Vec::new();
    for (key, value) in merged {
        if let Some(canonical) = canonical_field(key) {
            field_upsert(&mut fields, canonical, value.clone());
        }
    }

    let time_value = field_get(&fields, "time").cloned();

    if let Some(Value::String(range)) = &time_value {
        let (start, end) = split_time_range(range);
        if !start.is_empty() && is_unset(field_get(&fields, "start_time")) {
            field_upsert(&mut fields, "start_time", Value::String(start));
        }
        if !end.is_empty() && is_unset(field_get(&fields, "end_time")) {
            field_upsert(&mut fields, "end_time", Value::String(end));
        }
    }

    if let Some(Value::Object(time)) = &time_value {
        let start = pick_truthy(time, "start_time", "начало");
        let end = pick_truthy(time, "end_time", "конец");
        if let Some(Value::String(start)) = start {
            if field_get(&fields, "start_time").is_none() {
                field_upsert(&mut fields, "start_time", Value::String(start.clone()));
            }
        }
        if let Some(Value::String(end)) = end {
            if field_get(&fields, "end_time").is_none() {
                field_upsert(&mut fields, "end_time", Value::String(end.clone()));
            }
        }
    }

    let mut out = Lesson {
        raw: original_row.to_string(),
        ..Lesson::default()
    };
    out.subject = clean_value(field_get(&fields, "subject"));
    out.start_time = clean_time_value(field_get(&fields, "start_time"));
    out.end_time = clean_time_value(field_get(&fields, "end_time"));
    out.teacher = clean_value(field_get(&fields, "teacher"));
    out.room = clean_value(field_get(&fields, "room"));
    out.weekday = clean_value(field_get(&fields, "weekday"));
    out.date = clean_value(field_get(&fields, "date"));
    out.group = clean_value(field_get(&fields, "group"));
    out.subgroup = clean_value(field_get(&fields, "subgroup"));
    out.week_type = normalize_week_type(field_get(&fields, "week_type"));
    out.note = clean_value(field_get(&fields, "note"));

    if !out.start_time.is_empty() {
        out.start_time = clean_hhmm(&out.start_time);
    }
    if !out.end_time.is_empty() {
        out.end_time = clean_hhmm(&out.end_time);
    }

    out
}

fn pick_truthy<'a>(
    map: &'a serde_json::Map<String, Value>,
    primary: &str,
    secondary: &str,
) -> Option<&'a Value> {
    match map.get(primary) {
        Some(value) if value_truthy(value) => Some(value),
        _ => map.get(secondary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_cell_maps_junk_tokens_to_empty() {
        for junk in ["-", "—", "NaN", "None", "null", "", "   "] {
            assert_eq!(clean_cell(junk), "", "token {junk:?} should clean to empty");
        }
    }

    #[test]
    fn clean_cell_trims_edge_punctuation_only() {
        assert_eq!(clean_cell("  Иванов И.И. ,"), "Иванов И.И.");
        assert_eq!(clean_cell("|ауд. 201|"), "ауд. 201");
        assert_eq!(clean_cell("Физика"), "Физика");
    }

    #[test]
    fn clean_time_cell_keeps_interior_hyphens() {
        assert_eq!(clean_time_cell(" 9:00-10:30 ;"), "9:00-10:30");
    }

    #[test]
    fn clean_hhmm_pads_and_rejects_out_of_range() {
        assert_eq!(clean_hhmm("9"), "09:00");
        assert_eq!(clean_hhmm("9:5"), "09:05");
        assert_eq!(clean_hhmm("9.00"), "09:00");
        assert_eq!(clean_hhmm("9-00"), "09:00");
        assert_eq!(clean_hhmm("25:00"), "25:00");
        assert_eq!(clean_hhmm("10:75"), "10:75");
        assert_eq!(clean_hhmm("900"), "900");
        assert_eq!(clean_hhmm(" пара "), "пара");
    }

    fn range(start: &str, end: &str) -> (String, String) {
        (start.to_string(), end.to_string())
    }

    #[test]
    fn split_time_range_handles_all_separator_forms() {
        assert_eq!(split_time_range("9:00-10:30"), range("09:00", "10:30"));
        assert_eq!(split_time_range("9.00 до 10.30"), range("09:00", "10:30"));
        assert_eq!(split_time_range("09:00 TO 10:30"), range("09:00", "10:30"));
        assert_eq!(split_time_range("9:00 – 10:30"), range("09:00", "10:30"));
        assert_eq!(split_time_range("9-00—10-30"), range("09:00", "10:30"));
    }

    #[test]
    fn split_time_range_is_idempotent_on_canonical_input() {
        assert_eq!(split_time_range("09:00"), range("09:00", ""));
        assert_eq!(split_time_range("9:00"), range("09:00", ""));
    }

    #[test]
    fn split_time_range_rejects_out_of_range_hours() {
        assert_eq!(split_time_range("25:00"), range("25:00", ""));
    }

    #[test]
    fn split_time_range_on_empty_input() {
        assert_eq!(split_time_range("   "), (String::new(), String::new()));
    }

    #[test]
    fn week_type_normalization_cases() {
        assert_eq!(normalize_week_type(Some(&json!("четная"))), "четная");
        assert_eq!(normalize_week_type(Some(&json!("Нечетные"))), "нечетная");
        assert_eq!(normalize_week_type(Some(&json!("нечётная"))), "нечетная");
        assert_eq!(normalize_week_type(Some(&json!("both"))), "оба");
        assert_eq!(normalize_week_type(Some(&json!("2016-01-01"))), "");
        assert_eq!(normalize_week_type(Some(&json!("2016-01-01 00:00:00"))), "");
        assert_eq!(normalize_week_type(Some(&json!("1-16"))), "1-16");
        assert_eq!(normalize_week_type(None), "");
    }

    #[test]
    fn merge_prefers_fallback_on_conflicting_keys() {
        let parsed = json!({"subject": "Алгебра", "time": "9:00-10:30"});
        let fallback = vec![("subject".to_string(), "Математика".to_string())];
        let merged = merge_fields(Some(&parsed), &fallback);
        let lesson = normalize_record(&merged, "row");
        assert_eq!(lesson.subject, "Математика");
        assert_eq!(lesson.start_time, "09:00");
    }

    #[test]
    fn merge_ignores_non_object_model_replies() {
        let parsed = json!(["не", "объект"]);
        let fallback = vec![("Предмет".to_string(), "Физика".to_string())];
        let merged = merge_fields(Some(&parsed), &fallback);
        assert_eq!(merged.len(), 1);
        let lesson = normalize_record(&merged, "row");
        assert_eq!(lesson.subject, "Физика");
    }

    #[test]
    fn normalize_splits_string_time_without_clobbering_explicit_fields() {
        let merged = vec![
            ("время".to_string(), json!("9:00-10:30")),
            ("начало".to_string(), json!("08:30")),
        ];
        let lesson = normalize_record(&merged, "row");
        assert_eq!(lesson.start_time, "08:30");
        assert_eq!(lesson.end_time, "10:30");
    }

    #[test]
    fn normalize_reads_structured_time_with_russian_subkeys() {
        let merged = vec![(
            "time".to_string(),
            json!({"начало": "9.00", "конец": "10.30"}),
        )];
        let lesson = normalize_record(&merged, "row");
        assert_eq!(lesson.start_time, "09:00");
        assert_eq!(lesson.end_time, "10:30");
    }

    #[test]
    fn normalize_drops_unknown_keys() {
        let merged = vec![
            ("цвет".to_string(), json!("красный")),
            ("предмет".to_string(), json!("История")),
        ];
        let lesson = normalize_record(&merged, "row");
        assert_eq!(lesson.subject, "История");
        assert_eq!(lesson.note, "");
    }

    #[test]
    fn normalize_matches_the_reference_scenario() {
        let raw = "[Sheet: CSV] [Header: Предмет, Время, Преподаватель] row: \
                   Предмет=Математика | Время=9:00-10:30 | Преподаватель=Иванов И.И.";
        let parsed = json!({"subject": "Математика", "time": "9:00-10:30"});
        let fallback = vec![
            ("Предмет".to_string(), "Математика".to_string()),
            ("Время".to_string(), "9:00-10:30".to_string()),
            ("Преподаватель".to_string(), "Иванов И.И.".to_string()),
        ];
        let lesson = normalize_record(&merge_fields(Some(&parsed), &fallback), raw);

        assert_eq!(
            lesson,
            Lesson {
                subject: "Математика".to_string(),
                start_time: "09:00".to_string(),
                end_time: "10:30".to_string(),
                teacher: "Иванов И.И.".to_string(),
                raw: raw.to_string(),
                ..Lesson::default()
            }
        );
        assert!(lesson.validate().is_ok());
    }

    #[test]
    fn validation_rejects_missing_subject_and_loose_times() {
        let lesson = Lesson {
            start_time: "09:00".to_string(),
            ..Lesson::default()
        };
        assert!(lesson.validate().is_err());

        let lesson = Lesson {
            subject: "Физика".to_string(),
            start_time: "25:00".to_string(),
            ..Lesson::default()
        };
        assert!(lesson.validate().is_err());

        let lesson = Lesson {
            subject: "Физика".to_string(),
            start_time: "10:75".to_string(),
            ..Lesson::default()
        };
        assert!(lesson.validate().is_err());

        let lesson = Lesson {
            subject: "Физика".to_string(),
            start_time: "23:59".to_string(),
            ..Lesson::default()
        };
        assert!(lesson.validate().is_ok());

        let lesson = Lesson {
            subject: "Физика".to_string(),
            ..Lesson::default()
        };
        assert!(lesson.validate().is_ok());
    }
}
