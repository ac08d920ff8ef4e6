use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Column-header synonyms seen in real schedule exports, mapped to the
/// canonical lesson fields. Keys are lowercase; lookups trim and lowercase
/// the incoming header first.
static KEY_ALIASES: &[(&str, &str)] = &[
    // Subject / discipline
    ("subject", "subject"),
    ("предмет", "subject"),
    ("дисциплина", "subject"),
    ("дисципл.", "subject"),
    ("учебная дисциплина", "subject"),
    ("название дисциплины", "subject"),
    ("название предмета", "subject"),
    ("курс", "subject"),
    ("course", "subject"),
    ("course name", "subject"),
    ("subject name", "subject"),
    ("module", "subject"),
    ("module name", "subject"),
    // Teacher
    ("teacher", "teacher"),
    ("преподаватель", "teacher"),
    ("преп.", "teacher"),
    ("преподаватель(и)", "teacher"),
    ("фио преподавателя", "teacher"),
    ("фио преп.", "teacher"),
    ("фио", "teacher"),
    ("лектор", "teacher"),
    ("лектор(ы)", "teacher"),
    ("семинарист", "teacher"),
    ("практик", "teacher"),
    ("преподаватель лекции", "teacher"),
    ("преподаватель практики", "teacher"),
    ("lector", "teacher"),
    ("lecturer", "teacher"),
    ("tutor", "teacher"),
    ("instructor", "teacher"),
    ("professor", "teacher"),
    ("prof.", "teacher"),
    // Room / venue
    ("room", "room"),
    ("аудитория", "room"),
    ("ауд.", "room"),
    ("аудит.", "room"),
    ("кабинет", "room"),
    ("каб.", "room"),
    ("помещение", "room"),
    ("место проведения", "room"),
    ("место занятия", "room"),
    ("место занятий", "room"),
    ("место", "room"),
    ("зал", "room"),
    ("актовый зал", "room"),
    ("спортзал", "room"),
    ("laboratory", "room"),
    ("lab", "room"),
    ("lab.", "room"),
    ("room number", "room"),
    ("auditorium", "room"),
    ("cabinet", "room"),
    ("classroom", "room"),
    ("location", "room"),
    ("venue", "room"),
    // Time range
    ("time", "time"),
    ("время", "time"),
    ("время занятия", "time"),
    ("время проведения", "time"),
    ("время пары", "time"),
    ("пара", "time"),
    ("время урока", "time"),
    ("lesson time", "time"),
    ("class time", "time"),
    ("time range", "time"),
    ("period", "time"),
    ("slot", "time"),
    // Start time
    ("start_time", "start_time"),
    ("начало", "start_time"),
    ("начало пары", "start_time"),
    ("начало занятия", "start_time"),
    ("время начала", "start_time"),
    ("from", "start_time"),
    ("start", "start_time"),
    ("start time", "start_time"),
    ("begin", "start_time"),
    ("begin time", "start_time"),
    // End time
    ("end_time", "end_time"),
    ("конец", "end_time"),
    ("конец пары", "end_time"),
    ("конец занятия", "end_time"),
    ("окончание", "end_time"),
    ("окончание пары", "end_time"),
    ("окончание занятия", "end_time"),
    ("время окончания", "end_time"),
    ("to", "end_time"),
    ("end", "end_time"),
    ("end time", "end_time"),
    ("finish", "end_time"),
    // Weekday
    ("weekday", "weekday"),
    ("день", "weekday"),
    ("день недели", "weekday"),
    ("день_недели", "weekday"),
    ("day", "weekday"),
    ("day of week", "weekday"),
    ("weekday name", "weekday"),
    // Date
    ("date", "date"),
    ("дата", "date"),
    ("дата занятия", "date"),
    ("calendar date", "date"),
    // Group / stream
    ("group", "group"),
    ("группа", "group"),
    ("гр.", "group"),
    ("учебная группа", "group"),
    ("академическая группа", "group"),
    ("academic group", "group"),
    ("study group", "group"),
    ("класс", "group"),
    ("class", "group"),
    ("stream", "group"),
    ("поток", "group"),
    // Subgroup
    ("subgroup", "subgroup"),
    ("подгруппа", "subgroup"),
    ("подгр.", "subgroup"),
    ("гр.подг.", "subgroup"),
    ("группа/подгруппа", "subgroup"),
    ("sub-group", "subgroup"),
    ("group part", "subgroup"),
    // Week parity
    ("week_type", "week_type"),
    ("тип недели", "week_type"),
    ("чётность", "week_type"),
    ("четность", "week_type"),
    ("чет/нечет", "week_type"),
    ("четн/нечетн", "week_type"),
    ("week type", "week_type"),
    ("type of week", "week_type"),
    ("week parity", "week_type"),
    ("parity", "week_type"),
    ("неделя", "week_type"),
    ("номер недели", "week_type"),
    // Notes
    ("note", "note"),
    ("примечание", "note"),
    ("прим.", "note"),
    ("комментарий", "note"),
    ("коммент", "note"),
    ("comment", "note"),
    ("remarks", "note"),
    ("details", "note"),
    ("extra", "note"),
    ("описание", "note"),
    ("описание занятия", "note"),
    ("формат", "note"),
    ("форма", "note"),
    ("вид занятия", "note"),
];

static KEY_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| KEY_ALIASES.iter().copied().collect());

/// Resolves a raw column header to its canonical field name, or `None` when
/// the header is not a known synonym.
pub fn canonical_field(raw: &str) -> Option<&'static str> {
    KEY_MAP.get(raw.trim().to_lowercase().as_str()).copied()
}

/// Weekday sort order, Monday first. Russian full names, Russian
/// abbreviations, and English names all resolve to the same rank.
static WEEKDAY_RANKS: &[(&str, u8)] = &[
    ("понедельник", 1),
    ("вторник", 2),
    ("среда", 3),
    ("четверг", 4),
    ("пятница", 5),
    ("суббота", 6),
    ("воскресенье", 7),
    ("monday", 1),
    ("tuesday", 2),
    ("wednesday", 3),
    ("thursday", 4),
    ("friday", 5),
    ("saturday", 6),
    ("sunday", 7),
    ("пн", 1),
    ("вт", 2),
    ("ср", 3),
    ("чт", 4),
    ("пт", 5),
];

static WEEKDAY_ORDER: Lazy<HashMap<&'static str, u8>> =
    Lazy::new(|| WEEKDAY_RANKS.iter().copied().collect());

pub fn weekday_order(name: &str) -> Option<u8> {
    WEEKDAY_ORDER.get(name.trim().to_lowercase().as_str()).copied()
}

/// Known lesson-slot start times, so slot numbers line up with the real
/// timetable grid.
pub const PAIR_START_TIMES: &[&str] = &[
    "08:30", "09:00", "10:40", "11:20", "13:00", "15:00", "15:10", "17:00", "18:10",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_russian_and_english_synonyms() {
        assert_eq!(canonical_field("Предмет"), Some("subject"));
        assert_eq!(canonical_field("ФИО преподавателя"), Some("teacher"));
        assert_eq!(canonical_field("ауд."), Some("room"));
        assert_eq!(canonical_field("lesson time"), Some("time"));
        assert_eq!(canonical_field("Чётность"), Some("week_type"));
    }

    #[test]
    fn lookup_trims_and_ignores_case() {
        assert_eq!(canonical_field("  ВРЕМЯ  "), Some("time"));
        assert_eq!(canonical_field("Start Time"), Some("start_time"));
    }

    #[test]
    fn unknown_headers_are_dropped() {
        assert_eq!(canonical_field("цвет фона"), None);
        assert_eq!(canonical_field(""), None);
    }

    #[test]
    fn weekday_ranks_cover_short_and_english_forms() {
        assert_eq!(weekday_order("Понедельник"), Some(1));
        assert_eq!(weekday_order("пт"), Some(5));
        assert_eq!(weekday_order("Sunday"), Some(7));
        assert_eq!(weekday_order("праздник"), None);
    }

    #[test]
    fn pair_grid_contains_the_morning_slots() {
        assert!(PAIR_START_TIMES.contains(&"09:00"));
        assert!(PAIR_START_TIMES.contains(&"18:10"));
    }
}
