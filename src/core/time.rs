use serde::de::Error as _;
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Calendar dates travel as `YYYY-MM-DD`.
pub(crate) fn format_date(value: Date) -> String {
    value.format(format_description!("[year]-[month]-[day]")).unwrap_or_else(|_| value.to_string())
}

pub(crate) fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if let Ok(value) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Some(value);
    }

    // Date pickers sometimes send a full timestamp; keep only the day.
    OffsetDateTime::parse(raw, &Rfc3339).ok().map(|value| value.date())
}

/// Lesson times travel as `HH:MM`; seconds are accepted and dropped.
pub(crate) fn format_clock(value: Time) -> String {
    value.format(format_description!("[hour]:[minute]")).unwrap_or_else(|_| value.to_string())
}

pub(crate) fn parse_clock(raw: &str) -> Option<Time> {
    let raw = raw.trim();
    Time::parse(raw, format_description!("[hour]:[minute]"))
        .or_else(|_| Time::parse(raw, format_description!("[hour]:[minute]:[second]")))
        .ok()
        .map(|value| value.replace_second(0).unwrap_or(value))
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {raw}")))
}

pub(crate) fn deserialize_option_date<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => {
            let date = parse_date(&raw)
                .ok_or_else(|| D::Error::custom(format!("invalid date: {raw}")))?;
            Ok(Some(date))
        }
        None => Ok(None),
    }
}

pub(crate) fn deserialize_clock<'de, D>(deserializer: D) -> Result<Time, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_clock(&raw).ok_or_else(|| D::Error::custom(format!("invalid time: {raw}")))
}

pub(crate) fn deserialize_option_clock<'de, D>(deserializer: D) -> Result<Option<Time>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => {
            let clock = parse_clock(&raw)
                .ok_or_else(|| D::Error::custom(format!("invalid time: {raw}")))?;
            Ok(Some(clock))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn format_primitive_outputs_utc_z() {
        let date = Date::from_calendar_date(2025, Month::January, 2).unwrap();
        let time = Time::from_hms(10, 20, 30).unwrap();
        let value = PrimitiveDateTime::new(date, time);
        assert_eq!(format_primitive(value), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn parse_date_accepts_plain_and_timestamp_forms() {
        let expected = Date::from_calendar_date(2024, Month::July, 15).unwrap();
        assert_eq!(parse_date("2024-07-15"), Some(expected));
        assert_eq!(parse_date("2024-07-15T08:00:00+07:00"), Some(expected));
        assert_eq!(parse_date("15/07/2024"), None);
        assert_eq!(format_date(expected), "2024-07-15");
    }

    #[test]
    fn parse_clock_drops_seconds() {
        let parsed = parse_clock("07:30:45").expect("clock");
        assert_eq!(format_clock(parsed), "07:30");
        assert_eq!(parse_clock("7.30"), None);
    }
}
