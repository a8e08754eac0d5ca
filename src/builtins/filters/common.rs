//! Filters operating on multiple types
#[cfg(feature = "date")]
use chrono::{
    format::{Item, StrftimeItems},
    DateTime, NaiveDate, TimeZone, Utc,
};

use crate::value::Value;

/// Returns the number of items in an array or mapping, or the number of characters in a string.
/// Anything else has a size of 0.
pub fn size(value: &Value, _: Option<&Value>) -> Value {
    Value::from(value.size().unwrap_or(0))
}

/// Returns the argument when the value is nil, false, an empty string or an empty array
pub fn default(value: &Value, arg: Option<&Value>) -> Value {
    let is_empty = match value {
        Value::Nil | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Sequence(items) => items.is_empty(),
        _ => false,
    };
    match arg {
        Some(fallback) if is_empty => fallback.clone(),
        _ => value.clone(),
    }
}

/// Formats a timestamp, a RFC 3339 date time or a `YYYY-MM-DD` date with the strftime
/// format given as argument, `%Y-%m-%d` by default. `"now"` and `"today"` are the current time.
///
/// The value is returned unchanged if it isn't a date or if the format is invalid.
///
/// a full reference for the time formatting syntax is available
/// on [chrono docs](https://docs.rs/chrono/latest/chrono/format/strftime/index.html)
#[cfg(feature = "date")]
pub fn date(value: &Value, arg: Option<&Value>) -> Value {
    let format = match arg {
        None | Some(Value::Nil) => "%Y-%m-%d".to_string(),
        Some(f) => f.render().into_owned(),
    };
    if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
        tracing::debug!(format = %format, "invalid date format, leaving the value as is");
        return value.clone();
    }

    let formatted = match value {
        Value::Number(n) => match n.as_i64().and_then(|i| Utc.timestamp_opt(i, 0).single()) {
            Some(dt) => dt.format(&format).to_string(),
            None => return value.clone(),
        },
        Value::String(s) if s == "now" || s == "today" => Utc::now().format(&format).to_string(),
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                dt.format(&format).to_string()
            } else if let Some(dt) =
                NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0))
            {
                dt.format(&format).to_string()
            } else {
                return value.clone();
            }
        }
        _ => return value.clone(),
    };

    Value::from(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Map;

    #[test]
    fn test_size() {
        assert_eq!(size(&Value::from(vec![1, 2, 3]), None), Value::from(3));
        assert_eq!(size(&Value::from("h\u{e9}llo"), None), Value::from(5));
        let mut map = Map::new();
        map.insert("a".to_string(), Value::Nil);
        assert_eq!(size(&Value::Mapping(map), None), Value::from(1));
        assert_eq!(size(&Value::from(12), None), Value::from(0));
        assert_eq!(size(&Value::Nil, None), Value::from(0));
    }

    #[test]
    fn test_default() {
        let fallback = Value::from("none");
        assert_eq!(default(&Value::Nil, Some(&fallback)), fallback);
        assert_eq!(default(&Value::Bool(false), Some(&fallback)), fallback);
        assert_eq!(default(&Value::from(""), Some(&fallback)), fallback);
        assert_eq!(default(&Value::Sequence(vec![]), Some(&fallback)), fallback);
        assert_eq!(default(&Value::from(0), Some(&fallback)), Value::from(0));
        assert_eq!(default(&Value::from("x"), Some(&fallback)), Value::from("x"));
        assert_eq!(default(&Value::Nil, None), Value::Nil);
    }

    #[cfg(feature = "date")]
    #[test]
    fn test_date_default() {
        assert_eq!(date(&Value::from(1482720453), None), Value::from("2016-12-26"));
    }

    #[cfg(feature = "date")]
    #[test]
    fn test_date_custom_format() {
        let result = date(&Value::from(1482720453), Some(&Value::from("%Y-%m-%d %H:%M")));
        assert_eq!(result, Value::from("2016-12-26 02:47"));
    }

    #[cfg(feature = "date")]
    #[test]
    fn test_date_rfc3339() {
        let result = date(&Value::from("1996-12-19T16:39:57-08:00"), Some(&Value::from("%Y-%m-%d %z")));
        assert_eq!(result, Value::from("1996-12-19 -0800"));
    }

    #[cfg(feature = "date")]
    #[test]
    fn test_date_yyyy_mm_dd() {
        let result = date(&Value::from("2017-03-05"), Some(&Value::from("%a, %d %b %Y %H:%M")));
        assert_eq!(result, Value::from("Sun, 05 Mar 2017 00:00"));
    }

    #[cfg(feature = "date")]
    #[test]
    fn test_date_now() {
        let result = date(&Value::from("now"), Some(&Value::from("%Y")));
        assert_eq!(result.as_str().map(str::len), Some(4));
    }

    #[cfg(feature = "date")]
    #[test]
    fn test_date_invalid_input_is_untouched() {
        assert_eq!(date(&Value::from("leto"), None), Value::from("leto"));
        assert_eq!(date(&Value::Bool(true), None), Value::Bool(true));
        assert_eq!(date(&Value::from(1482720453), Some(&Value::from("%Q"))), Value::from(1482720453));
    }
}
