//! Filters operating on string
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use unic_segment::GraphemeIndices;

#[cfg(feature = "urlencode")]
use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::value::Value;

/// Everything but RFC 3986 unreserved characters gets encoded
#[cfg(feature = "urlencode")]
const URL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

const DEFAULT_TRUNCATE_LENGTH: usize = 50;
const TRUNCATE_ELLIPSIS: &str = "...";

lazy_static! {
    static ref STRIPTAGS_RE: Regex = Regex::new(r"(<!--.*?-->|<[^>]*>)").unwrap();
    static ref WORDS_RE: Regex = Regex::new(r"\b(?P<first>[\w'])(?P<rest>[\w']*)\b").unwrap();
    static ref NEWLINE_RE: Regex = Regex::new(r"\r?\n").unwrap();
}

/// The argument as a string, `None` when missing or nil
fn string_arg(arg: Option<&Value>) -> Option<String> {
    match arg {
        None | Some(Value::Nil) => None,
        Some(v) => Some(v.render().into_owned()),
    }
}

/// Upper-cases the first letter of every word
pub fn capitalize(value: &Value, _: Option<&Value>) -> Value {
    let s = value.render();
    Value::from(WORDS_RE.replace_all(&s, |caps: &Captures| {
        format!("{}{}", caps["first"].to_uppercase(), &caps["rest"])
    })
    .into_owned())
}

/// Convert a value to uppercase.
pub fn upcase(value: &Value, _: Option<&Value>) -> Value {
    Value::from(value.render().to_uppercase())
}

/// Convert a value to lowercase.
pub fn downcase(value: &Value, _: Option<&Value>) -> Value {
    Value::from(value.render().to_lowercase())
}

pub fn append(value: &Value, arg: Option<&Value>) -> Value {
    let mut s = value.render().into_owned();
    if let Some(suffix) = string_arg(arg) {
        s.push_str(&suffix);
    }
    Value::from(s)
}

pub fn prepend(value: &Value, arg: Option<&Value>) -> Value {
    match string_arg(arg) {
        Some(prefix) => Value::from(prefix + &value.render()),
        None => Value::from(value.render().into_owned()),
    }
}

/// Removes every occurrence of the argument
pub fn remove(value: &Value, arg: Option<&Value>) -> Value {
    let s = value.render();
    match string_arg(arg) {
        Some(needle) if !needle.is_empty() => Value::from(s.replace(&needle, "")),
        _ => Value::from(s.into_owned()),
    }
}

/// Removes the first occurrence of the argument
pub fn remove_first(value: &Value, arg: Option<&Value>) -> Value {
    let s = value.render();
    match string_arg(arg) {
        Some(needle) if !needle.is_empty() => Value::from(s.replacen(&needle, "", 1)),
        _ => Value::from(s.into_owned()),
    }
}

/// Splits a string into a sequence on the argument, or on whitespace when there is none.
/// An empty separator splits into characters.
pub fn split(value: &Value, arg: Option<&Value>) -> Value {
    let s = value.render();
    let parts: Vec<Value> = match string_arg(arg) {
        None => s.split_whitespace().map(Value::from).collect(),
        Some(ref sep) if sep.is_empty() => s.chars().map(|c| Value::from(c.to_string())).collect(),
        Some(sep) => s.split(sep.as_str()).map(Value::from).collect(),
    };
    Value::Sequence(parts)
}

/// Removes leading and trailing whitespace
pub fn strip(value: &Value, _: Option<&Value>) -> Value {
    Value::from(value.render().trim())
}

/// Removes leading whitespace
pub fn lstrip(value: &Value, _: Option<&Value>) -> Value {
    Value::from(value.render().trim_start())
}

/// Removes trailing whitespace
pub fn rstrip(value: &Value, _: Option<&Value>) -> Value {
    Value::from(value.render().trim_end())
}

/// Truncates a string to the indicated length, ellipsis included.
///
/// # Arguments
///
/// * `value`   - The string that needs to be truncated.
/// * `arg`     - The number of characters (graphemes) to keep, 50 by default.
pub fn truncate(value: &Value, arg: Option<&Value>) -> Value {
    let s = value.render();
    let length = match arg.and_then(Value::as_i64) {
        Some(l) if l >= 0 => l as usize,
        Some(_) => 0,
        None => DEFAULT_TRUNCATE_LENGTH,
    };

    let graphemes = GraphemeIndices::new(&s).collect::<Vec<(usize, &str)>>();

    // Nothing to truncate?
    if length >= graphemes.len() {
        return Value::from(s.into_owned());
    }

    // No room left for the ellipsis
    if length <= TRUNCATE_ELLIPSIS.len() {
        return Value::from(s[..graphemes[length].0].to_string());
    }

    let keep = length - TRUNCATE_ELLIPSIS.len();
    Value::from(s[..graphemes[keep].0].to_string() + TRUNCATE_ELLIPSIS)
}

/// Removes html tags from string
pub fn strip_html(value: &Value, _: Option<&Value>) -> Value {
    Value::from(STRIPTAGS_RE.replace_all(&value.render(), "").into_owned())
}

/// Inserts a `<br />` before every line break
pub fn newline_to_br(value: &Value, _: Option<&Value>) -> Value {
    Value::from(NEWLINE_RE.replace_all(&value.render(), "<br />\n").into_owned())
}

/// Percent-encodes everything that isn't alphanumeric or one of `-_.~`
#[cfg(feature = "urlencode")]
pub fn url_encode(value: &Value, _: Option<&Value>) -> Value {
    Value::from(percent_encode(value.render().as_bytes(), URL_ENCODE_SET).to_string())
}
