use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Parsed value of a lenient field: absent in source, parsed, or present but unusable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<T> {
    Missing,
    Value(T),
    Malformed,
}

impl<T> FieldValue<T> {
    pub fn value(self) -> Option<T> {
        match self {
            FieldValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, FieldValue::Malformed)
    }
}

/// Parse a numeric cell. Empty cells and `NaN` are missing; anything else that fails to parse
/// (or is infinite) is malformed.
pub fn parse_number(raw: Option<&str>) -> FieldValue<f64> {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return FieldValue::Missing;
    };

    if text.eq_ignore_ascii_case("nan") {
        return FieldValue::Missing;
    }

    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => FieldValue::Value(v),
        _ => FieldValue::Malformed,
    }
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parse a position timestamp: integer Unix milliseconds, RFC 3339, or a naive ISO-8601
/// date-time taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(millis) = text.parse::<i64>() {
        return Utc.timestamp_millis_opt(millis).single();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Parse an annotations cell into a list of labels.
///
/// Accepts JSON arrays and Python-style list literals, where each item may use single or double
/// quotes. Scalars become a one-element list. Anything unparsable yields `None`; callers store an
/// empty list.
pub fn parse_annotations(raw: Option<&str>) -> Option<Vec<String>> {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Some(Vec::new());
    };

    if text == "[]" || text.eq_ignore_ascii_case("nan") {
        return Some(Vec::new());
    }

    if !text.starts_with('[') {
        return Some(vec![text.to_string()]);
    }

    match serde_json::from_str::<Vec<serde_json::Value>>(text) {
        Ok(parsed) => Some(
            parsed
                .into_iter()
                .map(|value| match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
        ),
        Err(_) => parse_list_literal(text),
    }
}

/// Flat list of quoted strings or bare tokens, e.g. `['a', "b's", 3]`. Backslash escapes are
/// honoured inside quotes. Nested lists are not supported.
fn parse_list_literal(text: &str) -> Option<Vec<String>> {
    let inner = text.strip_prefix('[')?.strip_suffix(']')?;
    let mut chars = inner.chars().peekable();
    let mut items = Vec::new();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        match chars.peek().copied() {
            None => break,
            Some(quote @ ('\'' | '"')) => {
                chars.next();
                let mut item = String::new();
                loop {
                    match chars.next()? {
                        '\\' => match chars.next()? {
                            'n' => item.push('\n'),
                            't' => item.push('\t'),
                            other => item.push(other),
                        },
                        c if c == quote => break,
                        c => item.push(c),
                    }
                }
                items.push(item);
            }
            Some(_) => {
                let mut token = String::new();
                while let Some(c) = chars.next_if(|&c| c != ',') {
                    token.push(c);
                }
                let token = token.trim();
                if token.is_empty() || token.contains(&['\'', '"', '[', ']'][..]) {
                    return None;
                }
                items.push(token.to_string());
            }
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(_) => return None,
        }
    }

    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(Some(" 12.5 ")), FieldValue::Value(12.5));
        assert_eq!(parse_number(Some("")), FieldValue::Missing);
        assert_eq!(parse_number(None), FieldValue::Missing);
        assert_eq!(parse_number(Some("NaN")), FieldValue::Missing);
        assert_eq!(parse_number(Some("fast")), FieldValue::Malformed);
        assert_eq!(parse_number(Some("inf")), FieldValue::Malformed);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("1546300800000"), Some(expected));
        assert_eq!(parse_timestamp("2019-01-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2019-01-01T02:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2019-01-01 00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2019-01-01T00:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_parse_annotations() {
        assert_eq!(parse_annotations(None), Some(vec![]));
        assert_eq!(parse_annotations(Some("[]")), Some(vec![]));
        assert_eq!(
            parse_annotations(Some("['fishing', 'anchored']")),
            Some(vec!["fishing".to_string(), "anchored".to_string()])
        );
        assert_eq!(
            parse_annotations(Some("[\"port\", 3]")),
            Some(vec!["port".to_string(), "3".to_string()])
        );
        assert_eq!(
            parse_annotations(Some("moored")),
            Some(vec!["moored".to_string()])
        );
        assert_eq!(parse_annotations(Some("['unterminated")), None);
    }

    #[test]
    fn test_python_list_with_mixed_quotes() {
        assert_eq!(
            parse_annotations(Some(r#"["captain's", 'x']"#)),
            Some(vec!["captain's".to_string(), "x".to_string()])
        );
        assert_eq!(
            parse_annotations(Some(r"['it\'s', 'trawling',]")),
            Some(vec!["it's".to_string(), "trawling".to_string()])
        );
        assert_eq!(
            parse_annotations(Some("['a', 2, True]")),
            Some(vec!["a".to_string(), "2".to_string(), "True".to_string()])
        );
        assert_eq!(parse_annotations(Some("['a' 'b']")), None);
        assert_eq!(parse_annotations(Some("[, 'a']")), None);
    }
}
