//! Token coercion.

use crate::context::ExecutionContext;
use crate::types::{ParamKind, Value};
use async_trait::async_trait;
use chrono::DateTime;
use std::time::Duration;

/// Pluggable conversion from a raw token to a typed value.
///
/// Implementations may await external lookups; only the owning
/// pipeline is suspended while they do.
#[async_trait]
pub trait Coerce: Send + Sync {
    async fn coerce(&self, token: &str, ctx: &ExecutionContext) -> Result<Value, String>;
}

/// Built-in conversion for every parameter kind.
pub(crate) fn builtin(kind: &ParamKind, token: &str) -> Result<Value, String> {
    match kind {
        ParamKind::Integer => token
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| e.to_string()),
        ParamKind::Unsigned => token
            .parse::<u64>()
            .map(Value::Unsigned)
            .map_err(|e| e.to_string()),
        ParamKind::Float => token
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| e.to_string()),
        ParamKind::Boolean => {
            if token.eq_ignore_ascii_case("true") {
                Ok(Value::Boolean(true))
            } else if token.eq_ignore_ascii_case("false") {
                Ok(Value::Boolean(false))
            } else {
                Err("expected true or false".into())
            }
        }
        ParamKind::Enum(members) => members
            .iter()
            .find(|m| m.eq_ignore_ascii_case(token))
            .map(|m| Value::Enum(m.clone()))
            .ok_or_else(|| format!("expected one of: {}", members.join(", "))),
        ParamKind::DateTime => DateTime::parse_from_rfc3339(token)
            .map(Value::DateTime)
            .map_err(|e| e.to_string()),
        ParamKind::Duration => parse_duration(token).map(Value::Duration),
        ParamKind::Text => Ok(Value::Text(token.to_string())),
        ParamKind::TextList => Ok(Value::TextList(
            token
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )),
    }
}

/// `3h`, `90m`, `1h30m`, or a bare number of hours.
fn parse_duration(token: &str) -> Result<Duration, String> {
    if let Ok(hours) = token.parse::<f64>() {
        if !(hours.is_finite() && hours >= 0.0) {
            return Err("duration must be positive".into());
        }
        return Duration::try_from_secs_f64(hours * 3600.0)
            .map_err(|_| "duration is too long".to_string());
    }
    humantime::parse_duration(token).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(builtin(&ParamKind::Integer, "-4"), Ok(Value::Integer(-4)));
        assert_eq!(builtin(&ParamKind::Unsigned, "7"), Ok(Value::Unsigned(7)));
        assert!(builtin(&ParamKind::Unsigned, "-7").is_err());
        assert_eq!(builtin(&ParamKind::Float, "2.5"), Ok(Value::Float(2.5)));
        assert!(builtin(&ParamKind::Integer, "3h").is_err());
    }

    #[test]
    fn test_boolean_is_case_insensitive() {
        assert_eq!(builtin(&ParamKind::Boolean, "TRUE"), Ok(Value::Boolean(true)));
        assert_eq!(builtin(&ParamKind::Boolean, "False"), Ok(Value::Boolean(false)));
        assert!(builtin(&ParamKind::Boolean, "yes").is_err());
    }

    #[test]
    fn test_enum_returns_canonical_member() {
        let kind = ParamKind::enumeration(["Create", "Edit", "Delete"]);
        assert_eq!(builtin(&kind, "edit"), Ok(Value::Enum("Edit".into())));
        let err = builtin(&kind, "rename").unwrap_err();
        assert!(err.contains("Create, Edit, Delete"));
    }

    #[test]
    fn test_duration_forms() {
        assert_eq!(
            builtin(&ParamKind::Duration, "3h"),
            Ok(Value::Duration(Duration::from_secs(3 * 3600)))
        );
        assert_eq!(
            builtin(&ParamKind::Duration, "2"),
            Ok(Value::Duration(Duration::from_secs(2 * 3600)))
        );
        assert!(builtin(&ParamKind::Duration, "3pm").is_err());
    }

    #[test]
    fn test_huge_hour_count_is_rejected() {
        assert_eq!(
            builtin(&ParamKind::Duration, "1e300"),
            Err("duration is too long".to_string())
        );
        assert!(builtin(&ParamKind::Duration, "-1").is_err());
    }

    #[test]
    fn test_text_list_splits_on_commas() {
        assert_eq!(
            builtin(&ParamKind::TextList, "red, green,,blue"),
            Ok(Value::TextList(vec![
                "red".into(),
                "green".into(),
                "blue".into()
            ]))
        );
    }
}
