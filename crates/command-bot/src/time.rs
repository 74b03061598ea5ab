//! Date and time coercions for command parameters.

use async_trait::async_trait;
use chrono::{
    DateTime, Days, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use command_engine::{Coerce, ExecutionContext, Value};
use std::time::Duration;

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Longest delay a relative time may express.
const MAX_RELATIVE: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Absolute points in time, read in a fixed offset.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM`, `YYYY-MM-DD`, `HH:MM`, `3pm` and
/// `3:30pm`. Values without a date mean the next time the clock shows them.
#[derive(Debug, Clone, Copy)]
pub struct AbsoluteTime {
    offset: FixedOffset,
}

impl AbsoluteTime {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Parse `token` relative to `now`.
    pub fn parse(&self, token: &str, now: DateTime<FixedOffset>) -> Result<DateTime<FixedOffset>, String> {
        let token = token.trim();

        if let Ok(parsed) = DateTime::parse_from_rfc3339(token) {
            return Ok(parsed);
        }

        for format in DATE_TIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(token, format) {
                return self.localize(naive);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
            let midnight = date.and_hms_opt(0, 0, 0).ok_or("invalid date")?;
            return self.localize(midnight);
        }

        let time = parse_clock(token)
            .ok_or_else(|| format!("`{}` is not a date or time I understand", token))?;
        let now = now.with_timezone(&self.offset);
        let today = self.localize(now.date_naive().and_time(time))?;
        if today > now {
            return Ok(today);
        }

        let tomorrow = now
            .date_naive()
            .checked_add_days(Days::new(1))
            .ok_or("date out of range")?;
        self.localize(tomorrow.and_time(time))
    }

    fn localize(&self, naive: NaiveDateTime) -> Result<DateTime<FixedOffset>, String> {
        self.offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| format!("{} does not exist in {}", naive, self.offset))
    }
}

#[async_trait]
impl Coerce for AbsoluteTime {
    async fn coerce(&self, token: &str, _ctx: &ExecutionContext) -> Result<Value, String> {
        let now = Utc::now().with_timezone(&self.offset);
        self.parse(token, now).map(Value::DateTime)
    }
}

/// `HH:MM` (24 hour), `3pm` or `3:30pm`.
fn parse_clock(token: &str) -> Option<NaiveTime> {
    let lower = token.to_ascii_lowercase();
    let (body, meridiem) = if let Some(body) = lower.strip_suffix("am") {
        (body.trim_end(), Some(false))
    } else if let Some(body) = lower.strip_suffix("pm") {
        (body.trim_end(), Some(true))
    } else {
        (lower.as_str(), None)
    };

    let (hour, minute) = match body.split_once(':') {
        Some((h, m)) if m.len() == 2 => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
        Some(_) => return None,
        None if meridiem.is_some() => (body.parse::<u32>().ok()?, 0),
        None => return None,
    };

    let hour = match meridiem {
        Some(pm) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            (hour % 12) + if pm { 12 } else { 0 }
        }
        None => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Delays from now: humantime (`3h`, `90m`, `1h 30m`), optionally led by
/// `in`, or a bare number of hours.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelativeTime;

impl RelativeTime {
    pub fn parse(&self, token: &str) -> Result<Duration, String> {
        let token = token.trim();
        let token = token
            .strip_prefix("in ")
            .map(str::trim_start)
            .unwrap_or(token);

        let duration = match token.parse::<f64>() {
            Ok(hours) if hours.is_finite() && hours > 0.0 => {
                Duration::try_from_secs_f64(hours * 3600.0).map_err(|e| e.to_string())?
            }
            Ok(_) => return Err(format!("`{}` is not a positive number of hours", token)),
            Err(_) => humantime::parse_duration(token)
                .map_err(|e| format!("`{}` is not a delay ({})", token, e))?,
        };

        if duration.is_zero() {
            return Err("the delay must be longer than zero".into());
        }
        if duration > MAX_RELATIVE {
            return Err("the delay must be at most a year".into());
        }
        Ok(duration)
    }
}

#[async_trait]
impl Coerce for RelativeTime {
    async fn coerce(&self, token: &str, _ctx: &ExecutionContext) -> Result<Value, String> {
        self.parse(token).map(Value::Duration)
    }
}

/// `2 days, 3 hours and 5 minutes` style rendering, largest units first.
pub fn format_long(duration: chrono::TimeDelta) -> String {
    let past = duration < chrono::TimeDelta::zero();
    let total = duration.num_seconds().unsigned_abs();

    let units = [
        (total / 86_400, "day"),
        (total % 86_400 / 3_600, "hour"),
        (total % 3_600 / 60, "minute"),
        (total % 60, "second"),
    ];
    let parts: Vec<String> = units
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{} {}{}", n, unit, if *n == 1 { "" } else { "s" }))
        .collect();

    let body = match parts.as_slice() {
        [] => "0 seconds".to_string(),
        [one] => one.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    };

    if past {
        format!("-{}", body)
    } else {
        body
    }
}
