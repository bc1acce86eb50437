use std::{str::FromStr, sync::LazyLock, time::Duration};

use regex::Regex;
use thiserror::Error;

pub const DEFAULT_EXPIRES_IN: &str = "2 weeks";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DurationError {
    #[error("duration is empty")]
    Empty,
    #[error("unknown duration unit '{0}' (use seconds, minutes, hours, days or weeks)")]
    UnknownUnit(String),
    #[error("unexpected text '{0}' in duration")]
    UnexpectedText(String),
    #[error("duration must be greater than zero")]
    Zero,
    #[error("duration is too long")]
    Overflow
}

static COMPONENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*([a-z]+)").unwrap()
});

/// Requested session lifetime, e.g. `2 weeks` or `1d 12h`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiresIn(Duration);

impl ExpiresIn {
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

fn unit_seconds(unit: &str) -> Option<u64> {
    Some(match unit.to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 60 * 60,
        "d" | "day" | "days" => 24 * 60 * 60,
        "w" | "wk" | "wks" | "week" | "weeks" => 7 * 24 * 60 * 60,
        _ => return None
    })
}

/// text between components may only be whitespace, commas or "and"
fn check_separator(text: &str) -> Result<(), DurationError> {
    let rest = text.trim_matches(|c: char| c.is_whitespace() || c == ',');
    if rest.is_empty() || rest.eq_ignore_ascii_case("and") {
        Ok(())
    } else {
        Err(DurationError::UnexpectedText(rest.into()))
    }
}

impl FromStr for ExpiresIn {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(DurationError::Empty);
        }

        let mut total: u64 = 0;
        let mut last_end = 0;
        for caps in COMPONENT_RE.captures_iter(s) {
            let Some(whole) = caps.get(0) else { continue };
            check_separator(&s[last_end..whole.start()])?;
            last_end = whole.end();

            let count: u64 = caps[1].parse().map_err(|_| DurationError::Overflow)?;
            let unit = unit_seconds(&caps[2])
                .ok_or_else(|| DurationError::UnknownUnit(caps[2].to_string()))?;
            total = count.checked_mul(unit)
                .and_then(|secs| total.checked_add(secs))
                .ok_or(DurationError::Overflow)?;
        }
        check_separator(&s[last_end..])?;

        if total == 0 {
            return Err(DurationError::Zero);
        }
        Ok(Self(Duration::from_secs(total)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: &str) -> u64 {
        s.parse::<ExpiresIn>().unwrap().as_duration().as_secs()
    }

    #[test]
    fn default_is_two_weeks() {
        assert_eq!(secs(DEFAULT_EXPIRES_IN), 14 * 24 * 60 * 60);
    }

    #[test]
    fn accepts_compound_durations() {
        assert_eq!(secs("1d 12h"), 36 * 60 * 60);
        assert_eq!(secs("1 hour, 30 minutes"), 90 * 60);
        assert_eq!(secs("2 Days and 5s"), 2 * 86400 + 5);
        assert_eq!(secs("90m"), 5400);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!("".parse::<ExpiresIn>(), Err(DurationError::Empty));
        assert_eq!("3 fortnights".parse::<ExpiresIn>(), Err(DurationError::UnknownUnit("fortnights".into())));
        assert_eq!("soon".parse::<ExpiresIn>(), Err(DurationError::UnexpectedText("soon".into())));
        assert_eq!("5".parse::<ExpiresIn>(), Err(DurationError::UnexpectedText("5".into())));
        assert_eq!("0 days".parse::<ExpiresIn>(), Err(DurationError::Zero));
        assert_eq!("99999999999999999999 weeks".parse::<ExpiresIn>(), Err(DurationError::Overflow));
    }
}
