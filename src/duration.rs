//! Signed durations with the script-level literal grammar.
//!
//! Durations are stored as nanoseconds and written in scripts as one or more
//! integer/unit pairs, largest unit first: `10s`, `1h30m`, `250ms`. The
//! recognized units are `u`/`µ` (microseconds), `ms`, `s`, `m`, `h`, `d`,
//! and `w`. Canonical formatting decomposes a value largest-unit-first, so
//! `90s` re-emits as `1m30s`.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

pub const MICROSECOND: i64 = 1_000;
pub const MILLISECOND: i64 = 1_000 * MICROSECOND;
pub const SECOND: i64 = 1_000 * MILLISECOND;
pub const MINUTE: i64 = 60 * SECOND;
pub const HOUR: i64 = 60 * MINUTE;
pub const DAY: i64 = 24 * HOUR;
pub const WEEK: i64 = 7 * DAY;

/// A signed span of time, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Duration(pub i64);

impl Duration {
    pub fn nanos(self) -> i64 {
        self.0
    }

    /// Parse a duration literal, e.g. `10s` or `1h30m`.
    ///
    /// Decimal durations are rejected: the lexer admits `1.5s` as a token,
    /// but only integer unit counts are valid.
    pub fn parse(literal: &str) -> Result<Duration, String> {
        let mut total: i64 = 0;
        let mut rest = literal;
        if rest.is_empty() {
            return Err("empty duration literal".to_string());
        }
        while !rest.is_empty() {
            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if digits_end == 0 {
                if rest.starts_with('.') {
                    return Err(format!(
                        "invalid duration {literal:?}: decimal durations are not supported"
                    ));
                }
                return Err(format!("invalid duration {literal:?}: missing unit count"));
            }
            let count: i64 = rest[..digits_end]
                .parse()
                .map_err(|_| format!("invalid duration {literal:?}: count out of range"))?;
            rest = &rest[digits_end..];
            if rest.starts_with('.') {
                return Err(format!(
                    "invalid duration {literal:?}: decimal durations are not supported"
                ));
            }
            let (unit, unit_len) = match rest.chars().next() {
                Some('u') => (MICROSECOND, 1),
                Some('µ') => (MICROSECOND, 'µ'.len_utf8()),
                // 'm' followed by 's' is milliseconds, else minutes
                Some('m') if rest[1..].starts_with('s') => (MILLISECOND, 2),
                Some('m') => (MINUTE, 1),
                Some('s') => (SECOND, 1),
                Some('h') => (HOUR, 1),
                Some('d') => (DAY, 1),
                Some('w') => (WEEK, 1),
                Some(c) => {
                    return Err(format!("invalid duration {literal:?}: unknown unit {c:?}"));
                }
                None => {
                    return Err(format!("invalid duration {literal:?}: missing unit"));
                }
            };
            total = count
                .checked_mul(unit)
                .and_then(|n| total.checked_add(n))
                .ok_or_else(|| format!("invalid duration {literal:?}: overflow"))?;
            rest = &rest[unit_len..];
        }
        Ok(Duration(total))
    }
}

impl fmt::Display for Duration {
    /// Canonical form: nonzero components largest-unit-first, `0s` for zero.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut n = self.0;
        if n == 0 {
            return f.write_str("0s");
        }
        if n < 0 {
            f.write_str("-")?;
            n = -n;
        }
        const UNITS: [(i64, &str); 7] = [
            (WEEK, "w"),
            (DAY, "d"),
            (HOUR, "h"),
            (MINUTE, "m"),
            (SECOND, "s"),
            (MILLISECOND, "ms"),
            (MICROSECOND, "u"),
        ];
        for (unit, suffix) in UNITS {
            if n >= unit {
                write!(f, "{}{}", n / unit, suffix)?;
                n %= unit;
            }
        }
        Ok(())
    }
}

impl Neg for Duration {
    type Output = Duration;
    fn neg(self) -> Duration {
        Duration(-self.0)
    }
}

impl Add for Duration {
    type Output = Duration;
    fn add(self, rhs: Duration) -> Duration {
        Duration(self.0 + rhs.0)
    }
}

impl Sub for Duration {
    type Output = Duration;
    fn sub(self, rhs: Duration) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl Mul<i64> for Duration {
    type Output = Duration;
    fn mul(self, rhs: i64) -> Duration {
        Duration(self.0 * rhs)
    }
}

impl Div<i64> for Duration {
    type Output = Duration;
    fn div(self, rhs: i64) -> Duration {
        Duration(self.0 / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_unit() {
        assert_eq!(Duration::parse("10s"), Ok(Duration(10 * SECOND)));
        assert_eq!(Duration::parse("5m"), Ok(Duration(5 * MINUTE)));
        assert_eq!(Duration::parse("250ms"), Ok(Duration(250 * MILLISECOND)));
        assert_eq!(Duration::parse("3u"), Ok(Duration(3 * MICROSECOND)));
        assert_eq!(Duration::parse("3µ"), Ok(Duration(3 * MICROSECOND)));
        assert_eq!(Duration::parse("2w"), Ok(Duration(2 * WEEK)));
    }

    #[test]
    fn test_parse_multi_unit() {
        assert_eq!(Duration::parse("1h30m"), Ok(Duration(HOUR + 30 * MINUTE)));
        assert_eq!(
            Duration::parse("1m30s500ms"),
            Ok(Duration(MINUTE + 30 * SECOND + 500 * MILLISECOND))
        );
    }

    #[test]
    fn test_parse_rejects_decimals() {
        assert!(Duration::parse("1.5s").is_err());
        assert!(Duration::parse("1s.5").is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Duration::parse("s").is_err());
        assert!(Duration::parse("10x").is_err());
        assert!(Duration::parse("10").is_err());
        assert!(Duration::parse("").is_err());
    }

    #[test]
    fn test_canonical_format() {
        assert_eq!(Duration(0).to_string(), "0s");
        assert_eq!(Duration(10 * SECOND).to_string(), "10s");
        assert_eq!(Duration(90 * SECOND).to_string(), "1m30s");
        assert_eq!(Duration(HOUR + 30 * MINUTE).to_string(), "1h30m");
        assert_eq!(Duration(-(HOUR + 30 * MINUTE)).to_string(), "-1h30m");
        assert_eq!(Duration(8 * DAY).to_string(), "1w1d");
    }

    #[test]
    fn test_format_parse_round_trip() {
        for nanos in [
            0,
            SECOND,
            90 * SECOND,
            HOUR + MINUTE + SECOND,
            3 * WEEK + 2 * DAY,
            500 * MICROSECOND,
        ] {
            let formatted = Duration(nanos).to_string();
            assert_eq!(Duration::parse(&formatted), Ok(Duration(nanos)), "{formatted}");
        }
    }
}
