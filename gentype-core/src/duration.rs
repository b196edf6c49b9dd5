//! Go formatted [`Duration`]s.
use std::{fmt, time};

/// A duration that renders in the format of Go's `time.Duration.String()`.
///
/// The apiserver parses the `timeout` query parameter with `time.ParseDuration()`,
/// so client side timeouts are rendered the way a Go client would render them:
/// thirty seconds is `30s`, ninety seconds is `1m30s` and an hour is `1h0m0s`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Duration(time::Duration);

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

impl Duration {
    /// A duration of whole seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self(time::Duration::from_secs(secs))
    }

    /// The wrapped std duration
    pub fn as_std(&self) -> time::Duration {
        self.0
    }
}

impl From<time::Duration> for Duration {
    fn from(duration: time::Duration) -> Self {
        Self(duration)
    }
}

impl From<Duration> for time::Duration {
    fn from(Duration(duration): Duration) -> Self {
        duration
    }
}

/// Writes `value / unit` with the remainder as a decimal fraction without trailing zeros
fn write_fraction(f: &mut fmt::Formatter<'_>, value: u128, unit: u128, width: usize) -> fmt::Result {
    let whole = value / unit;
    let rem = value % unit;
    if rem == 0 {
        return write!(f, "{whole}");
    }
    let digits = format!("{rem:0width$}");
    write!(f, "{whole}.{}", digits.trim_end_matches('0'))
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = self.0.as_nanos();
        if nanos == 0 {
            return f.write_str("0s");
        }
        if nanos < NANOS_PER_MICRO {
            return write!(f, "{nanos}ns");
        }
        if nanos < NANOS_PER_MILLI {
            write_fraction(f, nanos, NANOS_PER_MICRO, 3)?;
            return f.write_str("\u{00b5}s");
        }
        if nanos < NANOS_PER_SEC {
            write_fraction(f, nanos, NANOS_PER_MILLI, 6)?;
            return f.write_str("ms");
        }

        let secs = nanos / NANOS_PER_SEC;
        let (hours, minutes) = (secs / 3600, (secs / 60) % 60);
        if hours > 0 {
            write!(f, "{hours}h")?;
        }
        if hours > 0 || minutes > 0 {
            write!(f, "{minutes}m")?;
        }
        write_fraction(f, (secs % 60) * NANOS_PER_SEC + nanos % NANOS_PER_SEC, NANOS_PER_SEC, 9)?;
        f.write_str("s")
    }
}
