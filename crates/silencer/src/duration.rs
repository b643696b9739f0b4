use chrono::TimeDelta;
use std::fmt;
use std::str::FromStr;

/// Longest silence which can be requested.
pub static MAX_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Unit {
    Hours,
    Minutes,
    Seconds,
}

impl Unit {
    fn seconds(self) -> u64 {
        match self {
            Self::Hours => 60 * 60,
            Self::Minutes => 60,
            Self::Seconds => 1,
        }
    }

    fn symbol(self) -> char {
        match self {
            Self::Hours => 'H',
            Self::Minutes => 'M',
            Self::Seconds => 'S',
        }
    }
}

/// How long a silence lasts: some digits followed by `H`, `M`, or `S`, like
/// `12H` or `30M`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SilenceDuration {
    amount: u64,
    unit: Unit,
}

impl SilenceDuration {
    pub fn as_seconds(&self) -> u64 {
        self.amount.saturating_mul(self.unit.seconds())
    }

    pub fn as_time_delta(&self) -> TimeDelta {
        // bounded by `MAX_SECONDS` in `from_str`
        TimeDelta::try_seconds(i64::try_from(self.as_seconds()).unwrap_or(i64::MAX))
            .unwrap_or_else(TimeDelta::max_value)
    }
}

impl fmt::Display for SilenceDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{amount}{unit}", amount = self.amount, unit = self.unit.symbol())
    }
}

impl FromStr for SilenceDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed =
            || format!("invalid duration `{s}`: expected digits followed by H, M, or S, like `30M`");

        let Some(last) = s.chars().last() else {
            return Err(malformed());
        };
        let unit = match last {
            'H' => Unit::Hours,
            'M' => Unit::Minutes,
            'S' => Unit::Seconds,
            _ => return Err(malformed()),
        };

        let digits = &s[..s.len() - 1];
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed());
        }

        let amount = digits.parse::<u64>().map_err(|_| malformed())?;
        match amount.checked_mul(unit.seconds()) {
            Some(secs) if secs <= MAX_SECONDS => Ok(Self { amount, unit }),
            _ => Err(format!(
                "invalid duration `{s}`: longer than {years} years",
                years = MAX_SECONDS / (365 * 24 * 60 * 60)
            )),
        }
    }
}
