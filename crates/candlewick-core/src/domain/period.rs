use std::fmt::{Display, Formatter};

use serde::{Serialize, Serializer};

/// Candlestick window requested by a client.
///
/// Parsing never fails: an unknown tag is kept as `Unrecognized` and selects
/// the whole series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
    Unrecognized(String),
}

impl Period {
    /// Tag used when a request does not name a period.
    pub const DEFAULT_TAG: &'static str = "year";

    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "day" => Self::Day,
            "week" => Self::Week,
            "month" => Self::Month,
            "year" => Self::Year,
            _ => Self::Unrecognized(tag.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::Unrecognized(tag) => tag,
        }
    }

    /// Trailing record count for count-based windows. `Day` selects by date
    /// and `Unrecognized` selects everything, so both return `None`.
    pub const fn record_limit(&self) -> Option<usize> {
        match self {
            Self::Week => Some(7),
            Self::Month => Some(30),
            Self::Year => Some(365),
            Self::Day | Self::Unrecognized(_) => None,
        }
    }

    pub const fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// Human label for response metadata.
    pub const fn time_range_label(&self) -> &'static str {
        match self {
            Self::Day => "Today",
            Self::Week => "Last 7 days",
            Self::Month => "Last 30 days",
            Self::Year => "Last 365 days",
            Self::Unrecognized(_) => "Unknown period",
        }
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::Year
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Period {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tags_case_insensitively() {
        assert_eq!(Period::from_tag("day"), Period::Day);
        assert_eq!(Period::from_tag(" Week "), Period::Week);
        assert_eq!(Period::from_tag("MONTH"), Period::Month);
        assert_eq!(Period::from_tag("year"), Period::Year);
    }

    #[test]
    fn keeps_unknown_tag_verbatim() {
        let period = Period::from_tag("bogus");
        assert_eq!(period, Period::Unrecognized(String::from("bogus")));
        assert!(!period.is_recognized());
        assert_eq!(period.as_str(), "bogus");
        assert_eq!(period.time_range_label(), "Unknown period");
        assert_eq!(period.record_limit(), None);
    }

    #[test]
    fn default_matches_default_tag() {
        assert_eq!(Period::default(), Period::from_tag(Period::DEFAULT_TAG));
    }
}
