use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// The kinds of post the pipeline knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Quote,
    Story,
    Prediction,
    Meme,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Quote,
        ContentKind::Story,
        ContentKind::Prediction,
        ContentKind::Meme,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Quote => "quote",
            ContentKind::Story => "story",
            ContentKind::Prediction => "prediction",
            ContentKind::Meme => "meme",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quote" => Ok(ContentKind::Quote),
            "story" => Ok(ContentKind::Story),
            "prediction" | "crypto" => Ok(ContentKind::Prediction),
            "meme" => Ok(ContentKind::Meme),
            other => Err(format!(
                "unknown content kind '{other}'; expected quote, story, prediction or meme"
            )),
        }
    }
}

/// Half-day partition used as the publish dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    /// 00:00 to 11:59 local time.
    Morning,
    /// 12:00 to 23:59 local time.
    Evening,
}

impl TimeSlot {
    #[must_use]
    pub fn from_hour(hour: u32) -> Self {
        if hour < 12 {
            TimeSlot::Morning
        } else {
            TimeSlot::Evening
        }
    }

    /// Slot containing the wall-clock time of `at`.
    #[must_use]
    pub fn of<T: Timelike>(at: &T) -> Self {
        Self::from_hour(at.hour())
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeSlot::Morning => write!(f, "morning"),
            TimeSlot::Evening => write!(f, "evening"),
        }
    }
}

/// A wall-clock trigger time such as `09:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    #[must_use]
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    #[must_use]
    pub fn as_naive(self) -> NaiveTime {
        self.0
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self)
            .map_err(|e| format!("invalid time of day '{}': {e}", s.trim()))
    }
}

/// Ordered, de-duplicated set of daily trigger times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTable {
    times: Vec<TimeOfDay>,
}

impl ScheduleTable {
    #[must_use]
    pub fn new(mut times: Vec<TimeOfDay>) -> Self {
        times.sort_unstable();
        times.dedup();
        Self { times }
    }

    /// Parse a comma-separated list such as `09:00,14:00,19:00`.
    ///
    /// # Errors
    ///
    /// Returns a description of the first entry that is not a valid `HH:MM`
    /// time, or an error if the list is empty.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let times = raw
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse::<TimeOfDay>)
            .collect::<Result<Vec<_>, _>>()?;
        if times.is_empty() {
            return Err("schedule table must contain at least one time".to_string());
        }
        Ok(Self::new(times))
    }

    #[must_use]
    pub fn times(&self) -> &[TimeOfDay] {
        &self.times
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

impl std::fmt::Display for ScheduleTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .times
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}
