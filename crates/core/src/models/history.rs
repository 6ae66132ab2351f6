use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Period selectable on the history view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[default]
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "90d")]
    NinetyDays,
    #[serde(rename = "1y")]
    OneYear,
}

/// How chart labels are formatted for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelGranularity {
    Hour,
    Day,
    Month,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::OneDay,
        Period::SevenDays,
        Period::ThirtyDays,
        Period::NinetyDays,
        Period::OneYear,
    ];

    /// Query-string value sent to the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::SevenDays => "7d",
            Period::ThirtyDays => "30d",
            Period::NinetyDays => "90d",
            Period::OneYear => "1y",
        }
    }

    pub fn granularity(self) -> LabelGranularity {
        match self {
            Period::OneDay => LabelGranularity::Hour,
            Period::SevenDays | Period::ThirtyDays | Period::NinetyDays => LabelGranularity::Day,
            Period::OneYear => LabelGranularity::Month,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Period {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| CoreError::Validation(format!("Unknown history period '{s}'")))
    }
}

/// One point of the portfolio evolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionPoint {
    /// `None` when the backend sent an unparseable timestamp
    pub timestamp: Option<DateTime<Utc>>,
    pub total_usd: f64,
    /// Value in the alternate currency as computed by the backend, when sent
    pub total_brl: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolutionSummary {
    pub start_value: f64,
    pub end_value: f64,
    pub change_usd: f64,
    pub change_percent: f64,
}

impl EvolutionSummary {
    /// Absolute change over the period, derived from the endpoints.
    pub fn delta(&self) -> f64 {
        self.end_value - self.start_value
    }
}

/// History data for one period selection. Replaced when the period changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionSeries {
    pub period: Period,
    pub points: Vec<EvolutionPoint>,
    pub summary: EvolutionSummary,
}
