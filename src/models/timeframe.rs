use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The three granularities the scalp engine consumes: M1 is the fast series
/// driving the director, M5 the medium confirmation, M15 the slow series
/// carrying the cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
        }
    }

    pub fn as_duration(&self) -> Duration {
        match self {
            Timeframe::M1 => Duration::from_secs(60),
            Timeframe::M5 => Duration::from_secs(300),
            Timeframe::M15 => Duration::from_secs(900),
        }
    }

    pub fn as_seconds(&self) -> u64 {
        self.as_duration().as_secs()
    }

    /// Bars required before the engine treats this series as warmed up.
    /// The slow series carries the 52-period cloud span, hence its minimum.
    pub fn warmup_bars(&self) -> usize {
        match self {
            Timeframe::M1 => 30,
            Timeframe::M5 => 20,
            Timeframe::M15 => 52,
        }
    }

    /// Granularity string for the market-data REST API.
    pub fn api_granularity(&self) -> &'static str {
        match self {
            Timeframe::M1 => "ONE_MINUTE",
            Timeframe::M5 => "FIVE_MINUTE",
            Timeframe::M15 => "FIFTEEN_MINUTE",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Timeframe> {
        match s {
            "1m" => Some(Timeframe::M1),
            "5m" => Some(Timeframe::M5),
            "15m" => Some(Timeframe::M15),
            _ => None,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
