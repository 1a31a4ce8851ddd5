use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Option side a recommendation points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Call,
    Put,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Call => "CALL",
            Direction::Put => "PUT",
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Call => Direction::Put,
            Direction::Put => Direction::Call,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Strength {
    Low,
    Medium,
    High,
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strength::High => write!(f, "HIGH"),
            Strength::Medium => write!(f, "MEDIUM"),
            Strength::Low => write!(f, "LOW"),
        }
    }
}

/// Discrete reading from a directional indicator (SuperTrend, EWO).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndicatorSignal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl fmt::Display for IndicatorSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorSignal::Buy => write!(f, "BUY"),
            IndicatorSignal::Sell => write!(f, "SELL"),
            IndicatorSignal::Hold => write!(f, "HOLD"),
        }
    }
}

/// MACD crossover state. Upstream callers spell this several ways
/// (BUY/BULLISH, SELL/BEARISH, HOLD/NONE); deserialization collapses the
/// synonyms here so consumers only ever see the canonical three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum MacdCross {
    Bullish,
    Bearish,
    #[default]
    None,
}

impl MacdCross {
    pub fn from_str_loose(s: &str) -> MacdCross {
        match s.to_ascii_uppercase().as_str() {
            "BULLISH" | "BUY" => MacdCross::Bullish,
            "BEARISH" | "SELL" => MacdCross::Bearish,
            _ => MacdCross::None,
        }
    }
}

impl<'de> Deserialize<'de> for MacdCross {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(MacdCross::from_str_loose(&s))
    }
}

impl fmt::Display for MacdCross {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacdCross::Bullish => write!(f, "BULLISH"),
            MacdCross::Bearish => write!(f, "BEARISH"),
            MacdCross::None => write!(f, "NONE"),
        }
    }
}

/// Persistent directional-bias classification held by the director.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    TrendUp,
    TrendDown,
    #[default]
    Chop,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::TrendUp => write!(f, "trend_up"),
            Regime::TrendDown => write!(f, "trend_down"),
            Regime::Chop => write!(f, "chop"),
        }
    }
}

/// Failed-breakout pattern tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrapKind {
    BullTrap,
    BearTrap,
}

impl TrapKind {
    /// The direction a reversal off this trap trades toward.
    pub fn reversal_direction(&self) -> Direction {
        match self {
            TrapKind::BullTrap => Direction::Put,
            TrapKind::BearTrap => Direction::Call,
        }
    }
}

impl fmt::Display for TrapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrapKind::BullTrap => write!(f, "bull_trap"),
            TrapKind::BearTrap => write!(f, "bear_trap"),
        }
    }
}

/// Lifecycle of the single tracked recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TradeState {
    #[default]
    Idle,
    Pending,
    Active,
    Profit,
    Stopped,
}

impl fmt::Display for TradeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeState::Idle => write!(f, "idle"),
            TradeState::Pending => write!(f, "pending"),
            TradeState::Active => write!(f, "active"),
            TradeState::Profit => write!(f, "profit"),
            TradeState::Stopped => write!(f, "stopped"),
        }
    }
}
