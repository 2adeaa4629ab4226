use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 基于加速度幅值分段的粗粒度运动分类
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MovementPattern {
    Standing,
    Walking,
    Running,
}

impl MovementPattern {
    pub const ALL: [MovementPattern; 3] = [
        MovementPattern::Standing,
        MovementPattern::Walking,
        MovementPattern::Running,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementPattern::Standing => "Standing",
            MovementPattern::Walking => "Walking",
            MovementPattern::Running => "Running",
        }
    }
}

impl fmt::Display for MovementPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown movement pattern: {0}")]
pub struct ParsePatternError(pub String);

impl FromStr for MovementPattern {
    type Err = ParsePatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MovementPattern::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParsePatternError(s.to_string()))
    }
}

/// Metrics derived from exactly one raw sample; shares that sample's timestamp
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DerivedMetrics {
    pub timestamp: DateTime<Utc>,
    pub speed: f64,
    pub kick_detected: bool,
    pub kick_power: f64,
    pub step_detected: bool,
    pub movement_pattern: MovementPattern,
    pub jump_height: f64,
    pub impact_force: f64,
    pub rotation_rate: f64,
}
