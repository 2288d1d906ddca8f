use core::fmt;

use serde::{Deserialize, Serialize};

/// Threshold used when the request does not carry one.
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// Risk at or above this value is at least [`RiskLevel::Medio`].
pub const MEDIUM_RISK_FLOOR: f64 = 0.5;

/// Three-level frost risk bucket, serialized with the labels the backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Bajo,
    Medio,
    Alto,
}

impl RiskLevel {
    /// Bucket a risk score.
    ///
    /// - `risk >= threshold` → `Alto`
    /// - `risk >= 0.5` → `Medio`
    /// - otherwise `Bajo`
    ///
    /// The threshold is not clamped, so a threshold below 0.5 makes `Medio` unreachable.
    #[inline]
    #[must_use]
    pub fn classify(risk: f64, threshold: f64) -> Self {
        if risk >= threshold {
            Self::Alto
        } else if risk >= MEDIUM_RISK_FLOOR {
            Self::Medio
        } else {
            Self::Bajo
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bajo => "bajo",
            Self::Medio => "medio",
            Self::Alto => "alto",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
