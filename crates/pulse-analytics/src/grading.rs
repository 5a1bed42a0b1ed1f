//! Session performance classification.
//!
//! Compares a session-open snapshot against the current price and maps
//! the move into a small fixed label set. The snapshot is read-only
//! here; capture lives in [`crate::snapshot`].

use pulse_core::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session performance label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionGrade {
    StrongUp,
    Up,
    Flat,
    Down,
    StrongDown,
}

impl fmt::Display for SessionGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrongUp => write!(f, "STRONG_UP"),
            Self::Up => write!(f, "UP"),
            Self::Flat => write!(f, "FLAT"),
            Self::Down => write!(f, "DOWN"),
            Self::StrongDown => write!(f, "STRONG_DOWN"),
        }
    }
}

/// Percent-move boundaries between labels.
#[derive(Debug, Clone)]
pub struct GradeThresholds {
    /// Moves at or beyond this magnitude are Strong.
    pub strong_pct: Decimal,
    /// Moves within this magnitude are Flat.
    pub flat_pct: Decimal,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            strong_pct: Decimal::TWO,
            flat_pct: Decimal::new(2, 1), // 0.2
        }
    }
}

impl GradeThresholds {
    /// Classify the move from the session-open price to the current
    /// price. Returns None when the open price is zero.
    pub fn classify(&self, open: Price, current: Price) -> Option<SessionGrade> {
        let pct = current.pct_from(open)?;
        let grade = if pct >= self.strong_pct {
            SessionGrade::StrongUp
        } else if pct <= -self.strong_pct {
            SessionGrade::StrongDown
        } else if pct.abs() <= self.flat_pct {
            SessionGrade::Flat
        } else if pct.is_sign_positive() {
            SessionGrade::Up
        } else {
            SessionGrade::Down
        };
        Some(grade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn price(v: Decimal) -> Price {
        Price::new(v)
    }

    #[test]
    fn test_full_label_set() {
        let thresholds = GradeThresholds::default();
        let open = price(dec!(100));

        assert_eq!(
            thresholds.classify(open, price(dec!(103))),
            Some(SessionGrade::StrongUp)
        );
        assert_eq!(
            thresholds.classify(open, price(dec!(101))),
            Some(SessionGrade::Up)
        );
        assert_eq!(
            thresholds.classify(open, price(dec!(100.1))),
            Some(SessionGrade::Flat)
        );
        assert_eq!(
            thresholds.classify(open, price(dec!(99))),
            Some(SessionGrade::Down)
        );
        assert_eq!(
            thresholds.classify(open, price(dec!(97))),
            Some(SessionGrade::StrongDown)
        );
    }

    #[test]
    fn test_threshold_boundaries() {
        let thresholds = GradeThresholds::default();
        let open = price(dec!(100));

        // Exactly +2% is Strong; exactly ±0.2% is Flat.
        assert_eq!(
            thresholds.classify(open, price(dec!(102))),
            Some(SessionGrade::StrongUp)
        );
        assert_eq!(
            thresholds.classify(open, price(dec!(100.2))),
            Some(SessionGrade::Flat)
        );
        assert_eq!(
            thresholds.classify(open, price(dec!(99.8))),
            Some(SessionGrade::Flat)
        );
    }

    #[test]
    fn test_zero_open_is_unclassifiable() {
        let thresholds = GradeThresholds::default();
        assert_eq!(thresholds.classify(Price::ZERO, price(dec!(10))), None);
    }
}
