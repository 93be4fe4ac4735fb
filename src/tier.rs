//! Confidence-tier encoding.
//!
//! A stabilized estimator reports its convergence state by adding a fixed
//! offset to the raw confidence scalar:
//!
//! | encoded range        | tier          | marker |
//! |----------------------|---------------|--------|
//! | `< 10000`            | `Pending`     | `(x)`  |
//! | `10000 ..= 19999`    | `InProgress`  | `(-)`  |
//! | `>= 20000`           | `Complete`    | `(*)`  |
//!
//! Offsets are applied once per frame to that frame's raw confidence and never
//! accumulate across frames.

use serde::{Deserialize, Serialize};

/// Offset added to a confidence whose estimate is still converging.
pub const IN_PROGRESS_OFFSET: i32 = 10_000;

/// Offset added to a confidence whose estimate is final.
pub const COMPLETE_OFFSET: i32 = 20_000;

/// Convergence state of a multi-frame estimator for one tracked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Tier {
    #[default]
    Pending,
    InProgress,
    Complete,
}

impl Tier {
    /// Additive offset encoding this tier.
    #[inline]
    pub const fn offset(self) -> i32 {
        match self {
            Self::Pending => 0,
            Self::InProgress => IN_PROGRESS_OFFSET,
            Self::Complete => COMPLETE_OFFSET,
        }
    }

    /// Display marker used next to a decoded confidence.
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Pending => "(x)",
            Self::InProgress => "(-)",
            Self::Complete => "(*)",
        }
    }
}

/// Confidence split into its tier and raw detector value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TieredConfidence {
    pub tier: Tier,
    pub raw: i32,
}

impl TieredConfidence {
    /// Split an encoded confidence.
    pub fn decode(encoded: i32) -> Self {
        let tier = if encoded >= COMPLETE_OFFSET {
            Tier::Complete
        } else if encoded >= IN_PROGRESS_OFFSET {
            Tier::InProgress
        } else {
            Tier::Pending
        };
        Self {
            tier,
            raw: encoded - tier.offset(),
        }
    }

    pub fn encode(self) -> i32 {
        encode(self.raw, self.tier)
    }
}

/// Encode `raw` at `tier`.
#[inline]
pub fn encode(raw: i32, tier: Tier) -> i32 {
    raw.saturating_add(tier.offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(TieredConfidence::decode(9_999).tier, Tier::Pending);
        assert_eq!(TieredConfidence::decode(10_000).tier, Tier::InProgress);
        assert_eq!(TieredConfidence::decode(19_999).tier, Tier::InProgress);
        assert_eq!(TieredConfidence::decode(20_000).tier, Tier::Complete);
        assert_eq!(TieredConfidence::decode(20_000).raw, 0);
    }

    #[test]
    fn test_in_progress_below_complete() {
        for raw in [0, 1, 450, 999, 9_999] {
            assert!(encode(raw, Tier::InProgress) < encode(raw, Tier::Complete));
            assert!(encode(raw, Tier::Pending) < encode(raw, Tier::InProgress));
        }
    }

    #[test]
    fn test_decode_recovers_raw() {
        for tier in [Tier::Pending, Tier::InProgress, Tier::Complete] {
            let decoded = TieredConfidence::decode(encode(450, tier));
            assert_eq!(decoded, TieredConfidence { tier, raw: 450 });
            assert_eq!(decoded.encode(), encode(450, tier));
        }
    }

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Pending < Tier::InProgress);
        assert!(Tier::InProgress < Tier::Complete);
        assert_eq!(Tier::Complete.marker(), "(*)");
    }
}
