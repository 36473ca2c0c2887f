use serde::{Deserialize, Serialize};

/// Land-use policy set by the player between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Governance {
    pub conservation: f32,
    pub development: f32,
    /// Predator kills allowed per in-game day.
    pub hunting_limit: u32,
    pub enforcement: f32,
    pub taxes: f32,
}

impl Default for Governance {
    fn default() -> Self {
        Governance {
            conservation: 0.5,
            development: 0.3,
            hunting_limit: 50,
            enforcement: 0.5,
            taxes: 0.2,
        }
    }
}

impl Governance {
    /// Copy with every fractional lever forced into [0, 1].
    pub fn clamped(self) -> Self {
        let unit = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Governance {
            conservation: unit(self.conservation),
            development: unit(self.development),
            hunting_limit: self.hunting_limit,
            enforcement: unit(self.enforcement),
            taxes: unit(self.taxes),
        }
    }

    /// Development pressure on a developed cell after conservation offsets it.
    pub fn development_impact(&self) -> f32 {
        self.development * (1.0 - self.conservation * 0.5)
    }

    /// Whether a protected cell is actually defended against hunting.
    pub fn protection_enforced(&self) -> bool {
        self.enforcement >= 0.5
    }
}
