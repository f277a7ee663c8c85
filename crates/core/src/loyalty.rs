//! Loyalty tiers derived from accumulated points.
//!
//! A [`TierTable`] is an ordered list of tiers with strictly increasing,
//! inclusive point thresholds and contiguous levels starting at 1. Every
//! point total maps to exactly one tier; totals below the first threshold
//! land on the entry tier.

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyTier {
    pub level: u32,
    pub name: String,
    pub min_points: u64,
}

impl LoyaltyTier {
    pub fn new(level: u32, name: impl Into<String>, min_points: u64) -> Self {
        Self { level, name: name.into(), min_points }
    }
}

/// Level a user currently sits at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLevel {
    pub level: u32,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    /// Fraction of the way to the next tier, always within `0.0..=1.0`.
    pub progress: f64,
    pub points_to_next: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoyaltyStatus {
    pub points: u64,
    pub level: UserLevel,
    pub progress: LevelProgress,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TierTable {
    tiers: Vec<LoyaltyTier>,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                LoyaltyTier::new(1, "Bronce", 0),
                LoyaltyTier::new(2, "Plata", 500),
                LoyaltyTier::new(3, "Oro", 1_500),
                LoyaltyTier::new(4, "Platino", 3_000),
                LoyaltyTier::new(5, "Diamante", 6_000),
            ],
        }
    }
}

impl TierTable {
    pub fn new(tiers: Vec<LoyaltyTier>) -> Result<Self, DomainError> {
        if tiers.is_empty() {
            return Err(DomainError::InvariantViolation(
                "loyalty tier table must define at least one tier".to_string(),
            ));
        }

        for (index, tier) in tiers.iter().enumerate() {
            let expected_level = u32::try_from(index + 1).unwrap_or(u32::MAX);
            if tier.level != expected_level {
                return Err(DomainError::InvariantViolation(format!(
                    "loyalty tier `{}` has level {} but position {expected_level}",
                    tier.name, tier.level
                )));
            }
        }

        if tiers.windows(2).any(|pair| pair[0].min_points >= pair[1].min_points) {
            return Err(DomainError::InvariantViolation(
                "loyalty tier thresholds must be strictly increasing".to_string(),
            ));
        }

        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[LoyaltyTier] {
        &self.tiers
    }

    pub fn max_level(&self) -> u32 {
        self.tiers.last().map(|tier| tier.level).unwrap_or(1)
    }

    fn tier_for(&self, points: u64) -> &LoyaltyTier {
        // Non-empty by construction; `tiers[0]` is the entry tier.
        self.tiers.iter().rev().find(|tier| tier.min_points <= points).unwrap_or(&self.tiers[0])
    }

    fn tier_by_level(&self, level: u32) -> Option<&LoyaltyTier> {
        self.tiers.iter().find(|tier| tier.level == level)
    }

    pub fn level_for(&self, points: u64) -> UserLevel {
        let tier = self.tier_for(points);
        UserLevel { level: tier.level, name: tier.name.clone() }
    }

    pub fn progress_to_next_level(&self, points: u64, current: &UserLevel) -> LevelProgress {
        let Some(current_tier) = self.tier_by_level(current.level) else {
            return self.progress_to_next_level(points, &self.level_for(points));
        };
        let Some(next_tier) = self.tier_by_level(current.level + 1) else {
            return LevelProgress { progress: 1.0, points_to_next: 0 };
        };

        let span = (next_tier.min_points - current_tier.min_points) as f64;
        let earned = points.saturating_sub(current_tier.min_points) as f64;
        let progress = if span > 0.0 { (earned / span).clamp(0.0, 1.0) } else { 1.0 };

        LevelProgress { progress, points_to_next: next_tier.min_points.saturating_sub(points) }
    }

    pub fn status(&self, points: u64) -> LoyaltyStatus {
        let level = self.level_for(points);
        let progress = self.progress_to_next_level(points, &level);
        LoyaltyStatus { points, level, progress }
    }
}

/// Level for `points` under the default tier table.
pub fn get_user_level(points: u64) -> UserLevel {
    TierTable::default().level_for(points)
}

pub fn get_progress_to_next_level(points: u64, current: &UserLevel) -> LevelProgress {
    TierTable::default().progress_to_next_level(points, current)
}
