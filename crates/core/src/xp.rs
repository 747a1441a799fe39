//! Experience accrual.
//!
//! The amount of XP needed to advance a level is piecewise-linear in three
//! bands, with coefficients that changed between game versions. Absorbing an
//! orb adds to the running totals and carries fractional progress across
//! level-ups, recomputing the per-level threshold at every step.

use serde::{Deserialize, Serialize};

/// One band of the threshold formula: applies from `min_level` upward.
type Band = (u32, i64, i64);

/// Which version of the level-up formula to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum XpRuleset {
    /// The formula from game version 1.8 onward.
    #[default]
    Modern,
    /// The pre-1.8 formula.
    Legacy,
}

impl XpRuleset {
    /// Bands as `(min_level, slope, intercept)`, highest band first.
    fn bands(self) -> [Band; 3] {
        match self {
            XpRuleset::Modern => [(31, 9, -158), (16, 5, -38), (0, 2, 7)],
            XpRuleset::Legacy => [(31, 7, -148), (16, 3, -28), (0, 0, 17)],
        }
    }

    /// XP needed to go from `level` to the next one.
    pub fn next_level_threshold(self, level: u32) -> u32 {
        let bands = self.bands();
        // The last band starts at level 0, so the search always succeeds.
        let (_, slope, intercept) = bands
            .into_iter()
            .find(|&(min_level, _, _)| level >= min_level)
            .unwrap_or(bands[2]);
        (slope * i64::from(level) + intercept) as u32
    }
}

/// A player's experience, mutated only by [`PlayerXpState::absorb`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerXpState {
    /// Current experience level.
    pub level: u32,
    /// Fractional advancement toward `level + 1`, in `[0, 1)`.
    pub progress: f64,
    /// Lifetime experience collected.
    pub total_xp: u64,
    /// Score shown on the death screen.
    pub score: u64,
}

impl PlayerXpState {
    /// Absorb an experience amount, returning the updated state.
    ///
    /// `amount` is added to `total_xp` and `score` verbatim. Progress toward
    /// the next level carries over one level at a time: the fractional share
    /// past 1.0 is converted back to absolute points using the threshold of
    /// the level being left, then divided by the threshold of the level being
    /// entered. Absorbing zero returns the same numeric state.
    #[must_use]
    pub fn absorb(&self, amount: u32, ruleset: XpRuleset) -> PlayerXpState {
        let mut level = self.level;
        let mut progress =
            self.progress + f64::from(amount) / f64::from(ruleset.next_level_threshold(level));

        while progress >= 1.0 {
            progress = (progress - 1.0) * f64::from(ruleset.next_level_threshold(level));
            level += 1;
            progress /= f64::from(ruleset.next_level_threshold(level));
        }

        PlayerXpState {
            level,
            progress,
            total_xp: self.total_xp + u64::from(amount),
            score: self.score + u64::from(amount),
        }
    }
}
