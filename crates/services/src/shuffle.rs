//! Answer-order shuffling.
//!
//! Live sessions use pure randomness so positions carry no signal. The daily
//! challenge uses a date-seeded generator so every player sees the same
//! order on a given day.

use chrono::{Datelike, NaiveDate};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// How a session permutes each question's answer choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShuffleStrategy {
    /// Fresh randomness on every load.
    Live,
    /// Deterministic order derived from the challenge date.
    DailyChallenge { date: NaiveDate },
}

impl ShuffleStrategy {
    #[must_use]
    pub fn daily_challenge(date: NaiveDate) -> Self {
        Self::DailyChallenge { date }
    }

    /// Shuffle `items` in place.
    ///
    /// `salt` distinguishes questions within one session so the daily
    /// challenge does not apply the same permutation to every question;
    /// the live strategy ignores it.
    pub fn shuffle<T>(&self, items: &mut [T], salt: u64) {
        match self {
            ShuffleStrategy::Live => {
                items.shuffle(&mut rand::rng());
            }
            ShuffleStrategy::DailyChallenge { date } => {
                let day = i64::from(date.num_days_from_ce());
                #[allow(clippy::cast_sign_loss)]
                let seed = (day as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ salt;
                let mut rng = StdRng::seed_from_u64(seed);
                items.shuffle(&mut rng);
            }
        }
    }
}
