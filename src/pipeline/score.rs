//! Linear checklist scoring.
//!
//! Pass counts 1, Warning ½, Fail 0; Not Applicable is left out of the
//! denominator. Arithmetic is done in half-points so the final floor is
//! exact: `floor(100 * (pass + warning/2) / valid)` equals
//! `100 * (2*pass + warning) / (2*valid)` in integer division.

use crate::output::{ReviewItem, ReviewStatus};
use serde::Serialize;

/// Status tallies for a checklist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub pass: usize,
    pub warning: usize,
    pub fail: usize,
    pub not_applicable: usize,
}

impl ScoreBreakdown {
    pub fn from_items(items: &[ReviewItem]) -> Self {
        items.iter().fold(Self::default(), |mut acc, item| {
            match item.status {
                ReviewStatus::Pass => acc.pass += 1,
                ReviewStatus::Warning => acc.warning += 1,
                ReviewStatus::Fail => acc.fail += 1,
                ReviewStatus::NotApplicable => acc.not_applicable += 1,
            }
            acc
        })
    }

    /// Items that count toward the denominator.
    pub fn valid_items(&self) -> usize {
        self.pass + self.warning + self.fail
    }

    /// Score in `0..=100`; 0 when nothing is scorable.
    pub fn score(&self) -> u8 {
        let valid = self.valid_items();
        if valid == 0 {
            return 0;
        }
        let half_points = 2 * self.pass + self.warning;
        // half_points <= 2 * valid, so the quotient is at most 100.
        ((100 * half_points) / (2 * valid)) as u8
    }
}

/// Score a checklist.
pub fn score(items: &[ReviewItem]) -> u8 {
    ScoreBreakdown::from_items(items).score()
}
