// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! SM-2 interval and ease-factor scheduling.

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::timestamp::Timestamp;

/// Ease factor of a verse that has never been scheduled.
pub const INITIAL_EASE_FACTOR: EaseFactor = 2.5;

/// Lower bound on the ease factor.
pub const MIN_EASE_FACTOR: EaseFactor = 1.3;

/// Days until the next review.
pub type Interval = u32;

pub type EaseFactor = f64;

/// Self-assessed recall quality, 0 to 5. Below 3 is a failed recall.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    /// Lowest passing quality.
    pub const PASS_THRESHOLD: u8 = 3;

    /// What a boolean "got it" counts as.
    pub const PASS_DEFAULT: Quality = Quality(4);

    /// What a boolean "needs practice" counts as.
    pub const FAIL_DEFAULT: Quality = Quality(2);

    pub fn new(value: u8) -> Fallible<Self> {
        if value > Self::MAX {
            return fail(format!(
                "recall quality must be between 0 and {}, got {value}",
                Self::MAX
            ));
        }
        Ok(Self(value))
    }

    pub fn from_success(success: bool) -> Self {
        if success {
            Self::PASS_DEFAULT
        } else {
            Self::FAIL_DEFAULT
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_pass(self) -> bool {
        self.0 >= Self::PASS_THRESHOLD
    }
}

impl Display for Quality {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Quality {
    type Error = ErrorReport;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Quality::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> u8 {
        q.0
    }
}

/// Scheduling state after one SM-2 step.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Sm2Update {
    pub interval: Interval,
    pub ease_factor: EaseFactor,
}

/// One step of SM-2.
///
/// A failed recall resets the interval to one day. A pass goes 0 -> 1 -> 3
/// and then grows by the *previous* ease factor. The ease factor is adjusted
/// on every call, pass or fail, and never drops below [`MIN_EASE_FACTOR`].
pub fn sm2(quality: Quality, prev_interval: Interval, prev_ease_factor: EaseFactor) -> Sm2Update {
    let interval: Interval = if !quality.is_pass() {
        1
    } else {
        match prev_interval {
            0 => 1,
            1 => 3,
            n => grow(n, prev_ease_factor),
        }
    };
    Sm2Update {
        interval,
        ease_factor: next_ease_factor(quality, prev_ease_factor),
    }
}

fn grow(interval: Interval, ease_factor: EaseFactor) -> Interval {
    let grown = (interval as f64 * ease_factor).round();
    // `as` saturates, so a huge product pins at `u32::MAX` instead of wrapping.
    (grown as Interval).max(1)
}

fn next_ease_factor(quality: Quality, ease_factor: EaseFactor) -> EaseFactor {
    let d = (Quality::MAX - quality.value()) as f64;
    let adjusted = ease_factor + (0.1 - d * (0.08 + d * 0.02));
    adjusted.max(MIN_EASE_FACTOR)
}

/// Whether an item last reviewed at `last_reviewed` with the given interval
/// is due at `now`. The boundary is inclusive.
pub fn is_due_for_review(last_reviewed: Timestamp, interval: Interval, now: Timestamp) -> bool {
    now >= last_reviewed.plus_days(interval)
}
