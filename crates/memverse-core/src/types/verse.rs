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

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::sm2::EaseFactor;
use crate::sm2::INITIAL_EASE_FACTOR;
use crate::sm2::Interval;
use crate::sm2::MIN_EASE_FACTOR;
use crate::sm2::is_due_for_review;
use crate::types::mastery::Mastery;
use crate::types::timestamp::Timestamp;
use crate::types::verse_id::VerseId;

/// A Scripture passage being memorized, together with its scheduling state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryVerseRecord {
    pub id: VerseId,
    /// Human-readable citation, e.g. "John 3:16". Not validated.
    pub reference: String,
    pub text: String,
    #[serde(default)]
    pub mastery: Mastery,
    /// The most recent practice attempt, or the creation time if the verse
    /// has never been practiced.
    pub last_reviewed: Timestamp,
    pub added_date: Timestamp,
    #[serde(default)]
    pub practice_count: u32,
    /// Current spaced-repetition interval in days.
    #[serde(default)]
    pub interval: Interval,
    #[serde(default = "default_ease_factor")]
    pub ease_factor: EaseFactor,
}

fn default_ease_factor() -> EaseFactor {
    INITIAL_EASE_FACTOR
}

impl MemoryVerseRecord {
    /// A freshly saved verse. Reference and text are trimmed and must not be
    /// blank.
    pub fn new(reference: &str, text: &str, now: Timestamp) -> Fallible<Self> {
        let reference = reference.trim();
        let text = text.trim();
        if reference.is_empty() {
            return fail("verse reference must not be empty");
        }
        if text.is_empty() {
            return fail("verse text must not be empty");
        }
        Ok(Self {
            id: VerseId::derive(reference, text, now),
            reference: reference.to_string(),
            text: text.to_string(),
            mastery: Mastery::Learning,
            last_reviewed: now,
            added_date: now,
            practice_count: 0,
            interval: 0,
            ease_factor: INITIAL_EASE_FACTOR,
        })
    }

    /// Repairs scheduling state read from storage: a non-finite ease factor
    /// falls back to the initial value and a finite one is raised to the
    /// floor.
    pub fn normalized(mut self) -> Self {
        if !self.ease_factor.is_finite() {
            self.ease_factor = INITIAL_EASE_FACTOR;
        } else if self.ease_factor < MIN_EASE_FACTOR {
            self.ease_factor = MIN_EASE_FACTOR;
        }
        self
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        is_due_for_review(self.last_reviewed, self.interval, now)
    }

    /// When the verse next becomes due.
    pub fn due_at(&self) -> Timestamp {
        self.last_reviewed.plus_days(self.interval)
    }
}
