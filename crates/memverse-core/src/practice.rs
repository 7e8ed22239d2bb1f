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

//! Applying the outcome of a practice attempt to a verse.
//!
//! Two policies exist. [`complete_practice`] only climbs the mastery ladder
//! from a boolean outcome. [`apply_review_result`] is the one every recorded
//! attempt goes through: it runs SM-2 for the interval and ease factor and
//! climbs the same ladder, counting any passing quality as a success.

use crate::sm2::Quality;
use crate::sm2::sm2;
use crate::types::timestamp::Timestamp;
use crate::types::verse::MemoryVerseRecord;

/// Mastery-ladder-only update. The interval and ease factor are left alone.
pub fn complete_practice(
    verse: &MemoryVerseRecord,
    success: bool,
    now: Timestamp,
) -> MemoryVerseRecord {
    let practice_count = verse.practice_count.saturating_add(1);
    MemoryVerseRecord {
        mastery: verse.mastery.after_attempt(practice_count, success),
        last_reviewed: now,
        practice_count,
        ..verse.clone()
    }
}

/// Full update: SM-2 scheduling plus the mastery ladder.
pub fn apply_review_result(
    verse: &MemoryVerseRecord,
    quality: Quality,
    now: Timestamp,
) -> MemoryVerseRecord {
    let laddered = complete_practice(verse, quality.is_pass(), now);
    let update = sm2(quality, verse.interval, verse.ease_factor);
    log::debug!(
        "verse {} reviewed with quality {quality}: interval {} -> {}, ease {:.2} -> {:.2}, {} -> {}",
        verse.id.short(),
        verse.interval,
        update.interval,
        verse.ease_factor,
        update.ease_factor,
        verse.mastery,
        laddered.mastery,
    );
    MemoryVerseRecord {
        interval: update.interval,
        ease_factor: update.ease_factor,
        ..laddered
    }
}
