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

//! Practice streaks and collection summaries.

use std::collections::HashSet;

use serde::Serialize;

use crate::types::date::Date;
use crate::types::mastery::Mastery;
use crate::types::review::ReviewEvent;
use crate::types::timestamp::Timestamp;
use crate::types::verse::MemoryVerseRecord;

/// Consecutive days with at least one practice attempt, counting back from
/// `today`. A streak that ended yesterday is still alive, since today's
/// practice may not have happened yet.
pub fn practice_streak(events: &[ReviewEvent], today: Date) -> u32 {
    let days: HashSet<Date> = events.iter().map(|e| e.reviewed_at.date()).collect();
    let mut day = if days.contains(&today) {
        today
    } else {
        today.previous()
    };
    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        let prev = day.previous();
        if prev == day {
            break;
        }
        day = prev;
    }
    streak
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CollectionStats {
    pub total: usize,
    pub learning: usize,
    pub familiar: usize,
    pub memorized: usize,
    /// Verses whose interval has elapsed.
    pub due: usize,
    /// Practice attempts on record.
    pub practices: usize,
    pub streak: u32,
}

pub fn collection_stats(
    verses: &[MemoryVerseRecord],
    events: &[ReviewEvent],
    now: Timestamp,
) -> CollectionStats {
    let mut stats = CollectionStats {
        total: verses.len(),
        practices: events.len(),
        streak: practice_streak(events, now.date()),
        ..CollectionStats::default()
    };
    for verse in verses {
        match verse.mastery {
            Mastery::Learning => stats.learning += 1,
            Mastery::Familiar => stats.familiar += 1,
            Mastery::Memorized => stats.memorized += 1,
        }
        if verse.is_due(now) {
            stats.due += 1;
        }
    }
    stats
}
