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

//! Review ordering.

use crate::types::timestamp::Timestamp;
use crate::types::verse::MemoryVerseRecord;

/// Every verse, in the order it should be practiced: weakest tier first, and
/// within a tier the least recently reviewed first. The sort is stable, so
/// exact ties keep their input order.
///
/// Due-ness is deliberately not a filter here; see [`due_verses`].
pub fn compute_review_queue(verses: &[MemoryVerseRecord]) -> Vec<MemoryVerseRecord> {
    let mut queue: Vec<MemoryVerseRecord> = verses.to_vec();
    queue.sort_by_key(|v| (v.mastery, v.last_reviewed));
    queue
}

/// The verse to recommend next, if there is any verse at all.
pub fn next_verse(verses: &[MemoryVerseRecord]) -> Option<&MemoryVerseRecord> {
    verses.iter().min_by_key(|v| (v.mastery, v.last_reviewed))
}

/// The review queue restricted to verses whose interval has elapsed.
pub fn due_verses(verses: &[MemoryVerseRecord], now: Timestamp) -> Vec<MemoryVerseRecord> {
    let mut queue = compute_review_queue(verses);
    queue.retain(|v| v.is_due(now));
    queue
}
