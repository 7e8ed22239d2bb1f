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

//! memverse-core: scheduling for Scripture memorization.
//!
//! This library is WASM-compatible and performs no I/O of its own. It
//! provides:
//! - The memory verse record and its mastery ladder
//! - SM-2 interval and ease-factor scheduling
//! - Review queue ordering and due-date checks
//! - Practice streaks and collection statistics
//! - A write-through [`Store`] over a pluggable [`StorageBackend`]

pub mod collection;
pub mod error;
pub mod practice;
pub mod queue;
pub mod sm2;
pub mod stats;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use collection::VerseCollection;
pub use error::{ErrorReport, Fallible, fail};
pub use practice::{apply_review_result, complete_practice};
pub use queue::{compute_review_queue, due_verses, next_verse};
pub use sm2::{Quality, Sm2Update, is_due_for_review, sm2};
pub use stats::{CollectionStats, collection_stats, practice_streak};
pub use store::{ExternalChange, MemoryBackend, StorageBackend, Store, SubscriptionId};
pub use types::date::Date;
pub use types::mastery::Mastery;
pub use types::review::ReviewEvent;
pub use types::timestamp::Timestamp;
pub use types::verse::MemoryVerseRecord;
pub use types::verse_id::VerseId;
