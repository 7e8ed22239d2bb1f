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

use memverse_core::Fallible;
use memverse_core::MemoryVerseRecord;
use memverse_core::Timestamp;

use crate::cmd::list::render_table;
use crate::collection::Collection;

/// Prints every verse in review order. Due verses are marked with `*`.
pub fn print_queue(directory: Option<String>, limit: Option<usize>) -> Fallible<()> {
    let collection = Collection::new(directory)?;
    let queue = collection.verses.review_queue();
    let limit = limit.or(collection.config.queue_limit);
    let now = Timestamp::now();
    if queue.is_empty() {
        println!("No verses yet.");
    } else {
        print!("{}", render_table(take(&queue, limit), now, true));
        if let Some(next) = queue.first() {
            println!("Next: {} ({})", next.reference, next.id.short());
        }
    }
    collection.close()
}

/// Prints only the verses whose interval has elapsed.
pub fn print_due(directory: Option<String>) -> Fallible<()> {
    let collection = Collection::new(directory)?;
    let now = Timestamp::now();
    let due = collection.verses.due(now);
    if due.is_empty() {
        println!("No verses due.");
    } else {
        print!("{}", render_table(&due, now, true));
    }
    collection.close()
}

fn take(queue: &[MemoryVerseRecord], limit: Option<usize>) -> &[MemoryVerseRecord] {
    match limit {
        Some(n) => &queue[..n.min(queue.len())],
        None => queue,
    }
}
