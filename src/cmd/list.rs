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

use std::fmt::Write;

use memverse_core::Fallible;
use memverse_core::MemoryVerseRecord;
use memverse_core::Timestamp;

use crate::collection::Collection;

pub fn list_verses(directory: Option<String>) -> Fallible<()> {
    let collection = Collection::new(directory)?;
    let verses = collection.verses.verses();
    if verses.is_empty() {
        println!("No verses yet.");
    } else {
        print!("{}", render_table(verses, Timestamp::now(), false));
    }
    collection.close()
}

/// One line per verse. With `numbered`, lines are prefixed by their position
/// and a `*` marks verses that are due.
pub fn render_table(verses: &[MemoryVerseRecord], now: Timestamp, numbered: bool) -> String {
    let width = verses
        .iter()
        .map(|v| v.reference.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for (idx, verse) in verses.iter().enumerate() {
        if numbered {
            let marker = if verse.is_due(now) { '*' } else { ' ' };
            let _ = write!(out, "{:>3}.{marker} ", idx + 1);
        }
        let _ = writeln!(
            out,
            "{}  {:<width$}  {:<9}  practiced {:>3}x  due {}",
            verse.id.short(),
            verse.reference,
            verse.mastery,
            verse.practice_count,
            verse.due_at().date(),
        );
    }
    out
}
