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

use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use memverse_core::Fallible;
use memverse_core::MemoryVerseRecord;
use memverse_core::Quality;
use memverse_core::Timestamp;

use crate::collection::Collection;

#[derive(ValueEnum, Clone, Copy, PartialEq, Debug)]
pub enum PracticeResult {
    /// The verse was recalled.
    GotIt,
    /// The verse was not recalled.
    NeedsPractice,
}

impl Display for PracticeResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PracticeResult::GotIt => write!(f, "got-it"),
            PracticeResult::NeedsPractice => write!(f, "needs-practice"),
        }
    }
}

/// Records a boolean practice outcome, using the configured qualities.
pub fn practice_verse(directory: Option<String>, id: String, result: PracticeResult) -> Fallible<()> {
    let collection = Collection::new(directory)?;
    let quality = collection
        .config
        .quality_for(result == PracticeResult::GotIt)?;
    record(collection, &id, quality)
}

/// Records a graded (0 to 5) practice outcome.
pub fn review_verse(directory: Option<String>, id: String, quality: u8) -> Fallible<()> {
    let quality = Quality::new(quality)?;
    let collection = Collection::new(directory)?;
    record(collection, &id, quality)
}

fn record(collection: Collection, id: &str, quality: Quality) -> Fallible<()> {
    let before = collection.verses.resolve(id)?.clone();
    let after = collection.apply(|verses| verses.practice(&before.id, quality, Timestamp::now()))?;
    println!("{}", summarize(&before, &after));
    Ok(())
}

pub fn summarize(before: &MemoryVerseRecord, after: &MemoryVerseRecord) -> String {
    let mut line = format!(
        "{}: practiced {} time(s), next review in {} day(s) (on {})",
        after.reference,
        after.practice_count,
        after.interval,
        after.due_at().date(),
    );
    if after.mastery != before.mastery {
        line.push_str(&format!(", now {}", after.mastery));
    }
    line.push('.');
    line
}
