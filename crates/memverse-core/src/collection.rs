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

use crate::error::Fallible;
use crate::error::fail;
use crate::practice::apply_review_result;
use crate::queue::compute_review_queue;
use crate::queue::due_verses;
use crate::queue::next_verse;
use crate::sm2::Quality;
use crate::stats::CollectionStats;
use crate::stats::collection_stats;
use crate::store::StorageBackend;
use crate::store::Store;
use crate::types::review::ReviewEvent;
use crate::types::timestamp::Timestamp;
use crate::types::verse::MemoryVerseRecord;
use crate::types::verse_id::VerseId;

/// Storage key holding the list of verses.
pub const VERSES_KEY: &str = "memory_verses";

/// Storage key holding the practice log.
pub const REVIEWS_KEY: &str = "memory_verse_reviews";

/// A user's memory verses and practice history, persisted through a [`Store`].
pub struct VerseCollection<B: StorageBackend> {
    store: Store<B>,
    verses: Vec<MemoryVerseRecord>,
    reviews: Vec<ReviewEvent>,
}

impl<B: StorageBackend> VerseCollection<B> {
    pub fn open(mut store: Store<B>) -> Fallible<Self> {
        let verses = read_verses(store.load(VERSES_KEY)?);
        let reviews: Vec<ReviewEvent> = store.load(REVIEWS_KEY)?.unwrap_or_default();
        log::debug!(
            "opened collection with {} verse(s) and {} review(s)",
            verses.len(),
            reviews.len()
        );
        Ok(Self {
            store,
            verses,
            reviews,
        })
    }

    /// Verses in the order they were added.
    pub fn verses(&self) -> &[MemoryVerseRecord] {
        &self.verses
    }

    pub fn reviews(&self) -> &[ReviewEvent] {
        &self.reviews
    }

    pub fn get(&self, id: &VerseId) -> Option<&MemoryVerseRecord> {
        self.verses.iter().find(|v| &v.id == id)
    }

    /// Finds a verse by its full id or by an unambiguous prefix of it.
    pub fn resolve(&self, prefix: &str) -> Fallible<&MemoryVerseRecord> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return fail("empty verse id");
        }
        if let Some(exact) = self.verses.iter().find(|v| v.id.as_str() == prefix) {
            return Ok(exact);
        }
        let mut matches = self
            .verses
            .iter()
            .filter(|v| v.id.as_str().starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(v), None) => Ok(v),
            (None, _) => fail(format!("no verse with id '{prefix}'")),
            (Some(_), Some(_)) => fail(format!("verse id '{prefix}' is ambiguous")),
        }
    }

    pub fn add(&mut self, reference: &str, text: &str, now: Timestamp) -> Fallible<MemoryVerseRecord> {
        let verse = MemoryVerseRecord::new(reference, text, now)?;
        if self.get(&verse.id).is_some() {
            return fail(format!("verse '{}' was already added at {now}", verse.reference));
        }
        log::info!("adding verse {} ({})", verse.id.short(), verse.reference);
        self.verses.push(verse.clone());
        self.persist_verses()?;
        Ok(verse)
    }

    /// Deletes a verse. Its practice history is kept, so streaks survive.
    pub fn remove(&mut self, id: &VerseId) -> Fallible<MemoryVerseRecord> {
        let Some(idx) = self.position(id) else {
            return fail(format!("no verse with id '{id}'"));
        };
        let verse = self.verses.remove(idx);
        log::info!("removed verse {} ({})", verse.id.short(), verse.reference);
        self.persist_verses()?;
        Ok(verse)
    }

    /// Records a practice attempt and persists the updated verse.
    pub fn practice(
        &mut self,
        id: &VerseId,
        quality: Quality,
        now: Timestamp,
    ) -> Fallible<MemoryVerseRecord> {
        let Some(idx) = self.position(id) else {
            return fail(format!("no verse with id '{id}'"));
        };
        let updated = apply_review_result(&self.verses[idx], quality, now);
        self.verses[idx] = updated.clone();
        self.reviews.push(ReviewEvent {
            verse_id: id.clone(),
            reviewed_at: now,
            quality,
        });
        // Both keys are attempted so a failure leaves each one pending.
        let verses = self.persist_verses();
        let reviews = self.persist_reviews();
        verses.and(reviews)?;
        Ok(updated)
    }

    pub fn review_queue(&self) -> Vec<MemoryVerseRecord> {
        compute_review_queue(&self.verses)
    }

    pub fn next(&self) -> Option<&MemoryVerseRecord> {
        next_verse(&self.verses)
    }

    pub fn due(&self, now: Timestamp) -> Vec<MemoryVerseRecord> {
        due_verses(&self.verses, now)
    }

    pub fn stats(&self, now: Timestamp) -> CollectionStats {
        collection_stats(&self.verses, &self.reviews, now)
    }

    /// Applies a write made by another tab or process. Returns whether the
    /// collection changed.
    pub fn reload_external(&mut self, key: &str, value: Option<String>) -> Fallible<bool> {
        if !self.store.apply_external_change(key, value) {
            return Ok(false);
        }
        match key {
            VERSES_KEY => {
                self.verses = read_verses(self.store.get(VERSES_KEY)?);
                Ok(true)
            }
            REVIEWS_KEY => {
                self.reviews = self.store.get(REVIEWS_KEY)?.unwrap_or_default();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn flush(&mut self) -> Fallible<usize> {
        self.store.flush()
    }

    pub fn store(&self) -> &Store<B> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store<B> {
        &mut self.store
    }

    pub fn into_store(self) -> Store<B> {
        self.store
    }

    fn position(&self, id: &VerseId) -> Option<usize> {
        self.verses.iter().position(|v| &v.id == id)
    }

    fn persist_verses(&mut self) -> Fallible<()> {
        self.store.save(VERSES_KEY, &self.verses)
    }

    fn persist_reviews(&mut self) -> Fallible<()> {
        self.store.save(REVIEWS_KEY, &self.reviews)
    }
}

fn read_verses(stored: Option<Vec<MemoryVerseRecord>>) -> Vec<MemoryVerseRecord> {
    stored
        .unwrap_or_default()
        .into_iter()
        .map(MemoryVerseRecord::normalized)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use crate::types::mastery::Mastery;
    use crate::types::timestamp::ts;

    fn empty() -> VerseCollection<MemoryBackend> {
        VerseCollection::open(Store::new(MemoryBackend::new())).unwrap()
    }

    #[test]
    fn test_open_empty() {
        let c = empty();
        assert!(c.verses().is_empty());
        assert!(c.reviews().is_empty());
        assert!(c.next().is_none());
    }

    #[test]
    fn test_add_persists_and_reopens() -> Fallible<()> {
        let mut c = empty();
        let v = c.add("John 3:16", "For God so loved the world", ts("2024-01-01T08:00:00.000"))?;
        let backend = c.into_store().into_backend();
        let reopened = VerseCollection::open(Store::new(backend))?;
        assert_eq!(reopened.verses(), &[v]);
        Ok(())
    }

    #[test]
    fn test_add_rejects_duplicate() -> Fallible<()> {
        let mut c = empty();
        let now = ts("2024-01-01T08:00:00.000");
        c.add("John 11:35", "Jesus wept.", now)?;
        assert!(c.add("John 11:35", "Jesus wept.", now).is_err());
        assert_eq!(c.verses().len(), 1);
        Ok(())
    }

    #[test]
    fn test_remove() -> Fallible<()> {
        let mut c = empty();
        let v = c.add("John 11:35", "Jesus wept.", ts("2024-01-01T08:00:00.000"))?;
        c.practice(&v.id, Quality::PASS_DEFAULT, ts("2024-01-01T09:00:00.000"))?;
        let removed = c.remove(&v.id)?;
        assert_eq!(removed.id, v.id);
        assert!(c.verses().is_empty());
        assert_eq!(c.reviews().len(), 1);
        assert!(c.remove(&v.id).is_err());
        Ok(())
    }

    #[test]
    fn test_practice_updates_and_logs() -> Fallible<()> {
        let mut c = empty();
        let v = c.add("Romans 12:2", "Be not conformed to this world", ts("2024-01-01T08:00:00.000"))?;
        let now = ts("2024-01-02T08:00:00.000");
        let updated = c.practice(&v.id, Quality::new(5)?, now)?;
        assert_eq!(updated.practice_count, 1);
        assert_eq!(updated.interval, 1);
        assert_eq!(updated.last_reviewed, now);
        assert_eq!(c.get(&v.id), Some(&updated));
        assert_eq!(c.reviews().len(), 1);
        assert_eq!(c.reviews()[0].quality.value(), 5);

        let backend = c.into_store().into_backend();
        let reopened = VerseCollection::open(Store::new(backend))?;
        assert_eq!(reopened.get(&v.id), Some(&updated));
        assert_eq!(reopened.reviews().len(), 1);
        Ok(())
    }

    #[test]
    fn test_practice_unknown_verse() -> Fallible<()> {
        let mut c = empty();
        let id = VerseId::parse("nope")?;
        assert!(c.practice(&id, Quality::PASS_DEFAULT, ts("2024-01-01T08:00:00.000")).is_err());
        Ok(())
    }

    #[test]
    fn test_resolve_prefix() -> Fallible<()> {
        let mut c = empty();
        let v = c.add("Psalm 46:10", "Be still, and know that I am God", ts("2024-01-01T08:00:00.000"))?;
        assert_eq!(c.resolve(v.id.short())?.id, v.id);
        assert_eq!(c.resolve(v.id.as_str())?.id, v.id);
        assert!(c.resolve("zzzz").is_err());
        assert!(c.resolve("").is_err());
        Ok(())
    }

    #[test]
    fn test_resolve_ambiguous() -> Fallible<()> {
        let mut backend = MemoryBackend::new();
        backend.write(
            VERSES_KEY,
            r#"[
                {"id": "abc1", "reference": "A 1:1", "text": "one",
                 "lastReviewed": "2024-01-01T00:00:00.000", "addedDate": "2024-01-01T00:00:00.000"},
                {"id": "abc2", "reference": "B 1:1", "text": "two",
                 "lastReviewed": "2024-01-01T00:00:00.000", "addedDate": "2024-01-01T00:00:00.000"}
            ]"#,
        )?;
        let c = VerseCollection::open(Store::new(backend))?;
        assert!(c.resolve("abc").is_err());
        assert_eq!(c.resolve("abc2")?.reference, "B 1:1");
        Ok(())
    }

    #[test]
    fn test_queue_and_due() -> Fallible<()> {
        let mut c = empty();
        let a = c.add("A 1:1", "one", ts("2024-01-01T08:00:00.000"))?;
        let b = c.add("B 1:1", "two", ts("2024-01-01T09:00:00.000"))?;
        for _ in 0..4 {
            c.practice(&a.id, Quality::PASS_DEFAULT, ts("2024-01-02T08:00:00.000"))?;
        }
        let queue = c.review_queue();
        assert_eq!(queue[0].id, b.id);
        assert_eq!(queue[1].id, a.id);
        assert_eq!(queue[1].mastery, Mastery::Familiar);
        assert_eq!(c.next().map(|v| &v.id), Some(&b.id));

        let due = c.due(ts("2024-01-03T08:00:00.000"));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, b.id);
        Ok(())
    }

    #[test]
    fn test_stats() -> Fallible<()> {
        let mut c = empty();
        let a = c.add("A 1:1", "one", ts("2024-01-01T08:00:00.000"))?;
        c.add("B 1:1", "two", ts("2024-01-01T09:00:00.000"))?;
        c.practice(&a.id, Quality::FAIL_DEFAULT, ts("2024-01-01T10:00:00.000"))?;
        let stats = c.stats(ts("2024-01-01T12:00:00.000"));
        assert_eq!(stats.total, 2);
        assert_eq!(stats.learning, 2);
        assert_eq!(stats.practices, 1);
        assert_eq!(stats.due, 1);
        assert_eq!(stats.streak, 1);
        Ok(())
    }

    #[test]
    fn test_open_normalizes_stored_records() -> Fallible<()> {
        let mut backend = MemoryBackend::new();
        backend.write(
            VERSES_KEY,
            r#"[{
                "id": "abc",
                "reference": "Psalm 1:1",
                "text": "Blessed is the man",
                "mastery": "familiar",
                "lastReviewed": "2024-01-01T00:00:00.000",
                "addedDate": "2024-01-01T00:00:00.000",
                "easeFactor": 0.9
            }]"#,
        )?;
        let c = VerseCollection::open(Store::new(backend))?;
        let v = &c.verses()[0];
        assert_eq!(v.mastery, Mastery::Familiar);
        assert_eq!(v.practice_count, 0);
        assert_eq!(v.ease_factor, 1.3);
        Ok(())
    }

    #[test]
    fn test_reload_external() -> Fallible<()> {
        let mut here = empty();
        let mut there = empty();
        let v = there.add("Lamentations 3:22", "It is of the Lord's mercies", ts("2024-01-01T08:00:00.000"))?;
        let raw = there.store().raw(VERSES_KEY).map(str::to_string);

        assert!(here.reload_external(VERSES_KEY, raw.clone())?);
        assert_eq!(here.get(&v.id), Some(&v));
        assert!(!here.reload_external(VERSES_KEY, raw)?);
        assert!(!here.reload_external("unrelated", Some("1".to_string()))?);

        assert!(here.reload_external(VERSES_KEY, None)?);
        assert!(here.verses().is_empty());
        Ok(())
    }

    #[test]
    fn test_failed_write_is_recovered_by_flush() -> Fallible<()> {
        let mut c = empty();
        c.store_mut().backend_mut().set_failing(true);
        assert!(c.add("Ruth 1:16", "Whither thou goest, I will go", ts("2024-01-01T08:00:00.000")).is_err());
        // The verse is kept in memory and reaches storage on the next flush.
        assert_eq!(c.verses().len(), 1);
        c.store_mut().backend_mut().set_failing(false);
        assert_eq!(c.flush()?, 1);
        let reopened = VerseCollection::open(Store::new(c.into_store().into_backend()))?;
        assert_eq!(reopened.verses().len(), 1);
        Ok(())
    }

    #[test]
    fn test_failed_practice_keeps_verse_and_log_in_step() -> Fallible<()> {
        let mut c = empty();
        let v = c.add("Psalm 23:1", "The Lord is my shepherd; I shall not want.", ts("2024-01-01T08:00:00.000"))?;
        c.store_mut().backend_mut().set_failing(true);
        assert!(c.practice(&v.id, Quality::PASS_DEFAULT, ts("2024-01-02T08:00:00.000")).is_err());
        assert_eq!(c.reviews().len(), 1);
        c.store_mut().backend_mut().set_failing(false);
        assert_eq!(c.flush()?, 2);

        let reopened = VerseCollection::open(Store::new(c.into_store().into_backend()))?;
        assert_eq!(reopened.verses()[0].practice_count, 1);
        assert_eq!(reopened.reviews().len(), 1);
        assert_eq!(reopened.reviews()[0].verse_id, v.id);
        Ok(())
    }
}
