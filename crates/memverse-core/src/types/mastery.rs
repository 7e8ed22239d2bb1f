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

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;

/// Practice count at which a successful attempt promotes a verse to
/// [`Mastery::Familiar`].
pub const FAMILIAR_THRESHOLD: u32 = 4;

/// Practice count at which a successful attempt promotes a verse to
/// [`Mastery::Memorized`].
pub const MEMORIZED_THRESHOLD: u32 = 10;

/// Coarse classification of how well a verse is known.
///
/// The variant order is the review priority: verses that need the most work
/// sort first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mastery {
    #[default]
    Learning,
    Familiar,
    Memorized,
}

impl Mastery {
    pub fn rank(self) -> u8 {
        match self {
            Mastery::Learning => 0,
            Mastery::Familiar => 1,
            Mastery::Memorized => 2,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Mastery::Learning => "learning",
            Mastery::Familiar => "familiar",
            Mastery::Memorized => "memorized",
        }
    }

    /// The tier after an attempt, given the practice count *including* that
    /// attempt. Failures and counts below the thresholds leave the tier as it
    /// is; nothing ever moves a verse down.
    pub fn after_attempt(self, practice_count: u32, success: bool) -> Mastery {
        if !success {
            return self;
        }
        let earned = if practice_count >= MEMORIZED_THRESHOLD {
            Mastery::Memorized
        } else if practice_count >= FAMILIAR_THRESHOLD {
            Mastery::Familiar
        } else {
            Mastery::Learning
        };
        self.max(earned)
    }
}

impl Display for Mastery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl TryFrom<&str> for Mastery {
    type Error = ErrorReport;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "learning" => Ok(Mastery::Learning),
            "familiar" => Ok(Mastery::Familiar),
            "memorized" => Ok(Mastery::Memorized),
            _ => fail(format!("invalid mastery tier: {value}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;

    #[test]
    fn test_order_matches_rank() {
        assert!(Mastery::Learning < Mastery::Familiar);
        assert!(Mastery::Familiar < Mastery::Memorized);
        assert_eq!(Mastery::Learning.rank(), 0);
        assert_eq!(Mastery::Familiar.rank(), 1);
        assert_eq!(Mastery::Memorized.rank(), 2);
    }

    #[test]
    fn test_thresholds() {
        let m = Mastery::Learning;
        assert_eq!(m.after_attempt(3, true), Mastery::Learning);
        assert_eq!(m.after_attempt(4, true), Mastery::Familiar);
        assert_eq!(m.after_attempt(9, true), Mastery::Familiar);
        assert_eq!(m.after_attempt(10, true), Mastery::Memorized);
    }

    #[test]
    fn test_failure_keeps_tier() {
        assert_eq!(Mastery::Learning.after_attempt(20, false), Mastery::Learning);
        assert_eq!(Mastery::Familiar.after_attempt(20, false), Mastery::Familiar);
        assert_eq!(Mastery::Memorized.after_attempt(1, false), Mastery::Memorized);
    }

    #[test]
    fn test_success_never_demotes() {
        assert_eq!(Mastery::Memorized.after_attempt(1, true), Mastery::Memorized);
        assert_eq!(Mastery::Familiar.after_attempt(2, true), Mastery::Familiar);
    }

    #[test]
    fn test_serialization_format() -> Fallible<()> {
        assert_eq!(serde_json::to_string(&Mastery::Familiar)?, "\"familiar\"");
        let m: Mastery = serde_json::from_str("\"memorized\"")?;
        assert_eq!(m, Mastery::Memorized);
        Ok(())
    }

    #[test]
    fn test_string_roundtrip() -> Fallible<()> {
        for m in [Mastery::Learning, Mastery::Familiar, Mastery::Memorized] {
            assert_eq!(Mastery::try_from(m.as_str())?, m);
        }
        assert!(Mastery::try_from("expert").is_err());
        Ok(())
    }
}
