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
use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

/// Opaque identifier of a memory verse.
///
/// Derived once, at creation time, from the verse's reference, text and
/// creation timestamp. It is never recomputed, so editing a verse (or the
/// text changing upstream) does not change its identity.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VerseId(String);

impl VerseId {
    pub fn derive(reference: &str, text: &str, added: Timestamp) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"reference:");
        hasher.update(reference.as_bytes());
        hasher.update(b"\ntext:");
        hasher.update(text.as_bytes());
        hasher.update(b"\nadded:");
        hasher.update(added.to_string().as_bytes());
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn parse(s: &str) -> Fallible<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ErrorReport::new("empty verse id"));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(ErrorReport::new(format!("invalid verse id: '{s}'")));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first eight characters, for compact listings.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl Display for VerseId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for VerseId {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        VerseId::parse(&value)
    }
}

impl From<VerseId> for String {
    fn from(id: VerseId) -> String {
        id.0
    }
}
