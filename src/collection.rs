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

use std::env::current_dir;
use std::path::PathBuf;

use memverse_core::Fallible;
use memverse_core::Store;
use memverse_core::VerseCollection;
use memverse_core::fail;

use crate::config::Config;
use crate::db::Database;

/// A collection directory opened for use: its configuration and the verses
/// stored in its database.
pub struct Collection {
    pub config: Config,
    pub verses: VerseCollection<Database>,
}

impl Collection {
    /// Opens the collection in `directory`, or in the current working
    /// directory if none is given. The database is created on first use.
    pub fn new(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        if !directory.exists() {
            return fail("directory does not exist.");
        }
        let directory = directory.canonicalize()?;
        let config = Config::load(&directory)?;
        let db = Database::open(&directory.join(&config.database))?;
        let verses = VerseCollection::open(Store::new(db))?;
        Ok(Self {
            config,
            verses,
        })
    }

    /// Runs a mutation, then closes the collection on both the success and
    /// the error path. The mutation's error takes precedence.
    pub fn apply<T>(
        mut self,
        f: impl FnOnce(&mut VerseCollection<Database>) -> Fallible<T>,
    ) -> Fallible<T> {
        let result = f(&mut self.verses);
        let closed = self.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    /// Teardown hook: pushes any write that failed earlier.
    pub fn close(mut self) -> Fallible<()> {
        let written = self.verses.flush()?;
        if written > 0 {
            log::info!("Recovered {written} pending write(s) on close");
        }
        Ok(())
    }
}
