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

use std::fs::read_to_string;
use std::path::Path;

use memverse_core::ErrorReport;
use memverse_core::Fallible;
use memverse_core::Quality;
use memverse_core::fail;
use serde::Deserialize;

/// Name of the optional configuration file in the collection directory.
pub const CONFIG_FILE: &str = "memverse.toml";

/// Settings read from `memverse.toml`. Every field is optional.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Database file name, relative to the collection directory.
    pub database: String,
    /// Maximum number of verses `queue` prints.
    pub queue_limit: Option<usize>,
    /// Quality recorded when a practice attempt is marked "got it".
    pub pass_quality: u8,
    /// Quality recorded when a practice attempt is marked "needs practice".
    pub fail_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "memverse.db".to_string(),
            queue_limit: None,
            pass_quality: Quality::PASS_DEFAULT.value(),
            fail_quality: Quality::FAIL_DEFAULT.value(),
        }
    }
}

impl Config {
    /// Reads the configuration from `directory`, falling back to defaults if
    /// there is no config file.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No {CONFIG_FILE} in {}, using defaults", directory.display());
            return Ok(Self::default());
        }
        let text = read_to_string(&path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(text)
            .map_err(|e| ErrorReport::new(format!("Failed to parse {CONFIG_FILE}: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Fallible<()> {
        if self.database.trim().is_empty() {
            return fail("database file name must not be empty");
        }
        if !Quality::new(self.pass_quality)?.is_pass() {
            return fail(format!(
                "pass_quality must be at least {}, got {}",
                Quality::PASS_THRESHOLD,
                self.pass_quality
            ));
        }
        if Quality::new(self.fail_quality)?.is_pass() {
            return fail(format!(
                "fail_quality must be below {}, got {}",
                Quality::PASS_THRESHOLD,
                self.fail_quality
            ));
        }
        Ok(())
    }

    /// The quality a boolean practice outcome is recorded with.
    pub fn quality_for(&self, success: bool) -> Fallible<Quality> {
        if success {
            Quality::new(self.pass_quality)
        } else {
            Quality::new(self.fail_quality)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() -> Fallible<()> {
        let dir = tempdir()?;
        assert_eq!(Config::load(dir.path())?, Config::default());
        Ok(())
    }

    #[test]
    fn test_empty_file_gives_defaults() -> Fallible<()> {
        assert_eq!(Config::parse("")?, Config::default());
        Ok(())
    }

    #[test]
    fn test_parse_all_fields() -> Fallible<()> {
        let config = Config::parse(
            r#"
            database = "verses.sqlite"
            queue_limit = 5
            pass_quality = 5
            fail_quality = 1
            "#,
        )?;
        assert_eq!(config.database, "verses.sqlite");
        assert_eq!(config.queue_limit, Some(5));
        assert_eq!(config.quality_for(true)?.value(), 5);
        assert_eq!(config.quality_for(false)?.value(), 1);
        Ok(())
    }

    #[test]
    fn test_load_from_directory() -> Fallible<()> {
        let dir = tempdir()?;
        write(dir.path().join(CONFIG_FILE), "queue_limit = 3\n")?;
        let config = Config::load(dir.path())?;
        assert_eq!(config.queue_limit, Some(3));
        assert_eq!(config.database, "memverse.db");
        Ok(())
    }

    #[test]
    fn test_rejects_bad_qualities() {
        assert!(Config::parse("pass_quality = 2").is_err());
        assert!(Config::parse("pass_quality = 6").is_err());
        assert!(Config::parse("fail_quality = 3").is_err());
        assert!(Config::parse("fail_quality = 9").is_err());
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(Config::parse("colour = \"blue\"").is_err());
    }

    #[test]
    fn test_rejects_empty_database_name() {
        assert!(Config::parse("database = \" \"").is_err());
    }
}
