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

use clap::Parser;

use memverse_core::Fallible;

use crate::cmd::add::add_verse;
use crate::cmd::list::list_verses;
use crate::cmd::practice::PracticeResult;
use crate::cmd::practice::practice_verse;
use crate::cmd::practice::review_verse;
use crate::cmd::queue::print_due;
use crate::cmd::queue::print_queue;
use crate::cmd::remove::remove_verse;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_stats;

#[derive(Parser, Debug, PartialEq)]
#[command(version, about, long_about = None)]
enum Command {
    /// Save a new verse to memorize.
    Add {
        /// The citation, e.g. "John 3:16".
        reference: String,
        /// The verse text.
        text: String,
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Delete a verse.
    Remove {
        /// The verse id, or an unambiguous prefix of it.
        id: String,
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// List all verses in the order they were added.
    List {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Show every verse in the order it should be practiced.
    Queue {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Maximum number of verses to show. Overrides `queue_limit` in memverse.toml.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the verses that are due for review.
    Due {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Record a practice attempt as recalled or not.
    Practice {
        /// The verse id, or an unambiguous prefix of it.
        id: String,
        /// How the attempt went.
        #[arg(long)]
        result: PracticeResult,
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Record a practice attempt with a recall quality from 0 (blackout) to 5 (perfect).
    Review {
        /// The verse id, or an unambiguous prefix of it.
        id: String,
        /// Recall quality, 0 to 5. Below 3 counts as a failure.
        quality: u8,
        /// Path to the collection directory. By default, the current working directory is used.
        #[arg(long)]
        directory: Option<String>,
    },
    /// Print collection statistics.
    Stats {
        /// Path to the collection directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Which output format to use.
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Add {
            reference,
            text,
            directory,
        } => add_verse(directory, reference, text),
        Command::Remove { id, directory } => remove_verse(directory, id),
        Command::List { directory } => list_verses(directory),
        Command::Queue { directory, limit } => print_queue(directory, limit),
        Command::Due { directory } => print_due(directory),
        Command::Practice {
            id,
            result,
            directory,
        } => practice_verse(directory, id, result),
        Command::Review {
            id,
            quality,
            directory,
        } => review_verse(directory, id, quality),
        Command::Stats { directory, format } => print_stats(directory, format),
    }
}
