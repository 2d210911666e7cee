//! Command line interface.

use crate::{config::settings::AppConfig, lessons::Lesson};
use clap::Parser;
use std::path::PathBuf;

/// Walks through engines, transactions, metadata, query building, ORM
/// sessions and raw drivers, printing every result.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Lesson to run; every lesson runs in order when omitted.
    #[arg(value_enum)]
    pub lesson: Option<Lesson>,

    /// Engine URL, e.g. `sqlite://walkthrough.db?mode=rwc` (overrides DATABASE_URL).
    #[arg(long)]
    pub database_url: Option<String>,

    /// PostgreSQL URL for the raw driver lesson (overrides POSTGRES_URL).
    #[arg(long)]
    pub postgres_url: Option<String>,

    /// Log every statement the engine executes.
    #[arg(long)]
    pub echo: bool,

    /// Settings file (default: ./config.toml when present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the available lessons and exit.
    #[arg(long)]
    pub list: bool,
}

impl Cli {
    /// Applies the flags on top of file and environment settings.
    #[must_use]
    pub fn apply(&self, config: AppConfig) -> AppConfig {
        let mut config = config.with_overrides(self.database_url.clone(), self.postgres_url.clone());
        if self.echo {
            config.echo = true;
        }
        config
    }

    /// The lessons this invocation runs.
    #[must_use]
    pub fn lessons(&self) -> Vec<Lesson> {
        self.lesson.map_or_else(|| Lesson::ALL.to_vec(), |lesson| vec![lesson])
    }
}

/// One line per lesson, for `--list`.
#[must_use]
pub fn lesson_listing() -> String {
    use clap::ValueEnum;

    Lesson::ALL
        .iter()
        .filter_map(|lesson| {
            lesson
                .to_possible_value()
                .map(|value| format!("{:<16} {}", value.get_name(), lesson.summary()))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
