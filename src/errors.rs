//! Unified error type for every lesson and helper in the crate.

use sea_orm::{DbErr, TransactionError};
use thiserror::Error;

/// All failures surfaced by the walkthroughs.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Errors reported by sea-orm (engine, query builder, ORM)
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Errors reported by the raw sqlx drivers
    #[error("Driver error: {0}")]
    Driver(#[from] sqlx::Error),

    /// Filesystem failures
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Malformed TOML in `config.toml` or the seed file
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A table that reflection could not find
    #[error("Table not found: {name}")]
    TableNotFound {
        /// Table name as requested
        name: String,
    },

    /// A join on foreign keys between tables that have none
    #[error("No foreign key from {from} to {to}")]
    NoForeignKey {
        /// Referencing table
        from: String,
        /// Table that was expected to be referenced
        to: String,
    },

    /// An exactly-one query matched nothing
    #[error("No row was found for {entity} when exactly one was required")]
    NoResultFound {
        /// Entity or table that was queried
        entity: String,
    },

    /// An exactly-one query matched several rows
    #[error("Multiple rows were found for {entity} when exactly one was required")]
    MultipleResultsFound {
        /// Entity or table that was queried
        entity: String,
    },

    /// A `:name` placeholder in textual SQL without a bound value
    #[error("No value bound for placeholder :{name}")]
    MissingBind {
        /// Placeholder name without the colon
        name: String,
    },

    /// Deliberate failure raised inside a transaction block
    #[error("Aborted: {reason}")]
    Aborted {
        /// Why the block gave up
        reason: String,
    },
}

impl From<TransactionError<Self>> for Error {
    fn from(value: TransactionError<Self>) -> Self {
        match value {
            TransactionError::Connection(e) => Self::Database(e),
            TransactionError::Transaction(e) => e,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
