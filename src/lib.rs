//! `db-walkthrough` - a guided tour of relational database access in Rust
//!
//! Each lesson opens an engine, issues SQL through one access style (textual
//! SQL, table metadata, the query builder, the ORM or a raw driver) and prints
//! what the database returned, so the effect of every call can be read off
//! the console.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    // Security and correctness
    unsafe_code,
    unsafe_op_in_unsafe_fn,

    // Code quality - things that are almost always bugs
    unreachable_code,
    unreachable_patterns,
    unused_must_use,

    // Documentation - broken links are bugs
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    missing_docs,

    // Clippy categories for overall code quality
    clippy::all,
    clippy::pedantic,
    clippy::nursery,

    // Correctness
    clippy::dbg_macro,
    clippy::exit,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,

    // Style consistency
    clippy::enum_glob_use,
    clippy::redundant_closure_for_method_calls,
    clippy::semicolon_if_nothing_returned,
    clippy::wildcard_imports,

    // Future compatibility
    future_incompatible,
    rust_2018_idioms,
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
)]

/// Command line flags
pub mod cli;
/// Settings, seed data and engine creation
pub mod config;
/// Metadata, reflection, textual SQL and rendering helpers shared by the lessons
pub mod core;
/// SeaORM entity definitions for the ORM lessons
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// The walkthroughs themselves
pub mod lessons;

#[cfg(test)]
pub mod test_utils;
