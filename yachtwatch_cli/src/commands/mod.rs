//! CLI subcommand implementations.

pub mod discover;
pub mod ingest;
pub mod vessels;
pub mod watch;
