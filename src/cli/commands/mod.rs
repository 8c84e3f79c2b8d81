//! Command implementations for the STAC catalog CLI
//!
//! Each command is implemented in its own module and returns the
//! statistics it gathered; reports are printed by the command itself.

pub mod collections;
pub mod export;
pub mod ingest;
pub mod query;
pub mod shared;

pub use shared::CommandStats;

use crate::cli::args::{Args, Commands};
use anyhow::anyhow;

/// Main command runner
///
/// Dispatches to the subcommand handler:
/// - `collections`, `show`, `create`, `delete`, `info`: collection management
/// - `ingest`: load STAC item files
/// - `query`: spatio-temporal item search
/// - `export`: static STAC catalog output
pub fn run(args: Args) -> anyhow::Result<CommandStats> {
    let command = args
        .command
        .ok_or_else(|| anyhow!("No command given (try --help)"))?;

    match command {
        Commands::Collections(list_args) => collections::run_list(list_args),
        Commands::Show(show_args) => collections::run_show(show_args),
        Commands::Create(create_args) => collections::run_create(create_args),
        Commands::Delete(delete_args) => collections::run_delete(delete_args),
        Commands::Ingest(ingest_args) => ingest::run_ingest(ingest_args),
        Commands::Query(query_args) => query::run_query(query_args),
        Commands::Export(export_args) => export::run_export(export_args),
        Commands::Info(info_args) => collections::run_info(info_args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_missing_command_is_an_error() {
        let args = Args::try_parse_from(["stac-catalog"]).unwrap();
        assert!(run(args).is_err());
    }

    #[test]
    fn test_command_stats_default() {
        let stats = CommandStats::default();
        assert_eq!(stats.collections, 0);
        assert_eq!(stats.items, 0);
        assert_eq!(stats.skipped, 0);
    }
}
