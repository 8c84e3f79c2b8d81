use clap::Parser;
use colored::*;
use stac_catalog::cli::{args::Args, commands};
use std::process;
use tracing::debug;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    match commands::run(args) {
        Ok(stats) => {
            debug!(
                "Command finished: {} collections, {} items in {:.2}s",
                stats.collections,
                stats.items,
                stats.elapsed.as_secs_f64()
            );
            process::exit(0);
        }
        Err(error) => {
            eprintln!("{} {:#}", "Error:".red().bold(), error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("STAC Catalog - Geospatial Collection and Item Manager");
    println!("=====================================================");
    println!();
    println!("Maintain STAC 1.0.0 collections and items in a catalog directory,");
    println!("keep collection extents in step with their items, and query items");
    println!("by bounding box, time range and properties.");
    println!();
    println!("USAGE:");
    println!("    stac-catalog <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    collections List collections with item counts and extents");
    println!("    show        Show a collection or one of its items");
    println!("    create      Create an empty collection");
    println!("    delete      Delete a collection (with its items) or a single item");
    println!("    ingest      Ingest STAC Item / FeatureCollection JSON files");
    println!("    query       Query items by bbox, datetime and properties");
    println!("    export      Export a static STAC catalog");
    println!("    info        Summarize the catalog");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Create a collection and ingest scenes into it:");
    println!("    stac-catalog create sat-2024 --title \"Satellite 2024\" --license CC-BY-4.0");
    println!("    stac-catalog ingest sat-2024 ./scenes/");
    println!();
    println!("    # Query a region for the first half of 2024, newest first:");
    println!("    stac-catalog query --bbox 0,0,2,2 --datetime 2024-01-01/2024-07-01 \\");
    println!("                       --sort datetime --desc --format json");
    println!();
    println!("    # Use a different catalog directory:");
    println!("    stac-catalog collections --catalog-dir /data/catalog");
    println!();
    println!("For detailed help on any command, use:");
    println!("    stac-catalog <COMMAND> --help");
}
