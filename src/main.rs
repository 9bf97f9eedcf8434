use clap::Parser;
use hot_processor::HotError;
use hot_processor::cli::{args::Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    match commands::run(args) {
        Ok(_stats) => {
            // Summary has already been printed by the processor
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(exit_code(&error));
        }
    }
}

/// Duplicate cruise identifiers exit with 2, schema mismatches with 3
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<HotError>() {
        Some(HotError::DuplicateIdentifier { .. }) => 2,
        Some(HotError::SchemaMismatch { .. }) => 3,
        _ => 1,
    }
}
