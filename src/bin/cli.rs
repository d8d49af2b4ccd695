//! recstore CLI Client
//!
//! Command-line interface for interacting with a recstore server.

use clap::{Parser, Subcommand};
use recstore::network::Client;
use recstore::{DataRecord, Result};

/// recstore CLI
#[derive(Parser, Debug)]
#[command(name = "recstore-cli")]
#[command(about = "CLI for the recstore record server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:15005")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show how many records are stored
    Count,

    /// Show one record
    Get {
        /// 1-based record index
        index: u32,
    },

    /// Show every record
    All,

    /// Append a new record (total is computed)
    New {
        /// Period, e.g. "Jan '21"
        period: String,

        accessories: f64,

        hardware: f64,

        software: f64,
    },

    /// Change fields of an existing record (total is recomputed)
    Fix {
        /// 1-based record index
        index: u32,

        #[arg(long)]
        accessories: Option<f64>,

        #[arg(long)]
        hardware: Option<f64>,

        #[arg(long)]
        software: Option<f64>,
    },

    /// Dump the server's audit log
    Log,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut client = Client::connect(&args.server)?;

    match args.command {
        Commands::Count => {
            println!("{} records", client.count()?);
        }

        Commands::Get { index } => {
            print_header();
            println!("{:>4} {}", index, client.get(index)?);
        }

        Commands::All => {
            let records = client.get_all()?;
            print_header();
            for record in &records {
                println!("{:>4} {}", record.index.unwrap_or_default(), record);
            }
        }

        Commands::New {
            period,
            accessories,
            hardware,
            software,
        } => {
            let record = DataRecord::with_computed_total(period, accessories, hardware, software);
            report("Add", client.add(&record)?);
        }

        Commands::Fix {
            index,
            accessories,
            hardware,
            software,
        } => {
            let mut record = client.get(index)?;
            if let Some(value) = accessories {
                record.set_accessories(value);
            }
            if let Some(value) = hardware {
                record.set_hardware(value);
            }
            if let Some(value) = software {
                record.set_software(value);
            }
            record.update_total();
            report("Update", client.fix(&record)?);
        }

        Commands::Log => {
            for line in client.server_log()? {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

fn print_header() {
    println!(
        "{:>4} {:>9}{:>13}{:>11}{:>11}{:>11}",
        "#", "Period", "Accessories", "Hardware", "Software", "Total"
    );
}

fn report(action: &str, success: bool) {
    if success {
        println!("{} succeeded", action);
    } else {
        println!("{} failed", action);
    }
}
