// SPDX-FileCopyrightText: © 2025 Phala Network <dstack@phala.network>
//
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trust_pcr7::{ComputePcr7Options, KeysetPcr7, TrustRoot};

#[derive(Parser)]
#[command(name = "trust", author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute PCR7 value for a given keyset
    #[command(name = "computePCR7")]
    ComputePcr7(ComputePcr7Args),
}

#[derive(Parser)]
struct ComputePcr7Args {
    /// Name of the keyset under the trust root
    #[arg(value_name = "KEYSET_NAME")]
    keyset: Vec<String>,

    /// Save pcr7 hash values to a file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Show the list of pcr7 events and their calculated hashes
    #[arg(long)]
    events: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::ComputePcr7(args) => {
            let options = ComputePcr7Options::from_args(&args.keyset, args.output, args.events)?;
            let store = TrustRoot::new(cli.config);
            let computer = KeysetPcr7::new(store.clone());
            options.run(&store, &computer, &mut io::stdout().lock())?;
        }
    }

    Ok(())
}
