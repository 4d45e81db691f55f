use clap::{Parser, Subcommand};

mod commands;
mod fixtures;

use commands::QueryArgs;

#[derive(Parser)]
#[command(
    name = "pedia",
    about = "Pedia — in-memory multi-cluster resource index",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the index from fixtures and run a List query.
    ///
    /// Prints the page as JSON: items, continue token, remaining count and
    /// the number of records skipped because they failed to decode.
    List {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Seed the index from fixtures and fetch one object.
    Get {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        cluster: String,
        #[arg(short, long, default_value = "")]
        namespace: String,
        #[arg(long)]
        name: String,
    },
    /// Print the ListOptions a set of query flags encodes to.
    Encode {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Write a pedia.toml scaffold.
    Init {
        /// Directory to write pedia.toml into
        #[arg(short, long, default_value = ".")]
        path: String,
    },
}

/// Where the index is seeded from.
#[derive(clap::Args)]
struct SourceArgs {
    /// Path to pedia.toml
    #[arg(short, long, default_value = "pedia.toml")]
    config: String,
    /// JSON array of {"cluster": ..., "object": {...}} entries
    #[arg(short, long)]
    fixtures: String,
    /// Kind to query (must be registered in the config)
    #[arg(short, long)]
    kind: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,pedia=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List { source, query } => {
            commands::list::list(&source.config, &source.fixtures, &source.kind, &query)
        }
        Commands::Get {
            source,
            cluster,
            namespace,
            name,
        } => commands::get::get(
            &source.config,
            &source.fixtures,
            &source.kind,
            &cluster,
            &namespace,
            &name,
        ),
        Commands::Encode { query } => commands::encode::encode(&query),
        Commands::Init { path } => commands::init::init(&path),
    }
}
