mod etl;
mod generate;
mod run;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate as generate_completions, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hospital-etl")]
#[command(version)]
#[command(about = "Generate a synthetic hospital dataset and load it into an operational and star schema", long_about = None)]
pub struct Cli {
    /// Verbose logging (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the load script and operational DDL
    Generate {
        /// Random seed for reproducibility (drawn at random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Number of encounters to generate
        #[arg(long, default_value_t = 10_000)]
        encounters: usize,

        /// Rows per INSERT statement (overrides the per-table defaults)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Output directory for load_data.sql and rdbms_schema.sql
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Write load_data.sql.gz instead of plain SQL
        #[arg(long)]
        gzip: bool,

        /// Skip writing rdbms_schema.sql
        #[arg(long)]
        no_schema: bool,
    },

    /// Run the SQL pipeline steps in order
    Run {
        /// YAML pipeline file (default: schema, load, star schema, ETL)
        #[arg(long)]
        pipeline: Option<PathBuf>,

        /// Directory holding the generated scripts for the default pipeline
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Read and split every script without touching a database
        #[arg(long)]
        dry_run: bool,

        /// Show per-step progress bars
        #[arg(short, long)]
        progress: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the incremental ETL and record the outcome in etl_control
    Etl {
        /// ETL script to execute
        #[arg(long, default_value = "sql/incremental_etl.sql")]
        script: PathBuf,

        /// Value stored in etl_control.load_type
        #[arg(long, default_value = "INCREMENTAL")]
        load_type: String,
    },

    /// Show the most recent etl_control rows
    EtlStatus {
        /// Number of rows to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate {
            seed,
            encounters,
            batch_size,
            output_dir,
            gzip,
            no_schema,
        } => generate::run(generate::GenerateArgs {
            seed,
            encounters,
            batch_size,
            output_dir,
            gzip,
            no_schema,
        }),
        Commands::Run {
            pipeline,
            output_dir,
            dry_run,
            progress,
            json,
        } => run::run(pipeline, output_dir, dry_run, progress, json),
        Commands::Etl { script, load_type } => etl::run(script, load_type),
        Commands::EtlStatus { limit, json } => etl::status(limit, json),
        Commands::Completions { shell } => {
            generate_completions(
                shell,
                &mut Cli::command(),
                "hospital-etl",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}
