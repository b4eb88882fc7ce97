use clap::{Parser, Subcommand};
use spanner_seeder::config::{SeedConfig, SeedOptions};
use spanner_seeder::runner::run_seed;
use std::path::PathBuf;

#[derive(Parser, Clone)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Subcommand)]
enum Command {
    Seed {
        /// Google Cloud project ID
        #[arg(long)]
        project: Option<String>,

        /// Spanner instance ID
        #[arg(long)]
        instance: Option<String>,

        /// Spanner database ID
        #[arg(long)]
        database: Option<String>,

        /// Directory holding seed files (*.yaml, *.yml), searched recursively
        #[arg(short, long)]
        directory: Option<PathBuf>,

        /// PGAdapter endpoint as host or host:port (default: localhost:5432)
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Database username
        #[arg(short, long)]
        username: Option<String>,

        /// Database password
        #[arg(long, env = "SPANNER_SEEDER_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Load files and show the write order without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Quiet mode - minimal output, only show summary
        #[arg(short, long)]
        quiet: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Seed {
            project,
            instance,
            database,
            directory,
            endpoint,
            username,
            password,
            dry_run,
            quiet,
        } => {
            let config = SeedOptions {
                project,
                instance,
                database,
                directory,
                endpoint,
                username,
                password,
                dry_run,
                quiet,
            }
            .validate()?;

            run_seeder(config).await?;
        }
    }
    Ok(())
}

async fn run_seeder(config: SeedConfig) -> anyhow::Result<()> {
    // Initialize tracing based on quiet mode
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let filter = if config.quiet {
        EnvFilter::new("spanner_seeder=warn,sqlx=off")
    } else {
        EnvFilter::new("spanner_seeder=info,sqlx=off")
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let quiet = config.quiet;
    if !quiet {
        println!("Spanner Seeder");
        println!("==============");
        println!("Endpoint: {}:{}", config.host, config.port);
        println!("Database: {}", config.database_path());
        println!("Directory: {}", config.directory.display());
        if config.dry_run {
            println!("DRY RUN MODE - No data will be written");
        }
        println!();
    }

    let result = run_seed(config).await?;

    println!();
    println!("Seed Summary");
    println!("============");
    println!("Run ID: {}", result.run_id);
    println!("Write order:");
    for (table, records) in &result.tables {
        println!("  {} ({} records)", table, records);
    }
    if result.dry_run {
        println!("Records written: 0 (dry run)");
    } else {
        println!("Records written: {}", result.records_written);
    }
    println!("Duration: {:.2}s", result.duration.as_secs_f64());

    Ok(())
}
