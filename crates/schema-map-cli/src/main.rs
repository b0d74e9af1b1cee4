//! schema-map CLI - resolve table names, datatypes and defaults for a
//! cross-engine schema migration.

use clap::{Parser, Subcommand};
use schema_map::{
    open_catalog, Config, MapError, ResolutionReport, Resolver, ResolverSettings, RuleSet,
    RuleStore, StaticRuleStore, TableFilter,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "schema-map")]
#[command(about = "Resolve table names, column datatypes and defaults across database engines")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve table names, datatypes and defaults
    Resolve {
        /// Comma-separated tables to resolve (default: config list, else every table in the schema)
        #[arg(long, value_delimiter = ',')]
        tables: Option<Vec<String>>,

        /// Override number of concurrent table tasks
        #[arg(long)]
        threads: Option<usize>,

        /// Override source schema
        #[arg(long)]
        source_schema: Option<String>,

        /// Override target schema
        #[arg(long)]
        target_schema: Option<String>,
    },

    /// Validate the configuration and rule document
    Check,

    /// Print the effective builtin datatype catalog for the engine pair
    Builtin,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MapError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(MapError::Config)?;

    let mut config = Config::load(&cli.config)?.with_auto_tuning();
    info!("Loaded configuration from {:?}", cli.config);

    let store = load_rule_store(&config)?;

    match cli.command {
        Commands::Resolve {
            tables,
            threads,
            source_schema,
            target_schema,
        } => {
            // Apply overrides
            if let Some(schema) = source_schema {
                config.source.schema = schema;
            }
            if let Some(schema) = target_schema {
                config.target.schema = schema;
            }
            if let Some(t) = threads {
                config.resolution.threads = Some(t);
            }
            if let Some(list) = tables {
                config.resolution.tables = list;
            }
            config.validate()?;

            let cancel_token = setup_signal_handler().await?;
            let catalog = open_catalog(&config).await?;

            let mut tables = config.resolution.tables.clone();
            if tables.is_empty() {
                tables = catalog.list_tables(&config.source.schema).await?;
                info!(
                    "Found {} tables in schema {}",
                    tables.len(),
                    config.source.schema
                );
            }
            let filter = TableFilter::new(
                &config.resolution.include_tables,
                &config.resolution.exclude_tables,
            )?;
            let tables = filter.apply(tables);

            let settings = ResolverSettings::from_config(&config);
            let resolver = Resolver::new(settings, &store, catalog, cancel_token).await?;
            let report = resolver.run(&tables).await?;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                print_report(&report);
            }
        }

        Commands::Check => {
            let cancel_token = setup_signal_handler().await?;
            let pair = config.engine_pair();
            let rules = RuleSet::load(
                &store,
                pair,
                &config.source.schema,
                &config.target.schema,
                &cancel_token,
            )
            .await?;
            let counts = rules.counts();

            if cli.output_json {
                let out = serde_json::json!({
                    "pair": pair,
                    "source_schema": config.source.schema,
                    "target_schema": config.target.schema,
                    "rules": counts,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Configuration OK");
                println!("  Engines: {}", pair);
                println!(
                    "  Schemas: {} -> {}",
                    config.source.schema, config.target.schema
                );
                println!("  Table name rules: {}", counts.table_names);
                println!(
                    "  Datatype rules: {} schema, {} table, {} column",
                    counts.schema_datatypes, counts.table_datatypes, counts.column_datatypes
                );
                println!("  Builtin types: {}", counts.builtin_types);
                println!(
                    "  Default rules: {} global, {} column",
                    counts.global_defaults, counts.column_defaults
                );
            }
        }

        Commands::Builtin => {
            let pair = config.engine_pair();
            let catalog = store.builtin_datatype_catalog(pair).await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            } else {
                println!("Builtin catalog for {} ({} entries):", pair, catalog.len());
                for rule in &catalog {
                    match &rule.attributes_pattern {
                        Some(pattern) => println!(
                            "  {:<12} -> {:<24} when {}",
                            rule.source_type, rule.target_type, pattern
                        ),
                        None => println!("  {:<12} -> {}", rule.source_type, rule.target_type),
                    }
                }
            }
        }
    }

    Ok(())
}

fn load_rule_store(config: &Config) -> Result<StaticRuleStore, MapError> {
    match &config.rules {
        Some(path) => {
            info!("Loading rules from {:?}", path);
            StaticRuleStore::load(path)
        }
        None => Ok(StaticRuleStore::new()),
    }
}

fn print_report(report: &ResolutionReport) {
    println!("\nResolution completed!");
    println!("  Run ID: {}", report.run_id);
    println!("  Engines: {}", report.pair);
    println!(
        "  Schemas: {} -> {}",
        report.source_schema, report.target_schema
    );
    println!("  Tables: {}", report.tables_total);
    println!("  Duration: {:.2}s", report.duration_seconds);
    println!("  Digest: {}", report.digest);

    for (table, columns) in &report.datatypes {
        let target = report
            .table_names
            .get(&table.to_uppercase())
            .map(String::as_str)
            .unwrap_or(table.as_str());
        println!("\n  {} -> {}", table, target);

        let defaults = report.defaults.get(table);
        for (column, datatype) in columns {
            match defaults.and_then(|d| d.get(column)).filter(|d| !d.is_empty()) {
                Some(default) => println!("    {:<24} {} DEFAULT {}", column, datatype, default),
                None => println!("    {:<24} {}", column, datatype),
            }
        }
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity '{}'", other)),
    };

    // Logs go to stderr so --output-json leaves stdout parseable
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}

/// Setup signal handlers for cancellation.
/// Handles both SIGINT (Ctrl-C) and SIGTERM.
/// Returns a CancellationToken that will be cancelled when a signal is received.
#[cfg(unix)]
async fn setup_signal_handler() -> Result<CancellationToken, MapError> {
    let cancel_token = CancellationToken::new();

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let token_int = cancel_token.clone();
    tokio::spawn(async move {
        sigint.recv().await;
        eprintln!("\nReceived SIGINT. Cancelling resolution...");
        token_int.cancel();
    });

    let token_term = cancel_token.clone();
    tokio::spawn(async move {
        sigterm.recv().await;
        eprintln!("\nReceived SIGTERM. Cancelling resolution...");
        token_term.cancel();
    });

    Ok(cancel_token)
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
async fn setup_signal_handler() -> Result<CancellationToken, MapError> {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Cancelling resolution...");
            token.cancel();
        }
    });

    Ok(cancel_token)
}
