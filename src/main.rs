//! csv2sqlite CLI - Load simulation result files into SQLite

use clap::{Parser, ValueEnum};
use csv2sqlite::config::{self, ImportConfig};
use csv2sqlite::resolver::resolve_run_dirs;
use csv2sqlite::storage::SqliteStore;
use csv2sqlite::ui::{self, ConsoleProgress, Icons};
use csv2sqlite::{Importer, SchemaRegistry};
use indicatif::HumanDuration;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "csv2sqlite")]
#[command(version = "0.1.0")]
#[command(about = "Load simulation result CSV files into a SQLite database")]
#[command(long_about = r#"
csv2sqlite reads every `<name>.<token>.csv` file of one or more run directories
and appends its rows to the table registered for the token:

  freq -> GenotypeFreq    g -> Genotype    n -> Node
  status -> Status        trans -> Transmission    tree -> Tree

Example usage:
  csv2sqlite --out results.db run1 run2 run3
  csv2sqlite --independent --commit_once --out results.db runs/
  csv2sqlite --genotype_freq_view --skip_tree --out results.db run1
"#)]
struct Cli {
    /// Run directories, or the single root of independent runs
    #[arg(value_name = "DIR")]
    paths: Vec<PathBuf>,

    /// Destination SQLite database
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Treat the single argument as a root whose subdirectories are separate runs
    #[arg(long)]
    independent: bool,

    /// Commit once per run directory instead of once per file
    #[arg(long = "commit_once", visible_alias = "commit-once")]
    commit_once: bool,

    /// Do not load *.freq.csv files
    #[arg(long = "skip_freq", visible_alias = "skip-freq")]
    skip_freq: bool,

    /// Do not load *.g.csv files
    #[arg(long = "skip_genotype", visible_alias = "skip-genotype")]
    skip_genotype: bool,

    /// Do not load *.n.csv files
    #[arg(long = "skip_node", visible_alias = "skip-node")]
    skip_node: bool,

    /// Do not load *.status.csv files
    #[arg(long = "skip_status", visible_alias = "skip-status")]
    skip_status: bool,

    /// Do not load *.trans.csv files
    #[arg(long = "skip_trans", visible_alias = "skip-trans")]
    skip_trans: bool,

    /// Do not load *.tree.csv files
    #[arg(long = "skip_tree", visible_alias = "skip-tree")]
    skip_tree: bool,

    /// Create the GenotypeFreqView join after loading
    #[arg(long = "genotype_freq_view", visible_alias = "genotype-freq-view")]
    genotype_freq_view: bool,

    /// Config file (defaults to ./csv2sqlite.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl Cli {
    fn to_config(&self) -> ImportConfig {
        let skip = [
            (self.skip_freq, "freq"),
            (self.skip_genotype, "g"),
            (self.skip_node, "n"),
            (self.skip_status, "status"),
            (self.skip_trans, "trans"),
            (self.skip_tree, "tree"),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .map(|(_, token)| token.to_string())
        .collect();

        ImportConfig {
            out: self.out.clone(),
            independent: self.independent,
            commit_once: self.commit_once,
            genotype_freq_view: self.genotype_freq_view,
            skip,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if cli.format == Format::Json {
        csv2sqlite::output::set_quiet();
    }

    match run(&cli) {
        Ok(()) => Ok(()),
        Err(e) => {
            ui::error(&e.to_string());
            std::process::exit(if e.is_usage() { 2 } else { 1 });
        }
    }
}

fn run(cli: &Cli) -> csv2sqlite::Result<()> {
    let registry = SchemaRegistry::standard();

    // Everything that can be a usage error is checked before the store is touched
    let file_config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let options = file_config
        .merge(cli.to_config())
        .into_options(cli.paths.clone(), &registry)?;
    let runs = resolve_run_dirs(&options.inputs, options.layout)?;

    ui::header("Loading simulation results");
    ui::status(Icons::DATABASE, "Database", &options.out.display().to_string());
    ui::status(Icons::GEAR, "Commit policy", options.policy.as_str());
    if options.layout.is_independent() {
        ui::status(Icons::LINK, "Independent runs", &runs.len().to_string());
    }
    if !options.skip.is_empty() {
        let skipped: Vec<&str> = options.skip.tokens().collect();
        ui::status(Icons::SKIP, "Skipping", &skipped.join(", "));
    }

    config::ensure_db_dir(&options.out)?;
    let mut store = SqliteStore::open(&options.out)?;

    let mut progress = ConsoleProgress::new();
    let result = Importer::from_options(&registry, &options).run(&mut store, &runs, &mut progress);
    progress.finish();
    let report = result?;

    match cli.format {
        Format::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
            println!("{}", json);
        }
        Format::Text => {
            ui::section("Summary");
            ui::summary_row("Directories:", &report.directories.len().to_string());
            ui::summary_row("Files loaded:", &report.files_loaded.to_string());
            ui::summary_row("Files skipped:", &report.files_skipped.to_string());
            ui::summary_row("Rows:", &report.rows_loaded.to_string());

            let totals = store.table_row_counts(&registry)?;
            let table = ui::rows_table(&report, &totals);
            if !table.is_empty() && !csv2sqlite::output::is_quiet() {
                println!("{}", table);
            }

            ui::success("Finished.");
            ui::timing(&format!("Elapsed {}", HumanDuration(report.elapsed())));
        }
    }

    Ok(())
}
