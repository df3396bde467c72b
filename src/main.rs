//! Biofilm Tools CLI
//!
//! Command-line interface for preparing NUFEB cross-feeding runs and
//! analysing their thermo logs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use biofilm_tools::{
    analytics::{
        aggregate_directory, collect_lifetimes, default_parameter_space,
        logger::{write_aggregate_csv, write_json, write_lifetimes_csv, write_table_csv},
        print_summary, sample_uniform, ResultsLogger, TableSummary,
    },
    config::{SeedConfig, ToolConfig},
    deck::{read_deck, summarise_deck, write_deck},
    logtable::{first_crossing_in_file, parse_log_file, LogRow},
    seeds::generate_inputs,
    theory::{MeanFieldParams, Model},
};

#[derive(Parser)]
#[command(name = "biofilm")]
#[command(version = "0.1.0")]
#[command(about = "NUFEB cross-feeding input generation and log analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file; flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Division and EPS secretion seeds
    Eps,
    /// Division seeds only
    Neps,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the thermo table from a log
    Table {
        /// Log file to parse
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Write the table as CSV to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep rows with Step >= this value
        #[arg(long)]
        step_min: Option<i64>,

        /// Keep rows with Step <= this value
        #[arg(long)]
        step_max: Option<i64>,

        /// Cross-count threshold for the reported lifetime
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Also save a JSON summary into this directory
        #[arg(long)]
        summary_dir: Option<PathBuf>,
    },

    /// First step where both cross-feeder counts drop below the threshold
    Lifetime {
        /// Scan a single log instead of a directory
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory of *.log files
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// CSV output for the directory scan
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        threshold: Option<f64>,
    },

    /// Generate seeded input scripts from a template
    Seeds {
        #[arg(long, value_enum)]
        preset: Option<Preset>,

        #[arg(long)]
        template: Option<PathBuf>,

        /// Output file name prefix
        #[arg(long)]
        prefix: Option<String>,

        /// First replicate index
        #[arg(long)]
        start: Option<u32>,

        /// Number of replicates
        #[arg(short = 'n', long)]
        count: Option<u32>,
    },

    /// Generate a random initial atom deck
    Atoms {
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// RNG seed for a reproducible deck
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Summarise an atom deck per type
    Preview {
        #[arg(short, long, default_value = "atom.in")]
        input: PathBuf,
    },

    /// Collapse-time summary for every log in a directory
    Aggregate {
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        #[arg(short, long, default_value = "data/processed/summary.csv")]
        output: PathBuf,

        /// Column holding biomass
        #[arg(long)]
        biomass_column: Option<String>,

        #[arg(short, long)]
        threshold: Option<f64>,
    },

    /// Draw a uniform design over the EPS parameter space
    Sample {
        #[arg(short = 'n', long, default_value = "8")]
        samples: usize,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(short, long, default_value = "design.json")]
        output: PathBuf,
    },

    /// Integrate the mean-field occupancy model
    Theory {
        /// Include cheaters
        #[arg(long)]
        cheater: bool,

        /// Initial cross-feeder fraction (defaults to the stable fixed point)
        #[arg(long)]
        n0: Option<f64>,

        /// Initial cheater fraction
        #[arg(long, default_value = "0.0001")]
        c0: f64,

        #[arg(long, default_value = "500")]
        t_end: f64,

        #[arg(long, default_value = "1000")]
        points: usize,

        #[arg(short, long, default_value = "theory.csv")]
        output: PathBuf,
    },

    /// Print tool overview
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let mut config = match &cli.config {
        Some(path) => ToolConfig::load(path)?,
        None => ToolConfig::default(),
    };

    match cli.command {
        Commands::Table {
            input,
            output,
            step_min,
            step_max,
            threshold,
            summary_dir,
        } => {
            let table = &mut config.table;
            if let Some(input) = input {
                table.input = input;
            }
            if let Some(output) = output {
                table.output = output;
                table.write_csv = true;
            }
            if step_min.is_some() {
                table.step_min = step_min;
            }
            if step_max.is_some() {
                table.step_max = step_max;
            }
            if let Some(threshold) = threshold {
                table.threshold = threshold;
            }
            run_table(&config, summary_dir.as_deref())?;
        }

        Commands::Lifetime {
            input,
            data_dir,
            output,
            threshold,
        } => {
            let lifetime = &mut config.lifetime;
            if let Some(data_dir) = data_dir {
                lifetime.data_dir = data_dir;
            }
            if let Some(output) = output {
                lifetime.out_csv = output;
            }
            if let Some(threshold) = threshold {
                lifetime.threshold = threshold;
            }
            run_lifetime(&config, input.as_deref())?;
        }

        Commands::Seeds {
            preset,
            template,
            prefix,
            start,
            count,
        } => {
            let mut seeds = match preset {
                Some(Preset::Eps) => SeedConfig::eps(),
                Some(Preset::Neps) => SeedConfig::neps(),
                None => config.seeds.clone(),
            };
            if let Some(template) = template {
                seeds.template = template;
            }
            if let Some(prefix) = prefix {
                seeds.output_prefix = prefix;
            }
            if let Some(start) = start {
                seeds.index_start = start;
            }
            if let Some(count) = count {
                seeds.count = count;
            }
            run_seeds(&seeds)?;
        }

        Commands::Atoms { output, seed } => {
            if let Some(output) = output {
                config.atoms.outfile = output;
            }
            if seed.is_some() {
                config.atoms.seed = seed;
            }
            write_deck(&config.atoms)?;
        }

        Commands::Preview { input } => {
            run_preview(&input)?;
        }

        Commands::Aggregate {
            data_dir,
            output,
            biomass_column,
            threshold,
        } => {
            if let Some(column) = biomass_column {
                config.collapse.biomass_column = column;
            }
            if let Some(threshold) = threshold {
                config.collapse.threshold = threshold;
            }
            let dir = data_dir.unwrap_or_else(|| config.lifetime.data_dir.clone());
            let records = aggregate_directory(&dir, &config.collapse)?;
            write_aggregate_csv(&records, &output)?;
        }

        Commands::Sample {
            samples,
            seed,
            output,
        } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let design = sample_uniform(&default_parameter_space(), samples, &mut rng);
            write_json(&design, &output)?;
        }

        Commands::Theory {
            cheater,
            n0,
            c0,
            t_end,
            points,
            output,
        } => {
            run_theory(cheater, n0, c0, t_end, points, &output)?;
        }

        Commands::Info => {
            print_info();
        }
    }

    Ok(())
}

fn run_table(config: &ToolConfig, summary_dir: Option<&Path>) -> Result<()> {
    let table_config = &config.table;
    info!("Parsing: {}", table_config.input.display());

    let report = parse_log_file(&table_config.input)?;
    let table = report
        .table
        .filter_steps(table_config.step_min, table_config.step_max);
    let lifetime_step = first_crossing_in_file(&table_config.input, table_config.threshold)?;

    if table_config.write_csv {
        write_table_csv(&table, &table_config.output)?;
    }

    let summary = TableSummary {
        input: table_config.input.clone(),
        columns: table.columns().iter().map(|c| c.name().to_string()).collect(),
        rows: table.len(),
        skipped_rows: report.skipped.len(),
        tables_seen: report.tables_seen,
        first_step: table.rows().first().map(LogRow::step),
        last_step: table.rows().last().map(LogRow::step),
        threshold: table_config.threshold,
        lifetime_step,
        generated_at: chrono::Utc::now(),
    };
    print_summary(&summary);

    if let Some(dir) = summary_dir {
        ResultsLogger::new(dir).save_summary(&summary)?;
    }

    Ok(())
}

fn run_lifetime(config: &ToolConfig, input: Option<&Path>) -> Result<()> {
    let lifetime = &config.lifetime;

    if let Some(path) = input {
        match first_crossing_in_file(path, lifetime.threshold)? {
            Some(step) => println!("{}: lifetime step {}", path.display(), step),
            None => println!("{}: never below {}", path.display(), lifetime.threshold),
        }
        return Ok(());
    }

    let records = collect_lifetimes(lifetime)?;
    write_lifetimes_csv(&records, &lifetime.out_csv)?;

    println!(
        "[OK] Wrote {} rows to {}",
        records.len(),
        lifetime.out_csv.display()
    );
    Ok(())
}

fn run_seeds(seeds: &SeedConfig) -> Result<()> {
    let written = generate_inputs(seeds)?;

    println!("Generated:");
    for path in &written {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        println!("   {}", name);
    }
    Ok(())
}

fn run_preview(input: &Path) -> Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let records = read_deck(&text)?;

    println!();
    println!("Preview of {} ({} atoms)", input.display(), records.len());
    println!("  {:>6} {:>8} {:>14} {:>12} {:>12}", "type", "count", "mean radius", "min z", "max z");
    for s in summarise_deck(&records) {
        println!(
            "  {:>6} {:>8} {:>14.3e} {:>12.3e} {:>12.3e}",
            s.atom_type, s.count, s.mean_radius, s.min_z, s.max_z
        );
    }
    println!();
    Ok(())
}

fn run_theory(cheater: bool, n0: Option<f64>, c0: f64, t_end: f64, points: usize, output: &Path) -> Result<()> {
    let params = MeanFieldParams::default();
    let fixed = params.fixed_points();
    for n in &fixed {
        info!("Fixed point: N = {:.3}", n);
    }

    let n0 = n0.or_else(|| fixed.last().copied()).unwrap_or(0.5);
    let (model, y0) = if cheater {
        (Model::WithCheater, [n0, c0])
    } else {
        (Model::CrossFeeder, [n0, 0.0])
    };

    let trajectory = params.integrate(model, y0, t_end, points, 10);

    let file = fs::File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    trajectory
        .write_csv(file)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if let Some([n, c]) = trajectory.last() {
        info!("Final state: N = {:.4}, C = {:.4}", n, c);
    }
    info!("Trajectory written to: {}", output.display());
    Ok(())
}

fn print_info() {
    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║       Biofilm Cross-Feeding Tools                        ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();
    println!("Preparation and analysis helpers for NUFEB biofilm runs.");
    println!();
    println!("COMMANDS:");
    println!("  • seeds      - Seeded input scripts from a template");
    println!("  • atoms      - Random initial atom deck");
    println!("  • preview    - Per-type summary of an atom deck");
    println!("  • table      - Thermo table extraction to CSV");
    println!("  • lifetime   - First step with both cross counts below threshold");
    println!("  • aggregate  - Collapse times across a sweep");
    println!("  • sample     - Uniform parameter design");
    println!("  • theory     - Mean-field occupancy trajectories");
    println!();
    println!("USAGE:");
    println!("  biofilm seeds --preset eps -n 50       # inputscript_EPS1..50.nufeb");
    println!("  biofilm lifetime -d data/exp_data      # data/lifetimes.csv");
    println!("  biofilm table -i neps41.log -o cross.csv");
    println!();
}
