mod config;
mod render;
mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::warn;
use std::path::PathBuf;

use config::AnalysisConfig;
use report::Outputs;

/// Lotka: predator-prey dynamics explorer
///
/// Integrates the Lotka-Volterra equations, locates their equilibria and renders
/// time series, phase planes and parameter-sensitivity plots as PNG files.
#[derive(Parser, Debug)]
#[command(name = "lotka")]
#[command(author, version, about = "Simulates Lotka-Volterra predator-prey dynamics", long_about = None)]
struct Cli {
    /// TOML file overriding the default analysis settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory receiving the rendered PNG files
    #[arg(short, long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// Number of threads to use for the sensitivity sweep
    ///
    /// If not specified, defaults to the number of logical CPUs.
    #[arg(short = 't', long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Commands {
    /// Run the full analysis: base run, sensitivity sweep and equilibria (default).
    Report,

    /// Simulate the base parameters and plot the time series and phase plane.
    Simulate,

    /// Vary alpha and gamma one at a time and plot each family of runs.
    Sweep,

    /// Print the equilibria with their stability and plot runs started at each.
    Equilibria {
        /// Print the equilibrium table as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure the thread pool")?;
    }

    let config = AnalysisConfig::load(cli.config.as_deref())?;
    if !config.params.is_positive() {
        warn!(
            "model parameters {:?} are not all positive; results may not be biologically meaningful",
            config.params
        );
    }
    std::fs::create_dir_all(&cli.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            cli.output_dir.display()
        )
    })?;
    let outputs = Outputs::new(cli.output_dir);

    match cli.command.unwrap_or(Commands::Report) {
        Commands::Report => report::run_report(&config, &outputs),
        Commands::Simulate => report::run_simulation(&config, &outputs),
        Commands::Sweep => report::run_sensitivity(&config, &outputs),
        Commands::Equilibria { json } => report::run_equilibria(&config, &outputs, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_report_in_current_directory() {
        let cli = Cli::try_parse_from(["lotka"]).expect("bare invocation should parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert!(cli.config.is_none());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "lotka",
            "equilibria",
            "--json",
            "--output-dir",
            "plots",
            "-t",
            "2",
        ])
        .expect("flags should parse");
        assert!(matches!(cli.command, Some(Commands::Equilibria { json: true })));
        assert_eq!(cli.output_dir, PathBuf::from("plots"));
        assert_eq!(cli.threads, Some(2));
    }
}
