//! Command-line argument parsing for OMP2 runs

use clap::Parser;

/// Orbital-optimized MP2 with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override maximum orbital-optimization iterations
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Override energy convergence threshold
    #[arg(long)]
    pub convergence_threshold: Option<f64>,

    /// Override orbital-energy denominator threshold
    #[arg(long)]
    pub denominator_threshold: Option<f64>,

    /// Write log output to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}
