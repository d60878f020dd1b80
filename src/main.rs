//! OMP2 Command-Line Interface
//!
//! This is the main entry point for running orbital-optimized MP2
//! calculations with YAML configuration and `.npy` tensor inputs.

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::fs;
use tracing::info;

mod config;
mod io;

use config::{Args, Config};
use io::{load_matrix, load_tensor4, setup_output};
use omp2::{ConvergenceStatus, Omp2, Omp2Results};

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_output(args.output.as_ref());

    // Load and parse configuration
    info!("Reading configuration from: {}", args.config_file);
    let config_content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;

    let config: Config = serde_yml::from_str::<Config>(&config_content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults();

    info!("Configuration loaded:\n{:?}", config);

    // Solver parameters, with command-line overrides
    let mut params = config.solver_params();
    if let Some(mi) = args.max_iterations {
        info!("Overriding max_iterations with: {}", mi);
        params.max_iterations = mi;
    }
    if let Some(ct) = args.convergence_threshold {
        info!("Overriding convergence_threshold with: {}", ct);
        params.convergence_threshold = ct;
    }
    if let Some(dt) = args.denominator_threshold {
        info!("Overriding denominator_threshold with: {}", dt);
        params.denominator_threshold = dt;
    }

    // Load the reference data
    info!("Loading one-electron integrals from: {}", config.system.h_file);
    let h_ao = load_matrix(&config.system.h_file)?;
    info!("Loading two-electron integrals from: {}", config.system.g_file);
    let g_ao = load_tensor4(&config.system.g_file)?;
    info!("Loading reference orbitals from: {}", config.system.c_file);
    let mo_coeffs = load_matrix(&config.system.c_file)?;

    let mut solver = Omp2::new(
        h_ao,
        g_ao,
        mo_coeffs,
        config.system.n_occ,
        config.system.e_nuc,
        params,
    )
    .wrap_err("Input data failed the solver's entry checks")?;

    info!("\nStarting orbital optimization...\n");
    let results = solver.solve().wrap_err("OMP2 run aborted")?;

    report_results(&results);
    Ok(())
}

/// Print a summary of the finished run
fn report_results(results: &Omp2Results) {
    info!("===========================================");
    info!("        OMP2 Calculation Summary");
    info!("===========================================");
    match results.status {
        ConvergenceStatus::Converged => {
            info!("Converged in {} iterations", results.iterations);
        }
        ConvergenceStatus::MaxIterationsExceeded => {
            info!(
                "NOT converged within {} iterations; energies below are the last iterate",
                results.iterations
            );
        }
    }
    info!("Correlation energy:     {:.12} Eh", results.e_corr);
    info!("Total OMP2 energy:      {:.12} Eh", results.e_tot);
    info!("===========================================");
}
