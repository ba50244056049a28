//! Meridian semantic checker
//!
//! Type checks a parsed project: resolves types across packages, picks
//! function overloads and validates function bodies.

mod feedback;
mod frontend;
mod sema;
mod types;
mod utils;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use feedback::{CheckReport, CheckStats};
use frontend::project::ProjectFileStructure;
use sema::{FunctionValidator, ProgramRepresentation};

/// Meridian semantic checker
#[derive(Parser, Debug)]
#[command(name = "meridianc")]
#[command(version = "0.1.0")]
#[command(about = "Type checker for Meridian projects")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a project description for type errors
    Check {
        /// JSON project description
        project: PathBuf,

        /// Print a JSON report instead of text diagnostics
        #[arg(long)]
        json: bool,
    },
    /// List every registered type definition
    Types {
        /// JSON project description
        project: PathBuf,
    },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let outcome = match &cli.command {
        Commands::Check { project, json } => check_project(project, *json),
        Commands::Types { project } => list_types(project).map(|_| true),
        Commands::Version => {
            println!("meridianc 0.1.0");
            println!("Meridian semantic checker");
            Ok(true)
        }
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn load_program(path: &Path) -> Result<ProgramRepresentation> {
    let project = ProjectFileStructure::load(path)
        .with_context(|| format!("failed to load project {}", path.display()))?;
    ProgramRepresentation::new(project).with_context(|| format!("invalid project {}", path.display()))
}

/// Returns whether the project is free of errors
fn check_project(path: &Path, json: bool) -> Result<bool> {
    info!("checking {}", path.display());
    let program = match load_program(path) {
        Ok(program) => program,
        Err(e) if json => {
            // definitional errors still produce a report
            let errors: Vec<_> = e.downcast_ref::<utils::Error>().cloned().into_iter().collect();
            if errors.is_empty() {
                return Err(e);
            }
            let report = CheckReport::new(path.display().to_string(), &errors, CheckStats::default());
            println!("{}", report.to_json()?);
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    let errors = FunctionValidator::new(&program).validate_all();
    let report = CheckReport::new(path.display().to_string(), &errors, CheckStats::from_program(&program));

    if json {
        println!("{}", report.to_json()?);
        return Ok(report.success);
    }

    for diagnostic in &report.diagnostics {
        match &diagnostic.location {
            Some(loc) => eprintln!("error[{}] at {}..{}: {}", diagnostic.code, loc.start, loc.end, diagnostic.message),
            None => eprintln!("error[{}]: {}", diagnostic.code, diagnostic.message),
        }
        if let Some(hint) = &diagnostic.hint {
            eprintln!("  hint: {}", hint);
        }
    }
    for main in program.main_functions() {
        println!("entry point: main in {}", main.origin_file);
    }
    if report.success {
        println!(
            "No errors found ({} functions, {} types)",
            report.stats.function_count, report.stats.type_count
        );
    } else {
        eprintln!("{} error(s) found", report.diagnostics.len());
    }
    Ok(report.success)
}

fn list_types(path: &Path) -> Result<()> {
    let program = load_program(path)?;
    for key in program.types().stored_keys() {
        println!("{}", key);
    }
    Ok(())
}
