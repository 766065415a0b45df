//! tablecalc - Evaluate spreadsheet-style formulas against a CSV table.

mod config;

use anyhow::{Context, Result};
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use tablecalc_core::storage::parse_csv;
use tablecalc_core::{Table, evaluate_all, validate_all};
use tablecalc_engine::Engine;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("Usage: tablecalc [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <FORMULA>   Evaluate a formula (can be repeated)");
    eprintln!("  --csv <FILE>              Table to evaluate against");
    eprintln!("  --no-header               Treat the first CSV line as data");
    eprintln!("  --validate                Check formulas without evaluating them");
    eprintln!("  --json                    Print results as JSON");
    eprintln!("  --functions               List available functions");
    eprintln!("  --config <FILE>           Load engine settings from a TOML file");
    eprintln!("  --no-default-config       Ignore the user's tablecalc.toml");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default, PartialEq)]
struct Options {
    commands: Vec<String>,
    csv: Option<PathBuf>,
    no_header: bool,
    validate: bool,
    json: bool,
    list_functions: bool,
    config: Option<PathBuf>,
    no_default_config: bool,
}

#[derive(Debug, PartialEq)]
enum Invocation {
    Help,
    Run(Options),
}

fn parse_args(args: &[String]) -> std::result::Result<Invocation, String> {
    let mut opts = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(Invocation::Help),
            "-c" | "--command" => {
                i += 1;
                let formula = args.get(i).ok_or("--command requires a formula")?;
                opts.commands.push(formula.clone());
            }
            "--csv" => {
                i += 1;
                let path = args.get(i).ok_or("--csv requires a file path")?;
                opts.csv = Some(PathBuf::from(path));
            }
            "--config" => {
                i += 1;
                let path = args.get(i).ok_or("--config requires a file path")?;
                opts.config = Some(PathBuf::from(path));
            }
            "--no-header" => opts.no_header = true,
            "--validate" => opts.validate = true,
            "--json" => opts.json = true,
            "--functions" => opts.list_functions = true,
            "--no-default-config" => opts.no_default_config = true,
            arg if arg.starts_with('-') => return Err(format!("Unknown option: {}", arg)),
            arg => return Err(format!("Unexpected argument: {}", arg)),
        }
        i += 1;
    }

    if opts.commands.is_empty() && !opts.list_functions {
        return Err("nothing to do: pass a formula with -c".to_string());
    }
    Ok(Invocation::Run(opts))
}

#[derive(Serialize)]
struct Report<'a, T: Serialize> {
    formula: &'a str,
    result: &'a T,
}

fn print_json<T: Serialize>(formulas: &[String], results: &[T]) -> Result<()> {
    let reports: Vec<Report<'_, T>> = formulas
        .iter()
        .zip(results)
        .map(|(formula, result)| Report { formula, result })
        .collect();
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

fn print_functions(engine: &Engine, json: bool) -> Result<()> {
    if json {
        let listing: Vec<serde_json::Value> = engine
            .registry()
            .iter()
            .map(|f| serde_json::json!({ "name": f.name, "description": f.description }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }
    for f in engine.registry().iter() {
        println!("{:<8} {}", f.name, f.description);
    }
    Ok(())
}

/// Returns whether every formula evaluated (or validated) cleanly.
fn run(opts: &Options) -> Result<bool> {
    let settings = config::load_config(opts.config.as_deref(), opts.no_default_config)?;
    let engine = Engine::new(settings);

    if opts.list_functions {
        print_functions(&engine, opts.json)?;
    }
    if opts.commands.is_empty() {
        return Ok(true);
    }

    if opts.validate {
        let results = validate_all(&engine, &opts.commands);
        if opts.json {
            print_json(&opts.commands, &results)?;
        } else {
            for result in &results {
                if result.valid {
                    println!("OK");
                } else {
                    println!("{}", result.errors.join("; "));
                }
            }
        }
        return Ok(results.iter().all(|r| r.valid));
    }

    let table = match &opts.csv {
        Some(path) => parse_csv(path, !opts.no_header)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Table::default(),
    };
    tracing::debug!(
        rows = table.row_count(),
        cols = table.col_count(),
        "table loaded"
    );

    let results = evaluate_all(&engine, &table, &opts.commands);
    if opts.json {
        print_json(&opts.commands, &results)?;
    } else {
        for result in &results {
            println!("{}", result.display());
        }
    }
    Ok(results.iter().all(|r| r.is_success()))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let args: Vec<String> = env::args().collect();

    let opts = match parse_args(&args) {
        Ok(Invocation::Help) => {
            print_usage();
            return;
        }
        Ok(Invocation::Run(opts)) => opts,
        Err(message) => {
            eprintln!("Error: {}", message);
            print_usage();
            std::process::exit(1);
        }
    };

    match run(&opts) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
