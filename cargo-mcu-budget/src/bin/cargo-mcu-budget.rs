//! Cargo subcommand: `cargo mcu-budget`
//!
//! Usage:
//!   cargo mcu-budget estimate model.json --target esp32s3.json
//!   cargo mcu-budget estimate model.json --ram-limit 65536 --json

use std::path::PathBuf;
use std::process;

use mcu_budget::estimate::{DeviceBudget, Report};
use mcu_budget::ir::validate_sequential;
use mcu_budget::parse::json;

/// Exit status when the model does not fit the budget.
const EXIT_OVER_BUDGET: i32 = 2;

fn main() {
    env_logger::init();

    // When invoked as `cargo mcu-budget`, cargo passes "mcu-budget" as argv[1]. Strip it.
    let args: Vec<String> = std::env::args().collect();
    let args = if args.get(1).map(|s| s.as_str()) == Some("mcu-budget") {
        &args[2..]
    } else {
        &args[1..]
    };

    match args.first().map(|s| s.as_str()) {
        Some("estimate") => cmd_estimate(&args[1..]),
        Some("--help") | Some("-h") | None => print_usage(),
        Some(other) => {
            eprintln!("error: unknown subcommand '{other}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("cargo mcu-budget — MAC / ROM / RAM estimator for quantized models");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo mcu-budget estimate <graph.json> [OPTIONS]");
    eprintln!();
    eprintln!("Subcommands:");
    eprintln!("  estimate  Report per-layer MACs, ROM and peak RAM, and check a device budget");
}

fn print_estimate_usage() {
    eprintln!("Usage: cargo mcu-budget estimate <graph.json> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --target <FILE>      Device budget JSON: {{\"name\", \"rom_bytes\", \"ram_bytes\"}}");
    eprintln!("  --rom-limit <BYTES>  ROM limit (overrides --target)");
    eprintln!("  --ram-limit <BYTES>  RAM limit (overrides --target)");
    eprintln!("  --json               Print the report as JSON");
    eprintln!("  --no-validate        Skip the sequential-graph check");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RUST_LOG=debug   Show per-layer MACs and live bytes");
}

// ---------------------------------------------------------------------------
// estimate
// ---------------------------------------------------------------------------

fn cmd_estimate(args: &[String]) {
    let mut graph_path: Option<PathBuf> = None;
    let mut target_path: Option<PathBuf> = None;
    let mut rom_limit: Option<usize> = None;
    let mut ram_limit: Option<usize> = None;
    let mut as_json = false;
    let mut validate = true;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--target" => {
                i += 1;
                target_path = Some(PathBuf::from(args.get(i).unwrap_or_else(|| {
                    eprintln!("--target requires a file path");
                    process::exit(1);
                })));
            }
            "--rom-limit" => {
                i += 1;
                rom_limit = Some(parse_bytes(args.get(i), "--rom-limit"));
            }
            "--ram-limit" => {
                i += 1;
                ram_limit = Some(parse_bytes(args.get(i), "--ram-limit"));
            }
            "--json" => as_json = true,
            "--no-validate" => validate = false,
            "--help" | "-h" => {
                print_estimate_usage();
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("unexpected argument: {other}");
                eprintln!("       cargo mcu-budget estimate --help for usage");
                process::exit(1);
            }
            other => {
                if graph_path.is_none() {
                    graph_path = Some(PathBuf::from(other));
                } else {
                    eprintln!("Unexpected argument: {other}");
                    print_estimate_usage();
                    process::exit(1);
                }
            }
        }
        i += 1;
    }

    let graph_path = graph_path.unwrap_or_else(|| {
        print_estimate_usage();
        process::exit(1);
    });

    let graph = json::graph_from_path(&graph_path).unwrap_or_else(|err| {
        eprintln!("error: loading {}: {err}", graph_path.display());
        process::exit(1);
    });
    log::info!(
        "loaded {}: {} tensors, {} layers",
        graph_path.display(),
        graph.tensors().len(),
        graph.layers().len()
    );

    if validate {
        if let Err(err) = validate_sequential(graph.tensors(), graph.layers()) {
            eprintln!("error: {err}");
            eprintln!("       only sequential graphs can be planned (--no-validate to skip)");
            process::exit(1);
        }
    }

    let budget = match &target_path {
        Some(path) => json::budget_from_path(path).unwrap_or_else(|err| {
            eprintln!("error: loading {}: {err}", path.display());
            process::exit(1);
        }),
        None => DeviceBudget::default(),
    }
    .with_limits(rom_limit, ram_limit);

    let report = Report::build(&graph).unwrap_or_else(|err| {
        eprintln!("error: {err}");
        process::exit(1);
    });
    let check = report.check(&budget);

    if as_json {
        let doc = serde_json::json!({ "report": report, "budget": check });
        match serde_json::to_string_pretty(&doc) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("error: serializing report: {err}");
                process::exit(1);
            }
        }
    } else {
        print!("{report}");
        if check.rom.is_some() || check.ram.is_some() {
            println!();
            print!("{check}");
        }
    }

    if !check.fits() {
        log::info!("model exceeds the budget of '{}'", budget.display_name());
        process::exit(EXIT_OVER_BUDGET);
    }
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn parse_bytes(arg: Option<&String>, flag: &str) -> usize {
    arg.and_then(|s| s.parse().ok()).unwrap_or_else(|| {
        eprintln!("{flag} requires a number of bytes");
        process::exit(1);
    })
}
