mod analyser;
mod ui;

use analyser::core::ScanEngine;
use clap::{ArgAction, Parser};
use std::fs;
use std::process::exit;
use ui::output;

/// Scanhound flags source addresses that behave like network scanners in connection logs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Delimited connection log to analyze
    #[arg(short = 'f', long, value_parser)]
    file: String,

    /// Field delimiter used by the log
    #[arg(short = 'd', long, default_value_t = ',', value_parser)]
    delimiter: char,

    /// Column index holding the source address
    #[arg(short = 's', long, default_value_t = 0, value_parser)]
    source_column: usize,

    /// Column index holding the destination address
    #[arg(short = 'c', long, default_value_t = 1, value_parser)]
    destination_column: usize,

    /// Internal subnet in CIDR notation; only destinations inside it are scored
    #[arg(short = 'n', long, value_parser)]
    subnet: String,

    /// Threshold quantile in [0,1], higher is stricter
    #[arg(short = 'q', long, default_value_t = 0.9, value_parser)]
    quantile: f64,

    /// Display output as formatted JSON
    #[arg(short = 'j', long, action = ArgAction::SetTrue)]
    json: bool,

    /// Directory to output the JSON report
    #[arg(short = 'o', long, value_parser)]
    output_dir: Option<String>,
}

fn main() {
    simple_logger::init_with_env().unwrap();

    let args = Args::parse();
    let out;

    if let Some(out_dir) = args.output_dir.as_deref() {
        log::info!("Output directory {out_dir}");
        let _ = fs::create_dir_all(out_dir);
        out = Some(out_dir);
    } else {
        out = None;
    }

    if !args.delimiter.is_ascii() {
        log::error!("Delimiter must be a single ASCII character.");
        exit(1);
    }

    let pairs = match analyser::utils::load_pairs(
        &args.file,
        args.delimiter as u8,
        args.source_column,
        args.destination_column,
    ) {
        Ok(pairs) => pairs,
        Err(err) => {
            log::error!("Failed to load {}: {err}", args.file);
            exit(1);
        }
    };

    let engine = match ScanEngine::build(pairs, &args.subnet) {
        Ok(engine) => engine,
        Err(err) => {
            log::error!("Failed to build metrics: {err}");
            exit(1);
        }
    };

    let scanners = match engine.find_scanners(args.quantile) {
        Ok(scanners) => scanners,
        Err(err) => {
            log::error!("Classification failed: {err}");
            exit(1);
        }
    };

    // ---- Output ----
    if args.json {
        let json = output::data_as_json(&scanners);
        if out.is_some() {
            let _ = output::data_to_file(
                json.unwrap(),
                std::path::Path::new(&format!("{}/scanners.json", args.output_dir.unwrap())),
            );
        } else {
            println!("{}", json.unwrap());
        }
    } else {
        output::print_results(&scanners);
    }
}
