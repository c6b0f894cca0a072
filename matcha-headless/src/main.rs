//! Matcha Headless Terminal Runner
//!
//! A headless terminal emulator for testing and automation.
//! Reads raw terminal output from stdin or a file and prints the
//! resulting screen state as text or JSON.

use std::io::{self, Read};
use std::process::ExitCode;

use matcha_core::Term;

#[derive(Clone, Copy)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    let mut cols = 80usize;
    let mut rows = 24usize;
    let mut input_file: Option<String> = None;
    let mut output_format = OutputFormat::Text;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--cols" => {
                i += 1;
                if i < args.len() {
                    cols = args[i].parse().unwrap_or(80);
                }
            }
            "-r" | "--rows" => {
                i += 1;
                if i < args.len() {
                    rows = args[i].parse().unwrap_or(24);
                }
            }
            "-f" | "--file" => {
                i += 1;
                if i < args.len() {
                    input_file = Some(args[i].clone());
                }
            }
            "-j" | "--json" => output_format = OutputFormat::Json,
            "-t" | "--text" => output_format = OutputFormat::Text,
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            arg => {
                if input_file.is_none() && !arg.starts_with('-') {
                    input_file = Some(arg.to_string());
                } else {
                    eprintln!("Unknown option: {}. Use --help for usage.", arg);
                    return ExitCode::FAILURE;
                }
            }
        }
        i += 1;
    }

    let input_data = match &input_file {
        Some(path) => match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut data = Vec::new();
            if let Err(e) = io::stdin().read_to_end(&mut data) {
                eprintln!("Error reading stdin: {}", e);
                return ExitCode::FAILURE;
            }
            data
        }
    };

    let mut term = Term::new(rows, cols);
    term.write(&input_data);
    log::debug!("processed {} input bytes", input_data.len());

    let snapshot = term.snapshot();
    match output_format {
        OutputFormat::Text => {
            println!("Terminal State ({}x{}):", cols, rows);
            println!(
                "Cursor: ({}, {}) visible={}",
                snapshot.cursor.x, snapshot.cursor.y, snapshot.cursor.visible
            );
            if let Some(title) = &snapshot.title {
                println!("Title: {}", title);
            }
            println!("---");
            for line in &snapshot.lines {
                println!("{}", line);
            }
            println!("---");
        }
        OutputFormat::Json => println!("{}", snapshot.to_json()),
    }

    ExitCode::SUCCESS
}

fn print_help() {
    println!("Matcha Headless Terminal Runner");
    println!();
    println!("Usage: matcha-headless [OPTIONS] [INPUT_FILE]");
    println!();
    println!("Options:");
    println!("  -c, --cols <N>     Set terminal width (default: 80)");
    println!("  -r, --rows <N>     Set terminal height (default: 24)");
    println!("  -f, --file <PATH>  Read input from file");
    println!("  -j, --json         Output snapshot as JSON");
    println!("  -t, --text         Output snapshot as text (default)");
    println!("  -h, --help         Show this help message");
    println!();
    println!("If no input file is specified, reads from stdin.");
    println!();
    println!("Examples:");
    println!("  printf 'Hello\\033[31mWorld\\033[0m' | matcha-headless");
    println!("  matcha-headless -c 120 -r 40 capture.bin");
    println!("  matcha-headless --json < capture.bin > snapshot.json");
}
