//! CLI tool for officeview - converts XLSX/DOCX files to HTML
//!
//! Usage:
//!   officeview_cli <input.xlsx|input.docx>              # HTML to stdout
//!   officeview_cli <input> -o out.html                  # HTML to file
//!   officeview_cli <input> --json                       # Dump the model as JSON
//!   officeview_cli <input> --debug                      # Embed resolved styles

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use officeview::{builder, parser, render, RenderOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Xlsx,
    Docx,
}

struct Args {
    input: String,
    output: Option<String>,
    json: bool,
    options: RenderOptions,
}

fn usage() -> ! {
    eprintln!("Usage: officeview_cli <input.xlsx|input.docx> [-o output] [--json] [--debug]");
    std::process::exit(1);
}

fn parse_args() -> Args {
    let mut input = None;
    let mut output = None;
    let mut json = false;
    let mut options = RenderOptions::default();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-o" | "--output" => match args.next() {
                Some(path) => output = Some(path),
                None => usage(),
            },
            "--json" => json = true,
            "--debug" => options = options.debug(true),
            "-h" | "--help" => usage(),
            _ if input.is_none() => input = Some(arg),
            _ => usage(),
        }
    }

    let Some(input) = input else { usage() };
    Args {
        input,
        output,
        json,
        options,
    }
}

fn detect_format(path: &str) -> Option<Format> {
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "xlsx" | "xlsm" => Some(Format::Xlsx),
        "docx" | "docm" => Some(Format::Docx),
        _ => None,
    }
}

fn convert(args: &Args, format: Format) -> Result<String, String> {
    let file = File::open(&args.input).map_err(|e| format!("Error reading {}: {e}", args.input))?;
    let reader = BufReader::new(file);

    match format {
        Format::Xlsx => {
            let raw = parser::parse_workbook(reader).map_err(|e| format!("Error parsing XLSX: {e}"))?;
            let model = builder::build_workbook(&raw);
            if args.json {
                serde_json::to_string_pretty(&model).map_err(|e| format!("Error serializing JSON: {e}"))
            } else {
                Ok(render::render_workbook(&model, args.options))
            }
        }
        Format::Docx => {
            let raw = parser::parse_document(reader).map_err(|e| format!("Error parsing DOCX: {e}"))?;
            let model = builder::build_document(&raw);
            if args.json {
                serde_json::to_string_pretty(&model).map_err(|e| format!("Error serializing JSON: {e}"))
            } else {
                Ok(render::render_document(&model, args.options))
            }
        }
    }
}

fn main() {
    let args = parse_args();

    let Some(format) = detect_format(&args.input) else {
        eprintln!("Unsupported input {}: expected .xlsx or .docx", args.input);
        std::process::exit(1);
    };

    let output = match convert(&args, format) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    match args.output {
        Some(ref path) => {
            if let Err(e) = std::fs::write(path, &output) {
                eprintln!("Error writing {path}: {e}");
                std::process::exit(1);
            }
            eprintln!("Written: {path}");
        }
        None => {
            io::stdout().write_all(output.as_bytes()).unwrap();
            println!();
        }
    }
}
