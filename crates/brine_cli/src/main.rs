//! Command-line interface for the brine compiler.
//!
//! Compiles a source file (or inline `-c` code) to a pickle byte stream
//! and writes it to a file or prints it in a readable form.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use brine_language::{CompileOptions, LambdaMode, compile_source};

#[derive(Parser)]
#[command(name = "brine", about = "Compile Python-like source to pickle bytecode", version)]
struct Cli {
    /// Source file to compile
    #[arg(conflicts_with = "code")]
    file: Option<PathBuf>,

    /// Compile inline source text instead of a file
    #[arg(short, long)]
    code: Option<String>,

    /// Write the raw byte stream to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// How to print the stream when no output file is given
    #[arg(long, value_enum, default_value_t = Format::Repr)]
    format: Format,

    /// Keep memo stores that are never fetched
    #[arg(long)]
    no_optimize: bool,

    /// Lambda compilation mode
    #[arg(long, default_value = "disabled")]
    lambda: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Escaped byte-string form
    Repr,
    /// Raw bytes on stdout
    Raw,
    /// Hexadecimal
    Hex,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let (source, source_name) = read_source(cli)?;

    let lambda_mode: LambdaMode = cli.lambda.parse().map_err(|e| format!("{e}"))?;
    let options = CompileOptions {
        lambda_mode,
        optimize: !cli.no_optimize,
        source_name: Some(source_name),
    };

    let bytes = compile_source(&source, &options).map_err(|e| {
        e.context
            .as_ref()
            .map_or_else(|| format!("{e}"), |ctx| format!("{e}\n  {ctx}"))
    })?;

    if let Some(path) = &cli.output {
        fs::write(path, &bytes)
            .map_err(|e| format!("cannot write {}: {e}", path.display()))?;
        return Ok(());
    }

    match cli.format {
        Format::Repr => println!("{}", repr(&bytes)),
        Format::Hex => println!("{}", hex(&bytes)),
        Format::Raw => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&bytes)
                .and_then(|()| stdout.flush())
                .map_err(|e| format!("cannot write to stdout: {e}"))?;
        }
    }
    Ok(())
}

/// Reads source from the file argument or `-c`.
fn read_source(cli: &Cli) -> Result<(String, String), String> {
    if let Some(code) = &cli.code {
        return Ok((code.clone(), "<command-line>".to_string()));
    }
    let Some(path) = &cli.file else {
        return Err("no input: pass a source file or -c <code>".to_string());
    };
    let source = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    Ok((source, path.display().to_string()))
}

/// Formats bytes the way a Python byte-string literal would look.
fn repr(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 3);
    out.push_str("b'");
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7E => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('\'');
    out
}

/// Formats bytes as lowercase hex.
fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
