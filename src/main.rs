//! CLI tool to compile and check FratmScript files.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fratm::{CompileOptions, Error, compile, keywords, tokenize_lossy};
use log::info;

#[derive(Parser)]
#[command(name = "fratm", version, about = "FratmScript to JavaScript compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a file to JavaScript
    Build {
        /// the `.fratm` source file
        file: PathBuf,
        /// output path, defaults to the source with a `.js` extension
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// also write `<output>.map`
        #[arg(long)]
        source_map: bool,
    },
    /// Check that files compile, without writing anything
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the token stream of a file
    Tokens { file: PathBuf },
    /// Print the keyword table as JSON
    Keywords,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build {
            file,
            output,
            source_map,
        } => build(&file, output, source_map),
        Commands::Check { files } => Ok(check(&files)),
        Commands::Tokens { file } => tokens(&file),
        Commands::Keywords => keywords::to_json()
            .map(|json| {
                println!("{json}");
                true
            })
            .context("failed to serialize keyword table"),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("couldn't read {}", path.display()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn build(file: &Path, output: Option<PathBuf>, source_map: bool) -> Result<bool> {
    let source = read(file)?;
    let out = output.unwrap_or_else(|| file.with_extension("js"));
    let options = CompileOptions::new()
        .source_map(source_map)
        .filename(file_name(file));

    let compiled = match compile(&source, &options) {
        Ok(compiled) => compiled,
        Err(e) => {
            report(file, &source, &e);
            return Ok(false);
        }
    };

    let mut code = compiled.code;
    if let Some(mut map) = compiled.source_map {
        map.file = Some(file_name(&out));
        let map_path = PathBuf::from(format!("{}.map", out.display()));
        let json = map.to_json().context("failed to serialize source map")?;
        fs::write(&map_path, json)
            .with_context(|| format!("couldn't write {}", map_path.display()))?;
        code.push_str(&format!("//# sourceMappingURL={}\n", file_name(&map_path)));
        info!("wrote {}", map_path.display());
    }
    fs::write(&out, code).with_context(|| format!("couldn't write {}", out.display()))?;
    eprintln!("{}: compiled to {}", file.display(), out.display());
    Ok(true)
}

fn check(files: &[PathBuf]) -> bool {
    let mut all_valid = true;
    for path in files {
        let source = match read(path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("{e:#}");
                all_valid = false;
                continue;
            }
        };
        let options = CompileOptions::new().filename(file_name(path));
        match compile(&source, &options) {
            Ok(_) => eprintln!("{}: valid", path.display()),
            Err(e) => {
                report(path, &source, &e);
                all_valid = false;
            }
        }
    }
    all_valid
}

fn tokens(file: &Path) -> Result<bool> {
    let source = read(file)?;
    let mut valid = true;
    for token in tokenize_lossy(&source) {
        if matches!(token.kind, fratm::TokenKind::Invalid(_)) {
            valid = false;
        }
        println!(
            "{}:{}\t{}\t{:?}",
            token.span.line,
            token.span.column,
            token.kind.name(),
            token.text
        );
    }
    Ok(valid)
}

/// Print the error with the offending line and a caret under its column.
fn report(path: &Path, source: &str, err: &Error) {
    eprintln!("{}:{}:{}: {}", path.display(), err.line(), err.column(), err.message());
    if let Some(line) = source.lines().nth(err.line().saturating_sub(1)) {
        let gutter = err.line().to_string();
        let padding: String = line
            .chars()
            .take(err.column().saturating_sub(1))
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        eprintln!("{gutter} | {line}");
        eprintln!("{} | {padding}^", " ".repeat(gutter.len()));
    }
    if let Some(suggestion) = err.suggestion() {
        eprintln!("help: {suggestion}");
    }
}
