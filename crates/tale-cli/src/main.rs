use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tale_cli::{load_interpreter, play_with_io, summarize};
use tale_core::TaleError;

#[derive(Debug, Parser)]
#[command(name = "tale")]
#[command(about = "Scenario-driven interactive fiction runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play a scenario interactively on the console.
    Play(PlayArgs),
    /// Load and validate a scenario, then print a JSON summary.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct PlayArgs {
    #[arg(long = "scenario")]
    scenario: PathBuf,
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[arg(long = "scenario")]
    scenario: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32, TaleError> {
    match cli.command {
        Command::Play(args) => run_play(args),
        Command::Check(args) => run_check(args),
    }
}

fn run_play(args: PlayArgs) -> Result<i32, TaleError> {
    let interpreter = load_interpreter(&args.scenario)?;
    let stdin = io::stdin();
    let mut out = io::stdout();
    play_with_io(&interpreter, stdin.lock(), io::stdout(), &mut out)?;
    Ok(0)
}

fn run_check(args: CheckArgs) -> Result<i32, TaleError> {
    let interpreter = load_interpreter(&args.scenario)?;
    let summary = summarize(interpreter.model());
    let json = serde_json::to_string_pretty(&summary).map_err(|error| {
        TaleError::new(
            "CLI_SUMMARY_ENCODE",
            format!("Cannot encode summary: {}", error),
        )
    })?;
    println!("{}", json);
    Ok(0)
}

fn emit_error(error: TaleError) -> i32 {
    eprintln!("{}", error);
    if let Some(span) = &error.span {
        eprintln!("  at line {}, column {}", span.start.line, span.start.column);
    }
    1
}
