//! # sat-dpll
//!
//! `sat-dpll` is a command-line front end for a chronological DPLL SAT
//! solver. It reads formulas in DIMACS CNF format or as infix text, solves
//! them with a choice of branching policies, and can generate random k-CNF
//! instances and sweep the clause-to-variable ratio of random 3-SAT.
//!
//! ## Features
//!
//! -   **Multiple Input Formats**:
//!     -   DIMACS CNF files (`.cnf`), singly or a whole directory at a time
//!     -   Infix text such as `(p0 v ¬p1) ∧ p2`, or DIMACS text
//! -   **Branching Policies**: `naive`, `random`, `two-clause` and `modal`.
//! -   **Timeouts**: A search that runs out of time reports `UNKNOWN` rather
//!     than a wrong answer.
//! -   **Verification**: Option to check a found model against the formula.
//! -   **Statistics**: Parse time, solve time, decisions, propagations,
//!     conflicts, backtracks, search depth and memory usage.
//! -   **Generation**: Random k-CNF instances written as DIMACS files.
//! -   **Phase-Transition Sweep**: Satisfiable fraction and search effort
//!     across clause-to-variable ratios.
//!
//! ## Usage
//!
//! ```sh
//! sat-dpll [OPTIONS] [PATH]
//! sat-dpll <SUBCOMMAND> [OPTIONS]
//! ```
//!
//! A bare `PATH` is solved as a DIMACS file.
//!
//! ### Subcommands
//!
//! 1.  **`file`**: `sat-dpll file --path problem.cnf`
//! 2.  **`text`**: `sat-dpll text --input "(a v ¬b) ∧ b"` or
//!     `sat-dpll text --dimacs --input "1 -2 0"`
//! 3.  **`dir`**: `sat-dpll dir --path benchmarks/`
//! 4.  **`generate`**: `sat-dpll generate -n 50 -l 213 --count 10 --out data/`
//! 5.  **`sweep`**: `sat-dpll sweep -n 20 --instances 100 --selector modal`
//! 6.  **`completions`**: `sat-dpll completions bash`
//!
//! ### Common Options
//!
//! -   `-d, --debug`: Log every decision and backtrack.
//! -   `-v, --verify <BOOL>`: Verify the model (default: `true`).
//! -   `-s, --stats <BOOL>`: Print statistics (default: `true`).
//! -   `-p, --print-solution`: Print the model as a `v` line.
//! -   `--selector <POLICY>`: Branching policy (default: `naive`).
//! -   `-t, --timeout <SECONDS>`: Give up after this long.
//! -   `--seed <SEED>`: Seed for the random policies and the sweep generator.
//!
//! Logging goes through `env_logger`; `RUST_LOG` takes precedence over
//! `--debug`.

use crate::command_line::cli::{
    Cli, Commands, CommonOptions, generate, print_help, report, solve_dir, solve_file, solve_text,
    sweep,
};
use clap::{CommandFactory, Parser};

mod command_line;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn init_logging(common: &CommonOptions) {
    let level = if common.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    env_logger::builder()
        .format_timestamp(None)
        .format_module_path(false)
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    let cli = Cli::parse();

    let common = match &cli.command {
        Some(
            Commands::File { common, .. }
            | Commands::Text { common, .. }
            | Commands::Dir { common, .. }
            | Commands::Sweep { common, .. },
        ) => common,
        Some(Commands::Generate { .. } | Commands::Completions { .. }) | None => &cli.common,
    };
    init_logging(common);

    let result = match cli.command {
        None => match cli.path {
            Some(path) => solve_file(&path, &cli.common),
            None => print_help(),
        },
        Some(Commands::File { path, common }) => solve_file(&path, &common),
        Some(Commands::Text {
            input,
            dimacs,
            common,
        }) => solve_text(&input, dimacs, &common),
        Some(Commands::Dir { path, common }) => solve_dir(&path, &common),
        Some(Commands::Generate {
            n,
            l,
            k,
            count,
            out,
            terminator,
            seed,
        }) => generate((n, l, k), count, &out, terminator, seed),
        Some(Commands::Sweep {
            n,
            k,
            min_ratio,
            max_ratio,
            ratio_step,
            instances,
            common,
        }) => sweep(
            (n, k),
            (min_ratio, max_ratio, ratio_step),
            instances,
            &common,
        )
        .map(|_| ()),
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_owned();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    std::process::exit(report(result));
}
