#![allow(clippy::cast_precision_loss)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use log::{error, info};
use ordered_float::OrderedFloat;
use sat_dpll::sat::assignment::Assignment;
use sat_dpll::sat::dimacs::{parse_dimacs, parse_file, write_file, ClauseTerminator};
use sat_dpll::sat::error::Error;
use sat_dpll::sat::formula::Cnf;
use sat_dpll::sat::solver::{SolutionStats, Solver, SolverConfig};
use sat_dpll::sat::variable_selection::VariableSelectionType;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};

/// Defines the command-line interface for the solver.
///
/// Uses `clap` for parsing arguments.
#[derive(Parser, Debug)]
#[command(
    name = "sat-dpll",
    version,
    about = "A chronological DPLL SAT solver",
    args_conflicts_with_subcommands = true
)]
pub(crate) struct Cli {
    /// Path to a DIMACS .cnf file to solve when no subcommand is given.
    pub path: Option<PathBuf>,

    /// Specifies the subcommand to execute (e.g. `file`, `text`, `sweep`).
    #[clap(subcommand)]
    pub command: Option<Commands>,

    /// Common options applicable to all commands.
    #[command(flatten)]
    pub common: CommonOptions,
}

/// Enumerates the available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a CNF file in DIMACS format.
    File {
        /// Path to the DIMACS .cnf file.
        #[arg(long)]
        path: PathBuf,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve a CNF formula given on the command line.
    Text {
        /// The formula in infix form, e.g. "(p0 v ¬p1) ∧ p2".
        #[arg(short, long)]
        input: String,

        /// Read the input as DIMACS text instead, e.g. "1 -2 0\n2 3 0".
        #[arg(long, default_value_t = false)]
        dimacs: bool,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve every .cnf file under a directory.
    Dir {
        /// Directory to search recursively.
        #[arg(long)]
        path: PathBuf,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Write random k-CNF instances in DIMACS format.
    Generate {
        /// Number of variables.
        #[arg(short, long)]
        n: usize,

        /// Number of clauses.
        #[arg(short, long)]
        l: usize,

        /// Literals per clause.
        #[arg(short, long, default_value_t = 3)]
        k: usize,

        /// Number of instances to write.
        #[arg(long, default_value_t = 1)]
        count: usize,

        /// Output directory, created if missing.
        #[arg(long)]
        out: PathBuf,

        /// How clause lines are terminated.
        #[arg(long, default_value_t = ClauseTerminator::Zero)]
        terminator: ClauseTerminator,

        /// Seed for reproducible instances.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Sweep the clause-to-variable ratio of random 3-CNF and report how
    /// often instances are satisfiable and how hard they are.
    Sweep {
        /// Number of variables per instance.
        #[arg(short, long, default_value_t = 20)]
        n: usize,

        /// Literals per clause.
        #[arg(short, long, default_value_t = 3)]
        k: usize,

        /// First clause-to-variable ratio.
        #[arg(long, default_value_t = 1.0)]
        min_ratio: f64,

        /// Ratios stop before this value.
        #[arg(long, default_value_t = 8.0)]
        max_ratio: f64,

        /// Ratio increment.
        #[arg(long, default_value_t = 0.5)]
        ratio_step: f64,

        /// Instances solved per ratio.
        #[arg(long, default_value_t = 100)]
        instances: usize,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Defines common command-line options shared across different subcommands.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Enable debug logging of every decision and backtrack. `RUST_LOG` overrides.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Check a found model against the formula.
    #[arg(short, long, default_value_t = true, action = clap::ArgAction::Set)]
    pub(crate) verify: bool,

    /// Print problem and search statistics after solving.
    #[arg(short, long, default_value_t = true, action = clap::ArgAction::Set)]
    pub(crate) stats: bool,

    /// Print the satisfying assignment if the formula is satisfiable.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,

    /// Branching policy.
    #[arg(long, default_value_t = VariableSelectionType::Naive)]
    pub(crate) selector: VariableSelectionType,

    /// Give up after this many seconds.
    #[arg(short, long)]
    pub(crate) timeout: Option<f64>,

    /// Seed for the randomised branching policies and the sweep generator.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

impl CommonOptions {
    /// Converts the options into the solver configuration.
    pub(crate) fn solver_config(&self) -> Result<SolverConfig, String> {
        let mut config = SolverConfig::new(self.selector);
        config.seed = self.seed;
        if let Some(seconds) = self.timeout {
            let timeout = Duration::try_from_secs_f64(seconds)
                .map_err(|e| format!("invalid timeout {seconds}: {e}"))?;
            config = config.with_timeout(timeout);
        }
        Ok(config)
    }
}

/// Outcome of a single solver run.
pub(crate) enum Outcome {
    Sat(Assignment),
    Unsat,
    TimedOut(Duration),
}

impl Outcome {
    const fn model(&self) -> Option<&Assignment> {
        match self {
            Self::Sat(assignment) => Some(assignment),
            Self::Unsat | Self::TimedOut(_) => None,
        }
    }
}

/// Solves a CNF formula with the solver described by `common`.
///
/// # Errors
///
/// Any solver error other than running out of time.
pub(crate) fn solve(
    cnf: &Cnf,
    label: Option<&Path>,
    common: &CommonOptions,
) -> Result<(Outcome, Duration, SolutionStats), String> {
    if let Some(name) = label {
        println!("Solving: {}", name.display());
    }

    if common.debug {
        println!("CNF: {cnf}");
        println!("Variables: {}", cnf.num_vars());
        println!("Clauses: {}", cnf.len());
    }

    let mut solver = common.solver_config()?.build();

    let time = Instant::now();
    let result = solver.solve(cnf);
    let elapsed = time.elapsed();

    let outcome = match result {
        Ok(Some(assignment)) => Outcome::Sat(assignment),
        Ok(None) => Outcome::Unsat,
        Err(Error::Timeout(budget)) => Outcome::TimedOut(budget),
        Err(e) => return Err(e.to_string()),
    };

    Ok((outcome, elapsed, solver.stats()))
}

/// Verifies a model against the formula it was found for.
///
/// # Errors
///
/// If the model leaves some clause unsatisfied.
pub(crate) fn verify_solution(cnf: &Cnf, outcome: &Outcome) -> Result<(), String> {
    match outcome {
        Outcome::Sat(assignment) => {
            let ok = cnf.evaluate(assignment);
            println!("Verified: {ok:?}");
            if ok {
                Ok(())
            } else {
                Err("solution failed verification".to_owned())
            }
        }
        Outcome::Unsat => {
            println!("UNSAT");
            Ok(())
        }
        Outcome::TimedOut(_) => Ok(()),
    }
}

/// Allocated and resident memory in MiB, if jemalloc statistics are available.
fn memory_usage() -> Option<(f64, f64)> {
    epoch::advance().ok()?;
    let allocated = stats::allocated::mib().ok()?.read().ok()?;
    let resident = stats::resident::mib().ok()?.read().ok()?;
    Some((
        allocated as f64 / (1024.0 * 1024.0),
        resident as f64 / (1024.0 * 1024.0),
    ))
}

/// Solves a parsed formula and reports results including stats and verification.
///
/// # Errors
///
/// A solver error or a model that fails verification.
pub(crate) fn solve_and_report(
    cnf: &Cnf,
    common: &CommonOptions,
    label: Option<&Path>,
    parse_time: Duration,
) -> Result<(), String> {
    let (outcome, elapsed, solver_stats) = solve(cnf, label, common)?;
    let (allocated_mib, resident_mib) = memory_usage().unwrap_or_default();

    if common.verify {
        verify_solution(cnf, &outcome)?;
    }

    if common.stats {
        print_stats(
            parse_time,
            elapsed,
            cnf,
            &solver_stats,
            allocated_mib,
            resident_mib,
        );
    }

    if common.print_solution {
        if let Some(assignment) = outcome.model() {
            println!("v {}", format_model(cnf, assignment)?);
        }
    }

    match outcome {
        Outcome::Sat(_) => println!("\nSATISFIABLE"),
        Outcome::Unsat => println!("\nUNSATISFIABLE"),
        Outcome::TimedOut(budget) => println!("\nUNKNOWN (timed out after {budget:?})"),
    }

    Ok(())
}

/// The model as a line of literals in registry order, e.g. `p0 ¬p1 p2`.
///
/// # Errors
///
/// If the model holds a variable the formula's registry does not know.
pub(crate) fn format_model(cnf: &Cnf, assignment: &Assignment) -> Result<String, String> {
    assignment
        .to_literals()
        .into_iter()
        .map(|lit| cnf.registry().render(lit))
        .collect::<Result<Vec<_>, _>>()
        .map(|names| names.join(" "))
        .map_err(|e| e.to_string())
}

/// Parses and solves a single DIMACS file.
///
/// # Errors
///
/// If the file cannot be read or parsed, or solving fails.
pub(crate) fn solve_file(path: &Path, common: &CommonOptions) -> Result<(), String> {
    let time = Instant::now();
    let cnf = parse_file(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let elapsed = time.elapsed();

    solve_and_report(&cnf, common, Some(path), elapsed)
}

/// Parses and solves a formula given as text.
///
/// # Errors
///
/// If the text cannot be parsed or solving fails.
pub(crate) fn solve_text(input: &str, dimacs: bool, common: &CommonOptions) -> Result<(), String> {
    let time = Instant::now();
    let cnf = if dimacs {
        parse_dimacs(Cursor::new(input))
    } else {
        input.parse::<Cnf>()
    }
    .map_err(|e| e.to_string())?;
    let elapsed = time.elapsed();

    solve_and_report(&cnf, common, None, elapsed)
}

/// Solves a directory of CNF files.
///
/// Walks the directory recursively and solves every `.cnf` file in it,
/// skipping anything else.
///
/// # Errors
///
/// If `path` is not a directory, or any file fails to parse or solve.
pub(crate) fn solve_dir(path: &Path, common: &CommonOptions) -> Result<(), String> {
    if !path.is_dir() {
        return Err(format!("Provided path is not a directory: {}", path.display()));
    }

    for entry in walkdir::WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let file_path = entry.path();

        if !file_path.is_file() {
            continue;
        }

        if file_path.extension().is_none_or(|ext| ext != "cnf") {
            info!("Skipping non-CNF file: {}", file_path.display());
            continue;
        }

        solve_file(file_path, common)?;
    }

    Ok(())
}

/// Writes `count` random k-CNF instances named `f<i>.cnf` into `out`.
///
/// # Errors
///
/// If the parameters are impossible or a file cannot be written.
pub(crate) fn generate(
    (n, l, k): (usize, usize, usize),
    count: usize,
    out: &Path,
    terminator: ClauseTerminator,
    seed: Option<u64>,
) -> Result<(), String> {
    std::fs::create_dir_all(out).map_err(|e| format!("{}: {e}", out.display()))?;
    let mut rng = seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);

    for i in 0..count {
        let cnf = Cnf::generate_with(&mut rng, n, l, k).map_err(|e| e.to_string())?;
        let file_path = out.join(format!("f{i}.cnf"));
        write_file(&cnf, &file_path, terminator)
            .map_err(|e| format!("{}: {e}", file_path.display()))?;
        println!("Wrote {}", file_path.display());
    }

    Ok(())
}

/// Results for one clause-to-variable ratio of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SweepRow {
    pub(crate) ratio: f64,
    pub(crate) clauses: usize,
    pub(crate) satisfiable: usize,
    pub(crate) finished: usize,
    pub(crate) timeouts: usize,
    pub(crate) mean_calls: f64,
    pub(crate) median_runtime: Duration,
}

/// Ratios `min, min + step, ...` strictly below `max`.
pub(crate) fn ratios(min: f64, max: f64, step: f64) -> Result<Vec<f64>, String> {
    if step <= 0.0 || !step.is_finite() {
        return Err(format!("ratio step must be positive, got {step}"));
    }

    Ok((0_u32..)
        .map(|i| f64::from(i).mul_add(step, min))
        .take_while(|&ratio| ratio < max)
        .collect())
}

/// Solves `instances` random formulas at one ratio, sequentially.
///
/// # Errors
///
/// If the generator parameters are impossible or the solver fails for a
/// reason other than its timeout.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn sweep_ratio(
    rng: &mut fastrand::Rng,
    (n, k): (usize, usize),
    ratio: f64,
    instances: usize,
    common: &CommonOptions,
) -> Result<SweepRow, String> {
    let clauses = (ratio * n as f64) as usize;
    let mut solver = common.solver_config()?.build();

    let mut satisfiable = 0;
    let mut timeouts = 0;
    let mut calls = Vec::with_capacity(instances);
    let mut runtimes = Vec::with_capacity(instances);

    for _ in 0..instances {
        let cnf = Cnf::generate_with(rng, n, clauses, k).map_err(|e| e.to_string())?;

        let time = Instant::now();
        let result = solver.solve(&cnf);
        let elapsed = time.elapsed();

        match result {
            Ok(model) => {
                if let Some(assignment) = &model {
                    if common.verify && !cnf.evaluate(assignment) {
                        return Err(format!("solution failed verification: {cnf}"));
                    }
                    satisfiable += 1;
                }
                calls.push(solver.stats().decisions);
                runtimes.push(OrderedFloat(elapsed.as_secs_f64()));
            }
            Err(e) if e.is_timeout() => timeouts += 1,
            Err(e) => return Err(e.to_string()),
        }
    }

    runtimes.sort_unstable();
    let median_runtime = runtimes
        .get(runtimes.len() / 2)
        .map_or(Duration::ZERO, |secs| Duration::from_secs_f64(secs.0));
    let mean_calls = if calls.is_empty() {
        0.0
    } else {
        calls.iter().sum::<usize>() as f64 / calls.len() as f64
    };

    Ok(SweepRow {
        ratio,
        clauses,
        satisfiable,
        finished: calls.len(),
        timeouts,
        mean_calls,
        median_runtime,
    })
}

/// Runs the phase-transition sweep and prints one row per ratio.
///
/// # Errors
///
/// See [`sweep_ratio`].
pub(crate) fn sweep(
    (n, k): (usize, usize),
    (min_ratio, max_ratio, ratio_step): (f64, f64, f64),
    instances: usize,
    common: &CommonOptions,
) -> Result<Vec<SweepRow>, String> {
    let mut rng = common
        .seed
        .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
    let mut rows = Vec::new();

    println!(
        "Sweeping n={n}, k={k}, {instances} instances per ratio, selector {}",
        common.selector
    );
    println!("|  ratio  clauses  sat-fraction  mean-calls  median-ms  timeouts  |");

    for ratio in ratios(min_ratio, max_ratio, ratio_step)? {
        let row = sweep_ratio(&mut rng, (n, k), ratio, instances, common)?;
        let fraction = if row.finished == 0 {
            0.0
        } else {
            row.satisfiable as f64 / row.finished as f64
        };
        println!(
            "|  {:>5.2}  {:>7}  {:>12.2}  {:>10.1}  {:>9.3}  {:>8}  |",
            row.ratio,
            row.clauses,
            fraction,
            row.mean_calls,
            row.median_runtime.as_secs_f64() * 1000.0,
            row.timeouts
        );
        rows.push(row);
    }

    Ok(rows)
}

/// Helper function to print a single statistic line in a formatted table row.
pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

/// Helper function to print a statistic line that includes a rate (value/second).
pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

/// Prints a summary of problem and search statistics.
pub(crate) fn print_stats(
    parse_time: Duration,
    elapsed: Duration,
    cnf: &Cnf,
    s: &SolutionStats,
    allocated: f64,
    resident: f64,
) {
    let elapsed_secs = elapsed.as_secs_f64();
    let literals: usize = cnf.iter().map(|c| c.len()).sum();

    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables", cnf.num_vars());
    stat_line("Clauses", cnf.len());
    stat_line("Literals", literals);

    println!("========================[ Search Statistics ]========================");
    stat_line_with_rate("Decisions", s.decisions, elapsed_secs);
    stat_line_with_rate("Propagations", s.propagations, elapsed_secs);
    stat_line_with_rate("Conflicts", s.conflicts, elapsed_secs);
    stat_line_with_rate("Backtracks", s.backtracks, elapsed_secs);
    stat_line("Max depth", s.max_depth);
    stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
    stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("=====================================================================");
}

/// Prints the top-level usage, for a bare invocation with nothing to solve.
///
/// # Errors
///
/// If writing to stdout fails.
pub(crate) fn print_help() -> Result<(), String> {
    Cli::command().print_help().map_err(|e| e.to_string())
}

/// Logs a failure and converts it into the process exit status.
pub(crate) fn report(result: Result<(), String>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            1
        }
    }
}
