#![allow(clippy::cast_precision_loss)]

use cdcl_sat::sat::cdcl::Cdcl;
use cdcl_sat::sat::config::{CcMinMode, SolverOptions};
use cdcl_sat::sat::dimacs::Dimacs;
use cdcl_sat::sat::literal::{Lbool, Lit, Var};
use cdcl_sat::sat::phase_saving::PhaseSaving;
use cdcl_sat::sat::restarter::RestartStrategy;
use cdcl_sat::sat::solver::{SolveStatus, Solver, SolverStats};
use clap::{ArgAction, Args, Parser, Subcommand};
use itertools::Itertools;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};
use tracing::{info, warn};

/// Exit code of a satisfiable run.
pub(crate) const EXIT_SAT: i32 = 10;
/// Exit code of an unsatisfiable run.
pub(crate) const EXIT_UNSAT: i32 = 20;

#[derive(Parser, Debug)]
#[command(name = "cdcl-sat", version, about = "A MiniSat-style CDCL SAT solver")]
pub(crate) struct Cli {
    /// A DIMACS file, or a directory whose `.cnf` files are solved in turn.
    pub path: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub common: CommonOptions,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a CNF file in DIMACS format.
    File {
        #[arg(long)]
        path: PathBuf,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve clauses given on the command line, one clause per line.
    Text {
        #[arg(short, long)]
        input: String,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Log search progress.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Only log warnings.
    #[arg(short, long, default_value_t = false, conflicts_with = "debug")]
    pub(crate) quiet: bool,

    /// Check a model against the input clauses.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub(crate) verify: bool,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub(crate) stats: bool,

    /// Print the model as a `v` line.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,

    /// Write the simplified problem in DIMACS form to this file before solving.
    #[arg(long)]
    pub(crate) dimacs_out: Option<PathBuf>,

    #[command(flatten)]
    pub(crate) solver: SolverArgs,
}

/// Tuning knobs; anything left out keeps its default.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct SolverArgs {
    /// Variable activity decay factor, in (0, 1).
    #[arg(long)]
    pub(crate) var_decay: Option<f64>,

    /// Clause activity decay factor, in (0, 1).
    #[arg(long)]
    pub(crate) cla_decay: Option<f64>,

    /// Frequency of random decisions, in [0, 1].
    #[arg(long)]
    pub(crate) rnd_freq: Option<f64>,

    #[arg(long)]
    pub(crate) rnd_seed: Option<u64>,

    /// Conflict clause minimization.
    #[arg(long, value_enum)]
    pub(crate) ccmin_mode: Option<CcMinMode>,

    #[arg(long, value_enum)]
    pub(crate) phase_saving: Option<PhaseSaving>,

    /// Start from small random variable activities.
    #[arg(long, default_value_t = false)]
    pub(crate) rnd_init: bool,

    /// Pick decision polarities at random.
    #[arg(long, default_value_t = false)]
    pub(crate) rnd_pol: bool,

    /// Restart geometrically instead of following the Luby sequence.
    #[arg(long, default_value_t = false)]
    pub(crate) no_luby: bool,

    /// Conflicts before the first restart.
    #[arg(long)]
    pub(crate) rfirst: Option<u32>,

    /// Restart interval growth factor.
    #[arg(long)]
    pub(crate) rinc: Option<f64>,

    /// Fraction of wasted clause memory that triggers garbage collection.
    #[arg(long)]
    pub(crate) gc_frac: Option<f64>,

    /// Lower bound on the learnt clause limit.
    #[arg(long)]
    pub(crate) min_learnts: Option<u32>,

    /// Give up after this many conflicts.
    #[arg(long)]
    pub(crate) conf_budget: Option<u64>,

    /// Give up after this many propagations.
    #[arg(long)]
    pub(crate) prop_budget: Option<u64>,
}

impl SolverArgs {
    pub(crate) fn to_options(&self) -> SolverOptions {
        let mut opts = SolverOptions::default();
        if let Some(v) = self.var_decay {
            opts.var_decay = v;
        }
        if let Some(v) = self.cla_decay {
            opts.clause_decay = v;
        }
        if let Some(v) = self.rnd_freq {
            opts.random_var_freq = v;
        }
        if let Some(v) = self.rnd_seed {
            opts.random_seed = v;
        }
        if let Some(v) = self.ccmin_mode {
            opts.ccmin_mode = v;
        }
        if let Some(v) = self.phase_saving {
            opts.phase_saving = v;
        }
        if let Some(v) = self.rfirst {
            opts.restart_first = v;
        }
        if let Some(v) = self.rinc {
            opts.restart_inc = v;
        }
        if let Some(v) = self.gc_frac {
            opts.garbage_frac = v;
        }
        if let Some(v) = self.min_learnts {
            opts.min_learnts_lim = v;
        }
        opts.rnd_init_act |= self.rnd_init;
        opts.rnd_pol |= self.rnd_pol;
        if self.no_luby {
            opts.restart_strategy = RestartStrategy::Geometric;
        }
        opts
    }

    /// A solver configured from these arguments, budgets included.
    pub(crate) fn build(&self) -> Result<Cdcl, String> {
        let mut solver = Cdcl::with_options(self.to_options()).map_err(|e| e.to_string())?;
        if let Some(n) = self.conf_budget {
            solver.set_conf_budget(n);
        }
        if let Some(n) = self.prop_budget {
            solver.set_prop_budget(n);
        }
        Ok(solver)
    }
}

/// Installs the `fmt` subscriber on stderr, keeping stdout for results.
pub(crate) fn init_tracing(common: &CommonOptions) {
    let level = if common.quiet {
        tracing::Level::WARN
    } else if common.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Parses clauses given as text. Each line is a clause; a `0` also ends one,
/// and `c` / `p` lines are skipped.
pub(crate) fn parse_text(input: &str) -> Result<Dimacs, String> {
    let mut cnf = Dimacs::default();
    for line in input
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('c') && !line.starts_with('p'))
    {
        let mut current = Vec::new();
        for token in line.split_whitespace() {
            let value = token
                .parse::<i32>()
                .map_err(|_| format!("unexpected token `{token}`"))?;
            if value == 0 {
                cnf.clauses.push(std::mem::take(&mut current));
                continue;
            }
            if value.unsigned_abs() > Var::MAX_INDEX + 1 {
                return Err(format!("literal {value} out of range"));
            }
            cnf.num_vars = cnf.num_vars.max(value.unsigned_abs() as usize);
            current.push(Lit::from_dimacs(value));
        }
        if !current.is_empty() {
            cnf.clauses.push(current);
        }
    }
    Ok(cnf)
}

pub(crate) fn solve_file(path: &Path, common: &CommonOptions) -> Result<SolveStatus, String> {
    if !path.is_file() {
        return Err(format!("Provided path is not a file: {}", path.display()));
    }

    let time = Instant::now();
    let cnf = Dimacs::parse_file(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let parse_time = time.elapsed();

    solve_and_report(&cnf, common, Some(path), parse_time)
}

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
            warn!(file = %file_path.display(), "skipping non-CNF file");
            continue;
        }
        solve_file(file_path, common)?;
    }
    Ok(())
}

/// Allocated and resident memory in MiB, if jemalloc reports them.
fn memory_mib() -> Option<(f64, f64)> {
    epoch::advance().ok()?;
    let allocated = stats::allocated::mib().ok()?.read().ok()?;
    let resident = stats::resident::mib().ok()?.read().ok()?;
    Some((
        allocated as f64 / (1024.0 * 1024.0),
        resident as f64 / (1024.0 * 1024.0),
    ))
}

pub(crate) fn solve_and_report(
    cnf: &Dimacs,
    common: &CommonOptions,
    label: Option<&Path>,
    parse_time: Duration,
) -> Result<SolveStatus, String> {
    if let Some(name) = label {
        info!(file = %name.display(), "solving");
    }

    let mut solver = common.solver.build()?;
    cnf.load(&mut solver);

    if let Some(out) = &common.dimacs_out {
        write_dimacs(&solver, out)?;
        info!(file = %out.display(), "wrote simplified problem");
    }

    let time = Instant::now();
    let status = solver.solve_limited(&[]);
    let elapsed = time.elapsed();

    if common.verify && status.is_sat() {
        if !cnf.verify(solver.model()) {
            return Err("model failed verification".to_string());
        }
        info!("model verified");
    }

    if common.stats {
        print_stats(parse_time, elapsed, cnf, &solver, memory_mib());
    }

    println!("s {status}");
    if common.print_solution && status.is_sat() {
        println!("v {}", model_line(solver.model()));
    }
    Ok(status)
}

fn write_dimacs(solver: &Cdcl, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("Unable to write {}: {e}", path.display()))?;
    let mut out = BufWriter::new(file);
    solver
        .write_dimacs(&mut out, &[])
        .and_then(|()| out.flush())
        .map_err(|e| format!("Unable to write {}: {e}", path.display()))
}

/// The model in DIMACS form, terminated by `0`.
pub(crate) fn model_line(model: &[Lbool]) -> String {
    model
        .iter()
        .enumerate()
        .filter_map(|(i, value)| {
            let var = i64::try_from(i).ok()? + 1;
            match value {
                Lbool::True => Some(var),
                Lbool::False => Some(-var),
                Lbool::Undef => None,
            }
        })
        .chain(std::iter::once(0))
        .join(" ")
}

pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

pub(crate) fn stat_line_with_rate(label: &str, value: u64, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

pub(crate) fn print_stats(
    parse_time: Duration,
    elapsed: Duration,
    cnf: &Dimacs,
    solver: &Cdcl,
    memory: Option<(f64, f64)>,
) {
    let elapsed_secs = elapsed.as_secs_f64();
    let s: &SolverStats = solver.stats();

    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables", cnf.num_vars);
    stat_line("Clauses (original)", cnf.num_clauses());
    stat_line("Literals (original)", cnf.num_literals());

    println!("========================[ Search Statistics ]========================");
    stat_line("Restarts", s.restarts());
    stat_line_with_rate("Conflicts", s.conflicts, elapsed_secs);
    stat_line_with_rate("Decisions", s.decisions, elapsed_secs);
    stat_line(
        "Random decisions (%)",
        format!("{:.2}", percent(s.rnd_decisions, s.decisions)),
    );
    stat_line_with_rate("Propagations", s.propagations, elapsed_secs);
    stat_line("Conflict literals", s.tot_literals);
    stat_line(
        "Deleted by minimization (%)",
        format!("{:.2}", percent(s.max_literals - s.tot_literals, s.max_literals)),
    );
    stat_line("Learnt clauses (kept)", solver.num_learnts());
    stat_line("Garbage collections", s.garbage_collections);
    if let Some((allocated, resident)) = memory {
        stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
        stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    }
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("=====================================================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_text_simple() {
        let cnf = parse_text("1 -2 0\n2 3 0").unwrap();
        assert_eq!(cnf.num_vars, 3);
        assert_eq!(cnf.num_clauses(), 2);
        assert_eq!(cnf.clauses[0], vec![Lit::from_dimacs(1), Lit::from_dimacs(-2)]);
    }

    #[test]
    fn test_parse_text_with_comments_and_header() {
        let cnf = parse_text("c comment\np cnf 2 2\n1 0\n\n-2 0\n").unwrap();
        assert_eq!(cnf.num_clauses(), 2);
        assert_eq!(cnf.num_vars, 2);
    }

    #[test]
    fn test_parse_text_line_ends_clause() {
        let cnf = parse_text("1 2\n-1 0 3 0").unwrap();
        assert_eq!(cnf.num_clauses(), 3);
        assert_eq!(cnf.clauses[2], vec![Lit::from_dimacs(3)]);
    }

    #[test]
    fn test_parse_text_rejects_garbage() {
        assert!(parse_text("1 x 0").is_err());
    }

    #[test]
    fn test_parse_text_rejects_out_of_range_literals() {
        assert_eq!(
            parse_text("-2147483648 0").unwrap_err(),
            "literal -2147483648 out of range"
        );
        assert!(parse_text("1 -2147483648").is_err());

        // the largest variable still has both literals below the sentinels
        let cnf = parse_text("-2147483647 0").unwrap();
        assert_eq!(cnf.num_vars, Var::MAX_INDEX as usize + 1);
        assert_eq!(cnf.clauses[0][0].var(), Var::new(Var::MAX_INDEX));
    }

    #[test]
    fn test_solver_flags() {
        let cli = Cli::try_parse_from([
            "cdcl-sat",
            "text",
            "--input",
            "1 0",
            "--ccmin-mode",
            "basic",
            "--phase-saving",
            "limited",
            "--no-luby",
            "--rinc",
            "1.5",
            "--rnd-seed",
            "7",
            "--conf-budget",
            "10",
        ])
        .unwrap();
        let Some(Commands::Text { common, .. }) = cli.command else {
            panic!("expected the text command");
        };

        let opts = common.solver.to_options();
        assert_eq!(opts.ccmin_mode, CcMinMode::Basic);
        assert_eq!(opts.phase_saving, PhaseSaving::Limited);
        assert_eq!(opts.restart_strategy, RestartStrategy::Geometric);
        assert!((opts.restart_inc - 1.5).abs() < f64::EPSILON);
        assert_eq!(opts.random_seed, 7);
        assert!((opts.var_decay - SolverOptions::default().var_decay).abs() < f64::EPSILON);
        assert!(common.solver.build().is_ok());
    }

    #[test]
    fn test_invalid_flag_value_is_reported() {
        let args = SolverArgs {
            var_decay: Some(1.5),
            ..SolverArgs::default()
        };
        assert!(args.build().is_err());
    }

    #[test]
    fn test_verify_can_be_switched_off() {
        let cli = Cli::try_parse_from(["cdcl-sat", "--verify", "false", "x.cnf"]).unwrap();
        assert!(!cli.common.verify);
        assert_eq!(cli.path, Some(PathBuf::from("x.cnf")));
    }

    #[test]
    fn test_model_line() {
        let model = [Lbool::True, Lbool::False, Lbool::Undef, Lbool::True];
        assert_eq!(model_line(&model), "1 -2 4 0");
    }

    #[test]
    fn test_solve_and_report() {
        let common = CommonOptions {
            stats: false,
            verify: true,
            ..CommonOptions::default()
        };
        let sat = parse_text("1 2 0\n-1 0").unwrap();
        assert_eq!(
            solve_and_report(&sat, &common, None, Duration::ZERO),
            Ok(SolveStatus::Satisfiable)
        );

        let unsat = parse_text("1 0\n-1 0").unwrap();
        assert_eq!(
            solve_and_report(&unsat, &common, None, Duration::ZERO),
            Ok(SolveStatus::Unsatisfiable)
        );
    }
}
