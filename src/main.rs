//! # cdcl-sat
//!
//! Command-line front end of the solver.
//!
//! ```sh
//! # solve a DIMACS file, or every .cnf file below a directory
//! cdcl-sat problem.cnf
//! cdcl-sat benchmarks/
//!
//! # the same through subcommands
//! cdcl-sat file --path problem.cnf --ccmin-mode basic --no-luby
//! cdcl-sat text --input "1 -2 0
//! 2 3 0"
//!
//! # shell completions
//! cdcl-sat completions bash
//! ```
//!
//! Results follow the SAT competition conventions: an `s` line with the
//! status, an optional `v` line with the model, and exit code 10 for
//! satisfiable, 20 for unsatisfiable and 0 when the search gave up. Errors
//! exit with 1. Logs and the statistics table are meant for humans; logs go
//! to stderr.

use crate::command_line::cli::{
    Cli, Commands, EXIT_SAT, EXIT_UNSAT, init_tracing, parse_text, solve_and_report, solve_dir,
    solve_file,
};
use cdcl_sat::sat::solver::SolveStatus;
use clap::{CommandFactory, Parser};
use std::time::Instant;

mod command_line;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const fn exit_code(status: SolveStatus) -> i32 {
    match status {
        SolveStatus::Satisfiable => EXIT_SAT,
        SolveStatus::Unsatisfiable => EXIT_UNSAT,
        SolveStatus::Unknown => 0,
    }
}

fn run(cli: Cli) -> Result<i32, String> {
    match cli.command {
        Some(Commands::File { path, common }) => {
            init_tracing(&common);
            solve_file(&path, &common).map(exit_code)
        }
        Some(Commands::Text { input, common }) => {
            init_tracing(&common);
            let time = Instant::now();
            let cnf = parse_text(&input)?;
            let parse_time = time.elapsed();
            solve_and_report(&cnf, &common, None, parse_time).map(exit_code)
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "cdcl-sat",
                &mut std::io::stdout(),
            );
            Ok(0)
        }
        None => {
            let Some(path) = cli.path else {
                return Err("No command provided. Use --help for more information.".to_string());
            };
            init_tracing(&cli.common);
            if path.is_dir() {
                solve_dir(&path, &cli.common).map(|()| 0)
            } else {
                solve_file(&path, &cli.common).map(exit_code)
            }
        }
    }
}

fn main() {
    let code = run(Cli::parse()).unwrap_or_else(|e| {
        eprintln!("{e}");
        1
    });
    std::process::exit(code);
}
