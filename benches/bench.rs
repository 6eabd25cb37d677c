use cdcl_sat::sat::cdcl::Cdcl;
use cdcl_sat::sat::config::{CcMinMode, SolverOptions};
use cdcl_sat::sat::dimacs::Dimacs;
use cdcl_sat::sat::literal::{Lit, Var};
use cdcl_sat::sat::phase_saving::PhaseSaving;
use cdcl_sat::sat::restarter::RestartStrategy;
use cdcl_sat::sat::solver::Solver;
use criterion::{Criterion, criterion_group, criterion_main};
use itertools::Itertools;
use std::hint::black_box;
use std::time::Duration;

fn var(i: usize) -> Var {
    Var::new(u32::try_from(i).unwrap())
}

/// `holes + 1` pigeons into `holes` holes.
fn pigeonhole(holes: usize) -> Dimacs {
    let pigeons = holes + 1;
    let p = |i: usize, j: usize| var(i * holes + j);
    let mut clauses = (0..pigeons)
        .map(|i| (0..holes).map(|j| p(i, j).positive()).collect_vec())
        .collect_vec();
    for j in 0..holes {
        for (a, b) in (0..pigeons).tuple_combinations() {
            clauses.push(vec![p(a, j).negative(), p(b, j).negative()]);
        }
    }
    Dimacs {
        num_vars: pigeons * holes,
        clauses,
    }
}

/// Uniform random 3-SAT near the phase transition.
fn random_3sat(num_vars: usize, seed: u64) -> Dimacs {
    let mut rng = fastrand::Rng::with_seed(seed);
    let num_clauses = num_vars * 426 / 100;
    let clauses = (0..num_clauses)
        .map(|_| {
            (0..3)
                .map(|_| Lit::new(var(rng.usize(..num_vars)), rng.bool()))
                .collect_vec()
        })
        .collect_vec();
    Dimacs { num_vars, clauses }
}

fn solve(cnf: &Dimacs, opts: &SolverOptions) -> bool {
    let mut solver = Cdcl::with_options(opts.clone()).unwrap();
    cnf.load(&mut solver) && solver.solve()
}

fn bench_pigeonhole(c: &mut Criterion) {
    let mut group = c.benchmark_group("pigeonhole");
    group.sample_size(10);
    let opts = SolverOptions::default();

    for holes in [6, 7] {
        let cnf = pigeonhole(holes);
        group.bench_function(format!("{holes} holes"), |b| {
            b.iter(|| black_box(solve(&cnf, &opts)));
        });
    }
    group.finish();
}

fn bench_3sat(c: &mut Criterion) {
    let cnfs = (0..20).map(|seed| random_3sat(100, seed)).collect_vec();

    let mut group = c.benchmark_group("3sat - restarts");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));
    for strategy in [RestartStrategy::Luby, RestartStrategy::Geometric] {
        let opts = SolverOptions {
            restart_strategy: strategy,
            ..SolverOptions::default()
        };
        group.bench_function(strategy.to_string(), |b| {
            b.iter(|| {
                for cnf in &cnfs {
                    black_box(solve(cnf, &opts));
                }
            });
        });
    }
    group.finish();

    let mut group = c.benchmark_group("3sat - minimization");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));
    for mode in [CcMinMode::None, CcMinMode::Basic, CcMinMode::Deep] {
        let opts = SolverOptions {
            ccmin_mode: mode,
            ..SolverOptions::default()
        };
        group.bench_function(mode.to_string(), |b| {
            b.iter(|| {
                for cnf in &cnfs {
                    black_box(solve(cnf, &opts));
                }
            });
        });
    }
    group.finish();

    let mut group = c.benchmark_group("3sat - phase saving");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));
    for phase_saving in [PhaseSaving::None, PhaseSaving::Limited, PhaseSaving::Full] {
        let opts = SolverOptions {
            phase_saving,
            ..SolverOptions::default()
        };
        group.bench_function(phase_saving.to_string(), |b| {
            b.iter(|| {
                for cnf in &cnfs {
                    black_box(solve(cnf, &opts));
                }
            });
        });
    }
    group.finish();
}

fn bench_incremental(c: &mut Criterion) {
    let cnf = random_3sat(150, 42);
    c.bench_function("incremental - assumptions", |b| {
        b.iter(|| {
            let mut solver = Cdcl::new();
            while solver.num_vars() < cnf.num_vars {
                solver.new_var();
            }
            cnf.load(&mut solver);
            for i in 0..20 {
                let assumption = Lit::new(var(i), i % 2 == 0);
                black_box(solver.solve_with_assumptions(&[assumption]));
            }
        });
    });
}

criterion_group!(benches, bench_pigeonhole, bench_3sat, bench_incremental);
criterion_main!(benches);
