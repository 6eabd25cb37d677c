#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A reader for the DIMACS CNF format.
//!
//! The format consists of:
//! - Comment lines starting with `c`.
//! - A problem line `p cnf <variables> <clauses>` before the first clause.
//! - Clauses as whitespace-separated non-zero integers, each terminated by `0`.
//!   A clause may span several lines and a line may hold several clauses.
//! - An optional `%` line marking the end of the data, as some benchmark
//!   suites append one.
//!
//! The counts in the problem line are checked: a literal on a variable beyond
//! the declared count and a clause count that differs from the declared one
//! are both errors.

use crate::sat::literal::{Lbool, Lit, Var};
use crate::sat::solver::Solver;
use itertools::Itertools;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: clause before the `p cnf` header")]
    MissingHeader { line: usize },
    #[error("line {line}: second `p` line")]
    DuplicateHeader { line: usize },
    #[error("line {line}: malformed header `{text}`")]
    BadHeader { line: usize, text: String },
    #[error("line {line}: unexpected token `{token}`")]
    BadToken { line: usize, token: String },
    #[error("line {line}: literal {lit} exceeds the declared {num_vars} variables")]
    VarOutOfRange { line: usize, lit: i32, num_vars: usize },
    #[error("header declares {declared} clauses, found {found}")]
    ClauseCountMismatch { declared: usize, found: usize },
    #[error("last clause is not terminated by 0")]
    UnterminatedClause,
}

/// A parsed CNF formula.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dimacs {
    pub num_vars: usize,
    pub clauses: Vec<Vec<Lit>>,
}

/// Parses the counts of a `p cnf <vars> <clauses>` line.
fn parse_header(text: &str, line: usize) -> Result<(usize, usize), ParseError> {
    let bad = || ParseError::BadHeader {
        line,
        text: text.to_string(),
    };
    let Some(("p", "cnf", vars, clauses)) = text.split_whitespace().collect_tuple() else {
        return Err(bad());
    };
    let vars = vars.parse::<usize>().map_err(|_| bad())?;
    let clauses = clauses.parse::<usize>().map_err(|_| bad())?;
    if vars > Var::MAX_INDEX as usize + 1 {
        return Err(bad());
    }
    Ok((vars, clauses))
}

impl Dimacs {
    /// Reads a formula from `reader`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] on I/O failure or malformed input.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        let mut header: Option<(usize, usize)> = None;
        let mut clauses = Vec::new();
        let mut current = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let number = idx + 1;
            let trimmed = line.trim_start();

            match trimmed.chars().next() {
                None | Some('c') => continue,
                Some('%') => break,
                Some('p') => {
                    if header.is_some() {
                        return Err(ParseError::DuplicateHeader { line: number });
                    }
                    header = Some(parse_header(trimmed, number)?);
                    continue;
                }
                Some(_) => {}
            }

            let Some((num_vars, _)) = header else {
                return Err(ParseError::MissingHeader { line: number });
            };
            for token in trimmed.split_whitespace() {
                let value = token.parse::<i32>().map_err(|_| ParseError::BadToken {
                    line: number,
                    token: token.to_string(),
                })?;
                if value == 0 {
                    clauses.push(std::mem::take(&mut current));
                    continue;
                }
                if value.unsigned_abs() as usize > num_vars {
                    return Err(ParseError::VarOutOfRange {
                        line: number,
                        lit: value,
                        num_vars,
                    });
                }
                current.push(Lit::from_dimacs(value));
            }
        }

        if !current.is_empty() {
            return Err(ParseError::UnterminatedClause);
        }
        let (num_vars, declared) = header.unwrap_or_default();
        if declared != clauses.len() {
            return Err(ParseError::ClauseCountMismatch {
                declared,
                found: clauses.len(),
            });
        }
        Ok(Self { num_vars, clauses })
    }

    /// Reads a formula from the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the file cannot be read or is malformed.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    #[must_use]
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Total number of literal occurrences.
    #[must_use]
    pub fn num_literals(&self) -> usize {
        self.clauses.iter().map(Vec::len).sum()
    }

    /// One past the largest variable index a clause mentions.
    #[must_use]
    pub fn used_vars(&self) -> usize {
        self.clauses
            .iter()
            .flatten()
            .map(|lit| lit.var().index() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Adds every clause to `solver`, creating variables up to the largest
    /// one in use.
    ///
    /// Declared but unused variables are not created, so a huge header costs
    /// nothing. Variables already known to the solver are reused. Returns
    /// `false` once the solver finds the clauses unsatisfiable; loading stops
    /// there.
    pub fn load<S: Solver>(&self, solver: &mut S) -> bool {
        while solver.num_vars() < self.used_vars() {
            solver.new_var();
        }
        self.clauses.iter().all(|clause| solver.add_clause(clause))
    }

    /// Whether `model` satisfies every clause.
    #[must_use]
    pub fn verify(&self, model: &[Lbool]) -> bool {
        self.clauses.iter().all(|clause| {
            clause.iter().any(|&lit| {
                model
                    .get(lit.var().index())
                    .is_some_and(|&value| (value ^ lit.is_negated()).is_true())
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::cdcl::Cdcl;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<Dimacs, ParseError> {
        Dimacs::parse(Cursor::new(text))
    }

    fn lits(dimacs: &[i32]) -> Vec<Lit> {
        dimacs.iter().map(|&l| Lit::from_dimacs(l)).collect()
    }

    #[test]
    fn test_parse_simple() {
        let cnf = parse("c a comment\np cnf 3 2\n1 -2 0\n2 3 0\n").unwrap();
        assert_eq!(cnf.num_vars, 3);
        assert_eq!(cnf.clauses, vec![lits(&[1, -2]), lits(&[2, 3])]);
        assert_eq!(cnf.num_literals(), 4);
    }

    #[test]
    fn test_clauses_span_lines() {
        let cnf = parse("p cnf 4 2\n1 2\n-3 0 4\n0\n").unwrap();
        assert_eq!(cnf.clauses, vec![lits(&[1, 2, -3]), lits(&[4])]);
    }

    #[test]
    fn test_end_marker_and_blank_lines() {
        let cnf = parse("p cnf 2 2\n\n1 0\n\n-2 0\n%\n0\nc ignored\n").unwrap();
        assert_eq!(cnf.clauses, vec![lits(&[1]), lits(&[-2])]);
    }

    #[test]
    fn test_empty_clause() {
        let cnf = parse("p cnf 1 1\n0\n").unwrap();
        assert_eq!(cnf.clauses, vec![Vec::<Lit>::new()]);

        let mut s = Cdcl::new();
        assert!(!cnf.load(&mut s));
    }

    #[test]
    fn test_no_clauses() {
        let cnf = parse("p cnf 0 0\n").unwrap();
        assert_eq!(cnf, Dimacs::default());
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse("1 2 0\n"),
            Err(ParseError::MissingHeader { line: 1 })
        ));
        assert!(matches!(
            parse("p cnf 1 0\np cnf 1 0\n"),
            Err(ParseError::DuplicateHeader { line: 2 })
        ));
        assert!(matches!(
            parse("p dnf 1 1\n"),
            Err(ParseError::BadHeader { line: 1, .. })
        ));
        assert!(matches!(
            parse("p cnf 2\n"),
            Err(ParseError::BadHeader { .. })
        ));
        assert!(matches!(
            parse("p cnf 2 1\n1 abc 0\n"),
            Err(ParseError::BadToken { line: 2, ref token }) if token == "abc"
        ));
        assert!(matches!(
            parse("p cnf 2 1\n1 -3 0\n"),
            Err(ParseError::VarOutOfRange { lit: -3, num_vars: 2, .. })
        ));
        assert!(matches!(
            parse("p cnf 2 2\n1 0\n"),
            Err(ParseError::ClauseCountMismatch { declared: 2, found: 1 })
        ));
        assert!(matches!(
            parse("p cnf 2 1\n1 2\n"),
            Err(ParseError::UnterminatedClause)
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = parse("p cnf 2 1\n1 -3 0\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 2: literal -3 exceeds the declared 2 variables"
        );
    }

    #[test]
    fn test_load_and_verify() {
        let cnf = parse("p cnf 3 3\n1 2 0\n-1 0\n-2 3 0\n").unwrap();
        let mut s = Cdcl::new();
        assert!(cnf.load(&mut s));
        assert_eq!(s.num_vars(), 3);
        assert!(s.solve());
        assert!(cnf.verify(s.model()));
        assert!(!cnf.verify(&[Lbool::True, Lbool::False, Lbool::False]));
        assert!(!cnf.verify(&[]));
    }

    #[test]
    fn test_load_creates_only_used_variables() {
        let cnf = parse("p cnf 2000000000 2\n1 -3 0\n-1 0\n").unwrap();
        assert_eq!(cnf.num_vars, 2_000_000_000);
        assert_eq!(cnf.used_vars(), 3);

        let mut s = Cdcl::new();
        assert!(cnf.load(&mut s));
        assert_eq!(s.num_vars(), 3);
        assert!(s.solve());
        assert!(cnf.verify(s.model()));

        assert_eq!(parse("p cnf 5 0\n").unwrap().used_vars(), 0);
    }
}
