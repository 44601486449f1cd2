//! Import of DIMACS CNF formulas into the engine, and serialisation of models back to DIMACS
//! literals. The parser accepts `c` comment lines, requires a single `p cnf <variables>
//! <clauses>` header and reads whitespace-separated zero-terminated clauses; a mismatch
//! between the declared and the parsed clause count is a format error.

use std::io::BufRead;

use thiserror::Error;

use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::containers::StorageKey;
use crate::engine::sat::SatSolver;

#[derive(Error, Debug)]
pub enum DimacsParseError {
    #[error("failed to read the source")]
    Io(#[from] std::io::Error),

    #[error("missing dimacs header")]
    MissingHeader,

    #[error("'{0}' is an invalid header")]
    InvalidHeader(String),

    #[error("multiple dimacs headers found")]
    DuplicateHeader,

    #[error("'{0}' is an invalid DIMACS literal")]
    InvalidLiteral(String),

    #[error("the last clause is not terminated with a '0'")]
    UnterminatedClause,

    #[error("expected to parse {expected} clauses, but parsed {parsed}")]
    IncorrectClauseCount { expected: usize, parsed: usize },
}

/// Reads a CNF formula and adds its clauses to the solver. Returns the variables created for
/// the DIMACS indices `1..=num_variables`, in order.
///
/// A clause that is infeasible at the root simply latches the solver into its infeasible
/// state; this is not a parse error.
pub fn parse_cnf(
    source: impl BufRead,
    solver: &mut SatSolver,
) -> Result<Vec<PropositionalVariable>, DimacsParseError> {
    let mut header: Option<(usize, usize)> = None;
    let mut variables: Vec<PropositionalVariable> = vec![];
    let mut clause: Vec<Literal> = vec![];
    let mut num_parsed_clauses = 0;

    for line in source.lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('c') {
            continue;
        }

        if let Some(header_body) = line.strip_prefix('p') {
            if header.is_some() {
                return Err(DimacsParseError::DuplicateHeader);
            }
            let fields: Vec<&str> = header_body.split_whitespace().collect();
            let parsed = match fields.as_slice() {
                ["cnf", num_variables, num_clauses] => num_variables
                    .parse::<usize>()
                    .ok()
                    .zip(num_clauses.parse::<usize>().ok()),
                _ => None,
            };
            let Some((num_variables, num_clauses)) = parsed else {
                return Err(DimacsParseError::InvalidHeader(line.to_owned()));
            };

            variables = (0..num_variables).map(|_| solver.new_variable()).collect();
            header = Some((num_variables, num_clauses));
            continue;
        }

        let Some((num_variables, _)) = header else {
            return Err(DimacsParseError::MissingHeader);
        };

        for token in line.split_whitespace() {
            let code: i64 = token
                .parse()
                .map_err(|_| DimacsParseError::InvalidLiteral(token.to_owned()))?;

            if code == 0 {
                // Infeasibility latches the solver state; parsing continues to validate the
                // remainder of the format.
                let _ = solver.add_permanent_clause(std::mem::take(&mut clause));
                num_parsed_clauses += 1;
            } else {
                let index = code.unsigned_abs() as usize;
                if index > num_variables {
                    return Err(DimacsParseError::InvalidLiteral(token.to_owned()));
                }
                clause.push(Literal::new(variables[index - 1], code > 0));
            }
        }
    }

    let Some((_, num_clauses)) = header else {
        return Err(DimacsParseError::MissingHeader);
    };
    if !clause.is_empty() {
        return Err(DimacsParseError::UnterminatedClause);
    }
    if num_parsed_clauses != num_clauses {
        return Err(DimacsParseError::IncorrectClauseCount {
            expected: num_clauses,
            parsed: num_parsed_clauses,
        });
    }

    Ok(variables)
}

/// Serialises the model of a satisfiable solve as DIMACS literals (positive or negative
/// 1-based indices) for the given variables; unassigned variables are skipped.
pub fn model_as_dimacs_literals(
    solver: &SatSolver,
    variables: &[PropositionalVariable],
) -> Vec<i64> {
    variables
        .iter()
        .enumerate()
        .filter_map(|(position, &variable)| {
            let dimacs_index = (position + 1) as i64;
            solver
                .model_literal_value(Literal::new(variable, true))
                .map(|value| if value { dimacs_index } else { -dimacs_index })
        })
        .collect()
}

/// The DIMACS index of a literal over the parsed variables, for round-trip checks.
pub fn literal_to_dimacs(literal: Literal, variables: &[PropositionalVariable]) -> Option<i64> {
    let position = variables
        .iter()
        .position(|variable| variable.index() == literal.variable().index())?;
    let dimacs_index = (position + 1) as i64;
    Some(if literal.is_positive() {
        dimacs_index
    } else {
        -dimacs_index
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_header_are_parsed() {
        let source = "c a comment\np cnf 2 2\n1 2 0\n-1 2 0\n";
        let mut solver = SatSolver::default();

        let variables = parse_cnf(source.as_bytes(), &mut solver).unwrap();
        assert_eq!(variables.len(), 2);
    }

    #[test]
    fn clause_count_mismatch_is_an_error() {
        let source = "p cnf 2 3\n1 2 0\n-1 2 0\n";
        let mut solver = SatSolver::default();

        let result = parse_cnf(source.as_bytes(), &mut solver);
        assert!(matches!(
            result,
            Err(DimacsParseError::IncorrectClauseCount {
                expected: 3,
                parsed: 2
            })
        ));
    }

    #[test]
    fn unterminated_clause_is_an_error() {
        let source = "p cnf 2 1\n1 2\n";
        let mut solver = SatSolver::default();

        let result = parse_cnf(source.as_bytes(), &mut solver);
        assert!(matches!(result, Err(DimacsParseError::UnterminatedClause)));
    }

    #[test]
    fn literals_beyond_the_declared_variables_are_rejected() {
        let source = "p cnf 1 1\n2 0\n";
        let mut solver = SatSolver::default();

        let result = parse_cnf(source.as_bytes(), &mut solver);
        assert!(matches!(result, Err(DimacsParseError::InvalidLiteral(_))));
    }

    #[test]
    fn missing_header_is_an_error() {
        let source = "1 2 0\n";
        let mut solver = SatSolver::default();

        let result = parse_cnf(source.as_bytes(), &mut solver);
        assert!(matches!(result, Err(DimacsParseError::MissingHeader)));
    }
}
