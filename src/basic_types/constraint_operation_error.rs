use thiserror::Error;

/// Errors raised while adding constraints to the engine.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConstraintOperationError {
    #[error("adding the clause failed because it is infeasible at the root")]
    InfeasibleClause,
    #[error("the operation failed because the solver is already in an infeasible state")]
    InfeasibleState,
}
