mod clause_reference;
mod constraint_operation_error;
mod hash_structures;
mod literal;
mod propositional_variable;
pub mod sequence_generators;
mod trail;

pub use clause_reference::ClauseReference;
pub use constraint_operation_error::ConstraintOperationError;
pub use hash_structures::HashMap;
pub use hash_structures::HashSet;
pub use literal::Literal;
pub use propositional_variable::PropositionalVariable;
pub use propositional_variable::PropositionalVariableGeneratorIterator;
pub use trail::Trail;
