use super::ClauseAllocator;
use crate::basic_types::ClauseReference;
use crate::basic_types::Literal;

/// Why a literal was placed on the trail.
///
/// The one- and two-literal variants cover propagations whose justification is a single
/// implication rather than a stored clause, which avoids allocating throwaway clauses for the
/// common case (channelled domain deductions, dynamically learnt binary implications). A
/// reason never outlives the assignment it explains: it is dropped when the variable is
/// unassigned, and the database reduction refuses to delete a clause that still serves as a
/// reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Reason {
    /// A decision or an unassigned variable; there is nothing to resolve on.
    #[default]
    Decision,
    /// The propagated literal is implied by the falsity of one other literal.
    Unit(Literal),
    /// The propagated literal is implied by the falsity of two other literals.
    Binary(Literal, Literal),
    /// The propagated literal sits at position 0 of the referenced clause.
    Clause(ClauseReference),
}

impl Reason {
    pub fn is_decision(self) -> bool {
        self == Reason::Decision
    }

    /// Appends the antecedent literals to `out`: the literals which are all false and thereby
    /// forced the propagation. For clause reasons these are the literals at positions `1..`.
    pub(crate) fn push_antecedents(self, clause_allocator: &ClauseAllocator, out: &mut Vec<Literal>) {
        match self {
            Reason::Decision => {}
            Reason::Unit(literal) => out.push(literal),
            Reason::Binary(first, second) => {
                out.push(first);
                out.push(second);
            }
            Reason::Clause(reference) => {
                out.extend_from_slice(&clause_allocator[reference].literals()[1..]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::PropositionalVariable;

    fn literal(index: u32) -> Literal {
        Literal::new(PropositionalVariable::new(index), true)
    }

    #[test]
    fn antecedents_of_a_clause_reason_skip_the_propagated_literal() {
        let mut allocator = ClauseAllocator::default();
        let reference =
            allocator.create_clause(vec![literal(0), literal(1), literal(2)], false);

        let mut antecedents = Vec::new();
        Reason::Clause(reference).push_antecedents(&allocator, &mut antecedents);

        assert_eq!(antecedents, vec![literal(1), literal(2)]);
    }

    #[test]
    fn compact_reasons_list_their_literals() {
        let allocator = ClauseAllocator::default();

        let mut antecedents = Vec::new();
        Reason::Unit(literal(3)).push_antecedents(&allocator, &mut antecedents);
        Reason::Binary(literal(4), literal(5)).push_antecedents(&allocator, &mut antecedents);
        Reason::Decision.push_antecedents(&allocator, &mut antecedents);

        assert_eq!(antecedents, vec![literal(3), literal(4), literal(5)]);
    }
}
