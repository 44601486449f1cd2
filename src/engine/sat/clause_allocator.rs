use super::Clause;
use crate::acorn_assert_advanced;
use crate::acorn_assert_moderate;
use crate::basic_types::ClauseReference;
use crate::basic_types::Literal;
use crate::containers::StorageKey;

/// The owned arena holding every clause of one engine.
///
/// Watcher lists and reasons refer to clauses through [`ClauseReference`] indices into this
/// arena. Deleting a clause marks the slot free; the slot is only handed out again by a later
/// allocation, so references held across a single propagation/analysis round never dangle.
/// The id counter is engine-local state, so independent engines number their clauses
/// independently.
#[derive(Default, Debug)]
pub struct ClauseAllocator {
    allocated_clauses: Vec<Clause>,
    free_slots: Vec<ClauseReference>,
    next_clause_id: u32,
}

impl ClauseAllocator {
    pub fn create_clause(&mut self, literals: Vec<Literal>, is_learnt: bool) -> ClauseReference {
        let id = self.next_clause_id;
        self.next_clause_id += 1;

        if let Some(reference) = self.free_slots.pop() {
            self.allocated_clauses[reference.index()] = Clause::new(literals, is_learnt, id);
            reference
        } else {
            let reference = ClauseReference::create_from_index(self.allocated_clauses.len());
            self.allocated_clauses.push(Clause::new(literals, is_learnt, id));
            reference
        }
    }

    pub fn get_clause(&self, reference: ClauseReference) -> &Clause {
        &self.allocated_clauses[reference.index()]
    }

    pub fn get_mutable_clause(&mut self, reference: ClauseReference) -> &mut Clause {
        &mut self.allocated_clauses[reference.index()]
    }

    pub fn delete_clause(&mut self, reference: ClauseReference) {
        acorn_assert_moderate!(
            !self.get_clause(reference).is_deleted(),
            "cannot delete an already deleted clause"
        );
        acorn_assert_advanced!(!self.free_slots.contains(&reference));

        self.get_mutable_clause(reference).mark_deleted();
        self.free_slots.push(reference);
    }

    pub fn num_allocated_clauses(&self) -> usize {
        self.allocated_clauses.len() - self.free_slots.len()
    }
}

impl std::ops::Index<ClauseReference> for ClauseAllocator {
    type Output = Clause;
    fn index(&self, reference: ClauseReference) -> &Clause {
        self.get_clause(reference)
    }
}

impl std::ops::IndexMut<ClauseReference> for ClauseAllocator {
    fn index_mut(&mut self, reference: ClauseReference) -> &mut Clause {
        self.get_mutable_clause(reference)
    }
}

impl std::fmt::Display for ClauseAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clauses_string = self
            .allocated_clauses
            .iter()
            .filter(|clause| !clause.is_deleted())
            .fold(String::new(), |acc, clause| format!("{acc}{clause}\n"));

        write!(
            f,
            "Num clauses: {}\n{clauses_string}",
            self.num_allocated_clauses()
        )
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
    fn clause_ids_are_not_recycled_with_slots() {
        let mut allocator = ClauseAllocator::default();

        let first = allocator.create_clause(vec![literal(0), literal(1)], false);
        let second = allocator.create_clause(vec![literal(2), literal(3)], false);
        assert_eq!(allocator[first].id(), 0);
        assert_eq!(allocator[second].id(), 1);

        allocator.delete_clause(first);
        let third = allocator.create_clause(vec![literal(4), literal(5)], true);

        // The slot is reused but the id keeps counting.
        assert_eq!(third, first);
        assert_eq!(allocator[third].id(), 2);
        assert_eq!(allocator.num_allocated_clauses(), 2);
    }
}
