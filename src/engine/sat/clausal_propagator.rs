use super::Assignments;
use super::ClauseAllocator;
use super::Reason;
use super::WatchList;
use super::Watcher;
use crate::acorn_assert_moderate;
use crate::acorn_assert_simple;
use crate::basic_types::ClauseReference;
use crate::basic_types::Literal;

/// Unit propagation over the clause database with two watched literals per clause.
///
/// The propagator drains the trail from its last synchronised position: for every newly true
/// literal it revisits the clauses watching that literal's negation, moves watches away from
/// falsified literals where possible, and otherwise either enqueues the remaining literal or
/// reports the clause as conflicting.
#[derive(Default, Debug)]
pub struct ClausalPropagator {
    watch_list: WatchList,
    next_position_on_trail_to_propagate: usize,
    num_propagations: u64,
}

impl ClausalPropagator {
    /// Makes room for the watch lists of a newly created variable.
    pub fn grow(&mut self) {
        self.watch_list.grow();
    }

    /// The number of trail literals processed so far, used for the propagation budget.
    pub fn num_propagations(&self) -> u64 {
        self.num_propagations
    }

    pub fn is_propagation_complete(&self, trail_size: usize) -> bool {
        self.next_position_on_trail_to_propagate == trail_size
    }

    /// Resets the propagation position after the trail has been truncated by backtracking.
    pub fn synchronise(&mut self, trail_size: usize) {
        acorn_assert_simple!(self.next_position_on_trail_to_propagate >= trail_size);
        self.next_position_on_trail_to_propagate = trail_size;
    }

    /// Allocates a clause, attaches its watchers and returns the reference. The first two
    /// literals become the watched literals, so the caller is responsible for putting
    /// non-false literals there.
    pub fn add_clause_unchecked(
        &mut self,
        literals: Vec<Literal>,
        is_learnt: bool,
        clause_allocator: &mut ClauseAllocator,
    ) -> ClauseReference {
        acorn_assert_moderate!(literals.len() >= 2);

        let reference = clause_allocator.create_clause(literals, is_learnt);
        self.watch_list
            .attach_clause(reference, clause_allocator[reference].literals());
        reference
    }

    /// Removes the clause from the watcher index; the clause itself is deleted by the caller
    /// through the allocator.
    pub fn detach_clause(
        &mut self,
        reference: ClauseReference,
        clause_allocator: &ClauseAllocator,
    ) {
        self.watch_list
            .detach_clause(reference, clause_allocator[reference].literals());
    }

    /// Performs unit propagation until fixpoint or until a clause is found with every literal
    /// false; the conflicting clause is returned in the error case. On a conflict the
    /// remaining unexamined watchers are preserved and the propagation position is advanced
    /// past the trail, so the state stays consistent for conflict analysis.
    pub fn propagate(
        &mut self,
        assignments: &mut Assignments,
        clause_allocator: &mut ClauseAllocator,
    ) -> Result<(), ClauseReference> {
        while self.next_position_on_trail_to_propagate < assignments.num_trail_entries() {
            let true_literal =
                assignments.get_trail_entry(self.next_position_on_trail_to_propagate);
            let false_literal = !true_literal;
            acorn_assert_simple!(assignments.is_literal_assigned_true(true_literal));

            self.num_propagations += 1;

            let mut end_index: usize = 0;
            let mut current_index: usize = 0;
            while current_index < self.watch_list[true_literal].len() {
                // The cheap path: if the cached blocker is already true the clause is
                // satisfied and the watcher stays as is.
                let watcher = self.watch_list[true_literal][current_index];
                if assignments.is_literal_assigned_true(watcher.blocker) {
                    self.watch_list[true_literal][end_index] = watcher;
                    end_index += 1;
                    current_index += 1;
                    continue;
                }

                let reference = watcher.clause;
                let clause = clause_allocator.get_mutable_clause(reference);

                // Make sure the falsified literal is at position 1.
                if clause[0] == false_literal {
                    clause[0] = clause[1];
                    clause[1] = false_literal;
                }
                acorn_assert_moderate!(clause[1] == false_literal);
                current_index += 1;

                let first = clause[0];
                let renewed_watcher = Watcher {
                    clause: reference,
                    blocker: first,
                };

                // If the other watched literal is true the clause is satisfied.
                if first != watcher.blocker && assignments.is_literal_assigned_true(first) {
                    self.watch_list[true_literal][end_index] = renewed_watcher;
                    end_index += 1;
                    continue;
                }

                // Look for a non-false literal to take over the watch.
                let mut found_new_watch = false;
                for k in 2..clause.len() {
                    if !assignments.is_literal_assigned_false(clause[k]) {
                        clause[1] = clause[k];
                        clause[k] = false_literal;
                        self.watch_list[!clause[1]].push(renewed_watcher);
                        found_new_watch = true;
                        break;
                    }
                }

                if found_new_watch {
                    // The watcher has moved to the new literal's list; nothing is copied back.
                    continue;
                }

                // No replacement watch: the clause is unit under the current assignment.
                self.watch_list[true_literal][end_index] = renewed_watcher;
                end_index += 1;

                if assignments.is_literal_unassigned(first) {
                    assignments.enqueue_propagated_literal(first, Reason::Clause(reference));
                } else {
                    acorn_assert_moderate!(assignments.is_literal_assigned_false(first));
                    // Conflict: keep the remaining watchers, fast-forward past the trail and
                    // report the falsified clause.
                    while current_index < self.watch_list[true_literal].len() {
                        self.watch_list[true_literal][end_index] =
                            self.watch_list[true_literal][current_index];
                        end_index += 1;
                        current_index += 1;
                    }
                    self.watch_list[true_literal].truncate(end_index);
                    self.next_position_on_trail_to_propagate = assignments.num_trail_entries();
                    return Err(reference);
                }
            }
            self.watch_list[true_literal].truncate(end_index);
            self.next_position_on_trail_to_propagate += 1;
        }
        Ok(())
    }

    /// Verifies the post-propagation invariant: no attached clause has every literal false,
    /// and every clause that is unit under the assignment has its remaining literal true.
    pub fn debug_check_propagation_soundness(
        &self,
        assignments: &Assignments,
        clause_allocator: &ClauseAllocator,
    ) -> bool {
        let mut references: Vec<ClauseReference> = vec![];
        for code in 0..self.watch_list.num_literals() {
            let literal = Literal::from_code(code as u32);
            for watcher in self.watch_list.watchers(literal) {
                references.push(watcher.clause);
            }
        }
        references.sort_unstable_by_key(|reference| clause_allocator[*reference].id());
        references.dedup();

        references.iter().all(|&reference| {
            let clause = clause_allocator[reference].literals();
            let num_false = clause
                .iter()
                .filter(|&&literal| assignments.is_literal_assigned_false(literal))
                .count();

            if num_false == clause.len() {
                return false;
            }
            if num_false + 1 == clause.len() {
                let remaining = clause
                    .iter()
                    .find(|&&literal| !assignments.is_literal_assigned_false(literal))
                    .unwrap();
                return assignments.is_literal_assigned_true(*remaining);
            }
            true
        })
    }
}
