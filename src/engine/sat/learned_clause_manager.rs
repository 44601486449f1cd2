use log::debug;

use super::Assignments;
use super::ClausalPropagator;
use super::ClauseAllocator;
use super::Reason;
use crate::acorn_assert_moderate;
use crate::basic_types::ClauseReference;
use crate::basic_types::Literal;

/// Options controlling the learnt clause database and its reduction policy.
#[derive(Debug, Clone, Copy)]
pub struct LearnedClauseOptions {
    pub max_clause_activity: f32,
    pub clause_activity_decay_factor: f32,
    /// The initial limit on the number of learnt clauses, as a fraction of the number of
    /// permanent clauses.
    pub limit_factor: f64,
    /// Multiplier applied to the limit every time the adjustment counter runs out.
    pub limit_increment: f64,
    pub limit_adjustment_start: f64,
    pub limit_adjustment_increment: f64,
}

impl Default for LearnedClauseOptions {
    fn default() -> Self {
        LearnedClauseOptions {
            max_clause_activity: 1e20,
            clause_activity_decay_factor: 0.999,
            limit_factor: 1.0 / 3.0,
            limit_increment: 1.1,
            limit_adjustment_start: 100.0,
            limit_adjustment_increment: 1.5,
        }
    }
}

/// Owns the references to the learnt clauses and decides when and which of them to throw
/// away. Clause activities mirror variable activities: bumped on conflict participation,
/// decayed geometrically, rescaled before overflow.
#[derive(Debug)]
pub struct LearnedClauseManager {
    learnt_clauses: Vec<ClauseReference>,
    clause_bump_increment: f32,
    max_learnt_clauses: f64,
    limit_adjustment_conflicts: f64,
    limit_adjustment_counter: i64,
    options: LearnedClauseOptions,
}

impl LearnedClauseManager {
    pub fn new(options: LearnedClauseOptions) -> Self {
        LearnedClauseManager {
            learnt_clauses: vec![],
            clause_bump_increment: 1.0,
            max_learnt_clauses: 0.0,
            limit_adjustment_conflicts: options.limit_adjustment_start,
            limit_adjustment_counter: options.limit_adjustment_start as i64,
            options,
        }
    }

    /// Sets the initial learnt clause limit from the size of the permanent database; called
    /// at the start of every `solve`.
    pub fn initialise(&mut self, num_permanent_clauses: usize) {
        self.max_learnt_clauses = num_permanent_clauses as f64 * self.options.limit_factor;
        self.limit_adjustment_conflicts = self.options.limit_adjustment_start;
        self.limit_adjustment_counter = self.limit_adjustment_conflicts as i64;
    }

    pub fn num_learnt_clauses(&self) -> usize {
        self.learnt_clauses.len()
    }

    /// Stores an asserting learnt clause, attaches it and enqueues its first literal with the
    /// clause as reason. The caller guarantees the asserting literal at position 0 and a
    /// literal of the backjump level at position 1.
    pub fn add_learned_clause(
        &mut self,
        learned_clause_literals: Vec<Literal>,
        clausal_propagator: &mut ClausalPropagator,
        assignments: &mut Assignments,
        clause_allocator: &mut ClauseAllocator,
    ) -> ClauseReference {
        acorn_assert_moderate!(learned_clause_literals.len() >= 2);

        let asserting_literal = learned_clause_literals[0];
        let reference =
            clausal_propagator.add_clause_unchecked(learned_clause_literals, true, clause_allocator);
        self.learnt_clauses.push(reference);
        self.bump_clause_activity(reference, clause_allocator);
        assignments.enqueue_propagated_literal(asserting_literal, Reason::Clause(reference));
        reference
    }

    /// Registers an externally constructed learnt clause (dynamic clause injection) so the
    /// reduction policy can see it.
    pub fn track_learned_clause(&mut self, reference: ClauseReference) {
        self.learnt_clauses.push(reference);
    }

    /// Adjusts the limit bookkeeping after a conflict and decays clause activities.
    pub fn on_conflict(&mut self) {
        self.decay_clause_activities();

        self.limit_adjustment_counter -= 1;
        if self.limit_adjustment_counter <= 0 {
            self.limit_adjustment_conflicts *= self.options.limit_adjustment_increment;
            self.limit_adjustment_counter = self.limit_adjustment_conflicts as i64;
            self.max_learnt_clauses *= self.options.limit_increment;
        }
    }

    pub fn should_reduce(&self, num_assigned_variables: usize) -> bool {
        !self.learnt_clauses.is_empty()
            && self.learnt_clauses.len() as f64 - num_assigned_variables as f64
                >= self.max_learnt_clauses
    }

    /// Halves the learnt clause database: clauses are ordered by activity and the less active
    /// half is deleted, together with any clause whose activity is below the threshold
    /// proportional to the current bump increment. Binary clauses and clauses that are the
    /// reason for a trail literal are kept.
    pub fn reduce(
        &mut self,
        clausal_propagator: &mut ClausalPropagator,
        assignments: &Assignments,
        clause_allocator: &mut ClauseAllocator,
    ) {
        let activity_threshold = self.clause_bump_increment / self.learnt_clauses.len() as f32;

        self.learnt_clauses.sort_unstable_by(|a, b| {
            clause_allocator[*a]
                .activity()
                .partial_cmp(&clause_allocator[*b].activity())
                .unwrap()
        });

        let num_before = self.learnt_clauses.len();
        let half = num_before / 2;

        let mut kept = 0;
        for i in 0..self.learnt_clauses.len() {
            let reference = self.learnt_clauses[i];
            let is_removable = clause_allocator[reference].len() > 2
                && !Self::is_clause_locked(reference, assignments, clause_allocator)
                && (i < half
                    || clause_allocator[reference].activity() < activity_threshold);

            if is_removable {
                clausal_propagator.detach_clause(reference, clause_allocator);
                clause_allocator.delete_clause(reference);
            } else {
                self.learnt_clauses[kept] = reference;
                kept += 1;
            }
        }
        self.learnt_clauses.truncate(kept);

        debug!(
            "Learnt clause reduction: {} -> {} clauses",
            num_before,
            self.learnt_clauses.len()
        );
    }

    /// A clause is locked while it is the reason of its first literal's assignment; deleting
    /// it would leave a dangling reason on the trail.
    fn is_clause_locked(
        reference: ClauseReference,
        assignments: &Assignments,
        clause_allocator: &ClauseAllocator,
    ) -> bool {
        let first = clause_allocator[reference].literals()[0];
        assignments.is_literal_assigned_true(first)
            && assignments.get_variable_reason(first.variable()) == Reason::Clause(reference)
    }

    pub fn bump_clause_activity(
        &mut self,
        reference: ClauseReference,
        clause_allocator: &mut ClauseAllocator,
    ) {
        if clause_allocator[reference].activity() + self.clause_bump_increment
            > self.options.max_clause_activity
        {
            self.rescale_clause_activities(clause_allocator);
        }
        clause_allocator[reference].increase_activity(self.clause_bump_increment);
    }

    fn rescale_clause_activities(&mut self, clause_allocator: &mut ClauseAllocator) {
        for &reference in &self.learnt_clauses {
            clause_allocator[reference].divide_activity(self.options.max_clause_activity);
        }
        self.clause_bump_increment /= self.options.max_clause_activity;
    }

    pub fn decay_clause_activities(&mut self) {
        self.clause_bump_increment /= self.options.clause_activity_decay_factor;
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
    fn reduction_keeps_binary_and_locked_clauses() {
        let mut manager = LearnedClauseManager::new(LearnedClauseOptions::default());
        let mut propagator = ClausalPropagator::default();
        let mut assignments = Assignments::default();
        let mut allocator = ClauseAllocator::default();

        for _ in 0..6 {
            let _ = assignments.grow();
            propagator.grow();
        }

        let binary =
            propagator.add_clause_unchecked(vec![literal(0), literal(1)], true, &mut allocator);
        manager.track_learned_clause(binary);

        let locked = propagator.add_clause_unchecked(
            vec![literal(2), literal(3), literal(4)],
            true,
            &mut allocator,
        );
        manager.track_learned_clause(locked);
        assignments.increase_decision_level();
        assignments.enqueue_propagated_literal(literal(2), Reason::Clause(locked));

        let disposable = propagator.add_clause_unchecked(
            vec![literal(3), literal(4), literal(5)],
            true,
            &mut allocator,
        );
        manager.track_learned_clause(disposable);
        let other_disposable = propagator.add_clause_unchecked(
            vec![!literal(3), literal(4), literal(5)],
            true,
            &mut allocator,
        );
        manager.track_learned_clause(other_disposable);

        manager.reduce(&mut propagator, &assignments, &mut allocator);

        assert!(!allocator[binary].is_deleted());
        assert!(!allocator[locked].is_deleted());
        assert!(allocator[disposable].is_deleted());
        assert!(allocator[other_disposable].is_deleted());
        assert_eq!(manager.num_learnt_clauses(), 2);
    }

    #[test]
    fn clause_activity_rescale_preserves_the_order() {
        let mut options = LearnedClauseOptions::default();
        options.max_clause_activity = 10.0;
        let mut manager = LearnedClauseManager::new(options);
        let mut allocator = ClauseAllocator::default();

        let hot = allocator.create_clause(vec![literal(0), literal(1)], true);
        manager.track_learned_clause(hot);
        let cold = allocator.create_clause(vec![literal(2), literal(3)], true);
        manager.track_learned_clause(cold);

        manager.bump_clause_activity(cold, &mut allocator);
        // Push the hot clause over the rescale threshold.
        for _ in 0..12 {
            manager.bump_clause_activity(hot, &mut allocator);
        }

        assert!(allocator[hot].activity() > allocator[cold].activity());
        assert!(allocator[hot].activity() <= 10.0);
    }
}
