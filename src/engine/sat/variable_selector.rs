use rand::rngs::SmallRng;
use rand::Rng;

use super::Assignments;
use crate::acorn_assert_moderate;
use crate::basic_types::PropositionalVariable;
use crate::containers::KeyValueHeap;
use crate::containers::KeyedVec;

const MAX_ACTIVITY_THRESHOLD: f64 = 1e100;

/// Activity-ordered variable selection in the style of VSIDS: variables that appear in
/// conflicts get their activity bumped, and decisions pick the unassigned decision variable
/// with the maximum activity. Bumps grow geometrically instead of decaying every activity,
/// with a global rescale once values threaten to overflow.
#[derive(Debug)]
pub struct VariableSelector {
    heap: KeyValueHeap<PropositionalVariable, f64>,
    is_decision_variable: KeyedVec<PropositionalVariable, bool>,
    increment: f64,
    decay_factor: f64,
    num_random_decisions: u64,
}

impl VariableSelector {
    pub fn new(decay_factor: f64) -> VariableSelector {
        VariableSelector {
            heap: KeyValueHeap::default(),
            is_decision_variable: KeyedVec::default(),
            increment: 1.0,
            decay_factor,
            num_random_decisions: 0,
        }
    }

    pub fn grow(&mut self, variable: PropositionalVariable, initial_activity: f64) {
        self.heap.grow(variable, initial_activity);
        let _ = self.is_decision_variable.push(true);
    }

    pub fn num_random_decisions(&self) -> u64 {
        self.num_random_decisions
    }

    /// Excludes or re-includes a variable from branching. Constant and bookkeeping variables
    /// are not decision variables.
    pub fn set_decision_variable(&mut self, variable: PropositionalVariable, is_decision: bool) {
        self.is_decision_variable[variable] = is_decision;
        if is_decision {
            self.heap.restore_key(variable);
        } else {
            self.heap.delete_key(variable);
        }
    }

    pub fn is_decision_variable(&self, variable: PropositionalVariable) -> bool {
        self.is_decision_variable[variable]
    }

    /// Picks the next branching variable: with probability `random_variable_frequency` a
    /// uniformly random eligible variable, otherwise the unassigned decision variable with
    /// maximum activity. Returns `None` when every decision variable is assigned.
    pub fn select_variable(
        &mut self,
        assignments: &Assignments,
        random: &mut SmallRng,
        random_variable_frequency: f64,
    ) -> Option<PropositionalVariable> {
        if random_variable_frequency > 0.0
            && !self.heap.is_empty()
            && random.gen_bool(random_variable_frequency)
        {
            let candidate = self.heap.key_at_position(random.gen_range(0..self.heap.num_present()));
            if assignments.is_variable_unassigned(candidate)
                && self.is_decision_variable[candidate]
            {
                self.num_random_decisions += 1;
                return Some(candidate);
            }
        }

        // Activity-based selection; assigned variables found at the top are removed and put
        // back by `on_unassign` during backtracking.
        loop {
            let candidate = self.heap.peek_max()?;
            if assignments.is_variable_unassigned(candidate)
                && self.is_decision_variable[candidate]
            {
                return Some(candidate);
            }
            let _ = self.heap.pop_max();
        }
    }

    /// Restores an unassigned variable as a branching candidate.
    pub fn on_unassign(&mut self, variable: PropositionalVariable) {
        if self.is_decision_variable[variable] {
            self.heap.restore_key(variable);
        }
    }

    /// Bumps the activity of a variable that appeared during conflict analysis.
    pub fn bump_activity(&mut self, variable: PropositionalVariable) {
        let activity = self.heap.get_value(variable);
        if activity + self.increment >= MAX_ACTIVITY_THRESHOLD {
            // Dividing all values by the same constant keeps their relative order.
            self.heap.divide_values(MAX_ACTIVITY_THRESHOLD);
            self.increment /= MAX_ACTIVITY_THRESHOLD;
        }
        self.heap.increment(variable, self.increment);
    }

    pub fn activity(&self, variable: PropositionalVariable) -> f64 {
        self.heap.get_value(variable)
    }

    /// Growing the increment is equivalent to decaying every activity, without the linear
    /// sweep.
    pub fn decay_activities(&mut self) {
        acorn_assert_moderate!(self.decay_factor > 0.0 && self.decay_factor <= 1.0);
        self.increment *= 1.0 / self.decay_factor;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn selector_with_variables(
        assignments: &mut Assignments,
        num_variables: u32,
    ) -> VariableSelector {
        let mut selector = VariableSelector::new(0.95);
        for _ in 0..num_variables {
            let variable = assignments.grow();
            selector.grow(variable, 0.0);
        }
        selector
    }

    #[test]
    fn bumped_variable_is_selected_first() {
        let mut assignments = Assignments::default();
        let mut selector = selector_with_variables(&mut assignments, 3);
        let mut random = SmallRng::seed_from_u64(7);

        selector.bump_activity(PropositionalVariable::new(1));

        let chosen = selector.select_variable(&assignments, &mut random, 0.0);
        assert_eq!(chosen, Some(PropositionalVariable::new(1)));
    }

    #[test]
    fn assigned_variables_are_skipped_and_restored() {
        let mut assignments = Assignments::default();
        let mut selector = selector_with_variables(&mut assignments, 2);
        let mut random = SmallRng::seed_from_u64(7);

        selector.bump_activity(PropositionalVariable::new(0));
        assignments.enqueue_decision_literal(crate::basic_types::Literal::new(
            PropositionalVariable::new(0),
            true,
        ));

        let chosen = selector.select_variable(&assignments, &mut random, 0.0);
        assert_eq!(chosen, Some(PropositionalVariable::new(1)));

        selector.on_unassign(PropositionalVariable::new(0));
        // After restoration the bumped variable is on top again; pretend it was unassigned.
        let mut fresh = Assignments::default();
        let _ = fresh.grow();
        let _ = fresh.grow();
        let chosen = selector.select_variable(&fresh, &mut random, 0.0);
        assert_eq!(chosen, Some(PropositionalVariable::new(0)));
    }

    #[test]
    fn non_decision_variables_are_never_selected() {
        let mut assignments = Assignments::default();
        let mut selector = selector_with_variables(&mut assignments, 2);
        let mut random = SmallRng::seed_from_u64(7);

        selector.bump_activity(PropositionalVariable::new(0));
        selector.set_decision_variable(PropositionalVariable::new(0), false);

        let chosen = selector.select_variable(&assignments, &mut random, 0.0);
        assert_eq!(chosen, Some(PropositionalVariable::new(1)));
    }

    #[test]
    fn rescaling_preserves_the_activity_order() {
        let mut assignments = Assignments::default();
        let mut selector = selector_with_variables(&mut assignments, 3);

        selector.bump_activity(PropositionalVariable::new(2));
        selector.bump_activity(PropositionalVariable::new(2));
        selector.bump_activity(PropositionalVariable::new(1));

        // Force many decays so the increment crosses the rescale threshold.
        for _ in 0..10000 {
            selector.decay_activities();
        }
        selector.bump_activity(PropositionalVariable::new(0));

        assert!(
            selector.activity(PropositionalVariable::new(2))
                > selector.activity(PropositionalVariable::new(1))
        );
        assert!(
            selector.activity(PropositionalVariable::new(0))
                > selector.activity(PropositionalVariable::new(2))
        );
    }
}
