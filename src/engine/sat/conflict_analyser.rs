use super::Assignments;
use super::ClauseAllocator;
use super::LearnedClauseManager;
use super::Reason;
use super::VariableSelector;
use crate::acorn_assert_moderate;
use crate::acorn_assert_simple;
use crate::basic_types::ClauseReference;
use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::containers::KeyedVec;
use crate::engine::channelling::ChannelInfo;

/// Controls the post-analysis shrinking of learnt clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinimisationMode {
    /// Keep the first-UIP clause as derived.
    Disabled,
    /// Self-subsuming resolution: drop a literal whose own reason is covered by the remaining
    /// literals.
    #[default]
    Basic,
}

/// The product of conflict analysis: an asserting clause and the level to jump back to.
///
/// The asserting literal is at position 0; position 1 holds a literal of the backjump level so
/// that attaching the clause watches the right literals.
#[derive(Debug, Default, Clone)]
pub struct ConflictAnalysisResult {
    pub learned_literals: Vec<Literal>,
    pub backjump_level: usize,
}

/// Derives first-UIP learnt clauses from conflicts by walking the implication graph backwards
/// over the trail.
///
/// The `seen` marks and the scratch buffers are owned here and fully cleared before `analyse`
/// returns, so successive conflicts never observe stale state.
#[derive(Default, Debug)]
pub struct ConflictAnalyser {
    seen: KeyedVec<PropositionalVariable, bool>,
    to_clear: Vec<PropositionalVariable>,
    antecedent_buffer: Vec<Literal>,
    analysis_result: ConflictAnalysisResult,
    num_literals_removed_by_minimisation: u64,
}

impl ConflictAnalyser {
    /// Computes the first-UIP learnt clause for the given conflicting clause.
    ///
    /// The backward walk resolves trail literals of the current decision level until a single
    /// one remains on the pending path *and* that literal is backed by a reliable channel;
    /// unreliable pivots are resolved further through their own reasons. Any unreliable
    /// literal that made it into the learnt clause is afterwards replaced by its reason, and
    /// finally the clause is minimised by self-subsuming resolution.
    #[allow(clippy::too_many_arguments)] // mirrors the engine components the analysis touches
    pub fn analyse(
        &mut self,
        conflicting_clause: ClauseReference,
        minimisation_mode: MinimisationMode,
        assignments: &Assignments,
        clause_allocator: &mut ClauseAllocator,
        learned_clause_manager: &mut LearnedClauseManager,
        variable_selector: &mut VariableSelector,
        channels: &KeyedVec<PropositionalVariable, Option<ChannelInfo>>,
    ) -> &ConflictAnalysisResult {
        acorn_assert_simple!(
            assignments.get_decision_level() > 0,
            "conflicts at the root level cannot be analysed"
        );
        acorn_assert_moderate!(self.to_clear.is_empty());

        self.seen.resize(assignments.num_variables() as usize, false);

        let current_level = assignments.get_decision_level();

        // Position 0 is reserved for the asserting literal.
        self.analysis_result.learned_literals.clear();
        self.analysis_result
            .learned_literals
            .push(Literal::default());
        self.analysis_result.backjump_level = 0;

        let mut path_count: usize = 0;
        let mut pivot: Option<Literal> = None;
        let mut trail_index = assignments.num_trail_entries() - 1;

        loop {
            self.antecedent_buffer.clear();
            match pivot {
                None => {
                    // The conflicting clause itself; every literal takes part in resolution.
                    if clause_allocator[conflicting_clause].is_learnt() {
                        learned_clause_manager
                            .bump_clause_activity(conflicting_clause, clause_allocator);
                    }
                    self.antecedent_buffer
                        .extend_from_slice(clause_allocator[conflicting_clause].literals());
                }
                Some(pivot_literal) => {
                    let reason = assignments.get_variable_reason(pivot_literal.variable());
                    if let Reason::Clause(reference) = reason {
                        if clause_allocator[reference].is_learnt() {
                            learned_clause_manager
                                .bump_clause_activity(reference, clause_allocator);
                        }
                    }
                    reason.push_antecedents(clause_allocator, &mut self.antecedent_buffer);
                }
            }

            for i in 0..self.antecedent_buffer.len() {
                let antecedent = self.antecedent_buffer[i];
                let variable = antecedent.variable();

                if !self.seen[variable]
                    && assignments.get_variable_assignment_level(variable) > 0
                {
                    self.seen[variable] = true;
                    self.to_clear.push(variable);
                    variable_selector.bump_activity(variable);

                    if assignments.get_variable_assignment_level(variable) >= current_level {
                        path_count += 1;
                    } else {
                        self.analysis_result.learned_literals.push(antecedent);
                    }
                }
            }

            // Walk back to the most recent trail literal taking part in the conflict.
            while !self.seen[assignments.get_trail_entry(trail_index).variable()] {
                acorn_assert_moderate!(trail_index > 0);
                trail_index -= 1;
            }
            let pivot_literal = assignments.get_trail_entry(trail_index);
            pivot = Some(pivot_literal);
            self.seen[pivot_literal.variable()] = false;
            path_count -= 1;

            if path_count == 0 {
                // The pivot is the unique implication point, unless its channel cannot
                // explain it directly; such a pivot is resolved further.
                let pivot_variable = pivot_literal.variable();
                if Self::is_reliable(pivot_variable, channels)
                    || assignments.get_variable_reason(pivot_variable).is_decision()
                {
                    break;
                }
            }
            acorn_assert_moderate!(trail_index > 0);
            trail_index -= 1;
        }

        self.analysis_result.learned_literals[0] = !pivot.unwrap();

        self.replace_unreliable_literals(
            assignments,
            clause_allocator,
            variable_selector,
            channels,
        );

        if minimisation_mode == MinimisationMode::Basic {
            self.minimise(assignments, clause_allocator);
        }

        self.compute_backjump_level(assignments);

        for variable in self.to_clear.drain(..) {
            self.seen[variable] = false;
        }

        acorn_assert_moderate!(self.debug_check_analysis_result(assignments));

        &self.analysis_result
    }

    pub fn num_literals_removed_by_minimisation(&self) -> u64 {
        self.num_literals_removed_by_minimisation
    }

    fn is_reliable(
        variable: PropositionalVariable,
        channels: &KeyedVec<PropositionalVariable, Option<ChannelInfo>>,
    ) -> bool {
        channels[variable]
            .as_ref()
            .map_or(true, |info| info.is_reliable())
    }

    /// Replaces every unreliable literal in the learnt clause by the antecedents of its own
    /// reason; expansion repeats until only reliable (or decision) literals remain.
    fn replace_unreliable_literals(
        &mut self,
        assignments: &Assignments,
        clause_allocator: &ClauseAllocator,
        variable_selector: &mut VariableSelector,
        channels: &KeyedVec<PropositionalVariable, Option<ChannelInfo>>,
    ) {
        let mut i = 1;
        while i < self.analysis_result.learned_literals.len() {
            let literal = self.analysis_result.learned_literals[i];
            let variable = literal.variable();

            if Self::is_reliable(variable, channels)
                || assignments.get_variable_reason(variable).is_decision()
            {
                i += 1;
                continue;
            }

            // The variable stays marked as seen so the expansion cannot reintroduce it.
            let _ = self.analysis_result.learned_literals.swap_remove(i);

            self.antecedent_buffer.clear();
            assignments
                .get_variable_reason(variable)
                .push_antecedents(clause_allocator, &mut self.antecedent_buffer);

            for j in 0..self.antecedent_buffer.len() {
                let antecedent = self.antecedent_buffer[j];
                let antecedent_variable = antecedent.variable();
                acorn_assert_moderate!(
                    assignments.get_variable_assignment_level(antecedent_variable)
                        <= assignments.get_variable_assignment_level(variable)
                );

                if !self.seen[antecedent_variable]
                    && assignments.get_variable_assignment_level(antecedent_variable) > 0
                {
                    self.seen[antecedent_variable] = true;
                    self.to_clear.push(antecedent_variable);
                    variable_selector.bump_activity(antecedent_variable);
                    self.analysis_result.learned_literals.push(antecedent);
                }
            }
        }
    }

    /// Self-subsuming resolution: a literal is redundant if every antecedent of its reason is
    /// already part of the learnt clause (seen) or fixed at the root.
    fn minimise(&mut self, assignments: &Assignments, clause_allocator: &ClauseAllocator) {
        let learned = &mut self.analysis_result.learned_literals;
        let num_literals_before = learned.len();

        let mut kept = 1;
        for i in 1..learned.len() {
            let variable = learned[i].variable();
            let reason = assignments.get_variable_reason(variable);

            let redundant = if reason.is_decision() {
                false
            } else {
                self.antecedent_buffer.clear();
                reason.push_antecedents(clause_allocator, &mut self.antecedent_buffer);
                self.antecedent_buffer.iter().all(|antecedent| {
                    self.seen[antecedent.variable()]
                        || assignments.get_variable_assignment_level(antecedent.variable()) == 0
                })
            };

            if !redundant {
                learned[kept] = learned[i];
                kept += 1;
            }
        }
        learned.truncate(kept);

        self.num_literals_removed_by_minimisation += (num_literals_before - kept) as u64;
    }

    /// The backjump level is the second-highest assignment level in the clause; the literal
    /// carrying it is swapped to position 1 so it becomes the second watched literal.
    fn compute_backjump_level(&mut self, assignments: &Assignments) {
        let learned = &mut self.analysis_result.learned_literals;

        if learned.len() == 1 {
            self.analysis_result.backjump_level = 0;
            return;
        }

        let mut max_index = 1;
        for i in 2..learned.len() {
            if assignments.get_literal_assignment_level(learned[i])
                > assignments.get_literal_assignment_level(learned[max_index])
            {
                max_index = i;
            }
        }
        learned.swap(1, max_index);
        self.analysis_result.backjump_level =
            assignments.get_literal_assignment_level(learned[1]);
    }

    /// The learnt clause must be falsified by the current trail, with the asserting literal as
    /// the only one from the current decision level.
    fn debug_check_analysis_result(&self, assignments: &Assignments) -> bool {
        let learned = &self.analysis_result.learned_literals;
        let current_level = assignments.get_decision_level();

        let all_falsified = learned
            .iter()
            .all(|&literal| assignments.is_literal_assigned_false(literal));
        let num_current_level = learned
            .iter()
            .filter(|&&literal| {
                assignments.get_literal_assignment_level(literal) == current_level
            })
            .count();

        all_falsified
            && num_current_level == 1
            && assignments.get_literal_assignment_level(learned[0]) == current_level
    }
}
