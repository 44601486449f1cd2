use log::info;
use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use super::Assignments;
use super::ClausalPropagator;
use super::ClauseAllocator;
use super::ConflictAnalyser;
use super::LearnedClauseManager;
use super::LearnedClauseOptions;
use super::MinimisationMode;
use super::PhaseSaving;
use super::Reason;
use super::RestartOptions;
use super::RestartStrategy;
use super::ValueSelector;
use super::VariableSelector;
use crate::acorn_assert_moderate;
use crate::acorn_assert_simple;
use crate::basic_types::ClauseReference;
use crate::basic_types::ConstraintOperationError;
use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::engine::channelling::ChannelInfo;

/// Options of the satisfiability engine.
#[derive(Debug, Clone, Copy)]
pub struct SatOptions {
    pub minimisation_mode: MinimisationMode,
    pub phase_saving: PhaseSaving,
    /// The probability of picking a random branching variable instead of the most active one.
    pub random_variable_frequency: f64,
    pub random_polarity: bool,
    /// Seed tiny random initial activities so ties between fresh variables are broken
    /// arbitrarily but deterministically.
    pub random_initial_activity: bool,
    pub random_seed: u64,
    pub variable_activity_decay_factor: f64,
    pub restart: RestartOptions,
    pub learned_clause: LearnedClauseOptions,
}

impl Default for SatOptions {
    fn default() -> Self {
        SatOptions {
            minimisation_mode: MinimisationMode::Basic,
            phase_saving: PhaseSaving::Full,
            random_variable_frequency: 0.0,
            random_polarity: false,
            random_initial_activity: true,
            random_seed: 7,
            variable_activity_decay_factor: 0.95,
            restart: RestartOptions::default(),
            learned_clause: LearnedClauseOptions::default(),
        }
    }
}

/// The externally visible verdict of a `solve` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveResult {
    Satisfiable,
    Unsatisfiable,
    /// A budget was exhausted or the solver was interrupted; solving can be resumed by
    /// raising the budgets and calling `solve` again.
    Unknown,
}

/// The lifecycle state of the engine. `Unsat` is terminal; `Undefined` is left by another
/// `solve` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverState {
    #[default]
    Ready,
    Solving,
    Sat,
    Unsat,
    Undefined,
}

impl SolverState {
    pub fn is_infeasible(self) -> bool {
        self == SolverState::Unsat
    }

    pub fn has_solution(self) -> bool {
        self == SolverState::Sat
    }
}

/// Search statistics, logged through the `log` facade.
#[derive(Default, Debug, Copy, Clone)]
pub struct Counters {
    pub num_decisions: u64,
    pub num_conflicts: u64,
    pub num_restarts: u64,
    pub num_unit_clauses_learned: u64,
    pub num_learned_literals: u64,
}

const STATISTIC_PREFIX: &str = "x";

impl Counters {
    fn log_statistics(&self) {
        info!(
            "{STATISTIC_PREFIX} Number of Decisions: {}",
            self.num_decisions
        );
        info!(
            "{STATISTIC_PREFIX} Number of Conflicts: {}",
            self.num_conflicts
        );
        info!(
            "{STATISTIC_PREFIX} Number of Restarts: {}",
            self.num_restarts
        );
        info!(
            "{STATISTIC_PREFIX} Number of Learned Unit Clauses: {}",
            self.num_unit_clauses_learned
        );
        info!(
            "{STATISTIC_PREFIX} Number of Learned Literals: {}",
            self.num_learned_literals
        );
    }
}

/// The outcome of one bounded search episode between restarts.
enum SearchOutcome {
    Satisfiable,
    Unsatisfiable,
    /// The restart budget, a global budget or the interrupt flag stopped the episode.
    Undefined,
}

/// The clause-learning satisfiability engine.
///
/// The solver owns the clause arena, the trail, the watcher index, the conflict analyser and
/// the branching heuristics, and exposes the incremental interface consumed by the channelled
/// domain world: literals can be propagated one at a time, the trail can be rolled back marker
/// by marker, and conflicts can be turned into explanations.
///
/// Two reserved variables encode the constants: variable 0 is fixed true and variable 1 is
/// fixed false at the root, so callers always have literals for trivially true and trivially
/// false facts.
#[derive(Debug)]
pub struct SatSolver {
    assignments: Assignments,
    clause_allocator: ClauseAllocator,
    clausal_propagator: ClausalPropagator,
    permanent_clauses: Vec<ClauseReference>,
    learned_clause_manager: LearnedClauseManager,
    conflict_analyser: ConflictAnalyser,
    variable_selector: VariableSelector,
    value_selector: ValueSelector,
    restart_strategy: RestartStrategy,
    channels: KeyedVec<PropositionalVariable, Option<ChannelInfo>>,
    counters: Counters,
    random: SmallRng,
    options: SatOptions,
    state: SolverState,
    model: Vec<Option<bool>>,
    conflict_budget: i64,
    propagation_budget: i64,
    interrupt_flag: bool,
    last_conflict: Option<ClauseReference>,
    /// Start of the trail segment written by the most recent `propagate_one_literal` call.
    last_propagation_start: usize,
    true_literal: Literal,
    false_literal: Literal,
}

impl Default for SatSolver {
    fn default() -> Self {
        SatSolver::new(SatOptions::default())
    }
}

impl SatSolver {
    pub fn new(options: SatOptions) -> SatSolver {
        let mut solver = SatSolver {
            assignments: Assignments::default(),
            clause_allocator: ClauseAllocator::default(),
            clausal_propagator: ClausalPropagator::default(),
            permanent_clauses: vec![],
            learned_clause_manager: LearnedClauseManager::new(options.learned_clause),
            conflict_analyser: ConflictAnalyser::default(),
            variable_selector: VariableSelector::new(options.variable_activity_decay_factor),
            value_selector: ValueSelector::new(options.phase_saving, options.random_polarity),
            restart_strategy: RestartStrategy::new(options.restart),
            channels: KeyedVec::default(),
            counters: Counters::default(),
            random: SmallRng::seed_from_u64(options.random_seed),
            options,
            state: SolverState::Ready,
            model: vec![],
            conflict_budget: -1,
            propagation_budget: -1,
            interrupt_flag: false,
            last_conflict: None,
            last_propagation_start: 0,
            true_literal: Literal::default(),
            false_literal: Literal::default(),
        };

        // The reserved constant variables, fixed at the root and excluded from branching.
        let true_variable = solver.create_variable(None);
        let false_variable = solver.create_variable(None);
        solver.true_literal = Literal::new(true_variable, true);
        solver.false_literal = Literal::new(false_variable, true);

        solver.variable_selector.set_decision_variable(true_variable, false);
        solver.variable_selector.set_decision_variable(false_variable, false);

        solver.assignments.enqueue_decision_literal(solver.true_literal);
        solver.assignments.enqueue_decision_literal(!solver.false_literal);
        let propagation = solver
            .clausal_propagator
            .propagate(&mut solver.assignments, &mut solver.clause_allocator);
        acorn_assert_simple!(propagation.is_ok());

        solver
    }

    /// The literal that is true in every state of this engine.
    pub fn true_literal(&self) -> Literal {
        self.true_literal
    }

    /// The literal that is false in every state of this engine.
    pub fn false_literal(&self) -> Literal {
        self.false_literal
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn log_statistics(&self) {
        self.counters.log_statistics();
        info!(
            "{STATISTIC_PREFIX} Number of Propagations: {}",
            self.clausal_propagator.num_propagations()
        );
    }

    fn create_variable(&mut self, channel: Option<ChannelInfo>) -> PropositionalVariable {
        let variable = self.assignments.grow();
        self.clausal_propagator.grow();
        self.value_selector.grow();

        let initial_activity = if self.options.random_initial_activity {
            self.random.gen::<f64>() * 1e-5
        } else {
            0.0
        };
        self.variable_selector.grow(variable, initial_activity);

        let _ = self.channels.push(channel);
        variable
    }

    /// Creates a fresh decision variable.
    pub fn new_variable(&mut self) -> PropositionalVariable {
        self.create_variable(None)
    }

    /// Creates a variable owned by a literaliser; the channel info ties its literals back to
    /// the domain world.
    pub fn new_channelled_variable(&mut self, channel: ChannelInfo) -> PropositionalVariable {
        self.create_variable(Some(channel))
    }

    pub fn num_variables(&self) -> u32 {
        self.assignments.num_variables()
    }

    pub fn channel_info(&self, variable: PropositionalVariable) -> Option<&ChannelInfo> {
        self.channels[variable].as_ref()
    }

    pub fn assignments(&self) -> &Assignments {
        &self.assignments
    }

    /// Marks a variable as (in)eligible for branching.
    pub fn set_decision_variable(&mut self, variable: PropositionalVariable, is_decision: bool) {
        self.variable_selector.set_decision_variable(variable, is_decision);
    }

    // ---------------------------------------------------------------------------------------
    // clause addition

    /// Adds a clause to the database. Literals that are false at the root are dropped and a
    /// clause containing a literal that is true at the root (or both polarities of one
    /// variable) is ignored. An empty result proves the formula unsatisfiable, which latches
    /// the engine into the `Unsat` state.
    pub fn add_permanent_clause(
        &mut self,
        mut literals: Vec<Literal>,
    ) -> Result<(), ConstraintOperationError> {
        acorn_assert_simple!(
            self.assignments.is_at_the_root_level(),
            "permanent clauses can only be added at the root level"
        );

        if self.state.is_infeasible() {
            return Err(ConstraintOperationError::InfeasibleState);
        }

        // Sorting groups duplicates and complementary literals next to each other.
        literals.sort_unstable_by_key(|literal| literal.to_code());
        let mut kept = 0;
        let mut previous: Option<Literal> = None;
        for i in 0..literals.len() {
            let literal = literals[i];
            if self.assignments.is_literal_assigned_true(literal)
                || previous == Some(!literal)
            {
                // Satisfied at the root or a tautology.
                return Ok(());
            }
            if !self.assignments.is_literal_assigned_false(literal) && previous != Some(literal)
            {
                literals[kept] = literal;
                kept += 1;
                previous = Some(literal);
            }
        }
        literals.truncate(kept);

        match literals.len() {
            0 => {
                self.state = SolverState::Unsat;
                Err(ConstraintOperationError::InfeasibleClause)
            }
            1 => {
                self.assignments.enqueue_decision_literal(literals[0]);
                if self
                    .clausal_propagator
                    .propagate(&mut self.assignments, &mut self.clause_allocator)
                    .is_err()
                {
                    self.state = SolverState::Unsat;
                    return Err(ConstraintOperationError::InfeasibleClause);
                }
                Ok(())
            }
            _ => {
                let reference = self.clausal_propagator.add_clause_unchecked(
                    literals,
                    false,
                    &mut self.clause_allocator,
                );
                self.permanent_clauses.push(reference);
                Ok(())
            }
        }
    }

    pub fn add_unit_clause(&mut self, literal: Literal) -> Result<(), ConstraintOperationError> {
        self.add_permanent_clause(vec![literal])
    }

    pub fn add_binary_clause(
        &mut self,
        first: Literal,
        second: Literal,
    ) -> Result<(), ConstraintOperationError> {
        self.add_permanent_clause(vec![first, second])
    }

    pub fn add_ternary_clause(
        &mut self,
        first: Literal,
        second: Literal,
        third: Literal,
    ) -> Result<(), ConstraintOperationError> {
        self.add_permanent_clause(vec![first, second, third])
    }

    /// Injects a clause in the middle of the search, as done by the outer learning loop. The
    /// literals are reordered so the watches land on the least falsified literals; if the
    /// clause is asserting under the current assignment its remaining literal is propagated.
    /// Returns `false` when the clause is conflicting under the current assignment.
    pub fn add_learnt_clause_during_search(&mut self, mut literals: Vec<Literal>) -> bool {
        acorn_assert_simple!(!self.state.is_infeasible());

        literals.sort_unstable_by_key(|literal| literal.to_code());
        literals.dedup();

        if literals.is_empty() {
            self.state = SolverState::Unsat;
            return false;
        }

        if literals.len() == 1 {
            return match self.assignments.literal_value(literals[0]) {
                Some(true) => true,
                Some(false) => {
                    self.last_conflict = None;
                    false
                }
                None => self.propagate_one_literal(literals[0], Reason::Decision),
            };
        }

        // Watches must sit on non-false literals where possible; falsified literals are
        // ordered by decreasing assignment level so backtracking wakes the clause correctly.
        literals.sort_by_key(|&literal| {
            if self.assignments.is_literal_assigned_false(literal) {
                usize::MAX - self.assignments.get_literal_assignment_level(literal)
            } else {
                0
            }
        });

        let reference = self.clausal_propagator.add_clause_unchecked(
            literals,
            true,
            &mut self.clause_allocator,
        );
        self.learned_clause_manager.track_learned_clause(reference);

        let first = self.clause_allocator[reference].literals()[0];
        let second = self.clause_allocator[reference].literals()[1];

        if self.assignments.is_literal_assigned_false(second) {
            // All literals but possibly the first are false.
            if self.assignments.is_literal_assigned_false(first) {
                self.last_conflict = Some(reference);
                return false;
            }
            if self.assignments.is_literal_unassigned(first) {
                self.assignments
                    .enqueue_propagated_literal(first, Reason::Clause(reference));
                if let Err(conflicting) = self
                    .clausal_propagator
                    .propagate(&mut self.assignments, &mut self.clause_allocator)
                {
                    self.last_conflict = Some(conflicting);
                    return false;
                }
            }
        }
        true
    }

    // ---------------------------------------------------------------------------------------
    // propagation and trail control

    /// Runs unit propagation to fixpoint. Returns `false` on conflict; a conflict at the root
    /// level latches the `Unsat` state.
    pub fn propagate(&mut self) -> bool {
        match self
            .clausal_propagator
            .propagate(&mut self.assignments, &mut self.clause_allocator)
        {
            Ok(()) => true,
            Err(conflicting) => {
                self.last_conflict = Some(conflicting);
                if self.assignments.is_at_the_root_level() {
                    self.state = SolverState::Unsat;
                }
                false
            }
        }
    }

    /// Propagates a single externally implied literal: a fresh trail marker is opened, the
    /// literal is enqueued with the given reason and unit propagation runs to fixpoint. The
    /// literals assigned by this step are available through [`SatSolver::touched_literals`].
    ///
    /// Returns `false` on conflict, leaving the trail consistent for analysis. A literal that
    /// is already true is a no-op; one that is already false fails without touching the trail.
    pub fn propagate_one_literal(&mut self, literal: Literal, reason: Reason) -> bool {
        acorn_assert_simple!(!self.state.is_infeasible());

        match self.assignments.literal_value(literal) {
            Some(true) => {
                self.last_propagation_start = self.assignments.num_trail_entries();
                true
            }
            Some(false) => {
                // The trail is untouched; there is no conflicting clause to explain.
                self.last_propagation_start = self.assignments.num_trail_entries();
                self.last_conflict = None;
                false
            }
            None => {
                self.push_trail_marker();
                self.last_propagation_start = self.assignments.num_trail_entries();
                if reason.is_decision() {
                    self.assignments.enqueue_decision_literal(literal);
                } else {
                    self.assignments.enqueue_propagated_literal(literal, reason);
                }
                match self
                    .clausal_propagator
                    .propagate(&mut self.assignments, &mut self.clause_allocator)
                {
                    Ok(()) => true,
                    Err(conflicting) => {
                        self.last_conflict = Some(conflicting);
                        false
                    }
                }
            }
        }
    }

    /// The literals assigned by the most recent [`SatSolver::propagate_one_literal`] call, in
    /// trail order (the propagated literal first).
    pub fn touched_literals(&self) -> impl Iterator<Item = Literal> + '_ {
        (self.last_propagation_start..self.assignments.num_trail_entries())
            .map(|index| self.assignments.get_trail_entry(index))
    }

    /// Opens a new decision level.
    pub fn push_trail_marker(&mut self) {
        self.assignments.increase_decision_level();
    }

    /// The current decision level.
    pub fn trail_marker(&self) -> usize {
        self.assignments.get_decision_level()
    }

    /// Backtracks to the given decision level; a no-op if the engine is already at or below
    /// it. Unassigned variables get their saved polarity updated per the phase-saving policy
    /// and re-enter the branching heap.
    pub fn cancel_until(&mut self, level: usize) {
        if self.assignments.get_decision_level() > level {
            self.backtrack(level);
        }
    }

    fn backtrack(&mut self, backtrack_level: usize) {
        acorn_assert_simple!(backtrack_level < self.assignments.get_decision_level());

        let innermost_level_start = self
            .assignments
            .level_start(self.assignments.get_decision_level());
        let mut trail_position = self.assignments.num_trail_entries();

        let SatSolver {
            ref mut assignments,
            ref mut variable_selector,
            ref mut value_selector,
            ..
        } = *self;

        assignments.synchronise(backtrack_level).for_each(|literal| {
            trail_position -= 1;
            value_selector.on_unassign(literal, trail_position, innermost_level_start);
            variable_selector.on_unassign(literal.variable());
        });

        self.clausal_propagator
            .synchronise(self.assignments.num_trail_entries());
    }

    // ---------------------------------------------------------------------------------------
    // solving

    /// Searches for a satisfying assignment under the restart schedule. Returns
    /// [`SolveResult::Unknown`] when a budget runs out or the engine is interrupted; calling
    /// `solve` again resumes with fresh restart budgets.
    pub fn solve(&mut self) -> SolveResult {
        self.model.clear();
        if self.state.is_infeasible() {
            return SolveResult::Unsatisfiable;
        }

        self.state = SolverState::Solving;
        self.learned_clause_manager
            .initialise(self.permanent_clauses.len());

        let result = loop {
            let restart_budget = self.restart_strategy.next_conflict_budget();
            match self.search(restart_budget) {
                SearchOutcome::Satisfiable => break SolveResult::Satisfiable,
                SearchOutcome::Unsatisfiable => break SolveResult::Unsatisfiable,
                SearchOutcome::Undefined => {
                    if !self.within_budget() {
                        break SolveResult::Unknown;
                    }
                    self.restart_strategy.notify_restart();
                    self.counters.num_restarts += 1;
                }
            }
        };

        match result {
            SolveResult::Satisfiable => {
                self.extract_model();
                self.state = SolverState::Sat;
            }
            SolveResult::Unsatisfiable => self.state = SolverState::Unsat,
            SolveResult::Unknown => self.state = SolverState::Undefined,
        }

        if self.assignments.get_decision_level() > 0 {
            self.backtrack(0);
        }

        result
    }

    /// Runs the propagate/decide/analyse loop until a verdict, a conflict-budget boundary or
    /// an external interrupt.
    fn search(&mut self, restart_budget: i64) -> SearchOutcome {
        let mut conflicts_until_restart = restart_budget;

        loop {
            let propagation = self
                .clausal_propagator
                .propagate(&mut self.assignments, &mut self.clause_allocator);

            match propagation {
                Err(conflicting_clause) => {
                    self.counters.num_conflicts += 1;
                    conflicts_until_restart -= 1;

                    if self.assignments.is_at_the_root_level() {
                        self.last_conflict = Some(conflicting_clause);
                        return SearchOutcome::Unsatisfiable;
                    }

                    self.resolve_conflict(conflicting_clause);

                    self.variable_selector.decay_activities();
                    self.learned_clause_manager.on_conflict();
                }
                Ok(()) => {
                    acorn_assert_moderate!(self
                        .clausal_propagator
                        .is_propagation_complete(self.assignments.num_trail_entries()));

                    if conflicts_until_restart <= 0 || !self.within_budget() {
                        if self.assignments.get_decision_level() > 0 {
                            self.backtrack(0);
                        }
                        return SearchOutcome::Undefined;
                    }

                    if self
                        .learned_clause_manager
                        .should_reduce(self.assignments.num_trail_entries())
                    {
                        self.learned_clause_manager.reduce(
                            &mut self.clausal_propagator,
                            &self.assignments,
                            &mut self.clause_allocator,
                        );
                    }

                    let decision_variable = self.variable_selector.select_variable(
                        &self.assignments,
                        &mut self.random,
                        self.options.random_variable_frequency,
                    );

                    match decision_variable {
                        None => return SearchOutcome::Satisfiable,
                        Some(variable) => {
                            self.counters.num_decisions += 1;
                            let decision_literal =
                                self.value_selector.select_literal(variable, &mut self.random);
                            acorn_assert_moderate!(
                                self.assignments.is_literal_unassigned(decision_literal)
                            );
                            self.push_trail_marker();
                            self.assignments.enqueue_decision_literal(decision_literal);
                        }
                    }
                }
            }
        }
    }

    /// Learns the first-UIP clause of the conflict, backjumps and enqueues the asserting
    /// literal.
    fn resolve_conflict(&mut self, conflicting_clause: ClauseReference) {
        let analysis = self.analyse_conflict(conflicting_clause).clone();

        self.counters.num_learned_literals += analysis.learned_literals.len() as u64;

        self.backtrack(analysis.backjump_level);

        if analysis.learned_literals.len() == 1 {
            // Unit learnt clauses become root assignments rather than stored clauses.
            acorn_assert_moderate!(self.assignments.is_at_the_root_level());
            self.assignments
                .enqueue_decision_literal(analysis.learned_literals[0]);
            self.counters.num_unit_clauses_learned += 1;
        } else {
            let _ = self.learned_clause_manager.add_learned_clause(
                analysis.learned_literals,
                &mut self.clausal_propagator,
                &mut self.assignments,
                &mut self.clause_allocator,
            );
        }
    }

    fn analyse_conflict(
        &mut self,
        conflicting_clause: ClauseReference,
    ) -> &super::ConflictAnalysisResult {
        let SatSolver {
            ref mut conflict_analyser,
            ref assignments,
            ref mut clause_allocator,
            ref mut learned_clause_manager,
            ref mut variable_selector,
            ref channels,
            ref options,
            ..
        } = *self;

        conflict_analyser.analyse(
            conflicting_clause,
            options.minimisation_mode,
            assignments,
            clause_allocator,
            learned_clause_manager,
            variable_selector,
            channels,
        )
    }

    /// Builds the explanation clause for the most recent conflict, as consumed by an outer
    /// learning search loop. Returns an empty clause for root-level conflicts, which have no
    /// explanation other than global infeasibility.
    pub fn explain_last_conflict(&mut self) -> Vec<Literal> {
        let Some(conflicting_clause) = self.last_conflict else {
            return vec![];
        };
        if self.assignments.is_at_the_root_level() {
            return vec![];
        }
        self.analyse_conflict(conflicting_clause)
            .learned_literals
            .clone()
    }

    /// Checks the propagation-soundness invariant over the whole clause database; intended
    /// for tests and debug builds.
    pub fn debug_check_propagation_soundness(&self) -> bool {
        self.clausal_propagator
            .debug_check_propagation_soundness(&self.assignments, &self.clause_allocator)
    }

    fn within_budget(&self) -> bool {
        !self.interrupt_flag
            && (self.conflict_budget < 0
                || self.counters.num_conflicts < self.conflict_budget as u64)
            && (self.propagation_budget < 0
                || self.clausal_propagator.num_propagations()
                    < self.propagation_budget as u64)
    }

    fn extract_model(&mut self) {
        self.model = self
            .assignments
            .get_variables()
            .map(|variable| {
                self.assignments
                    .literal_value(Literal::new(variable, true))
            })
            .collect();
    }

    /// The truth value of the literal in the most recent model; `None` if the variable was
    /// not assigned or no model is available.
    pub fn model_literal_value(&self, literal: Literal) -> Option<bool> {
        let value = *self.model.get(literal.variable().index())?;
        value.map(|truth| truth == literal.is_positive())
    }

    // ---------------------------------------------------------------------------------------
    // budgets and interrupts

    /// Limits the total number of conflicts; negative means unlimited.
    pub fn set_conflict_budget(&mut self, budget: i64) {
        self.conflict_budget = budget;
    }

    /// Limits the total number of trail literals propagated; negative means unlimited.
    pub fn set_propagation_budget(&mut self, budget: i64) {
        self.propagation_budget = budget;
    }

    /// Asks the engine to stop at the next conflict or propagation boundary; the state stays
    /// consistent and solving can be resumed.
    pub fn interrupt(&mut self) {
        self.interrupt_flag = true;
    }

    pub fn clear_interrupt(&mut self) {
        self.interrupt_flag = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_reserved_constants_are_fixed_at_the_root() {
        let solver = SatSolver::default();

        assert!(solver.assignments().is_literal_assigned_true(solver.true_literal()));
        assert!(solver.assignments().is_literal_assigned_false(solver.false_literal()));
        assert!(solver
            .assignments()
            .is_literal_root_assignment(solver.true_literal()));
    }

    #[test]
    fn forced_model_is_found() {
        // (a \/ b), (~a \/ b), (a \/ ~b) has the unique model a = true, b = true.
        let mut solver = SatSolver::default();
        let a = Literal::new(solver.new_variable(), true);
        let b = Literal::new(solver.new_variable(), true);

        solver.add_binary_clause(a, b).unwrap();
        solver.add_binary_clause(!a, b).unwrap();
        solver.add_binary_clause(a, !b).unwrap();

        assert_eq!(solver.solve(), SolveResult::Satisfiable);
        assert_eq!(solver.model_literal_value(a), Some(true));
        assert_eq!(solver.model_literal_value(b), Some(true));
    }

    #[test]
    fn contradicting_unit_clauses_are_detected_at_addition() {
        let mut solver = SatSolver::default();
        let a = Literal::new(solver.new_variable(), true);

        solver.add_unit_clause(a).unwrap();
        let result = solver.add_unit_clause(!a);

        assert_eq!(result, Err(ConstraintOperationError::InfeasibleClause));
        assert!(solver.state().is_infeasible());
        assert_eq!(solver.solve(), SolveResult::Unsatisfiable);
    }

    #[test]
    fn satisfied_and_tautological_clauses_are_dropped() {
        let mut solver = SatSolver::default();
        let a = Literal::new(solver.new_variable(), true);
        let b = Literal::new(solver.new_variable(), true);

        // Tautology.
        solver.add_binary_clause(a, !a).unwrap();
        // Contains the constant true literal.
        solver.add_binary_clause(solver.true_literal(), b).unwrap();

        assert_eq!(solver.clause_allocator.num_allocated_clauses(), 0);
    }

    #[test]
    fn pigeonhole_three_in_two_is_unsatisfiable() {
        // Three pigeons into two holes: per-pigeon at-least-one and per-hole at-most-one.
        let mut solver = SatSolver::default();
        let mut placed = vec![];
        for _ in 0..3 {
            let in_first = Literal::new(solver.new_variable(), true);
            let in_second = Literal::new(solver.new_variable(), true);
            solver.add_binary_clause(in_first, in_second).unwrap();
            placed.push((in_first, in_second));
        }
        for i in 0..3 {
            for j in (i + 1)..3 {
                solver.add_binary_clause(!placed[i].0, !placed[j].0).unwrap();
                solver.add_binary_clause(!placed[i].1, !placed[j].1).unwrap();
            }
        }

        assert_eq!(solver.solve(), SolveResult::Unsatisfiable);
        assert!(solver.state().is_infeasible());
    }

    #[test]
    fn conflict_budget_downgrades_to_unknown_and_is_resumable() {
        let mut solver = SatSolver::default();
        let mut literals = vec![];
        for _ in 0..6 {
            literals.push(Literal::new(solver.new_variable(), true));
        }
        // Pigeonhole 4 into 3 keeps the solver busy for more than one conflict.
        let mut placed = vec![];
        for _ in 0..4 {
            let slots: Vec<Literal> = (0..3)
                .map(|_| Literal::new(solver.new_variable(), true))
                .collect();
            solver.add_permanent_clause(slots.clone()).unwrap();
            placed.push(slots);
        }
        for hole in 0..3 {
            for i in 0..4 {
                for j in (i + 1)..4 {
                    solver
                        .add_binary_clause(!placed[i][hole], !placed[j][hole])
                        .unwrap();
                }
            }
        }

        solver.set_conflict_budget(1);
        assert_eq!(solver.solve(), SolveResult::Unknown);
        assert_eq!(solver.state(), SolverState::Undefined);

        solver.set_conflict_budget(-1);
        assert_eq!(solver.solve(), SolveResult::Unsatisfiable);
    }

    #[test]
    fn propagate_one_literal_reports_touched_literals() {
        let mut solver = SatSolver::default();
        let a = Literal::new(solver.new_variable(), true);
        let b = Literal::new(solver.new_variable(), true);
        let c = Literal::new(solver.new_variable(), true);

        solver.add_binary_clause(!a, b).unwrap();
        solver.add_ternary_clause(!a, !b, c).unwrap();

        assert!(solver.propagate_one_literal(a, Reason::Decision));
        let touched: Vec<Literal> = solver.touched_literals().collect();
        assert_eq!(touched, vec![a, b, c]);
        assert_eq!(solver.trail_marker(), 1);

        solver.cancel_until(0);
        assert!(solver.assignments().is_literal_unassigned(a));
    }

    #[test]
    fn propagating_a_false_literal_fails_without_touching_the_trail() {
        let mut solver = SatSolver::default();
        let a = Literal::new(solver.new_variable(), true);

        assert!(solver.propagate_one_literal(a, Reason::Decision));
        let trail_size = solver.assignments().num_trail_entries();

        assert!(!solver.propagate_one_literal(!a, Reason::Decision));
        assert_eq!(solver.assignments().num_trail_entries(), trail_size);
        assert_eq!(solver.touched_literals().count(), 0);
    }

    #[test]
    fn learnt_clause_injection_propagates_asserting_clauses() {
        let mut solver = SatSolver::default();
        let a = Literal::new(solver.new_variable(), true);
        let b = Literal::new(solver.new_variable(), true);

        assert!(solver.propagate_one_literal(a, Reason::Decision));
        assert!(solver.add_learnt_clause_during_search(vec![!a, b]));
        assert!(solver.assignments().is_literal_assigned_true(b));
    }
}
