use super::Reason;
use crate::acorn_assert_moderate;
use crate::acorn_assert_simple;
use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::basic_types::PropositionalVariableGeneratorIterator;
use crate::basic_types::Trail;
use crate::containers::KeyedVec;

/// The assignment state of the engine: per-variable metadata plus the chronological trail of
/// assigned literals with decision-level markers.
#[derive(Clone, Debug)]
pub struct Assignments {
    variable_state: KeyedVec<PropositionalVariable, VariableState>,
    trail: Trail<Literal>,
}

impl Default for Assignments {
    fn default() -> Self {
        Assignments {
            variable_state: KeyedVec::default(),
            trail: Trail::default(),
        }
    }
}

impl Assignments {
    pub fn increase_decision_level(&mut self) {
        self.trail.increase_decision_level()
    }

    pub fn get_decision_level(&self) -> usize {
        self.trail.get_decision_level()
    }

    pub fn is_at_the_root_level(&self) -> bool {
        self.get_decision_level() == 0
    }

    pub fn num_trail_entries(&self) -> usize {
        self.trail.len()
    }

    pub fn get_trail_entry(&self, index: usize) -> Literal {
        self.trail[index]
    }

    /// The trail length at which the given decision level started.
    pub fn level_start(&self, decision_level: usize) -> usize {
        self.trail.level_start(decision_level)
    }

    pub fn grow(&mut self) -> PropositionalVariable {
        self.variable_state.push(VariableState::Unassigned)
    }

    pub fn num_variables(&self) -> u32 {
        self.variable_state.len() as u32
    }

    pub fn get_variables(&self) -> PropositionalVariableGeneratorIterator {
        PropositionalVariableGeneratorIterator::new(0, self.num_variables())
    }

    pub fn is_variable_assigned(&self, variable: PropositionalVariable) -> bool {
        self.variable_state[variable] != VariableState::Unassigned
    }

    pub fn is_variable_unassigned(&self, variable: PropositionalVariable) -> bool {
        self.variable_state[variable] == VariableState::Unassigned
    }

    pub fn is_variable_assigned_true(&self, variable: PropositionalVariable) -> bool {
        matches!(
            self.variable_state[variable],
            VariableState::Assigned {
                truth_value: true,
                ..
            }
        )
    }

    pub fn is_variable_assigned_false(&self, variable: PropositionalVariable) -> bool {
        matches!(
            self.variable_state[variable],
            VariableState::Assigned {
                truth_value: false,
                ..
            }
        )
    }

    pub fn is_literal_assigned(&self, literal: Literal) -> bool {
        self.is_variable_assigned(literal.variable())
    }

    pub fn is_literal_unassigned(&self, literal: Literal) -> bool {
        self.is_variable_unassigned(literal.variable())
    }

    pub fn is_literal_assigned_true(&self, literal: Literal) -> bool {
        if literal.is_positive() {
            self.is_variable_assigned_true(literal.variable())
        } else {
            self.is_variable_assigned_false(literal.variable())
        }
    }

    pub fn is_literal_assigned_false(&self, literal: Literal) -> bool {
        self.is_literal_assigned(literal) && !self.is_literal_assigned_true(literal)
    }

    /// `Some(truth value)` of the literal, or `None` when its variable is unassigned.
    pub fn literal_value(&self, literal: Literal) -> Option<bool> {
        match self.variable_state[literal.variable()] {
            VariableState::Assigned { truth_value, .. } => {
                Some(truth_value == literal.is_positive())
            }
            VariableState::Unassigned => None,
        }
    }

    pub fn is_literal_root_assignment(&self, literal: Literal) -> bool {
        self.is_literal_assigned(literal)
            && self.get_variable_assignment_level(literal.variable()) == 0
    }

    pub fn get_variable_assignment_level(&self, variable: PropositionalVariable) -> usize {
        match self.variable_state[variable] {
            VariableState::Assigned { decision_level, .. } => decision_level as usize,
            VariableState::Unassigned => {
                panic!("unassigned variables do not have an assignment level")
            }
        }
    }

    pub fn get_literal_assignment_level(&self, literal: Literal) -> usize {
        self.get_variable_assignment_level(literal.variable())
    }

    pub fn get_variable_trail_position(&self, variable: PropositionalVariable) -> usize {
        match self.variable_state[variable] {
            VariableState::Assigned { trail_position, .. } => trail_position as usize,
            VariableState::Unassigned => {
                panic!("unassigned variables do not have a trail position")
            }
        }
    }

    pub fn get_variable_reason(&self, variable: PropositionalVariable) -> Reason {
        match self.variable_state[variable] {
            VariableState::Assigned { reason, .. } => reason,
            VariableState::Unassigned => {
                panic!("unassigned variables do not have a reason")
            }
        }
    }

    pub fn is_variable_decision(&self, variable: PropositionalVariable) -> bool {
        match self.variable_state[variable] {
            VariableState::Assigned { reason, .. } => reason.is_decision(),
            VariableState::Unassigned => false,
        }
    }

    pub fn enqueue_decision_literal(&mut self, decision_literal: Literal) {
        acorn_assert_simple!(!self.is_literal_assigned(decision_literal));
        self.make_assignment(decision_literal, Reason::Decision);
    }

    pub fn enqueue_propagated_literal(&mut self, propagated_literal: Literal, reason: Reason) {
        acorn_assert_moderate!(!reason.is_decision());
        self.make_assignment(propagated_literal, reason);
    }

    fn make_assignment(&mut self, true_literal: Literal, reason: Reason) {
        // Enqueueing an assigned literal means the trail and the watchers disagree; that is
        // corruption, not a recoverable state.
        acorn_assert_simple!(
            !self.is_literal_assigned(true_literal),
            "cannot enqueue an already assigned literal"
        );

        self.variable_state[true_literal.variable()] = VariableState::Assigned {
            truth_value: true_literal.is_positive(),
            decision_level: self.get_decision_level() as u32,
            trail_position: self.trail.len() as u32,
            reason,
        };

        self.trail.push(true_literal);
    }

    /// Backtracks to `new_decision_level`, handing back the unassigned literals in reverse
    /// chronological order.
    pub fn synchronise(&mut self, new_decision_level: usize) -> impl Iterator<Item = Literal> + '_ {
        acorn_assert_simple!(new_decision_level < self.get_decision_level());
        self.trail.synchronise(new_decision_level).inspect(|entry| {
            self.variable_state[entry.variable()] = VariableState::Unassigned;
        })
    }
}

#[derive(PartialEq, Clone, Copy, Default, Debug)]
enum VariableState {
    Assigned {
        truth_value: bool,
        decision_level: u32,
        trail_position: u32,
        reason: Reason,
    },
    #[default]
    Unassigned,
}
