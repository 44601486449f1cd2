use rand::rngs::SmallRng;
use rand::Rng;

use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::containers::KeyedVec;

/// How much of the previous assignment is remembered as the default polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseSaving {
    /// Always branch on the initial polarity.
    Disabled,
    /// Remember only polarities of literals assigned after the start of the innermost
    /// decision level being undone.
    Limited,
    /// Remember the polarity of every unassigned literal.
    #[default]
    Full,
}

/// Chooses the polarity of a branching literal: the saved phase of the variable, or a random
/// polarity when configured.
#[derive(Debug)]
pub struct ValueSelector {
    saved_polarity: KeyedVec<PropositionalVariable, bool>,
    phase_saving: PhaseSaving,
    random_polarity: bool,
}

impl ValueSelector {
    pub fn new(phase_saving: PhaseSaving, random_polarity: bool) -> ValueSelector {
        ValueSelector {
            saved_polarity: KeyedVec::default(),
            phase_saving,
            random_polarity,
        }
    }

    pub fn grow(&mut self) {
        let _ = self.saved_polarity.push(true);
    }

    pub fn select_literal(
        &self,
        variable: PropositionalVariable,
        random: &mut SmallRng,
    ) -> Literal {
        let polarity = if self.random_polarity {
            random.gen_bool(0.5)
        } else {
            self.saved_polarity[variable]
        };
        Literal::new(variable, polarity)
    }

    /// Called for every literal removed from the trail during backtracking.
    /// `innermost_level_start` is the trail position at which the innermost undone decision
    /// level began.
    pub fn on_unassign(
        &mut self,
        literal: Literal,
        trail_position: usize,
        innermost_level_start: usize,
    ) {
        let save = match self.phase_saving {
            PhaseSaving::Disabled => false,
            PhaseSaving::Limited => trail_position > innermost_level_start,
            PhaseSaving::Full => true,
        };
        if save {
            self.saved_polarity[literal.variable()] = literal.is_positive();
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn full_phase_saving_remembers_the_last_polarity() {
        let mut selector = ValueSelector::new(PhaseSaving::Full, false);
        selector.grow();
        let variable = PropositionalVariable::new(0);
        let mut random = SmallRng::seed_from_u64(7);

        assert!(selector.select_literal(variable, &mut random).is_positive());

        selector.on_unassign(Literal::new(variable, false), 5, 0);
        assert!(selector.select_literal(variable, &mut random).is_negative());
    }

    #[test]
    fn limited_phase_saving_ignores_literals_of_outer_levels() {
        let mut selector = ValueSelector::new(PhaseSaving::Limited, false);
        selector.grow();
        let variable = PropositionalVariable::new(0);
        let mut random = SmallRng::seed_from_u64(7);

        // Position 3 is at or before the innermost level start, so nothing is remembered.
        selector.on_unassign(Literal::new(variable, false), 3, 3);
        assert!(selector.select_literal(variable, &mut random).is_positive());

        selector.on_unassign(Literal::new(variable, false), 4, 3);
        assert!(selector.select_literal(variable, &mut random).is_negative());
    }
}
