use thiserror::Error;

use crate::acorn_assert_moderate;
use crate::acorn_assert_simple;
use crate::basic_types::HashSet;
use crate::basic_types::Trail;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;

/// A finite-domain integer variable of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerVariable {
    index: u32,
}

/// A Boolean domain variable of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BooleanVariable {
    index: u32,
}

/// A set domain variable of the store, represented by its kernel and envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SetVariable {
    index: u32,
}

macro_rules! domain_storage_key {
    ($name:ident, $prefix:literal) => {
        impl StorageKey for $name {
            fn index(&self) -> usize {
                self.index as usize
            }

            fn create_from_index(index: usize) -> Self {
                $name {
                    index: index as u32,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.index)
            }
        }
    };
}

domain_storage_key!(IntegerVariable, "x");
domain_storage_key!(BooleanVariable, "b");
domain_storage_key!(SetVariable, "s");

/// Any variable of the store; the synchronisation queue is over these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainVariable {
    Integer(IntegerVariable),
    Boolean(BooleanVariable),
    Set(SetVariable),
}

/// Who triggered a domain update; recorded on the trail for debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cause {
    #[default]
    Search,
    Channelling,
    Propagator(u32),
}

/// A domain update was infeasible against the current domain state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("domain update on {variable:?} is infeasible")]
pub struct DomainConflict {
    pub variable: DomainVariable,
}

/// The trailed domain world: integer domains with bounds and holes, Boolean domains and set
/// domains (kernel within envelope). Every update is recorded with enough of the previous
/// state to restore the domains bit-for-bit when a decision level is undone.
///
/// The store also carries the `sat_trail_level` register used by the synchroniser: the SAT
/// decision level the domain world was last reconciled with, restored on backtracking like
/// any other trailed value.
#[derive(Default, Debug)]
pub struct DomainStore {
    integer_domains: KeyedVec<IntegerVariable, IntegerDomain>,
    boolean_domains: KeyedVec<BooleanVariable, Option<bool>>,
    set_domains: KeyedVec<SetVariable, SetDomain>,
    trail: Trail<DomainTrailEntry>,
    sat_trail_level: usize,
}

#[derive(Debug, Clone)]
struct IntegerDomain {
    lower_bound: i32,
    upper_bound: i32,
    /// Values strictly between the bounds that have been removed.
    holes: HashSet<i32>,
}

impl IntegerDomain {
    fn contains(&self, value: i32) -> bool {
        value >= self.lower_bound && value <= self.upper_bound && !self.holes.contains(&value)
    }
}

#[derive(Debug, Clone)]
struct SetDomain {
    kernel: HashSet<i32>,
    envelope: HashSet<i32>,
}

#[derive(Debug, Clone, Copy)]
struct DomainTrailEntry {
    operation: DomainOperation,
    #[allow(dead_code)] // kept for trail inspection when debugging
    cause: Cause,
}

#[derive(Debug, Clone, Copy)]
enum DomainOperation {
    IntegerLowerBound {
        variable: IntegerVariable,
        previous: i32,
    },
    IntegerUpperBound {
        variable: IntegerVariable,
        previous: i32,
    },
    IntegerHole {
        variable: IntegerVariable,
        value: i32,
    },
    BooleanAssignment {
        variable: BooleanVariable,
    },
    SetKernelInsertion {
        variable: SetVariable,
        value: i32,
    },
    SetEnvelopeRemoval {
        variable: SetVariable,
        value: i32,
    },
    SatTrailLevel {
        previous: usize,
    },
}

impl DomainStore {
    // ---------------------------------------------------------------------------------------
    // variable creation

    pub fn new_integer_variable(&mut self, lower_bound: i32, upper_bound: i32) -> IntegerVariable {
        acorn_assert_simple!(lower_bound <= upper_bound, "inconsistent initial bounds");
        self.integer_domains.push(IntegerDomain {
            lower_bound,
            upper_bound,
            holes: HashSet::default(),
        })
    }

    pub fn new_boolean_variable(&mut self) -> BooleanVariable {
        self.boolean_domains.push(None)
    }

    pub fn new_set_variable(&mut self, candidate_values: impl IntoIterator<Item = i32>) -> SetVariable {
        self.set_domains.push(SetDomain {
            kernel: HashSet::default(),
            envelope: candidate_values.into_iter().collect(),
        })
    }

    // ---------------------------------------------------------------------------------------
    // queries

    pub fn lower_bound(&self, variable: IntegerVariable) -> i32 {
        self.integer_domains[variable].lower_bound
    }

    pub fn upper_bound(&self, variable: IntegerVariable) -> i32 {
        self.integer_domains[variable].upper_bound
    }

    pub fn contains(&self, variable: IntegerVariable, value: i32) -> bool {
        self.integer_domains[variable].contains(value)
    }

    pub fn is_instantiated(&self, variable: IntegerVariable) -> bool {
        self.lower_bound(variable) == self.upper_bound(variable)
    }

    pub fn assigned_value(&self, variable: IntegerVariable) -> i32 {
        acorn_assert_simple!(self.is_instantiated(variable));
        self.lower_bound(variable)
    }

    pub fn boolean_value(&self, variable: BooleanVariable) -> Option<bool> {
        self.boolean_domains[variable]
    }

    pub fn kernel_contains(&self, variable: SetVariable, value: i32) -> bool {
        self.set_domains[variable].kernel.contains(&value)
    }

    pub fn envelope_contains(&self, variable: SetVariable, value: i32) -> bool {
        self.set_domains[variable].envelope.contains(&value)
    }

    // ---------------------------------------------------------------------------------------
    // updates; each returns whether the domain changed

    pub fn tighten_lower_bound(
        &mut self,
        variable: IntegerVariable,
        new_lower_bound: i32,
        cause: Cause,
    ) -> Result<bool, DomainConflict> {
        let domain = &self.integer_domains[variable];
        if new_lower_bound <= domain.lower_bound {
            return Ok(false);
        }
        if new_lower_bound > domain.upper_bound {
            return Err(self.conflict_on(DomainVariable::Integer(variable)));
        }

        // Slide the bound up past removed values so the bounds stay tight.
        let mut bound = new_lower_bound;
        while bound <= domain.upper_bound && domain.holes.contains(&bound) {
            bound += 1;
        }
        if bound > domain.upper_bound {
            return Err(self.conflict_on(DomainVariable::Integer(variable)));
        }

        let previous = domain.lower_bound;
        self.integer_domains[variable].lower_bound = bound;
        self.trail.push(DomainTrailEntry {
            operation: DomainOperation::IntegerLowerBound { variable, previous },
            cause,
        });
        Ok(true)
    }

    pub fn tighten_upper_bound(
        &mut self,
        variable: IntegerVariable,
        new_upper_bound: i32,
        cause: Cause,
    ) -> Result<bool, DomainConflict> {
        let domain = &self.integer_domains[variable];
        if new_upper_bound >= domain.upper_bound {
            return Ok(false);
        }
        if new_upper_bound < domain.lower_bound {
            return Err(self.conflict_on(DomainVariable::Integer(variable)));
        }

        let mut bound = new_upper_bound;
        while bound >= domain.lower_bound && domain.holes.contains(&bound) {
            bound -= 1;
        }
        if bound < domain.lower_bound {
            return Err(self.conflict_on(DomainVariable::Integer(variable)));
        }

        let previous = domain.upper_bound;
        self.integer_domains[variable].upper_bound = bound;
        self.trail.push(DomainTrailEntry {
            operation: DomainOperation::IntegerUpperBound { variable, previous },
            cause,
        });
        Ok(true)
    }

    pub fn remove_value(
        &mut self,
        variable: IntegerVariable,
        value: i32,
        cause: Cause,
    ) -> Result<bool, DomainConflict> {
        let domain = &self.integer_domains[variable];
        if !domain.contains(value) {
            return Ok(false);
        }
        if domain.lower_bound == domain.upper_bound {
            // Removing the only remaining value wipes the domain out.
            return Err(self.conflict_on(DomainVariable::Integer(variable)));
        }

        if value == domain.lower_bound {
            return self.tighten_lower_bound(variable, value + 1, cause);
        }
        if value == domain.upper_bound {
            return self.tighten_upper_bound(variable, value - 1, cause);
        }

        let _ = self.integer_domains[variable].holes.insert(value);
        self.trail.push(DomainTrailEntry {
            operation: DomainOperation::IntegerHole { variable, value },
            cause,
        });
        Ok(true)
    }

    pub fn instantiate(
        &mut self,
        variable: IntegerVariable,
        value: i32,
        cause: Cause,
    ) -> Result<bool, DomainConflict> {
        if !self.contains(variable, value) {
            return Err(self.conflict_on(DomainVariable::Integer(variable)));
        }
        let raised = self.tighten_lower_bound(variable, value, cause)?;
        let lowered = self.tighten_upper_bound(variable, value, cause)?;
        Ok(raised || lowered)
    }

    pub fn instantiate_boolean(
        &mut self,
        variable: BooleanVariable,
        value: bool,
        cause: Cause,
    ) -> Result<bool, DomainConflict> {
        match self.boolean_domains[variable] {
            Some(current) if current == value => Ok(false),
            Some(_) => Err(self.conflict_on(DomainVariable::Boolean(variable))),
            None => {
                self.boolean_domains[variable] = Some(value);
                self.trail.push(DomainTrailEntry {
                    operation: DomainOperation::BooleanAssignment { variable },
                    cause,
                });
                Ok(true)
            }
        }
    }

    pub fn force_in_set(
        &mut self,
        variable: SetVariable,
        value: i32,
        cause: Cause,
    ) -> Result<bool, DomainConflict> {
        let domain = &self.set_domains[variable];
        if domain.kernel.contains(&value) {
            return Ok(false);
        }
        if !domain.envelope.contains(&value) {
            return Err(self.conflict_on(DomainVariable::Set(variable)));
        }

        let _ = self.set_domains[variable].kernel.insert(value);
        self.trail.push(DomainTrailEntry {
            operation: DomainOperation::SetKernelInsertion { variable, value },
            cause,
        });
        Ok(true)
    }

    pub fn remove_from_set(
        &mut self,
        variable: SetVariable,
        value: i32,
        cause: Cause,
    ) -> Result<bool, DomainConflict> {
        let domain = &self.set_domains[variable];
        if !domain.envelope.contains(&value) {
            return Ok(false);
        }
        if domain.kernel.contains(&value) {
            // A value in the kernel cannot leave the envelope.
            return Err(self.conflict_on(DomainVariable::Set(variable)));
        }

        let _ = self.set_domains[variable].envelope.remove(&value);
        self.trail.push(DomainTrailEntry {
            operation: DomainOperation::SetEnvelopeRemoval { variable, value },
            cause,
        });
        Ok(true)
    }

    fn conflict_on(&self, variable: DomainVariable) -> DomainConflict {
        DomainConflict { variable }
    }

    // ---------------------------------------------------------------------------------------
    // worlds

    pub fn increase_decision_level(&mut self) {
        self.trail.increase_decision_level();
    }

    pub fn get_decision_level(&self) -> usize {
        self.trail.get_decision_level()
    }

    /// Undoes every domain update above the given decision level, restoring the previous
    /// state exactly.
    pub fn synchronise(&mut self, new_decision_level: usize) {
        acorn_assert_simple!(new_decision_level < self.get_decision_level());

        let DomainStore {
            ref mut integer_domains,
            ref mut boolean_domains,
            ref mut set_domains,
            ref mut trail,
            ref mut sat_trail_level,
        } = *self;

        trail.synchronise(new_decision_level).for_each(|entry| {
            match entry.operation {
                DomainOperation::IntegerLowerBound { variable, previous } => {
                    integer_domains[variable].lower_bound = previous;
                }
                DomainOperation::IntegerUpperBound { variable, previous } => {
                    integer_domains[variable].upper_bound = previous;
                }
                DomainOperation::IntegerHole { variable, value } => {
                    let was_present = integer_domains[variable].holes.remove(&value);
                    acorn_assert_moderate!(was_present);
                }
                DomainOperation::BooleanAssignment { variable } => {
                    boolean_domains[variable] = None;
                }
                DomainOperation::SetKernelInsertion { variable, value } => {
                    let was_present = set_domains[variable].kernel.remove(&value);
                    acorn_assert_moderate!(was_present);
                }
                DomainOperation::SetEnvelopeRemoval { variable, value } => {
                    let was_absent = set_domains[variable].envelope.insert(value);
                    acorn_assert_moderate!(was_absent);
                }
                DomainOperation::SatTrailLevel { previous } => {
                    *sat_trail_level = previous;
                }
            }
        });
    }

    // ---------------------------------------------------------------------------------------
    // the SAT reconciliation register

    /// The SAT decision level the domain world was last reconciled with.
    pub fn sat_trail_level(&self) -> usize {
        self.sat_trail_level
    }

    /// Updates the reconciliation register, trailing the previous value so backtracking the
    /// domain world also rewinds the register.
    pub fn update_sat_trail_level(&mut self, new_level: usize, cause: Cause) {
        if new_level == self.sat_trail_level {
            return;
        }
        self.trail.push(DomainTrailEntry {
            operation: DomainOperation::SatTrailLevel {
                previous: self.sat_trail_level,
            },
            cause,
        });
        self.sat_trail_level = new_level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_a_bound_value_slides_the_bound_past_holes() {
        let mut store = DomainStore::default();
        let x = store.new_integer_variable(0, 5);

        assert!(store.remove_value(x, 1, Cause::Search).unwrap());
        assert!(store.remove_value(x, 0, Cause::Search).unwrap());

        // 0 is removed and 1 is a hole, so the lower bound jumps to 2.
        assert_eq!(store.lower_bound(x), 2);
        assert!(!store.contains(x, 1));
    }

    #[test]
    fn instantiation_to_a_removed_value_is_a_conflict() {
        let mut store = DomainStore::default();
        let x = store.new_integer_variable(0, 5);

        assert!(store.remove_value(x, 3, Cause::Search).unwrap());
        assert!(store.instantiate(x, 3, Cause::Search).is_err());

        // Other values are untouched by the failed update.
        assert!(store.contains(x, 2));
        assert!(store.contains(x, 4));
    }

    #[test]
    fn backtracking_restores_the_domain_exactly() {
        let mut store = DomainStore::default();
        let x = store.new_integer_variable(0, 9);
        let b = store.new_boolean_variable();
        let s = store.new_set_variable(1..=3);

        store.increase_decision_level();
        assert!(store.remove_value(x, 4, Cause::Search).unwrap());
        assert!(store.tighten_upper_bound(x, 7, Cause::Search).unwrap());
        assert!(store.instantiate_boolean(b, true, Cause::Search).unwrap());
        assert!(store.force_in_set(s, 2, Cause::Search).unwrap());
        assert!(store.remove_from_set(s, 3, Cause::Search).unwrap());

        store.synchronise(0);

        assert_eq!(store.lower_bound(x), 0);
        assert_eq!(store.upper_bound(x), 9);
        assert!(store.contains(x, 4));
        assert_eq!(store.boolean_value(b), None);
        assert!(!store.kernel_contains(s, 2));
        assert!(store.envelope_contains(s, 3));
    }

    #[test]
    fn wiping_out_a_domain_is_a_conflict() {
        let mut store = DomainStore::default();
        let x = store.new_integer_variable(3, 3);

        let result = store.remove_value(x, 3, Cause::Search);
        assert!(result.is_err());
    }

    #[test]
    fn kernel_values_cannot_leave_the_envelope() {
        let mut store = DomainStore::default();
        let s = store.new_set_variable(vec![1, 2]);

        assert!(store.force_in_set(s, 1, Cause::Search).unwrap());
        assert!(store.remove_from_set(s, 1, Cause::Search).is_err());
    }

    #[test]
    fn the_sat_trail_register_is_trailed() {
        let mut store = DomainStore::default();

        store.increase_decision_level();
        store.update_sat_trail_level(3, Cause::Channelling);
        assert_eq!(store.sat_trail_level(), 3);

        store.synchronise(0);
        assert_eq!(store.sat_trail_level(), 0);
    }
}
