use crate::engine::domains::BooleanVariable;
use crate::engine::domains::Cause;
use crate::engine::domains::DomainConflict;
use crate::engine::domains::DomainStore;
use crate::engine::domains::DomainVariable;
use crate::engine::domains::IntegerVariable;
use crate::engine::domains::SetVariable;

/// Binds one predicate over one domain variable to one SAT variable.
///
/// Every kind implements a monotone mapping between the domain state and the truth value of
/// its literal: once the domain is decided enough to fix the truth value, the literaliser
/// "reacts" by producing the implied literal, and conversely an assigned literal is translated
/// back into the corresponding domain update. Literalisers are cached per (variable,
/// predicate) pair so the SAT variable they own is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Literaliser {
    /// `[b == true]`: the literal is the Boolean variable itself.
    BooleanEqualsValue { variable: BooleanVariable },
    /// `[x == c]`.
    IntegerEqualsConstant {
        variable: IntegerVariable,
        constant: i32,
    },
    /// `[x <= c]`.
    IntegerLessOrEqualConstant {
        variable: IntegerVariable,
        constant: i32,
    },
    /// `[v in s]`.
    SetContainsValue { variable: SetVariable, value: i32 },
}

impl Literaliser {
    pub fn domain_variable(&self) -> DomainVariable {
        match *self {
            Literaliser::BooleanEqualsValue { variable } => DomainVariable::Boolean(variable),
            Literaliser::IntegerEqualsConstant { variable, .. }
            | Literaliser::IntegerLessOrEqualConstant { variable, .. } => {
                DomainVariable::Integer(variable)
            }
            Literaliser::SetContainsValue { variable, .. } => DomainVariable::Set(variable),
        }
    }

    /// Whether literals of this literaliser can appear in learnt clauses without being
    /// expanded through their reasons first. Every current kind is materialised eagerly, so
    /// the channel is always directly explainable; a lazily materialised kind would return
    /// false here.
    pub fn is_directly_explainable(&self) -> bool {
        true
    }

    /// The truth value fixed by the current domain state, or `None` while the domain can
    /// still go either way.
    pub fn truth_value(&self, domains: &DomainStore) -> Option<bool> {
        match *self {
            Literaliser::BooleanEqualsValue { variable } => domains.boolean_value(variable),
            Literaliser::IntegerEqualsConstant { variable, constant } => {
                if !domains.contains(variable, constant) {
                    Some(false)
                } else if domains.is_instantiated(variable) {
                    Some(true)
                } else {
                    None
                }
            }
            Literaliser::IntegerLessOrEqualConstant { variable, constant } => {
                if domains.upper_bound(variable) <= constant {
                    Some(true)
                } else if domains.lower_bound(variable) > constant {
                    Some(false)
                } else {
                    None
                }
            }
            Literaliser::SetContainsValue { variable, value } => {
                if domains.kernel_contains(variable, value) {
                    Some(true)
                } else if !domains.envelope_contains(variable, value) {
                    Some(false)
                } else {
                    None
                }
            }
        }
    }

    /// True once the domain is decided enough to fix the truth value of the literal.
    pub fn can_react(&self, domains: &DomainStore) -> bool {
        self.truth_value(domains).is_some()
    }

    /// Applies the domain-side consequence of the literal with the given sign. Returns
    /// whether the domain changed; fails when the update is infeasible.
    pub fn to_event(
        &self,
        sign: bool,
        domains: &mut DomainStore,
        cause: Cause,
    ) -> Result<bool, DomainConflict> {
        match *self {
            Literaliser::BooleanEqualsValue { variable } => {
                domains.instantiate_boolean(variable, sign, cause)
            }
            Literaliser::IntegerEqualsConstant { variable, constant } => {
                if sign {
                    domains.instantiate(variable, constant, cause)
                } else {
                    domains.remove_value(variable, constant, cause)
                }
            }
            Literaliser::IntegerLessOrEqualConstant { variable, constant } => {
                if sign {
                    domains.tighten_upper_bound(variable, constant, cause)
                } else {
                    domains.tighten_lower_bound(variable, constant + 1, cause)
                }
            }
            Literaliser::SetContainsValue { variable, value } => {
                if sign {
                    domains.force_in_set(variable, value, cause)
                } else {
                    domains.remove_from_set(variable, value, cause)
                }
            }
        }
    }

    /// Side-effect-free entailment query: `Some(true)` when the predicate with the given sign
    /// is entailed by the current domain state, `Some(false)` when it is contradicted, `None`
    /// while undecided.
    pub fn check(&self, sign: bool, domains: &DomainStore) -> Option<bool> {
        self.truth_value(domains).map(|truth| truth == sign)
    }
}

impl std::fmt::Display for Literaliser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Literaliser::BooleanEqualsValue { variable } => write!(f, "[{variable} == true]"),
            Literaliser::IntegerEqualsConstant { variable, constant } => {
                write!(f, "[{variable} == {constant}]")
            }
            Literaliser::IntegerLessOrEqualConstant { variable, constant } => {
                write!(f, "[{variable} <= {constant}]")
            }
            Literaliser::SetContainsValue { variable, value } => {
                write!(f, "[{value} in {variable}]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_literaliser_reacts_to_instantiation_and_removal() {
        let mut domains = DomainStore::default();
        let x = domains.new_integer_variable(0, 2);
        let literaliser = Literaliser::IntegerEqualsConstant {
            variable: x,
            constant: 1,
        };

        assert!(!literaliser.can_react(&domains));

        let _ = domains.remove_value(x, 1, Cause::Search).unwrap();
        assert_eq!(literaliser.truth_value(&domains), Some(false));
        assert_eq!(literaliser.check(false, &domains), Some(true));
    }

    #[test]
    fn bound_literaliser_tracks_the_bounds() {
        let mut domains = DomainStore::default();
        let x = domains.new_integer_variable(0, 9);
        let literaliser = Literaliser::IntegerLessOrEqualConstant {
            variable: x,
            constant: 4,
        };

        assert_eq!(literaliser.truth_value(&domains), None);

        let _ = domains.tighten_upper_bound(x, 4, Cause::Search).unwrap();
        assert_eq!(literaliser.truth_value(&domains), Some(true));
        assert_eq!(literaliser.check(false, &domains), Some(false));
    }

    #[test]
    fn to_event_updates_the_bounds() {
        let mut domains = DomainStore::default();
        let x = domains.new_integer_variable(0, 9);
        let literaliser = Literaliser::IntegerLessOrEqualConstant {
            variable: x,
            constant: 4,
        };

        assert!(literaliser.to_event(false, &mut domains, Cause::Channelling).unwrap());
        assert_eq!(domains.lower_bound(x), 5);
    }

    #[test]
    fn set_membership_literaliser_follows_kernel_and_envelope() {
        let mut domains = DomainStore::default();
        let s = domains.new_set_variable(vec![1, 2, 3]);
        let literaliser = Literaliser::SetContainsValue {
            variable: s,
            value: 2,
        };

        assert_eq!(literaliser.truth_value(&domains), None);

        let _ = domains.force_in_set(s, 2, Cause::Search).unwrap();
        assert_eq!(literaliser.truth_value(&domains), Some(true));
    }
}
