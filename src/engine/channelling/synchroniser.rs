use std::collections::VecDeque;

use log::debug;

use super::ChannelInfo;
use super::Literaliser;
use super::LiteraliserId;
use crate::acorn_assert_moderate;
use crate::basic_types::HashMap;
use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::engine::domains::Cause;
use crate::engine::domains::DomainConflict;
use crate::engine::domains::DomainStore;
use crate::engine::domains::DomainVariable;
use crate::engine::sat::Reason;
use crate::engine::sat::SatOptions;
use crate::engine::sat::SatSolver;

/// A literaliser together with the SAT variable it owns.
#[derive(Debug, Clone, Copy)]
struct BoundLiteraliser {
    literaliser: Literaliser,
    sat_variable: PropositionalVariable,
}

/// Keeps the SAT engine and the domain world in lockstep.
///
/// Domain-side changes enter through [`SatDomainSynchroniser::bound`], which first reconciles
/// the SAT trail with the domain's backtracking position and then runs literal propagation and
/// domain updates to a fixpoint: every literal implied by a reacting literaliser is propagated
/// one step on the SAT side, and every literal assigned by that step is translated back into a
/// domain event whose variable re-enters the work queue. Deductions made before the domain
/// world exists are recorded and replayed later.
#[derive(Debug)]
pub struct SatDomainSynchroniser {
    sat: SatSolver,
    literalisers: KeyedVec<LiteraliserId, BoundLiteraliser>,
    binding_cache: HashMap<Literaliser, LiteraliserId>,
    domain_watchers: HashMap<DomainVariable, Vec<LiteraliserId>>,
    early_deductions: Vec<Literal>,
    /// Dynamically learnt clauses grouped by their leading literal, stored as sorted literal
    /// codes for the dominance check.
    learnt_registry: HashMap<Literal, Vec<Vec<u32>>>,
    queue: VecDeque<DomainVariable>,
}

impl Default for SatDomainSynchroniser {
    fn default() -> Self {
        SatDomainSynchroniser::new(SatOptions::default())
    }
}

impl SatDomainSynchroniser {
    pub fn new(options: SatOptions) -> SatDomainSynchroniser {
        SatDomainSynchroniser {
            sat: SatSolver::new(options),
            literalisers: KeyedVec::default(),
            binding_cache: HashMap::default(),
            domain_watchers: HashMap::default(),
            early_deductions: vec![],
            learnt_registry: HashMap::default(),
            queue: VecDeque::new(),
        }
    }

    pub fn sat(&self) -> &SatSolver {
        &self.sat
    }

    pub fn sat_mut(&mut self) -> &mut SatSolver {
        &mut self.sat
    }

    /// Binds a literaliser, creating its SAT variable on first sight; rebinding the same
    /// (variable, predicate) pair returns the existing SAT variable.
    pub fn bind(&mut self, literaliser: Literaliser) -> PropositionalVariable {
        if let Some(&id) = self.binding_cache.get(&literaliser) {
            return self.literalisers[id].sat_variable;
        }

        let id = LiteraliserId::create_from_index(self.literalisers.len());
        let sat_variable = self
            .sat
            .new_channelled_variable(ChannelInfo::new(id, literaliser.is_directly_explainable()));

        let pushed = self.literalisers.push(BoundLiteraliser {
            literaliser,
            sat_variable,
        });
        acorn_assert_moderate!(pushed == id);
        let _ = self.binding_cache.insert(literaliser, id);
        self.domain_watchers
            .entry(literaliser.domain_variable())
            .or_default()
            .push(id);

        sat_variable
    }

    /// Synchronises the engines after the given domain variable changed.
    ///
    /// The SAT trail is first cancelled back to the domain's reconciliation register (the
    /// domain world may have backtracked below the SAT trail since the last call). Then a
    /// breadth-first fixpoint loop translates domain states into literals and propagated
    /// literals back into domain events. A SAT-side conflict is surfaced as a domain
    /// contradiction by pushing the negated literal through its literaliser.
    pub fn bound(
        &mut self,
        variable: DomainVariable,
        domains: &mut DomainStore,
        cause: Cause,
    ) -> Result<(), DomainConflict> {
        if self.sat.trail_marker() > domains.sat_trail_level() {
            self.sat.cancel_until(domains.sat_trail_level());
        }

        self.queue.clear();
        self.queue.push_back(variable);

        while let Some(current) = self.queue.pop_front() {
            let Some(ids) = self.domain_watchers.get(&current) else {
                continue;
            };

            for id in ids.clone() {
                let bound_literaliser = self.literalisers[id];
                if !bound_literaliser.literaliser.can_react(domains) {
                    continue;
                }

                let truth = bound_literaliser
                    .literaliser
                    .truth_value(domains)
                    .unwrap();
                let implied = Literal::new(bound_literaliser.sat_variable, truth);
                if self.sat.assignments().is_literal_assigned_true(implied) {
                    continue;
                }

                if self.sat.propagate_one_literal(implied, Reason::Decision) {
                    domains.update_sat_trail_level(self.sat.trail_marker(), cause);
                    self.apply_touched_literals(domains, cause)?;
                } else {
                    debug!(
                        "channelling conflict on literal {implied} of {}",
                        bound_literaliser.literaliser
                    );
                    // The engines disagree; the negated literal's domain consequence raises
                    // the contradiction against the current domain state.
                    let _ = bound_literaliser
                        .literaliser
                        .to_event(!truth, domains, cause)?;
                    return Err(DomainConflict {
                        variable: bound_literaliser.literaliser.domain_variable(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Converts every literal assigned by the last propagation step back into a domain event,
    /// re-enqueueing the variables whose domains changed.
    fn apply_touched_literals(
        &mut self,
        domains: &mut DomainStore,
        cause: Cause,
    ) -> Result<(), DomainConflict> {
        let touched: Vec<Literal> = self.sat.touched_literals().collect();
        for literal in touched {
            let Some(channel) = self.sat.channel_info(literal.variable()) else {
                continue;
            };
            let reacting = self.literalisers[channel.literaliser()];
            let changed = reacting
                .literaliser
                .to_event(literal.is_positive(), domains, cause)?;
            if changed {
                self.queue.push_back(reacting.literaliser.domain_variable());
            }
        }
        Ok(())
    }

    /// Records the channelled literals that are fixed at the SAT root level, so they can be
    /// replayed into the domain world once it exists.
    pub fn store_early_deductions(&mut self) {
        self.early_deductions.clear();
        for index in 0..self.sat.assignments().num_trail_entries() {
            let literal = self.sat.assignments().get_trail_entry(index);
            if self.sat.assignments().is_literal_root_assignment(literal)
                && self.sat.channel_info(literal.variable()).is_some()
            {
                self.early_deductions.push(literal);
            }
        }
    }

    /// Replays the stored root-level deductions into the domain world.
    pub fn apply_early_deductions(
        &mut self,
        domains: &mut DomainStore,
        cause: Cause,
    ) -> Result<(), DomainConflict> {
        for index in 0..self.early_deductions.len() {
            let literal = self.early_deductions[index];
            let channel = self
                .sat
                .channel_info(literal.variable())
                .expect("early deductions are channelled literals");
            let reacting = self.literalisers[channel.literaliser()];
            let _ = reacting
                .literaliser
                .to_event(literal.is_positive(), domains, cause)?;
        }
        Ok(())
    }

    /// Injects a clause learnt by the outer search loop. A clause that is dominated by an
    /// already learnt clause with the same leading literal (an existing subset of it) is
    /// dropped. Returns `false` when the clause conflicts with the current assignment.
    pub fn learn_clause(&mut self, literals: Vec<Literal>) -> bool {
        if literals.is_empty() {
            return self.sat.add_learnt_clause_during_search(literals);
        }

        let key = literals[0];
        let mut sorted_codes: Vec<u32> =
            literals.iter().map(|literal| literal.to_code()).collect();
        sorted_codes.sort_unstable();
        sorted_codes.dedup();

        if let Some(existing_clauses) = self.learnt_registry.get(&key) {
            if existing_clauses
                .iter()
                .any(|existing| is_sorted_subset(existing, &sorted_codes))
            {
                return true;
            }
        }

        self.learnt_registry
            .entry(key)
            .or_default()
            .push(sorted_codes);
        self.sat.add_learnt_clause_during_search(literals)
    }

    /// Validity check for a dynamically learnt clause: the clause holds unless the current
    /// domain state falsifies every one of its literals.
    pub fn clause_entailed(&self, literals: &[Literal], domains: &DomainStore) -> bool {
        literals.iter().any(|&literal| {
            let value = match self.sat.channel_info(literal.variable()) {
                Some(channel) => self.literalisers[channel.literaliser()]
                    .literaliser
                    .check(literal.is_positive(), domains),
                None => self.sat.assignments().literal_value(literal),
            };
            value != Some(false)
        })
    }

    /// The explanation of the most recent channelling conflict, for the outer learning loop.
    pub fn explain_conflict(&mut self) -> Vec<Literal> {
        self.sat.explain_last_conflict()
    }
}

/// Both slices sorted ascending; checks `smaller ⊆ larger`.
fn is_sorted_subset(smaller: &[u32], larger: &[u32]) -> bool {
    let mut position = 0;
    for &element in smaller {
        loop {
            if position == larger.len() || larger[position] > element {
                return false;
            }
            if larger[position] == element {
                position += 1;
                break;
            }
            position += 1;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_subset_checks() {
        assert!(is_sorted_subset(&[1, 3], &[1, 2, 3]));
        assert!(is_sorted_subset(&[], &[1]));
        assert!(!is_sorted_subset(&[1, 4], &[1, 2, 3]));
        assert!(!is_sorted_subset(&[0], &[]));
    }

    #[test]
    fn binding_is_idempotent() {
        let mut synchroniser = SatDomainSynchroniser::default();
        let mut domains = DomainStore::default();
        let x = domains.new_integer_variable(0, 2);

        let literaliser = Literaliser::IntegerEqualsConstant {
            variable: x,
            constant: 1,
        };
        let first = synchroniser.bind(literaliser);
        let second = synchroniser.bind(literaliser);

        assert_eq!(first, second);
        assert!(synchroniser.sat().channel_info(first).is_some());
    }

    #[test]
    fn dominated_learnt_clauses_are_pruned() {
        let mut synchroniser = SatDomainSynchroniser::default();
        let a = Literal::new(synchroniser.sat_mut().new_variable(), true);
        let b = Literal::new(synchroniser.sat_mut().new_variable(), true);
        let c = Literal::new(synchroniser.sat_mut().new_variable(), true);

        assert!(synchroniser.learn_clause(vec![a, b]));
        let clauses_after_first = synchroniser.learnt_registry[&a].len();

        // Superset of an existing clause with the same leading literal: dropped.
        assert!(synchroniser.learn_clause(vec![a, b, c]));
        assert_eq!(synchroniser.learnt_registry[&a].len(), clauses_after_first);

        // Not dominated: a different combination is kept.
        assert!(synchroniser.learn_clause(vec![a, c]));
        assert_eq!(
            synchroniser.learnt_registry[&a].len(),
            clauses_after_first + 1
        );
    }
}
