use crate::acorn_assert_simple;
use crate::basic_types::ClauseReference;
use crate::basic_types::Literal;

/// A clause watching a literal, together with a cached blocker literal from the same clause.
/// If the blocker is already true the clause is satisfied and does not need to be inspected.
#[derive(Clone, Copy, Debug)]
pub struct Watcher {
    pub clause: ClauseReference,
    pub blocker: Literal,
}

/// For every literal, the clauses that must be re-examined when that literal becomes false.
///
/// A clause is registered under the negation of each of its first two literals; there are
/// exactly two watchers per attached clause until it is detached.
#[derive(Default, Debug)]
pub struct WatchList {
    watchers: Vec<Vec<Watcher>>,
}

impl WatchList {
    /// Makes room for the watch lists of a newly created variable, one per polarity.
    pub fn grow(&mut self) {
        self.watchers.push(vec![]);
        self.watchers.push(vec![]);
    }

    pub fn num_literals(&self) -> usize {
        self.watchers.len()
    }

    pub fn watchers(&self, literal: Literal) -> &[Watcher] {
        &self.watchers[literal]
    }

    pub fn attach_clause(&mut self, reference: ClauseReference, literals: &[Literal]) {
        acorn_assert_simple!(literals.len() >= 2);

        self.watchers[!literals[0]].push(Watcher {
            clause: reference,
            blocker: literals[1],
        });
        self.watchers[!literals[1]].push(Watcher {
            clause: reference,
            blocker: literals[0],
        });
    }

    pub fn detach_clause(&mut self, reference: ClauseReference, literals: &[Literal]) {
        acorn_assert_simple!(literals.len() >= 2);
        let remove_watcher = |watchers: &mut Vec<Watcher>| {
            let position = watchers
                .iter()
                .position(|watcher| watcher.clause == reference)
                .expect("a watcher of an attached clause must be present");
            let _ = watchers.swap_remove(position);
        };

        remove_watcher(&mut self.watchers[!literals[0]]);
        remove_watcher(&mut self.watchers[!literals[1]]);
    }
}

impl std::ops::Index<Literal> for WatchList {
    type Output = Vec<Watcher>;
    fn index(&self, literal: Literal) -> &Vec<Watcher> {
        &self.watchers[literal]
    }
}

impl std::ops::IndexMut<Literal> for WatchList {
    fn index_mut(&mut self, literal: Literal) -> &mut Vec<Watcher> {
        &mut self.watchers[literal]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::PropositionalVariable;
    use crate::containers::StorageKey;

    fn literal(index: u32) -> Literal {
        Literal::new(PropositionalVariable::new(index), true)
    }

    #[test]
    fn attaching_registers_two_watchers_under_the_negations() {
        let mut watch_list = WatchList::default();
        for _ in 0..3 {
            watch_list.grow();
        }

        let reference = ClauseReference::create_from_index(0);
        let literals = [literal(0), literal(1), literal(2)];
        watch_list.attach_clause(reference, &literals);

        assert_eq!(watch_list.watchers(!literal(0)).len(), 1);
        assert_eq!(watch_list.watchers(!literal(1)).len(), 1);
        assert!(watch_list.watchers(!literal(2)).is_empty());
        assert_eq!(watch_list.watchers(!literal(0))[0].blocker, literal(1));

        watch_list.detach_clause(reference, &literals);
        assert!(watch_list.watchers(!literal(0)).is_empty());
        assert!(watch_list.watchers(!literal(1)).is_empty());
    }
}
