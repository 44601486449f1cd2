use std::iter::Rev;
use std::ops::Deref;
use std::vec::Drain;

use crate::acorn_assert_simple;

/// Chronological stack of values with decision-level delimiters.
///
/// Backtracking truncates the stack to the delimiter of the target level and hands the removed
/// entries back in reverse (LIFO) order so callers can undo per-entry bookkeeping.
#[derive(Clone, Debug)]
pub struct Trail<T> {
    current_decision_level: usize,
    /// At index `i` is the trail length at which decision level `i + 1` started.
    trail_delimiter: Vec<usize>,
    trail: Vec<T>,
}

impl<T> Default for Trail<T> {
    fn default() -> Self {
        Trail {
            current_decision_level: 0,
            trail_delimiter: Vec::default(),
            trail: Vec::default(),
        }
    }
}

impl<T> Trail<T> {
    pub fn increase_decision_level(&mut self) {
        self.current_decision_level += 1;
        self.trail_delimiter.push(self.trail.len());
    }

    pub fn get_decision_level(&self) -> usize {
        self.current_decision_level
    }

    /// The trail length at which the given decision level started.
    pub fn level_start(&self, decision_level: usize) -> usize {
        if decision_level == 0 {
            0
        } else {
            self.trail_delimiter[decision_level - 1]
        }
    }

    pub fn push(&mut self, elem: T) {
        self.trail.push(elem)
    }

    /// Removes all entries above the delimiter of `new_decision_level` and returns them in
    /// reverse chronological order.
    pub fn synchronise(&mut self, new_decision_level: usize) -> Rev<Drain<'_, T>> {
        acorn_assert_simple!(new_decision_level < self.current_decision_level);

        let new_trail_len = self.trail_delimiter[new_decision_level];

        self.current_decision_level = new_decision_level;
        self.trail_delimiter.truncate(new_decision_level);
        self.trail.drain(new_trail_len..).rev()
    }
}

impl<T> Deref for Trail<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.trail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushed_values_are_observed_through_indexing() {
        let mut trail = Trail::default();

        let expected = [1, 2, 3, 4];
        for &elem in expected.iter() {
            trail.push(elem);
        }

        assert_eq!(&expected, trail.deref());
    }

    #[test]
    fn backtracking_removes_elements_beyond_the_target_level() {
        let mut trail = Trail::default();

        trail.increase_decision_level();
        trail.push(1);
        let _ = trail.synchronise(0);

        assert!(trail.is_empty());
        assert_eq!(trail.get_decision_level(), 0);
    }

    #[test]
    fn backtracking_is_nonchronological() {
        let mut trail = Trail::default();
        trail.push(1);

        trail.increase_decision_level();
        trail.push(2);
        trail.increase_decision_level();
        trail.push(3);
        trail.increase_decision_level();
        trail.push(4);

        let _ = trail.synchronise(1);

        assert_eq!(&[1, 2], trail.deref());
    }

    #[test]
    fn removed_entries_are_handed_back_in_reverse_order() {
        let mut trail = Trail::default();
        trail.push(1);

        trail.increase_decision_level();
        trail.push(2);
        trail.increase_decision_level();
        trail.push(3);
        trail.push(4);

        let popped = trail.synchronise(0).collect::<Vec<_>>();
        assert_eq!(vec![4, 3, 2], popped);
    }

    #[test]
    fn level_starts_track_the_delimiters() {
        let mut trail = Trail::default();
        trail.push(1);
        trail.push(2);

        trail.increase_decision_level();
        trail.push(3);
        trail.increase_decision_level();

        assert_eq!(trail.level_start(0), 0);
        assert_eq!(trail.level_start(1), 2);
        assert_eq!(trail.level_start(2), 3);
    }
}
