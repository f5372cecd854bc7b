//! Per-variable definition/use sequence index.
//!
//! For every variable the graph builder records an ordered sequence of
//! events mirroring the structure of control flow: leaves for plain blocks,
//! alternatives for branch constructs, groups for the arms inside them and
//! repetitions for loop bodies. The sequence reads in execution order.

use rustc_hash::FxHashMap;

/// What a block does to a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuKind {
    /// The block writes the variable.
    Define,
    /// The block reads the variable.
    Use,
    /// The block both writes and reads the variable.
    DefineAndUse,
}

/// One event in a variable's sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum DuStep {
    /// A define/use at the node with the given id.
    Leaf(usize, DuKind),
    /// Exactly one of the contained arms executes (if/else, switch).
    Alternative(Vec<DuStep>),
    /// The events of one arm, in order.
    Group(Vec<DuStep>),
    /// The contained events execute zero or more times (loop body).
    Repetition(Vec<DuStep>),
}

/// The definition/use sequences of every variable touched so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuPaths {
    /// Variable name to its event sequence, earliest event first.
    pub paths: FxHashMap<String, Vec<DuStep>>,
}

impl DuPaths {
    /// Builds the index of a single node from its define and use lists.
    ///
    /// Duplicate mentions collapse; a variable both defined and used by the
    /// node gets one combined leaf.
    #[must_use]
    pub fn from_node(id: usize, defines: &[String], uses: &[String]) -> Self {
        let mut paths: FxHashMap<String, Vec<DuStep>> = FxHashMap::default();
        for name in defines {
            paths
                .entry(name.clone())
                .or_insert_with(|| vec![DuStep::Leaf(id, DuKind::Define)]);
        }
        for name in uses {
            let steps = paths.entry(name.clone()).or_default();
            match steps.first_mut() {
                Some(DuStep::Leaf(_, kind @ DuKind::Define)) => {
                    *kind = DuKind::DefineAndUse;
                }
                Some(_) => {}
                None => steps.push(DuStep::Leaf(id, DuKind::Use)),
            }
        }
        Self { paths }
    }

    /// Sequential composition: this index's events, then `later`'s.
    #[must_use]
    pub fn then(mut self, later: Self) -> Self {
        for (name, mut steps) in later.paths {
            self.paths.entry(name).or_default().append(&mut steps);
        }
        self
    }

    /// Appends one arm's events as a [`DuStep::Group`] per variable.
    pub fn push_clause(&mut self, clause: Self) {
        for (name, steps) in clause.paths {
            if steps.is_empty() {
                continue;
            }
            self.paths.entry(name).or_default().push(DuStep::Group(steps));
        }
    }

    /// Like [`push_clause`](Self::push_clause), but the arm goes first.
    /// Used when arms are visited in reverse source order.
    pub fn push_clause_front(&mut self, clause: Self) {
        for (name, steps) in clause.paths {
            if steps.is_empty() {
                continue;
            }
            self.paths
                .entry(name)
                .or_default()
                .insert(0, DuStep::Group(steps));
        }
    }

    /// Collapses each variable's events into a single
    /// [`DuStep::Alternative`].
    #[must_use]
    pub fn into_alternative(self) -> Self {
        self.wrap(DuStep::Alternative)
    }

    /// Collapses each variable's events into a single
    /// [`DuStep::Repetition`].
    #[must_use]
    pub fn into_repetition(self) -> Self {
        self.wrap(DuStep::Repetition)
    }

    fn wrap(mut self, make: fn(Vec<DuStep>) -> DuStep) -> Self {
        for steps in self.paths.values_mut() {
            if steps.is_empty() {
                continue;
            }
            let inner = std::mem::take(steps);
            steps.push(make(inner));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn define_and_use_collapse_to_one_leaf() {
        let du = DuPaths::from_node(3, &names(&["x"]), &names(&["x", "y"]));
        assert_eq!(du.paths["x"], vec![DuStep::Leaf(3, DuKind::DefineAndUse)]);
        assert_eq!(du.paths["y"], vec![DuStep::Leaf(3, DuKind::Use)]);
    }

    #[test]
    fn duplicate_uses_collapse() {
        let du = DuPaths::from_node(2, &[], &names(&["x", "x", "x"]));
        assert_eq!(du.paths["x"], vec![DuStep::Leaf(2, DuKind::Use)]);
    }

    #[test]
    fn then_appends_in_order() {
        let first = DuPaths::from_node(2, &names(&["x"]), &[]);
        let second = DuPaths::from_node(3, &[], &names(&["x"]));
        let du = first.then(second);
        assert_eq!(
            du.paths["x"],
            vec![
                DuStep::Leaf(2, DuKind::Define),
                DuStep::Leaf(3, DuKind::Use),
            ]
        );
    }

    #[test]
    fn alternative_wraps_pushed_groups() {
        let mut arms = DuPaths::default();
        arms.push_clause(DuPaths::from_node(4, &names(&["y"]), &[]));
        arms.push_clause(DuPaths::from_node(5, &names(&["y"]), &[]));
        let du = arms.into_alternative();
        assert_eq!(
            du.paths["y"],
            vec![DuStep::Alternative(vec![
                DuStep::Group(vec![DuStep::Leaf(4, DuKind::Define)]),
                DuStep::Group(vec![DuStep::Leaf(5, DuKind::Define)]),
            ])]
        );
    }

    #[test]
    fn push_clause_front_reverses_arm_order() {
        let mut arms = DuPaths::default();
        arms.push_clause_front(DuPaths::from_node(6, &names(&["z"]), &[]));
        arms.push_clause_front(DuPaths::from_node(5, &names(&["z"]), &[]));
        let du = arms.into_alternative();
        let DuStep::Alternative(groups) = &du.paths["z"][0] else {
            panic!("expected alternative");
        };
        assert_eq!(
            groups[0],
            DuStep::Group(vec![DuStep::Leaf(5, DuKind::Define)])
        );
    }

    #[test]
    fn repetition_wraps_whole_sequence() {
        let body = DuPaths::from_node(3, &names(&["i"]), &names(&["i"]));
        let du = body.into_repetition();
        assert_eq!(
            du.paths["i"],
            vec![DuStep::Repetition(vec![DuStep::Leaf(
                3,
                DuKind::DefineAndUse
            )])]
        );
    }
}
