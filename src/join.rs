//! [`Joiner`]: a [`Cogrouper`] that emits the Cartesian product of matched
//! rows, the relational-join half of "all binary series/frame operations
//! are driven by cogroup."

use crate::column::SKIP;
use crate::index::{CogroupRun, CogroupState, Cogrouper};

/// Which side(s) of an unmatched key still produce output rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Outer,
}

impl JoinKind {
    fn left_outer(self) -> bool {
        matches!(self, JoinKind::Left | JoinKind::Outer)
    }

    fn right_outer(self) -> bool {
        matches!(self, JoinKind::Right | JoinKind::Outer)
    }
}

/// Emits the Cartesian product of left x right rows for every matched key;
/// for an unmatched key, emits each row paired with [`SKIP`] only if
/// `kind` keeps that side's outer rows.
pub struct Joiner {
    pub kind: JoinKind,
}

impl Joiner {
    pub fn new(kind: JoinKind) -> Self {
        Self { kind }
    }
}

impl<K: Clone> Cogrouper<K> for Joiner {
    fn emit(&self, run: &CogroupRun<'_, K>, state: &mut CogroupState<K>) {
        let left = run.left_rows();
        let right = run.right_rows();

        if !left.is_empty() && !right.is_empty() {
            for &li in left {
                for &ri in right {
                    state.push(run.key().clone(), li, ri);
                }
            }
        } else if !left.is_empty() {
            if self.kind.left_outer() {
                for &li in left {
                    state.push(run.key().clone(), li, SKIP);
                }
            }
        } else if !right.is_empty() && self.kind.right_outer() {
            for &ri in right {
                state.push(run.key().clone(), SKIP, ri);
            }
        }
    }
}
