//! [`Merger`]: a [`Cogrouper`] that aligns matched rows *positionally*
//! rather than by Cartesian product, the key distinction from [`Joiner`].

use crate::column::SKIP;
use crate::index::{CogroupRun, CogroupState, Cogrouper};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    Inner,
    Outer,
}

/// Aligns left and right rows of a matched key pair-wise by position:
/// `(l[i], r[i])` for `i` in `0..max(lcount, rcount)` under [`MergeKind::Outer`]
/// (padding the shorter side with [`SKIP`]), or `0..min(lcount, rcount)`
/// under [`MergeKind::Inner`]. An unmatched key under `Outer` still emits
/// its rows, each paired with `SKIP`.
pub struct Merger {
    pub kind: MergeKind,
}

impl Merger {
    pub fn new(kind: MergeKind) -> Self {
        Self { kind }
    }
}

impl<K: Clone> Cogrouper<K> for Merger {
    fn emit(&self, run: &CogroupRun<'_, K>, state: &mut CogroupState<K>) {
        let left = run.left_rows();
        let right = run.right_rows();

        match (left.is_empty(), right.is_empty()) {
            (false, false) => {
                let n = match self.kind {
                    MergeKind::Inner => left.len().min(right.len()),
                    MergeKind::Outer => left.len().max(right.len()),
                };
                for i in 0..n {
                    let li = left.get(i).copied().unwrap_or(SKIP);
                    let ri = right.get(i).copied().unwrap_or(SKIP);
                    state.push(run.key().clone(), li, ri);
                }
            }
            (false, true) => {
                if self.kind == MergeKind::Outer {
                    for &li in left {
                        state.push(run.key().clone(), li, SKIP);
                    }
                }
            }
            (true, false) => {
                if self.kind == MergeKind::Outer {
                    for &ri in right {
                        state.push(run.key().clone(), SKIP, ri);
                    }
                }
            }
            (true, true) => {}
        }
    }
}
