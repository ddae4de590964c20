//! Three-way array merge: diffs each side against the common base, filters
//! each side's operations against the other's per-element fate, then
//! replays the survivors (spec §4.7).

use ahash::AHashMap;

use crate::array_diff::{apply_array_diff, diff_array, ArrayDiff, ArrayDiffOp};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Fate {
    Untouched,
    Moved,
    Deleted,
}

fn fates<T>(diff: &ArrayDiff<T>, base_len: usize) -> Vec<Fate> {
    let mut fates = vec![Fate::Untouched; base_len];
    for op in &diff.ops {
        match op {
            ArrayDiffOp::DeleteElement(i) => fates[*i] = Fate::Deleted,
            ArrayDiffOp::MoveLeft { el_index, .. } | ArrayDiffOp::MoveRight { el_index, .. } => {
                fates[*el_index] = Fate::Moved;
            }
            _ => {}
        }
    }
    fates
}

/// Reorders ops so all moves come first, then deletions, then additions,
/// preserving relative order within each group (spec §4.7 step 2).
fn delay_deletions<T>(ops: Vec<ArrayDiffOp<T>>) -> Vec<ArrayDiffOp<T>> {
    let mut moves = Vec::with_capacity(ops.len());
    let mut deletes = Vec::new();
    let mut adds = Vec::new();
    for op in ops {
        match op {
            ArrayDiffOp::KeepElement(_) => {}
            ArrayDiffOp::DeleteElement(_) => deletes.push(op),
            ArrayDiffOp::AddElement { .. } => adds.push(op),
            ArrayDiffOp::MoveLeft { .. } | ArrayDiffOp::MoveRight { .. } => moves.push(op),
        }
    }
    moves.extend(deletes);
    moves.extend(adds);
    moves
}

#[allow(clippy::too_many_lines)]
fn filter_side<T>(
    ops: Vec<ArrayDiffOp<T>>,
    own_deltas: &AHashMap<usize, i64>,
    other_fates: &[Fate],
    other_deltas: &AHashMap<usize, i64>,
    is_mine: bool,
) -> (Vec<ArrayDiffOp<T>>, bool) {
    let mut dropped = false;
    let filtered = ops
        .into_iter()
        .filter(|op| {
            let keep = match op {
                ArrayDiffOp::AddElement { .. } | ArrayDiffOp::KeepElement(_) => true,
                ArrayDiffOp::DeleteElement(i) => match other_fates[*i] {
                    Fate::Untouched => true,
                    Fate::Deleted => is_mine,
                    Fate::Moved => false,
                },
                ArrayDiffOp::MoveLeft { el_index, .. } => {
                    let my_delta = own_deltas.get(el_index).copied().unwrap_or(0);
                    match other_fates[*el_index] {
                        Fate::Untouched | Fate::Deleted => true,
                        Fate::Moved => {
                            let other_delta = other_deltas.get(el_index).copied().unwrap_or(0);
                            if other_delta < 0 {
                                let my_mag = my_delta.unsigned_abs();
                                let other_mag = other_delta.unsigned_abs();
                                my_mag > other_mag || (my_mag == other_mag && is_mine)
                            } else {
                                true
                            }
                        }
                    }
                }
                ArrayDiffOp::MoveRight { el_index, .. } => {
                    let my_delta = own_deltas.get(el_index).copied().unwrap_or(0);
                    match other_fates[*el_index] {
                        Fate::Untouched | Fate::Deleted => true,
                        Fate::Moved => {
                            let other_delta = other_deltas.get(el_index).copied().unwrap_or(0);
                            if other_delta < 0 {
                                false
                            } else {
                                let my_mag = my_delta.unsigned_abs();
                                let other_mag = other_delta.unsigned_abs();
                                my_mag > other_mag || (my_mag == other_mag && is_mine)
                            }
                        }
                    }
                }
            };
            if !keep {
                dropped = true;
            }
            keep
        })
        .collect();
    (filtered, dropped)
}

/// The merged sequence plus whether any side's edit was dropped by the
/// filter rules (used by the scalar merge's array branch to decide
/// conflict status).
pub struct ArrayMergeResult<T> {
    pub merged: Vec<T>,
    pub had_conflict: bool,
}

/// Three-way-merges `mine` and `their` against `base` (spec §4.7).
pub fn three_way_merge_array_detailed<T, F>(base: &[T], mine: &[T], their: &[T], equals: F) -> ArrayMergeResult<T>
where
    T: Clone,
    F: Fn(&T, &T) -> bool + Copy,
{
    let mine_diff = diff_array(base, mine, equals);
    let their_diff = diff_array(base, their, equals);

    let mine_fates = fates(&mine_diff, base.len());
    let their_fates = fates(&their_diff, base.len());

    let (mine_ops, mine_dropped) = filter_side(
        delay_deletions(mine_diff.ops),
        &mine_diff.move_deltas,
        &their_fates,
        &their_diff.move_deltas,
        true,
    );
    let (their_ops, their_dropped) = filter_side(
        delay_deletions(their_diff.ops),
        &their_diff.move_deltas,
        &mine_fates,
        &mine_diff.move_deltas,
        false,
    );

    // Replay their's ops first so mine's anchorless inserts/moves land
    // closer to their final resting position — mine is the side applied
    // "on top".
    let combined: Vec<_> = their_ops.into_iter().chain(mine_ops).collect();
    let combined = delay_deletions(combined);
    let merged = apply_array_diff(base, &combined);

    ArrayMergeResult {
        merged,
        had_conflict: mine_dropped || their_dropped,
    }
}

/// Thin wrapper matching spec §6's `threeWayMergeArray(base, mine, their,
/// equalsFn?) → sequence`.
pub fn three_way_merge_array<T, F>(base: &[T], mine: &[T], their: &[T], equals: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T, &T) -> bool + Copy,
{
    three_way_merge_array_detailed(base, mine, their, equals).merged
}
