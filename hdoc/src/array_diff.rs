//! Longest-common-subsequence array diff: Keep/Delete/Move/Add op emission
//! and the reducer that replays those ops against a fresh copy of `base`.

use std::collections::VecDeque;

use ahash::AHashMap;

/// What happened to one element of `base` during a [`diff_array`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementChange {
    Kept,
    Moved,
    Deleted,
}

/// One operation in an array diff. Indices reference the *original*
/// positions in `base`, so the whole list can be replayed in order against a
/// fresh copy of `base` by [`apply_array_diff`].
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayDiffOp<T> {
    KeepElement(usize),
    DeleteElement(usize),
    /// Relocates `el_index` so it sits immediately after `after` (front of
    /// the sequence if `after` is `None`).
    MoveLeft { el_index: usize, after: Option<usize> },
    /// Relocates `el_index` so it sits immediately before `before` (back of
    /// the sequence if `before` is `None`).
    MoveRight { el_index: usize, before: Option<usize> },
    /// Inserts a brand new element immediately after `after` (front if
    /// `after` is `None`).
    AddElement { value: T, after: Option<usize> },
}

/// The result of [`diff_array`]: the op list plus a parallel per-base-element
/// change record, and the signed displacement (`target_rank - base_rank`,
/// among kept elements only) used by the three-way array merge to compare
/// move magnitudes.
#[derive(Clone, Debug)]
pub struct ArrayDiff<T> {
    pub ops: Vec<ArrayDiffOp<T>>,
    pub element_changes: Vec<ElementChange>,
    pub move_deltas: AHashMap<usize, i64>,
}

/// Diffs `base` against `later` under `equals`, producing ops that transform
/// a fresh copy of `base` into `later` (spec §4.5).
pub fn diff_array<T, F>(base: &[T], later: &[T], equals: F) -> ArrayDiff<T>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let n = base.len();
    let m = later.len();
    let mut later_used = vec![false; m];
    let mut match_of_base: Vec<Option<usize>> = vec![None; n];
    for (i, b) in base.iter().enumerate() {
        if let Some(j) = (0..m).find(|&j| !later_used[j] && equals(b, &later[j])) {
            later_used[j] = true;
            match_of_base[i] = Some(j);
        }
    }

    let mut element_changes = vec![ElementChange::Deleted; n];
    let mut ops = Vec::with_capacity(n);
    for i in 0..n {
        if match_of_base[i].is_some() {
            ops.push(ArrayDiffOp::KeepElement(i));
            element_changes[i] = ElementChange::Kept;
        } else {
            ops.push(ArrayDiffOp::DeleteElement(i));
        }
    }

    let kept: Vec<(usize, usize)> = (0..n).filter_map(|i| match_of_base[i].map(|j| (i, j))).collect();
    let mut rank_order: Vec<usize> = (0..kept.len()).collect();
    rank_order.sort_by_key(|&k| kept[k].1);
    let mut target_rank = vec![0usize; kept.len()];
    for (rank, &k) in rank_order.iter().enumerate() {
        target_rank[k] = rank;
    }

    let mut move_deltas = AHashMap::default();
    for (kept_idx, &(base_idx, _)) in kept.iter().enumerate() {
        let delta = target_rank[kept_idx] as i64 - kept_idx as i64;
        if delta != 0 {
            move_deltas.insert(base_idx, delta);
        }
    }

    let move_ops = reorder_kept(&kept, &target_rank, &mut element_changes);
    ops.extend(move_ops);

    let mut later_to_base: Vec<Option<usize>> = vec![None; m];
    for &(base_idx, later_idx) in &kept {
        later_to_base[later_idx] = Some(base_idx);
    }
    let mut next_synthetic_id = n;
    let mut last_identity: Option<usize> = None;
    for j in 0..m {
        match later_to_base[j] {
            Some(base_idx) => last_identity = Some(base_idx),
            None => {
                ops.push(ArrayDiffOp::AddElement {
                    value: later[j].clone(),
                    after: last_identity,
                });
                last_identity = Some(next_synthetic_id);
                next_synthetic_id += 1;
            }
        }
    }

    ArrayDiff {
        ops,
        element_changes,
        move_deltas,
    }
}

/// Reorders the kept elements (given in base order, tagged with their rank
/// in `later`'s order) into a sequence of Move ops (spec §4.5 step 2).
///
/// At each step, among the two not-yet-fixed target ranks (the next slot
/// owed at the left edge and the next owed at the right edge), the one whose
/// current holder sits farther from the edge it must reach is resolved
/// first; ties favor the left edge (`MoveLeft`).
fn reorder_kept<T>(
    kept: &[(usize, usize)],
    target_rank: &[usize],
    element_changes: &mut [ElementChange],
) -> Vec<ArrayDiffOp<T>> {
    let k = kept.len();
    let mut ops = Vec::new();
    if k == 0 {
        return ops;
    }

    let mut window: VecDeque<usize> = (0..k).collect();
    let mut left_fixed = 0usize;
    let mut right_fixed = 0usize;
    let mut left_anchor: Option<usize> = None;
    let mut right_anchor: Option<usize> = None;

    loop {
        loop {
            let mut trimmed = false;
            if let Some(&front) = window.front() {
                if target_rank[front] == left_fixed {
                    window.pop_front();
                    left_anchor = Some(kept[front].0);
                    left_fixed += 1;
                    trimmed = true;
                }
            }
            if !window.is_empty() {
                if let Some(&back) = window.back() {
                    if target_rank[back] == k - 1 - right_fixed {
                        window.pop_back();
                        right_anchor = Some(kept[back].0);
                        right_fixed += 1;
                        trimmed = true;
                    }
                }
            }
            if !trimmed {
                break;
            }
        }
        if window.is_empty() {
            break;
        }

        let left_target = left_fixed;
        let right_target = k - 1 - right_fixed;
        let left_pos = window.iter().position(|&idx| target_rank[idx] == left_target).expect("permutation");
        let right_pos = window.iter().position(|&idx| target_rank[idx] == right_target).expect("permutation");
        let delta_left = left_pos;
        let delta_right = window.len() - 1 - right_pos;

        if delta_left >= delta_right {
            let kept_idx = window.remove(left_pos).expect("position in bounds");
            let base_idx = kept[kept_idx].0;
            ops.push(ArrayDiffOp::MoveLeft {
                el_index: base_idx,
                after: left_anchor,
            });
            element_changes[base_idx] = ElementChange::Moved;
            left_anchor = Some(base_idx);
            left_fixed += 1;
        } else {
            let kept_idx = window.remove(right_pos).expect("position in bounds");
            let base_idx = kept[kept_idx].0;
            ops.push(ArrayDiffOp::MoveRight {
                el_index: base_idx,
                before: right_anchor,
            });
            element_changes[base_idx] = ElementChange::Moved;
            right_anchor = Some(base_idx);
            right_fixed += 1;
        }
    }

    ops
}

/// Replays `ops` against `base`, producing the sequence the diff was taken
/// against (spec §4.5 `applyArrayDiff`).
pub fn apply_array_diff<T: Clone>(base: &[T], ops: &[ArrayDiffOp<T>]) -> Vec<T> {
    let mut working: Vec<(usize, T)> = base.iter().cloned().enumerate().collect();
    let mut next_synthetic_id = base.len();

    let pos_of = |working: &[(usize, T)], id: usize| working.iter().position(|(i, _)| *i == id);

    for op in ops {
        match op {
            ArrayDiffOp::KeepElement(_) => {}
            ArrayDiffOp::DeleteElement(i) => {
                if let Some(pos) = pos_of(&working, *i) {
                    working.remove(pos);
                }
            }
            ArrayDiffOp::MoveLeft { el_index, after } => {
                if let Some(pos) = pos_of(&working, *el_index) {
                    let item = working.remove(pos);
                    let insert_at = match after {
                        Some(a) => pos_of(&working, *a).map_or(working.len(), |p| p + 1),
                        None => 0,
                    };
                    working.insert(insert_at, item);
                }
            }
            ArrayDiffOp::MoveRight { el_index, before } => {
                if let Some(pos) = pos_of(&working, *el_index) {
                    let item = working.remove(pos);
                    let insert_at = match before {
                        Some(b) => pos_of(&working, *b).unwrap_or(working.len()),
                        None => working.len(),
                    };
                    working.insert(insert_at, item);
                }
            }
            ArrayDiffOp::AddElement { value, after } => {
                let id = next_synthetic_id;
                next_synthetic_id += 1;
                let insert_at = match after {
                    Some(a) => pos_of(&working, *a).map_or(working.len(), |p| p + 1),
                    None => 0,
                };
                working.insert(insert_at, (id, value.clone()));
            }
        }
    }

    working.into_iter().map(|(_, v)| v).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(a: &char, b: &char) -> bool {
        a == b
    }

    fn roundtrip(base: &[char], later: &[char]) {
        let diff = diff_array(base, later, eq);
        let applied = apply_array_diff(base, &diff.ops);
        assert_eq!(applied, later);
    }

    #[test]
    fn empty_arrays_diff_to_empty_ops() {
        let diff: ArrayDiff<char> = diff_array(&[], &[], eq);
        assert!(diff.ops.is_empty());
    }

    #[test]
    fn identical_sequences_round_trip() {
        roundtrip(&['a', 'b', 'c'], &['a', 'b', 'c']);
    }

    #[test]
    fn permutation_emits_only_moves() {
        let base = ['a', 'b', 'c', 'd'];
        let later = ['d', 'a', 'c', 'b'];
        let diff = diff_array(&base, &later, eq);
        for op in &diff.ops {
            assert!(!matches!(op, ArrayDiffOp::AddElement { .. } | ArrayDiffOp::DeleteElement(_)));
        }
        roundtrip(&base, &later);
    }

    #[test]
    fn additions_and_deletions_round_trip() {
        roundtrip(&['a', 'b', 'c', 'd', 'e', 'f'], &['g', 'a', 'b', 'h', 'c', 'd', 'e', 'f']);
        roundtrip(&['a', 'b', 'c', 'd', 'e', 'f'], &['f', 'a', 'i', 'b', 'c', 'd', 'e', 'f']);
    }

    #[test]
    fn deleting_everything_round_trips_to_empty() {
        roundtrip(&['a', 'b', 'c'], &[]);
    }
}
