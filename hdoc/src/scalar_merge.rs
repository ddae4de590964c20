//! Scalar three-way merge (spec §4.6): one rule set per scalar type, plus a
//! whitespace-token string merge that reuses the array-merge machinery.

use hdoc_core::Scalar;

use crate::array_merge::three_way_merge_array_detailed;
use crate::conflict::InfoConflict;

/// Merges one scalar field. Returns the merged value and, if both sides
/// changed it incompatibly, the conflict that was recorded.
#[must_use]
pub fn merge_scalar(base: &Scalar, mine: &Scalar, their: &Scalar) -> (Scalar, Option<InfoConflict>) {
    if mine == their {
        return (mine.clone(), None);
    }
    if base == mine {
        return (their.clone(), None);
    }
    if base == their {
        return (mine.clone(), None);
    }

    match (base, mine, their) {
        (Scalar::Bool(_), Scalar::Bool(_), Scalar::Bool(_)) => (
            mine.clone(),
            Some(InfoConflict::new(base.clone(), mine.clone(), their.clone(), mine.clone())),
        ),
        (Scalar::Number(b), Scalar::Number(m), Scalar::Number(t)) => {
            let merged = merge_number(b, m, t);
            (
                Scalar::Number(merged.clone()),
                Some(InfoConflict::new(
                    base.clone(),
                    mine.clone(),
                    their.clone(),
                    Scalar::Number(merged),
                )),
            )
        }
        (Scalar::Date(b), Scalar::Date(m), Scalar::Date(t)) => {
            let merged = merge_date(*b, *m, *t);
            (
                Scalar::Date(merged),
                Some(InfoConflict::new(base.clone(), mine.clone(), their.clone(), Scalar::Date(merged))),
            )
        }
        (Scalar::String(b), Scalar::String(m), Scalar::String(t)) => {
            let (merged, had_conflict) = text3(b, m, t);
            if had_conflict {
                let picked = if m <= t { mine.clone() } else { their.clone() };
                (
                    picked.clone(),
                    Some(InfoConflict::new(base.clone(), mine.clone(), their.clone(), picked)),
                )
            } else {
                (Scalar::String(merged), None)
            }
        }
        (Scalar::Array(b), Scalar::Array(m), Scalar::Array(t)) => {
            let result = three_way_merge_array_detailed(b, m, t, |a, c| a == c);
            let merged = Scalar::Array(result.merged);
            let conflict = result
                .had_conflict
                .then(|| InfoConflict::new(base.clone(), mine.clone(), their.clone(), merged.clone()));
            (merged, conflict)
        }
        _ => {
            // Mismatched scalar shapes: fall back to the generic "other types" rule.
            let picked = pick_smaller(mine, their);
            (
                picked.clone(),
                Some(InfoConflict::new(base.clone(), mine.clone(), their.clone(), picked)),
            )
        }
    }
}

fn merge_number(base: &serde_json::Number, mine: &serde_json::Number, their: &serde_json::Number) -> serde_json::Number {
    let base_f = base.as_f64().unwrap_or(0.0);
    let mine_f = mine.as_f64().unwrap_or(0.0);
    let their_f = their.as_f64().unwrap_or(0.0);
    let mine_delta = (mine_f - base_f).abs();
    let their_delta = (their_f - base_f).abs();
    // The farther-from-base value wins; on a tie the smaller value wins.
    let winner = if mine_delta > their_delta {
        mine_f
    } else if their_delta > mine_delta {
        their_f
    } else if mine_f <= their_f {
        mine_f
    } else {
        their_f
    };
    serde_json::Number::from_f64(winner).unwrap_or_else(|| base.clone())
}

fn merge_date(base: i64, mine: i64, their: i64) -> i64 {
    let mine_delta = (mine - base).unsigned_abs();
    let their_delta = (their - base).unsigned_abs();
    if mine_delta > their_delta {
        mine
    } else if their_delta > mine_delta {
        their
    } else {
        mine.min(their)
    }
}

fn pick_smaller(mine: &Scalar, their: &Scalar) -> Scalar {
    let mine_repr = format!("{mine:?}");
    let their_repr = format!("{their:?}");
    if mine_repr <= their_repr {
        mine.clone()
    } else {
        their.clone()
    }
}

/// Three-way-merges a string by diffing whitespace-separated tokens against
/// `base` on each side and replaying the array-merge machinery over them
/// (spec §9: "Source duck typing"/string merge design note). Returns the
/// woven string and whether any region was genuinely contested.
fn text3(base: &str, mine: &str, their: &str) -> (String, bool) {
    let base_tokens: Vec<&str> = base.split_whitespace().collect();
    let mine_tokens: Vec<&str> = mine.split_whitespace().collect();
    let their_tokens: Vec<&str> = their.split_whitespace().collect();

    let result = three_way_merge_array_detailed(&base_tokens, &mine_tokens, &their_tokens, |a, b| a == b);
    (result.merged.join(" "), result.had_conflict)
}
