// Positional reconciliation: turn one ordering into another with single-item moves

use std::fmt::Debug;
use tracing::{debug, warn};

/// Move `key` so it sits immediately before `before`, or at the tail when `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move<K> {
    pub key: K,
    pub before: Option<K>,
}

/// Compute the moves that turn `current` into `desired`.
///
/// Greedy left-to-right pass over `desired` against a shadow copy of
/// `current`. Items already in place are never moved, so at most one move is
/// emitted per key and an identical ordering yields no moves. Keys of
/// `current` that are not in `desired` are ignored; keys of `desired` missing
/// from `current` are skipped.
pub fn plan_moves<K>(desired: &[K], current: &[K]) -> Vec<Move<K>>
where
    K: Clone + PartialEq + Debug,
{
    let mut shadow: Vec<K> = current
        .iter()
        .filter(|k| desired.contains(k))
        .cloned()
        .collect();
    let mut moves = Vec::new();
    let mut placed = 0;

    for key in desired {
        let Some(at) = shadow.iter().position(|k| k == key) else {
            warn!("Cannot place {:?}: not present in current order", key);
            continue;
        };
        if at < placed {
            // Duplicate key in the desired order; it already has its slot
            continue;
        }
        if at == placed {
            placed += 1;
            continue;
        }

        let item = shadow.remove(at);
        let before = shadow.get(placed).cloned();
        shadow.insert(placed, item);
        debug!("Move {:?} before {:?}", key, before);
        moves.push(Move {
            key: key.clone(),
            before,
        });
        placed += 1;
    }

    moves
}

/// Reorder a live sequence to match `desired`, one move at a time.
///
/// `move_item(key, before)` is called for each planned move in order and the
/// first error stops the pass. Returns the number of moves applied.
pub fn reconcile<K, E, F>(desired: &[K], current: &[K], mut move_item: F) -> Result<usize, E>
where
    K: Clone + PartialEq + Debug,
    F: FnMut(&K, Option<&K>) -> Result<(), E>,
{
    let moves = plan_moves(desired, current);
    for m in &moves {
        move_item(&m.key, m.before.as_ref())?;
    }
    Ok(moves.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_order_needs_no_moves() {
        let order = vec!["A", "B", "C"];
        assert!(plan_moves(&order, &order).is_empty());
    }

    #[test]
    fn test_rotated_order() {
        let moves = plan_moves(&["A", "B", "C"], &["C", "A", "B"]);
        assert_eq!(
            moves,
            vec![
                Move { key: "A", before: Some("C") },
                Move { key: "B", before: Some("C") },
            ]
        );
    }

    #[test]
    fn test_missing_key_is_skipped() {
        let moves = plan_moves(&["X", "A", "B"], &["B", "A"]);
        assert_eq!(moves, vec![Move { key: "A", before: Some("B") }]);
    }

    #[test]
    fn test_extra_current_keys_are_ignored() {
        let moves = plan_moves(&["A", "B"], &["Z", "A", "Y", "B"]);
        assert!(moves.is_empty());
    }

    #[test]
    fn test_reconcile_stops_on_first_error() {
        let mut calls = 0;
        let result: Result<usize, String> =
            reconcile(&["A", "B", "C"], &["C", "B", "A"], |_, _| {
                calls += 1;
                Err("boom".to_string())
            });
        assert_eq!(result, Err("boom".to_string()));
        assert_eq!(calls, 1);
    }
}
