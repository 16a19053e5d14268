use formgraph_core::reconcile::{Move, plan_moves, reconcile};

/// Apply one move to a list the way a live form does.
fn apply(list: &mut Vec<char>, m: &Move<char>) {
    let from = list.iter().position(|k| *k == m.key).unwrap();
    let item = list.remove(from);
    let to = match m.before {
        Some(anchor) => list.iter().position(|k| *k == anchor).unwrap(),
        None => list.len(),
    };
    list.insert(to, item);
}

fn permutations(items: &[char]) -> Vec<Vec<char>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head);
            out.push(tail);
        }
    }
    out
}

// ============================================================================
// Examples
// ============================================================================

#[test]
fn test_rotation_needs_at_most_two_moves() {
    let desired = vec!['A', 'B', 'C'];
    let mut current = vec!['C', 'A', 'B'];

    let moves = plan_moves(&desired, &current);
    assert!(moves.len() <= 2);
    for m in &moves {
        apply(&mut current, m);
    }
    assert_eq!(current, desired);
}

#[test]
fn test_single_misplaced_item_moves_once() {
    let moves = plan_moves(&['A', 'B', 'C'], &['A', 'C', 'B']);
    assert_eq!(moves, vec![Move { key: 'B', before: Some('C') }]);

    let moves = plan_moves(&['B', 'A'], &['A', 'B']);
    assert_eq!(moves, vec![Move { key: 'B', before: Some('A') }]);
}

#[test]
fn test_duplicate_desired_key_is_placed_once() {
    let moves = plan_moves(&['B', 'A', 'B'], &['A', 'B']);
    assert_eq!(moves.len(), 1);
}

#[test]
fn test_reconcile_counts_applied_moves() {
    let mut live = vec!['C', 'B', 'A'];
    let desired = vec!['A', 'B', 'C'];
    let applied: Result<usize, String> = reconcile(&desired, &live.clone(), |key, before| {
        apply(
            &mut live,
            &Move {
                key: *key,
                before: before.copied(),
            },
        );
        Ok(())
    });
    assert_eq!(applied, Ok(2));
    assert_eq!(live, desired);
}

// ============================================================================
// Exhaustive properties
// ============================================================================

#[test]
fn test_every_permutation_reaches_desired_order() {
    for n in 1..=5 {
        let desired: Vec<char> = ('A'..='Z').take(n).collect();
        for start in permutations(&desired) {
            let mut current = start.clone();
            let moves = plan_moves(&desired, &current);

            assert!(moves.len() <= n, "{:?}: {} moves", start, moves.len());
            for m in &moves {
                apply(&mut current, m);
            }
            assert_eq!(current, desired, "starting from {:?}", start);
        }
    }
}

#[test]
fn test_never_moves_items_already_in_place() {
    let desired: Vec<char> = "ABCDE".chars().collect();
    for start in permutations(&desired) {
        let moves = plan_moves(&desired, &start);
        // The longest prefix already in place is never touched
        let in_place = desired
            .iter()
            .zip(&start)
            .take_while(|(d, s)| d == s)
            .count();
        for m in &moves {
            assert!(!desired[..in_place].contains(&m.key), "{:?} moved {}", start, m.key);
        }
    }
}

#[test]
fn test_identity_is_noop_for_every_size() {
    for n in 0..=6 {
        let order: Vec<char> = ('A'..='Z').take(n).collect();
        assert!(plan_moves(&order, &order).is_empty());
    }
}

#[test]
fn test_extra_live_items_keep_desired_relative_order() {
    let desired: Vec<char> = "ABCD".chars().collect();
    for start in permutations(&desired) {
        // Interleave items the table does not know about
        let mut current = vec!['x'];
        for (i, k) in start.iter().enumerate() {
            current.push(*k);
            if i % 2 == 0 {
                current.push(char::from(b'p' + i as u8));
            }
        }

        for m in plan_moves(&desired, &current) {
            apply(&mut current, &m);
        }
        let known: Vec<char> = current.iter().copied().filter(|c| desired.contains(c)).collect();
        assert_eq!(known, desired, "starting from {:?}", start);
    }
}
