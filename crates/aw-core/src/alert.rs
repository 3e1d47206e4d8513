//! Edge-triggered escalation alerts.

use crate::classify::StateCell;

/// True when `current` enters an elevated tier from a lower, computed one.
///
/// Both cells must be set; an unset predecessor never alerts.
pub fn is_alert(previous: &StateCell, current: &StateCell, min_state: usize) -> bool {
    match (previous.index(), current.index()) {
        (Some(prev), Some(cur)) => cur >= min_state && cur > prev,
        _ => false,
    }
}

/// Alert flag per index of one label's state sequence.
///
/// Index 0 never alerts.
pub fn alerts(cells: &[StateCell], min_state: usize) -> Vec<bool> {
    let mut flags = vec![false; cells.len()];
    for (i, pair) in cells.windows(2).enumerate() {
        flags[i + 1] = is_alert(&pair[0], &pair[1], min_state);
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(indices: &[Option<usize>]) -> Vec<StateCell> {
        indices
            .iter()
            .map(|i| match i {
                Some(index) => StateCell::State {
                    name: format!("s{}", index),
                    index: *index,
                },
                None => StateCell::NoState,
            })
            .collect()
    }

    #[test]
    fn test_edges_only() {
        let seq = cells(&[
            Some(1),
            Some(1),
            Some(2),
            Some(3),
            Some(4),
            Some(3),
            Some(4),
        ]);
        assert_eq!(
            alerts(&seq, 3),
            vec![false, false, false, true, true, false, true]
        );
    }

    #[test]
    fn test_sustained_high_alerts_once() {
        let seq = cells(&[Some(2), Some(3), Some(3), Some(3), Some(3)]);
        assert_eq!(alerts(&seq, 3), vec![false, true, false, false, false]);
    }

    #[test]
    fn test_unset_predecessor_blocks_alert() {
        let seq = cells(&[None, Some(4), Some(3), Some(4)]);
        assert_eq!(alerts(&seq, 3), vec![false, false, false, true]);
    }

    #[test]
    fn test_rise_below_min_state_is_quiet() {
        let seq = cells(&[Some(0), Some(1), Some(2)]);
        assert_eq!(alerts(&seq, 3), vec![false, false, false]);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(alerts(&[], 3).is_empty());
        assert_eq!(alerts(&cells(&[Some(5)]), 3), vec![false]);
    }
}
