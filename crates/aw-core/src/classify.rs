//! Activity-state classification of trailing windows.

use serde::{Deserialize, Serialize};

use crate::schedule::PinnedThresholds;

/// The extreme override needs at least this many ceilings.
pub const MIN_LEVELS_FOR_EXTREME: usize = 4;

/// Per-index classification result.
///
/// `NoState` marks indices without enough history (warm-up); it is distinct
/// from the lowest computed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateCell {
    NoState,
    State { name: String, index: usize },
}

impl StateCell {
    pub fn index(&self) -> Option<usize> {
        match self {
            StateCell::NoState => None,
            StateCell::State { index, .. } => Some(*index),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            StateCell::NoState => None,
            StateCell::State { name, .. } => Some(name),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, StateCell::State { .. })
    }
}

impl Default for StateCell {
    fn default() -> Self {
        StateCell::NoState
    }
}

impl std::fmt::Display for StateCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateCell::NoState => write!(f, "-"),
            StateCell::State { name, .. } => write!(f, "{}", name),
        }
    }
}

/// Classifies windows against ceilings into `state_names`.
///
/// `state_names` must hold `thresholds.len() + 2` names: one per ceiling,
/// then the ceiling-case state, then the extreme state.
#[derive(Debug, Clone)]
pub struct StateClassifier<'a> {
    state_names: &'a [String],
    extreme_multiplier: f64,
}

impl<'a> StateClassifier<'a> {
    pub fn new(state_names: &'a [String], extreme_multiplier: f64) -> Self {
        Self {
            state_names,
            extreme_multiplier,
        }
    }

    /// Index of the state for `window` under `thresholds`.
    ///
    /// 1. Any value ≥ multiplier × the top ceiling (with at least four
    ///    ceilings) → the extreme state.
    /// 2. Else the first state whose ceiling every value is strictly below.
    /// 3. Else the second-to-last state.
    pub fn classify_index(&self, window: &[f64], thresholds: &[f64]) -> usize {
        let n_states = self.state_names.len();
        if thresholds.len() >= MIN_LEVELS_FOR_EXTREME {
            if let Some(&top) = thresholds.last() {
                let extreme = top * self.extreme_multiplier;
                if window.iter().any(|&v| v >= extreme) {
                    return n_states.saturating_sub(1);
                }
            }
        }

        thresholds
            .iter()
            .position(|&t| window.iter().all(|&v| v < t))
            .unwrap_or(n_states.saturating_sub(2))
    }

    pub fn classify(&self, window: &[f64], thresholds: &[f64]) -> StateCell {
        let index = self.classify_index(window, thresholds);
        StateCell::State {
            name: self.state_names.get(index).cloned().unwrap_or_default(),
            index,
        }
    }

    /// Classify every index of a series with trailing windows of `window`
    /// samples.
    ///
    /// For each step `i` in `start_idx..=len` with `i ≥ window`, the window
    /// is `values[i - window..i]`, the ceilings are those pinned at `i - 1`
    /// (the window's last sample), and the result is written at `i - 1`.
    /// Every other index stays [`StateCell::NoState`].
    pub fn classify_series(
        &self,
        values: &[f64],
        pinned: &PinnedThresholds,
        window: usize,
        start_idx: usize,
    ) -> Vec<StateCell> {
        let mut cells = vec![StateCell::NoState; values.len()];
        if window == 0 {
            return cells;
        }
        for i in start_idx.max(window)..=values.len() {
            if let Some(thresholds) = pinned.at(i - 1) {
                cells[i - 1] = self.classify(&values[i - window..i], thresholds.as_slice());
            }
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        [
            "Very Low",
            "Low",
            "Moderate",
            "High",
            "Very High",
            "Extreme High",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    const THRESHOLDS: [f64; 4] = [10.0, 20.0, 30.0, 40.0];

    #[test]
    fn test_all_low() {
        let n = names();
        let c = StateClassifier::new(&n, 3.0);
        let cell = c.classify(&[5.0, 5.0, 5.0], &THRESHOLDS);
        assert_eq!(
            cell,
            StateCell::State {
                name: "Very Low".into(),
                index: 0
            }
        );
    }

    #[test]
    fn test_single_breach_blocks_lower_states() {
        let n = names();
        let c = StateClassifier::new(&n, 3.0);
        assert_eq!(c.classify_index(&[5.0, 5.0, 25.0], &THRESHOLDS), 2);
        assert_eq!(c.classify_index(&[5.0, 5.0, 20.0], &THRESHOLDS), 2);
        assert_eq!(c.classify_index(&[5.0, 5.0, 19.9], &THRESHOLDS), 1);
    }

    #[test]
    fn test_no_ceiling_respected_is_very_high() {
        let n = names();
        let c = StateClassifier::new(&n, 3.0);
        let cell = c.classify(&[5.0, 5.0, 45.0], &THRESHOLDS);
        assert_eq!(cell.index(), Some(4));
        assert_eq!(cell.name(), Some("Very High"));
    }

    #[test]
    fn test_series_uses_thresholds_pinned_at_window_end() {
        use crate::fit::AdaptiveFitter;
        use crate::schedule::WindowSpec;

        // First span [0, 10) is fitted on ten 1s, the tail [10, 20) on
        // history that includes the 100s, so its ceilings are far higher.
        let mut values = vec![1.0; 10];
        values.extend(std::iter::repeat(100.0).take(10));
        let levels = [0.5, 0.6, 0.7, 0.8];
        let pinned = PinnedThresholds::build(
            &values,
            WindowSpec::new(10, 10, 1000),
            &levels,
            &AdaptiveFitter::new(usize::MAX),
        );
        assert_eq!(pinned.at(9).map(|t| t.as_slice()), Some(&[1.0; 4][..]));
        assert_eq!(
            pinned.at(10).map(|t| t.as_slice()),
            Some(&[50.5, 100.0, 100.0, 100.0][..])
        );

        let n = names();
        let c = StateClassifier::new(&n, 3.0);
        let cells = c.classify_series(&values, &pinned, 3, 10);

        // Window [9, 12) straddles the boundary. Against the first span's
        // ceilings of 1 it would be Extreme High; against the tail's
        // [50.5, 100, 100, 100] it is Very High.
        let window = &values[9..12];
        let early = pinned.at(9).map(|t| t.as_slice().to_vec()).unwrap();
        assert_eq!(c.classify_index(window, &early), 5);
        assert_eq!(cells[11].index(), Some(4));
        // Window [7, 10) ends inside the first span: all 1s, no ceiling above.
        assert_eq!(cells[9].index(), Some(4));
        assert_eq!(cells[8], StateCell::NoState);
    }

    #[test]
    fn test_extreme_override() {
        let n = names();
        let c = StateClassifier::new(&n, 3.0);
        assert_eq!(c.classify_index(&[1.0, 1.0, 120.0, 1.0], &THRESHOLDS), 5);
        assert_eq!(c.classify_index(&[1.0, 119.9], &THRESHOLDS), 4);
    }

    #[test]
    fn test_extreme_override_needs_four_levels() {
        let n: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        let c = StateClassifier::new(&n, 3.0);
        // Three ceilings: the spike only reaches the ceiling case.
        assert_eq!(c.classify_index(&[1.0, 1000.0], &[10.0, 20.0, 30.0]), 3);
    }

    #[test]
    fn test_nan_ceilings_fall_to_ceiling_case() {
        let n = names();
        let c = StateClassifier::new(&n, 3.0);
        let nan = [f64::NAN; 4];
        assert_eq!(c.classify_index(&[1.0], &nan), 4);
    }

    #[test]
    fn test_state_cell_serde() {
        let json = serde_json::to_string(&StateCell::NoState).unwrap();
        assert_eq!(json, r#"{"kind":"no_state"}"#);
        let cell = StateCell::State {
            name: "High".into(),
            index: 3,
        };
        let json = serde_json::to_string(&cell).unwrap();
        assert_eq!(json, r#"{"kind":"state","name":"High","index":3}"#);
        assert_eq!(cell.to_string(), "High");
    }
}
