//! Resolved value table and run statistics.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::field::{enumerate_states, GameState, NUM_STATE_SLOTS};
use crate::mixer::{Branch, BranchValues};

/// Final values of one state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateValue {
    pub branches: BranchValues,
    pub combined: f64,
    pub choice: Branch,
}

/// Resolution status of a state within one run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Slot {
    #[default]
    Unresolved,
    /// On the current recursion path
    InProgress,
    Resolved(StateValue),
}

/// Dense per-state table, indexed by [`GameState::index`]
#[derive(Debug, Clone)]
pub struct ResolvedTable {
    slots: Vec<Slot>,
}

impl Default for ResolvedTable {
    fn default() -> Self {
        Self {
            slots: vec![Slot::Unresolved; NUM_STATE_SLOTS],
        }
    }
}

impl ResolvedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, state: &GameState) -> Slot {
        self.slots[state.index()]
    }

    pub(crate) fn mark_in_progress(&mut self, state: &GameState) {
        self.slots[state.index()] = Slot::InProgress;
    }

    /// Drop an in-progress mark after a failed resolution
    pub(crate) fn reset(&mut self, state: &GameState) {
        self.slots[state.index()] = Slot::Unresolved;
    }

    pub(crate) fn store(&mut self, state: &GameState, value: StateValue) {
        self.slots[state.index()] = Slot::Resolved(value);
    }

    pub fn get(&self, state: &GameState) -> Option<&StateValue> {
        match &self.slots[state.index()] {
            Slot::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn resolved_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Resolved(_)))
            .count()
    }

    /// Resolved states in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = (GameState, &StateValue)> + '_ {
        enumerate_states().filter_map(move |s| self.get(&s).map(|v| (s, v)))
    }

    /// Output rows in enumeration order
    pub fn rows(&self) -> Vec<StateRow> {
        self.iter().map(|(s, v)| StateRow::new(s, v)).collect()
    }
}

/// One line of a value table, also the layout of prior tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRow {
    #[serde(rename = "Down")]
    pub down: u8,
    #[serde(rename = "Distance")]
    pub distance: u8,
    #[serde(rename = "Yardline")]
    pub yardline: u8,
    #[serde(rename = "Run_EP")]
    pub run_ep: f64,
    #[serde(rename = "Pass_EP")]
    pub pass_ep: f64,
    #[serde(rename = "Kick_EP")]
    pub kick_ep: f64,
    #[serde(rename = "Punt_EP")]
    pub punt_ep: f64,
    #[serde(rename = "EP")]
    pub ep: f64,
    #[serde(rename = "Opt_Choice")]
    pub opt_choice: u8,
}

impl StateRow {
    pub fn new(state: GameState, value: &StateValue) -> Self {
        let b = &value.branches;
        Self {
            down: state.down,
            distance: state.distance,
            yardline: state.yardline,
            run_ep: b.get(Branch::Run),
            pass_ep: b.get(Branch::Pass),
            kick_ep: b.get(Branch::Kick),
            punt_ep: b.get(Branch::Punt),
            ep: value.combined,
            opt_choice: value.choice.index() as u8,
        }
    }

    pub fn state(&self) -> Result<GameState> {
        GameState::new(self.down, self.distance, self.yardline)
    }

    pub fn choice(&self) -> Result<Branch> {
        Branch::from_index(self.opt_choice as usize).ok_or_else(|| {
            EngineError::InvalidConfig(format!("unknown choice index {}", self.opt_choice))
        })
    }
}

/// Counters collected during a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub resolved: usize,
    /// Continuations answered from the prior table because of a cycle
    pub cycle_fallbacks: usize,
    /// Continuation states visited while computing expectations
    pub continuations: usize,
    /// Resolved states per chosen branch
    pub choice_counts: [usize; 4],
}

impl RunStats {
    pub fn choice_count(&self, branch: Branch) -> usize {
        self.choice_counts[branch.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(combined: f64) -> StateValue {
        StateValue {
            branches: BranchValues::new(combined, combined - 1.0, -1000.0, -1000.0),
            combined,
            choice: Branch::Run,
        }
    }

    #[test]
    fn test_slot_lifecycle() {
        let mut table = ResolvedTable::new();
        let s = GameState::new(2, 7, 33).unwrap();
        assert_eq!(table.slot(&s), Slot::Unresolved);
        table.mark_in_progress(&s);
        assert_eq!(table.slot(&s), Slot::InProgress);
        assert!(table.get(&s).is_none());
        table.store(&s, value(1.5));
        assert_eq!(table.get(&s).map(|v| v.combined), Some(1.5));
        assert_eq!(table.resolved_count(), 1);
    }

    #[test]
    fn test_rows_follow_enumeration_order() {
        let mut table = ResolvedTable::new();
        let first = GameState::new(1, 10, 50).unwrap();
        let fourth = GameState::new(4, 1, 1).unwrap();
        table.store(&first, value(2.0));
        table.store(&fourth, value(6.0));

        let rows = table.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].state().unwrap(), fourth);
        assert_eq!(rows[1].state().unwrap(), first);
        assert_eq!(rows[1].ep, 2.0);
        assert_eq!(rows[1].pass_ep, 1.0);
        assert_eq!(rows[1].choice().unwrap(), Branch::Run);
    }
}
