//! Field Model
//!
//! Game-state keys and the canonical enumeration of the state space.
//!
//! Yardline counts the yards the offense still has to travel: yardline 1 is
//! one yard from a touchdown, yardline 99 is the offense's own one-yard line.
//! A play that drives the yardline to 0 or below scores; one that drives it
//! to 100 or beyond is a safety.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{EngineError, Result};

/// Number of downs in a series
pub const MAX_DOWN: u8 = 4;

/// Distance ceiling used for bucketing long-yardage situations
pub const MAX_DISTANCE: u8 = 20;

/// Last playable yardline (own one-yard line)
pub const MAX_YARDLINE: u8 = 99;

/// Goal line to goal line
pub const FIELD_LENGTH: i32 = 100;

/// Distance for a fresh set of downs outside goal-to-go situations
pub const FIRST_DOWN_DISTANCE: u8 = 10;

/// Total slots in the dense state index (4 × 20 × 99)
pub const NUM_STATE_SLOTS: usize =
    MAX_DOWN as usize * MAX_DISTANCE as usize * MAX_YARDLINE as usize;

/// (down, distance-to-go, yardline) triple identifying one game state
///
/// Fields are read through accessors so every state outside this crate comes
/// from [`GameState::new`] or [`enumerate_states`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GameState {
    pub(crate) down: u8,
    pub(crate) distance: u8,
    pub(crate) yardline: u8,
}

impl GameState {
    /// Checked constructor; rejects states outside the enumerated domain.
    pub fn new(down: u8, distance: u8, yardline: u8) -> Result<Self> {
        let valid = (1..=MAX_DOWN).contains(&down)
            && (1..=MAX_DISTANCE).contains(&distance)
            && (1..=MAX_YARDLINE).contains(&yardline)
            && distance <= yardline;
        if !valid {
            return Err(EngineError::InvalidState {
                down,
                distance,
                yardline,
            });
        }
        Ok(Self {
            down,
            distance,
            yardline,
        })
    }

    pub fn down(&self) -> u8 {
        self.down
    }

    pub fn distance(&self) -> u8 {
        self.distance
    }

    pub fn yardline(&self) -> u8 {
        self.yardline
    }

    /// First down at `yardline`: 1st-and-10, or 1st-and-goal inside the 10.
    pub fn first_down_at(yardline: u8) -> Result<Self> {
        Self::new(1, FIRST_DOWN_DISTANCE.min(yardline), yardline)
    }

    pub fn down_distance(&self) -> DownDistance {
        DownDistance {
            down: self.down,
            distance: self.distance,
        }
    }

    pub fn is_fourth_down(&self) -> bool {
        self.down == MAX_DOWN
    }

    /// Slot in the dense state index
    #[inline]
    pub fn index(&self) -> usize {
        state_index(self.down, self.distance, self.yardline)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{} at {}", self.down, self.distance, self.yardline)
    }
}

/// Map (down, distance, yardline) to its dense index.
#[inline]
pub(crate) fn state_index(down: u8, distance: u8, yardline: u8) -> usize {
    ((down as usize - 1) * MAX_DISTANCE as usize + (distance as usize - 1))
        * MAX_YARDLINE as usize
        + (yardline as usize - 1)
}

/// "down-distance" key shared by the CDF and decision tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DownDistance {
    pub down: u8,
    pub distance: u8,
}

impl DownDistance {
    pub fn new(down: u8, distance: u8) -> Self {
        Self { down, distance }
    }
}

impl fmt::Display for DownDistance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.down, self.distance)
    }
}

impl FromStr for DownDistance {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || EngineError::InvalidKey(s.to_string());
        let (down, distance) = s.trim().split_once('-').ok_or_else(invalid)?;
        let down: u8 = down.parse().map_err(|_| invalid())?;
        let distance: u8 = distance.parse().map_err(|_| invalid())?;
        if !(1..=MAX_DOWN).contains(&down) || distance == 0 {
            return Err(invalid());
        }
        Ok(Self { down, distance })
    }
}

/// Every valid state in canonical order: down 4→1, yardline 1→99,
/// distance 1→20, skipping distance > yardline.
pub fn enumerate_states() -> impl Iterator<Item = GameState> {
    (1..=MAX_DOWN).rev().flat_map(|down| {
        (1..=MAX_YARDLINE).flat_map(move |yardline| {
            (1..=MAX_DISTANCE.min(yardline)).map(move |distance| GameState {
                down,
                distance,
                yardline,
            })
        })
    })
}
