//! Outcome Decoding
//!
//! Raw distribution values pack several outcome kinds into one integer:
//! turnovers sit in far-negative bands with the yards gained before the
//! change of possession as an offset, punt muffs sit above a positive
//! threshold. Codes are decoded here once, so downstream logic matches on
//! kinds instead of re-checking thresholds.

use crate::config::OutcomeCodes;

/// Turnover subtype, by encoding band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnoverKind {
    Interception,
    Fumble,
}

/// Decoded scrimmage-play outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Possession lost after the ball travelled `gain` yards toward the goal
    Turnover { kind: TurnoverKind, gain: i32 },
    /// Yards gained (negative for a loss)
    Yardage(i32),
}

impl PlayOutcome {
    pub fn decode(code: i32, codes: &OutcomeCodes) -> Self {
        if code < codes.interception_below {
            PlayOutcome::Turnover {
                kind: TurnoverKind::Interception,
                gain: code - codes.interception_base,
            }
        } else if code < codes.fumble_below {
            PlayOutcome::Turnover {
                kind: TurnoverKind::Fumble,
                gain: code - codes.fumble_base,
            }
        } else {
            PlayOutcome::Yardage(code)
        }
    }
}

/// Decoded punt outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuntOutcome {
    /// Receiving team muffed; kicking team recovered `recovery` yards downfield
    Muffed { recovery: i32 },
    /// Returned for a touchdown
    ReturnTouchdown,
    /// Net punt yards
    Net(i32),
}

impl PuntOutcome {
    pub fn decode(code: i32, codes: &OutcomeCodes) -> Self {
        if code > codes.muff_above {
            PuntOutcome::Muffed {
                recovery: code - codes.muff_above,
            }
        } else if code < codes.return_touchdown_below {
            PuntOutcome::ReturnTouchdown
        } else {
            PuntOutcome::Net(code)
        }
    }
}
