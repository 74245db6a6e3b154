//! Fourth-down kicking branches: field-goal attempts and punts.

use crate::classifier::Boundary;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::field::FIELD_LENGTH;
use crate::outcome::PuntOutcome;
use crate::tables::{FieldGoalTable, PuntSamples};

/// Expected value of attempting a field goal from `yardline`.
///
/// Beyond `field_goal_range` the attempt is unviable. A miss gives the
/// opponent the ball at the kick spot, `miss_spot_offset` yards behind the
/// line of scrimmage.
pub fn field_goal_value(
    yardline: u8,
    table: &FieldGoalTable,
    boundary: &Boundary,
    config: &EngineConfig,
) -> Result<f64> {
    if yardline > config.field.field_goal_range {
        return Ok(config.unviable_value);
    }
    let make = table.make_probability(yardline);
    let kick_spot = yardline as i32 + config.field.miss_spot_offset as i32;
    let miss = if kick_spot < FIELD_LENGTH {
        boundary.opponent_first_down(FIELD_LENGTH - kick_spot)?
    } else {
        boundary.safety_against()
    };
    Ok(make * boundary.field_goal() + (1.0 - make) * miss)
}

/// Value of one recorded punt from `yardline`.
pub fn punt_sample_value(outcome: PuntOutcome, yardline: u8, boundary: &Boundary) -> Result<f64> {
    let yardline = yardline as i32;
    match outcome {
        PuntOutcome::Muffed { recovery } => boundary.own_first_down(yardline - recovery),
        PuntOutcome::ReturnTouchdown => Ok(boundary.touchdown_against()),
        PuntOutcome::Net(yards) => {
            let landing = yardline - yards;
            if landing <= 0 {
                // Into the end zone
                return Ok(-boundary.exchange.touchback);
            }
            boundary.opponent_first_down(FIELD_LENGTH - landing)
        }
    }
}

/// Average value over every punt recorded from `yardline`; unviable when
/// punting from there was never observed.
pub fn punt_value(
    yardline: u8,
    punts: &PuntSamples,
    boundary: &Boundary,
    config: &EngineConfig,
) -> Result<f64> {
    let samples = punts.samples(yardline);
    if samples.is_empty() {
        return Ok(config.unviable_value);
    }
    let mut total = 0.0;
    for &code in samples {
        let outcome = PuntOutcome::decode(code, &config.codes);
        total += punt_sample_value(outcome, yardline, boundary)?;
    }
    Ok(total / samples.len() as f64)
}
