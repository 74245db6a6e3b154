//! Outcome Classifier
//!
//! Turns one decoded play outcome into either a terminal point-value delta
//! for the offense or the continuation state the engine must resolve.
//!
//! Possession changes, scores and the end of a series are boundary
//! conditions: they are valued from the prior table, never from the live
//! engine.

use crate::config::{EngineConfig, KickoffModel, ScoringValues};
use crate::error::Result;
use crate::field::{GameState, FIELD_LENGTH, FIRST_DOWN_DISTANCE, MAX_DISTANCE, MAX_DOWN};
use crate::outcome::PlayOutcome;
use crate::tables::PriorTable;

/// Result of classifying one outcome
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification {
    /// Final point-value delta for the offense
    Terminal(f64),
    /// Possession continues in this state
    Continue(GameState),
}

/// Expected values handed to the receiving team by restarts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeValues {
    /// Kickoff after a touchdown or field goal
    pub kickoff: f64,
    /// Free kick after a safety
    pub safety_kickoff: f64,
    /// Ball placed at the touchback spot
    pub touchback: f64,
}

impl ExchangeValues {
    pub fn from_prior(prior: &PriorTable, config: &EngineConfig) -> Result<Self> {
        let field = &config.field;
        let kickoff = match config.kickoff {
            KickoffModel::Neutral => 0.0,
            KickoffModel::FromPrior => prior.first_down(field.kickoff_yardline)?,
        };
        Ok(Self {
            kickoff,
            safety_kickoff: prior.first_down(field.safety_kick_yardline)?,
            touchback: prior.first_down(field.touchback_yardline)?,
        })
    }
}

/// Values of the field's boundary conditions, from the offense's perspective
#[derive(Debug, Clone, Copy)]
pub struct Boundary<'a> {
    pub prior: &'a PriorTable,
    pub scoring: &'a ScoringValues,
    pub exchange: ExchangeValues,
}

impl<'a> Boundary<'a> {
    pub fn new(prior: &'a PriorTable, scoring: &'a ScoringValues, exchange: ExchangeValues) -> Self {
        Self {
            prior,
            scoring,
            exchange,
        }
    }

    /// Offense scores a touchdown and kicks off
    pub fn touchdown(&self) -> f64 {
        self.scoring.touchdown - self.exchange.kickoff
    }

    /// Offense kicks a field goal and kicks off
    pub fn field_goal(&self) -> f64 {
        self.scoring.field_goal - self.exchange.kickoff
    }

    /// Offense concedes a touchdown
    pub fn touchdown_against(&self) -> f64 {
        -self.touchdown()
    }

    /// Offense concedes a safety and free-kicks
    pub fn safety_against(&self) -> f64 {
        -self.scoring.safety - self.exchange.safety_kickoff
    }

    /// Offense keeps the ball with a first down at `yardline`
    pub fn own_first_down(&self, yardline: i32) -> Result<f64> {
        if yardline <= 0 {
            return Ok(self.touchdown());
        }
        if yardline >= FIELD_LENGTH {
            return Ok(self.safety_against());
        }
        self.prior.first_down(yardline as u8)
    }

    /// Opponent takes over with a first down `yardline` yards from scoring
    pub fn opponent_first_down(&self, yardline: i32) -> Result<f64> {
        if yardline >= FIELD_LENGTH {
            return Ok(-self.exchange.touchback);
        }
        if yardline <= 0 {
            return Ok(self.touchdown_against());
        }
        Ok(-self.prior.first_down(yardline as u8)?)
    }
}

/// Classify a decoded scrimmage-play outcome at `state`.
pub fn classify_play(
    outcome: PlayOutcome,
    state: &GameState,
    boundary: &Boundary,
) -> Result<Classification> {
    let yardline = state.yardline as i32;
    match outcome {
        PlayOutcome::Turnover { gain, .. } => {
            let opponent_yardline = FIELD_LENGTH - (yardline - gain);
            Ok(Classification::Terminal(
                boundary.opponent_first_down(opponent_yardline)?,
            ))
        }
        PlayOutcome::Yardage(gain) => classify_yardage(gain, state, boundary),
    }
}

fn classify_yardage(gain: i32, state: &GameState, boundary: &Boundary) -> Result<Classification> {
    let new_yardline = state.yardline as i32 - gain;
    if new_yardline <= 0 {
        return Ok(Classification::Terminal(boundary.touchdown()));
    }
    if new_yardline >= FIELD_LENGTH {
        return Ok(Classification::Terminal(boundary.safety_against()));
    }

    let mut new_down = state.down as i32 + 1;
    let mut new_distance = state.distance as i32 - gain;
    if new_distance <= 0 {
        new_down = 1;
        new_distance = (FIRST_DOWN_DISTANCE as i32).min(new_yardline);
    } else if new_down > MAX_DOWN as i32 {
        // Turnover on downs
        return Ok(Classification::Terminal(
            boundary.opponent_first_down(FIELD_LENGTH - new_yardline)?,
        ));
    }

    if new_distance > new_yardline {
        return Ok(Classification::Terminal(0.0));
    }
    let new_distance = new_distance.min(MAX_DISTANCE as i32);

    Ok(Classification::Continue(GameState::new(
        new_down as u8,
        new_distance as u8,
        new_yardline as u8,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::TurnoverKind;

    /// Linear prior: a first down at yardline y is worth 6 - 0.09y
    fn linear_prior() -> PriorTable {
        crate::field::enumerate_states()
            .map(|s| (s, 6.0 - 0.09 * s.yardline as f64))
            .collect()
    }

    fn boundary<'a>(prior: &'a PriorTable, scoring: &'a ScoringValues) -> Boundary<'a> {
        let exchange = ExchangeValues::from_prior(prior, &EngineConfig::default()).unwrap();
        Boundary::new(prior, scoring, exchange)
    }

    fn state(down: u8, distance: u8, yardline: u8) -> GameState {
        GameState::new(down, distance, yardline).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_exchange_values_from_prior() {
        let prior = linear_prior();
        let neutral = ExchangeValues::from_prior(&prior, &EngineConfig::default()).unwrap();
        assert_eq!(neutral.kickoff, 0.0);
        assert!(close(neutral.safety_kickoff, 6.0 - 0.09 * 70.0));
        assert!(close(neutral.touchback, 6.0 - 0.09 * 80.0));

        let adjusted = ExchangeValues::from_prior(&prior, &EngineConfig::kickoff_adjusted()).unwrap();
        assert!(close(adjusted.kickoff, 6.0 - 0.09 * 70.0));
    }

    #[test]
    fn test_scores_net_of_kickoff_from_prior() {
        let (prior, scoring) = (linear_prior(), ScoringValues::default());
        let config = EngineConfig::kickoff_adjusted();
        let exchange = ExchangeValues::from_prior(&prior, &config).unwrap();
        let b = Boundary::new(&prior, &scoring, exchange);
        let kickoff = 6.0 - 0.09 * 70.0;

        assert!(close(b.touchdown(), 6.945 - kickoff));
        assert!(close(b.field_goal(), 3.0 - kickoff));
        assert!(close(b.touchdown_against(), -(6.945 - kickoff)));
        assert!(close(b.safety_against(), -2.0 - kickoff));

        match classify_play(PlayOutcome::Yardage(99), &state(1, 10, 50), &b).unwrap() {
            Classification::Terminal(v) => assert!(close(v, 6.945 - kickoff)),
            other => panic!("expected touchdown, got {:?}", other),
        }
        let pick_six = PlayOutcome::Turnover { kind: TurnoverKind::Interception, gain: -60 };
        match classify_play(pick_six, &state(2, 5, 45), &b).unwrap() {
            Classification::Terminal(v) => assert!(close(v, -(6.945 - kickoff))),
            other => panic!("expected touchdown against, got {:?}", other),
        }
    }

    #[test]
    fn test_touchdown_and_safety() {
        let (prior, scoring) = (linear_prior(), ScoringValues::default());
        let b = boundary(&prior, &scoring);
        let s = state(1, 10, 50);
        assert_eq!(
            classify_play(PlayOutcome::Yardage(99), &s, &b).unwrap(),
            Classification::Terminal(6.945)
        );
        assert_eq!(
            classify_play(PlayOutcome::Yardage(50), &s, &b).unwrap(),
            Classification::Terminal(6.945)
        );
        let deep = state(1, 10, 95);
        match classify_play(PlayOutcome::Yardage(-5), &deep, &b).unwrap() {
            Classification::Terminal(v) => assert!(close(v, -2.0 - (6.0 - 0.09 * 70.0))),
            other => panic!("expected safety, got {:?}", other),
        }
    }

    #[test]
    fn test_continuations() {
        let (prior, scoring) = (linear_prior(), ScoringValues::default());
        let b = boundary(&prior, &scoring);
        let s = state(1, 10, 50);
        assert_eq!(
            classify_play(PlayOutcome::Yardage(0), &s, &b).unwrap(),
            Classification::Continue(state(2, 10, 50))
        );
        assert_eq!(
            classify_play(PlayOutcome::Yardage(5), &s, &b).unwrap(),
            Classification::Continue(state(2, 5, 45))
        );
        assert_eq!(
            classify_play(PlayOutcome::Yardage(12), &s, &b).unwrap(),
            Classification::Continue(state(1, 10, 38))
        );
        // First and goal
        assert_eq!(
            classify_play(PlayOutcome::Yardage(44), &s, &b).unwrap(),
            Classification::Continue(state(1, 6, 6))
        );
    }

    #[test]
    fn test_distance_capped_at_twenty() {
        let (prior, scoring) = (linear_prior(), ScoringValues::default());
        let b = boundary(&prior, &scoring);
        assert_eq!(
            classify_play(PlayOutcome::Yardage(-15), &state(1, 10, 50), &b).unwrap(),
            Classification::Continue(state(2, 20, 65))
        );
    }

    #[test]
    fn test_turnover_on_downs() {
        let (prior, scoring) = (linear_prior(), ScoringValues::default());
        let b = boundary(&prior, &scoring);
        match classify_play(PlayOutcome::Yardage(2), &state(4, 5, 40), &b).unwrap() {
            Classification::Terminal(v) => assert!(close(v, -(6.0 - 0.09 * 62.0))),
            other => panic!("expected turnover on downs, got {:?}", other),
        }
        // Converting on fourth down keeps the ball
        assert_eq!(
            classify_play(PlayOutcome::Yardage(5), &state(4, 5, 40), &b).unwrap(),
            Classification::Continue(state(1, 10, 35))
        );
    }

    #[test]
    fn test_turnovers_use_prior_for_opponent() {
        let (prior, scoring) = (linear_prior(), ScoringValues::default());
        let b = boundary(&prior, &scoring);
        let s = state(2, 5, 45);
        let fumble = PlayOutcome::Turnover { kind: TurnoverKind::Fumble, gain: 20 };
        match classify_play(fumble, &s, &b).unwrap() {
            Classification::Terminal(v) => assert!(close(v, -(6.0 - 0.09 * 75.0))),
            other => panic!("expected terminal, got {:?}", other),
        }

        // Returned past the offense's goal line: pick six
        let pick_six = PlayOutcome::Turnover { kind: TurnoverKind::Interception, gain: -60 };
        assert_eq!(
            classify_play(pick_six, &s, &b).unwrap(),
            Classification::Terminal(-6.945)
        );

        // Intercepted in the end zone: touchback
        let end_zone = PlayOutcome::Turnover { kind: TurnoverKind::Interception, gain: 45 };
        match classify_play(end_zone, &s, &b).unwrap() {
            Classification::Terminal(v) => assert!(close(v, -(6.0 - 0.09 * 80.0))),
            other => panic!("expected touchback, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_prior_is_an_error() {
        let empty = PriorTable::new();
        let scoring = ScoringValues::default();
        let exchange = ExchangeValues { kickoff: 0.0, safety_kickoff: 0.0, touchback: 0.0 };
        let b = Boundary::new(&empty, &scoring, exchange);
        let fumble = PlayOutcome::Turnover { kind: TurnoverKind::Fumble, gain: 0 };
        assert!(classify_play(fumble, &state(1, 10, 50), &b).is_err());
    }
}
