//! Value Memoization Engine
//!
//! Resolves the expected value of every game state by recursive
//! expectation over play outcomes. Each state carries a status tag in one
//! owned [`ResolvedTable`]; a state reached again while still in progress
//! is a cycle, answered from the prior table instead of recursing.
//!
//! Cycles come from the distance cap: a long loss leaves 2nd-and-20 no
//! matter how far back, so a later gain can return to the starting state.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::buckets::YardlineBuckets;
use crate::cdf::{CdfEntry, CdfTable, PlayType};
use crate::classifier::{classify_play, Boundary, Classification, ExchangeValues};
use crate::config::{EngineConfig, ExpectationMode};
use crate::error::{EngineError, Result};
use crate::expectation;
use crate::field::{enumerate_states, GameState};
use crate::mixer::{Branch, BranchValues, DecisionMixer, MixerPolicy, NormativeMixer, OptimalMixer};
use crate::outcome::PlayOutcome;
use crate::resolved::{ResolvedTable, RunStats, Slot, StateValue};
use crate::special_teams::{field_goal_value, punt_value};
use crate::tables::{DecisionTable, FieldGoalTable, PriorTable, PuntSamples};

/// Everything a run reads
#[derive(Debug, Clone, Default)]
pub struct EngineInputs {
    pub buckets: YardlineBuckets,
    pub cdfs: CdfTable,
    pub field_goals: FieldGoalTable,
    pub punts: PuntSamples,
    pub priors: PriorTable,
    /// Only needed by the normative policy
    pub decisions: Option<DecisionTable>,
}

impl EngineInputs {
    /// Inputs with the default buckets and the league field-goal table
    pub fn new(priors: PriorTable, punts: PuntSamples, cdfs: CdfTable) -> Self {
        Self {
            buckets: YardlineBuckets::default(),
            cdfs,
            field_goals: FieldGoalTable::nfl(),
            punts,
            priors,
            decisions: None,
        }
    }

    pub fn with_decisions(mut self, decisions: DecisionTable) -> Self {
        self.decisions = Some(decisions);
        self
    }
}

/// Output of a full-table run
#[derive(Debug, Clone)]
pub struct Solution {
    pub table: ResolvedTable,
    pub stats: RunStats,
}

/// One run of the engine under a fixed mixer
pub struct ValueEngine<'a, M: DecisionMixer> {
    inputs: &'a EngineInputs,
    config: &'a EngineConfig,
    mixer: M,
    boundary: Boundary<'a>,
    table: ResolvedTable,
    stats: RunStats,
    rng: Option<ChaCha8Rng>,
}

impl<'a, M: DecisionMixer> ValueEngine<'a, M> {
    /// Fails when the prior table lacks the kickoff, safety-kick or
    /// touchback first downs.
    pub fn new(inputs: &'a EngineInputs, config: &'a EngineConfig, mixer: M) -> Result<Self> {
        let exchange = ExchangeValues::from_prior(&inputs.priors, config)?;
        let rng = match config.expectation {
            ExpectationMode::Exact => None,
            ExpectationMode::Sampled { seed, .. } => Some(ChaCha8Rng::seed_from_u64(seed)),
        };
        if inputs.punts.observed_yardlines() == 0 {
            warn!("No punt samples loaded; punting is unviable everywhere");
        }
        if config.field.field_goal_range == 0 {
            warn!("Field-goal range is zero; kicking is unviable everywhere");
        }
        Ok(Self {
            inputs,
            config,
            mixer,
            boundary: Boundary::new(&inputs.priors, &config.scoring, exchange),
            table: ResolvedTable::new(),
            stats: RunStats::default(),
            rng,
        })
    }

    /// Combined value of `state`, resolving it (and everything it reaches)
    /// on first request.
    pub fn resolve(&mut self, state: GameState) -> Result<f64> {
        match self.table.slot(&state) {
            Slot::Resolved(value) => Ok(value.combined),
            Slot::InProgress => self.cycle_fallback(state),
            Slot::Unresolved => {
                self.table.mark_in_progress(&state);
                match self.compute(state) {
                    Ok(value) => {
                        self.table.store(&state, value);
                        debug!(
                            "Resolved {}: {:.4} (run {:.4}, pass {:.4}, choice {})",
                            state,
                            value.combined,
                            value.branches.get(Branch::Run),
                            value.branches.get(Branch::Pass),
                            value.choice
                        );
                        Ok(value.combined)
                    }
                    Err(e) => {
                        self.table.reset(&state);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Resolved values of `state`, if any
    pub fn value(&self, state: &GameState) -> Option<&StateValue> {
        self.table.get(state)
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Resolve every enumerated state.
    pub fn run(mut self) -> Result<Solution> {
        for state in enumerate_states() {
            self.resolve(state)?;
        }
        let mut stats = self.stats;
        stats.resolved = self.table.resolved_count();
        stats.choice_counts = [0; 4];
        for (_, value) in self.table.iter() {
            stats.choice_counts[value.choice.index()] += 1;
        }
        info!(
            "Resolved {} states ({} cycle fallbacks, {} continuations)",
            stats.resolved, stats.cycle_fallbacks, stats.continuations
        );
        Ok(Solution {
            table: self.table,
            stats,
        })
    }

    fn cycle_fallback(&mut self, state: GameState) -> Result<f64> {
        let value = self
            .inputs
            .priors
            .get(&state)
            .ok_or(EngineError::CycleWithoutPrior { state })?;
        self.stats.cycle_fallbacks += 1;
        debug!("Cycle at {}; using prior {:.4}", state, value);
        Ok(value)
    }

    fn compute(&mut self, state: GameState) -> Result<StateValue> {
        let run = self.play_value(PlayType::Run, state)?;
        self.check_bounds(state, Some(Branch::Run), run)?;
        let pass = self.play_value(PlayType::Pass, state)?;
        self.check_bounds(state, Some(Branch::Pass), pass)?;

        let (kick, punt) = if state.is_fourth_down() {
            (
                field_goal_value(
                    state.yardline,
                    &self.inputs.field_goals,
                    &self.boundary,
                    self.config,
                )?,
                punt_value(state.yardline, &self.inputs.punts, &self.boundary, self.config)?,
            )
        } else {
            (self.config.unviable_value, self.config.unviable_value)
        };

        let branches = BranchValues::new(run, pass, kick, punt);
        let combined = self.mixer.combine(&state, &branches);
        self.check_bounds(state, None, combined)?;

        Ok(StateValue {
            branches,
            combined,
            choice: branches.argmax(),
        })
    }

    fn check_bounds(&self, state: GameState, branch: Option<Branch>, value: f64) -> Result<()> {
        if value.abs() > self.config.divergence_limit || value.is_nan() {
            return Err(EngineError::Diverged {
                state,
                branch,
                value,
            });
        }
        Ok(())
    }

    /// Expected value of calling `play` at `state`.
    fn play_value(&mut self, play: PlayType, state: GameState) -> Result<f64> {
        let inputs = self.inputs;
        let bucket = inputs.buckets.bucket_for(state.yardline).ok_or_else(|| {
            EngineError::InvalidBucket(format!("no bucket covers yardline {}", state.yardline))
        })?;
        let entry: &'a CdfEntry = match inputs.cdfs.lookup(play, bucket, &state, self.config.fallback) {
            Some(entry) => entry,
            None => return Ok(0.0),
        };

        let codes = match (self.config.expectation, self.rng.as_mut()) {
            (ExpectationMode::Sampled { draws, .. }, Some(rng)) => {
                Some(expectation::draw(entry, draws, rng))
            }
            _ => None,
        };
        match codes {
            Some(codes) => expectation::sampled_mean(&codes, |code| self.outcome_value(code, &state)),
            None => expectation::exact(entry, |code| self.outcome_value(code, &state)),
        }
    }

    fn outcome_value(&mut self, code: i32, state: &GameState) -> Result<f64> {
        let outcome = PlayOutcome::decode(code, &self.config.codes);
        match classify_play(outcome, state, &self.boundary)? {
            Classification::Terminal(value) => Ok(value),
            Classification::Continue(next) => {
                self.stats.continuations += 1;
                self.resolve(next)
            }
        }
    }
}

/// Run the full table under `policy`.
pub fn solve(inputs: &EngineInputs, config: &EngineConfig, policy: MixerPolicy) -> Result<Solution> {
    config.validate()?;
    info!("Solving {} policy", policy);
    match policy {
        MixerPolicy::Optimal => ValueEngine::new(inputs, config, OptimalMixer)?.run(),
        MixerPolicy::Normative => {
            let decisions = inputs
                .decisions
                .as_ref()
                .ok_or(EngineError::MissingDecisions)?;
            let mixer = NormativeMixer::new(decisions, config.unviable_value);
            ValueEngine::new(inputs, config, mixer)?.run()
        }
    }
}
