//! Monte Carlo account projection
//!
//! Projects future equity paths from summary statistics: each run walks a
//! sequence of Bernoulli trials at the observed win rate, adding the average
//! win or subtracting the average loss in R. Reports final-equity
//! percentiles, analytic expectancy, and the share of runs that crossed the
//! configured ruin floor.

use crate::config::SimulatorConfig;
use crate::error::{JournalError, Result};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scalar inputs for one simulation request
#[derive(Debug, Clone)]
pub struct SimulationParams {
    /// Observed win rate, percent in [0, 100]
    pub win_rate_pct: Decimal,
    /// Average winning R, non-negative
    pub avg_win: Decimal,
    /// Average losing R magnitude, non-negative
    pub avg_loss: Decimal,
    /// Trials per run
    pub trade_count: usize,
    /// Independent runs; `None` uses the configured default
    pub runs: Option<usize>,
}

/// Distribution summary of the simulated final equities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    /// Percentile label ("p10") -> final equity in R
    pub percentile_values: BTreeMap<String, Decimal>,
    /// Analytic expectancy per trade, 4 decimals
    pub ev: Decimal,
    /// Share of runs that touched the ruin floor, percent, 1 decimal
    pub ruin_pct: Decimal,
    /// One representative full path per percentile; every path has
    /// `trade_count + 1` points and starts at 0
    pub sample_paths: BTreeMap<String, Vec<Decimal>>,
    pub trade_count: usize,
    pub run_count: usize,
}

/// Monte Carlo simulator; behavior constants come from configuration
#[derive(Debug, Clone)]
pub struct MonteCarlo {
    config: SimulatorConfig,
}

impl MonteCarlo {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    fn validate(&self, params: &SimulationParams) -> Result<usize> {
        if params.win_rate_pct < Decimal::ZERO || params.win_rate_pct > Decimal::ONE_HUNDRED {
            return Err(JournalError::InvalidParams(format!(
                "win rate {} outside [0, 100]",
                params.win_rate_pct
            )));
        }
        if params.avg_win < Decimal::ZERO {
            return Err(JournalError::InvalidParams(format!(
                "negative average win {}",
                params.avg_win
            )));
        }
        if params.avg_loss < Decimal::ZERO {
            return Err(JournalError::InvalidParams(format!(
                "negative average loss {}",
                params.avg_loss
            )));
        }
        let runs = params.runs.unwrap_or(self.config.default_runs);
        if runs == 0 {
            return Err(JournalError::InvalidParams("zero runs".to_string()));
        }
        Ok(runs)
    }

    /// Run the simulation. Parameters are validated before any run executes.
    ///
    /// A run that touches the ruin floor is flagged but continues to
    /// completion, so every recorded path has the same length.
    pub fn simulate(&self, params: &SimulationParams) -> Result<MonteCarloResult> {
        let runs = self.validate(params)?;
        let win_probability = (params.win_rate_pct / Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0);
        let ruin_floor = self.config.ruin_threshold_r;

        let mut rng = rand::rng();
        let mut paths: Vec<Vec<Decimal>> = Vec::with_capacity(runs);
        let mut finals: Vec<Decimal> = Vec::with_capacity(runs);
        let mut ruined_runs = 0usize;

        for _ in 0..runs {
            let mut equity = Decimal::ZERO;
            let mut path = Vec::with_capacity(params.trade_count + 1);
            path.push(Decimal::ZERO);
            let mut ruined = false;

            for _ in 0..params.trade_count {
                if rng.random::<f64>() < win_probability {
                    equity += params.avg_win;
                } else {
                    equity -= params.avg_loss;
                }
                if equity <= ruin_floor {
                    ruined = true;
                }
                path.push(equity);
            }

            if ruined {
                ruined_runs += 1;
            }
            finals.push(equity);
            paths.push(path);
        }

        let mut sorted = finals.clone();
        sorted.sort();

        let mut percentile_values = BTreeMap::new();
        let mut sample_paths = BTreeMap::new();
        for pct in &self.config.percentiles {
            let label = format!("p{}", pct);
            let index = (runs * *pct as usize / 100).min(runs - 1);
            let value = sorted[index];
            percentile_values.insert(label.clone(), value);

            // Representative path: the run whose final equity is closest
            let closest = finals
                .iter()
                .enumerate()
                .min_by_key(|&(_, f)| (*f - value).abs())
                .map(|(i, _)| i)
                .unwrap_or(0);
            sample_paths.insert(label, paths[closest].clone());
        }

        let wr = params.win_rate_pct / Decimal::ONE_HUNDRED;
        let ev = (wr * params.avg_win - (Decimal::ONE - wr) * params.avg_loss)
            .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
        let ruin_pct = (Decimal::from(ruined_runs) / Decimal::from(runs) * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);

        Ok(MonteCarloResult {
            percentile_values,
            ev,
            ruin_pct,
            sample_paths,
            trade_count: params.trade_count,
            run_count: runs,
        })
    }
}
