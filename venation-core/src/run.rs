//! Step budget for a scheduler driving one growth run.

use crate::{
    config::Config,
    error::Result,
    phases::{self, StepReport},
    tree::Tree,
};
use rand::Rng;

/// A validated configuration plus a countdown of remaining steps.
///
/// The driver calls [`GrowthRun::advance`] once per frame (or as fast as
/// it likes); the run stops handing out steps after
/// `Config::max_iterations`.
#[derive(Debug, Clone)]
pub struct GrowthRun {
    cfg: Config,
    iterations: usize,
}

impl GrowthRun {
    /// ### Errors
    /// [`crate::error::SimError::InvalidConfig`] if `cfg` fails validation,
    /// before any step has run.
    pub fn new(cfg: Config) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cfg, iterations: 0 })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn remaining(&self) -> usize {
        self.cfg.max_iterations.saturating_sub(self.iterations)
    }

    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Performs one step if the budget allows.
    ///
    /// ### Returns
    /// `Ok(None)` once the iteration budget is spent.
    pub fn advance(&mut self, tree: &mut Tree, rng: &mut impl Rng) -> Result<Option<StepReport>> {
        if self.is_finished() {
            return Ok(None);
        }

        let report = phases::step(tree, &self.cfg, rng)?;
        self.iterations += 1;

        if self.is_finished() {
            log::info!(
                "growth run finished after {} steps with {} nodes",
                self.iterations,
                tree.nodes.len()
            );
        }

        Ok(Some(report))
    }

    /// Steps until the budget is spent or no node can grow.
    ///
    /// ### Returns
    /// The number of steps performed by this call.
    pub fn run_to_completion(&mut self, tree: &mut Tree, rng: &mut impl Rng) -> Result<usize> {
        let start = self.iterations;
        while !tree.is_dormant() {
            if self.advance(tree, rng)?.is_none() {
                break;
            }
        }

        if tree.is_dormant() {
            log::info!(
                "tree dormant after {} steps: {} nodes, {} live attractors",
                self.iterations,
                tree.nodes.len(),
                tree.live_attractor_count()
            );
        }

        Ok(self.iterations - start)
    }
}
