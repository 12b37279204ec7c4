use glam::DVec2;

use crate::error::{Result, SimError};

/// Tunables for one growth run.
///
/// Passed explicitly to [`crate::tree::Tree::initialize`] and
/// [`crate::phases::step`]; nothing in the crate keeps a global copy.
/// Coordinates follow a 600x400 drawing surface with y growing downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Attraction radius within which a node may claim an attractor.
    pub max_distance: f64,
    /// Proximity radius at which an attractor is absorbed.
    pub kill_distance: f64,
    /// Upper bound of a uniform offset added to `kill_distance` on each
    /// proximity test. `0.0` disables the jitter.
    pub kill_jitter: f64,
    /// Length of every newly spawned segment.
    pub segment_length: f64,
    /// Two nearest claims closer than `segment_length * tie_break_factor`
    /// trigger a preventive kill.
    pub tie_break_factor: f64,
    /// Number of attractors scattered by `Tree::initialize`.
    pub attractor_count: usize,
    /// Scatter scale: each coordinate is `center * U[0, spread)`.
    pub spread: f64,
    pub center: DVec2,
    /// Fixed start position of the root node.
    pub root: DVec2,
    /// Share (0..=100) of attractors whose owning nodes stay render-eligible.
    pub render_budget_percent: f64,
    /// Ask the renderer for claim lines and consumed attractors.
    pub debug_overlay: bool,
    /// Steps performed by one [`crate::run::GrowthRun`].
    pub max_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_distance: 150.0,
            kill_distance: 30.0,
            kill_jitter: 0.0,
            segment_length: 10.0,
            tie_break_factor: 0.2,
            attractor_count: 1000,
            spread: 2.0,
            center: DVec2::new(300.0, 180.0),
            root: DVec2::new(300.0, 400.0),
            render_budget_percent: 100.0,
            debug_overlay: true,
            max_iterations: 100,
        }
    }
}

impl Config {
    /// Checks every tunable, failing on the first rejected value.
    ///
    /// A segment longer than twice the kill distance lets a tip step over
    /// an attractor without ever coming within the kill radius, so that
    /// combination is refused outright.
    pub fn validate(&self) -> Result<()> {
        let finite_positive = [
            ("max_distance", self.max_distance),
            ("kill_distance", self.kill_distance),
            ("segment_length", self.segment_length),
            ("tie_break_factor", self.tie_break_factor),
        ];
        for (name, value) in finite_positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SimError::invalid_config(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }

        if !self.kill_jitter.is_finite() || self.kill_jitter < 0.0 {
            return Err(SimError::invalid_config(format!(
                "kill_jitter must be non-negative, got {}",
                self.kill_jitter
            )));
        }

        if !self.spread.is_finite() || self.spread < 0.0 {
            return Err(SimError::invalid_config(format!(
                "spread must be non-negative, got {}",
                self.spread
            )));
        }

        if !(0.0..=100.0).contains(&self.render_budget_percent) {
            return Err(SimError::invalid_config(format!(
                "render_budget_percent must be within 0..=100, got {}",
                self.render_budget_percent
            )));
        }

        if self.segment_length > 2.0 * self.kill_distance {
            return Err(SimError::invalid_config(format!(
                "segment_length {} exceeds twice the kill_distance {}",
                self.segment_length, self.kill_distance
            )));
        }

        Ok(())
    }

    /// Minimum gap between the two nearest claims before the nearer is
    /// preventively killed.
    #[inline]
    pub fn tie_epsilon(&self) -> f64 {
        self.segment_length * self.tie_break_factor
    }

    /// Converts `render_budget_percent` into an attractor count, rounding up.
    pub fn render_budget(&self, attractor_total: usize) -> usize {
        let share = self.render_budget_percent.clamp(0.0, 100.0) / 100.0;
        (attractor_total as f64 * share).ceil() as usize
    }
}
