use crate::types::{AttractorId, NodeId};
use glam::DVec2;
use rand::Rng;

/// A point of attraction that branch tips grow toward.
///
/// `consumed` only ever goes from `false` to `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attractor {
    pub pos: DVec2,
    pub index: AttractorId,
    pub consumed: bool,
    /// Set alongside `consumed` when the tie-break rule removed the point.
    pub preventively_killed: bool,
    /// Distance to the claiming node, `f64::INFINITY` while unclaimed.
    pub assigned_distance: f64,
    pub claimed_by: Option<NodeId>,
}

impl Attractor {
    pub fn new(pos: DVec2, index: AttractorId) -> Self {
        Self {
            pos,
            index,
            consumed: false,
            preventively_killed: false,
            assigned_distance: f64::INFINITY,
            claimed_by: None,
        }
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        !self.consumed
    }

    pub fn consume(&mut self) {
        self.consumed = true;
    }

    pub fn consume_preventively(&mut self) {
        self.consumed = true;
        self.preventively_killed = true;
    }
}

/// Append-only pool of attractors; insertion order is identity order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttractorSet {
    pub points: Vec<Attractor>,
}

impl AttractorSet {
    pub fn from_positions(positions: Vec<DVec2>) -> Self {
        let points = positions
            .into_iter()
            .enumerate()
            .map(|(index, pos)| Attractor::new(pos, index))
            .collect();

        Self { points }
    }

    /// Scatters `count` attractors with each coordinate drawn as
    /// `center * U[0, spread)`.
    pub fn scatter(count: usize, center: DVec2, spread: f64, rng: &mut impl Rng) -> Self {
        let positions = (0..count)
            .map(|_| {
                let x = center.x * Self::unit_scale(spread, rng);
                let y = center.y * Self::unit_scale(spread, rng);
                DVec2::new(x, y)
            })
            .collect();

        Self::from_positions(positions)
    }

    fn unit_scale(spread: f64, rng: &mut impl Rng) -> f64 {
        if spread > 0.0 {
            rng.random_range(0.0..spread)
        } else {
            0.0
        }
    }

    /// Appends a new attractor and returns its identity.
    pub fn push(&mut self, pos: DVec2) -> AttractorId {
        let index = self.points.len();
        self.points.push(Attractor::new(pos, index));
        index
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.points.iter().filter(|a| a.is_live()).count()
    }
}
