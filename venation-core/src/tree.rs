use crate::attractor::AttractorSet;
use crate::claims::ClaimSet;
use crate::config::Config;
use crate::error::{Result, SimError};
use crate::types::{AttractorId, NodeId};
use glam::DVec2;
use rand::Rng;

/// A grown branch segment or tip.
///
/// Nodes never move and are never removed; they are only put to sleep
/// or excluded from rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub pos: DVec2,
    pub index: NodeId,
    pub parent: Option<NodeId>,
    pub claims: ClaimSet,
    /// Last normalized growth direction, `None` until the node has grown.
    pub growth_dir: Option<DVec2>,
    pub asleep: bool,
    pub render_eligible: bool,
}

impl Node {
    pub fn new_root(pos: DVec2) -> Self {
        Self {
            pos,
            index: 0,
            parent: None,
            claims: ClaimSet::new(),
            growth_dir: None,
            asleep: false,
            render_eligible: true,
        }
    }

    pub fn new_child(pos: DVec2, index: NodeId, parent: NodeId) -> Self {
        Self {
            parent: Some(parent),
            index,
            ..Self::new_root(pos)
        }
    }
}

/// Owns the attractor pool and the append-only node arena.
///
/// Nodes and attractors refer to each other by index, never by ownership.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub attractors: AttractorSet,
    pub nodes: Vec<Node>,
    /// Most recent culling snapshot, newest node first.
    pub culled_tail: Vec<NodeId>,
}

impl Tree {
    /// Builds a tree from a single root and hand-placed attractors.
    pub fn from_positions(root: DVec2, attractors: Vec<DVec2>) -> Self {
        Self {
            attractors: AttractorSet::from_positions(attractors),
            nodes: vec![Node::new_root(root)],
            culled_tail: Vec::new(),
        }
    }

    /// Scatters `cfg.attractor_count` attractors around `cfg.center` and
    /// plants the root at `cfg.root`.
    ///
    /// ### Errors
    /// [`SimError::InvalidConfig`] if `cfg` fails validation; no tree is
    /// built in that case.
    pub fn initialize(cfg: &Config, rng: &mut impl Rng) -> Result<Self> {
        cfg.validate()?;

        let attractors = AttractorSet::scatter(cfg.attractor_count, cfg.center, cfg.spread, rng);
        log::info!(
            "initialized tree: {} attractors around {:?}, root at {:?}",
            attractors.len(),
            cfg.center,
            cfg.root
        );

        Ok(Self {
            attractors,
            nodes: vec![Node::new_root(cfg.root)],
            culled_tail: Vec::new(),
        })
    }

    /// Appends a node grown from `parent` and returns its id.
    pub fn add_child(&mut self, parent: NodeId, pos: DVec2) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new_child(pos, id, parent));
        id
    }

    /// Inserts an attractor at `pos` and wakes the nearest node if it is
    /// asleep.
    ///
    /// On distance ties the first node in creation order is the nearest.
    pub fn add_attractor(&mut self, pos: DVec2) -> AttractorId {
        let id = self.attractors.push(pos);

        if let Some((nearest, _)) = self.find_nearest_node(pos) {
            let node = &mut self.nodes[nearest];
            if node.asleep {
                node.asleep = false;
                log::trace!("attractor {id} woke node {nearest}");
            }
        }

        id
    }

    /// Finds the node nearest to `pos` over all nodes, asleep or not.
    ///
    /// ### Returns
    /// The node id and its Euclidean distance, or `None` for an empty tree.
    pub fn find_nearest_node(&self, pos: DVec2) -> Option<(NodeId, f64)> {
        let mut best = None;
        let mut best_d = f64::INFINITY;
        for (id, n) in self.nodes.iter().enumerate() {
            let d = n.pos.distance(pos);
            if d < best_d {
                best_d = d;
                best = Some(id);
            }
        }
        best.map(|id| (id, best_d))
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(SimError::UnknownNode(id))
    }

    /// Ids of every node that is not asleep, in creation order.
    pub fn active_node_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| !n.asleep)
            .map(|n| n.index)
            .collect()
    }

    /// `true` once no node can grow any more.
    pub fn is_dormant(&self) -> bool {
        self.nodes.iter().all(|n| n.asleep)
    }

    pub fn live_attractor_count(&self) -> usize {
        self.attractors.live_count()
    }

    pub fn consumed_attractor_count(&self) -> usize {
        self.attractors.len() - self.attractors.live_count()
    }

    /// Yields `(parent_pos, child_pos, render_eligible)` for every non-root
    /// node, in creation order.
    pub fn segments(&self) -> impl Iterator<Item = (DVec2, DVec2, bool)> + '_ {
        self.nodes.iter().filter_map(|n| {
            n.parent
                .map(|p| (self.nodes[p].pos, n.pos, n.render_eligible))
        })
    }

    /// Positions of the live attractors currently claimed by `id`.
    pub fn live_claim_positions(&self, id: NodeId) -> Result<Vec<DVec2>> {
        let node = self.node(id)?;
        Ok(node
            .claims
            .iter()
            .map(|a| &self.attractors.points[a])
            .filter(|a| a.is_live())
            .map(|a| a.pos)
            .collect())
    }
}
