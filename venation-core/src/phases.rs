//! Growth step for the node-attractor system.
//!
//! One [`step`] runs two phases over the nodes that were awake when the
//! step began:
//! 1. [`attraction_phase`]: every live attractor is absorbed by a node
//!    inside the kill radius, or claimed by the nearest node inside the
//!    attraction radius.
//! 2. [`growth_phase`]: every active node drops stale claims, falls
//!    asleep if nothing live is left, and otherwise spawns one child along
//!    the averaged direction to its claims.
//!
//! Nodes spawned during a step only take part from the next step on.

use crate::{
    config::Config,
    error::Result,
    tree::{Node, Tree},
    types::{AttractorId, NodeId},
};
use glam::DVec2;
use rand::Rng;

/// Counters produced by [`attraction_phase`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttractionStats {
    /// Attractors newly added to a node's claim set.
    pub claims: usize,
    /// Attractors absorbed because a node came inside the kill radius.
    pub consumed: usize,
}

/// Counters produced by [`growth_phase`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrowthStats {
    pub spawned: Vec<NodeId>,
    pub preventive_kills: usize,
    pub slept: usize,
    /// Nodes whose averaged direction had zero length and did not grow.
    pub zero_dir_skips: usize,
}

/// Summary of one [`step`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    pub active: usize,
    pub claims: usize,
    pub consumed: usize,
    pub preventive_kills: usize,
    pub spawned: Vec<NodeId>,
    pub slept: usize,
    pub zero_dir_skips: usize,
}

impl StepReport {
    /// `true` if the step changed nothing about the tree.
    pub fn is_idle(&self) -> bool {
        self.active == 0
    }
}

/// Assigns every live attractor to at most one of the `active` nodes.
///
/// For each live attractor the active nodes are scanned in order:
///
/// 1. A node closer than the kill distance (plus optional jitter)
///    absorbs the attractor and the scan stops.
/// 2. Otherwise the nearest node within `cfg.max_distance` becomes the
///    candidate; the first of several equally near nodes wins.
/// 3. If the candidate's parent already holds the attractor at a smaller
///    recorded distance, the claim stays with the parent. Otherwise the
///    parent's entry is dropped and the candidate claims the attractor.
///
/// Claims held by other, non-parent nodes are left in place here and
/// purged by [`growth_phase`] once `claimed_by` no longer matches.
///
/// ### Parameters
/// - `tree` - Tree whose attractors and claim sets are updated.
/// - `active` - Nodes that were awake when the step began.
/// - `cfg` - Radii and kill jitter.
/// - `rng` - Source for the kill jitter; untouched when jitter is `0.0`.
pub fn attraction_phase(
    tree: &mut Tree,
    active: &[NodeId],
    cfg: &Config,
    rng: &mut impl Rng,
) -> AttractionStats {
    let mut stats = AttractionStats::default();
    let Tree {
        attractors, nodes, ..
    } = tree;

    for a in attractors.points.iter_mut().filter(|a| a.is_live()) {
        let mut candidate = None;
        let mut closest = f64::INFINITY;
        let mut absorbed = false;

        for &id in active {
            let d = nodes[id].pos.distance(a.pos);

            if d < kill_threshold(cfg, rng) {
                absorbed = true;
                break;
            }

            if d < cfg.max_distance && d < closest {
                closest = d;
                candidate = Some(id);
            }
        }

        if absorbed {
            a.consume();
            stats.consumed += 1;
            continue;
        }

        let Some(candidate) = candidate else {
            continue;
        };

        // Favor a parent that is already nearer; stops the claim bouncing
        // between a parent and the child it just spawned.
        if let Some(parent) = nodes[candidate].parent
            && nodes[parent].claims.contains(a.index)
        {
            if a.assigned_distance < closest {
                continue;
            }
            nodes[parent].claims.remove(a.index);
        }

        if nodes[candidate].claims.insert(a.index) {
            stats.claims += 1;
        }
        a.assigned_distance = closest;
        a.claimed_by = Some(candidate);
    }

    stats
}

fn kill_threshold(cfg: &Config, rng: &mut impl Rng) -> f64 {
    if cfg.kill_jitter > 0.0 {
        cfg.kill_distance + rng.random_range(0.0..cfg.kill_jitter)
    } else {
        cfg.kill_distance
    }
}

/// Averages claim directions and spawns one child per growing node.
///
/// For each node in `active`:
///
/// 1. Drop claims whose attractor is now owned by another node.
/// 2. With no live claim left, the node falls asleep.
/// 3. With two or more live claims whose two nearest distances differ by
///    less than [`Config::tie_epsilon`], the nearer one is preventively
///    killed. It still counts toward this step's direction.
/// 4. The offsets to the live claims are summed and divided by the size
///    of the whole claim set, then normalized. A zero-length result
///    skips growth for this node.
/// 5. A child is appended at `pos + dir * cfg.segment_length`.
///
/// ### Returns
/// Counters for the phase, including the ids of spawned nodes in the
/// order they were appended.
pub fn growth_phase(tree: &mut Tree, active: &[NodeId], cfg: &Config) -> GrowthStats {
    let mut stats = GrowthStats::default();
    let epsilon = cfg.tie_epsilon();

    for &id in active {
        let Tree {
            attractors, nodes, ..
        } = &mut *tree;
        let points = &mut attractors.points;
        let node = &mut nodes[id];

        node.claims.retain(|a| points[a].claimed_by == Some(id));

        let mut live: Vec<AttractorId> = node
            .claims
            .iter()
            .filter(|&a| points[a].is_live())
            .collect();

        if live.is_empty() {
            node.asleep = true;
            stats.slept += 1;
            continue;
        }

        if live.len() > 1 {
            live.sort_by(|&x, &y| {
                points[x]
                    .assigned_distance
                    .total_cmp(&points[y].assigned_distance)
            });
            let (nearest, second) = (live[0], live[1]);
            let gap = points[nearest].assigned_distance - points[second].assigned_distance;
            if gap.abs() < epsilon {
                points[nearest].consume_preventively();
                stats.preventive_kills += 1;
            }
        }

        let sum = live
            .iter()
            .fold(DVec2::ZERO, |acc, &a| acc + (points[a].pos - node.pos));
        let average = sum / node.claims.len() as f64;

        let Some(dir) = average.try_normalize() else {
            log::trace!("node {id} has a zero-length growth direction, skipping");
            stats.zero_dir_skips += 1;
            continue;
        };

        node.growth_dir = Some(dir);
        let pos = node.pos + dir * cfg.segment_length;

        let child = nodes.len();
        nodes.push(Node::new_child(pos, child, id));
        stats.spawned.push(child);
    }

    stats
}

/// Advances `tree` by one growth step.
///
/// The configuration is validated first; an invalid configuration leaves
/// the tree untouched. A tree with no awake node is returned unchanged
/// with an idle report.
///
/// ### Errors
/// [`crate::error::SimError::InvalidConfig`] when `cfg` fails
/// [`Config::validate`].
pub fn step(tree: &mut Tree, cfg: &Config, rng: &mut impl Rng) -> Result<StepReport> {
    if let Err(err) = cfg.validate() {
        log::warn!("refusing to step: {err}");
        return Err(err);
    }

    let active = tree.active_node_ids();
    if active.is_empty() {
        return Ok(StepReport::default());
    }

    let attraction = attraction_phase(tree, &active, cfg, rng);
    let growth = growth_phase(tree, &active, cfg);

    let report = StepReport {
        active: active.len(),
        claims: attraction.claims,
        consumed: attraction.consumed,
        preventive_kills: growth.preventive_kills,
        spawned: growth.spawned,
        slept: growth.slept,
        zero_dir_skips: growth.zero_dir_skips,
    };

    log::debug!(
        "step: active={} claims={} consumed={} preventive={} spawned={} slept={}",
        report.active,
        report.claims,
        report.consumed,
        report.preventive_kills,
        report.spawned.len(),
        report.slept
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn cfg(max_distance: f64, kill_distance: f64, segment_length: f64) -> Config {
        Config {
            max_distance,
            kill_distance,
            segment_length,
            kill_jitter: 0.0,
            ..Config::default()
        }
    }

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(0)
    }

    #[test]
    fn attraction_phase_claims_nearest_node_within_radius() {
        let mut tree = Tree::from_positions(DVec2::ZERO, vec![DVec2::new(5.0, 0.0)]);
        let cfg = cfg(10.0, 1.0, 1.0);

        let stats = attraction_phase(&mut tree, &[0], &cfg, &mut rng());

        assert_eq!(stats, AttractionStats { claims: 1, consumed: 0 });
        let a = &tree.attractors.points[0];
        assert_eq!(a.claimed_by, Some(0));
        assert_eq!(a.assigned_distance, 5.0);
        assert!(tree.nodes[0].claims.contains(0));
    }

    #[test]
    fn attraction_phase_ignores_attractors_outside_radius() {
        let mut tree = Tree::from_positions(DVec2::ZERO, vec![DVec2::new(100.0, 0.0)]);
        let cfg = cfg(10.0, 1.0, 1.0);

        let stats = attraction_phase(&mut tree, &[0], &cfg, &mut rng());

        assert_eq!(stats, AttractionStats::default());
        let a = &tree.attractors.points[0];
        assert!(a.is_live());
        assert_eq!(a.claimed_by, None);
        assert!(tree.nodes[0].claims.is_empty());
    }

    #[test]
    fn attraction_phase_absorbs_attractors_inside_kill_distance() {
        let mut tree = Tree::from_positions(DVec2::ZERO, vec![DVec2::new(0.5, 0.0)]);
        let cfg = cfg(10.0, 1.0, 1.0);

        let stats = attraction_phase(&mut tree, &[0], &cfg, &mut rng());

        assert_eq!(stats, AttractionStats { claims: 0, consumed: 1 });
        assert!(tree.attractors.points[0].consumed);
        assert!(!tree.attractors.points[0].preventively_killed);
        assert!(tree.nodes[0].claims.is_empty());
    }

    #[test]
    fn attraction_phase_only_considers_active_nodes() {
        let mut tree = Tree::from_positions(DVec2::ZERO, vec![DVec2::new(0.5, 0.0)]);
        tree.add_child(0, DVec2::new(0.0, 5.0));
        let cfg = cfg(10.0, 1.0, 1.0);

        // The root would absorb the attractor, but only node 1 is active.
        attraction_phase(&mut tree, &[1], &cfg, &mut rng());

        let a = &tree.attractors.points[0];
        assert!(a.is_live());
        assert_eq!(a.claimed_by, Some(1));
    }

    #[test]
    fn attraction_phase_breaks_distance_ties_by_scan_order() {
        let mut tree = Tree::from_positions(DVec2::new(-1.0, 0.0), vec![DVec2::new(0.0, 3.0)]);
        tree.add_child(0, DVec2::new(1.0, 0.0));
        let cfg = cfg(10.0, 0.5, 1.0);

        attraction_phase(&mut tree, &[0, 1], &cfg, &mut rng());

        assert_eq!(tree.attractors.points[0].claimed_by, Some(0));
    }

    #[test]
    fn attraction_phase_moves_claim_from_parent_to_nearer_child() {
        let mut tree = Tree::from_positions(DVec2::ZERO, vec![DVec2::new(0.0, -10.0)]);
        tree.add_child(0, DVec2::new(0.0, -2.0));
        let cfg = cfg(100.0, 1.0, 2.0);

        attraction_phase(&mut tree, &[0], &cfg, &mut rng());
        assert!(tree.nodes[0].claims.contains(0));

        attraction_phase(&mut tree, &[0, 1], &cfg, &mut rng());

        assert!(!tree.nodes[0].claims.contains(0));
        assert!(tree.nodes[1].claims.contains(0));
        let a = &tree.attractors.points[0];
        assert_eq!(a.claimed_by, Some(1));
        assert_eq!(a.assigned_distance, 8.0);
    }

    #[test]
    fn attraction_phase_keeps_claim_at_nearer_parent() {
        let mut tree = Tree::from_positions(DVec2::ZERO, vec![DVec2::new(3.0, 0.0)]);
        let child = tree.add_child(0, DVec2::new(-1.0, 0.0));

        // The parent holds the attractor at distance 3 but is no longer
        // scanned; the child would claim it at distance 4.
        tree.nodes[0].claims.insert(0);
        tree.attractors.points[0].assigned_distance = 3.0;
        tree.attractors.points[0].claimed_by = Some(0);
        let cfg = cfg(100.0, 1.0, 1.0);

        let stats = attraction_phase(&mut tree, &[child], &cfg, &mut rng());

        assert_eq!(stats.claims, 0);
        assert!(tree.nodes[0].claims.contains(0));
        assert!(tree.nodes[child].claims.is_empty());
        assert_eq!(tree.attractors.points[0].claimed_by, Some(0));
    }

    #[test]
    fn growth_phase_spawns_child_toward_claims() {
        let mut tree = Tree::from_positions(DVec2::ZERO, vec![DVec2::new(10.0, 0.0)]);
        let cfg = cfg(100.0, 1.0, 2.0);

        attraction_phase(&mut tree, &[0], &cfg, &mut rng());
        let stats = growth_phase(&mut tree, &[0], &cfg);

        assert_eq!(stats.spawned, vec![1]);
        assert_eq!(tree.nodes.len(), 2);
        let child = &tree.nodes[1];
        assert_eq!(child.pos, DVec2::new(2.0, 0.0));
        assert_eq!(child.parent, Some(0));
        assert_eq!(child.index, 1);
        assert_eq!(tree.nodes[0].growth_dir, Some(DVec2::new(1.0, 0.0)));
    }

    #[test]
    fn growth_phase_puts_starved_nodes_to_sleep() {
        let mut tree = Tree::from_positions(DVec2::ZERO, vec![]);
        let cfg = cfg(100.0, 1.0, 1.0);

        let stats = growth_phase(&mut tree, &[0], &cfg);

        assert_eq!(stats.slept, 1);
        assert!(stats.spawned.is_empty());
        assert!(tree.nodes[0].asleep);
    }

    #[test]
    fn growth_phase_purges_claims_owned_elsewhere() {
        let mut tree = Tree::from_positions(DVec2::ZERO, vec![DVec2::new(5.0, 0.0)]);
        tree.add_child(0, DVec2::new(4.0, 0.0));
        tree.nodes[0].claims.insert(0);
        tree.nodes[1].claims.insert(0);
        tree.attractors.points[0].claimed_by = Some(1);
        tree.attractors.points[0].assigned_distance = 1.0;
        let cfg = cfg(100.0, 0.5, 1.0);

        let stats = growth_phase(&mut tree, &[0, 1], &cfg);

        assert!(tree.nodes[0].claims.is_empty());
        assert!(tree.nodes[0].asleep);
        assert!(tree.nodes[1].claims.contains(0));
        assert_eq!(stats.slept, 1);
        assert_eq!(stats.spawned, vec![2]);
    }

    #[test]
    fn growth_phase_skips_zero_length_direction() {
        let mut tree =
            Tree::from_positions(DVec2::ZERO, vec![DVec2::new(1.0, 0.0), DVec2::new(-1.0, 0.0)]);
        for a in &mut tree.attractors.points {
            a.claimed_by = Some(0);
            a.assigned_distance = 1.0;
            tree.nodes[0].claims.insert(a.index);
        }
        let cfg = cfg(100.0, 0.5, 1.0);

        let stats = growth_phase(&mut tree, &[0], &cfg);

        assert_eq!(stats.zero_dir_skips, 1);
        assert!(stats.spawned.is_empty());
        assert_eq!(tree.nodes.len(), 1);
        assert!(tree.nodes[0].growth_dir.is_none());
        assert!(!tree.nodes[0].asleep);
    }

    #[test]
    fn near_equidistant_pair_kills_the_nearer_attractor() {
        // Distances 10 and 10.5 differ by less than 5 * 0.2.
        let mut tree =
            Tree::from_positions(DVec2::ZERO, vec![DVec2::new(10.0, 0.0), DVec2::new(0.0, 10.5)]);
        let cfg = cfg(100.0, 3.0, 5.0);

        let report = step(&mut tree, &cfg, &mut rng()).expect("valid config");

        assert_eq!(report.preventive_kills, 1);
        let killed: Vec<AttractorId> = tree
            .attractors
            .points
            .iter()
            .filter(|a| a.preventively_killed)
            .map(|a| a.index)
            .collect();
        assert_eq!(killed, vec![0]);
        assert!(tree.attractors.points[0].consumed);
        assert!(tree.attractors.points[1].is_live());

        // The killed attractor still steered this step's growth.
        let dir = tree.nodes[0].growth_dir.expect("node grew");
        let expected = DVec2::new(10.0, 10.5).normalize();
        assert!((dir - expected).length() < 1e-12);
    }

    #[test]
    fn well_separated_pair_is_not_tie_broken() {
        let mut tree =
            Tree::from_positions(DVec2::ZERO, vec![DVec2::new(10.0, 0.0), DVec2::new(0.0, 20.0)]);
        let cfg = cfg(100.0, 3.0, 5.0);

        let report = step(&mut tree, &cfg, &mut rng()).expect("valid config");

        assert_eq!(report.preventive_kills, 0);
        assert!(tree.attractors.points.iter().all(|a| a.is_live()));
    }

    #[test]
    fn straight_chain_grows_until_attractor_is_absorbed() {
        let segment = 2.0;
        let mut tree =
            Tree::from_positions(DVec2::ZERO, vec![DVec2::new(0.0, -5.0 * segment)]);
        let cfg = cfg(100.0, 1.0, segment);
        let mut rng = rng();

        let mut steps = 0;
        while !tree.is_dormant() {
            step(&mut tree, &cfg, &mut rng).expect("valid config");
            steps += 1;
            assert!(steps < 50, "chain never went dormant");
        }

        // Root plus one node per segment length.
        assert_eq!(tree.nodes.len(), 1 + 5);
        assert!(tree.attractors.points[0].consumed);
        assert!(!tree.attractors.points[0].preventively_killed);
        for (i, n) in tree.nodes.iter().enumerate() {
            let expected = DVec2::new(0.0, -(i as f64) * segment);
            assert!((n.pos - expected).length() < 1e-9, "node {i} at {:?}", n.pos);
            assert!(n.asleep);
        }
    }

    #[test]
    fn step_with_no_active_nodes_is_a_no_op() {
        let mut tree = Tree::from_positions(DVec2::ZERO, vec![DVec2::new(3.0, 0.0)]);
        tree.nodes[0].asleep = true;
        let before = tree.clone();

        let report = step(&mut tree, &cfg(100.0, 1.0, 1.0), &mut rng()).expect("valid config");

        assert!(report.is_idle());
        assert_eq!(tree, before);
    }

    #[test]
    fn step_rejects_invalid_config_without_mutating() {
        let mut tree = Tree::from_positions(DVec2::ZERO, vec![DVec2::new(3.0, 0.0)]);
        let before = tree.clone();

        let err = step(&mut tree, &cfg(100.0, 1.0, 5.0), &mut rng()).unwrap_err();

        assert!(matches!(err, SimError::InvalidConfig(_)));
        assert_eq!(tree, before);
    }

    #[test]
    fn kill_jitter_widens_the_absorb_radius() {
        // 1.5 is outside the bare kill distance; any draw above 0.5 absorbs.
        let positions = vec![DVec2::new(1.5, 0.0); 8];
        let mut tree = Tree::from_positions(DVec2::ZERO, positions);
        let cfg = Config {
            kill_jitter: 100.0,
            ..cfg(100.0, 1.0, 1.0)
        };

        let stats = attraction_phase(&mut tree, &[0], &cfg, &mut rng());

        assert!(stats.consumed > 0);
    }
}
