//! Level-of-detail culling for long chains.
//!
//! Only `Node::render_eligible` is touched here; growth never reads it.

use crate::{config::Config, tree::Tree, types::NodeId};

/// Marks the nodes beyond `attractor_budget` as not render-eligible.
///
/// Nodes are walked from newest to oldest while summing the size of their
/// claim sets. Once the running total has reached the budget, every older
/// node is beyond budget and culled. The newest node is always kept.
///
/// Nodes culled by the previous call but not by this one are restored, so
/// raising the budget undoes exactly the culling that no longer applies.
///
/// ### Returns
/// The new culled set, newest first. Also stored in `tree.culled_tail`.
pub fn cull_tail(tree: &mut Tree, attractor_budget: usize) -> &[NodeId] {
    let mut culled = Vec::new();
    let mut total = 0usize;

    for (rank, node) in tree.nodes.iter().rev().enumerate() {
        if rank > 0 && total >= attractor_budget {
            culled.push(node.index);
        }
        total += node.claims.len();
    }

    let mut in_new_set = vec![false; tree.nodes.len()];
    for &id in &culled {
        in_new_set[id] = true;
    }

    let mut restored = 0usize;
    for &id in &tree.culled_tail {
        if let Some(node) = tree.nodes.get_mut(id)
            && !in_new_set[id]
        {
            node.render_eligible = true;
            restored += 1;
        }
    }
    for &id in &culled {
        tree.nodes[id].render_eligible = false;
    }

    log::debug!(
        "cull_tail: budget={attractor_budget} culled={} restored={restored}",
        culled.len()
    );

    tree.culled_tail = culled;
    &tree.culled_tail
}

impl Tree {
    /// Culls against `cfg.render_budget_percent` of the attractor pool.
    pub fn apply_render_budget(&mut self, cfg: &Config) -> &[NodeId] {
        let budget = cfg.render_budget(self.attractors.len());
        cull_tail(self, budget)
    }
}
