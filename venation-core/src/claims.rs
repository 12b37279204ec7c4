use crate::types::AttractorId;

/// The attractors currently steering one node, keyed by identity.
///
/// Iteration follows insertion order so that distance ties resolve the
/// same way on every run. Claim sets are small (a handful of entries per
/// tip), so a linear scan beats hashing here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimSet {
    ids: Vec<AttractorId>,
}

impl ClaimSet {
    pub fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Adds `id` unless it is already present.
    ///
    /// ### Returns
    /// `true` if the set changed.
    pub fn insert(&mut self, id: AttractorId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Removes `id`, keeping the order of the remaining entries.
    ///
    /// ### Returns
    /// `true` if the set changed.
    pub fn remove(&mut self, id: AttractorId) -> bool {
        match self.ids.iter().position(|&x| x == id) {
            Some(pos) => {
                self.ids.remove(pos);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn contains(&self, id: AttractorId) -> bool {
        self.ids.contains(&id)
    }

    /// Keeps only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(AttractorId) -> bool) {
        self.ids.retain(|&id| keep(id));
    }

    pub fn iter(&self) -> impl Iterator<Item = AttractorId> + '_ {
        self.ids.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
