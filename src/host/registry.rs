//! Id bookkeeping for hosts whose elements live outside the crate.
//!
//! The registry holds a strong handle per id. Elements that leave the
//! document are pruned; an element that comes back carrying the id it was
//! stamped with gets that id again.

use rustc_hash::FxHashMap;

use super::ElementId;

/// Element handles keyed by the id stamped on them.
#[derive(Debug)]
pub(crate) struct Registry<E> {
    next_id: u64,
    elements: FxHashMap<ElementId, E>,
}

impl<E> Default for Registry<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            elements: FxHashMap::default(),
        }
    }
}

impl<E: Clone + PartialEq> Registry<E> {
    /// Fresh id from the shared counter (also used for timers and frames).
    pub(crate) fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn get(&self, id: ElementId) -> Option<&E> {
        self.elements.get(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    /// Id for an element that already carries `stamped`, if the stamp is
    /// ours and not held by a different element (a cloned node copies it).
    pub(crate) fn adopt(
        &mut self,
        element: &E,
        stamped: Option<ElementId>,
    ) -> Option<ElementId> {
        let id = stamped?;
        match self.elements.get(&id) {
            Some(known) if known == element => Some(id),
            Some(_) => None,
            None if id.0 != 0 && id.0 <= self.next_id => {
                let _ = self.elements.insert(id, element.clone());
                Some(id)
            }
            None => None,
        }
    }

    /// Track an element under a new id; the caller stamps it.
    pub(crate) fn insert(&mut self, element: E) -> ElementId {
        let id = ElementId(self.allocate());
        let _ = self.elements.insert(id, element);
        id
    }

    pub(crate) fn remove(&mut self, id: ElementId) -> Option<E> {
        self.elements.remove(&id)
    }

    /// Drop every element `connected` rejects; returns how many went.
    pub(crate) fn prune(&mut self, connected: impl Fn(&E) -> bool) -> usize {
        let before = self.elements.len();
        self.elements.retain(|_, el| connected(el));
        before - self.elements.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_elements_get_distinct_ids() {
        let mut registry = Registry::default();
        let a = registry.insert("a");
        let b = registry.insert("b");
        assert_ne!(a, b);
        assert_eq!(registry.get(a), Some(&"a"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_prune_bounds_growth_across_rerenders() {
        let mut registry = Registry::default();
        for commit in 0..5_u32 {
            // Each commit replaces the whole list with fresh items.
            let live: Vec<u32> = (0..4).map(|i| commit * 10 + i).collect();
            for item in &live {
                let _ = registry.insert(*item);
            }
            let _ = registry.prune(|item| live.contains(item));
            assert_eq!(registry.len(), 4);
        }
    }

    #[test]
    fn test_reattached_element_keeps_its_id() {
        let mut registry = Registry::default();
        let id = registry.insert("card");
        assert_eq!(registry.prune(|_| false), 1);
        assert!(registry.get(id).is_none());

        assert_eq!(registry.adopt(&"card", Some(id)), Some(id));
        assert_eq!(registry.adopt(&"card", Some(id)), Some(id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_foreign_or_cloned_stamps_are_rejected() {
        let mut registry = Registry::default();
        let id = registry.insert("original");
        // A cloned node carries the same stamp but is a different element.
        assert_eq!(registry.adopt(&"clone", Some(id)), None);
        // Stamps this registry never handed out.
        assert_eq!(registry.adopt(&"x", Some(ElementId(99))), None);
        assert_eq!(registry.adopt(&"x", Some(ElementId(0))), None);
        assert_eq!(registry.adopt(&"x", None), None);
    }
}
