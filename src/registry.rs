// Registry of top-level nodes that respond to the pointer

use crate::scene::{NodeId, Scene};

/// Ordered, duplicate-free list of selectable scene nodes.
#[derive(Debug, Default, Clone)]
pub struct SelectableRegistry {
    nodes: Vec<NodeId>,
}

impl SelectableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node. Returns false if it was already registered.
    pub fn register(&mut self, id: NodeId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.nodes.push(id);
        true
    }

    pub fn unregister(&mut self, id: NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|node| *node != id);
        before != self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.nodes
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks parent links from `hit` up to the first registered node.
    /// Stops at the scene root, which is never selectable.
    pub fn resolve_root(&self, scene: &Scene, hit: NodeId) -> Option<NodeId> {
        let mut current = hit;
        loop {
            if self.contains(current) {
                return Some(current);
            }
            match scene.parent(current) {
                Some(parent) if parent != scene.root() => current = parent,
                _ => return None,
            }
        }
    }
}
