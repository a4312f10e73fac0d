//! Explicit entity tree supplied by the host.

use super::error::SceneError;
use crate::core::EntityId;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
struct Node {
    parent: Option<EntityId>,
    children: Vec<EntityId>,
}

/// Parent/child relationships between entities.
///
/// Children keep the order they were attached in, so subtree walks are
/// deterministic.
#[derive(Clone, Debug, Default)]
pub struct EntityGraph {
    nodes: HashMap<EntityId, Node>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.nodes.contains_key(&entity)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn insert(&mut self, entity: EntityId, parent: Option<EntityId>) -> Result<(), SceneError> {
        if self.contains(entity) {
            return Err(SceneError::DuplicateEntity(entity));
        }
        if let Some(parent) = parent {
            self.nodes
                .get_mut(&parent)
                .ok_or(SceneError::UnknownEntity(parent))?
                .children
                .push(entity);
        }
        self.nodes.insert(
            entity,
            Node {
                parent,
                children: Vec::new(),
            },
        );
        Ok(())
    }

    /// Move `entity` (and its subtree) under `parent`, or to the root.
    pub fn reparent(&mut self, entity: EntityId, parent: Option<EntityId>) -> Result<(), SceneError> {
        if !self.contains(entity) {
            return Err(SceneError::UnknownEntity(entity));
        }
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(SceneError::UnknownEntity(parent));
            }
            if parent == entity || self.ancestors(parent).any(|a| a == entity) {
                return Err(SceneError::CycleDetected { entity, parent });
            }
        }

        self.detach(entity);
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.push(entity);
            }
        }
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.parent = parent;
        }
        Ok(())
    }

    /// Remove `entity` and its whole subtree. Returns the removed entities,
    /// `entity` first.
    pub fn remove(&mut self, entity: EntityId) -> Result<Vec<EntityId>, SceneError> {
        if !self.contains(entity) {
            return Err(SceneError::UnknownEntity(entity));
        }
        self.detach(entity);

        let mut removed = vec![entity];
        removed.extend(self.descendants(entity));
        for id in &removed {
            self.nodes.remove(id);
        }
        Ok(removed)
    }

    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.nodes.get(&entity)?.parent
    }

    pub fn children(&self, entity: EntityId) -> &[EntityId] {
        self.nodes
            .get(&entity)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, entity: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        std::iter::successors(self.parent(entity), move |current| self.parent(*current))
    }

    /// Strict descendants in depth-first pre-order.
    pub fn descendants(&self, entity: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack: Vec<EntityId> = self.children(entity).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    fn detach(&mut self, entity: EntityId) {
        if let Some(parent) = self.parent(entity) {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.retain(|child| *child != entity);
            }
        }
    }
}
