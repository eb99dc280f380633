use glam::{Quat, Vec3};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Local transform relative to the parent node.
///
/// Rotation is stored as Euler angles in YXZ order, matching the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    fn quat(&self) -> Quat {
        Quat::from_euler(
            glam::EulerRot::YXZ,
            self.rotation.y,
            self.rotation.x,
            self.rotation.z,
        )
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub transform: Transform,
    pub debug_name: &'static str,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("scene node {0:?} does not exist")]
    MissingNode(NodeId),
    #[error("parent node {0:?} does not exist")]
    MissingParent(NodeId),
}

#[derive(Debug, Default)]
pub struct NodeIdAllocator {
    next: u64,
}

impl NodeIdAllocator {
    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Minimal scene graph: nodes with an optional parent and a local transform.
///
/// Removal is deferred until [`SceneGraph::apply_pending`] so callers may
/// despawn while iterating. Removing a node removes its whole subtree.
#[derive(Debug, Default)]
pub struct SceneGraph {
    allocator: NodeIdAllocator,
    nodes: Vec<SceneNode>,
    pending_removals: Vec<NodeId>,
}

impl SceneGraph {
    pub fn add(&mut self, debug_name: &'static str, transform: Transform) -> NodeId {
        self.insert(debug_name, None, transform)
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        debug_name: &'static str,
        transform: Transform,
    ) -> Result<NodeId, SceneError> {
        if self.find(parent).is_none() {
            return Err(SceneError::MissingParent(parent));
        }
        Ok(self.insert(debug_name, Some(parent), transform))
    }

    fn insert(
        &mut self,
        debug_name: &'static str,
        parent: Option<NodeId>,
        transform: Transform,
    ) -> NodeId {
        let id = self.allocator.allocate();
        self.nodes.push(SceneNode {
            id,
            parent,
            transform,
            debug_name,
            visible: true,
        });
        id
    }

    pub fn remove(&mut self, id: NodeId) -> bool {
        if self.find(id).is_none() || self.pending_removals.contains(&id) {
            return false;
        }
        self.pending_removals.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if self.pending_removals.is_empty() {
            return;
        }
        let mut doomed = std::mem::take(&mut self.pending_removals);
        // Expand to descendants; parents always precede children in `nodes`.
        for node in &self.nodes {
            if let Some(parent) = node.parent {
                if doomed.contains(&parent) && !doomed.contains(&node.id) {
                    doomed.push(node.id);
                }
            }
        }
        self.nodes.retain(|node| !doomed.contains(&node.id));
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.pending_removals.clear();
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.find(id).is_some()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn find(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Result<&mut Transform, SceneError> {
        self.find_mut(id)
            .map(|node| &mut node.transform)
            .ok_or(SceneError::MissingNode(id))
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<(), SceneError> {
        let node = self.find_mut(id).ok_or(SceneError::MissingNode(id))?;
        node.visible = visible;
        Ok(())
    }

    /// World-space position of `id`, composing every parent transform.
    pub fn world_position(&self, id: NodeId) -> Result<Vec3, SceneError> {
        let mut node = self.find(id).ok_or(SceneError::MissingNode(id))?;
        let mut position = node.transform.position;
        while let Some(parent_id) = node.parent {
            node = self
                .find(parent_id)
                .ok_or(SceneError::MissingParent(parent_id))?;
            position = node.transform.quat() * position + node.transform.position;
        }
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 0.0001
    }

    #[test]
    fn child_position_composes_parent_offset() {
        let mut graph = SceneGraph::default();
        let house = graph.add("house", Transform::at(Vec3::new(500.0, 0.0, 500.0)));
        let key = graph
            .add_child(house, "key", Transform::at(Vec3::new(25.0, 0.2, -25.0)))
            .expect("key");

        let world = graph.world_position(key).expect("world");
        assert!(approx(world, Vec3::new(525.0, 0.2, 475.0)));
    }

    #[test]
    fn child_position_follows_parent_yaw() {
        let mut graph = SceneGraph::default();
        let group = graph.add(
            "group",
            Transform {
                position: Vec3::new(10.0, 0.0, 0.0),
                rotation: Vec3::new(0.0, FRAC_PI_2, 0.0),
            },
        );
        let child = graph
            .add_child(group, "child", Transform::at(Vec3::new(0.0, 0.0, -1.0)))
            .expect("child");

        let world = graph.world_position(child).expect("world");
        assert!(approx(world, Vec3::new(9.0, 0.0, 0.0)));
    }

    #[test]
    fn add_child_rejects_missing_parent() {
        let mut graph = SceneGraph::default();
        let result = graph.add_child(NodeId(42), "orphan", Transform::default());
        assert_eq!(result, Err(SceneError::MissingParent(NodeId(42))));
    }

    #[test]
    fn removal_is_deferred_until_apply_pending() {
        let mut graph = SceneGraph::default();
        let part = graph.add("part", Transform::default());

        assert!(graph.remove(part));
        assert!(graph.contains(part));
        assert!(!graph.remove(part));

        graph.apply_pending();
        assert!(!graph.contains(part));
        assert!(!graph.remove(part));
    }

    #[test]
    fn removing_group_removes_subtree() {
        let mut graph = SceneGraph::default();
        let house = graph.add("house", Transform::default());
        let room = graph
            .add_child(house, "room", Transform::default())
            .expect("room");
        let clock = graph
            .add_child(room, "clock", Transform::default())
            .expect("clock");
        let roof = graph.add("roof", Transform::default());

        graph.remove(house);
        graph.apply_pending();

        assert!(!graph.contains(room));
        assert!(!graph.contains(clock));
        assert!(graph.contains(roof));
        assert_eq!(graph.node_count(), 1);
    }
}
