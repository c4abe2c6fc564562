//! Hierarchical pose frames and the [`FrameHelper`] system parameter
//! used to evaluate them against the scene graph.

use bevy::{
    ecs::{
        entity::{Entity, EntityMapper, MapEntities},
        system::SystemParam,
    },
    prelude::*,
};
use thiserror::Error;

use crate::{math::Pose, rigid_body::RigidBody};

/// A pose that is optionally parented to a scene-graph entity.
///
/// A [`Frame`] stores a local position and rotation relative to its parent
/// node. A frame without a parent is defined directly in world space.
///
/// The parent is a plain [`Entity`] handle into the externally owned scene
/// graph; the frame never owns the node it is parented to. Reparenting via
/// [`set_parent`](Self::set_parent) performs no validation; callers such as
/// [`AttachmentPair`](crate::attachment::AttachmentPair) decide whether a
/// candidate parent is acceptable in their context.
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", reflect(Serialize, Deserialize))]
#[reflect(Debug, PartialEq)]
pub struct Frame {
    parent: Option<Entity>,
    /// The position of the frame relative to its parent node,
    /// or in world space if the frame has no parent.
    pub local_position: Vec3,
    /// The rotation of the frame relative to its parent node,
    /// or in world space if the frame has no parent.
    pub local_rotation: Quat,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            parent: None,
            local_position: Vec3::ZERO,
            local_rotation: Quat::IDENTITY,
        }
    }
}

impl Frame {
    /// Creates a world-space [`Frame`] with the given local pose and no parent.
    pub const fn new(local_position: Vec3, local_rotation: Quat) -> Self {
        Self {
            parent: None,
            local_position,
            local_rotation,
        }
    }

    /// The scene-graph node this frame is parented to, if any.
    pub const fn parent(&self) -> Option<Entity> {
        self.parent
    }

    /// Reparents the frame, keeping the local pose unchanged.
    pub const fn set_parent(&mut self, parent: Option<Entity>) {
        self.parent = parent;
    }

    /// The local pose of the frame relative to its parent.
    pub const fn local_pose(&self) -> Pose {
        Pose::new(self.local_position, self.local_rotation)
    }

    /// Sets the local pose of the frame relative to its parent.
    pub const fn set_local_pose(&mut self, pose: Pose) {
        self.local_position = pose.position;
        self.local_rotation = pose.rotation;
    }
}

impl MapEntities for Frame {
    fn map_entities<M: EntityMapper>(&mut self, entity_mapper: &mut M) {
        if let Some(parent) = self.parent {
            self.parent = Some(entity_mapper.get_mapped(parent));
        }
    }
}

/// An error returned when evaluating a [`Frame`] against the scene graph.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The supplied entity is not an ancestor of the frame's parent chain.
    #[error("the entity {0:?} is not an ancestor of the frame")]
    InvalidHierarchy(Entity),
}

/// A system parameter for evaluating [`Frame`]s against the entity hierarchy.
///
/// World poses are computed by composing the frame's local pose up through
/// the [`Transform`] of every ancestor node. An ancestor without a
/// [`Transform`] contributes the identity. Scale is ignored throughout.
#[derive(SystemParam)]
pub struct FrameHelper<'w, 's> {
    transforms: Query<'w, 's, &'static Transform>,
    parents: Query<'w, 's, &'static ChildOf>,
    bodies: Query<'w, 's, (), With<RigidBody>>,
}

impl FrameHelper<'_, '_> {
    /// Computes the world pose of a scene-graph node by composing its own
    /// [`Transform`] with those of all of its ancestors.
    pub fn node_world_pose(&self, node: Entity) -> Pose {
        let mut pose = self
            .transforms
            .get(node)
            .map(Pose::from_transform)
            .unwrap_or(Pose::IDENTITY);
        for ancestor in self.parents.iter_ancestors(node) {
            if let Ok(transform) = self.transforms.get(ancestor) {
                pose = Pose::from_transform(transform) * pose;
            }
        }
        pose
    }

    /// Computes the world pose of the given frame.
    ///
    /// A frame with no parent is defined in world space directly.
    pub fn world_pose(&self, frame: &Frame) -> Pose {
        match frame.parent {
            Some(parent) => self.node_world_pose(parent) * frame.local_pose(),
            None => frame.local_pose(),
        }
    }

    /// Computes the pose of the given frame expressed in the local space of
    /// `ancestor`, which must be the frame's parent or one of the parent's
    /// ancestors. The ancestor's own transform is excluded from the chain,
    /// so passing the frame's direct parent returns the local pose unchanged.
    ///
    /// Fails with [`FrameError::InvalidHierarchy`] if `ancestor` is not found
    /// on the frame's parent chain; there is no fallback to world space.
    pub fn pose_relative_to(&self, frame: &Frame, ancestor: Entity) -> Result<Pose, FrameError> {
        let mut pose = frame.local_pose();
        let mut node = frame.parent;
        while let Some(entity) = node {
            if entity == ancestor {
                return Ok(pose);
            }
            if let Ok(transform) = self.transforms.get(entity) {
                pose = Pose::from_transform(transform) * pose;
            }
            node = self.parents.get(entity).ok().map(ChildOf::parent);
        }
        Err(FrameError::InvalidHierarchy(ancestor))
    }

    /// Sets the frame's local pose such that its world pose equals the given
    /// pose under the frame's current parent. Works for any parent, including
    /// none, in which case the pose is stored verbatim.
    pub fn set_world_pose(&self, frame: &mut Frame, pose: Pose) {
        match frame.parent {
            Some(parent) => {
                let parent_world = self.node_world_pose(parent);
                frame.set_local_pose(parent_world.inverse() * pose);
            }
            None => frame.set_local_pose(pose),
        }
    }

    /// Returns the given entity if it carries a [`RigidBody`], or the nearest
    /// ancestor that does.
    pub fn rigid_body_ancestor(&self, entity: Entity) -> Option<Entity> {
        if self.bodies.contains(entity) {
            return Some(entity);
        }
        self.parents
            .iter_ancestors(entity)
            .find(|&ancestor| self.bodies.contains(ancestor))
    }
}
