//! The [`AttachmentPair`] coupling two [`Frame`]s across two parent objects.

use bevy::{
    ecs::entity::{Entity, EntityMapper, MapEntities},
    log::warn,
    prelude::*,
};

use crate::{
    constraint::Constraint,
    frame::{Frame, FrameHelper},
};

/// Two frames, one per attached object, defining the geometry of a joint.
///
/// The *reference* frame must be parented to a node that carries a
/// [`RigidBody`](crate::rigid_body::RigidBody) in itself or its ancestry.
/// The *connected* frame may be parented to any node, or to none, which
/// anchors the connected side in world space.
///
/// While [`synchronized`](Self::synchronized) is enabled, the connected
/// frame's world pose is kept equal to the reference frame's world pose by
/// [`synchronize`](Self::synchronize), which is invoked once per tick before
/// any constraint initialization or stepping consumes frame data.
#[derive(Clone, Debug, PartialEq, Reflect)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", reflect(Serialize, Deserialize))]
#[reflect(Debug, PartialEq)]
pub struct AttachmentPair {
    /// The frame attached to the reference object.
    pub reference_frame: Frame,
    /// The frame attached to the connected object.
    pub connected_frame: Frame,
    /// Whether [`synchronize`](Self::synchronize) mirrors the reference
    /// frame's world pose onto the connected frame. Enabled by default.
    pub synchronized: bool,
}

impl Default for AttachmentPair {
    fn default() -> Self {
        Self {
            reference_frame: Frame::default(),
            connected_frame: Frame::default(),
            synchronized: true,
        }
    }
}

impl AttachmentPair {
    /// The node the reference frame is parented to, if any.
    pub fn reference_object(&self) -> Option<Entity> {
        self.reference_frame.parent()
    }

    /// The node the connected frame is parented to, if any.
    pub fn connected_object(&self) -> Option<Entity> {
        self.connected_frame.parent()
    }

    /// Reparents the reference frame to the given node.
    ///
    /// A node without a [`RigidBody`](crate::rigid_body::RigidBody) in itself
    /// or its ancestry is rejected with a warning, leaving the pair unchanged,
    /// as is `None`. The reference side of a joint always needs a body.
    pub fn set_reference_object(&mut self, object: Option<Entity>, frames: &FrameHelper) {
        let Some(entity) = object else {
            warn!("an attachment pair's reference object cannot be removed, ignoring");
            return;
        };
        if frames.rigid_body_ancestor(entity).is_none() {
            warn!(
                "the reference object {entity:?} has no rigid body in itself or its ancestry, ignoring"
            );
            return;
        }
        self.reference_frame.set_parent(Some(entity));
    }

    /// Reparents the connected frame to the given node.
    /// `None` anchors the connected side in world space.
    pub fn set_connected_object(&mut self, object: Option<Entity>) {
        self.connected_frame.set_parent(object);
    }

    /// Copies the reference frame's world pose onto the connected frame.
    ///
    /// This is a world-space pose copy: the connected frame's local pose is
    /// rewritten so that its world pose matches, regardless of which node it
    /// is parented to. Does nothing while [`synchronized`](Self::synchronized)
    /// is disabled.
    pub fn synchronize(&mut self, frames: &FrameHelper) {
        if !self.synchronized {
            return;
        }
        let pose = frames.world_pose(&self.reference_frame);
        frames.set_world_pose(&mut self.connected_frame, pose);
    }
}

impl MapEntities for AttachmentPair {
    fn map_entities<M: EntityMapper>(&mut self, entity_mapper: &mut M) {
        self.reference_frame.map_entities(entity_mapper);
        self.connected_frame.map_entities(entity_mapper);
    }
}

/// Synchronizes the attachment pair of every constraint once per tick,
/// before constraints are initialized or the native engine steps.
pub(crate) fn synchronize_attachment_pairs(
    mut constraints: Query<&mut Constraint>,
    frames: FrameHelper,
) {
    for mut constraint in &mut constraints {
        constraint.attachment.synchronize(&frames);
    }
}
