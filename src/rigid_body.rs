//! The [`RigidBody`] role component that joint attachments resolve against.

use bevy::prelude::*;

/// Marks a scene-graph entity as carrying a rigid body in the native engine.
///
/// This crate does not simulate bodies itself; the native engine owns all
/// dynamics state. The component is the role marker that attachment frames
/// and constraints resolve against when walking up the entity hierarchy,
/// and the backend lazily acquires a native body for each marked entity
/// that a joint attaches to.
#[derive(Reflect, Clone, Copy, Component, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", reflect(Serialize, Deserialize))]
#[reflect(Component, Debug, PartialEq)]
pub enum RigidBody {
    /// The body is affected by forces and constraints and moved by the native solver.
    #[default]
    Dynamic,

    /// The body never moves. Joints against static bodies anchor the other side.
    Static,

    /// The body is moved by the user, not by forces, but still participates
    /// in constraints as if it had infinite mass.
    Kinematic,
}

impl RigidBody {
    /// Checks if the body is dynamic.
    pub fn is_dynamic(&self) -> bool {
        *self == Self::Dynamic
    }

    /// Checks if the body is static.
    pub fn is_static(&self) -> bool {
        *self == Self::Static
    }

    /// Checks if the body is kinematic.
    pub fn is_kinematic(&self) -> bool {
        *self == Self::Kinematic
    }
}
