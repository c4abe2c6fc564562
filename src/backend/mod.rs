//! The external collaborator interfaces: the native rigid-body engine and
//! the collision-filtering service.
//!
//! The crate never talks to a concrete engine directly. The host driver
//! injects implementations of [`JointBackend`] and [`CollisionFilter`] as the
//! [`EngineBackend`] and [`EngineCollisionFilter`] resources, and the
//! constraint lifecycle receives them as explicit arguments. There are no
//! global singletons.

use bevy::prelude::*;
use thiserror::Error;

use crate::{
    constraint::ConstraintType,
    math::{Pose, Scalar},
};

#[cfg(test)]
pub(crate) mod mock;

/// A handle to a rigid body owned by the native engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect)]
pub struct NativeBodyId(pub u64);

/// A handle to a joint owned by the native engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect)]
pub struct NativeJointId(pub u64);

/// A handle to a single elementary constraint inside a native joint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect)]
pub struct NativeElementId(pub u64);

/// An error reported by the native engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The engine rejected or failed joint construction.
    #[error("native joint construction failed: {0}")]
    Construction(String),
}

/// The native rigid-body engine, as consumed by the constraint lifecycle.
///
/// Joint construction takes body handles (or `None` for a world-anchored
/// side) and the joint frames expressed locally to each body, in the flat
/// absolute-frame representation native engines expect. A constructed joint
/// exposes two ordered lists of elementary constraints, ordinary geometric
/// restrictions and controller-style actuators, queried by ordinal.
///
/// The ordinal order of both lists is required to be stable for a given
/// [`ConstraintType`]: a disposable probe joint and a later real joint of the
/// same type must report the same names in the same order. Schema discovery
/// relies on this.
pub trait JointBackend: Send + Sync + 'static {
    /// Returns the native body for the given scene-graph entity,
    /// creating one if the entity has not been seen before.
    fn acquire_body(&mut self, entity: Entity) -> NativeBodyId;

    /// Constructs a native joint of the given type between two bodies.
    /// `None` anchors that side of the joint in world space, with its frame
    /// given in world coordinates.
    fn create_joint(
        &mut self,
        kind: ConstraintType,
        body1: Option<NativeBodyId>,
        frame1: Pose,
        body2: Option<NativeBodyId>,
        frame2: Pose,
    ) -> Result<NativeJointId, BackendError>;

    /// The number of ordinary elementary constraints in the joint.
    fn ordinary_constraint_count(&self, joint: NativeJointId) -> usize;

    /// The number of controller elementary constraints in the joint.
    fn controller_constraint_count(&self, joint: NativeJointId) -> usize;

    /// The ordinal-th ordinary elementary constraint of the joint.
    fn ordinary_constraint(&self, joint: NativeJointId, ordinal: usize)
    -> Option<NativeElementId>;

    /// The ordinal-th controller elementary constraint of the joint.
    fn controller_constraint(
        &self,
        joint: NativeJointId,
        ordinal: usize,
    ) -> Option<NativeElementId>;

    /// The engine-reported name of an elementary constraint.
    fn element_name(&self, element: NativeElementId) -> Option<String>;

    /// Adds the joint to the active simulation. Returns `false` if the
    /// simulation rejected it.
    fn register_joint(&mut self, joint: NativeJointId) -> bool;

    /// Removes the joint from the active simulation. Tolerates joints that
    /// were never registered.
    fn unregister_joint(&mut self, joint: NativeJointId);

    /// Releases the native joint and every elementary constraint inside it.
    fn destroy_joint(&mut self, joint: NativeJointId);

    /// Enables or disables an elementary constraint.
    fn set_element_enabled(&mut self, element: NativeElementId, enabled: bool);

    /// Sets the compliance (inverse stiffness) of an elementary constraint.
    fn set_element_compliance(&mut self, element: NativeElementId, compliance: Scalar);

    /// Sets the damping of an elementary constraint.
    fn set_element_damping(&mut self, element: NativeElementId, damping: Scalar);

    /// Sets the target of a controller constraint: motor speed, lock
    /// position, or range midpoint, depending on the controller kind.
    fn set_controller_target(&mut self, element: NativeElementId, target: Scalar);
}

/// What a collision-filter group membership refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterTarget {
    /// A scene-graph node; membership applies to that node only.
    Node(Entity),
    /// A native body; membership may propagate to the body's descendants.
    Body(NativeBodyId),
}

/// The external collision-filtering collaborator.
///
/// Groups objects or bodies under string-named groups and enables or
/// disables collision response between group pairs. Group bookkeeping
/// internals are owned by the collaborator, not by this crate.
pub trait CollisionFilter: Send + Sync + 'static {
    /// Adds the target to a named group. When `propagate` is enabled, the
    /// membership extends to the target's descendants.
    fn add_to_group(&mut self, target: FilterTarget, group: &str, propagate: bool);

    /// Enables or disables collision response between two groups.
    /// Returns `false` if the pair was already configured to the requested
    /// state, which callers may report as a duplicate pairing.
    fn set_pair_enabled(&mut self, group_a: &str, group_b: &str, enabled: bool) -> bool;
}

/// The injected [`JointBackend`] the constraint lifecycle runs against.
#[derive(Resource)]
pub struct EngineBackend(pub Box<dyn JointBackend>);

/// The injected [`CollisionFilter`] used when applying collision policies.
#[derive(Resource)]
pub struct EngineCollisionFilter(pub Box<dyn CollisionFilter>);
