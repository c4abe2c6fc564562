//! The [`Constraint`] component: a managed joint that mirrors an
//! [`AttachmentPair`] into a native engine joint across a
//! create → initialize → destroy lifecycle.
//!
//! # Lifecycle
//!
//! A constraint is created with [`Constraint::create`], which probes the
//! native engine once to discover the elementary-constraint schema of the
//! chosen [`ConstraintType`] (see [`discovery`]). The constraint then lives
//! in the scene graph as plain data until [`initialize`](Constraint::initialize)
//! resolves its attachment frames against the entity hierarchy, constructs
//! the real native joint, re-binds every discovered elementary constraint by
//! ordinal, registers the joint with the simulation, and applies the
//! configured [`CollisionsState`] policy.
//!
//! Every initialize-time failure is recovered into a logged `false` return:
//! the constraint stays [`Uninitialized`](ConstraintState::Uninitialized) and
//! can be re-initialized after the cause is fixed. [`destroy`](Constraint::destroy)
//! is best-effort and idempotent; a destroyed constraint can re-enter the
//! lifecycle through an explicit initialize, which re-binds its surviving
//! elementary constraints to a fresh native joint.

pub mod discovery;
pub mod elementary;

use bevy::{
    ecs::{
        entity::{Entity, EntityMapper, MapEntities},
        reflect::ReflectMapEntities,
    },
    log::{error, warn},
    prelude::*,
};
use thiserror::Error;

use crate::{
    attachment::AttachmentPair,
    backend::{
        BackendError, CollisionFilter, FilterTarget, JointBackend, NativeBodyId, NativeJointId,
    },
    frame::{FrameError, FrameHelper},
};
use discovery::{DiscoveryError, discover_schema};
use elementary::ElementaryConstraint;

/// The joint type of a [`Constraint`].
///
/// The type is fixed at creation: the elementary-constraint schema is
/// discovered for it once and reused for every subsequent initialize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", reflect(Serialize, Deserialize))]
#[reflect(Debug, PartialEq)]
pub enum ConstraintType {
    /// All six degrees of freedom restricted.
    #[default]
    Fixed,
    /// Rotation about one axis is free.
    Revolute,
    /// Translation along one axis is free.
    Prismatic,
    /// All three rotations are free.
    Spherical,
    /// Translation along and rotation about one axis are free.
    Cylindrical,
    /// Only the separation between the anchor points is restricted.
    Distance,
}

/// The collision-filtering policy a [`Constraint`] applies between the
/// objects it connects when it is initialized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", reflect(Serialize, Deserialize))]
#[reflect(Debug, PartialEq)]
pub enum CollisionsState {
    /// Leave the external collision-filter state untouched.
    #[default]
    KeepExternalState,
    /// Disable collision response between the reference and connected nodes,
    /// without propagating to their descendants.
    DisableReferenceVsConnected,
    /// Disable collision response between the two resolved rigid bodies,
    /// propagating to each body's descendants.
    DisableBodyVsBody,
}

/// The lifecycle state of a [`Constraint`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", reflect(Serialize, Deserialize))]
#[reflect(Debug, PartialEq)]
pub enum ConstraintState {
    /// Created but not (or no longer successfully) mirrored into the engine.
    /// Initialization may be attempted or re-attempted.
    #[default]
    Uninitialized,
    /// Backed by a live, registered native joint.
    Initialized,
    /// Torn down. Destroying again is a no-op. The managed elementary
    /// constraints survive teardown, so an explicit initialize re-enters the
    /// lifecycle and re-binds them to a fresh native joint.
    Destroyed,
}

/// An error produced while initializing or mutating a [`Constraint`].
///
/// Initialize-time errors are recovered at the lifecycle boundary into a
/// logged `false` return; they never propagate as panics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstraintError {
    /// The attachment pair's reference object is missing or does not resolve
    /// to a rigid body.
    #[error("the reference object does not resolve to a rigid body")]
    MissingReferenceBody,
    /// A frame could not be expressed relative to the resolved body.
    #[error(transparent)]
    InvalidHierarchy(#[from] FrameError),
    /// The real joint's elementary-constraint layout disagrees with the
    /// schema recorded at discovery.
    #[error(
        "the native joint reports {found} {list} elementary constraints, but discovery recorded {expected}"
    )]
    SchemaMismatch {
        /// Which list disagreed: `"ordinary"` or `"controller"`.
        list: &'static str,
        /// The count recorded at discovery.
        expected: usize,
        /// The count the real joint reports.
        found: usize,
    },
    /// The native joint yielded no element at an ordinal recorded at
    /// discovery, despite reporting a matching count.
    #[error("the native joint has no {list} elementary constraint at ordinal {ordinal}")]
    MissingElement {
        /// Which list the element was expected in.
        list: &'static str,
        /// The in-range ordinal that yielded no element.
        ordinal: usize,
    },
    /// The engine rejected joint construction or simulation registration.
    #[error("native joint construction failed: {0}")]
    EngineConstructionFailure(String),
    /// A collision pair requested by the collision policy already existed.
    #[error("the collision pair for group {0:?} is already configured")]
    DuplicatePair(String),
    /// An elementary constraint was mutated without a live native binding.
    #[error("elementary constraint {0:?} is not bound to a native joint")]
    NotBound(String),
}

impl From<BackendError> for ConstraintError {
    fn from(error: BackendError) -> Self {
        Self::EngineConstructionFailure(error.to_string())
    }
}

/// A managed joint between the scene-graph objects of its [`AttachmentPair`],
/// mirrored into a native engine joint while initialized.
#[derive(Component, Clone, Debug, PartialEq, Reflect)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", reflect(Serialize, Deserialize))]
#[reflect(Component, Debug, MapEntities, PartialEq)]
pub struct Constraint {
    constraint_type: ConstraintType,
    /// The two attachment frames defining the joint geometry.
    pub attachment: AttachmentPair,
    /// The collision-filtering policy applied at initialize.
    pub collisions_state: CollisionsState,
    elementary: Vec<ElementaryConstraint>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    state: ConstraintState,
    #[reflect(ignore)]
    #[cfg_attr(feature = "serialize", serde(skip))]
    native: Option<NativeJointId>,
}

impl Constraint {
    /// Creates a constraint of the given type, discovering its
    /// elementary-constraint schema from a disposable probe joint.
    ///
    /// Discovery failures are fatal: the error carries no partially usable
    /// constraint, and the caller should not retry with the same backend
    /// state.
    pub fn create(
        constraint_type: ConstraintType,
        backend: &mut dyn JointBackend,
    ) -> Result<Self, DiscoveryError> {
        let schema = discover_schema(backend, constraint_type)?;

        let mut elementary =
            Vec::with_capacity(schema.ordinary.len() + schema.controllers.len());
        for (ordinal, entry) in schema.ordinary.into_iter().enumerate() {
            elementary.push(ElementaryConstraint::from_schema(
                entry.name, ordinal, entry.kind,
            ));
        }
        for (ordinal, entry) in schema.controllers.into_iter().enumerate() {
            elementary.push(ElementaryConstraint::from_schema(
                entry.name, ordinal, entry.kind,
            ));
        }

        Ok(Self {
            constraint_type,
            attachment: AttachmentPair::default(),
            collisions_state: CollisionsState::default(),
            elementary,
            state: ConstraintState::default(),
            native: None,
        })
    }

    /// The joint type selected at creation.
    pub const fn constraint_type(&self) -> ConstraintType {
        self.constraint_type
    }

    /// The current lifecycle state.
    pub const fn state(&self) -> ConstraintState {
        self.state
    }

    /// The native joint handle, present while the constraint is initialized.
    pub const fn native(&self) -> Option<NativeJointId> {
        self.native
    }

    /// Every elementary constraint, in discovery order
    /// (ordinary constraints first, then controllers).
    pub fn elementary_constraints(&self) -> &[ElementaryConstraint] {
        &self.elementary
    }

    /// The ordinary (geometric restriction) elementary constraints.
    pub fn ordinary_elementary_constraints(
        &self,
    ) -> impl Iterator<Item = &ElementaryConstraint> {
        self.elementary.iter().filter(|element| !element.is_controller())
    }

    /// The controller (actuator) elementary constraints.
    pub fn elementary_constraint_controllers(
        &self,
    ) -> impl Iterator<Item = &ElementaryConstraint> {
        self.elementary.iter().filter(|element| element.is_controller())
    }

    /// Looks up an elementary constraint by its engine-reported name.
    pub fn elementary_constraint(&self, name: &str) -> Option<&ElementaryConstraint> {
        self.elementary.iter().find(|element| element.name() == name)
    }

    /// Looks up an elementary constraint by name, mutably.
    pub fn elementary_constraint_mut(&mut self, name: &str) -> Option<&mut ElementaryConstraint> {
        self.elementary
            .iter_mut()
            .find(|element| element.name() == name)
    }

    /// Mirrors the constraint into the native engine.
    ///
    /// Resolves the attachment frames against the entity hierarchy, computes
    /// body-local joint frames, constructs and registers the real native
    /// joint, re-binds every elementary constraint by its discovery ordinal,
    /// and applies the collision policy. `entity` is the constraint's own
    /// scene-graph identity, used for collision group naming and diagnostics.
    ///
    /// Returns `true` on success. Failures are logged and leave the
    /// constraint cleanly uninitialized and re-initializable; an already
    /// initialized constraint returns `true` without side effects. A
    /// destroyed constraint re-enters the lifecycle, re-binding its
    /// surviving elementary constraints to the fresh native joint.
    pub fn initialize(
        &mut self,
        entity: Entity,
        frames: &FrameHelper,
        backend: &mut dyn JointBackend,
        filter: &mut dyn CollisionFilter,
    ) -> bool {
        if self.state == ConstraintState::Initialized {
            return true;
        }
        match self.try_initialize(entity, frames, backend, filter) {
            Ok(()) => true,
            Err(err) => {
                error!(
                    "failed to initialize the {:?} constraint on {entity:?}: {err}",
                    self.constraint_type
                );
                false
            }
        }
    }

    fn try_initialize(
        &mut self,
        entity: Entity,
        frames: &FrameHelper,
        backend: &mut dyn JointBackend,
        filter: &mut dyn CollisionFilter,
    ) -> Result<(), ConstraintError> {
        // Any failure below leaves the constraint cleanly re-initializable.
        self.state = ConstraintState::Uninitialized;

        // The connected frame must reflect the reference frame this tick.
        self.attachment.synchronize(frames);

        let reference_object = self
            .attachment
            .reference_object()
            .ok_or(ConstraintError::MissingReferenceBody)?;
        let reference_body_entity = frames
            .rigid_body_ancestor(reference_object)
            .ok_or(ConstraintError::MissingReferenceBody)?;
        let reference_frame =
            frames.pose_relative_to(&self.attachment.reference_frame, reference_body_entity)?;

        // A connected object without a rigid body in its ancestry anchors the
        // connected side in world space, the same as no connected object.
        let connected_object = self.attachment.connected_object();
        let connected_body_entity =
            connected_object.and_then(|object| frames.rigid_body_ancestor(object));
        let connected_frame = match connected_body_entity {
            Some(body) => frames.pose_relative_to(&self.attachment.connected_frame, body)?,
            None => frames.world_pose(&self.attachment.connected_frame),
        };

        let reference_body = backend.acquire_body(reference_body_entity);
        let connected_body = connected_body_entity.map(|body| backend.acquire_body(body));

        let joint = backend.create_joint(
            self.constraint_type,
            Some(reference_body),
            reference_frame,
            connected_body,
            connected_frame,
        )?;

        if let Err(err) = self.bind_elements(joint, backend) {
            self.unbind_elements();
            backend.destroy_joint(joint);
            return Err(err);
        }

        if !backend.register_joint(joint) {
            self.unbind_elements();
            backend.destroy_joint(joint);
            return Err(ConstraintError::EngineConstructionFailure(
                "the simulation rejected the joint".to_string(),
            ));
        }

        self.apply_collision_policy(
            entity,
            reference_object,
            connected_object,
            reference_body,
            connected_body,
            filter,
        );

        self.native = Some(joint);
        self.state = ConstraintState::Initialized;
        Ok(())
    }

    /// Binds every managed elementary constraint to the element of the real
    /// joint at the same ordinal it was discovered at.
    fn bind_elements(
        &mut self,
        joint: NativeJointId,
        backend: &mut dyn JointBackend,
    ) -> Result<(), ConstraintError> {
        let expected_ordinary = self.ordinary_elementary_constraints().count();
        let found_ordinary = backend.ordinary_constraint_count(joint);
        if found_ordinary != expected_ordinary {
            return Err(ConstraintError::SchemaMismatch {
                list: "ordinary",
                expected: expected_ordinary,
                found: found_ordinary,
            });
        }

        let expected_controllers = self.elementary_constraint_controllers().count();
        let found_controllers = backend.controller_constraint_count(joint);
        if found_controllers != expected_controllers {
            return Err(ConstraintError::SchemaMismatch {
                list: "controller",
                expected: expected_controllers,
                found: found_controllers,
            });
        }

        for element in &mut self.elementary {
            let handle = if element.is_controller() {
                backend.controller_constraint(joint, element.ordinal())
            } else {
                backend.ordinary_constraint(joint, element.ordinal())
            };
            let Some(handle) = handle else {
                return Err(ConstraintError::MissingElement {
                    list: if element.is_controller() {
                        "controller"
                    } else {
                        "ordinary"
                    },
                    ordinal: element.ordinal(),
                });
            };
            element.bind(handle, backend);
        }
        Ok(())
    }

    fn unbind_elements(&mut self) {
        for element in &mut self.elementary {
            element.unbind();
        }
    }

    fn apply_collision_policy(
        &self,
        entity: Entity,
        reference_object: Entity,
        connected_object: Option<Entity>,
        reference_body: NativeBodyId,
        connected_body: Option<NativeBodyId>,
        filter: &mut dyn CollisionFilter,
    ) {
        if self.collisions_state == CollisionsState::KeepExternalState {
            return;
        }
        let Some(connected_object) = connected_object else {
            return;
        };

        let group = format!("constraint-{}", entity.to_bits());
        match self.collisions_state {
            CollisionsState::DisableReferenceVsConnected => {
                filter.add_to_group(FilterTarget::Node(reference_object), &group, false);
                filter.add_to_group(FilterTarget::Node(connected_object), &group, false);
            }
            CollisionsState::DisableBodyVsBody => {
                let Some(connected_body) = connected_body else {
                    warn!(
                        "the connected object {connected_object:?} has no rigid body, \
                         skipping the body-vs-body collision policy"
                    );
                    return;
                };
                filter.add_to_group(FilterTarget::Body(reference_body), &group, true);
                filter.add_to_group(FilterTarget::Body(connected_body), &group, true);
            }
            CollisionsState::KeepExternalState => unreachable!(),
        }

        if !filter.set_pair_enabled(&group, &group, false) {
            warn!("{}", ConstraintError::DuplicatePair(group));
        }
    }

    /// Tears down the native joint, releasing every binding.
    ///
    /// Best-effort and idempotent: safe to call on a constraint that never
    /// initialized and safe to call repeatedly. Transitions to
    /// [`ConstraintState::Destroyed`] and never fails.
    pub fn destroy(&mut self, backend: &mut dyn JointBackend) {
        if let Some(joint) = self.native.take() {
            backend.unregister_joint(joint);
            backend.destroy_joint(joint);
        }
        self.unbind_elements();
        self.state = ConstraintState::Destroyed;
    }
}

impl MapEntities for Constraint {
    fn map_entities<M: EntityMapper>(&mut self, entity_mapper: &mut M) {
        self.attachment.map_entities(entity_mapper);
    }
}
