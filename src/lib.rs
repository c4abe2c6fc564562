//! # Tether
//!
//! **Tether** binds an editable, hierarchical scene-graph representation of
//! rigid-body joints to the flat, absolute-frame joint objects of an external
//! ("native") rigid-body physics engine, for the [Bevy game engine](https://bevyengine.org/).
//!
//! The native engine is an injected collaborator behind the
//! [`JointBackend`](backend::JointBackend) and
//! [`CollisionFilter`](backend::CollisionFilter) traits; this crate owns no
//! solver and computes no contact forces. What it does own:
//!
//! - [`Frame`](frame::Frame): a pose optionally parented to a scene-graph
//!   entity, with relative-to-ancestor transform queries.
//! - [`AttachmentPair`](attachment::AttachmentPair): the two frames of a
//!   joint, with optional world-pose synchronization from the reference
//!   frame to the connected frame.
//! - [`ElementaryConstraint`](constraint::elementary::ElementaryConstraint):
//!   a managed handle to one degree-of-freedom restriction or actuator
//!   inside a native joint, discovered from a disposable probe joint and
//!   late-bound to the real joint at every initialize.
//! - [`Constraint`](constraint::Constraint): the joint component driving the
//!   create → initialize → destroy lifecycle and the collision-filtering
//!   policy.
//!
//! Add the [`TetherPlugin`](plugin::TetherPlugin) and insert the
//! [`EngineBackend`](backend::EngineBackend) and
//! [`EngineCollisionFilter`](backend::EngineCollisionFilter) resources for
//! your engine, then spawn [`Constraint`](constraint::Constraint) components
//! created through [`Constraint::create`](constraint::Constraint::create).

pub mod attachment;
pub mod backend;
pub mod constraint;
pub mod frame;
pub mod math;
pub mod plugin;
pub mod rigid_body;

/// Re-exports common components, resources, and types.
pub mod prelude {
    pub use crate::{
        attachment::AttachmentPair,
        backend::{
            BackendError, CollisionFilter, EngineBackend, EngineCollisionFilter, FilterTarget,
            JointBackend, NativeBodyId, NativeElementId, NativeJointId,
        },
        constraint::{
            CollisionsState, Constraint, ConstraintError, ConstraintState, ConstraintType,
            discovery::{DiscoveryError, JointSchema, SchemaEntry, discover_schema},
            elementary::{ElementaryConstraint, ElementaryKind},
        },
        frame::{Frame, FrameError, FrameHelper},
        math::{Pose, Quaternion, Scalar, Vector},
        plugin::{ConstraintPending, TetherPlugin, TetherSet},
        rigid_body::RigidBody,
    };
}
