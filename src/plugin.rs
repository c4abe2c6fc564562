//! Plugin and scheduling for the constraint binding layer.

use bevy::{
    ecs::{intern::Interned, schedule::ScheduleLabel},
    prelude::*,
};

use crate::{
    attachment::synchronize_attachment_pairs,
    backend::{EngineBackend, EngineCollisionFilter},
    constraint::Constraint,
    frame::FrameHelper,
    rigid_body::RigidBody,
};

/// A plugin that keeps managed constraints mirrored into the native engine.
///
/// Every tick, in the configured schedule:
///
/// 1. [`TetherSet::SynchronizeFrames`] synchronizes every constraint's
///    attachment pair, so the engine consumes up-to-date frame data.
/// 2. [`TetherSet::Initialize`] initializes constraints marked with
///    [`ConstraintPending`]. The marker is inserted automatically when a
///    [`Constraint`] component is added, and removed after exactly one
///    attempt: failed initializes are reported, never retried automatically.
///    Re-insert the marker to request another attempt.
///
/// Removing a [`Constraint`] component (or despawning its entity) tears the
/// native joint down through an observer.
///
/// The host driver is expected to insert the [`EngineBackend`] and
/// [`EngineCollisionFilter`] resources; initialization is skipped while
/// either is missing.
pub struct TetherPlugin {
    schedule: Interned<dyn ScheduleLabel>,
}

impl TetherPlugin {
    /// Creates a [`TetherPlugin`] running in the given schedule.
    ///
    /// The default schedule is `PostUpdate`.
    pub fn new(schedule: impl ScheduleLabel) -> Self {
        Self {
            schedule: schedule.intern(),
        }
    }
}

impl Default for TetherPlugin {
    fn default() -> Self {
        Self::new(PostUpdate)
    }
}

impl Plugin for TetherPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<RigidBody>()
            .register_type::<Constraint>()
            .register_type::<ConstraintPending>();

        app.configure_sets(
            self.schedule,
            (TetherSet::SynchronizeFrames, TetherSet::Initialize).chain(),
        );

        app.add_systems(
            self.schedule,
            synchronize_attachment_pairs.in_set(TetherSet::SynchronizeFrames),
        );
        app.add_systems(
            self.schedule,
            initialize_pending_constraints
                .run_if(
                    resource_exists::<EngineBackend>.and(resource_exists::<EngineCollisionFilter>),
                )
                .in_set(TetherSet::Initialize),
        );

        // Mark new constraints for a single initialization attempt.
        app.add_observer(
            |trigger: Trigger<OnAdd, Constraint>, mut commands: Commands| {
                commands.entity(trigger.target()).insert(ConstraintPending);
            },
        );

        // Tear down the native joint when the constraint goes away.
        app.add_observer(
            |trigger: Trigger<OnRemove, Constraint>,
             mut constraints: Query<&mut Constraint>,
             backend: Option<ResMut<EngineBackend>>| {
                let Some(mut backend) = backend else {
                    return;
                };
                if let Ok(mut constraint) = constraints.get_mut(trigger.target()) {
                    constraint.destroy(backend.0.as_mut());
                }
            },
        );
    }
}

/// System sets for the constraint binding layer.
#[derive(SystemSet, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TetherSet {
    /// Attachment pairs copy their reference frame's world pose onto their
    /// connected frame. Runs before any initialization or engine stepping.
    SynchronizeFrames,
    /// Pending constraints are mirrored into the native engine.
    Initialize,
}

/// Marks a [`Constraint`] for one initialization attempt.
///
/// Inserted automatically when the constraint is added; removed after the
/// attempt whether or not it succeeded.
#[derive(Component, Clone, Copy, Debug, Default, Reflect)]
#[reflect(Component, Debug, Default)]
pub struct ConstraintPending;

fn initialize_pending_constraints(
    mut commands: Commands,
    mut constraints: Query<(Entity, &mut Constraint), With<ConstraintPending>>,
    frames: FrameHelper,
    mut backend: ResMut<EngineBackend>,
    mut filter: ResMut<EngineCollisionFilter>,
) {
    for (entity, mut constraint) in &mut constraints {
        constraint.initialize(entity, &frames, backend.0.as_mut(), filter.0.as_mut());
        commands.entity(entity).remove::<ConstraintPending>();
    }
}
