//! A deterministic in-memory engine used by the crate's tests.
//!
//! The mock reports a fixed elementary-constraint schema per joint type,
//! keeps live-handle accounting so tests can assert that probe joints never
//! leak, and supports injecting construction, naming, element-count, and
//! registration failures.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use bevy::prelude::*;

use crate::{
    constraint::ConstraintType,
    math::{Pose, Scalar},
};

use super::{
    BackendError, CollisionFilter, FilterTarget, JointBackend, NativeBodyId, NativeElementId,
    NativeJointId,
};

/// The element names the mock engine reports for each joint type.
fn schema(kind: ConstraintType) -> (&'static [&'static str], &'static [&'static str]) {
    match kind {
        ConstraintType::Fixed => (&["point", "rotation"], &[]),
        ConstraintType::Revolute => (&["point", "axis"], &["motor", "range", "lock", "friction"]),
        ConstraintType::Prismatic => (&["axis", "plane"], &["motor", "range", "lock", "friction"]),
        ConstraintType::Spherical => (
            &["point"],
            &["motor_u", "motor_v", "motor_n", "range_u", "range_v", "range_n"],
        ),
        ConstraintType::Cylindrical => (
            &["axis", "plane"],
            &[
                "motor_rot",
                "motor_trans",
                "range_rot",
                "range_trans",
                "lock_rot",
                "lock_trans",
            ],
        ),
        ConstraintType::Distance => (&["distance"], &["motor", "range", "lock"]),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MockElement {
    pub name: String,
    pub enabled: bool,
    pub compliance: Scalar,
    pub damping: Scalar,
    pub target: Scalar,
}

#[derive(Clone, Debug)]
pub(crate) struct MockJoint {
    pub kind: ConstraintType,
    pub body1: Option<NativeBodyId>,
    pub body2: Option<NativeBodyId>,
    pub frame1: Pose,
    pub frame2: Pose,
    pub ordinary: Vec<NativeElementId>,
    pub controllers: Vec<NativeElementId>,
}

#[derive(Default)]
struct EngineState {
    next_id: u64,
    bodies: HashMap<Entity, NativeBodyId>,
    joints: HashMap<NativeJointId, MockJoint>,
    elements: HashMap<NativeElementId, MockElement>,
    registered: Vec<NativeJointId>,
    joints_created: usize,
    joints_destroyed: usize,
    fail_construction: bool,
    fail_registration: bool,
    report_unknown_names: bool,
    drop_last_ordinary: bool,
    hide_last_ordinary: bool,
}

impl EngineState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A shareable mock engine. Clones refer to the same underlying state,
/// letting a test keep a handle for inspection while the crate owns another
/// through the [`EngineBackend`](super::EngineBackend) resource.
#[derive(Clone, Default)]
pub(crate) struct MockEngine {
    state: Arc<Mutex<EngineState>>,
}

impl MockEngine {
    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap()
    }

    pub fn live_joints(&self) -> usize {
        self.state().joints.len()
    }

    pub fn joints_created(&self) -> usize {
        self.state().joints_created
    }

    pub fn joints_destroyed(&self) -> usize {
        self.state().joints_destroyed
    }

    pub fn registered_joints(&self) -> Vec<NativeJointId> {
        self.state().registered.clone()
    }

    pub fn joint(&self, joint: NativeJointId) -> Option<MockJoint> {
        self.state().joints.get(&joint).cloned()
    }

    pub fn element(&self, element: NativeElementId) -> Option<MockElement> {
        self.state().elements.get(&element).cloned()
    }

    pub fn body_for(&self, entity: Entity) -> Option<NativeBodyId> {
        self.state().bodies.get(&entity).copied()
    }

    pub fn set_fail_construction(&self, fail: bool) {
        self.state().fail_construction = fail;
    }

    pub fn set_fail_registration(&self, fail: bool) {
        self.state().fail_registration = fail;
    }

    pub fn set_report_unknown_names(&self, report: bool) {
        self.state().report_unknown_names = report;
    }

    pub fn set_drop_last_ordinary(&self, drop: bool) {
        self.state().drop_last_ordinary = drop;
    }

    /// Makes joints report their full ordinary count while yielding no
    /// element at the last ordinal.
    pub fn set_hide_last_ordinary(&self, hide: bool) {
        self.state().hide_last_ordinary = hide;
    }
}

impl JointBackend for MockEngine {
    fn acquire_body(&mut self, entity: Entity) -> NativeBodyId {
        let mut state = self.state();
        if let Some(body) = state.bodies.get(&entity) {
            return *body;
        }
        let body = NativeBodyId(state.next_id());
        state.bodies.insert(entity, body);
        body
    }

    fn create_joint(
        &mut self,
        kind: ConstraintType,
        body1: Option<NativeBodyId>,
        frame1: Pose,
        body2: Option<NativeBodyId>,
        frame2: Pose,
    ) -> Result<NativeJointId, BackendError> {
        let mut state = self.state();
        if state.fail_construction {
            return Err(BackendError::Construction("injected failure".to_string()));
        }

        let (ordinary_names, controller_names) = schema(kind);
        let mut ordinary_names: Vec<String> =
            ordinary_names.iter().map(ToString::to_string).collect();
        let mut controller_names: Vec<String> =
            controller_names.iter().map(ToString::to_string).collect();
        if state.report_unknown_names {
            for name in ordinary_names.iter_mut().chain(controller_names.iter_mut()) {
                *name = format!("warble_{name}");
            }
        }
        if state.drop_last_ordinary {
            ordinary_names.pop();
        }

        let mut spawn_elements = |state: &mut EngineState, names: Vec<String>, enabled: bool| {
            names
                .into_iter()
                .map(|name| {
                    let element = NativeElementId(state.next_id());
                    state.elements.insert(
                        element,
                        MockElement {
                            name,
                            enabled,
                            compliance: 0.0,
                            damping: 0.0,
                            target: 0.0,
                        },
                    );
                    element
                })
                .collect::<Vec<_>>()
        };
        let ordinary = spawn_elements(&mut state, ordinary_names, true);
        let controllers = spawn_elements(&mut state, controller_names, false);

        let joint = NativeJointId(state.next_id());
        state.joints.insert(
            joint,
            MockJoint {
                kind,
                body1,
                body2,
                frame1,
                frame2,
                ordinary,
                controllers,
            },
        );
        state.joints_created += 1;
        Ok(joint)
    }

    fn ordinary_constraint_count(&self, joint: NativeJointId) -> usize {
        self.state()
            .joints
            .get(&joint)
            .map_or(0, |joint| joint.ordinary.len())
    }

    fn controller_constraint_count(&self, joint: NativeJointId) -> usize {
        self.state()
            .joints
            .get(&joint)
            .map_or(0, |joint| joint.controllers.len())
    }

    fn ordinary_constraint(
        &self,
        joint: NativeJointId,
        ordinal: usize,
    ) -> Option<NativeElementId> {
        let state = self.state();
        let joint = state.joints.get(&joint)?;
        if state.hide_last_ordinary && ordinal + 1 == joint.ordinary.len() {
            return None;
        }
        joint.ordinary.get(ordinal).copied()
    }

    fn controller_constraint(
        &self,
        joint: NativeJointId,
        ordinal: usize,
    ) -> Option<NativeElementId> {
        self.state()
            .joints
            .get(&joint)
            .and_then(|joint| joint.controllers.get(ordinal).copied())
    }

    fn element_name(&self, element: NativeElementId) -> Option<String> {
        self.state()
            .elements
            .get(&element)
            .map(|element| element.name.clone())
    }

    fn register_joint(&mut self, joint: NativeJointId) -> bool {
        let mut state = self.state();
        if state.fail_registration || !state.joints.contains_key(&joint) {
            return false;
        }
        if !state.registered.contains(&joint) {
            state.registered.push(joint);
        }
        true
    }

    fn unregister_joint(&mut self, joint: NativeJointId) {
        self.state().registered.retain(|&other| other != joint);
    }

    fn destroy_joint(&mut self, joint: NativeJointId) {
        let mut state = self.state();
        state.registered.retain(|&other| other != joint);
        if let Some(removed) = state.joints.remove(&joint) {
            for element in removed.ordinary.iter().chain(removed.controllers.iter()) {
                state.elements.remove(element);
            }
            state.joints_destroyed += 1;
        }
    }

    fn set_element_enabled(&mut self, element: NativeElementId, enabled: bool) {
        if let Some(element) = self.state().elements.get_mut(&element) {
            element.enabled = enabled;
        }
    }

    fn set_element_compliance(&mut self, element: NativeElementId, compliance: Scalar) {
        if let Some(element) = self.state().elements.get_mut(&element) {
            element.compliance = compliance;
        }
    }

    fn set_element_damping(&mut self, element: NativeElementId, damping: Scalar) {
        if let Some(element) = self.state().elements.get_mut(&element) {
            element.damping = damping;
        }
    }

    fn set_controller_target(&mut self, element: NativeElementId, target: Scalar) {
        if let Some(element) = self.state().elements.get_mut(&element) {
            element.target = target;
        }
    }
}

#[derive(Default)]
struct FilterState {
    memberships: Vec<(String, FilterTarget, bool)>,
    disabled_pairs: Vec<(String, String)>,
}

/// A shareable mock collision filter. Clones share state, like [`MockEngine`].
#[derive(Clone, Default)]
pub(crate) struct MockCollisionFilter {
    state: Arc<Mutex<FilterState>>,
}

impl MockCollisionFilter {
    fn state(&self) -> MutexGuard<'_, FilterState> {
        self.state.lock().unwrap()
    }

    /// The `(target, propagate)` memberships recorded for a group.
    pub fn group_members(&self, group: &str) -> Vec<(FilterTarget, bool)> {
        self.state()
            .memberships
            .iter()
            .filter(|(name, _, _)| name == group)
            .map(|(_, target, propagate)| (*target, *propagate))
            .collect()
    }

    /// Every group name with at least one member.
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state()
            .memberships
            .iter()
            .map(|(name, _, _)| name.clone())
            .collect();
        names.dedup();
        names
    }

    pub fn disabled_pairs(&self) -> Vec<(String, String)> {
        self.state().disabled_pairs.clone()
    }
}

impl CollisionFilter for MockCollisionFilter {
    fn add_to_group(&mut self, target: FilterTarget, group: &str, propagate: bool) {
        self.state()
            .memberships
            .push((group.to_string(), target, propagate));
    }

    fn set_pair_enabled(&mut self, group_a: &str, group_b: &str, enabled: bool) -> bool {
        let mut state = self.state();
        let pair = (group_a.to_string(), group_b.to_string());
        if enabled {
            let was_disabled = state.disabled_pairs.contains(&pair);
            state.disabled_pairs.retain(|other| *other != pair);
            was_disabled
        } else {
            if state.disabled_pairs.contains(&pair) {
                return false;
            }
            state.disabled_pairs.push(pair);
            true
        }
    }
}
