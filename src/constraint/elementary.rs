//! Managed elementary constraints: the per-degree-of-freedom restrictions
//! and actuators that compose a native joint.

use bevy::{log::warn, prelude::*};

use crate::{
    backend::{JointBackend, NativeElementId},
    math::Scalar,
};

use super::ConstraintError;

/// The kind of an elementary constraint, derived from the name the native
/// engine reports for it during schema discovery.
///
/// Ordinary kinds are geometric restrictions; controller kinds are
/// motor/range/lock-style actuators layered on top of the free degrees of
/// freedom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", reflect(Serialize, Deserialize))]
#[reflect(Debug, PartialEq)]
pub enum ElementaryKind {
    /// Point coincidence between the two joint frames.
    Point,
    /// Axis alignment between the two joint frames.
    Axis,
    /// Confinement of one frame's origin to a plane of the other.
    Plane,
    /// Full relative-rotation lock.
    Rotation,
    /// Fixed separation between the two frame origins.
    Distance,
    /// A velocity controller on a free degree of freedom.
    Motor,
    /// A limit on the allowed extent of a free degree of freedom.
    Range,
    /// A position lock on a free degree of freedom.
    Lock,
    /// A dry-friction brake on a free degree of freedom.
    Friction,
}

impl ElementaryKind {
    /// Whether this kind is a controller (actuator) rather than an ordinary
    /// geometric restriction.
    pub const fn is_controller(self) -> bool {
        matches!(self, Self::Motor | Self::Range | Self::Lock | Self::Friction)
    }
}

/// Maps an engine-reported element name to its kind.
///
/// The leading token of the name identifies the kind; an optional
/// `_`-separated suffix distinguishes per-axis duplicates (`motor_u`,
/// `range_rot`, ...). Unknown tokens yield `None`, which schema discovery
/// treats as fatal.
pub(crate) fn classify(name: &str) -> Option<ElementaryKind> {
    let token = name.split('_').next().unwrap_or(name);
    match token {
        "point" => Some(ElementaryKind::Point),
        "axis" => Some(ElementaryKind::Axis),
        "plane" => Some(ElementaryKind::Plane),
        "rotation" => Some(ElementaryKind::Rotation),
        "distance" => Some(ElementaryKind::Distance),
        "motor" => Some(ElementaryKind::Motor),
        "range" => Some(ElementaryKind::Range),
        "lock" => Some(ElementaryKind::Lock),
        "friction" => Some(ElementaryKind::Friction),
        _ => None,
    }
}

/// A managed elementary constraint, discovered once from a probe joint and
/// re-bound to the corresponding element of the real native joint at every
/// constraint initialize.
///
/// The managed object persists across initialize/destroy cycles; only the
/// native binding comes and goes. Configuration is cached locally and pushed
/// to the native element when bound. Native-mutating methods require a live
/// binding and fail with [`ConstraintError::NotBound`] otherwise; use the
/// `with_*` builders for configuration before the first initialize.
#[derive(Clone, Debug, PartialEq, Reflect)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", reflect(Serialize, Deserialize))]
#[reflect(Debug, PartialEq)]
pub struct ElementaryConstraint {
    name: String,
    ordinal: usize,
    kind: ElementaryKind,
    enabled: bool,
    compliance: Scalar,
    damping: Scalar,
    target: Scalar,
    #[reflect(ignore)]
    #[cfg_attr(feature = "serialize", serde(skip))]
    binding: Option<NativeElementId>,
}

impl ElementaryConstraint {
    /// Creates a managed elementary constraint from a discovered schema entry.
    ///
    /// Ordinary constraints start enabled; controllers start disabled.
    pub(crate) fn from_schema(name: String, ordinal: usize, kind: ElementaryKind) -> Self {
        Self {
            name,
            ordinal,
            kind,
            enabled: !kind.is_controller(),
            compliance: 0.0,
            damping: 0.0,
            target: 0.0,
            binding: None,
        }
    }

    /// The engine-reported name identifying the degree of freedom.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The position of this constraint within its owning joint's ordinary or
    /// controller list, as reported at discovery. Binding fetches the same
    /// ordinal from the real joint.
    pub const fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// The kind of the constraint.
    pub const fn kind(&self) -> ElementaryKind {
        self.kind
    }

    /// Whether this is a controller-style constraint.
    pub const fn is_controller(&self) -> bool {
        self.kind.is_controller()
    }

    /// Whether the constraint is enabled.
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// The cached compliance (inverse stiffness).
    pub const fn compliance(&self) -> Scalar {
        self.compliance
    }

    /// The cached damping.
    pub const fn damping(&self) -> Scalar {
        self.damping
    }

    /// The cached controller target.
    pub const fn target(&self) -> Scalar {
        self.target
    }

    /// The native element this constraint is currently bound to, if any.
    pub const fn binding(&self) -> Option<NativeElementId> {
        self.binding
    }

    /// Sets the enabled flag before the first bind.
    #[inline]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the compliance before the first bind.
    #[inline]
    pub fn with_compliance(mut self, compliance: Scalar) -> Self {
        self.compliance = compliance;
        self
    }

    /// Sets the damping before the first bind.
    #[inline]
    pub fn with_damping(mut self, damping: Scalar) -> Self {
        self.damping = damping;
        self
    }

    /// Sets the controller target before the first bind.
    /// Has no effect on ordinary constraints.
    #[inline]
    pub fn with_target(mut self, target: Scalar) -> Self {
        if self.kind.is_controller() {
            self.target = target;
        } else {
            warn!("elementary constraint {:?} is not a controller, ignoring target", self.name);
        }
        self
    }

    /// Binds the managed constraint to a native element and pushes the cached
    /// configuration to it.
    pub(crate) fn bind(&mut self, element: NativeElementId, backend: &mut dyn JointBackend) {
        self.binding = Some(element);
        backend.set_element_enabled(element, self.enabled);
        backend.set_element_compliance(element, self.compliance);
        backend.set_element_damping(element, self.damping);
        if self.kind.is_controller() {
            backend.set_controller_target(element, self.target);
        }
    }

    /// Releases the native binding. The managed state is kept so that a later
    /// re-initialize can re-bind.
    pub(crate) fn unbind(&mut self) {
        self.binding = None;
    }

    /// Enables or disables the bound native element.
    pub fn set_enabled(
        &mut self,
        enabled: bool,
        backend: &mut dyn JointBackend,
    ) -> Result<(), ConstraintError> {
        let element = self.bound_element()?;
        self.enabled = enabled;
        backend.set_element_enabled(element, enabled);
        Ok(())
    }

    /// Sets the compliance of the bound native element.
    pub fn set_compliance(
        &mut self,
        compliance: Scalar,
        backend: &mut dyn JointBackend,
    ) -> Result<(), ConstraintError> {
        let element = self.bound_element()?;
        self.compliance = compliance;
        backend.set_element_compliance(element, compliance);
        Ok(())
    }

    /// Sets the damping of the bound native element.
    pub fn set_damping(
        &mut self,
        damping: Scalar,
        backend: &mut dyn JointBackend,
    ) -> Result<(), ConstraintError> {
        let element = self.bound_element()?;
        self.damping = damping;
        backend.set_element_damping(element, damping);
        Ok(())
    }

    /// Sets the target of the bound native controller.
    pub fn set_target(
        &mut self,
        target: Scalar,
        backend: &mut dyn JointBackend,
    ) -> Result<(), ConstraintError> {
        let element = self.bound_element()?;
        if !self.kind.is_controller() {
            warn!("elementary constraint {:?} is not a controller, ignoring target", self.name);
            return Ok(());
        }
        self.target = target;
        backend.set_controller_target(element, target);
        Ok(())
    }

    fn bound_element(&self) -> Result<NativeElementId, ConstraintError> {
        self.binding
            .ok_or_else(|| ConstraintError::NotBound(self.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{backend::mock::MockEngine, constraint::ConstraintType, math::Pose};

    #[test]
    fn classify_known_tokens() {
        assert_eq!(classify("point"), Some(ElementaryKind::Point));
        assert_eq!(classify("axis"), Some(ElementaryKind::Axis));
        assert_eq!(classify("motor"), Some(ElementaryKind::Motor));
        assert_eq!(classify("motor_u"), Some(ElementaryKind::Motor));
        assert_eq!(classify("range_trans"), Some(ElementaryKind::Range));
        assert_eq!(classify("lock_rot"), Some(ElementaryKind::Lock));
        assert_eq!(classify("warble"), None);
        assert_eq!(classify("warble_point"), None);
    }

    #[test]
    fn controller_kinds() {
        assert!(ElementaryKind::Motor.is_controller());
        assert!(ElementaryKind::Range.is_controller());
        assert!(ElementaryKind::Lock.is_controller());
        assert!(ElementaryKind::Friction.is_controller());
        assert!(!ElementaryKind::Point.is_controller());
        assert!(!ElementaryKind::Distance.is_controller());
    }

    #[test]
    fn bind_pushes_cached_configuration() {
        let mut engine = MockEngine::default();
        let joint = JointBackend::create_joint(
            &mut engine,
            ConstraintType::Revolute,
            None,
            Pose::IDENTITY,
            None,
            Pose::IDENTITY,
        )
        .unwrap();
        let element = engine.controller_constraint(joint, 0).unwrap();

        let mut motor = ElementaryConstraint::from_schema("motor".to_string(), 0, ElementaryKind::Motor)
            .with_enabled(true)
            .with_compliance(1e-6)
            .with_damping(0.05)
            .with_target(2.5);
        motor.bind(element, &mut engine);

        let native = engine.element(element).unwrap();
        assert!(native.enabled);
        assert_eq!(native.compliance, 1e-6);
        assert_eq!(native.damping, 0.05);
        assert_eq!(native.target, 2.5);
    }

    #[test]
    fn mutating_an_unbound_constraint_fails() {
        let mut engine = MockEngine::default();
        let mut motor =
            ElementaryConstraint::from_schema("motor".to_string(), 0, ElementaryKind::Motor);

        assert!(matches!(
            motor.set_enabled(true, &mut engine),
            Err(ConstraintError::NotBound(_))
        ));
        assert!(matches!(
            motor.set_target(1.0, &mut engine),
            Err(ConstraintError::NotBound(_))
        ));
        // The cached value was not touched by the failed mutation.
        assert!(!motor.enabled());
        assert_eq!(motor.target(), 0.0);
    }

    #[test]
    fn unbind_keeps_managed_state() {
        let mut engine = MockEngine::default();
        let joint = JointBackend::create_joint(
            &mut engine,
            ConstraintType::Distance,
            None,
            Pose::IDENTITY,
            None,
            Pose::IDENTITY,
        )
        .unwrap();
        let element = engine.ordinary_constraint(joint, 0).unwrap();

        let mut distance = ElementaryConstraint::from_schema(
            "distance".to_string(),
            0,
            ElementaryKind::Distance,
        )
        .with_compliance(1e-4);
        distance.bind(element, &mut engine);
        distance.unbind();

        assert_eq!(distance.binding(), None);
        assert_eq!(distance.compliance(), 1e-4);
    }
}
