//! Math types and the [`Pose`] rigid isometry used throughout the crate.

use bevy::prelude::*;
use core::ops::Mul;

/// The floating point type used for all pose math.
pub type Scalar = f32;

/// The vector type used for positions and translations.
pub type Vector = Vec3;

/// The quaternion type used for orientations.
pub type Quaternion = Quat;

/// A rigid transformation consisting of a translation and a rotation.
///
/// Unlike [`Transform`], a [`Pose`] carries no scale. Frame and joint math
/// is defined purely on isometries; any scale on scene-graph nodes is ignored.
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", reflect(Serialize, Deserialize))]
#[reflect(Debug, PartialEq)]
pub struct Pose {
    /// The translation part.
    pub position: Vector,
    /// The rotation part. Assumed to be normalized.
    pub rotation: Quaternion,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// The identity pose.
    pub const IDENTITY: Self = Self {
        position: Vector::ZERO,
        rotation: Quaternion::IDENTITY,
    };

    /// Creates a [`Pose`] from a translation and a rotation.
    #[inline]
    pub const fn new(position: Vector, rotation: Quaternion) -> Self {
        Self { position, rotation }
    }

    /// Creates a [`Pose`] from the translation and rotation of a [`Transform`],
    /// ignoring its scale.
    #[inline]
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            position: transform.translation,
            rotation: transform.rotation,
        }
    }

    /// Transforms a point from the local space of this pose into its parent space.
    #[inline]
    pub fn transform_point(&self, point: Vector) -> Vector {
        self.position + self.rotation * point
    }

    /// Returns the inverse of this pose.
    #[inline]
    pub fn inverse(&self) -> Self {
        let inverse_rotation = self.rotation.inverse();
        Self {
            position: inverse_rotation * -self.position,
            rotation: inverse_rotation,
        }
    }
}

impl Mul for Pose {
    type Output = Pose;

    /// Composes two poses. `a * b` first applies `b`, then `a`.
    #[inline]
    fn mul(self, rhs: Pose) -> Pose {
        Pose {
            position: self.transform_point(rhs.position),
            rotation: self.rotation * rhs.rotation,
        }
    }
}
