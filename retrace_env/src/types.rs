//! Common types for the Retrace host abstraction.

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Identity of a tracker in the host scene.
///
/// The name doubles as the needle searched for (case-insensitively) in the
/// trial table's tracker column headers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackerId(pub String);

impl TrackerId {
    /// Creates a tracker identity from any string-like name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the tracker name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TrackerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TrackerId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl std::fmt::Display for TrackerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A position + orientation pair, as applied to a scene entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position in the recording's world frame
    pub position: Vector3<f64>,

    /// Orientation in the recording's world frame
    pub rotation: UnitQuaternion<f64>,
}

impl Pose {
    /// Creates a pose from a position and rotation.
    pub fn new(position: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self { position, rotation }
    }

    /// Creates a pose from a position and Euler angles in degrees.
    ///
    /// Angles follow the recording engine's convention: the rotation is
    /// applied about Z first, then X, then Y (`q = q_y * q_x * q_z`).
    pub fn from_euler_degrees(position: Vector3<f64>, rot_x: f64, rot_y: f64, rot_z: f64) -> Self {
        let qx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), rot_x.to_radians());
        let qy = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), rot_y.to_radians());
        let qz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), rot_z.to_radians());

        Self {
            position,
            rotation: qy * qx * qz,
        }
    }

    /// The identity pose at the origin.
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}
