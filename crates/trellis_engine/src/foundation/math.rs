//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the handful of matrix builders the
//! transform hierarchy composes world matrices from.

pub use nalgebra::{Matrix4, Quaternion, Unit, UnitQuaternion, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Local axis a node looks along when its rotation is the identity
pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);

/// Local right axis
pub const RIGHT: Vec3 = Vec3::new(1.0, 0.0, 0.0);

/// Local up axis
pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Local position, rotation and scale of a node relative to its parent
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position relative to the parent
    pub position: Vec3,

    /// Rotation relative to the parent
    pub rotation: Quat,

    /// Scale factors relative to the parent
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Builder pattern: set scale (non-uniform)
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Builder pattern: set scale (uniform)
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Builder pattern: set rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Convert to a transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        translate(self.position) * rotate(self.rotation) * scale(self.scale)
    }
}

/// Translation matrix
pub fn translate(translation: Vec3) -> Mat4 {
    Mat4::new_translation(&translation)
}

/// Rotation matrix from a unit quaternion
pub fn rotate(rotation: Quat) -> Mat4 {
    rotation.to_homogeneous()
}

/// Non-uniform scaling matrix
pub fn scale(factors: Vec3) -> Mat4 {
    Mat4::new_nonuniform_scaling(&factors)
}

/// Rotation matrix around the X axis
pub fn rotate_ox(radians: f32) -> Mat4 {
    rotate(Quat::from_axis_angle(&Vec3::x_axis(), radians))
}

/// Rotation matrix around the Y axis
pub fn rotate_oy(radians: f32) -> Mat4 {
    rotate(Quat::from_axis_angle(&Vec3::y_axis(), radians))
}

/// Rotation matrix around the Z axis
pub fn rotate_oz(radians: f32) -> Mat4 {
    rotate(Quat::from_axis_angle(&Vec3::z_axis(), radians))
}

/// Rotation from XYZ euler angles (radians), applied as `Rz * Ry * Rx`
pub fn quat_from_euler(angles: Vec3) -> Quat {
    Quat::from_euler_angles(angles.x, angles.y, angles.z)
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_trs_matrix_matches_components() {
        let transform = Transform::from_position_rotation(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&Vec3::y_axis(), constants::HALF_PI),
        )
        .with_scale(Vec3::new(2.0, 1.0, 1.0));

        let matrix = transform.to_matrix();
        let point = matrix.transform_point(&Point3::new(1.0, 0.0, 0.0));

        // (1,0,0) scaled to (2,0,0), rotated 90 degrees around Y to (0,0,-2), then translated
        assert_relative_eq!(point, Point3::new(1.0, 2.0, 1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_axis_rotations_agree_with_quaternions() {
        let angle = 0.3;
        assert_relative_eq!(
            rotate_oy(angle),
            Quat::from_axis_angle(&Vec3::y_axis(), angle).to_homogeneous(),
            epsilon = EPSILON
        );
        assert_relative_eq!(rotate_ox(0.0), Mat4::identity(), epsilon = EPSILON);
        assert_relative_eq!(rotate_oz(0.0), Mat4::identity(), epsilon = EPSILON);
    }

    #[test]
    fn test_euler_order_is_zyx() {
        let angles = Vec3::new(0.2, -0.4, 0.7);
        let expected = Quat::from_axis_angle(&Vec3::z_axis(), angles.z)
            * Quat::from_axis_angle(&Vec3::y_axis(), angles.y)
            * Quat::from_axis_angle(&Vec3::x_axis(), angles.x);

        let actual = quat_from_euler(angles);
        assert!(actual.angle_to(&expected) < EPSILON);
    }
}
