use nalgebra::{Matrix4, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Editable joint pose, composed as `translation * rotation * scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub translation: [f32; 3],
    /// Euler angles in radians, applied roll (x), pitch (y), yaw (z).
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl Transform {
    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: [x, y, z],
            ..Self::default()
        }
    }

    pub fn rotation_quaternion(&self) -> UnitQuaternion<f32> {
        let [roll, pitch, yaw] = self.rotation;
        UnitQuaternion::from_euler_angles(roll, pitch, yaw)
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        let [tx, ty, tz] = self.translation;
        let translation = Translation3::new(tx, ty, tz).to_homogeneous();
        let rotation = self.rotation_quaternion().to_homogeneous();
        let scale = Matrix4::new_nonuniform_scaling(&Vector3::from(self.scale));
        translation * rotation * scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn given_default_transform_when_converting_then_matrix_is_identity() {
        assert_eq!(Transform::default().to_matrix(), Matrix4::identity());
    }

    #[test]
    fn given_scale_rotation_translation_when_transforming_point_then_scale_applies_first() {
        let transform = Transform {
            translation: [0.0, 0.0, 5.0],
            rotation: [0.0, 0.0, std::f32::consts::FRAC_PI_2],
            scale: [2.0, 1.0, 1.0],
        };

        let moved = transform
            .to_matrix()
            .transform_point(&Point3::new(1.0, 0.0, 0.0));

        assert!((moved - Point3::new(0.0, 2.0, 5.0)).norm() < 1e-5);
    }

    #[test]
    fn given_partial_json_when_deserializing_then_missing_fields_default() {
        let transform: Transform =
            serde_json::from_str(r#"{"translation": [1.0, 2.0, 3.0]}"#).expect("parse transform");

        assert_eq!(transform, Transform::from_translation(1.0, 2.0, 3.0));
    }
}
