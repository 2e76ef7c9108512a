use crate::matrix::Matrix4;
use crate::DVec3;

/// Translation, axis-angle rotation and scale of a scene part.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: DVec3,
    pub rotation_axis: DVec3,
    /// Rotation about `rotation_axis`, in degrees.
    pub rotation_deg: f64,
    pub scale: DVec3,
}

impl Transform {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            translation: DVec3::ZERO,
            rotation_axis: DVec3::Z,
            rotation_deg: 0.0,
            scale: DVec3::ONE,
        }
    }

    #[inline]
    pub fn from_trs(translation: DVec3, rotation_axis: DVec3, rotation_deg: f64, scale: DVec3) -> Self {
        Self {
            translation,
            rotation_axis,
            rotation_deg,
            scale,
        }
    }

    /// Build matrix = T ∘ R ∘ S (scale applied first).
    pub fn matrix(&self) -> Matrix4 {
        let t = Matrix4::translation(self.translation.x, self.translation.y, self.translation.z);
        let r = Matrix4::rotation(self.rotation_axis, self.rotation_deg);
        let s = Matrix4::scaling(self.scale.x, self.scale.y, self.scale.z);
        *Matrix4::identity().set_multiply_matrices(&[&t, &r, &s])
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
