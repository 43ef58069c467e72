use nalgebra::{Matrix3, Rotation3, Unit, Vector3};
use crate::Vector;

/// Orientation of a sensor with respect to the global frame, as a 3×3 matrix
/// whose columns are the images of the local axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation(pub Matrix3<f32>);

impl Default for Rotation {
    fn default() -> Self { Self::identity() }
}

impl Rotation {

    pub fn identity() -> Self { Self(Matrix3::identity()) }

    /// Build from row-major components. No check is made that the result is
    /// orthonormal: see `is_orthonormal`.
    pub fn from_rows(rows: [[f32; 3]; 3]) -> Self {
        let [a, b, c] = rows;
        Self(Matrix3::new(
            a[0], a[1], a[2],
            b[0], b[1], b[2],
            c[0], c[1], c[2],
        ))
    }

    /// Right-handed rotation by `angle` radians about `axis`
    pub fn about_axis(axis: Vector, angle: f32) -> Self {
        let axis = Unit::new_normalize(Vector3::from(axis));
        Self(Rotation3::from_axis_angle(&axis, angle).into_inner())
    }

    /// `Rᵀ R = I` within `tolerance`, element by element
    pub fn is_orthonormal(&self, tolerance: f32) -> bool {
        let m = self.0;
        let deviation = m.transpose() * m - Matrix3::identity();
        m.iter().all(|e| e.is_finite()) && deviation.amax() <= tolerance
    }

    pub fn apply(&self, v: Vector) -> Vector {
        (self.0 * Vector3::from(v)).into()
    }

    /// Apply the inverse rotation (the transpose, for orthonormal matrices)
    pub fn apply_inverse(&self, v: Vector) -> Vector {
        (self.0.transpose() * Vector3::from(v)).into()
    }
}
