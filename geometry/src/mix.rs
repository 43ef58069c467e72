//! Conversions between the local geometry types and `nalgebra`'s

use nalgebra::{Point3, Vector3};
use crate::{Point, Vector};

impl From<Point3<f32>> for Point {
    fn from(p: Point3<f32>) -> Self { Self::new(p.x, p.y, p.z) }
}

impl From<Point> for Point3<f32> {
    fn from(p: Point) -> Self { Self::new(p.x, p.y, p.z) }
}

impl From<Vector3<f32>> for Vector {
    fn from(v: Vector3<f32>) -> Self { Self::new(v.x, v.y, v.z) }
}

impl From<Vector> for Vector3<f32> {
    fn from(v: Vector) -> Self { Self::new(v.x, v.y, v.z) }
}

impl From<&Point> for Point3<f32> {
    fn from(p: &Point) -> Self { (*p).into() }
}

impl From<&Vector> for Vector3<f32> {
    fn from(v: &Vector) -> Self { (*v).into() }
}
