//! glam <-> nalgebra conversions at the rapier boundary.

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::{Isometry, Point, Real, Vector};

#[inline]
pub(crate) fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

#[inline]
pub(crate) fn to_point(v: Vec3) -> Point<Real> {
    Point::new(v.x, v.y, v.z)
}

#[inline]
pub(crate) fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
pub(crate) fn from_point(p: &Point<Real>) -> Vec3 {
    Vec3::new(p.x, p.y, p.z)
}

#[inline]
pub(crate) fn to_rotation(q: Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

#[inline]
pub(crate) fn from_rotation(r: &UnitQuaternion<Real>) -> Quat {
    let c = r.coords;
    Quat::from_xyzw(c.x, c.y, c.z, c.w)
}

#[inline]
pub(crate) fn to_isometry(translation: Vec3, rotation: Quat) -> Isometry<Real> {
    Isometry::from_parts(
        Translation3::new(translation.x, translation.y, translation.z),
        to_rotation(rotation),
    )
}
