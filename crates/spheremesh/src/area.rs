/// Signed spherical excess of the triangle with unit-length corners,
/// positive for counterclockwise winding seen from outside the sphere.
pub fn triangle_area(
  a: &na::Vector3<f64>,
  b: &na::Vector3<f64>,
  c: &na::Vector3<f64>,
) -> f64 {
  // Van Oosterom-Strackee solid angle formula.
  let numer = a.dot(&b.cross(c));
  let denom = 1.0 + a.dot(b) + b.dot(c) + c.dot(a);
  2.0 * numer.atan2(denom)
}

/// Great-circle area of a spherical polygon, fan-triangulated on its first
/// vertex.
pub fn face_area(coords: &[na::Vector3<f64>]) -> f64 {
  assert!(coords.len() >= 3);
  let v0 = &coords[0];
  (1..coords.len() - 1)
    .map(|k| triangle_area(v0, &coords[k], &coords[k + 1]))
    .sum()
}

#[cfg(test)]
mod test {
  use super::*;

  use approx::assert_relative_eq;
  use std::f64::consts::PI;

  #[test]
  fn octant_triangle() {
    let a = na::Vector3::x();
    let b = na::Vector3::y();
    let c = na::Vector3::z();
    assert_relative_eq!(triangle_area(&a, &b, &c), PI / 2.0, epsilon = 1e-14);
    // Clockwise winding flips the sign.
    assert_relative_eq!(triangle_area(&a, &c, &b), -PI / 2.0, epsilon = 1e-14);
  }

  #[test]
  fn fan_splits_are_additive() {
    let v0 = na::Vector3::new(1.0, -0.2, -0.2).normalize();
    let v1 = na::Vector3::new(1.0, 0.2, -0.2).normalize();
    let v2 = na::Vector3::new(1.0, 0.2, 0.2).normalize();
    let v3 = na::Vector3::new(1.0, -0.2, 0.2).normalize();
    let quad = face_area(&[v0, v1, v2, v3]);
    let tris = triangle_area(&v0, &v1, &v2) + triangle_area(&v0, &v2, &v3);
    assert_relative_eq!(quad, tris, epsilon = 1e-15);
    assert!(quad > 0.0);
  }
}
