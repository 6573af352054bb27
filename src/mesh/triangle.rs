use glam::Vec3;

use crate::error::HalaTriangleDefect;

/// Twice the area below which a triangle is degenerate.
const DEGENERATE_CROSS_EPSILON: f32 = 1e-6;

/// Stored normals shorter than this are recomputed from the vertices.
const MIN_NORMAL_LENGTH: f32 = 0.1;

/// A triangle read from a STL file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalaTriangle {
  pub normal: Vec3,
  pub vertices: [Vec3; 3],
}

/// The implementation of the triangle.
impl HalaTriangle {
  /// Create a new triangle.
  /// param normal: The facet normal.
  /// param vertices: The three corners.
  /// return: The triangle.
  pub fn new(normal: Vec3, vertices: [Vec3; 3]) -> Self {
    Self { normal, vertices }
  }

  /// Create a triangle from raw float arrays.
  /// param normal: The facet normal.
  /// param v1: The first corner.
  /// param v2: The second corner.
  /// param v3: The third corner.
  /// return: The triangle.
  pub fn from_arrays(normal: [f32; 3], v1: [f32; 3], v2: [f32; 3], v3: [f32; 3]) -> Self {
    Self {
      normal: Vec3::from(normal),
      vertices: [Vec3::from(v1), Vec3::from(v2), Vec3::from(v3)],
    }
  }

  /// The cross product of the two edges leaving the first corner.
  /// return: The unnormalized face normal.
  pub fn edge_cross(&self) -> Vec3 {
    let e1 = self.vertices[1] - self.vertices[0];
    let e2 = self.vertices[2] - self.vertices[0];
    e1.cross(e2)
  }

  /// Get the area of the triangle.
  /// return: The area.
  pub fn area(&self) -> f32 {
    self.edge_cross().length() * 0.5
  }

  /// Check whether the triangle can be used as geometry.
  /// return: The defect found, or None if the triangle is valid.
  pub fn defect(&self) -> Option<HalaTriangleDefect> {
    if !self.vertices.iter().all(|v| v.is_finite()) {
      return Some(HalaTriangleDefect::NonFinite);
    }
    if self.area() <= DEGENERATE_CROSS_EPSILON * 0.5 {
      return Some(HalaTriangleDefect::Degenerate);
    }
    None
  }

  /// Make the stored normal a unit vector.
  /// Short or non-finite normals are replaced by the geometric normal,
  /// or by +Z when the geometry cannot give one.
  pub fn repair_normal(&mut self) {
    let length = self.normal.length();
    if length < MIN_NORMAL_LENGTH || !length.is_finite() {
      let cross = self.edge_cross();
      let cross_length = cross.length();
      self.normal = if cross_length > DEGENERATE_CROSS_EPSILON {
        cross / cross_length
      } else {
        Vec3::Z
      };
    } else {
      self.normal /= length;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn unit_triangle(normal: [f32; 3]) -> HalaTriangle {
    HalaTriangle::from_arrays(normal, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0])
  }

  #[test]
  fn valid_triangle_has_no_defect() {
    let tri = unit_triangle([0.0, 0.0, 1.0]);
    assert_eq!(tri.defect(), None);
    assert!((tri.area() - 0.5).abs() < 1e-6);
  }

  #[test]
  fn repeated_vertex_is_degenerate() {
    let tri = HalaTriangle::from_arrays([0.0, 0.0, 1.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
    assert_eq!(tri.defect(), Some(HalaTriangleDefect::Degenerate));
  }

  #[test]
  fn nan_vertex_is_non_finite() {
    let tri = HalaTriangle::from_arrays([0.0, 0.0, 1.0], [f32::NAN, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
    assert_eq!(tri.defect(), Some(HalaTriangleDefect::NonFinite));
  }

  #[test]
  fn zero_normal_is_recomputed_from_winding() {
    let mut tri = unit_triangle([0.0, 0.0, 0.0]);
    tri.repair_normal();
    assert!((tri.normal - Vec3::Z).length() < 1e-6);

    let mut flipped = HalaTriangle::from_arrays([0.0; 3], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]);
    flipped.repair_normal();
    assert!((flipped.normal + Vec3::Z).length() < 1e-6);
  }

  #[test]
  fn long_normal_is_normalized() {
    let mut tri = unit_triangle([0.0, 3.0, 4.0]);
    tri.repair_normal();
    assert!((tri.normal - Vec3::new(0.0, 0.6, 0.8)).length() < 1e-6);
  }

  #[test]
  fn non_finite_normal_on_degenerate_geometry_defaults_to_z() {
    let mut tri = HalaTriangle::from_arrays([f32::INFINITY, 0.0, 0.0], [0.0; 3], [0.0; 3], [0.0; 3]);
    tri.repair_normal();
    assert_eq!(tri.normal, Vec3::Z);
  }
}
