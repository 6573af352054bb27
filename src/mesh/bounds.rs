use glam::Vec3;

/// Axis-aligned bounding box (AABB) kept as min/max corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalaBounds {
  pub min: Vec3,
  pub max: Vec3,
}

/// The default bounds is empty.
impl Default for HalaBounds {
  fn default() -> Self {
    Self::EMPTY
  }
}

/// Implementation of HalaBounds.
impl HalaBounds {

  /// The empty AABB. Encapsulating any point makes it valid.
  pub const EMPTY: Self = Self {
    min: Vec3::splat(f32::MAX),
    max: Vec3::splat(f32::MIN),
  };

  /// Create a new HalaBounds instance.
  /// param min: The minimum corner.
  /// param max: The maximum corner.
  /// return: The new HalaBounds instance.
  pub fn new(min: Vec3, max: Vec3) -> Self {
    Self { min, max }
  }

  /// Check if no point has been encapsulated yet.
  /// return: True if the AABB is empty.
  pub fn is_empty(&self) -> bool {
    self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
  }

  /// Grows the AABB to include the given point.
  /// param point: The point to include.
  pub fn encapsulate_point(&mut self, point: Vec3) {
    self.min = self.min.min(point);
    self.max = self.max.max(point);
  }

  /// Get the corners as arrays, the form glTF accessors expect.
  /// An empty AABB is reported as the origin.
  /// return: The minimum and maximum corners.
  pub fn to_min_max_arrays(&self) -> ([f32; 3], [f32; 3]) {
    if self.is_empty() {
      ([0.0; 3], [0.0; 3])
    } else {
      (self.min.to_array(), self.max.to_array())
    }
  }

}
