use glam::Vec3;

use super::bounds::HalaBounds;

/// The most unique vertices one chunk may hold.
/// It stays below the 16-bit index ceiling of 65535.
pub const MAX_CHUNK_VERTICES: usize = 65000;

/// A vertex-count-bounded partition of a mesh.
#[derive(Debug, Clone, Default)]
pub struct HalaMeshChunk {
  pub vertices: Vec<Vec3>,
  pub normals: Vec<Vec3>,
  pub indices: Vec<u32>,
  pub bounds: HalaBounds,
}

/// The implementation of the mesh chunk.
impl HalaMeshChunk {
  /// Get the number of triangles.
  /// return: The triangle count.
  pub fn num_of_triangles(&self) -> usize {
    self.indices.len() / 3
  }

  /// Check if the chunk holds no triangle.
  /// return: True if empty.
  pub fn is_empty(&self) -> bool {
    self.indices.is_empty()
  }

  /// Check the structural invariants of the chunk.
  /// return: A description of the first broken invariant, if any.
  pub fn validate(&self) -> Result<(), String> {
    if self.indices.len() % 3 != 0 {
      return Err(format!("index count {} is not a multiple of 3", self.indices.len()));
    }
    if self.normals.len() != self.vertices.len() {
      return Err(format!("{} normals for {} vertices", self.normals.len(), self.vertices.len()));
    }
    if let Some(index) = self.indices.iter().find(|&&index| index as usize >= self.vertices.len()) {
      return Err(format!("index {} out of range (vertex count = {})", index, self.vertices.len()));
    }
    if self.vertices.len() > u32::MAX as usize {
      return Err(format!("{} vertices do not fit 32-bit indices", self.vertices.len()));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn validate_reports_out_of_range_index() {
    let chunk = HalaMeshChunk {
      vertices: vec![Vec3::ZERO, Vec3::X],
      normals: vec![Vec3::Z, Vec3::Z],
      indices: vec![0, 1, 2],
      bounds: HalaBounds::new(Vec3::ZERO, Vec3::X),
    };
    let err = chunk.validate().unwrap_err();
    assert!(err.contains("index 2 out of range"));
  }

  #[test]
  fn validate_reports_partial_triangle() {
    let chunk = HalaMeshChunk {
      vertices: vec![Vec3::ZERO],
      normals: vec![Vec3::Z],
      indices: vec![0, 0],
      ..Default::default()
    };
    assert!(chunk.validate().is_err());
    assert_eq!(chunk.num_of_triangles(), 0);
  }
}
