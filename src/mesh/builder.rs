use glam::Vec3;

use super::triangle::HalaTriangle;
use super::chunk::{
  HalaMeshChunk,
  MAX_CHUNK_VERTICES,
};
use super::dedup::HalaVertexDeduplicator;

/// The chunk being filled, with its own deduplicator and normal accumulators.
struct HalaOpenChunk {
  chunk: HalaMeshChunk,
  dedup: HalaVertexDeduplicator,
  normal_counts: Vec<u32>,
}

/// Builds index-width-safe mesh chunks from a stream of triangles.
pub struct HalaChunkedMeshBuilder {
  vertex_cap: usize,
  open: Option<HalaOpenChunk>,
  finished: Vec<HalaMeshChunk>,
  num_of_triangles: usize,
}

/// The default builder uses the standard vertex cap.
impl Default for HalaChunkedMeshBuilder {
  fn default() -> Self {
    Self::new()
  }
}

/// The implementation of the chunked mesh builder.
impl HalaChunkedMeshBuilder {

  /// Create a new builder with the standard vertex cap.
  /// return: The builder.
  pub fn new() -> Self {
    Self::with_vertex_cap(MAX_CHUNK_VERTICES)
  }

  /// Create a new builder with a custom vertex cap.
  /// param vertex_cap: The most unique vertices per chunk, clamped to [3, MAX_CHUNK_VERTICES].
  /// return: The builder.
  pub fn with_vertex_cap(vertex_cap: usize) -> Self {
    Self {
      vertex_cap: vertex_cap.clamp(3, MAX_CHUNK_VERTICES),
      open: None,
      finished: Vec::new(),
      num_of_triangles: 0,
    }
  }

  /// Get the vertex cap in use.
  /// return: The vertex cap.
  pub fn vertex_cap(&self) -> usize {
    self.vertex_cap
  }

  /// Get the number of triangles processed so far.
  /// return: The triangle count.
  pub fn num_of_triangles(&self) -> usize {
    self.num_of_triangles
  }

  /// Add one triangle to the mesh.
  /// param triangle: The triangle, with a unit normal.
  pub fn process(&mut self, triangle: &HalaTriangle) {
    // A triangle adds at most 3 new vertices; close the chunk before it could overflow.
    let needs_new_chunk = match &self.open {
      Some(open) => open.dedup.len() + 3 > self.vertex_cap,
      None => true,
    };
    if needs_new_chunk {
      self.close_open_chunk();
      log::debug!("Open mesh chunk {}.", self.finished.len());
      self.open = Some(HalaOpenChunk {
        chunk: HalaMeshChunk::default(),
        dedup: HalaVertexDeduplicator::new(),
        normal_counts: Vec::new(),
      });
    }

    let Some(open) = self.open.as_mut() else {
      return;
    };
    for &position in triangle.vertices.iter() {
      let index = open.dedup.add_vertex(position);
      if index as usize == open.chunk.vertices.len() {
        open.chunk.vertices.push(position);
        open.chunk.normals.push(Vec3::ZERO);
        open.normal_counts.push(0);
        open.chunk.bounds.encapsulate_point(position);
      }
      open.chunk.indices.push(index);
      open.chunk.normals[index as usize] += triangle.normal;
      open.normal_counts[index as usize] += 1;
    }
    self.num_of_triangles += 1;
  }

  /// Add many triangles to the mesh.
  /// param triangles: The triangles.
  pub fn process_all<'a, I>(&mut self, triangles: I)
  where
    I: IntoIterator<Item = &'a HalaTriangle>,
  {
    for triangle in triangles {
      self.process(triangle);
    }
  }

  /// Finish the mesh and average the per-vertex normals.
  /// return: The chunks in creation order.
  pub fn finalize(mut self) -> Vec<HalaMeshChunk> {
    self.close_open_chunk();
    log::debug!(
      "Built {} mesh chunk(s) from {} triangles.",
      self.finished.len(), self.num_of_triangles
    );
    self.finished
  }

  /// Average the normals of the open chunk and move it to the finished list.
  fn close_open_chunk(&mut self) {
    let Some(mut open) = self.open.take() else {
      return;
    };
    for (normal, &count) in open.chunk.normals.iter_mut().zip(open.normal_counts.iter()) {
      if count > 0 {
        *normal = (*normal / count as f32).normalize_or_zero();
      }
    }
    if !open.chunk.is_empty() {
      self.finished.push(open.chunk);
    }
  }

}

#[cfg(test)]
mod tests {
  use super::*;

  fn triangle(v1: [f32; 3], v2: [f32; 3], v3: [f32; 3]) -> HalaTriangle {
    HalaTriangle::from_arrays([0.0, 0.0, 1.0], v1, v2, v3)
  }

  #[test]
  fn shared_edge_reuses_vertices() {
    let mut builder = HalaChunkedMeshBuilder::new();
    builder.process(&triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]));
    builder.process(&triangle([0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]));
    let chunks = builder.finalize();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].vertices.len(), 4);
    assert_eq!(chunks[0].indices, vec![0, 1, 2, 0, 2, 3]);
    assert_eq!(chunks[0].bounds.min, Vec3::ZERO);
    assert_eq!(chunks[0].bounds.max, Vec3::new(1.0, 1.0, 0.0));
    assert!(chunks[0].validate().is_ok());
  }

  #[test]
  fn corner_split_by_rounding_is_welded() {
    let mut builder = HalaChunkedMeshBuilder::new();
    builder.process(&triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.9999999, 0.0]));
    builder.process(&triangle([1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0000001, 0.0]));
    let chunks = builder.finalize();

    assert_eq!(chunks[0].vertices.len(), 4);
    assert_eq!(chunks[0].indices, vec![0, 1, 2, 1, 3, 2]);
  }

  #[test]
  fn shared_vertex_normals_are_averaged() {
    let mut builder = HalaChunkedMeshBuilder::new();
    builder.process(&HalaTriangle::from_arrays([0.0, 0.0, 1.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]));
    builder.process(&HalaTriangle::from_arrays([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]));
    let chunks = builder.finalize();
    let chunk = &chunks[0];

    let expected = Vec3::new(1.0, 0.0, 1.0).normalize();
    // Vertex 0 and vertex 2 belong to both triangles.
    assert!((chunk.normals[0] - expected).length() < 1e-6);
    assert!((chunk.normals[2] - expected).length() < 1e-6);
    assert!((chunk.normals[1] - Vec3::Z).length() < 1e-6);
    assert!((chunk.normals[3] - Vec3::X).length() < 1e-6);
  }

  #[test]
  fn opposite_normals_cancel_to_zero() {
    let mut builder = HalaChunkedMeshBuilder::new();
    builder.process(&HalaTriangle::from_arrays([0.0, 0.0, 1.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]));
    builder.process(&HalaTriangle::from_arrays([0.0, 0.0, -1.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]));
    let chunks = builder.finalize();
    assert_eq!(chunks[0].vertices.len(), 3);
    assert!(chunks[0].normals.iter().all(|n| *n == Vec3::ZERO));
  }

  #[test]
  fn vertex_cap_splits_chunks() {
    let mut builder = HalaChunkedMeshBuilder::with_vertex_cap(10);
    for i in 0..7 {
      let x = i as f32 * 10.0;
      builder.process(&triangle([x, 0.0, 0.0], [x + 1.0, 0.0, 0.0], [x, 1.0, 0.0]));
    }
    assert_eq!(builder.num_of_triangles(), 7);
    let chunks = builder.finalize();

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks.iter().map(|c| c.num_of_triangles()).sum::<usize>(), 7);
    for chunk in chunks.iter() {
      assert!(chunk.vertices.len() <= 10);
      assert!(chunk.validate().is_ok());
    }
  }

  #[test]
  fn no_triangles_yield_no_chunks() {
    let builder = HalaChunkedMeshBuilder::new();
    assert!(builder.finalize().is_empty());
  }

  #[test]
  fn vertex_cap_is_clamped() {
    assert_eq!(HalaChunkedMeshBuilder::with_vertex_cap(0).vertex_cap(), 3);
    assert_eq!(HalaChunkedMeshBuilder::with_vertex_cap(1 << 20).vertex_cap(), MAX_CHUNK_VERTICES);
  }
}
