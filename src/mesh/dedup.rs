use glam::Vec3;

/// The size of one quantization cell in world units.
pub const GRID_SIZE: f32 = 0.001;

/// Positions closer than this on every axis are the same vertex.
pub const MERGE_TOLERANCE: f32 = GRID_SIZE * 0.5;

const TABLE_BITS: u32 = 20;
const TABLE_SIZE: usize = 1 << TABLE_BITS;
const NO_ENTRY: u32 = u32::MAX;

/// One inserted vertex, chained to the previous entry of its bucket.
struct HalaVertexEntry {
  position: Vec3,
  next: u32,
}

/// Spatial hash that maps positions to stable vertex indices.
///
/// Positions are quantized to a grid of `GRID_SIZE`, the cell is hashed into a
/// table of 2^20 buckets and the bucket chain is searched with a tolerance of
/// half a cell. Indices are handed out in insertion order starting at 0.
pub struct HalaVertexDeduplicator {
  buckets: Vec<u32>,
  entries: Vec<HalaVertexEntry>,
}

/// The default deduplicator is empty.
impl Default for HalaVertexDeduplicator {
  fn default() -> Self {
    Self::new()
  }
}

/// The implementation of the vertex deduplicator.
impl HalaVertexDeduplicator {

  /// Create a new empty deduplicator.
  /// return: The deduplicator.
  pub fn new() -> Self {
    Self {
      buckets: vec![NO_ENTRY; TABLE_SIZE],
      entries: Vec::new(),
    }
  }

  /// Get the number of unique vertices.
  /// return: The vertex count.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Check if no vertex was inserted.
  /// return: True if empty.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Find the index of a position, inserting it if no equal position exists.
  /// A match may sit in a neighbouring cell when the position is close to a
  /// cell edge, so those cells are searched too. New positions go into their own cell.
  /// param position: The vertex position.
  /// return: The vertex index.
  pub fn add_vertex(&mut self, position: Vec3) -> u32 {
    let cell = Self::cell_of(position);
    let (xs, num_of_xs) = Self::axis_cells(position.x, cell[0]);
    let (ys, num_of_ys) = Self::axis_cells(position.y, cell[1]);
    let (zs, num_of_zs) = Self::axis_cells(position.z, cell[2]);

    for &x in &xs[..num_of_xs] {
      for &y in &ys[..num_of_ys] {
        for &z in &zs[..num_of_zs] {
          if let Some(index) = self.find_in_bucket(Self::bucket_of([x, y, z]), position) {
            return index;
          }
        }
      }
    }

    let bucket = Self::bucket_of(cell);
    let index = self.entries.len() as u32;
    self.entries.push(HalaVertexEntry {
      position,
      next: self.buckets[bucket],
    });
    self.buckets[bucket] = index;
    index
  }

  fn find_in_bucket(&self, bucket: usize, position: Vec3) -> Option<u32> {
    let mut cursor = self.buckets[bucket];
    while cursor != NO_ENTRY {
      let entry = &self.entries[cursor as usize];
      if Self::is_same_position(entry.position, position) {
        return Some(cursor);
      }
      cursor = entry.next;
    }
    None
  }

  /// Quantize a coordinate to its grid cell.
  fn quantize(value: f32) -> i64 {
    (value / GRID_SIZE).floor() as i64
  }

  fn cell_of(position: Vec3) -> [i64; 3] {
    [
      Self::quantize(position.x),
      Self::quantize(position.y),
      Self::quantize(position.z),
    ]
  }

  /// The cells along one axis that can hold a position within tolerance.
  /// The own cell is always first.
  fn axis_cells(value: f32, cell: i64) -> ([i64; 2], usize) {
    let offset = (value as f64 / GRID_SIZE as f64 - cell as f64) * GRID_SIZE as f64;
    if offset < MERGE_TOLERANCE as f64 {
      ([cell, cell - 1], 2)
    } else if offset > (GRID_SIZE - MERGE_TOLERANCE) as f64 {
      ([cell, cell + 1], 2)
    } else {
      ([cell, cell], 1)
    }
  }

  /// Hash a grid cell into a bucket index.
  fn bucket_of(cell: [i64; 3]) -> usize {
    let x = cell[0] as u64;
    let y = cell[1] as u64;
    let z = cell[2] as u64;

    let mut hash = x.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    hash ^= y.wrapping_mul(0xC2B2_AE3D_27D4_EB4F).rotate_left(21);
    hash ^= z.wrapping_mul(0x1656_67B1_9E37_79F9).rotate_left(42);

    // Final avalanche.
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    hash ^= hash >> 33;

    (hash as usize) & (TABLE_SIZE - 1)
  }

  fn is_same_position(a: Vec3, b: Vec3) -> bool {
    let delta = (a - b).abs();
    delta.x < MERGE_TOLERANCE && delta.y < MERGE_TOLERANCE && delta.z < MERGE_TOLERANCE
  }

}
