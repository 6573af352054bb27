use crate::error::HalaTriangleDefect;
use crate::mesh::HalaTriangle;

/// Accepted triangles plus the number dropped for each defect.
#[derive(Debug, Default)]
pub struct HalaTriangleBatch {
  pub triangles: Vec<HalaTriangle>,
  pub skipped_non_finite: usize,
  pub skipped_degenerate: usize,
}

/// The implementation of the triangle batch.
impl HalaTriangleBatch {
  /// Create an empty batch.
  /// param capacity: The expected number of triangles.
  /// return: The batch.
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      triangles: Vec::with_capacity(capacity),
      ..Default::default()
    }
  }

  /// Validate a decoded triangle, repair its normal and keep it.
  /// Invalid triangles are only counted.
  /// param triangle: The decoded triangle.
  pub fn push(&mut self, mut triangle: HalaTriangle) {
    match triangle.defect() {
      Some(HalaTriangleDefect::NonFinite) => self.skipped_non_finite += 1,
      Some(HalaTriangleDefect::Degenerate) => self.skipped_degenerate += 1,
      None => {
        triangle.repair_normal();
        self.triangles.push(triangle);
      },
    }
  }

  /// Move the content of another batch to the end of this one.
  /// param other: The batch to append.
  pub fn append(&mut self, mut other: HalaTriangleBatch) {
    self.triangles.append(&mut other.triangles);
    self.skipped_non_finite += other.skipped_non_finite;
    self.skipped_degenerate += other.skipped_degenerate;
  }

  /// Get the number of dropped triangles.
  /// return: The skip count.
  pub fn skipped(&self) -> usize {
    self.skipped_non_finite + self.skipped_degenerate
  }
}
