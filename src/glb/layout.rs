use glam::Vec3;

/// Every segment ends on this boundary.
pub const SEGMENT_ALIGNMENT: usize = 4;

/// One logical array inside the binary buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalaBufferSegment {
  pub offset: usize,
  pub length: usize,
}

/// A binary buffer assembled segment by segment, in a single pass.
/// Segments are written back to back and padded with zeros to 4 bytes.
#[derive(Debug, Default)]
pub struct HalaBufferLayout {
  data: Vec<u8>,
}

/// The implementation of the buffer layout.
impl HalaBufferLayout {
  /// Create an empty layout.
  /// return: The layout.
  pub fn new() -> Self {
    Self::default()
  }

  /// Append 16-bit indices.
  /// param values: The indices, each below 65536.
  /// return: The segment.
  pub fn push_u16(&mut self, values: &[u32]) -> HalaBufferSegment {
    self.push_with(values.len() * 2, |data| {
      for &value in values {
        data.extend_from_slice(&(value as u16).to_le_bytes());
      }
    })
  }

  /// Append 32-bit indices.
  /// param values: The indices.
  /// return: The segment.
  pub fn push_u32(&mut self, values: &[u32]) -> HalaBufferSegment {
    self.push_with(values.len() * 4, |data| {
      for &value in values {
        data.extend_from_slice(&value.to_le_bytes());
      }
    })
  }

  /// Append 3-component float vectors.
  /// param values: The vectors.
  /// return: The segment.
  pub fn push_vec3(&mut self, values: &[Vec3]) -> HalaBufferSegment {
    self.push_with(values.len() * 12, |data| {
      for value in values {
        for component in value.to_array() {
          data.extend_from_slice(&component.to_le_bytes());
        }
      }
    })
  }

  /// Get the total byte length, padding included.
  /// return: The length.
  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// Take the assembled bytes.
  /// return: The buffer.
  pub fn into_data(self) -> Vec<u8> {
    self.data
  }

  fn push_with<F: FnOnce(&mut Vec<u8>)>(&mut self, length: usize, write: F) -> HalaBufferSegment {
    let offset = self.data.len();
    self.data.reserve(length + SEGMENT_ALIGNMENT);
    write(&mut self.data);
    debug_assert_eq!(self.data.len(), offset + length);

    let padding = (SEGMENT_ALIGNMENT - self.data.len() % SEGMENT_ALIGNMENT) % SEGMENT_ALIGNMENT;
    self.data.resize(self.data.len() + padding, 0);

    HalaBufferSegment { offset, length }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn odd_u16_segment_is_padded() {
    let mut layout = HalaBufferLayout::new();
    let indices = layout.push_u16(&[0, 1, 2]);
    let positions = layout.push_vec3(&[Vec3::new(1.0, 2.0, 3.0)]);

    assert_eq!(indices, HalaBufferSegment { offset: 0, length: 6 });
    assert_eq!(positions, HalaBufferSegment { offset: 8, length: 12 });
    assert_eq!(layout.len(), 20);

    let data = layout.into_data();
    assert_eq!(&data[0..6], &[0, 0, 1, 0, 2, 0]);
    assert_eq!(&data[6..8], &[0, 0]);
    assert_eq!(&data[8..12], &1.0f32.to_le_bytes());
  }

  #[test]
  fn segments_are_monotonic_and_aligned() {
    let mut layout = HalaBufferLayout::new();
    let segments = [
      layout.push_u16(&[7]),
      layout.push_u32(&[70000, 1]),
      layout.push_vec3(&[Vec3::ONE; 5]),
      layout.push_u16(&[1, 2, 3, 4, 5]),
    ];
    for pair in segments.windows(2) {
      assert!(pair[0].offset + pair[0].length <= pair[1].offset);
      assert_eq!(pair[1].offset % SEGMENT_ALIGNMENT, 0);
    }
    assert_eq!(layout.len() % SEGMENT_ALIGNMENT, 0);
  }
}
