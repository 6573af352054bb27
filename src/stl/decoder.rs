use std::path::Path;

use serde::{
  Deserialize, Serialize
};

use crate::error::HalaFormatError;
use crate::mesh::HalaTriangle;
use super::batch::HalaTriangleBatch;
use super::{ascii, binary};

fn default_workers() -> usize {
  std::thread::available_parallelism().map_or(1, |n| n.get())
}

fn default_parallel_threshold() -> usize {
  40000
}

fn default_range_size() -> usize {
  10000
}

/// The tuning of the STL decoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalaDecodeOptions {
  /// Worker threads used for large binary files.
  #[serde(default = "default_workers")]
  pub workers: usize,
  /// Binary files with more triangles than this are parsed in parallel.
  #[serde(default = "default_parallel_threshold")]
  pub parallel_threshold: usize,
  /// Triangles per parallel range.
  #[serde(default = "default_range_size")]
  pub range_size: usize,
}

impl Default for HalaDecodeOptions {
  fn default() -> Self {
    Self {
      workers: default_workers(),
      parallel_threshold: default_parallel_threshold(),
      range_size: default_range_size(),
    }
  }
}

/// The encoding a STL file was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HalaStlFormat {
  Binary,
  Ascii,
}

/// The decoded triangles of a STL file and what was dropped on the way.
#[derive(Debug)]
pub struct HalaDecodedMesh {
  pub format: HalaStlFormat,
  pub triangles: Vec<HalaTriangle>,
  /// Triangles declared by the binary header, or facets found in the text.
  pub declared: usize,
  pub skipped_non_finite: usize,
  pub skipped_degenerate: usize,
}

/// The implementation of the decoded mesh.
impl HalaDecodedMesh {
  fn from_batch(format: HalaStlFormat, declared: usize, batch: HalaTriangleBatch) -> Self {
    Self {
      format,
      triangles: batch.triangles,
      declared,
      skipped_non_finite: batch.skipped_non_finite,
      skipped_degenerate: batch.skipped_degenerate,
    }
  }

  /// Get the number of triangles dropped as invalid geometry.
  /// return: The skip count.
  pub fn skipped(&self) -> usize {
    self.skipped_non_finite + self.skipped_degenerate
  }
}

/// The STL decoder.
#[derive(Debug, Clone, Default)]
pub struct HalaStlDecoder {
  options: HalaDecodeOptions,
}

/// The implementation of the STL decoder.
impl HalaStlDecoder {
  /// Create a new decoder.
  /// param options: The decode options.
  /// return: The decoder.
  pub fn new(options: HalaDecodeOptions) -> Self {
    Self { options }
  }

  /// Read a STL file and decode it.
  /// param path: The path of the STL file.
  /// return: The decoded mesh.
  pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> Result<HalaDecodedMesh, HalaFormatError> {
    let path = path.as_ref();
    log::debug!("Reading STL file \"{:?}\".", path);
    let bytes = std::fs::read(path)?;
    self.decode(&bytes)
  }

  /// Decode the content of a STL file.
  /// param bytes: The whole file.
  /// return: The decoded mesh.
  pub fn decode(&self, bytes: &[u8]) -> Result<HalaDecodedMesh, HalaFormatError> {
    let mesh = if ascii::looks_like_ascii(bytes) {
      self.decode_ascii(bytes)?
    } else {
      self.decode_binary(bytes)?
    };

    if mesh.skipped() > 0 {
      log::warn!(
        "Skipped {} invalid triangles ({} non-finite, {} degenerate).",
        mesh.skipped(), mesh.skipped_non_finite, mesh.skipped_degenerate
      );
    }
    log::debug!("Decoded {} triangles from {:?} STL.", mesh.triangles.len(), mesh.format);
    Ok(mesh)
  }

  fn decode_binary(&self, bytes: &[u8]) -> Result<HalaDecodedMesh, HalaFormatError> {
    let (declared, batch) = binary::parse(
      bytes,
      self.options.workers,
      self.options.parallel_threshold,
      self.options.range_size,
    )?;
    Ok(HalaDecodedMesh::from_batch(HalaStlFormat::Binary, declared, batch))
  }

  fn decode_ascii(&self, bytes: &[u8]) -> Result<HalaDecodedMesh, HalaFormatError> {
    let text = match std::str::from_utf8(bytes) {
      Ok(text) => text,
      Err(err) => {
        // Some exporters write `solid ...` into the header of binary files.
        if binary::has_exact_binary_size(bytes) {
          log::debug!("Text STL is not UTF-8 but its size fits the binary layout.");
          return self.decode_binary(bytes);
        }
        return Err(HalaFormatError::BadAscii(format!("invalid UTF-8 at byte {}", err.valid_up_to())));
      },
    };

    let scan = ascii::parse(text);
    if scan.num_of_facets == 0 && !scan.has_endsolid {
      if binary::has_exact_binary_size(bytes) {
        log::debug!("Text STL has no facets but its size fits the binary layout.");
        return self.decode_binary(bytes);
      }
      return Err(HalaFormatError::BadAscii("no facets and no endsolid terminator".to_string()));
    }
    if scan.num_of_malformed > 0 {
      log::warn!("Skipped {} malformed ASCII facets.", scan.num_of_malformed);
    }
    Ok(HalaDecodedMesh::from_batch(HalaStlFormat::Ascii, scan.num_of_facets, scan.batch))
  }
}

/// Decode the content of a STL file with the default options.
/// param bytes: The whole file.
/// return: The decoded mesh.
pub fn decode(bytes: &[u8]) -> Result<HalaDecodedMesh, HalaFormatError> {
  HalaStlDecoder::default().decode(bytes)
}

#[cfg(test)]
mod tests {
  use super::*;
  use glam::Vec3;

  fn binary_one_triangle(header: &[u8]) -> Vec<u8> {
    let mut bytes = header.to_vec();
    bytes.resize(80, 0);
    bytes.extend_from_slice(&1u32.to_le_bytes());
    for c in [0.0f32, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
      bytes.extend_from_slice(&c.to_le_bytes());
    }
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes
  }

  #[test]
  fn decodes_binary() {
    let mesh = decode(&binary_one_triangle(&[])).unwrap();
    assert_eq!(mesh.format, HalaStlFormat::Binary);
    assert_eq!(mesh.declared, 1);
    assert_eq!(mesh.triangles, vec![HalaTriangle::new(Vec3::Z, [Vec3::ZERO, Vec3::X, Vec3::Y])]);
  }

  #[test]
  fn binary_with_printable_solid_header_falls_back_to_binary() {
    // The header is printable, the triangle count is not.
    let mut header = b"solid ".to_vec();
    header.resize(80, b' ');
    let bytes = binary_one_triangle(&header);
    let mesh = decode(&bytes).unwrap();
    assert_eq!(mesh.format, HalaStlFormat::Binary);
    assert_eq!(mesh.triangles.len(), 1);
  }

  #[test]
  fn text_without_facets_or_terminator_is_bad_ascii() {
    let err = decode(b"solid nothing here\njust words\n").unwrap_err();
    assert!(matches!(err, HalaFormatError::BadAscii(_)));
  }

  #[test]
  fn empty_ascii_solid_is_valid() {
    let mesh = decode(b"solid empty\nendsolid empty\n").unwrap();
    assert_eq!(mesh.format, HalaStlFormat::Ascii);
    assert!(mesh.triangles.is_empty());
  }

  #[test]
  fn options_deserialize_with_defaults() {
    let options: HalaDecodeOptions = serde_json::from_str(r#"{ "workers": 2 }"#).unwrap();
    assert_eq!(options.workers, 2);
    assert_eq!(options.parallel_threshold, 40000);
    assert_eq!(options.range_size, 10000);
  }
}
