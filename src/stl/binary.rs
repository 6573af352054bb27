//! Binary STL layout.
//!
//! An 80-byte header, a little-endian `u32` triangle count, then one 50-byte
//! record per triangle: normal, three vertices (all `3 x f32`) and a `u16`
//! attribute byte count that is ignored.

use std::ops::Range;

use rayon::prelude::*;

use crate::error::HalaFormatError;
use crate::mesh::HalaTriangle;
use super::batch::HalaTriangleBatch;

pub const HEADER_SIZE: usize = 80;
pub const PREAMBLE_SIZE: usize = HEADER_SIZE + 4;
pub const RECORD_SIZE: usize = 50;

/// Read the declared triangle count and check the data can hold it.
/// param bytes: The whole file.
/// return: The triangle count.
pub fn read_triangle_count(bytes: &[u8]) -> Result<usize, HalaFormatError> {
  if bytes.len() < PREAMBLE_SIZE {
    return Err(HalaFormatError::TooSmall(bytes.len()));
  }
  let count = read_u32(bytes, HEADER_SIZE) as usize;
  let expected = count
    .checked_mul(RECORD_SIZE)
    .and_then(|size| size.checked_add(PREAMBLE_SIZE))
    .unwrap_or(usize::MAX);
  if bytes.len() < expected {
    return Err(HalaFormatError::Truncated {
      expected,
      actual: bytes.len(),
    });
  }
  Ok(count)
}

/// Check if the size of the data is exactly what its triangle count declares.
/// param bytes: The whole file.
/// return: True if the sizes match.
pub fn has_exact_binary_size(bytes: &[u8]) -> bool {
  match read_triangle_count(bytes) {
    Ok(count) => bytes.len() == PREAMBLE_SIZE + count * RECORD_SIZE,
    Err(_) => false,
  }
}

/// Decode one triangle record.
/// param bytes: The whole file, already checked to hold the record.
/// param index: The triangle index.
/// return: The triangle, not validated.
pub fn read_record(bytes: &[u8], index: usize) -> HalaTriangle {
  let offset = PREAMBLE_SIZE + index * RECORD_SIZE;
  HalaTriangle::from_arrays(
    read_vec3(bytes, offset),
    read_vec3(bytes, offset + 12),
    read_vec3(bytes, offset + 24),
    read_vec3(bytes, offset + 36),
  )
}

/// Decode and filter a range of triangle records.
/// param bytes: The whole file.
/// param range: The triangle indices to decode.
/// return: The batch of accepted triangles.
pub fn parse_range(bytes: &[u8], range: Range<usize>) -> HalaTriangleBatch {
  let mut batch = HalaTriangleBatch::with_capacity(range.len());
  for index in range {
    batch.push(read_record(bytes, index));
  }
  batch
}

/// Decode all triangle records.
/// Large inputs are split into ranges of `range_size` triangles that are decoded
/// on a pool of `workers` threads. Each range has its own batch and the batches
/// are joined in range order, so the result does not depend on scheduling.
/// param bytes: The whole file.
/// param workers: The number of worker threads.
/// param parallel_threshold: The triangle count above which the pool is used.
/// param range_size: The number of triangles per range.
/// return: The accepted triangles and the skip counters.
pub fn parse(
  bytes: &[u8],
  workers: usize,
  parallel_threshold: usize,
  range_size: usize,
) -> Result<(usize, HalaTriangleBatch), HalaFormatError> {
  let count = read_triangle_count(bytes)?;
  log::debug!("Parsing binary STL with {} triangles.", count);

  if count <= parallel_threshold || workers <= 1 {
    return Ok((count, parse_range(bytes, 0..count)));
  }

  let range_size = range_size.max(1);
  let num_of_ranges = count.div_ceil(range_size);
  let parse_ranges = || {
    (0..num_of_ranges)
      .into_par_iter()
      .map(|range_index| {
        let start = range_index * range_size;
        let end = (start + range_size).min(count);
        parse_range(bytes, start..end)
      })
      .collect::<Vec<_>>()
  };

  let batches = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
    Ok(pool) => {
      log::debug!("Parsing {} ranges on {} workers.", num_of_ranges, workers);
      pool.install(parse_ranges)
    },
    Err(err) => {
      log::warn!("Create STL worker pool failed ({}). Parsing on the calling thread.", err);
      vec![parse_range(bytes, 0..count)]
    },
  };

  let mut merged = HalaTriangleBatch::with_capacity(count);
  for batch in batches {
    merged.append(batch);
  }
  Ok((count, merged))
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
  u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
  f32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

fn read_vec3(bytes: &[u8], offset: usize) -> [f32; 3] {
  [
    read_f32(bytes, offset),
    read_f32(bytes, offset + 4),
    read_f32(bytes, offset + 8),
  ]
}
