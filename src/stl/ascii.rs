//! ASCII STL scanning.

use glam::Vec3;

use crate::mesh::HalaTriangle;
use super::batch::HalaTriangleBatch;

/// Bytes inspected when guessing the encoding.
const DETECTION_WINDOW: usize = 1024;

/// The scanner state between lines.
enum HalaAsciiState {
  Idle,
  Facet {
    normal: Option<Vec3>,
    vertices: [Vec3; 3],
    num_of_vertices: usize,
    broken: bool,
  },
}

/// The result of scanning an ASCII STL body.
#[derive(Debug, Default)]
pub struct HalaAsciiScan {
  pub batch: HalaTriangleBatch,
  /// Facets that were opened, committed or not.
  pub num_of_facets: usize,
  /// Facets dropped for a wrong vertex count or unreadable numbers.
  pub num_of_malformed: usize,
  pub has_endsolid: bool,
}

/// Check if the data looks like an ASCII STL.
/// It must start with `solid` and a whitespace, and the first 1024 bytes must
/// be printable ASCII or whitespace.
/// param bytes: The whole file.
/// return: True if the data should be scanned as text.
pub fn looks_like_ascii(bytes: &[u8]) -> bool {
  if !bytes.starts_with(b"solid") {
    return false;
  }
  match bytes.get(5) {
    Some(byte) if byte.is_ascii_whitespace() => {},
    _ => return false,
  }
  bytes
    .iter()
    .take(DETECTION_WINDOW)
    .all(|&byte| (0x20..=0x7E).contains(&byte) || byte.is_ascii_whitespace())
}

/// Scan the text of an ASCII STL.
/// Facets without exactly three readable vertices are skipped.
/// param text: The whole file as text.
/// return: The scan result.
pub fn parse(text: &str) -> HalaAsciiScan {
  let mut scan = HalaAsciiScan::default();
  let mut state = HalaAsciiState::Idle;

  for line in text.lines() {
    let mut tokens = line.split_whitespace();
    let Some(keyword) = tokens.next() else {
      continue;
    };

    match keyword {
      "facet" => {
        // A facet still open here never saw its `endfacet`.
        if let HalaAsciiState::Facet { .. } = state {
          scan.num_of_malformed += 1;
        }
        scan.num_of_facets += 1;
        let normal = match tokens.next() {
          Some("normal") => read_vec3(&mut tokens),
          _ => None,
        };
        state = HalaAsciiState::Facet {
          normal,
          vertices: [Vec3::ZERO; 3],
          num_of_vertices: 0,
          broken: normal.is_none(),
        };
      },
      "vertex" => {
        if let HalaAsciiState::Facet { vertices, num_of_vertices, broken, .. } = &mut state {
          match read_vec3(&mut tokens) {
            Some(vertex) if *num_of_vertices < 3 => vertices[*num_of_vertices] = vertex,
            Some(_) => {},
            None => *broken = true,
          }
          *num_of_vertices += 1;
        }
      },
      "endfacet" => {
        match std::mem::replace(&mut state, HalaAsciiState::Idle) {
          HalaAsciiState::Facet { normal: Some(normal), vertices, num_of_vertices: 3, broken: false } => {
            scan.batch.push(HalaTriangle::new(normal, vertices));
          },
          HalaAsciiState::Facet { .. } => scan.num_of_malformed += 1,
          HalaAsciiState::Idle => {},
        }
      },
      "endsolid" => {
        if let HalaAsciiState::Facet { .. } = state {
          scan.num_of_malformed += 1;
          state = HalaAsciiState::Idle;
        }
        scan.has_endsolid = true;
      },
      // `solid`, `outer loop`, `endloop` and anything unknown carry no geometry.
      _ => {},
    }
  }

  if let HalaAsciiState::Facet { .. } = state {
    scan.num_of_malformed += 1;
  }
  scan
}

fn read_vec3<'a, I: Iterator<Item = &'a str>>(tokens: &mut I) -> Option<Vec3> {
  let x = tokens.next()?.parse::<f32>().ok()?;
  let y = tokens.next()?.parse::<f32>().ok()?;
  let z = tokens.next()?.parse::<f32>().ok()?;
  Some(Vec3::new(x, y, z))
}
