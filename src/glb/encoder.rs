use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{
  Path,
  PathBuf,
};

use gltf::json;
use gltf::json::validation::Checked::Valid;
use gltf::json::validation::USize64;

use crate::error::HalaEncodeError;
use crate::mesh::HalaMeshChunk;
use super::layout::{
  HalaBufferLayout,
  HalaBufferSegment,
};

/// Chunks with at most this many vertices use 16-bit indices.
const MAX_U16_INDEXED_VERTICES: usize = u16::MAX as usize;

const GLB_HEADER_SIZE: usize = 12;
const GLB_CHUNK_HEADER_SIZE: usize = 8;

/// The glTF objects describing one chunk.
struct HalaChunkAccessors {
  indices: u32,
  positions: u32,
  normals: u32,
}

/// The GLB encoder.
pub struct HalaGlbEncoder;

/// The implementation of the GLB encoder.
impl HalaGlbEncoder {
  /// Encode the chunks and write the GLB file.
  /// The file is written next to the destination first and renamed when complete.
  /// param chunks: The mesh chunks.
  /// param destination: The path of the GLB file.
  /// return: The result.
  pub fn encode<P: AsRef<Path>>(chunks: &[HalaMeshChunk], destination: P) -> Result<(), HalaEncodeError> {
    let destination = destination.as_ref();
    let bytes = Self::encode_to_vec(chunks)?;
    write_atomically(destination, &bytes)?;
    log::debug!("Wrote GLB file \"{:?}\" ({} bytes).", destination, bytes.len());
    Ok(())
  }

  /// Encode the chunks into an in-memory GLB container.
  /// param chunks: The mesh chunks.
  /// return: The GLB bytes.
  pub fn encode_to_vec(chunks: &[HalaMeshChunk]) -> Result<Vec<u8>, HalaEncodeError> {
    if chunks.is_empty() || chunks.iter().all(|chunk| chunk.is_empty()) {
      return Err(HalaEncodeError::NoGeometry);
    }
    if chunks.len() > 1 {
      log::info!("Encoding {} mesh chunks as separate nodes.", chunks.len());
    }

    let mut layout = HalaBufferLayout::new();
    let mut buffer_views = Vec::with_capacity(chunks.len() * 3);
    let mut accessors = Vec::with_capacity(chunks.len() * 3);
    let mut meshes = Vec::with_capacity(chunks.len());
    let mut nodes = Vec::with_capacity(chunks.len());

    for (chunk_index, chunk) in chunks.iter().enumerate() {
      if chunk.is_empty() {
        continue;
      }
      chunk.validate()
        .map_err(|err| HalaEncodeError::Internal(format!("Chunk {} is invalid: {}.", chunk_index, err)))?;

      let chunk_accessors = Self::write_chunk(chunk_index, chunk, &mut layout, &mut buffer_views, &mut accessors);

      let mut attributes = BTreeMap::new();
      attributes.insert(Valid(json::mesh::Semantic::Positions), json::Index::new(chunk_accessors.positions));
      attributes.insert(Valid(json::mesh::Semantic::Normals), json::Index::new(chunk_accessors.normals));

      let mesh_index = meshes.len() as u32;
      meshes.push(json::Mesh {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some(format!("chunk_{}", chunk_index)),
        primitives: vec![json::mesh::Primitive {
          attributes,
          extensions: Default::default(),
          extras: Default::default(),
          indices: Some(json::Index::new(chunk_accessors.indices)),
          material: Some(json::Index::new(0)),
          mode: Valid(json::mesh::Mode::Triangles),
          targets: None,
        }],
        weights: None,
      });
      nodes.push(json::Node {
        camera: None,
        children: None,
        extensions: Default::default(),
        extras: Default::default(),
        matrix: None,
        mesh: Some(json::Index::new(mesh_index)),
        name: Some(format!("chunk_{}", chunk_index)),
        rotation: None,
        scale: None,
        translation: None,
        skin: None,
        weights: None,
      });
    }

    let buffer_length = layout.len();
    Self::check_references(&buffer_views, &accessors, buffer_length)?;

    let root = json::Root {
      asset: json::Asset {
        generator: Some(format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))),
        ..Default::default()
      },
      accessors,
      buffers: vec![json::Buffer {
        byte_length: USize64(buffer_length as u64),
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        uri: None,
      }],
      buffer_views,
      materials: vec![Self::default_material()],
      scenes: vec![json::Scene {
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        nodes: (0..nodes.len() as u32).map(json::Index::new).collect(),
      }],
      scene: Some(json::Index::new(0)),
      meshes,
      nodes,
      ..Default::default()
    };

    let json_bytes = json::serialize::to_string(&root)
      .map_err(|err| HalaEncodeError::Internal(format!("Serialize glTF JSON failed: {}.", err)))?
      .into_bytes();
    let length = GLB_HEADER_SIZE
      + GLB_CHUNK_HEADER_SIZE + align_to_four(json_bytes.len())
      + GLB_CHUNK_HEADER_SIZE + align_to_four(buffer_length);
    let length = u32::try_from(length)
      .map_err(|_| HalaEncodeError::Internal(format!("GLB of {} bytes exceeds the 4 GiB container limit.", length)))?;

    let glb = gltf::binary::Glb {
      header: gltf::binary::Header {
        magic: *b"glTF",
        version: 2,
        length,
      },
      json: Cow::Owned(json_bytes),
      bin: Some(Cow::Owned(layout.into_data())),
    };
    glb.to_vec()
      .map_err(|err| HalaEncodeError::Internal(format!("Assemble GLB container failed: {}.", err)))
  }

  /// Write the index, position and normal segments of a chunk.
  /// param chunk_index: The position of the chunk in the input.
  /// param chunk: The mesh chunk.
  /// param layout: The binary buffer.
  /// param buffer_views: The buffer views.
  /// param accessors: The accessors.
  /// return: The accessor indices.
  fn write_chunk(
    chunk_index: usize,
    chunk: &HalaMeshChunk,
    layout: &mut HalaBufferLayout,
    buffer_views: &mut Vec<json::buffer::View>,
    accessors: &mut Vec<json::Accessor>,
  ) -> HalaChunkAccessors {
    let (index_segment, index_type) = if chunk.vertices.len() <= MAX_U16_INDEXED_VERTICES {
      (layout.push_u16(&chunk.indices), json::accessor::ComponentType::U16)
    } else {
      (layout.push_u32(&chunk.indices), json::accessor::ComponentType::U32)
    };
    let position_segment = layout.push_vec3(&chunk.vertices);
    let normal_segment = layout.push_vec3(&chunk.normals);

    let (min, max) = chunk.bounds.to_min_max_arrays();

    let indices = Self::push_accessor(
      buffer_views,
      accessors,
      index_segment,
      json::buffer::Target::ElementArrayBuffer,
      format!("indices_{}", chunk_index),
      chunk.indices.len(),
      json::accessor::Type::Scalar,
      index_type,
      None,
    );
    let positions = Self::push_accessor(
      buffer_views,
      accessors,
      position_segment,
      json::buffer::Target::ArrayBuffer,
      format!("positions_{}", chunk_index),
      chunk.vertices.len(),
      json::accessor::Type::Vec3,
      json::accessor::ComponentType::F32,
      Some((json::Value::from(min.to_vec()), json::Value::from(max.to_vec()))),
    );
    let normals = Self::push_accessor(
      buffer_views,
      accessors,
      normal_segment,
      json::buffer::Target::ArrayBuffer,
      format!("normals_{}", chunk_index),
      chunk.normals.len(),
      json::accessor::Type::Vec3,
      json::accessor::ComponentType::F32,
      None,
    );

    HalaChunkAccessors {
      indices,
      positions,
      normals,
    }
  }

  /// Describe a segment with a buffer view and an accessor.
  /// return: The accessor index.
  #[allow(clippy::too_many_arguments)]
  fn push_accessor(
    buffer_views: &mut Vec<json::buffer::View>,
    accessors: &mut Vec<json::Accessor>,
    segment: HalaBufferSegment,
    target: json::buffer::Target,
    name: String,
    count: usize,
    type_: json::accessor::Type,
    component_type: json::accessor::ComponentType,
    bounds: Option<(json::Value, json::Value)>,
  ) -> u32 {
    let view_index = buffer_views.len() as u32;
    buffer_views.push(json::buffer::View {
      buffer: json::Index::new(0),
      byte_length: USize64(segment.length as u64),
      byte_offset: Some(USize64(segment.offset as u64)),
      byte_stride: None,
      extensions: Default::default(),
      extras: Default::default(),
      name: Some(name.clone()),
      target: Some(Valid(target)),
    });

    let (min, max) = match bounds {
      Some((min, max)) => (Some(min), Some(max)),
      None => (None, None),
    };
    let accessor_index = accessors.len() as u32;
    accessors.push(json::Accessor {
      buffer_view: Some(json::Index::new(view_index)),
      byte_offset: Some(USize64(0)),
      count: USize64(count as u64),
      component_type: Valid(json::accessor::GenericComponentType(component_type)),
      extensions: Default::default(),
      extras: Default::default(),
      type_: Valid(type_),
      min,
      max,
      name: Some(name),
      normalized: false,
      sparse: None,
    });
    accessor_index
  }

  /// The material shared by every primitive.
  /// return: A grey, non-metallic, double-sided PBR material.
  fn default_material() -> json::Material {
    json::Material {
      alpha_cutoff: None,
      alpha_mode: Valid(json::material::AlphaMode::Opaque),
      double_sided: true,
      name: Some("default".to_string()),
      pbr_metallic_roughness: json::material::PbrMetallicRoughness {
        base_color_factor: json::material::PbrBaseColorFactor([0.8, 0.8, 0.8, 1.0]),
        base_color_texture: None,
        metallic_factor: json::material::StrengthFactor(0.0),
        roughness_factor: json::material::StrengthFactor(0.5),
        metallic_roughness_texture: None,
        extensions: Default::default(),
        extras: Default::default(),
      },
      normal_texture: None,
      occlusion_texture: None,
      emissive_texture: None,
      emissive_factor: json::material::EmissiveFactor([0.0, 0.0, 0.0]),
      extensions: Default::default(),
      extras: Default::default(),
    }
  }

  /// Check every accessor points at an existing view inside the buffer.
  fn check_references(
    buffer_views: &[json::buffer::View],
    accessors: &[json::Accessor],
    buffer_length: usize,
  ) -> Result<(), HalaEncodeError> {
    for (index, view) in buffer_views.iter().enumerate() {
      let offset = view.byte_offset.map_or(0, |offset| offset.0);
      if offset + view.byte_length.0 > buffer_length as u64 {
        return Err(HalaEncodeError::Internal(format!(
          "Buffer view {} ends at byte {} past the buffer length {}.",
          index, offset + view.byte_length.0, buffer_length
        )));
      }
    }
    for (index, accessor) in accessors.iter().enumerate() {
      match accessor.buffer_view.as_ref() {
        Some(view) if view.value() < buffer_views.len() => {},
        _ => return Err(HalaEncodeError::Internal(format!("Accessor {} references a missing buffer view.", index))),
      }
    }
    Ok(())
  }
}

fn align_to_four(length: usize) -> usize {
  (length + 3) & !3
}

/// The sibling path a file is written to before it is renamed.
fn temporary_path(destination: &Path) -> PathBuf {
  let file_name = destination
    .file_name()
    .map(|name| name.to_string_lossy().to_string())
    .unwrap_or_else(|| "output.glb".to_string());
  destination.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()))
}

/// Write a file so it is either complete or absent under its final name.
/// param destination: The final path.
/// param bytes: The file content.
/// return: The result.
pub fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
  let temporary = temporary_path(destination);
  let result = (|| {
    let mut file = std::fs::File::create(&temporary)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    std::fs::rename(&temporary, destination)
  })();
  if result.is_err() {
    let _ = std::fs::remove_file(&temporary);
  }
  result
}
