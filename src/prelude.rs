pub use crate::error::{
  HalaFormatError,
  HalaTriangleDefect,
  HalaEncodeError,
  HalaStoreError,
  HalaConvertError,
};
pub use crate::mesh::{
  HalaTriangle,
  HalaBounds,
  HalaMeshChunk,
  HalaChunkedMeshBuilder,
  MAX_CHUNK_VERTICES,
};
pub use crate::stl::{
  decode,
  HalaDecodeOptions,
  HalaDecodedMesh,
  HalaStlDecoder,
  HalaStlFormat,
};
pub use crate::glb::HalaGlbEncoder;
pub use crate::converter::{
  sha256_file,
  convert_stl_file,
  HalaConversionReport,
  HalaConverter,
  HalaConverterConfig,
  HalaLocalObjectStore,
  HalaObjectStore,
};
