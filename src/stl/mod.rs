pub mod batch;
pub mod binary;
pub mod ascii;
pub mod decoder;

pub use batch::HalaTriangleBatch;
pub use decoder::{
  decode,
  HalaDecodeOptions,
  HalaDecodedMesh,
  HalaStlDecoder,
  HalaStlFormat,
};
