pub mod triangle;
pub mod bounds;
pub mod chunk;
pub mod dedup;
pub mod builder;

pub use triangle::HalaTriangle;
pub use bounds::HalaBounds;
pub use chunk::{
  HalaMeshChunk,
  MAX_CHUNK_VERTICES,
};
pub use dedup::HalaVertexDeduplicator;
pub use builder::HalaChunkedMeshBuilder;
