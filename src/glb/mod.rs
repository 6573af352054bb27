pub mod layout;
pub mod encoder;

pub use layout::{
  HalaBufferLayout,
  HalaBufferSegment,
};
pub use encoder::HalaGlbEncoder;
