pub mod config;
pub mod store;
pub mod hasher;
pub mod service;

pub use config::HalaConverterConfig;
pub use store::{
  HalaObjectStore,
  HalaLocalObjectStore,
};
pub use hasher::sha256_file;
pub use service::{
  convert_stl_file,
  HalaConversionReport,
  HalaConvertRequest,
  HalaConvertResponse,
  HalaErrorResponse,
  HalaConverter,
};
