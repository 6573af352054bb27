use std::path::{
  Path,
  PathBuf,
};

use serde::{
  Deserialize, Serialize
};

use crate::error::HalaConvertError;
use crate::mesh::MAX_CHUNK_VERTICES;
use crate::stl::HalaDecodeOptions;

pub const ENV_STL_BUCKET: &str = "STL2GLB_STL_BUCKET_NAME";
pub const ENV_GLB_BUCKET: &str = "STL2GLB_GLB_BUCKET_NAME";
pub const ENV_STORE_ROOT: &str = "STL2GLB_STORE_ROOT";
pub const ENV_WORK_DIR: &str = "STL2GLB_WORK_DIR";
pub const ENV_WORKERS: &str = "STL2GLB_WORKERS";

fn default_work_dir() -> PathBuf {
  std::env::temp_dir()
}

fn default_vertex_cap() -> usize {
  MAX_CHUNK_VERTICES
}

/// The converter configuration, built once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalaConverterConfig {
  /// The bucket STL files are downloaded from.
  pub stl_bucket: String,
  /// The bucket GLB files are uploaded to.
  pub glb_bucket: String,
  /// The directory holding one sub-directory per bucket.
  pub store_root: PathBuf,
  /// The directory for intermediate files.
  #[serde(default = "default_work_dir")]
  pub work_dir: PathBuf,
  #[serde(default)]
  pub decode: HalaDecodeOptions,
  #[serde(default = "default_vertex_cap")]
  pub vertex_cap: usize,
}

/// The implementation of the converter configuration.
impl HalaConverterConfig {
  /// Create a configuration with default tuning.
  /// param stl_bucket: The source bucket.
  /// param glb_bucket: The destination bucket.
  /// param store_root: The root of the local object store.
  /// return: The configuration.
  pub fn new<P: Into<PathBuf>>(stl_bucket: &str, glb_bucket: &str, store_root: P) -> Self {
    Self {
      stl_bucket: stl_bucket.to_string(),
      glb_bucket: glb_bucket.to_string(),
      store_root: store_root.into(),
      work_dir: default_work_dir(),
      decode: HalaDecodeOptions::default(),
      vertex_cap: default_vertex_cap(),
    }
  }

  /// Load the configuration from a JSON file.
  /// param path: The path of the JSON file.
  /// return: The configuration.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, HalaConvertError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
      .map_err(|err| HalaConvertError::new(&format!("Read config file \"{:?}\" failed.", path), Some(Box::new(err))))?;
    serde_json::from_str(&text)
      .map_err(|err| HalaConvertError::new(&format!("Parse config file \"{:?}\" failed.", path), Some(Box::new(err))))
  }

  /// Load the configuration from the process environment.
  /// return: The configuration.
  pub fn from_env() -> Result<Self, HalaConvertError> {
    Self::from_vars(|name| std::env::var(name).ok())
  }

  /// Load the configuration from named variables.
  /// param lookup: Returns the value of a variable, if set.
  /// return: The configuration.
  pub fn from_vars<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, HalaConvertError> {
    let required = |name: &str| {
      lookup(name)
        .filter(|value| !value.is_empty())
        .ok_or(HalaConvertError::new(&format!("Missing required environment variable {}.", name), None))
    };

    let mut config = Self::new(
      &required(ENV_STL_BUCKET)?,
      &required(ENV_GLB_BUCKET)?,
      required(ENV_STORE_ROOT)?,
    );
    if let Some(work_dir) = lookup(ENV_WORK_DIR) {
      config.work_dir = PathBuf::from(work_dir);
    }
    if let Some(workers) = lookup(ENV_WORKERS) {
      config.decode.workers = workers.parse()
        .map_err(|err| HalaConvertError::new(&format!("Invalid {} value \"{}\".", ENV_WORKERS, workers), Some(Box::new(err))))?;
    }
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  #[test]
  fn from_vars_reads_required_and_optional_values() {
    let vars = HashMap::from([
      (ENV_STL_BUCKET, "printer_model"),
      (ENV_GLB_BUCKET, "printer_glb_model"),
      (ENV_STORE_ROOT, "/srv/store"),
      (ENV_WORKERS, "3"),
    ]);
    let config = HalaConverterConfig::from_vars(|name| vars.get(name).map(|v| v.to_string())).unwrap();
    assert_eq!(config.stl_bucket, "printer_model");
    assert_eq!(config.glb_bucket, "printer_glb_model");
    assert_eq!(config.store_root, PathBuf::from("/srv/store"));
    assert_eq!(config.decode.workers, 3);
    assert_eq!(config.vertex_cap, MAX_CHUNK_VERTICES);
  }

  #[test]
  fn from_vars_reports_missing_variable() {
    let err = HalaConverterConfig::from_vars(|_| None).unwrap_err();
    assert!(err.message().contains(ENV_STL_BUCKET));
  }

  #[test]
  fn from_vars_rejects_bad_worker_count() {
    let err = HalaConverterConfig::from_vars(|name| match name {
      ENV_WORKERS => Some("many".to_string()),
      _ => Some("x".to_string()),
    }).unwrap_err();
    assert!(err.message().contains(ENV_WORKERS));
  }

  #[test]
  fn from_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "stl_bucket": "a", "glb_bucket": "b", "store_root": "/tmp/store", "decode": { "workers": 1 } }"#).unwrap();
    let config = HalaConverterConfig::from_file(&path).unwrap();
    assert_eq!(config.decode.workers, 1);
    assert_eq!(config.decode.range_size, 10000);
    assert_eq!(config.work_dir, std::env::temp_dir());
  }
}
