use std::path::{
  Path,
  PathBuf,
};

use crate::error::HalaStoreError;

/// The object storage the converter reads STL files from and writes GLB files to.
pub trait HalaObjectStore {
  /// Copy an object to a local file.
  /// param bucket: The bucket name.
  /// param key: The object key.
  /// param local_path: The destination file.
  /// return: The result.
  fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<(), HalaStoreError>;

  /// Copy a local file to an object.
  /// param bucket: The bucket name.
  /// param key: The object key.
  /// param local_path: The source file.
  /// return: The result.
  fn upload(&self, bucket: &str, key: &str, local_path: &Path) -> Result<(), HalaStoreError>;
}

/// An object store kept in a local directory, one sub-directory per bucket.
#[derive(Debug, Clone)]
pub struct HalaLocalObjectStore {
  root: PathBuf,
}

/// The implementation of the local object store.
impl HalaLocalObjectStore {
  /// Create a store rooted at a directory.
  /// param root: The root directory.
  /// return: The store.
  pub fn new<P: Into<PathBuf>>(root: P) -> Self {
    Self { root: root.into() }
  }

  /// Get the file backing an object.
  /// param bucket: The bucket name.
  /// param key: The object key.
  /// return: The path.
  pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, HalaStoreError> {
    check_name(bucket)?;
    check_name(key)?;
    Ok(self.root.join(bucket).join(key))
  }
}

/// Names become path components, so they may not climb or nest.
pub(crate) fn check_name(name: &str) -> Result<(), HalaStoreError> {
  let valid = !name.is_empty()
    && !name.starts_with('.')
    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
  if valid {
    Ok(())
  } else {
    Err(HalaStoreError::InvalidName(name.to_string()))
  }
}

impl HalaObjectStore for HalaLocalObjectStore {
  fn download(&self, bucket: &str, key: &str, local_path: &Path) -> Result<(), HalaStoreError> {
    let object = self.object_path(bucket, key)?;
    if !object.is_file() {
      return Err(HalaStoreError::NotFound {
        bucket: bucket.to_string(),
        key: key.to_string(),
      });
    }
    std::fs::copy(&object, local_path)?;
    log::debug!("Downloaded \"{}/{}\" to \"{:?}\".", bucket, key, local_path);
    Ok(())
  }

  fn upload(&self, bucket: &str, key: &str, local_path: &Path) -> Result<(), HalaStoreError> {
    let object = self.object_path(bucket, key)?;
    if let Some(parent) = object.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(local_path, &object)?;
    log::debug!("Uploaded \"{:?}\" to \"{}/{}\".", local_path, bucket, key);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn upload_then_download_round_trips_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = HalaLocalObjectStore::new(dir.path().join("store"));
    let source = dir.path().join("source.bin");
    std::fs::write(&source, b"payload").unwrap();

    store.upload("models", "abc123", &source).unwrap();
    let target = dir.path().join("target.bin");
    store.download("models", "abc123", &target).unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), b"payload");
  }

  #[test]
  fn missing_object_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = HalaLocalObjectStore::new(dir.path());
    let err = store.download("models", "nope", &dir.path().join("x")).unwrap_err();
    assert!(matches!(err, HalaStoreError::NotFound { .. }));
  }

  #[test]
  fn path_like_names_are_rejected() {
    let store = HalaLocalObjectStore::new("/srv/store");
    assert!(matches!(store.object_path("models", "../etc/passwd"), Err(HalaStoreError::InvalidName(_))));
    assert!(matches!(store.object_path("a/b", "key"), Err(HalaStoreError::InvalidName(_))));
    assert!(matches!(store.object_path("models", ""), Err(HalaStoreError::InvalidName(_))));
    assert!(store.object_path("models", "0f3a.stl").is_ok());
  }
}
