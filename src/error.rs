use thiserror::Error;

/// The structural errors of the STL decoder. Any of them aborts the decode.
#[derive(Error, Debug)]
pub enum HalaFormatError {
  #[error("STL data too small: {0} bytes, at least 84 bytes are required")]
  TooSmall(usize),

  #[error("STL data truncated: expected {expected} bytes for the declared triangles, got {actual}")]
  Truncated {
    expected: usize,
    actual: usize,
  },

  #[error("malformed ASCII STL: {0}")]
  BadAscii(String),

  #[error("read STL file failed")]
  Io(#[from] std::io::Error),
}

/// The reason a single triangle was dropped by the decoder.
/// It is never returned as an error, only counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalaTriangleDefect {
  NonFinite,
  Degenerate,
}

/// The errors of the GLB encoder.
#[derive(Error, Debug)]
pub enum HalaEncodeError {
  #[error("no geometry to encode")]
  NoGeometry,

  #[error("write GLB failed")]
  Io(#[from] std::io::Error),

  #[error("internal encoder error: {0}")]
  Internal(String),
}

/// The errors of the object store collaborators.
#[derive(Error, Debug)]
pub enum HalaStoreError {
  #[error("object \"{key}\" not found in bucket \"{bucket}\"")]
  NotFound {
    bucket: String,
    key: String,
  },

  #[error("invalid bucket or object name \"{0}\"")]
  InvalidName(String),

  #[error("object store I/O failed")]
  Io(#[from] std::io::Error),
}

/// The error type surfaced by the converter to its callers.
#[derive(Error, Debug)]
pub struct HalaConvertError {
  msg: String,
  #[source]
  source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// The implementation of the converter error.
impl HalaConvertError {
  /// Create a new error.
  /// param msg: The message of the error.
  /// param source: The source of the error.
  /// return: The error.
  pub fn new(msg: &str, source: Option<Box<dyn std::error::Error + Send + Sync>>) -> Self {
    Self {
      msg: msg.to_string(),
      source,
    }
  }

  /// Get the message without its sources.
  /// return: The message.
  pub fn message(&self) -> &str {
    &self.msg
  }

  /// Get the full message, including the chain of sources.
  /// return: The message joined with every source message.
  pub fn full_message(&self) -> String {
    let mut msg = self.msg.clone();
    let mut source = std::error::Error::source(self);
    while let Some(err) = source {
      msg.push_str(": ");
      msg.push_str(&err.to_string());
      source = err.source();
    }
    msg
  }
}

impl std::convert::From<HalaFormatError> for HalaConvertError {
  fn from(err: HalaFormatError) -> Self {
    Self {
      msg: "Decode STL failed".to_string(),
      source: Some(Box::new(err)),
    }
  }
}

impl std::convert::From<HalaEncodeError> for HalaConvertError {
  fn from(err: HalaEncodeError) -> Self {
    Self {
      msg: "Encode GLB failed".to_string(),
      source: Some(Box::new(err)),
    }
  }
}

impl std::convert::From<HalaStoreError> for HalaConvertError {
  fn from(err: HalaStoreError) -> Self {
    Self {
      msg: "Object store failed".to_string(),
      source: Some(Box::new(err)),
    }
  }
}

/// The implementation Display trait for the converter error.
impl std::fmt::Display for HalaConvertError {
  /// Format the error.
  /// param f: The formatter.
  /// return: The result.
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.msg)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn convert_error_keeps_source_chain() {
    let err: HalaConvertError = HalaFormatError::Truncated { expected: 584, actual: 334 }.into();
    assert_eq!(err.message(), "Decode STL failed");
    assert!(std::error::Error::source(&err).is_some());
    assert!(err.full_message().contains("584"));
  }

  #[test]
  fn store_error_names_bucket_and_key() {
    let err = HalaStoreError::NotFound { bucket: "stl".to_string(), key: "abc".to_string() };
    assert_eq!(err.to_string(), "object \"abc\" not found in bucket \"stl\"");
  }
}
