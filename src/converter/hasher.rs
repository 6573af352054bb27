use std::io::Read;
use std::path::Path;

use sha2::{
  Digest, Sha256
};

const BLOCK_SIZE: usize = 4096;

/// Compute the SHA-256 digest of a file.
/// param path: The path of the file.
/// return: The digest as lowercase hex.
pub fn sha256_file<P: AsRef<Path>>(path: P) -> Result<String, std::io::Error> {
  let mut file = std::fs::File::open(path)?;
  let mut hasher = Sha256::new();
  let mut block = [0u8; BLOCK_SIZE];
  loop {
    let count = file.read(&mut block)?;
    if count == 0 {
      break;
    }
    hasher.update(&block[..count]);
  }
  Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn digest_matches_known_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("abc.txt");
    std::fs::write(&path, b"abc").unwrap();
    assert_eq!(
      sha256_file(&path).unwrap(),
      "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
  }

  #[test]
  fn digest_spans_multiple_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("large.bin");
    let data = vec![0x5au8; BLOCK_SIZE * 3 + 17];
    std::fs::write(&path, &data).unwrap();
    assert_eq!(sha256_file(&path).unwrap(), format!("{:x}", Sha256::digest(&data)));
  }

  #[test]
  fn missing_file_is_error() {
    assert!(sha256_file("/nonexistent/stl2glb/file").is_err());
  }
}
