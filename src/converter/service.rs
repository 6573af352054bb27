use std::path::{
  Path,
  PathBuf,
};

use serde::{
  Deserialize, Serialize
};

use crate::error::HalaConvertError;
use crate::glb::HalaGlbEncoder;
use crate::mesh::HalaChunkedMeshBuilder;
use crate::stl::{
  HalaStlDecoder,
  HalaStlFormat,
};
use super::config::HalaConverterConfig;
use super::hasher::sha256_file;
use super::store::{
  check_name,
  HalaObjectStore,
};

/// The request body accepted by the converter endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalaConvertRequest {
  pub stl_hash: String,
}

/// The success body of the converter endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalaConvertResponse {
  pub glb_hash: String,
}

/// The failure body of the converter endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalaErrorResponse {
  pub error: String,
}

/// What a local conversion produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalaConversionReport {
  pub format: HalaStlFormat,
  pub num_of_declared: usize,
  pub num_of_triangles: usize,
  pub num_of_skipped: usize,
  pub num_of_chunks: usize,
  pub num_of_vertices: usize,
}

/// The converter, the pipeline from a STL object to a GLB object.
pub struct HalaConverter<S: HalaObjectStore> {
  config: HalaConverterConfig,
  store: S,
  decoder: HalaStlDecoder,
}

/// The implementation of the converter.
impl<S: HalaObjectStore> HalaConverter<S> {
  /// Create a new converter.
  /// param config: The configuration.
  /// param store: The object store.
  /// return: The converter.
  pub fn new(config: HalaConverterConfig, store: S) -> Self {
    let decoder = HalaStlDecoder::new(config.decode.clone());
    Self {
      config,
      store,
      decoder,
    }
  }

  /// Get the configuration.
  /// return: The configuration.
  pub fn config(&self) -> &HalaConverterConfig {
    &self.config
  }

  /// Get the object store.
  /// return: The store.
  pub fn store(&self) -> &S {
    &self.store
  }

  /// Convert a local STL file to a local GLB file.
  /// param input: The path of the STL file.
  /// param output: The path of the GLB file.
  /// return: The conversion report.
  pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> Result<HalaConversionReport, HalaConvertError> {
    convert_stl_file(&self.decoder, self.config.vertex_cap, input, output)
  }

  /// Download a STL object, convert it and upload the GLB object.
  /// param stl_hash: The key of the STL object.
  /// return: The key of the GLB object, the SHA-256 of its content.
  pub fn run(&self, stl_hash: &str) -> Result<String, HalaConvertError> {
    check_name(stl_hash)?;
    std::fs::create_dir_all(&self.config.work_dir)
      .map_err(|err| HalaConvertError::new(&format!("Create work directory \"{:?}\" failed.", self.config.work_dir), Some(Box::new(err))))?;

    let stl_path = self.config.work_dir.join(format!("{}.stl", stl_hash));
    let glb_path = self.config.work_dir.join(format!("{}.glb", stl_hash));
    let mut leftovers = vec![stl_path.clone(), glb_path.clone()];

    let result = self.run_in(stl_hash, &stl_path, &glb_path, &mut leftovers);
    for path in leftovers.iter() {
      if path.exists() {
        if let Err(err) = std::fs::remove_file(path) {
          log::warn!("Remove working file \"{:?}\" failed: {}", path, err);
        }
      }
    }
    result
  }

  fn run_in(&self, stl_hash: &str, stl_path: &Path, glb_path: &Path, leftovers: &mut Vec<PathBuf>) -> Result<String, HalaConvertError> {
    log::info!("Downloading \"{}/{}\".", self.config.stl_bucket, stl_hash);
    self.store.download(&self.config.stl_bucket, stl_hash, stl_path)?;

    let report = self.convert_file(stl_path, glb_path)?;
    log::info!(
      "Converted \"{}\": {} triangles, {} skipped, {} chunks, {} vertices.",
      stl_hash, report.num_of_triangles, report.num_of_skipped, report.num_of_chunks, report.num_of_vertices
    );

    let glb_hash = sha256_file(glb_path)
      .map_err(|err| HalaConvertError::new("Hash GLB file failed", Some(Box::new(err))))?;
    let hashed_path = self.config.work_dir.join(format!("{}.glb", glb_hash));
    leftovers.push(hashed_path.clone());
    std::fs::rename(glb_path, &hashed_path)
      .map_err(|err| HalaConvertError::new("Rename GLB file failed", Some(Box::new(err))))?;

    log::info!("Uploading \"{}/{}\".", self.config.glb_bucket, glb_hash);
    self.store.upload(&self.config.glb_bucket, &glb_hash, &hashed_path)?;
    Ok(glb_hash)
  }

  /// Handle one request body of the converter endpoint.
  /// param body: The JSON request body.
  /// return: The status code and the JSON response body.
  pub fn handle_request(&self, body: &str) -> (u16, String) {
    let request: HalaConvertRequest = match serde_json::from_str(body) {
      Ok(request) => request,
      Err(err) => return error_response(&format!("Invalid request body: {}", err)),
    };

    match self.run(&request.stl_hash) {
      Ok(glb_hash) => {
        let response = HalaConvertResponse { glb_hash };
        (200, serde_json::to_string(&response).unwrap_or_default())
      },
      Err(err) => {
        log::error!("Convert \"{}\" failed: {}", request.stl_hash, err.full_message());
        error_response(&err.full_message())
      },
    }
  }
}

/// Convert a local STL file to a local GLB file without an object store.
/// param decoder: The STL decoder.
/// param vertex_cap: The vertex cap of each chunk.
/// param input: The path of the STL file.
/// param output: The path of the GLB file.
/// return: The conversion report.
pub fn convert_stl_file<P: AsRef<Path>, Q: AsRef<Path>>(
  decoder: &HalaStlDecoder,
  vertex_cap: usize,
  input: P,
  output: Q,
) -> Result<HalaConversionReport, HalaConvertError> {
  let mesh = decoder.decode_file(input)?;

  let mut builder = HalaChunkedMeshBuilder::with_vertex_cap(vertex_cap);
  builder.process_all(&mesh.triangles);
  let chunks = builder.finalize();

  HalaGlbEncoder::encode(&chunks, output)?;

  Ok(HalaConversionReport {
    format: mesh.format,
    num_of_declared: mesh.declared,
    num_of_triangles: mesh.triangles.len(),
    num_of_skipped: mesh.skipped(),
    num_of_chunks: chunks.len(),
    num_of_vertices: chunks.iter().map(|chunk| chunk.vertices.len()).sum(),
  })
}

fn error_response(error: &str) -> (u16, String) {
  let response = HalaErrorResponse { error: error.to_string() };
  (400, serde_json::to_string(&response).unwrap_or_default())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::converter::HalaLocalObjectStore;

  const CUBE_CORNER: &str = "solid corner
facet normal 0 0 1
 outer loop
  vertex 0 0 0
  vertex 1 0 0
  vertex 0 1 0
 endloop
endfacet
endsolid corner
";

  fn converter(root: &Path) -> HalaConverter<HalaLocalObjectStore> {
    let mut config = HalaConverterConfig::new("stl", "glb", root.join("store"));
    config.work_dir = root.join("work");
    config.decode.workers = 1;
    let store = HalaLocalObjectStore::new(root.join("store"));
    HalaConverter::new(config, store)
  }

  #[test]
  fn convert_file_reports_counts() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.stl");
    let output = dir.path().join("out.glb");
    std::fs::write(&input, CUBE_CORNER).unwrap();

    let report = converter(dir.path()).convert_file(&input, &output).unwrap();
    assert_eq!(report.format, HalaStlFormat::Ascii);
    assert_eq!(report.num_of_triangles, 1);
    assert_eq!(report.num_of_chunks, 1);
    assert_eq!(report.num_of_vertices, 3);
    assert!(output.is_file());
  }

  #[test]
  fn run_uploads_glb_under_its_hash() {
    let dir = tempfile::tempdir().unwrap();
    let converter = converter(dir.path());
    let source = dir.path().join("source.stl");
    std::fs::write(&source, CUBE_CORNER).unwrap();
    converter.store().upload("stl", "corner", &source).unwrap();

    let glb_hash = converter.run("corner").unwrap();
    let object = converter.store().object_path("glb", &glb_hash).unwrap();
    assert_eq!(sha256_file(&object).unwrap(), glb_hash);

    let work_files = std::fs::read_dir(&converter.config().work_dir).unwrap().count();
    assert_eq!(work_files, 0);
  }

  #[test]
  fn handle_request_maps_outcomes_to_status() {
    let dir = tempfile::tempdir().unwrap();
    let converter = converter(dir.path());

    let (status, body) = converter.handle_request("not json");
    assert_eq!(status, 400);
    assert!(serde_json::from_str::<HalaErrorResponse>(&body).is_ok());

    let (status, _) = converter.handle_request(r#"{ "stl_hash": "../escape" }"#);
    assert_eq!(status, 400);

    let (status, body) = converter.handle_request(r#"{ "stl_hash": "missing" }"#);
    assert_eq!(status, 400);
    let error: HalaErrorResponse = serde_json::from_str(&body).unwrap();
    assert!(error.error.contains("missing"));

    let source = dir.path().join("source.stl");
    std::fs::write(&source, CUBE_CORNER).unwrap();
    converter.store().upload("stl", "corner", &source).unwrap();
    let (status, body) = converter.handle_request(r#"{ "stl_hash": "corner" }"#);
    assert_eq!(status, 200);
    let response: HalaConvertResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.glb_hash.len(), 64);
  }
}
