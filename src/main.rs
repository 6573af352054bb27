use std::path::PathBuf;

use anyhow::{
  Context, Result
};
use clap::{
  Parser, Subcommand
};

use hala_stl2glb::prelude::*;

#[derive(Parser)]
#[command(name = "stl2glb")]
#[command(about = "Convert STL meshes to binary glTF")]
#[command(version)]
struct Args {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Convert a local STL file to a local GLB file.
  Convert {
    input: PathBuf,
    output: PathBuf,
    /// Worker threads for large binary files.
    #[arg(long)]
    workers: Option<usize>,
    /// Vertex cap of each mesh chunk.
    #[arg(long, default_value_t = MAX_CHUNK_VERTICES)]
    vertex_cap: usize,
  },
  /// Convert a STL object of the configured store and upload the GLB object.
  Run {
    stl_hash: String,
    /// JSON configuration file, the environment is used when absent.
    #[arg(long)]
    config: Option<PathBuf>,
  },
  /// Feed one request body through the converter endpoint handler.
  ServeOnce {
    request: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
  },
}

fn load_config(path: Option<&PathBuf>) -> Result<HalaConverterConfig> {
  let config = match path {
    Some(path) => HalaConverterConfig::from_file(path),
    None => HalaConverterConfig::from_env(),
  };
  config.map_err(|err| anyhow::anyhow!(err.full_message()))
}

fn make_converter(path: Option<&PathBuf>) -> Result<HalaConverter<HalaLocalObjectStore>> {
  let config = load_config(path)?;
  let store = HalaLocalObjectStore::new(config.store_root.clone());
  Ok(HalaConverter::new(config, store))
}

fn main() -> Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  let args = Args::parse();

  match args.command {
    Command::Convert { input, output, workers, vertex_cap } => {
      let mut options = HalaDecodeOptions::default();
      if let Some(workers) = workers {
        options.workers = workers;
      }
      let decoder = HalaStlDecoder::new(options);
      let report = convert_stl_file(&decoder, vertex_cap, &input, &output)
        .map_err(|err| anyhow::anyhow!(err.full_message()))
        .with_context(|| format!("Convert \"{}\" failed", input.display()))?;
      println!(
        "{} -> {}: {:?} STL, {} triangles ({} skipped), {} chunks, {} vertices",
        input.display(),
        output.display(),
        report.format,
        report.num_of_triangles,
        report.num_of_skipped,
        report.num_of_chunks,
        report.num_of_vertices,
      );
    },
    Command::Run { stl_hash, config } => {
      let converter = make_converter(config.as_ref())?;
      let glb_hash = converter.run(&stl_hash)
        .map_err(|err| anyhow::anyhow!(err.full_message()))?;
      println!("{}", serde_json::json!({ "glb_hash": glb_hash }));
    },
    Command::ServeOnce { request, config } => {
      let converter = make_converter(config.as_ref())?;
      let body = std::fs::read_to_string(&request)
        .with_context(|| format!("Read request \"{}\" failed", request.display()))?;
      let (status, response) = converter.handle_request(&body);
      println!("{}", status);
      println!("{}", response);
    },
  }

  Ok(())
}
