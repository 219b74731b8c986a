//! Inspect and convert map saves
//!
//! Run with: cargo run --bin mapsave -- convert old.idx new.fmp

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mapsave::mapdoc::Layer;
use mapsave::{config, Config, FormatKind, MapCodec};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mapsave")]
#[command(about = "Convert map saves between the legacy, container and Lua table formats")]
struct Args {
    /// JSON config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Extra JSON tileset file, may be repeated
    #[arg(long, global = true)]
    tileset: Vec<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the format, size and contents of a save
    Info { path: PathBuf },
    /// Import a save and export it again
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Output format; guessed from the output extension when omitted
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Import a save and print the document as JSON
    Dump { input: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Fmp,
    Map,
    Lua,
}

impl From<OutputFormat> for FormatKind {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Fmp => FormatKind::ContainerA,
            OutputFormat::Map => FormatKind::ContainerB,
            OutputFormat::Lua => FormatKind::TextTable,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    let mut codec = MapCodec::from_config(config)?;
    for path in &args.tileset {
        codec.add_tileset(config::load_tileset(path)?);
    }

    match args.command {
        Command::Info { path } => {
            let kind = FormatKind::detect(&path)?;
            let doc = codec.import(&path)?;
            println!("Format: {kind}");
            println!("Size: {}x{}", doc.width, doc.height);
            println!("Properties: {}", doc.properties.len());
            for (key, value) in &doc.properties {
                println!("  {key} = {value}");
            }
            for layer in &doc.layers {
                match layer {
                    Layer::Tiles(tiles) => {
                        let filled = tiles.cells.iter().filter(|c| c.is_some()).count();
                        println!("Layer {:?}: {filled}/{} cells", tiles.name, tiles.cells.len());
                    }
                    Layer::Objects(objects) => {
                        println!("Layer {:?}: {} objects", objects.name, objects.object_count());
                    }
                }
            }
        }
        Command::Convert { input, output, format } => {
            codec.convert(&input, &output, format.map(FormatKind::from))?;
            eprintln!("Wrote {}", output.display());
        }
        Command::Dump { input } => {
            let doc = codec.import(&input)?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }

    Ok(())
}
