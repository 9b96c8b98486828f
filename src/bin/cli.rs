use clap::Parser;
use std::fs;
use std::path::PathBuf;
use terragen::{GenerationParams, generate_world};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Генератор островного рельефа с реками и поселениями
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML (по умолчанию — встроенные параметры)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Переопределить сид из конфигурации
    #[arg(short, long)]
    seed: Option<u64>,

    /// Каталог для height.png, terrain.png, rivers.png, settlements.png и world.json
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut params = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            GenerationParams::from_toml_file(&path.to_string_lossy())?
        }
        None => GenerationParams::default(),
    };
    if let Some(seed) = cli.seed {
        params.seed = seed;
    }

    info!(
        "Generating {}x{} island (seed {})",
        params.width, params.height, params.seed
    );
    let world = generate_world(&params)?;

    fs::create_dir_all(&cli.output_dir)?;
    let out = |name: &str| cli.output_dir.join(name).to_string_lossy().into_owned();

    world.heightmap.save_as_png(&out("height.png"))?;
    world
        .heightmap
        .save_terrain_png(&out("terrain.png"), params.water_level)?;
    world.rivers.save_as_png(&out("rivers.png"))?;
    world.settlements.save_as_png(&out("settlements.png"))?;

    let summary = world.summary(&params);
    fs::write(out("world.json"), serde_json::to_string_pretty(&summary)?)?;

    info!(
        "Done: {} settlements, {} rivers written to {}",
        summary.settlements.len(),
        summary.river_lengths.len(),
        cli.output_dir.display()
    );
    Ok(())
}
