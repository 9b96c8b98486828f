//! Полный конвейер генерации острова
//!
//! Этапы идут строго в одну сторону, каждый работает с одной и той же картой высот:
//! 1. Фрактальный рельеф (diamond-square) и термальная эрозия, затем нормализация
//! 2. Заполнение бессточных впадин
//! 3. Эрозия водным потоком
//! 4. Прорезание рек
//! 5. Раздел суши между поселениями

use crate::config::GenerationParams;
use crate::error::TerrainError;
use crate::heightmap::{Heightmap, generate_heightmap};
use crate::rivers::{RiverMap, carve_rivers};
use crate::settlement::graph::{build_settlement_graph, settlement_adjacency};
use crate::settlement::{SettlementMap, partition_settlements};
use crate::sinks::{SinkFillReport, fill_sinks};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// Результат генерации: итоговые карты для слоя отображения
#[derive(Debug, Clone)]
pub struct World {
    pub heightmap: Heightmap,
    pub rivers: RiverMap,
    pub settlements: SettlementMap,
    pub sink_report: SinkFillReport,
}

/// Краткая сводка по сгенерированному миру для экспорта в JSON
#[derive(Debug, Clone, Serialize)]
pub struct WorldSummary {
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    pub water_level: f32,
    pub land_cells: usize,
    pub sinks: SinkFillReport,
    pub river_lengths: Vec<usize>,
    pub settlements: Vec<SettlementSummary>,
    pub adjacency: Vec<(u32, u32)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementSummary {
    pub id: u32,
    pub site: (i32, i32),
    pub area: usize,
}

impl World {
    #[must_use]
    pub fn summary(&self, params: &GenerationParams) -> WorldSummary {
        let graph = build_settlement_graph(&self.settlements);
        let settlements = self
            .settlements
            .sites
            .iter()
            .zip(self.settlements.areas())
            .enumerate()
            .map(|(i, (&site, area))| SettlementSummary {
                id: i as u32 + 1,
                site,
                area,
            })
            .collect();

        WorldSummary {
            seed: params.seed,
            width: self.heightmap.width,
            height: self.heightmap.height,
            water_level: params.water_level,
            land_cells: self
                .heightmap
                .data
                .iter()
                .filter(|&&h| h > params.water_level)
                .count(),
            sinks: self.sink_report,
            river_lengths: self.rivers.paths.iter().map(Vec::len).collect(),
            settlements,
            adjacency: settlement_adjacency(&graph),
        }
    }
}

/// Запускает весь конвейер с генератором, засеянным `params.seed`.
pub fn generate_world(params: &GenerationParams) -> Result<World, TerrainError> {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    generate_world_with_rng(params, &mut rng)
}

/// Запускает весь конвейер с внешним источником случайности.
pub fn generate_world_with_rng<R: Rng + ?Sized>(
    params: &GenerationParams,
    rng: &mut R,
) -> Result<World, TerrainError> {
    params.validate()?;
    let start = Instant::now();
    let tuning = &params.tuning;

    let mut heightmap = generate_heightmap(
        params.width,
        params.height,
        params.randomness,
        params.erosion_iterations,
        tuning,
        rng,
    );

    let sink_report = fill_sinks(
        &mut heightmap,
        params.water_level,
        params.max_sink_iterations,
        tuning,
        rng,
    );

    heightmap.apply_flux_erosion(params.erode_amount);

    let rivers = carve_rivers(
        &mut heightmap,
        params.num_rivers,
        params.water_level,
        tuning,
        rng,
    )?;

    let settlements = partition_settlements(&heightmap, params.water_level, params.num_cities)?;

    info!(
        "World {}x{} (seed {}) generated in {:?}",
        params.width,
        params.height,
        params.seed,
        start.elapsed()
    );

    Ok(World {
        heightmap,
        rivers,
        settlements,
        sink_report,
    })
}
