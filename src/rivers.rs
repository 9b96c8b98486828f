use crate::config::TuningConstants;
use crate::error::TerrainError;
use crate::heightmap::Heightmap;
use image::{ImageBuffer, Luma};
use imageproc::drawing::draw_filled_circle_mut;
use rand::Rng;
use rand::seq::SliceRandom;
use std::time::Instant;
use tracing::{debug, info};

/// Прорезанные русла: путь каждой реки (индексы клеток от истока вниз) и маска
#[derive(Debug, Clone)]
pub struct RiverMap {
    pub width: u32,
    pub height: u32,
    pub paths: Vec<Vec<usize>>,
    pub data: Vec<u8>,
}

impl RiverMap {
    pub fn carved_cells(&self) -> usize {
        self.data.iter().filter(|&&v| v > 0).count()
    }

    pub fn save_as_png(&self, path: &str) -> Result<(), TerrainError> {
        let mut img: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(self.width, self.height, Luma([0]));
        let width = self.width as usize;

        for &idx in self.paths.iter().flatten() {
            let x = (idx % width) as i32;
            let y = (idx / width) as i32;
            draw_filled_circle_mut(&mut img, (x, y), 1, Luma([255u8]));
        }

        img.save(path)?;
        Ok(())
    }
}

/// Самый низкий 8-сосед каждой внутренней клетки, даже если он не ниже её самой.
/// У граничных клеток соседа нет.
fn lowest_neighbors(heightmap: &Heightmap) -> Vec<Option<usize>> {
    let grid = heightmap.grid();
    (0..grid.len())
        .map(|idx| {
            let (x, y) = grid.coords(idx);
            if grid.is_border(x, y) {
                return None;
            }
            let mut best = None;
            let mut best_h = f32::INFINITY;
            for nidx in grid.neighbors8(x, y) {
                if heightmap.data[nidx] < best_h {
                    best_h = heightmap.data[nidx];
                    best = Some(nidx);
                }
            }
            best
        })
        .collect()
}

/// Прорезает `num_rivers` русел от случайных возвышенностей вниз до воды.
///
/// Истоки — различные внутренние клетки (у граничных нет соседа для спуска) выше
/// `water_level + river_source_margin`. Каждая
/// клетка пути обнуляется. Путь обрывается на клетке без соседа (граница), при
/// достижении воды или когда самый низкий сосед не строго ниже текущей клетки:
/// на плато русло заканчивается, а не зацикливается.
///
/// Если подходящих клеток меньше, чем рек, возвращается `InsufficientCandidates`.
pub fn carve_rivers<R: Rng + ?Sized>(
    heightmap: &mut Heightmap,
    num_rivers: usize,
    water_level: f32,
    tuning: &TuningConstants,
    rng: &mut R,
) -> Result<RiverMap, TerrainError> {
    let start = Instant::now();
    let downs = lowest_neighbors(heightmap);

    let source_level = water_level + tuning.river_source_margin;
    let candidates: Vec<usize> = heightmap
        .data
        .iter()
        .enumerate()
        .filter(|&(i, &h)| h > source_level && downs[i].is_some())
        .map(|(i, _)| i)
        .collect();

    if candidates.len() < num_rivers {
        return Err(TerrainError::InsufficientCandidates {
            requested: num_rivers,
            available: candidates.len(),
            what: "river sources",
        });
    }

    let sources: Vec<usize> = candidates
        .choose_multiple(rng, num_rivers)
        .copied()
        .collect();

    let mut data = vec![0u8; heightmap.data.len()];
    let mut paths = Vec::with_capacity(num_rivers);

    for source in sources {
        let mut path = Vec::new();
        let mut position = source;

        loop {
            let h = heightmap.data[position];
            if h <= water_level {
                break;
            }
            let Some(next) = downs[position] else {
                break;
            };

            heightmap.data[position] = 0.0;
            data[position] = 255;
            path.push(position);

            // Строгий спуск: на плато и в ямах русло обрывается
            if heightmap.data[next] >= h {
                break;
            }
            position = next;
        }

        debug!("River from cell {} carved {} cells", source, path.len());
        paths.push(path);
    }

    let rivers = RiverMap {
        width: heightmap.width,
        height: heightmap.height,
        paths,
        data,
    };
    info!(
        "Carved {} rivers ({} cells) in {:?}",
        rivers.paths.len(),
        rivers.carved_cells(),
        start.elapsed()
    );
    Ok(rivers)
}
