//! Направления стока и накопление потока
//!
//! Каждая внутренняя клетка стекает в самого низкого из восьми соседей, если он
//! строго ниже её. Граничные клетки и локальные минимумы стока не имеют.

use crate::heightmap::Heightmap;
use std::cmp::Ordering;

/// Карта направлений стока: для каждой клетки индекс клетки-приёмника или `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowDirections {
    pub targets: Vec<Option<usize>>,
}

impl FlowDirections {
    /// Направление наискорейшего спуска: самый низкий 8-сосед, строго ниже клетки.
    /// При равенстве побеждает первый в порядке обхода `DIRECTIONS_8`.
    ///
    /// Зависит только от высот; после любого изменения карты её нужно пересчитать.
    #[must_use]
    pub fn steepest_descent(heightmap: &Heightmap) -> Self {
        let grid = heightmap.grid();
        let targets = (0..grid.len())
            .map(|idx| {
                let (x, y) = grid.coords(idx);
                if grid.is_border(x, y) {
                    return None;
                }

                let mut best = None;
                let mut best_h = heightmap.data[idx];
                for nidx in grid.neighbors8(x, y) {
                    if heightmap.data[nidx] < best_h {
                        best_h = heightmap.data[nidx];
                        best = Some(nidx);
                    }
                }
                best
            })
            .collect();

        Self { targets }
    }

    pub fn target(&self, idx: usize) -> Option<usize> {
        self.targets[idx]
    }

    /// Количество клеток без стока (граница и локальные минимумы)
    pub fn terminal_count(&self) -> usize {
        self.targets.iter().filter(|t| t.is_none()).count()
    }
}

/// Накопление потока: каждая клетка получает единицу осадков и передаёт весь
/// накопленный поток своему приёмнику.
///
/// Клетки обходятся от вершин к низинам. Сток идёт только в строго более низкую
/// клетку, поэтому к моменту передачи поток клетки уже полностью собран.
#[must_use]
pub fn accumulate_flux(heightmap: &Heightmap, directions: &FlowDirections) -> Vec<f32> {
    let mut flux = vec![1.0f32; heightmap.data.len()];

    let mut indices: Vec<usize> = (0..heightmap.data.len()).collect();
    indices.sort_by(|&a, &b| {
        heightmap.data[b]
            .partial_cmp(&heightmap.data[a])
            .unwrap_or(Ordering::Equal)
    });

    for &idx in &indices {
        if let Some(target) = directions.target(idx) {
            flux[target] += flux[idx];
        }
    }
    flux
}
