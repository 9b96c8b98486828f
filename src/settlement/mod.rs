pub mod graph;
pub mod png;

use crate::error::TerrainError;
use crate::heightmap::Heightmap;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, info};

/// Карта поселений: 0 — ничья клетка, `1..=N` — номер поселения
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementMap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u32>,
    /// Клетки-зародыши; поселение `i + 1` растёт из `sites[i]`
    pub sites: Vec<(i32, i32)>,
}

impl SettlementMap {
    pub fn num_settlements(&self) -> usize {
        self.sites.len()
    }

    /// Площадь каждого поселения в клетках; элемент `i` — поселение `i + 1`
    pub fn areas(&self) -> Vec<usize> {
        let mut areas = vec![0; self.sites.len()];
        for &label in &self.data {
            if label > 0 {
                areas[label as usize - 1] += 1;
            }
        }
        areas
    }
}

/// Нормированное евклидово расстояние: координаты делятся на `width - 1` и `height - 1`
fn normalized_distance(a: (i32, i32), b: (i32, i32), width: u32, height: u32) -> f32 {
    let sx = (width - 1).max(1) as f32;
    let sy = (height - 1).max(1) as f32;
    let dx = (a.0 - b.0) as f32 / sx;
    let dy = (a.1 - b.1) as f32 / sy;
    (dx * dx + dy * dy).sqrt()
}

/// Жадный выбор `count` максимально удалённых друг от друга клеток (farthest-point).
///
/// Первой берётся первая клетка в порядке обхода; далее на каждом шаге — кандидат
/// с наибольшим расстоянием до ближайшего уже выбранного, при равенстве — первый.
fn farthest_point_sites(
    candidates: &[(i32, i32)],
    count: usize,
    width: u32,
    height: u32,
) -> Vec<(i32, i32)> {
    let mut sites = Vec::with_capacity(count);
    // расстояние от каждого кандидата до ближайшего выбранного
    let mut min_dist = vec![f32::INFINITY; candidates.len()];

    while sites.len() < count {
        let mut best_score = 0.0;
        let mut best = None;
        for (i, &score) in min_dist.iter().enumerate() {
            if score > best_score {
                best_score = score;
                best = Some(i);
            }
        }
        // Выбранные кандидаты имеют расстояние 0; пока count не больше числа
        // кандидатов, невыбранный с положительным расстоянием всегда найдётся
        let Some(best) = best else {
            break;
        };

        let site = candidates[best];
        sites.push(site);
        for (d, &c) in min_dist.iter_mut().zip(candidates) {
            *d = d.min(normalized_distance(c, site, width, height));
        }
    }
    sites
}

/// Делит сушу на `num_cities` поселений.
///
/// Кандидаты — клетки не ниже `water_level`. Зародыши выбираются жадно, максимально
/// удалёнными друг от друга, и получают номера с 1. Затем метки растут поиском в
/// ширину по 4-связным внутренним соседям: сосед захватывается, если он выше воды
/// и ещё без метки. Однажды назначенная метка не меняется.
///
/// Если кандидатов меньше, чем поселений, возвращается `InsufficientCandidates`.
pub fn partition_settlements(
    heightmap: &Heightmap,
    water_level: f32,
    num_cities: usize,
) -> Result<SettlementMap, TerrainError> {
    let start = Instant::now();
    let grid = heightmap.grid();

    let candidates: Vec<(i32, i32)> = (0..grid.len())
        .filter(|&i| heightmap.data[i] >= water_level)
        .map(|i| grid.coords(i))
        .collect();

    if candidates.len() < num_cities {
        return Err(TerrainError::InsufficientCandidates {
            requested: num_cities,
            available: candidates.len(),
            what: "settlement sites",
        });
    }

    let sites = farthest_point_sites(&candidates, num_cities, heightmap.width, heightmap.height);
    debug!("Settlement sites: {:?}", sites);

    let mut data = vec![0u32; grid.len()];
    let mut queue = VecDeque::new();

    for (i, &(x, y)) in sites.iter().enumerate() {
        let label = i as u32 + 1;
        data[grid.index(x, y)] = label;
        queue.push_back((x, y, label));
    }

    while let Some((x, y, label)) = queue.pop_front() {
        for (nx, ny) in grid.interior_neighbors4(x, y) {
            let nidx = grid.index(nx, ny);
            if heightmap.data[nidx] > water_level && data[nidx] == 0 {
                data[nidx] = label;
                queue.push_back((nx, ny, label));
            }
        }
    }

    let map = SettlementMap {
        width: heightmap.width,
        height: heightmap.height,
        data,
        sites,
    };
    info!(
        "Partitioned land into {} settlements in {:?}",
        map.num_settlements(),
        start.elapsed()
    );
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    /// Остров: прямоугольник суши внутри воды
    fn island(width: u32, height: u32) -> Heightmap {
        Heightmap::from_fn(width, height, |x, y| {
            if x >= 2 && y >= 2 && x < width as i32 - 2 && y < height as i32 - 2 {
                0.8
            } else {
                0.0
            }
        })
    }

    /// Каждая клетка с меткой достижима из своего зародыша по клеткам той же метки
    fn assert_connected(map: &SettlementMap) {
        let grid = Grid::new(map.width, map.height);
        for (i, &site) in map.sites.iter().enumerate() {
            let label = i as u32 + 1;
            let mut seen = vec![false; grid.len()];
            let mut queue = VecDeque::from([site]);
            seen[grid.index(site.0, site.1)] = true;
            while let Some((x, y)) = queue.pop_front() {
                for (nx, ny) in grid.interior_neighbors4(x, y) {
                    let n = grid.index(nx, ny);
                    if !seen[n] && map.data[n] == label {
                        seen[n] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }
            for (n, &l) in map.data.iter().enumerate() {
                if l == label {
                    assert!(seen[n], "cell {n} of settlement {label} is detached");
                }
            }
        }
    }

    #[test]
    fn test_single_settlement_covers_island() {
        let map = island(12, 10);
        let settlements = partition_settlements(&map, 0.1, 1).unwrap();

        assert_eq!(settlements.sites, vec![(2, 2)]);
        for (i, &label) in settlements.data.iter().enumerate() {
            let expected = u32::from(map.data[i] > 0.1);
            assert_eq!(label, expected);
        }
        assert_connected(&settlements);
    }

    #[test]
    fn test_sites_are_spread_out() {
        let map = island(20, 20);
        let settlements = partition_settlements(&map, 0.1, 2).unwrap();
        // второй зародыш — противоположный угол острова
        assert_eq!(settlements.sites, vec![(2, 2), (17, 17)]);
    }

    #[test]
    fn test_labels_cover_land_without_overwriting() {
        let map = island(16, 14);
        let settlements = partition_settlements(&map, 0.1, 4).unwrap();

        assert_eq!(settlements.num_settlements(), 4);
        for (i, &label) in settlements.data.iter().enumerate() {
            if map.data[i] > 0.1 {
                assert!((1..=4).contains(&label));
            } else {
                assert_eq!(label, 0);
            }
        }
        // каждый зародыш сохранил свою метку
        let grid = Grid::new(16, 14);
        for (i, &(x, y)) in settlements.sites.iter().enumerate() {
            assert_eq!(settlements.data[grid.index(x, y)], i as u32 + 1);
        }
        assert_eq!(settlements.areas().iter().sum::<usize>(), 10 * 12);
        assert_connected(&settlements);
    }

    #[test]
    fn test_separate_islands_unreachable_stay_unlabeled() {
        // два острова, зародыш только на первом
        let map = Heightmap::from_fn(20, 8, |x, y| {
            let on_land = (2..5).contains(&y) && ((2..6).contains(&x) || (12..16).contains(&x));
            if on_land { 0.9 } else { 0.0 }
        });
        let settlements = partition_settlements(&map, 0.5, 1).unwrap();
        let grid = Grid::new(20, 8);
        assert_eq!(settlements.data[grid.index(3, 3)], 1);
        assert_eq!(settlements.data[grid.index(13, 3)], 0);
    }

    #[test]
    fn test_too_many_cities_fail_fast() {
        let map = island(6, 6);
        let result = partition_settlements(&map, 0.5, 5);
        assert!(matches!(
            result,
            Err(TerrainError::InsufficientCandidates {
                requested: 5,
                available: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_every_candidate_can_be_a_site() {
        let map = island(6, 6);
        let settlements = partition_settlements(&map, 0.5, 4).unwrap();
        let mut sites = settlements.sites.clone();
        sites.sort_unstable();
        assert_eq!(sites, vec![(2, 2), (2, 3), (3, 2), (3, 3)]);
    }
}
