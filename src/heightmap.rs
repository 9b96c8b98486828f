use crate::config::TuningConstants;
use crate::error::TerrainError;
use crate::grid::Grid;
use image::{ImageBuffer, Luma, Rgba};
use rand::Rng;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Двумерная карта высот, построчно. После нормализации значения лежат в `[0, 1]`:
/// 0.0 — морское дно, 1.0 — самая высокая вершина.
#[derive(Debug, Clone, PartialEq)]
pub struct Heightmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl Heightmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(i32, i32) -> f32) -> Self {
        let grid = Grid::new(width, height);
        let data = (0..grid.len())
            .map(|i| {
                let (x, y) = grid.coords(i);
                f(x, y)
            })
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    #[must_use]
    pub fn grid(&self) -> Grid {
        Grid::new(self.width, self.height)
    }

    /// Высота в клетке `(x, y)`; координаты насыщаются до границ карты
    pub fn get(&self, x: i32, y: i32) -> f32 {
        self.data[self.grid().index(x, y)]
    }

    pub fn set(&mut self, x: i32, y: i32, value: f32) {
        let idx = self.grid().index(x, y);
        self.data[idx] = value;
    }

    /// Минимум и максимум высот; у пустой карты оба равны нулю
    pub fn min_max(&self) -> (f32, f32) {
        if self.grid().is_empty() {
            return (0.0, 0.0);
        }
        let min_h = self.data.iter().fold(f32::INFINITY, |a, &b| a.min(b));
        let max_h = self.data.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        (min_h, max_h)
    }

    /// Линейно растягивает высоты так, что минимум становится 0, а максимум 1.
    /// Плоская карта (минимум равен максимуму) превращается в нули.
    pub fn normalize(&mut self) {
        let (min_h, max_h) = self.min_max();
        if max_h > min_h {
            let range = max_h - min_h;
            for h in &mut self.data {
                *h = (*h - min_h) / range;
            }
        } else {
            self.data.fill(0.0);
        }
    }

    pub fn to_grayscale_image(&self) -> Vec<u8> {
        let to_byte = |&v: &f32| (v.clamp(0.0, 1.0) * 255.0) as u8;

        #[cfg(feature = "parallel")]
        let bytes = self.data.par_iter().map(to_byte).collect();
        #[cfg(not(feature = "parallel"))]
        let bytes = self.data.iter().map(to_byte).collect();

        bytes
    }

    pub fn save_as_png(&self, path: &str) -> Result<(), TerrainError> {
        let img: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_raw(self.width, self.height, self.to_grayscale_image())
                .ok_or(TerrainError::ImageBuffer)?;
        img.save(path)?;
        Ok(())
    }
}

/// Опорные точки палитры рельефа (magma): от тёмного дна к светлым вершинам
const TERRAIN_RAMP: [(f32, [u8; 3]); 5] = [
    (0.0, [0, 0, 4]),
    (0.25, [81, 18, 124]),
    (0.5, [183, 55, 121]),
    (0.75, [252, 137, 97]),
    (1.0, [252, 253, 191]),
];

/// Цвет клеток ниже уровня воды: начало палитры
pub const WATER_COLOR: [u8; 4] = [0, 0, 4, 255];

fn terrain_color(h: f32) -> [u8; 4] {
    let h = h.clamp(0.0, 1.0);
    let upper = TERRAIN_RAMP
        .iter()
        .position(|&(stop, _)| h <= stop)
        .unwrap_or(TERRAIN_RAMP.len() - 1)
        .max(1);
    let (lo, lo_rgb) = TERRAIN_RAMP[upper - 1];
    let (hi, hi_rgb) = TERRAIN_RAMP[upper];
    let t = (h - lo) / (hi - lo);
    let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
    [
        mix(lo_rgb[0], hi_rgb[0]),
        mix(lo_rgb[1], hi_rgb[1]),
        mix(lo_rgb[2], hi_rgb[2]),
        255,
    ]
}

impl Heightmap {
    /// Цветная карта рельефа RGBA: суша окрашивается по высоте, клетки строго ниже
    /// `water_level` получают `WATER_COLOR`.
    #[must_use]
    pub fn to_terrain_rgba(&self, water_level: f32) -> Vec<u8> {
        let color = |&h: &f32| {
            if h < water_level {
                WATER_COLOR
            } else {
                terrain_color(h)
            }
        };

        #[cfg(feature = "parallel")]
        let bytes = self.data.par_iter().flat_map_iter(color).collect();
        #[cfg(not(feature = "parallel"))]
        let bytes = self.data.iter().flat_map(color).collect();

        bytes
    }

    pub fn save_terrain_png(&self, path: &str, water_level: f32) -> Result<(), TerrainError> {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_raw(self.width, self.height, self.to_terrain_rgba(water_level))
                .ok_or(TerrainError::ImageBuffer)?;
        img.save(path)?;
        Ok(())
    }
}

/// Один квадрант фрактального деления
#[derive(Debug, Clone, Copy)]
struct DiamondTask {
    left: i32,
    bottom: i32,
    right: i32,
    top: i32,
    randomness: i32,
}

/// Множитель затухания у края: `closest^exponent`, где `closest` — нормированное
/// расстояние до ближайшего края. На самом краю равен нулю.
fn border_proximity(grid: Grid, x: i32, y: i32, exponent: f32) -> f32 {
    let w = grid.width as f32;
    let h = grid.height as f32;
    let (x, y) = (x as f32, y as f32);
    let closest = (x / w)
        .min(y / h)
        .min((w - 1.0 - x) / w)
        .min((h - 1.0 - y) / h)
        .max(0.0);
    closest.powf(exponent)
}

/// Генерирует сырую карту высот (значения `0..=elevation_ceiling`) методом
/// смещения средней точки (diamond-square).
///
/// Рекурсия заменена FIFO-очередью квадрантов: глубина стека ограничена,
/// а порядок случайных выборок детерминирован. Для каждого квадранта сначала
/// берётся смещение центра из `[-rand, rand]`, затем смещения середин верхней,
/// нижней, левой и правой сторон. Первый квадрант между центром и сторонами
/// делает ещё одну выборку из `bootstrap_min..=bootstrap_max`, которая заменяет
/// значение центра.
pub fn diamond_square<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    randomness: i32,
    tuning: &TuningConstants,
    rng: &mut R,
) -> Heightmap {
    let start = Instant::now();
    let mut map = Heightmap::new(width, height);
    let grid = map.grid();

    let ceiling = tuning.elevation_ceiling;
    let decay = tuning.random_decay.max(1);

    // Смещённое и затухающее у края значение; всё в целых единицах сырой высоты
    let displaced = |base: f32, amplitude: i32, x: i32, y: i32, rng: &mut R| -> f32 {
        let offset = rng.gen_range(-amplitude..=amplitude) as f32;
        let proximity = border_proximity(grid, x, y, tuning.border_exponent);
        ((base.floor() + offset) * proximity).clamp(0.0, ceiling).floor()
    };

    let mut queue = VecDeque::from([DiamondTask {
        left: 0,
        bottom: 0,
        right: width as i32 - 1,
        top: height as i32 - 1,
        randomness: randomness.max(0),
    }]);
    let mut processed = 0usize;

    while let Some(task) = queue.pop_front() {
        let DiamondTask {
            left,
            bottom,
            right,
            top,
            randomness: rand,
        } = task;
        let center_x = (left + right) / 2;
        let center_y = (top + bottom) / 2;

        let corners = (map.get(left, top)
            + map.get(left, bottom)
            + map.get(right, top)
            + map.get(right, bottom))
            / 4.0;
        let mut center = displaced(corners, rand, center_x, center_y, rng);
        if processed == 0 {
            // Первый квадрант: обычная выборка уже сделана, поверх неё задаётся
            // начальный рельеф из отдельного, более широкого диапазона
            let bootstrap = rng.gen_range(tuning.bootstrap_min..=tuning.bootstrap_max) as f32;
            let proximity = border_proximity(grid, center_x, center_y, tuning.border_exponent);
            center = (bootstrap * proximity).clamp(0.0, ceiling).floor();
        }
        map.set(center_x, center_y, center);
        processed += 1;

        if top != bottom {
            let mid = map.get(center_x, center_y);
            let base = (map.get(left, top) + map.get(right, top) + mid) / 3.0;
            let value = displaced(base, rand, center_x, top, rng);
            map.set(center_x, top, value);

            let mid = map.get(center_x, center_y);
            let base = (map.get(left, bottom) + map.get(right, bottom) + mid) / 3.0;
            let value = displaced(base, rand, center_x, bottom, rng);
            map.set(center_x, bottom, value);
        }

        if left != right {
            let mid = map.get(center_x, center_y);
            let base = (map.get(left, top) + map.get(left, bottom) + mid) / 3.0;
            let value = displaced(base, rand, left, center_y, rng);
            map.set(left, center_y, value);

            let mid = map.get(center_x, center_y);
            let base = (map.get(right, top) + map.get(right, bottom) + mid) / 3.0;
            let value = displaced(base, rand, right, center_y, rng);
            map.set(right, center_y, value);
        }

        if right - left > 1 || top - bottom > 1 {
            let child_rand = rand / decay;
            queue.extend([
                DiamondTask {
                    left,
                    bottom,
                    right: center_x,
                    top: center_y,
                    randomness: child_rand,
                },
                DiamondTask {
                    left,
                    bottom: center_y,
                    right: center_x,
                    top,
                    randomness: child_rand,
                },
                DiamondTask {
                    left: center_x,
                    bottom,
                    right,
                    top: center_y,
                    randomness: child_rand,
                },
                DiamondTask {
                    left: center_x,
                    bottom: center_y,
                    right,
                    top,
                    randomness: child_rand,
                },
            ]);
        }
    }

    info!(
        "Heightmap {}x{} generated in {:?} ({} quadrants)",
        width,
        height,
        start.elapsed(),
        processed
    );
    map
}

/// Генерирует нормированную карту высот: фрактальное деление, затем термальная
/// эрозия по сырым высотам, затем растяжение в `[0, 1]`.
pub fn generate_heightmap<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    randomness: i32,
    erosion_iterations: usize,
    tuning: &TuningConstants,
    rng: &mut R,
) -> Heightmap {
    let mut heightmap = diamond_square(width, height, randomness, tuning, rng);
    heightmap.apply_thermal_erosion(erosion_iterations);

    let start = Instant::now();
    heightmap.normalize();
    debug!("Heightmap normalized in {:?}", start.elapsed());

    heightmap
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn generate(width: u32, height: u32, seed: u64, erosion: usize) -> Heightmap {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        generate_heightmap(width, height, 250, erosion, &TuningConstants::default(), &mut rng)
    }

    #[test]
    fn test_output_size_and_range() {
        for &(w, h) in &[(2, 2), (3, 7), (4, 4), (10, 4), (17, 17), (33, 20)] {
            let map = generate(w, h, 7, 2);
            assert_eq!(map.data.len(), (w * h) as usize);
            assert!(
                map.data.iter().all(|&v| (0.0..=1.0).contains(&v)),
                "{w}x{h} out of range"
            );
        }
    }

    #[test]
    fn test_tiny_grid_is_flat() {
        // 2x2 — только граница, затухание обнуляет всё
        let map = generate(2, 2, 1, 0);
        assert_eq!(map.data, vec![0.0; 4]);
    }

    #[test]
    fn test_border_stays_at_sea_floor_without_erosion() {
        let map = generate(17, 17, 3, 0);
        let grid = map.grid();
        for (i, &v) in map.data.iter().enumerate() {
            let (x, y) = grid.coords(i);
            if grid.is_border(x, y) {
                assert_eq!(v, 0.0, "border cell ({x}, {y}) raised");
            }
        }
    }

    #[test]
    fn test_normalized_extremes() {
        let map = generate(33, 33, 11, 2);
        let (min_h, max_h) = map.min_max();
        assert_eq!(min_h, 0.0);
        assert!((max_h - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        assert_eq!(generate(4, 4, 42, 0), generate(4, 4, 42, 0));
        assert_eq!(generate(25, 13, 42, 3), generate(25, 13, 42, 3));
    }

    #[test]
    fn test_raw_values_are_whole_and_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let tuning = TuningConstants::default();
        let raw = diamond_square(20, 20, 500, &tuning, &mut rng);
        for &v in &raw.data {
            assert!((0.0..=tuning.elevation_ceiling).contains(&v));
            assert_eq!(v, v.floor());
        }
    }

    #[test]
    fn test_empty_map_extremes() {
        let map = Heightmap::new(0, 0);
        assert_eq!(map.min_max(), (0.0, 0.0));
    }

    #[test]
    fn test_terrain_colors_mark_water() {
        let map = Heightmap {
            width: 4,
            height: 1,
            data: vec![0.0, 0.09, 0.1, 1.0],
        };
        let rgba = map.to_terrain_rgba(0.1);
        assert_eq!(rgba.len(), 16);
        assert_eq!(&rgba[0..4], &WATER_COLOR);
        assert_eq!(&rgba[4..8], &WATER_COLOR);
        // ровно на уровне воды — уже суша
        assert_ne!(&rgba[8..12], &WATER_COLOR);
        assert_eq!(&rgba[12..16], &[252, 253, 191, 255]);
    }

    #[test]
    fn test_terrain_ramp_hits_stops() {
        assert_eq!(terrain_color(0.0), WATER_COLOR);
        assert_eq!(terrain_color(0.5), [183, 55, 121, 255]);
        assert_eq!(terrain_color(0.125), [41, 9, 64, 255]);
    }

    #[test]
    fn test_first_quadrant_draws_regular_offset_before_bootstrap() {
        use rand::RngCore;

        let tuning = TuningConstants::default();
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        // 2x2 — единственный квадрант без потомков
        diamond_square(2, 2, 40, &tuning, &mut rng);

        let mut replay = ChaCha8Rng::seed_from_u64(21);
        let _: i32 = replay.gen_range(-40..=40);
        let _: i32 = replay.gen_range(tuning.bootstrap_min..=tuning.bootstrap_max);
        for _ in 0..4 {
            let _: i32 = replay.gen_range(-40..=40);
        }
        assert_eq!(rng.next_u64(), replay.next_u64());
    }

    #[test]
    fn test_border_proximity_is_zero_on_edges() {
        let grid = Grid::new(10, 10);
        assert_eq!(border_proximity(grid, 0, 5, 0.05), 0.0);
        assert_eq!(border_proximity(grid, 9, 5, 0.05), 0.0);
        let inner = border_proximity(grid, 5, 5, 0.05);
        assert!(inner > 0.9 && inner <= 1.0);
    }
}
