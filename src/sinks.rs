//! Заполнение бессточных впадин
//!
//! Итеративный вариант priority-flood без очереди с приоритетом: «поверхность»
//! стартует с бесконечности во внутренних клетках и за несколько проходов
//! опускается до минимальной высоты, с которой вода ещё может стечь к краю
//! карты или к воде. Затем суша поднимается до этой поверхности.

use crate::config::TuningConstants;
use crate::heightmap::Heightmap;
use rand::Rng;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// Значение поверхности для клеток, сток из которых ещё не найден
const UNSETTLED: f32 = f32::MAX;

/// Итог заполнения впадин
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SinkFillReport {
    /// Бессточных внутренних клеток над водой до заполнения
    pub sinks_before: usize,
    /// То же после заполнения
    pub sinks_after: usize,
    /// Выполнено проходов релаксации
    pub passes: usize,
    /// Закончился ли процесс проходом без изменений (а не по лимиту)
    pub converged: bool,
}

/// Количество внутренних клеток над уровнем воды, у которых нет строго более
/// низкого 8-соседа.
#[must_use]
pub fn count_sinks(heightmap: &Heightmap, water_level: f32) -> usize {
    let grid = heightmap.grid();
    let mut sinks = 0;
    for y in 1..heightmap.height as i32 - 1 {
        for x in 1..heightmap.width as i32 - 1 {
            let h = heightmap.get(x, y);
            if h <= water_level {
                continue;
            }
            if grid.neighbors8(x, y).iter().all(|&n| heightmap.data[n] >= h) {
                sinks += 1;
            }
        }
    }
    sinks
}

/// Поднимает сушу в бессточных впадинах так, чтобы из каждой клетки над водой
/// вёл невозрастающий путь к краю карты или к воде.
///
/// Не более `max_iterations` проходов; при `max_iterations == 0` карта не меняется.
/// Случайный джиттер `1 / uniform(jitter_min..=jitter_max)` делает поверхность
/// слегка наклонной и не даёт проходам застрять на плато.
pub fn fill_sinks<R: Rng + ?Sized>(
    heightmap: &mut Heightmap,
    water_level: f32,
    max_iterations: usize,
    tuning: &TuningConstants,
    rng: &mut R,
) -> SinkFillReport {
    let start = Instant::now();
    let sinks_before = count_sinks(heightmap, water_level);

    if max_iterations == 0 {
        return SinkFillReport {
            sinks_before,
            sinks_after: sinks_before,
            passes: 0,
            converged: false,
        };
    }

    let grid = heightmap.grid();
    let data = &heightmap.data;

    // Край карты и вода — стоки: их поверхность равна высоте
    let mut surface: Vec<f32> = data
        .iter()
        .enumerate()
        .map(|(i, &h)| {
            let (x, y) = grid.coords(i);
            if grid.is_border(x, y) || h <= water_level {
                h
            } else {
                UNSETTLED
            }
        })
        .collect();

    let epsilon = tuning.sink_epsilon;
    let mut passes = 0;
    let mut converged = false;

    while passes < max_iterations {
        passes += 1;
        let mut changes = 0usize;

        for i in 0..data.len() {
            if surface[i] == data[i] {
                continue;
            }
            let (x, y) = grid.coords(i);

            for j in grid.neighbors8(x, y) {
                if data[i] >= surface[j] + epsilon {
                    surface[i] = data[i];
                    changes += 1;
                    break;
                }
                let jitter = 1.0 / rng.gen_range(tuning.jitter_min..=tuning.jitter_max) as f32;
                let candidate = surface[j] + jitter;
                if surface[i] > candidate && candidate > data[i] {
                    surface[i] = candidate;
                    changes += 1;
                }
            }
        }

        debug!("Sink fill pass {}: {} cells changed", passes, changes);
        if changes == 0 {
            converged = true;
            break;
        }
    }

    // Клетки, до которых поверхность так и не дошла, сохраняют свою высоту
    for (h, &s) in heightmap.data.iter_mut().zip(&surface) {
        if *h > water_level && s < UNSETTLED {
            *h = s;
        }
    }

    let sinks_after = count_sinks(heightmap, water_level);
    info!(
        "Sinks filled in {:?}: {} -> {} sinks after {} passes (converged: {})",
        start.elapsed(),
        sinks_before,
        sinks_after,
        passes,
        converged
    );

    SinkFillReport {
        sinks_before,
        sinks_after,
        passes,
        converged,
    }
}
