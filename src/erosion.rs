use crate::flow::{FlowDirections, accumulate_flux};
use crate::heightmap::Heightmap;
use std::time::Instant;
use tracing::{debug, info};

impl Heightmap {
    /// Применяет термальную эрозию (гравитационное осыпание)
    ///
    /// Для каждой внутренней клетки ищется 4-сосед с наибольшим положительным
    /// перепадом вниз; половина перепада переносится в этого соседа.
    /// Обход построчный и на месте: клетки дальше по строке видят уже обновлённых
    /// соседей. При равных перепадах побеждает первый сосед (слева, справа, сверху, снизу).
    pub fn apply_thermal_erosion(&mut self, iterations: usize) {
        if iterations == 0 {
            return;
        }
        let start = Instant::now();
        let grid = self.grid();
        let width = self.width as i32;
        let height = self.height as i32;

        for _ in 0..iterations {
            for y in 1..height - 1 {
                for x in 1..width - 1 {
                    let idx = grid.index(x, y);
                    let current_height = self.data[idx];

                    let mut max_diff = 0.0;
                    let mut target = None;
                    for nidx in grid.neighbors4(x, y) {
                        let diff = current_height - self.data[nidx];
                        if diff > max_diff {
                            max_diff = diff;
                            target = Some(nidx);
                        }
                    }

                    if let Some(nidx) = target {
                        // Материал перемещается, а не исчезает
                        let move_amount = max_diff / 2.0;
                        self.data[idx] -= move_amount;
                        self.data[nidx] += move_amount;
                    }
                }
            }
        }

        info!(
            "Thermal erosion: {} iterations in {:?}",
            iterations,
            start.elapsed()
        );
    }

    /// Эрозия водным потоком
    ///
    /// Клетка опускается на `amount * flux / max_flux` (не ниже нуля), затем вся карта
    /// делится на новый максимум, чтобы высоты остались в `[0, 1]`.
    /// Возвращает накопленный поток, по которому считалась эрозия.
    pub fn apply_flux_erosion(&mut self, amount: f32) -> Vec<f32> {
        let start = Instant::now();
        let directions = FlowDirections::steepest_descent(self);
        let flux = accumulate_flux(self, &directions);

        let max_flux = flux.iter().copied().fold(0.0f32, f32::max);
        debug!(
            "Flux accumulated: max {} over {} terminal cells",
            max_flux,
            directions.terminal_count()
        );

        if max_flux > 0.0 {
            for (h, &f) in self.data.iter_mut().zip(&flux) {
                *h = (*h - amount * (f / max_flux)).max(0.0);
            }
        }

        let max_h = self.data.iter().copied().fold(0.0f32, f32::max);
        if max_h > 0.0 {
            for h in &mut self.data {
                *h /= max_h;
            }
        }

        info!(
            "Flux erosion (amount {}) in {:?}",
            amount,
            start.elapsed()
        );
        flux
    }
}
