// src/settlement/png.rs
//! Визуализация поселений в изображение
//!
//! Каждое поселение получает свой оттенок радуги (равномерно по номеру),
//! ничьи клетки — тёмный фон. Зародыши отмечаются белыми кружками.

use crate::error::TerrainError;
use crate::settlement::SettlementMap;
use image::{ImageBuffer, Rgba};
use imageproc::drawing::draw_filled_circle_mut;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Цвет клеток без поселения
const BACKGROUND: [u8; 4] = [20, 20, 60, 255];
const SITE_MARKER: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Оттенок `hue` в `[0, 1)` при полной насыщенности и яркости
fn rainbow(hue: f32) -> [u8; 4] {
    let h = hue.rem_euclid(1.0) * 6.0;
    let sector = h.floor() as u32;
    let f = h - h.floor();
    let rising = (f * 255.0).round() as u8;
    let falling = ((1.0 - f) * 255.0).round() as u8;
    let (r, g, b) = match sector {
        0 => (255, rising, 0),
        1 => (falling, 255, 0),
        2 => (0, 255, rising),
        3 => (0, falling, 255),
        4 => (rising, 0, 255),
        _ => (255, 0, falling),
    };
    [r, g, b, 255]
}

impl SettlementMap {
    /// Цвет поселения по номеру; 0 — фон
    #[must_use]
    pub fn label_color(&self, label: u32) -> [u8; 4] {
        if label == 0 || self.sites.is_empty() {
            BACKGROUND
        } else {
            rainbow((label - 1) as f32 / self.sites.len() as f32)
        }
    }

    /// Вектор байт RGBA длиной `width × height × 4`
    #[must_use]
    pub fn to_rgba_image(&self) -> Vec<u8> {
        let palette: Vec<[u8; 4]> = (0..=self.sites.len() as u32)
            .map(|label| self.label_color(label))
            .collect();
        let color = |&label: &u32| palette.get(label as usize).copied().unwrap_or(BACKGROUND);

        #[cfg(feature = "parallel")]
        let bytes = self.data.par_iter().flat_map_iter(color).collect();
        #[cfg(not(feature = "parallel"))]
        let bytes = self.data.iter().flat_map(color).collect();

        bytes
    }

    pub fn save_as_png(&self, path: &str) -> Result<(), TerrainError> {
        let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_raw(self.width, self.height, self.to_rgba_image())
                .ok_or(TerrainError::ImageBuffer)?;

        let radius = (self.width.min(self.height) / 100).max(1) as i32;
        for &(x, y) in &self.sites {
            draw_filled_circle_mut(&mut img, (x, y), radius, SITE_MARKER);
        }

        img.save(path)?;
        Ok(())
    }
}
