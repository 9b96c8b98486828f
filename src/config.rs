// src/config.rs
//! Конфигурация генерации рельефа
//!
//! Этот модуль определяет все параметры, управляющие процедурной генерацией острова:
//! - Размер сетки и амплитуда фрактального шума
//! - Эрозия (термальная и по водному потоку)
//! - Уровень воды, реки и поселения
//! - Подстроечные константы алгоритмов (`TuningConstants`)
//!
//! Все структуры поддерживают сериализацию в TOML/JSON для удобной настройки через конфигурационные файлы.

use crate::error::TerrainError;
use serde::{Deserialize, Serialize};
use std::fs;

/// Подстроечные константы алгоритмов
///
/// Вынесены из кода, чтобы эксперименты и тесты могли их менять.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TuningConstants {
    /// Показатель степени затухания у края карты: множитель `closest^border_exponent`,
    /// где `closest` — нормированное расстояние до ближайшего края.
    /// Маленькие значения дают крутой обрыв только у самой границы (эффект острова).
    #[serde(default = "default_border_exponent")]
    pub border_exponent: f32,

    /// Верхняя граница сырой высоты во время фрактального деления
    #[serde(default = "default_elevation_ceiling")]
    pub elevation_ceiling: f32,

    /// Делитель амплитуды случайности для дочерних квадрантов (целочисленное деление)
    #[serde(default = "default_random_decay")]
    pub random_decay: i32,

    /// Нижняя граница случайной высоты центра самого первого квадранта
    #[serde(default = "default_bootstrap_min")]
    pub bootstrap_min: i32,

    /// Верхняя граница случайной высоты центра самого первого квадранта
    #[serde(default = "default_bootstrap_max")]
    pub bootstrap_max: i32,

    /// Минимальный перепад, при котором клетка считается стекающей к соседу
    #[serde(default = "default_sink_epsilon")]
    pub sink_epsilon: f32,

    /// Джиттер заполнения впадин равен `1 / n`, где `n` равномерно в `jitter_min..=jitter_max`
    #[serde(default = "default_jitter_min")]
    pub jitter_min: u32,

    #[serde(default = "default_jitter_max")]
    pub jitter_max: u32,

    /// Исток реки должен быть выше уровня воды хотя бы на эту величину
    #[serde(default = "default_river_source_margin")]
    pub river_source_margin: f32,
}

fn default_border_exponent() -> f32 {
    0.05
}
fn default_elevation_ceiling() -> f32 {
    100.0
}
fn default_random_decay() -> i32 {
    2
}
fn default_bootstrap_min() -> i32 {
    50
}
fn default_bootstrap_max() -> i32 {
    100
}
fn default_sink_epsilon() -> f32 {
    1e-3
}
fn default_jitter_min() -> u32 {
    1000
}
fn default_jitter_max() -> u32 {
    10000
}
fn default_river_source_margin() -> f32 {
    0.01
}

impl Default for TuningConstants {
    fn default() -> Self {
        Self {
            border_exponent: 0.05,
            elevation_ceiling: 100.0,
            random_decay: 2,
            bootstrap_min: 50,
            bootstrap_max: 100,
            sink_epsilon: 1e-3,
            jitter_min: 1000,
            jitter_max: 10000,
            river_source_margin: 0.01,
        }
    }
}

/// Основные параметры генерации
///
/// Полная конфигурация для генерации одного острова. Поддерживает загрузку из TOML-файлов.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Сид генератора случайных чисел (детерминированная генерация)
    #[serde(default)]
    pub seed: u64,

    /// Ширина сетки в клетках (по умолчанию 500)
    #[serde(default = "default_width")]
    pub width: u32,

    /// Высота сетки в клетках (по умолчанию 500)
    #[serde(default = "default_height")]
    pub height: u32,

    /// Начальная амплитуда случайного смещения в diamond-square (в единицах сырой высоты 0..100)
    #[serde(default = "default_randomness")]
    pub randomness: i32,

    /// Количество проходов термальной эрозии (0 = без эрозии)
    #[serde(default = "default_erosion_iterations")]
    pub erosion_iterations: usize,

    /// Уровень воды в нормированных высотах `[0, 1]`
    #[serde(default = "default_water_level")]
    pub water_level: f32,

    /// Количество прорезаемых рек
    #[serde(default = "default_num_rivers")]
    pub num_rivers: usize,

    /// Количество поселений
    #[serde(default = "default_num_cities")]
    pub num_cities: usize,

    /// Сила эрозии по водному потоку: клетка с максимальным потоком опускается на эту величину
    #[serde(default = "default_erode_amount")]
    pub erode_amount: f32,

    /// Максимальное число проходов заполнения впадин
    #[serde(default = "default_max_sink_iterations")]
    pub max_sink_iterations: usize,

    /// Подстроечные константы
    #[serde(default)]
    pub tuning: TuningConstants,
}

impl GenerationParams {
    /// Загружает параметры из TOML-файла
    ///
    /// # Пример
    /// ```toml
    /// # island.toml
    /// seed = 42
    /// width = 257
    /// height = 257
    /// num_cities = 8
    ///
    /// [tuning]
    /// border_exponent = 0.1
    /// ```
    pub fn from_toml_file(path: &str) -> Result<Self, TerrainError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, TerrainError> {
        let params: Self = toml::from_str(contents)?;
        params.validate()?;
        Ok(params)
    }

    /// Проверяет, что параметры допустимы для всех этапов генерации.
    pub fn validate(&self) -> Result<(), TerrainError> {
        let invalid = |msg: String| -> Result<(), TerrainError> {
            Err(TerrainError::InvalidConfiguration(msg))
        };

        if self.width < 2 || self.height < 2 {
            return invalid(format!(
                "grid must be at least 2x2, got {}x{}",
                self.width, self.height
            ));
        }
        if self.randomness < 0 {
            return invalid(format!("randomness must be >= 0, got {}", self.randomness));
        }
        if !self.water_level.is_finite() {
            return invalid("water_level must be finite".to_string());
        }
        if !self.erode_amount.is_finite() || self.erode_amount < 0.0 {
            return invalid(format!(
                "erode_amount must be finite and >= 0, got {}",
                self.erode_amount
            ));
        }

        let t = &self.tuning;
        if t.random_decay < 1 {
            return invalid(format!("random_decay must be >= 1, got {}", t.random_decay));
        }
        if t.bootstrap_min > t.bootstrap_max {
            return invalid(format!(
                "bootstrap range {}..={} is empty",
                t.bootstrap_min, t.bootstrap_max
            ));
        }
        if t.jitter_min < 1 || t.jitter_min > t.jitter_max {
            return invalid(format!(
                "jitter range {}..={} must be non-empty and start at 1 or above",
                t.jitter_min, t.jitter_max
            ));
        }
        if t.border_exponent.is_nan() || t.border_exponent <= 0.0 {
            return invalid(format!(
                "border_exponent must be > 0, got {}",
                t.border_exponent
            ));
        }
        if t.elevation_ceiling.is_nan() || t.elevation_ceiling <= 0.0 {
            return invalid(format!(
                "elevation_ceiling must be > 0, got {}",
                t.elevation_ceiling
            ));
        }
        Ok(())
    }
}

fn default_width() -> u32 {
    500
}
fn default_height() -> u32 {
    500
}
fn default_randomness() -> i32 {
    250
}
fn default_erosion_iterations() -> usize {
    2
}
fn default_water_level() -> f32 {
    0.1
}
fn default_num_rivers() -> usize {
    20
}
fn default_num_cities() -> usize {
    20
}
fn default_erode_amount() -> f32 {
    1.0
}
fn default_max_sink_iterations() -> usize {
    50
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            seed: 0,
            width: 500,
            height: 500,
            randomness: 250,
            erosion_iterations: 2,
            water_level: 0.1,
            num_rivers: 20,
            num_cities: 20,
            erode_amount: 1.0,
            max_sink_iterations: 50,
            tuning: TuningConstants::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(GenerationParams::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let params = GenerationParams::from_toml_str(
            "seed = 42\nwidth = 64\n\n[tuning]\njitter_max = 2000\n",
        )
        .unwrap();
        assert_eq!(params.seed, 42);
        assert_eq!(params.width, 64);
        assert_eq!(params.height, 500);
        assert_eq!(params.num_cities, 20);
        assert_eq!(params.tuning.jitter_max, 2000);
        assert_eq!(params.tuning.jitter_min, 1000);
        assert!((params.tuning.border_exponent - 0.05).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rejects_degenerate_grid() {
        let params = GenerationParams {
            width: 1,
            ..GenerationParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(TerrainError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_empty_jitter_range() {
        let mut params = GenerationParams::default();
        params.tuning.jitter_min = 500;
        params.tuning.jitter_max = 10;
        assert!(params.validate().is_err());

        params.tuning.jitter_min = 0;
        params.tuning.jitter_max = 10;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_randomness() {
        let params = GenerationParams {
            randomness: -1,
            ..GenerationParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_reported() {
        let result = GenerationParams::from_toml_str("width = \"wide\"");
        assert!(matches!(result, Err(TerrainError::Toml(_))));
    }
}
