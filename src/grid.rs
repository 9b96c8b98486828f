//! Адресация клеток прямоугольной сетки `width × height`
//!
//! Все обращения по координатам насыщаются до границ сетки: запрос за пределами
//! карты возвращает ближайшую клетку на краю, а не ошибку.

/// Смещения 4-связных соседей: слева, справа, сверху, снизу
pub const DIRECTIONS_4: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Смещения 8-связных соседей построчно: сначала верхний ряд, затем средний, затем нижний
pub const DIRECTIONS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Порядок обхода соседей при росте поселений: слева, сверху, справа, снизу
const INTERIOR_DIRECTIONS_4: [(i32, i32); 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];

/// Размеры сетки с построчной (row-major) адресацией
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub width: u32,
    pub height: u32,
}

impl Grid {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Индекс клетки `(x, y)`; координаты сначала зажимаются в `[0, width-1] × [0, height-1]`.
    #[must_use]
    pub fn index(&self, x: i32, y: i32) -> usize {
        let x = x.clamp(0, self.width as i32 - 1) as usize;
        let y = y.clamp(0, self.height as i32 - 1) as usize;
        y * self.width as usize + x
    }

    /// Обратное преобразование индекса в координаты
    #[must_use]
    pub fn coords(&self, idx: usize) -> (i32, i32) {
        let width = self.width as usize;
        ((idx % width) as i32, (idx / width) as i32)
    }

    /// Лежит ли клетка на внешнем кольце сетки
    #[must_use]
    pub fn is_border(&self, x: i32, y: i32) -> bool {
        x <= 0 || y <= 0 || x >= self.width as i32 - 1 || y >= self.height as i32 - 1
    }

    /// Лежит ли клетка строго внутри сетки (не на границе и не за ней)
    #[must_use]
    pub fn is_interior(&self, x: i32, y: i32) -> bool {
        0 < x && x < self.width as i32 - 1 && 0 < y && y < self.height as i32 - 1
    }

    /// Индексы 4-связных соседей (слева, справа, сверху, снизу) с насыщением у границы.
    /// У клетки на краю часть соседей совпадает с ней самой.
    #[must_use]
    pub fn neighbors4(&self, x: i32, y: i32) -> [usize; 4] {
        DIRECTIONS_4.map(|(dx, dy)| self.index(x + dx, y + dy))
    }

    /// Индексы 8-связных соседей в порядке `DIRECTIONS_8` с насыщением у границы
    #[must_use]
    pub fn neighbors8(&self, x: i32, y: i32) -> [usize; 8] {
        DIRECTIONS_8.map(|(dx, dy)| self.index(x + dx, y + dy))
    }

    /// Координаты 4-связных соседей, лежащих строго внутри сетки.
    /// Клетки внешнего кольца не возвращаются вовсе.
    pub fn interior_neighbors4(&self, x: i32, y: i32) -> impl Iterator<Item = (i32, i32)> + '_ {
        INTERIOR_DIRECTIONS_4
            .iter()
            .map(move |&(dx, dy)| (x + dx, y + dy))
            .filter(|&(nx, ny)| self.is_interior(nx, ny))
    }
}
