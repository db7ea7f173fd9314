use crate::color::Color;

/// Address of one cell in the button grid: `(row, col)`, 0-indexed, with
/// row 0 at the top.
///
/// `Pad` itself carries no bounds; whether an address is valid depends on
/// the [`DeviceModel`](crate::DeviceModel) it is used with, and is checked
/// by the codec.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pad {
    pub row: u8,
    pub col: u8,
}

impl Pad {
    pub fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

impl From<(u8, u8)> for Pad {
    fn from((row, col): (u8, u8)) -> Self {
        Self { row, col }
    }
}

/// A rectangular image of colors, one per pad, used with
/// [`Session::set_image`](crate::Session::set_image).
///
/// Freshly created grids are all black. Cells are addressed by [`Pad`];
/// indexing out of bounds panics, like slice indexing does.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Grid {
    rows: u8,
    cols: u8,
    cells: Vec<Color>,
}

impl Grid {
    /// An all-black grid of the given dimensions.
    pub fn new(rows: u8, cols: u8) -> Self {
        Self::filled(rows, cols, Color::BLACK)
    }

    /// A grid with every cell set to `color`.
    pub fn filled(rows: u8, cols: u8, color: Color) -> Self {
        Self {
            rows,
            cols,
            cells: vec![color; rows as usize * cols as usize],
        }
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    fn index_of(&self, pad: Pad) -> usize {
        assert!(pad.row < self.rows, "row {} out of range", pad.row);
        assert!(pad.col < self.cols, "col {} out of range", pad.col);
        pad.row as usize * self.cols as usize + pad.col as usize
    }

    /// All cells in row-major order, top-left first.
    pub fn cells(&self) -> impl Iterator<Item = (Pad, Color)> + '_ {
        self.cells.iter().enumerate().map(move |(i, &color)| {
            let row = (i / self.cols as usize) as u8;
            let col = (i % self.cols as usize) as u8;
            (Pad { row, col }, color)
        })
    }
}

impl std::ops::Index<Pad> for Grid {
    type Output = Color;

    fn index(&self, pad: Pad) -> &Color {
        &self.cells[self.index_of(pad)]
    }
}

impl std::ops::IndexMut<Pad> for Grid {
    fn index_mut(&mut self, pad: Pad) -> &mut Color {
        let i = self.index_of(pad);
        &mut self.cells[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_roundtrips_cells() {
        let mut grid = Grid::new(2, 3);
        grid[Pad::new(1, 2)] = Color::RED;
        assert_eq!(grid[Pad::new(1, 2)], Color::RED);
        assert_eq!(grid[Pad::new(0, 0)], Color::BLACK);

        let cells: Vec<_> = grid.cells().collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], (Pad::new(0, 0), Color::BLACK));
        assert_eq!(cells[5], (Pad::new(1, 2), Color::RED));
    }

    #[test]
    #[should_panic]
    fn grid_panics_out_of_range() {
        let grid = Grid::new(2, 3);
        let _ = grid[Pad::new(2, 0)];
    }
}
