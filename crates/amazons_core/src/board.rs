use crate::types::*;

pub const MIN_SIZE: usize = 6;
pub const MAX_SIZE: usize = 25;
pub const DEFAULT_SIZE: usize = 10;

/// Square grid of cells. Owned by `Game`; engines operate on cloned
/// snapshots, so `Clone` must stay cheap and exact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
}

impl Board {
    pub fn empty(size: usize) -> Self {
        assert!(
            (1..=MAX_SIZE).contains(&size),
            "board size {} outside 1..={}",
            size,
            MAX_SIZE
        );
        Self {
            size,
            cells: vec![Cell::Empty; size * size],
        }
    }

    /// Canonical symmetric starting layout: four queens per side on the
    /// edge squares, Black nearest the bottom edge.
    pub fn starting(size: usize) -> Self {
        assert!(
            (MIN_SIZE..=MAX_SIZE).contains(&size),
            "board size {} outside {}..={}",
            size,
            MIN_SIZE,
            MAX_SIZE
        );
        let mut b = Self::empty(size);
        let n = size as i8;
        let near = n / 2 - 2;
        let far = n / 2 + 1;

        for pos in [
            Pos::new(0, near),
            Pos::new(0, far),
            Pos::new(near, 0),
            Pos::new(near, n - 1),
        ] {
            b.set_cell(pos, Cell::Queen(Color::White));
        }
        for pos in [
            Pos::new(far, 0),
            Pos::new(far, n - 1),
            Pos::new(n - 1, near),
            Pos::new(n - 1, far),
        ] {
            b.set_cell(pos, Cell::Queen(Color::Black));
        }
        b
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        let n = self.size as i8;
        (0..n).contains(&pos.row) && (0..n).contains(&pos.col)
    }

    fn idx(&self, pos: Pos) -> usize {
        pos.row as usize * self.size + pos.col as usize
    }

    pub fn cell(&self, pos: Pos) -> Cell {
        self.cells[self.idx(pos)]
    }

    pub fn set_cell(&mut self, pos: Pos, cell: Cell) {
        let i = self.idx(pos);
        self.cells[i] = cell;
    }

    /// Positions of all queens of one color, in row-major scan order.
    pub fn queens(&self, color: Color) -> Vec<Pos> {
        let mut out = Vec::with_capacity(4);
        for row in 0..self.size as i8 {
            for col in 0..self.size as i8 {
                let pos = Pos::new(row, col);
                if self.cell(pos) == Cell::Queen(color) {
                    out.push(pos);
                }
            }
        }
        out
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != Cell::Empty).count()
    }

    /// Every empty square reachable from `from` by an unobstructed queen
    /// ray, ordered by direction then by distance. Empty source squares
    /// have no moves. Serves both the queen move and the arrow shot (the
    /// shot is cast on the board with the queen already relocated).
    pub fn valid_moves(&self, from: Pos) -> Vec<Pos> {
        let mut out = Vec::new();
        if !self.in_bounds(from) || self.cell(from) == Cell::Empty {
            return out;
        }
        for (dr, dc) in DIRECTIONS {
            let mut pos = Pos::new(from.row + dr, from.col + dc);
            while self.in_bounds(pos) && self.cell(pos) == Cell::Empty {
                out.push(pos);
                pos = Pos::new(pos.row + dr, pos.col + dc);
            }
        }
        out
    }

    /// True if any queen of `color` has at least one move.
    pub fn has_any_move(&self, color: Color) -> bool {
        self.queens(color)
            .into_iter()
            .any(|q| !self.valid_moves(q).is_empty())
    }

    /// All complete legal turns for `color`. The arrow leg is generated on
    /// a board with the queen already relocated, so shooting back through
    /// the vacated square is included.
    pub fn legal_turns(&self, color: Color) -> Vec<Turn> {
        let mut out = Vec::new();
        for from in self.queens(color) {
            for to in self.valid_moves(from) {
                let mut moved = self.clone();
                moved.set_cell(to, moved.cell(from));
                moved.set_cell(from, Cell::Empty);
                for shot in moved.valid_moves(to) {
                    out.push(Turn::new(from, to, shot));
                }
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod board_tests;
