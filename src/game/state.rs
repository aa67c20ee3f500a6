use std::collections::VecDeque;

use super::direction::Direction;

/// A cell address on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Move position by delta
    pub fn moved_by(&self, d_row: i32, d_col: i32) -> Self {
        Self {
            row: self.row + d_row,
            col: self.col + d_col,
        }
    }

    /// Move position in a direction
    pub fn moved_in_direction(&self, direction: Direction) -> Self {
        let (d_row, d_col) = direction.delta();
        self.moved_by(d_row, d_col)
    }
}

/// What occupies a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellState {
    #[default]
    Empty,
    Snake,
    Food,
    /// Permanent barrier placed by the level
    Outside,
}

/// Fixed-size, row-major grid of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<CellState>,
}

impl Grid {
    /// Create an all-empty grid
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![CellState::Empty; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Check if a position is within the grid bounds
    pub fn contains(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.row < self.rows as i32 && pos.col >= 0 && pos.col < self.cols as i32
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.contains(pos)
            .then(|| pos.row as usize * self.cols + pos.col as usize)
    }

    /// Cell state at `pos`, or `None` when out of bounds
    pub fn get(&self, pos: Position) -> Option<CellState> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// Set the cell at `pos`. Out-of-bounds writes are ignored.
    pub fn set(&mut self, pos: Position, state: CellState) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = state;
        }
    }

    /// All positions holding `state`, in row-major order
    pub fn positions_of(&self, state: CellState) -> Vec<Position> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == state)
            .map(|(i, _)| Position::new((i / self.cols) as i32, (i % self.cols) as i32))
            .collect()
    }

    /// Number of cells holding `state`
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|cell| **cell == state).count()
    }
}

/// The snake, head first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snake {
    body: VecDeque<Position>,
}

impl Snake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the head position
    pub fn head(&self) -> Option<Position> {
        self.body.front().copied()
    }

    /// Get the tail position (last segment)
    pub fn tail(&self) -> Option<Position> {
        self.body.back().copied()
    }

    pub fn push_head(&mut self, pos: Position) {
        self.body.push_front(pos);
    }

    pub fn pop_tail(&mut self) -> Option<Position> {
        self.body.pop_back()
    }

    pub fn clear(&mut self) {
        self.body.clear();
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Type of collision that ended the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionType {
    /// Snake left the grid or ran into a barrier
    Wall,
    /// Snake hit itself
    SelfCollision,
}
