use std::{
    cmp::Ordering,
    ops::{Index, IndexMut},
};

/// A 2D coordinate on the field, 0-indexed from the top-left corner.
///
/// Points order row-major (by `y`, then `x`), which is the order every scan
/// in this crate visits cells in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Point { x, y }
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One square of the field.
///
/// A revealed cell is never flagged: flag toggles refuse revealed cells and
/// reveals refuse flagged ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Cell {
    pub mine: bool,
    pub flagged: bool,
    pub revealed: bool,
}

impl Cell {
    /// Neither revealed nor flagged.
    pub fn is_hidden(&self) -> bool {
        !self.revealed && !self.flagged
    }
}

/// A fixed-size grid of cells plus the number of mines it holds (or will hold).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Field {
    width: usize,
    height: usize,
    mines: usize,
    /// Indexed `board[y][x]`.
    board: Vec<Vec<Cell>>,
    /// Set once mines have been placed.
    mined: bool,
}

impl Field {
    /// An empty field; mines arrive later through [`crate::place_mines`].
    pub fn new(width: usize, height: usize, mines: usize) -> Self {
        Field {
            width,
            height,
            mines,
            board: vec![vec![Cell::default(); width]; height],
            mined: false,
        }
    }

    /// A field with mines at exactly the given points. Points outside the field are ignored.
    pub fn with_mines(width: usize, height: usize, mines: &[Point]) -> Self {
        let mut field = Field::new(width, height, 0);
        for &point in mines {
            if field.contains(point) && !field[point].mine {
                field[point].mine = true;
                field.mines += 1;
            }
        }
        field.mined = true;
        field
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> usize {
        self.width * self.height
    }

    pub fn mine_count(&self) -> usize {
        self.mines
    }

    pub fn is_mined(&self) -> bool {
        self.mined
    }

    pub(crate) fn mark_mined(&mut self) {
        self.mined = true;
    }

    /// The board is `height` rows of `width` cells, with exactly `mines` mines once mined
    /// and none before.
    pub fn is_well_formed(&self) -> bool {
        let shaped = self.board.len() == self.height
            && self.board.iter().all(|row| row.len() == self.width);
        let expected = if self.mined { self.mines } else { 0 };
        shaped && self.count_cells(|cell| cell.mine) == expected
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x < self.width && point.y < self.height
    }

    pub fn get(&self, point: Point) -> Option<&Cell> {
        self.board.get(point.y).and_then(|row| row.get(point.x))
    }

    /// Every coordinate in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| Point { x, y }))
    }

    /// The up-to-8 in-bounds neighbors of `point`, row by row.
    pub fn neighbors(&self, point: Point) -> impl Iterator<Item = Point> + use<> {
        let width = self.width;
        let height = self.height;

        (-1..=1isize).flat_map(move |dy| {
            (-1..=1isize).filter_map(move |dx| {
                if dx == 0 && dy == 0 {
                    return None;
                }
                let x = point.x.checked_add_signed(dx)?;
                let y = point.y.checked_add_signed(dy)?;
                (x < width && y < height).then_some(Point { x, y })
            })
        })
    }

    /// Number of neighbors whose cell satisfies `predicate`.
    pub fn count_neighbors(&self, point: Point, predicate: impl Fn(&Cell) -> bool) -> usize {
        self.neighbors(point)
            .filter(|&neighbor| predicate(&self[neighbor]))
            .count()
    }

    pub fn adjacent_mines(&self, point: Point) -> usize {
        self.count_neighbors(point, |cell| cell.mine)
    }

    pub fn adjacent_flags(&self, point: Point) -> usize {
        self.count_neighbors(point, |cell| cell.flagged)
    }

    pub fn adjacent_hidden(&self, point: Point) -> usize {
        self.count_neighbors(point, Cell::is_hidden)
    }

    fn count_cells(&self, predicate: impl Fn(&Cell) -> bool) -> usize {
        self.board.iter().flatten().filter(|&cell| predicate(cell)).count()
    }

    pub fn revealed_count(&self) -> usize {
        self.count_cells(|cell| cell.revealed)
    }

    /// Flags standing on cells that are still covered.
    pub fn flagged_count(&self) -> usize {
        self.count_cells(|cell| cell.flagged && !cell.revealed)
    }

    pub fn hidden_count(&self) -> usize {
        self.count_cells(Cell::is_hidden)
    }

    /// True iff every cell without a mine has been revealed. Flags play no part.
    pub fn did_win(&self) -> bool {
        self.board
            .iter()
            .flatten()
            .all(|cell| cell.mine || cell.revealed)
    }
}

impl Index<Point> for Field {
    type Output = Cell;

    fn index(&self, point: Point) -> &Cell {
        &self.board[point.y][point.x]
    }
}

impl IndexMut<Point> for Field {
    fn index_mut(&mut self, point: Point) -> &mut Cell {
        &mut self.board[point.y][point.x]
    }
}
