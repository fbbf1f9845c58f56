use std::fmt;
use std::ops;

use itertools::Itertools;
use serde::{Deserialize, Serialize};


pub const NUM_ROWS: u8 = 8;
pub const NUM_COLS: u8 = 8;


#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct BoardShape {
    pub num_rows: u8,
    pub num_cols: u8,
}

impl BoardShape {
    // Popeye only knows the orthodox board.
    pub const fn standard() -> Self { BoardShape { num_rows: NUM_ROWS, num_cols: NUM_COLS } }

    pub fn num_squares(self) -> usize { self.num_rows as usize * self.num_cols as usize }

    pub fn transposed(self) -> Self {
        BoardShape { num_rows: self.num_cols, num_cols: self.num_rows }
    }

    pub fn contains(self, row: i32, col: i32) -> bool {
        (0..self.num_rows as i32).contains(&row) && (0..self.num_cols as i32).contains(&col)
    }

    pub fn coords(self) -> impl Iterator<Item = Coord> {
        (0..self.num_rows)
            .rev()
            .cartesian_product(0..self.num_cols)
            .map(|(row, col)| Coord { row, col })
    }
}

// Zero-based. Row 0 is the first rank, i.e. the bottom of the diagram.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub row: u8,
    pub col: u8,
}

impl Coord {
    pub const fn new(row: u8, col: u8) -> Self { Self { row, col } }

    pub fn from_algebraic(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let file = chars.next()?;
        if !file.is_ascii_lowercase() {
            return None;
        }
        let rank: u8 = chars.as_str().parse().ok()?;
        let row = rank.checked_sub(1)?;
        Some(Coord { row, col: file as u8 - b'a' })
    }

    pub fn to_algebraic(self) -> String {
        format!("{}{}", (b'a' + self.col) as char, self.row + 1)
    }

    // Board squares are stored row-major starting from the top rank, same as in FEN.
    pub fn to_index(self, shape: BoardShape) -> Option<usize> {
        if !shape.contains(self.row as i32, self.col as i32) {
            return None;
        }
        let row_from_top = (shape.num_rows - 1 - self.row) as usize;
        Some(row_from_top * shape.num_cols as usize + self.col as usize)
    }

    pub fn from_index(index: usize, shape: BoardShape) -> Self {
        let cols = shape.num_cols as usize;
        let row_from_top = index / cols;
        Coord {
            row: shape.num_rows - 1 - row_from_top as u8,
            col: (index % cols) as u8,
        }
    }

    pub fn offset(self, shape: BoardShape, delta: (i32, i32)) -> Option<Self> {
        let (d_row, d_col) = delta;
        let row = self.row as i32 + d_row;
        let col = self.col as i32 + d_col;
        shape.contains(row, col).then(|| Coord { row: row as u8, col: col as u8 })
    }
}

impl ops::Sub for Coord {
    type Output = (i32, i32);
    fn sub(self, other: Self) -> Self::Output {
        (self.row as i32 - other.row as i32, self.col as i32 - other.col as i32)
    }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coord({})", self.to_algebraic())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algebraic() {
        assert_eq!(Coord::from_algebraic("a1"), Some(Coord::new(0, 0)));
        assert_eq!(Coord::from_algebraic("h8"), Some(Coord::new(7, 7)));
        assert_eq!(Coord::from_algebraic("e4").unwrap().to_algebraic(), "e4");
        assert_eq!(Coord::from_algebraic("a0"), None);
        assert_eq!(Coord::from_algebraic("E4"), None);
        assert_eq!(Coord::from_algebraic("e"), None);
    }

    #[test]
    fn index() {
        let shape = BoardShape::standard();
        assert_eq!(Coord::from_algebraic("a8").unwrap().to_index(shape), Some(0));
        assert_eq!(Coord::from_algebraic("h1").unwrap().to_index(shape), Some(63));
        assert_eq!(Coord::from_algebraic("i1").unwrap().to_index(shape), None);
        for idx in 0..shape.num_squares() {
            assert_eq!(Coord::from_index(idx, shape).to_index(shape), Some(idx));
        }
        assert_eq!(shape.coords().map(|c| c.to_index(shape).unwrap()).collect_vec(), (0..64).collect_vec());
    }

    #[test]
    fn offset() {
        let shape = BoardShape::standard();
        let e4 = Coord::from_algebraic("e4").unwrap();
        assert_eq!(e4.offset(shape, (1, -1)), Coord::from_algebraic("d5"));
        assert_eq!(e4.offset(shape, (5, 0)), None);
        assert_eq!(Coord::from_algebraic("g5").unwrap() - e4, (1, 2));
    }
}
