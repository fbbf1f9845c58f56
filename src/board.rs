use std::{fmt, ops};

use strum::EnumIter;

use crate::coord::{BoardShape, Coord};
use crate::internal_error_message;
use crate::piece::{recolor, token_force};


#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter)]
pub enum MirrorAxis {
    Vertical,     // "|": a-file <-> h-file
    Horizontal,   // "-": 1st rank <-> 8th rank
    Diagonal,     // "/": reflect in a1-h8, swaps a8 and h1
    AntiDiagonal, // "\": reflect in a8-h1, swaps a1 and h8
}

// Counter-clockwise.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter)]
pub enum Rotation {
    Quarter,
    Half,
    ThreeQuarters,
}

// A board produced by a geometric transformation, together with the animation that leads to it:
// comma-separated "from+to" square pairs, e.g. "b2c3,e2e4".
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Transformed {
    pub board: Board,
    pub anime: String,
}

// Square values are FFEN tokens, see `piece.rs`. Empty string is an empty square.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    shape: BoardShape,
    squares: Vec<String>,
}

impl Board {
    pub fn new(shape: BoardShape) -> Self {
        Board { shape, squares: vec![String::new(); shape.num_squares()] }
    }

    pub fn from_squares(shape: BoardShape, squares: Vec<String>) -> Self {
        assert_eq!(squares.len(), shape.num_squares());
        Board { shape, squares }
    }

    pub fn shape(&self) -> BoardShape { self.shape }
    pub fn squares(&self) -> &[String] { &self.squares }

    pub fn get(&self, pos: Coord) -> Option<&str> {
        pos.to_index(self.shape).map(|idx| self.squares[idx].as_str())
    }

    pub fn take(&mut self, pos: Coord) -> String { std::mem::take(&mut self[pos]) }

    pub fn pieces(&self) -> impl Iterator<Item = (Coord, &str)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter(|(_, token)| !token.is_empty())
            .map(|(idx, token)| (Coord::from_index(idx, self.shape), token.as_str()))
    }

    pub fn map(&self, f: impl FnMut(&String) -> String) -> Board {
        Board { shape: self.shape, squares: self.squares.iter().map(f).collect() }
    }

    pub fn shift(&self, delta: (i32, i32)) -> Transformed {
        let shape = self.shape;
        self.remap(shape, |pos| pos.offset(shape, delta))
    }

    pub fn mirror(&self, axis: MirrorAxis) -> Transformed {
        let rows = self.shape.num_rows;
        let cols = self.shape.num_cols;
        match axis {
            MirrorAxis::Vertical => {
                self.remap(self.shape, |pos| Some(Coord::new(pos.row, cols - 1 - pos.col)))
            }
            MirrorAxis::Horizontal => {
                self.remap(self.shape, |pos| Some(Coord::new(rows - 1 - pos.row, pos.col)))
            }
            MirrorAxis::Diagonal => {
                self.remap(self.shape.transposed(), |pos| Some(Coord::new(pos.col, pos.row)))
            }
            MirrorAxis::AntiDiagonal => self.remap(self.shape.transposed(), |pos| {
                Some(Coord::new(cols - 1 - pos.col, rows - 1 - pos.row))
            }),
        }
    }

    pub fn rotate(&self, rotation: Rotation) -> Transformed {
        let rows = self.shape.num_rows;
        let cols = self.shape.num_cols;
        match rotation {
            Rotation::Quarter => self.remap(self.shape.transposed(), |pos| {
                Some(Coord::new(pos.col, rows - 1 - pos.row))
            }),
            Rotation::Half => self.remap(self.shape, |pos| {
                Some(Coord::new(rows - 1 - pos.row, cols - 1 - pos.col))
            }),
            Rotation::ThreeQuarters => self.remap(self.shape.transposed(), |pos| {
                Some(Coord::new(cols - 1 - pos.col, pos.row))
            }),
        }
    }

    // Swaps white and black. Neutral pieces and text stay as they are.
    pub fn invert(&self) -> Transformed {
        let board = self.map(|token| match token_force(token) {
            Some(force) => recolor(token, force.inverted()),
            None => token.clone(),
        });
        Transformed { board, anime: String::new() }
    }

    fn remap(&self, new_shape: BoardShape, f: impl Fn(Coord) -> Option<Coord>) -> Transformed {
        let mut board = Board::new(new_shape);
        let mut anime = Vec::new();
        for (from, token) in self.pieces() {
            let Some(to) = f(from) else {
                continue;
            };
            anime.push(format!("{}{}", from.to_algebraic(), to.to_algebraic()));
            board[to] = token.to_owned();
        }
        Transformed { board, anime: anime.join(",") }
    }
}

impl ops::Index<Coord> for Board {
    type Output = String;
    #[track_caller]
    fn index(&self, pos: Coord) -> &Self::Output {
        let idx = pos.to_index(self.shape).unwrap_or_else(|| panic!("{}", out_of_bound_message(pos, self.shape)));
        &self.squares[idx]
    }
}

impl ops::IndexMut<Coord> for Board {
    #[track_caller]
    fn index_mut(&mut self, pos: Coord) -> &mut Self::Output {
        let idx = pos.to_index(self.shape).unwrap_or_else(|| panic!("{}", out_of_bound_message(pos, self.shape)));
        &mut self.squares[idx]
    }
}

fn out_of_bound_message(pos: Coord, shape: BoardShape) -> String {
    internal_error_message!(
        "{:?} is out of bound for {}x{} board",
        pos,
        shape.num_cols,
        shape.num_rows
    )
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Board ")?;
        f.debug_map()
            .entries(self.pieces().map(|(pos, token)| (pos.to_algebraic(), token)))
            .finish()
    }
}
