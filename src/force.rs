use serde::{Deserialize, Serialize};
use strum::EnumIter;


#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, EnumIter, Serialize, Deserialize)]
pub enum Force {
    White,
    Black,
}

// Piece color. Unlike players, pieces can be neutral.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, Serialize, Deserialize)]
pub enum PieceForce {
    White,
    Black,
    Neutral,
}

// Which side moves in "1." and which in "1...".
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum MoveOrder {
    WhiteFirst,
    BlackFirst,
}

impl Force {
    pub fn opponent(self) -> Force {
        match self {
            Force::White => Force::Black,
            Force::Black => Force::White,
        }
    }

    pub fn home_rank(self) -> char {
        match self {
            Force::White => '1',
            Force::Black => '8',
        }
    }
}

impl From<Force> for PieceForce {
    fn from(force: Force) -> Self {
        match force {
            Force::White => PieceForce::White,
            Force::Black => PieceForce::Black,
        }
    }
}

impl PieceForce {
    // Popeye color prefix: "w", "b" or "n".
    pub fn from_popeye(ch: char) -> Option<Self> {
        match ch {
            'w' => Some(PieceForce::White),
            'b' => Some(PieceForce::Black),
            'n' => Some(PieceForce::Neutral),
            _ => None,
        }
    }

    pub fn inverted(self) -> Self {
        match self {
            PieceForce::White => PieceForce::Black,
            PieceForce::Black => PieceForce::White,
            PieceForce::Neutral => PieceForce::Neutral,
        }
    }
}

impl MoveOrder {
    pub fn first(self) -> Force {
        match self {
            MoveOrder::WhiteFirst => Force::White,
            MoveOrder::BlackFirst => Force::Black,
        }
    }

    pub fn second(self) -> Force { self.first().opponent() }

    pub fn flipped(self) -> Self {
        match self {
            MoveOrder::WhiteFirst => MoveOrder::BlackFirst,
            MoveOrder::BlackFirst => MoveOrder::WhiteFirst,
        }
    }
}
