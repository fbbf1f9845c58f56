#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod board;
pub mod coord;
pub mod error;
pub mod fen;
pub mod force;
pub mod grammar;
pub mod moves;
pub mod piece;
pub mod popeye_input;
pub mod solution;
pub mod step;
pub mod twin;
pub mod util;

pub use error::{ParseWarning, PopeyeError, ReplayError};
pub use piece::PieceMap;
pub use solution::{Annotator, Fragment, FragmentKind, ParsedSolution, SpanAnnotator, parse_solution};
