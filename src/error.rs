use std::fmt;


#[macro_export]
macro_rules! internal_error_message {
    () => {
        format!("Internal error at {}:{}.", file!(), line!())
    };
    ($($arg:tt)+) => {
        format!("Internal error at {}:{}: {}.", file!(), line!(), format!($($arg)*))
    };
}

// Fatal errors: the caller has to stop and report them to the user.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PopeyeError {
    UnmappedPiece { square: String, token: String },
    InvalidFen(String),
}

// Failure to interpret a single solution token. Stops the replay, but not the parse.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ReplayError {
    UnrecognizedMove(String),
    PieceMissing(String),
    SquareOffBoard(String),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ParseWarning {
    UnrecognizedEffect { step: String, effect: String },
    ReplayAborted { token: String, error: ReplayError },
    UnknownPiece { step: String, piece: String },
}

impl fmt::Display for PopeyeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopeyeError::UnmappedPiece { square, token } => {
                write!(f, "piece \"{token}\" on {square} has no Popeye equivalent")
            }
            PopeyeError::InvalidFen(fen) => write!(f, "invalid FEN: {fen}"),
        }
    }
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::UnrecognizedMove(text) => write!(f, "cannot parse move \"{text}\""),
            ReplayError::PieceMissing(square) => write!(f, "no piece on {square}"),
            ReplayError::SquareOffBoard(square) => write!(f, "square {square} is off board"),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::UnrecognizedEffect { step, effect } => {
                write!(f, "ignored effect [{effect}] in \"{step}\"")
            }
            ParseWarning::ReplayAborted { token, error } => {
                write!(f, "replay stopped at \"{token}\": {error}")
            }
            ParseWarning::UnknownPiece { step, piece } => {
                write!(f, "unknown piece {piece} in \"{step}\" is shown as text")
            }
        }
    }
}

impl std::error::Error for PopeyeError {}
impl std::error::Error for ReplayError {}
