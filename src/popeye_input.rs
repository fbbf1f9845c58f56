// Reading the Popeye input that produced a solution, and writing positions for Popeye.
//
// Only the bits the replay needs are extracted: option flags that change who moves first,
// initial imitator squares and the stipulation of every twin.

use itertools::Itertools;
use log::debug;

use crate::board::Board;
use crate::coord::{BoardShape, Coord};
use crate::error::PopeyeError;
use crate::fen::{infer_dimension, parse_fen};
use crate::force::{MoveOrder, PieceForce};
use crate::grammar::{SQUARE, create_abbr_exp, piece_list_exp};
use crate::once_cell_regex;
use crate::piece::{PieceMap, colorize, is_piece};


// Popeye commands that may follow options on the same line.
const COMMANDS: &[&str] = &[
    "beginproblem",
    "endproblem",
    "stipulation",
    "sstipulation",
    "forsyth",
    "pieces",
    "condition",
    "twin",
    "author",
    "origin",
    "title",
    "remark",
    "award",
    "protocol",
    "next",
    "zeroposition",
];

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct InputInfo {
    pub duplex: bool,
    pub half_duplex: bool,
    pub white_to_play: bool,
    pub imitators: Vec<Coord>,
    // One item per twin, starting with the diagram. `None` means the twin keeps the stipulation.
    pub stipulations: Vec<Option<String>>,
}

impl InputInfo {
    pub fn parse(input: &str) -> Self {
        let option_re = once_cell_regex!(&format!(r"(?i){}([^\n]*)", create_abbr_exp("option")));
        let command_re = once_cell_regex!(&format!(
            "(?i){}",
            COMMANDS.iter().map(|command| create_abbr_exp(command)).join("|")
        ));
        let duplex_re = once_cell_regex!(&format!("(?i){}", create_abbr_exp("duplex")));
        let half_duplex_re = once_cell_regex!(&format!("(?i){}", create_abbr_exp("halfduplex")));
        let white_to_play_re =
            once_cell_regex!(&format!("(?i){}", create_abbr_exp("whitetoplay")));
        let imitator_re = once_cell_regex!(&format!(
            r"(?i){}\s*((?:{SQUARE}\s*)+)",
            create_abbr_exp("imitator")
        ));
        let square_re = once_cell_regex!(SQUARE);
        let twin_re = once_cell_regex!(&format!("(?i){}", create_abbr_exp("twin")));
        let stipulation_re = once_cell_regex!(&format!(
            r"(?i){}\s+(\S+)",
            create_abbr_exp("stipulation")
        ));

        let mut info = InputInfo::default();
        for cap in option_re.captures_iter(input) {
            let options = cap.get(1).unwrap().as_str();
            let options = command_re.find(options).map_or(options, |m| &options[..m.start()]);
            info.duplex |= duplex_re.is_match(options);
            info.half_duplex |= half_duplex_re.is_match(options);
            info.white_to_play |= white_to_play_re.is_match(options);
        }
        if let Some(cap) = imitator_re.captures(input) {
            let squares = cap.get(1).unwrap().as_str().to_ascii_lowercase();
            info.imitators = square_re
                .find_iter(&squares)
                .filter_map(|m| Coord::from_algebraic(m.as_str()))
                .collect();
        }
        info.stipulations = twin_re
            .split(input)
            .map(|segment| {
                stipulation_re.captures(segment).map(|cap| cap.get(1).unwrap().as_str().to_owned())
            })
            .collect();
        debug!("Popeye input: {info:?}");
        info
    }

    // Stipulation set by twin number `index` (0 for the diagram), if it sets one.
    pub fn stipulation(&self, index: usize) -> Option<&str> {
        self.stipulations.get(index).and_then(|s| s.as_deref())
    }
}

// Help play starts with black, unless Popeye was told otherwise.
pub fn ordering_for(stipulation: &str, info: &InputInfo) -> MoveOrder {
    let help_re = once_cell_regex!(r"(?i)^\s*(?:exact-)?(?:p?ser-)?h(?:[^sr]|$)");
    let ordering = if help_re.is_match(stipulation) && !info.white_to_play {
        MoveOrder::BlackFirst
    } else {
        MoveOrder::WhiteFirst
    };
    if info.half_duplex { ordering.flipped() } else { ordering }
}

pub fn is_proof_game(stipulation: &str) -> bool {
    once_cell_regex!(r"(?i)^\s*(?:exact-)?dia").is_match(stipulation)
}

// The diagram, from either a `forsyth` command or `pieces` lists.
pub fn board_from_input(input: &str, piece_map: &PieceMap) -> Option<Board> {
    let forsyth_re =
        once_cell_regex!(&format!(r"(?i){}\s+(\S+)", create_abbr_exp("forsyth")));
    let pieces_re = once_cell_regex!(&format!("(?i){}", create_abbr_exp("pieces")));
    if let Some(cap) = forsyth_re.captures(input) {
        let fen = cap.get(1).unwrap().as_str();
        let shape = infer_dimension(fen).unwrap_or(BoardShape::standard());
        let board = parse_fen(fen, shape.num_cols, shape.num_rows);
        return Some(board.map(|token| piece_map.normalize_token(token)));
    }
    let start = pieces_re.find(input)?.end();
    Some(parse_piece_lists(&input[start..], piece_map))
}

// "white Ke1 Ra1h1 black Ke8 neutral Sb1" up to the first word that belongs to another command.
fn parse_piece_lists(text: &str, piece_map: &PieceMap) -> Board {
    let white_re = once_cell_regex!(&format!("(?i)^{}$", create_abbr_exp("white")));
    let black_re = once_cell_regex!(&format!("(?i)^{}$", create_abbr_exp("black")));
    let neutral_re = once_cell_regex!(&format!("(?i)^{}$", create_abbr_exp("neutral")));
    let piece_list_re = once_cell_regex!(&piece_list_exp());
    let square_re = once_cell_regex!(SQUARE);
    let mut board = Board::new(BoardShape::standard());
    let mut force = PieceForce::White;
    for word in text.split_whitespace() {
        if white_re.is_match(word) {
            force = PieceForce::White;
        } else if black_re.is_match(word) {
            force = PieceForce::Black;
        } else if neutral_re.is_match(word) {
            force = PieceForce::Neutral;
        } else if let Some(cap) = piece_list_re.captures(word) {
            let token = colorize(&piece_map.to_normal_piece(cap.get(1).unwrap().as_str()), force);
            for m in square_re.find_iter(cap.get(2).unwrap().as_str()) {
                if let Some(pos) = Coord::from_algebraic(m.as_str()) {
                    board[pos] = token.clone();
                }
            }
        } else {
            break;
        }
    }
    board
}

// Position in Popeye `forsyth` syntax. Text annotations are dropped: Popeye cannot use them.
pub fn to_popeye_fen(board: &Board, piece_map: &PieceMap) -> Result<String, PopeyeError> {
    let shape = board.shape();
    let mut rows = Vec::with_capacity(shape.num_rows as usize);
    for row in &shape.coords().chunks(shape.num_cols as usize) {
        let mut row_notation = String::new();
        let mut empty_count = 0;
        for pos in row {
            let token = &board[pos];
            if !is_piece(token) {
                empty_count += 1;
                continue;
            }
            let Some(piece) = piece_map.to_popeye_piece(token) else {
                return Err(PopeyeError::UnmappedPiece {
                    square: pos.to_algebraic(),
                    token: token.clone(),
                });
            };
            if empty_count > 0 {
                row_notation.push_str(&empty_count.to_string());
                empty_count = 0;
            }
            row_notation.push_str(&piece);
        }
        if empty_count > 0 {
            row_notation.push_str(&empty_count.to_string());
        }
        rows.push(row_notation);
    }
    Ok(rows.join("/"))
}
