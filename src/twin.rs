// Twin headers, e.g. "b) mirror a1<-->h1", "+e) shift a1 ==> b1", "h) wRe2-->e3".

use log::debug;

use crate::board::{Board, MirrorAxis, Rotation, Transformed};
use crate::coord::{BoardShape, Coord};
use crate::error::ReplayError;
use crate::fen::{infer_dimension, make_forsyth, parse_fen};
use crate::force::PieceForce;
use crate::grammar::{COLOR, PIECE, SQUARE};
use crate::moves::move_piece;
use crate::once_cell_regex;
use crate::piece::{PieceMap, colorize, piece_code, token_force};
use crate::util::{as_single_char, decode_entities};


#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TwinResult {
    pub fen: String,
    pub board: Board,
    pub anime: String,
}

fn square(s: &str) -> Coord { Coord::from_algebraic(s).unwrap() }

fn color(s: &str) -> Option<PieceForce> { as_single_char(s).and_then(PieceForce::from_popeye) }

fn mirror_axis(a: Coord, b: Coord) -> MirrorAxis {
    let (d_row, d_col) = b - a;
    if d_row == 0 {
        MirrorAxis::Vertical
    } else if d_col == 0 {
        MirrorAxis::Horizontal
    } else if d_row == d_col {
        MirrorAxis::AntiDiagonal
    } else {
        MirrorAxis::Diagonal
    }
}

fn apply(board: &mut Board, anime: &mut Vec<String>, t: Transformed) {
    *board = t.board;
    if !t.anime.is_empty() {
        anime.push(t.anime);
    }
}

// Applies twin commands from `body` to the position `fen`, left to right. Words that do not
// change the position (e.g. stipulation changes) are skipped.
pub fn make_twin(fen: &str, body: &str, piece_map: &PieceMap) -> Result<TwinResult, ReplayError> {
    let verb_re = once_cell_regex!(r"\b(mirror|shift|rotate)\s+");
    let arrow_re = once_cell_regex!(r"\s*(==>|<-->|-->)\s*");
    let move_re = once_cell_regex!(&format!(r"^{COLOR}{PIECE}({SQUARE})-->({SQUARE})$"));
    let exchange_re =
        once_cell_regex!(&format!(r"^{COLOR}{PIECE}({SQUARE})<-->{COLOR}{PIECE}({SQUARE})$"));
    let add_re = once_cell_regex!(&format!(r"^\+({COLOR})({PIECE})({SQUARE})$"));
    let remove_re = once_cell_regex!(&format!(r"^-{COLOR}{PIECE}({SQUARE})$"));
    let substitute_re =
        once_cell_regex!(&format!(r"^({COLOR})?({PIECE})==>({COLOR})?({PIECE})$"));
    let mirror_re = once_cell_regex!(&format!(r"^mirror({SQUARE})<-->({SQUARE})$"));
    let shift_re = once_cell_regex!(&format!(r"^shift({SQUARE})==>({SQUARE})$"));
    let rotate_re = once_cell_regex!(r"^rotate(90|180|270)$");
    let polish_re = once_cell_regex!(r"(?i)^polishtype$");

    let shape = infer_dimension(fen).unwrap_or(BoardShape::standard());
    let mut board = parse_fen(fen, shape.num_cols, shape.num_rows);
    let mut anime: Vec<String> = Vec::new();

    let body = decode_entities(body);
    let body = verb_re.replace_all(&body, "$1");
    let body = arrow_re.replace_all(&body, "$1");
    for command in body.split_whitespace() {
        if let Some(cap) = move_re.captures(command) {
            let from = square(cap.get(1).unwrap().as_str());
            let to = square(cap.get(2).unwrap().as_str());
            move_piece(&mut board, from, to, Some(&mut anime))?;
        } else if let Some(cap) = exchange_re.captures(command) {
            let a = square(cap.get(1).unwrap().as_str());
            let b = square(cap.get(2).unwrap().as_str());
            for pos in [a, b] {
                if board.get(pos).is_none_or(str::is_empty) {
                    return Err(ReplayError::PieceMissing(pos.to_algebraic()));
                }
            }
            let token_a = board.take(a);
            let token_b = board.take(b);
            board[a] = token_b;
            board[b] = token_a;
            anime.push(format!("{}{}", a.to_algebraic(), b.to_algebraic()));
            anime.push(format!("{}{}", b.to_algebraic(), a.to_algebraic()));
        } else if let Some(cap) = add_re.captures(command) {
            let pos = square(cap.get(3).unwrap().as_str());
            let force = color(cap.get(1).unwrap().as_str()).unwrap();
            let token = colorize(&piece_map.to_normal_piece(cap.get(2).unwrap().as_str()), force);
            match board.get(pos) {
                Some(_) => board[pos] = token,
                None => return Err(ReplayError::SquareOffBoard(pos.to_algebraic())),
            }
        } else if let Some(cap) = remove_re.captures(command) {
            let pos = square(cap.get(1).unwrap().as_str());
            match board.get(pos) {
                Some(_) => {
                    board.take(pos);
                }
                None => return Err(ReplayError::SquareOffBoard(pos.to_algebraic())),
            }
        } else if let Some(cap) = substitute_re.captures(command) {
            let from_force = cap.get(1).and_then(|m| color(m.as_str()));
            let from_code = piece_map.to_normal_piece(cap.get(2).unwrap().as_str());
            let to_force = cap.get(3).and_then(|m| color(m.as_str()));
            let to_code = piece_map.to_normal_piece(cap.get(4).unwrap().as_str());
            board = board.map(|token| match (piece_code(token), token_force(token)) {
                (Some(code), Some(force))
                    if code == from_code && from_force.is_none_or(|f| f == force) =>
                {
                    colorize(&to_code, to_force.unwrap_or(force))
                }
                _ => token.clone(),
            });
        } else if let Some(cap) = mirror_re.captures(command) {
            let a = square(cap.get(1).unwrap().as_str());
            let b = square(cap.get(2).unwrap().as_str());
            let t = board.mirror(mirror_axis(a, b));
            apply(&mut board, &mut anime, t);
        } else if let Some(cap) = shift_re.captures(command) {
            let a = square(cap.get(1).unwrap().as_str());
            let b = square(cap.get(2).unwrap().as_str());
            let t = board.shift(b - a);
            apply(&mut board, &mut anime, t);
        } else if let Some(cap) = rotate_re.captures(command) {
            let rotation = match cap.get(1).unwrap().as_str() {
                "90" => Rotation::Quarter,
                "180" => Rotation::Half,
                _ => Rotation::ThreeQuarters,
            };
            let t = board.rotate(rotation);
            apply(&mut board, &mut anime, t);
        } else if polish_re.is_match(command) {
            let t = board.invert();
            apply(&mut board, &mut anime, t);
        } else {
            debug!("Skipping twin command {command:?}");
        }
    }
    Ok(TwinResult { fen: make_forsyth(&board), board, anime: anime.join(",") })
}
