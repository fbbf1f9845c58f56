// Applies Popeye half-moves and their bracketed side effects to a board.
//
// No legality checks: Popeye has already validated the play, we only replay it. Animation is
// collected as a list of entries, each entry is a chain of squares visited by one piece
// ("e2e4", "d1d7a4") optionally followed by "=token" for a promotion.

use itertools::Itertools;

use crate::board::Board;
use crate::coord::Coord;
use crate::error::ReplayError;
use crate::force::{Force, PieceForce};
use crate::grammar::{COLOR, PIECE, SQUARE, half_move_parse_exp};
use crate::once_cell_regex;
use crate::piece::{PieceMap, colorize, piece_code, recolor, token_force};
use crate::util::{as_single_char, decode_entities};


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CastleDirection {
    ASide,
    HSide,
}

// A continuation of a move: either another jump of the same piece ("then" moves of Take&Make
// and similar conditions) or a promotion.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Leg {
    Move(Coord),
    Promote { force: Option<PieceForce>, piece: String },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RegularMove {
    pub piece: Option<String>, // Popeye piece name; `None` for pawns
    pub from: Coord,
    pub relocation: Option<Coord>, // Mars Circe: the piece is reborn here before moving
    pub to: Coord,
    pub legs: Vec<Leg>,
    pub volage: Option<PieceForce>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum HalfMoveKind {
    Castle(CastleDirection),
    Regular(RegularMove),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HalfMove {
    pub kind: HalfMoveKind,
    pub en_passant: bool,
    pub effects: Vec<String>, // raw bracket contents, possibly HTML-escaped
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EffectOutcome {
    Applied,
    ImitatorsPlaced,
    Unrecognized,
}

impl HalfMove {
    pub fn parse(notation: &str) -> Result<Self, ReplayError> {
        let half_move_re = once_cell_regex!(&half_move_parse_exp());
        let leg_re = once_cell_regex!(&format!(r"-({SQUARE})|=({COLOR})?({PIECE})"));
        let effect_re = once_cell_regex!(r"\[([^\]]*)\]");
        let notation = notation.trim();
        let Some(cap) = half_move_re.captures(notation) else {
            return Err(ReplayError::UnrecognizedMove(notation.to_owned()));
        };
        let kind = if let Some(castling) = cap.get(1) {
            HalfMoveKind::Castle(match castling.as_str() {
                "0-0-0" => CastleDirection::ASide,
                _ => CastleDirection::HSide,
            })
        } else {
            let legs = cap.get(7).map_or("", |m| m.as_str());
            let legs = leg_re
                .captures_iter(legs)
                .map(|leg| match leg.get(1) {
                    Some(sq) => Leg::Move(square(sq.as_str())),
                    None => Leg::Promote {
                        force: leg.get(2).and_then(|m| color(m.as_str())),
                        piece: leg.get(3).unwrap().as_str().to_owned(),
                    },
                })
                .collect();
            HalfMoveKind::Regular(RegularMove {
                piece: cap.get(3).map(|m| m.as_str().to_owned()),
                from: square(cap.get(4).unwrap().as_str()),
                relocation: cap.get(5).map(|m| square(m.as_str())),
                to: square(cap.get(6).unwrap().as_str()),
                legs,
                volage: cap.get(8).and_then(|m| color(m.as_str())),
            })
        };
        let effects = cap.get(10).map_or("", |m| m.as_str());
        Ok(HalfMove {
            kind,
            en_passant: cap.get(9).is_some(),
            effects: effect_re
                .captures_iter(effects)
                .map(|effect| effect.get(1).unwrap().as_str().to_owned())
                .collect(),
        })
    }
}

impl HalfMove {
    // Popeye names of the moving piece and of the pieces it promotes to.
    pub fn piece_names(&self) -> impl Iterator<Item = &str> {
        let mv = match &self.kind {
            HalfMoveKind::Regular(mv) => Some(mv),
            HalfMoveKind::Castle(_) => None,
        };
        let moving = mv.and_then(|mv| mv.piece.as_deref());
        let promoted = mv.into_iter().flat_map(|mv| &mv.legs).filter_map(|leg| match leg {
            Leg::Promote { piece, .. } if piece != "I" => Some(piece.as_str()),
            _ => None,
        });
        moving.into_iter().chain(promoted)
    }
}

// Only called on regex-validated squares.
fn square(s: &str) -> Coord { Coord::from_algebraic(s).unwrap() }

fn color(s: &str) -> Option<PieceForce> { as_single_char(s).and_then(PieceForce::from_popeye) }

fn on_board(board: &Board, pos: Coord) -> Result<Coord, ReplayError> {
    match board.get(pos) {
        Some(_) => Ok(pos),
        None => Err(ReplayError::SquareOffBoard(pos.to_algebraic())),
    }
}

fn popeye_piece(piece_map: &PieceMap, name: &str, force: PieceForce) -> String {
    colorize(&piece_map.to_normal_piece(name), force)
}

// Moves whatever stands on `from` to `to`, replacing the contents of `to`.
pub fn move_piece(
    board: &mut Board, from: Coord, to: Coord, anime: Option<&mut Vec<String>>,
) -> Result<(), ReplayError> {
    let from = on_board(board, from)?;
    let to = on_board(board, to)?;
    if board[from].is_empty() {
        return Err(ReplayError::PieceMissing(from.to_algebraic()));
    }
    let token = board.take(from);
    board[to] = token;
    if let Some(anime) = anime {
        anime.push(format!("{}{}", from.to_algebraic(), to.to_algebraic()));
    }
    Ok(())
}

// Applies a half-move of `force`. Returns the displacement of the moving piece, used to move
// imitators along.
pub fn make_move(
    board: &mut Board, force: Force, half_move: &HalfMove, imitators: &mut Vec<Coord>,
    anime: &mut Vec<String>, piece_map: &PieceMap,
) -> Result<(i32, i32), ReplayError> {
    let mv = match &half_move.kind {
        HalfMoveKind::Castle(dir) => return castle(board, force, *dir, anime),
        HalfMoveKind::Regular(mv) => mv,
    };
    let mut entry = mv.from.to_algebraic();
    let mut current = mv.from;
    if let Some(relocation) = mv.relocation {
        move_piece(board, current, relocation, None)?;
        entry.push_str(&relocation.to_algebraic());
        current = relocation;
    }
    let start = current;
    move_piece(board, current, mv.to, None)?;
    entry.push_str(&mv.to.to_algebraic());
    current = mv.to;
    if half_move.en_passant {
        if let Some(victim) = en_passant_victim(mv.to) {
            let captured = on_board(board, victim)?;
            board[captured].clear();
        }
    }
    for leg in &mv.legs {
        match leg {
            Leg::Move(to) => {
                move_piece(board, current, *to, None)?;
                entry.push_str(&to.to_algebraic());
                current = *to;
            }
            Leg::Promote { force: promoted_force, piece } => {
                if piece == "I" {
                    board.take(current);
                    imitators.push(current);
                    entry.push_str("=I");
                    continue;
                }
                let promoted_force = match promoted_force {
                    Some(f) => *f,
                    None if token_force(&board[current]) == Some(PieceForce::Neutral) => {
                        PieceForce::Neutral
                    }
                    None => force.into(),
                };
                let token = popeye_piece(piece_map, piece, promoted_force);
                entry.push_str(&format!("={token}"));
                board[current] = token;
            }
        }
    }
    if let Some(volage) = mv.volage {
        board[current] = recolor(&board[current], volage);
    }
    anime.push(entry);
    Ok(current - start)
}

fn castle(
    board: &mut Board, force: Force, dir: CastleDirection, anime: &mut Vec<String>,
) -> Result<(i32, i32), ReplayError> {
    let rank = force.home_rank();
    let sq = |file: char| square(&format!("{file}{rank}"));
    let (king_to, rook_from, rook_to) = match dir {
        CastleDirection::ASide => ('c', 'a', 'd'),
        CastleDirection::HSide => ('g', 'h', 'f'),
    };
    move_piece(board, sq('e'), sq(king_to), Some(&mut *anime))?;
    move_piece(board, sq(rook_from), sq(rook_to), Some(anime))?;
    Ok(sq(king_to) - sq('e'))
}

// The pawn captured en passant stands next to the destination: 3 <-> 4, 6 <-> 5.
fn en_passant_victim(to: Coord) -> Option<Coord> {
    match to.row {
        2 => Some(Coord::new(3, to.col)),
        5 => Some(Coord::new(4, to.col)),
        _ => None,
    }
}

// Applies one bracketed annotation, e.g. "+bSb8" (Circe rebirth), "-e4", "wRa1->a8",
// "wKe1<->bKe8", "e4=b" (recolor), "Ia2,h7" (imitators).
pub fn make_effect(
    board: &mut Board, text: &str, imitators: &mut Vec<Coord>, anime: &mut Vec<String>,
    piece_map: &PieceMap,
) -> Result<EffectOutcome, ReplayError> {
    let add_re = once_cell_regex!(&format!(
        r"^\+({COLOR})({PIECE})({SQUARE})(?:=({COLOR})?({PIECE}))?$"
    ));
    let remove_re = once_cell_regex!(&format!(r"^-(?:({COLOR})({PIECE}))?({SQUARE})$"));
    let move_re = once_cell_regex!(&format!(
        r"^({COLOR})({PIECE})({SQUARE})->({SQUARE})(?:=({COLOR})?({PIECE}))?$"
    ));
    let swap_re = once_cell_regex!(&format!(
        r"^{COLOR}{PIECE}({SQUARE})<->{COLOR}{PIECE}({SQUARE})$"
    ));
    let recolor_re = once_cell_regex!(&format!(r"^({SQUARE})=({COLOR})?({PIECE})?$"));
    let imitator_re = once_cell_regex!(&format!(r"^I((?:{SQUARE},?)+)$"));
    let square_re = once_cell_regex!(SQUARE);

    let text = decode_entities(text);
    let text = text.trim();
    if let Some(cap) = add_re.captures(text) {
        let pos = on_board(board, square(cap.get(3).unwrap().as_str()))?;
        let force = color(cap.get(1).unwrap().as_str()).unwrap();
        let token = match cap.get(5) {
            Some(promoted) => {
                let promoted_force = cap.get(4).and_then(|m| color(m.as_str())).unwrap_or(force);
                popeye_piece(piece_map, promoted.as_str(), promoted_force)
            }
            None => popeye_piece(piece_map, cap.get(2).unwrap().as_str(), force),
        };
        board[pos] = token;
    } else if let Some(cap) = remove_re.captures(text) {
        let pos = on_board(board, square(cap.get(3).unwrap().as_str()))?;
        board.take(pos);
    } else if let Some(cap) = move_re.captures(text) {
        let from = square(cap.get(3).unwrap().as_str());
        let to = square(cap.get(4).unwrap().as_str());
        move_piece(board, from, to, Some(&mut *anime))?;
        if let Some(promoted) = cap.get(6) {
            let force = cap
                .get(5)
                .or(cap.get(1))
                .and_then(|m| color(m.as_str()))
                .unwrap_or(PieceForce::Neutral);
            let token = popeye_piece(piece_map, promoted.as_str(), force);
            if let Some(entry) = anime.last_mut() {
                entry.push_str(&format!("={token}"));
            }
            board[to] = token;
        }
    } else if let Some(cap) = swap_re.captures(text) {
        let a = on_board(board, square(cap.get(1).unwrap().as_str()))?;
        let b = on_board(board, square(cap.get(2).unwrap().as_str()))?;
        let token_a = board.take(a);
        let token_b = board.take(b);
        board[a] = token_b;
        board[b] = token_a;
        anime.push(format!("{}{}", a.to_algebraic(), b.to_algebraic()));
        anime.push(format!("{}{}", b.to_algebraic(), a.to_algebraic()));
    } else if let Some(cap) = recolor_re.captures(text) {
        let pos = on_board(board, square(cap.get(1).unwrap().as_str()))?;
        let (Some(code), Some(force)) = (piece_code(&board[pos]), token_force(&board[pos])) else {
            return Err(ReplayError::PieceMissing(pos.to_algebraic()));
        };
        let code = cap.get(3).map_or(code, |m| piece_map.to_normal_piece(m.as_str()));
        let force = cap.get(2).and_then(|m| color(m.as_str())).unwrap_or(force);
        board[pos] = colorize(&code, force);
    } else if let Some(cap) = imitator_re.captures(text) {
        *imitators = square_re
            .find_iter(cap.get(1).unwrap().as_str())
            .map(|m| square(m.as_str()))
            .collect_vec();
        return Ok(EffectOutcome::ImitatorsPlaced);
    } else {
        return Ok(EffectOutcome::Unrecognized);
    }
    Ok(EffectOutcome::Applied)
}
