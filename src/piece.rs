// Piece tokens and the translation between our piece codes and Popeye piece names.
//
// A board token is an FFEN square value: an optional neutral marker ("-" or "~"), an optional
// rotation marker ("*1" .. "*3") and a piece letter whose case gives the color. A piece *code*
// is the color-free part of a token in lower case, e.g. "n" or "*2q".

use std::collections::{BTreeMap, HashMap};

use lazy_static::lazy_static;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::force::PieceForce;
use crate::once_cell_regex;


// Imitators are drawn as neutral circles.
pub const IMITATOR: &str = "-c";

// Our codes for the pieces Popeye knows, after the fairy piece abbreviations used by problem
// databases. Rotations follow the usual fairy diagram conventions: an upside-down queen is a
// grasshopper, an upside-down knight is a nightrider, etc. Other letters stand for the common
// fairy pieces, their rotations for related ones.
pub const PIECE_TABLE: &[(&str, &str)] = &[
    ("k", "K"),
    ("q", "Q"),
    ("r", "R"),
    ("b", "B"),
    ("n", "S"),
    ("p", "P"),
    ("*1q", "LE"),
    ("*2q", "G"),
    ("*3q", "LI"),
    ("*1r", "PA"),
    ("*2r", "RL"),
    ("*3r", "RH"),
    ("*1b", "VA"),
    ("*2b", "BL"),
    ("*3b", "BH"),
    ("*1n", "CA"),
    ("*2n", "N"),
    ("*3n", "Z"),
    ("*2p", "BP"),
    ("a", "AM"),
    ("*1a", "AN"),
    ("*2a", "EM"),
    ("*3a", "PR"),
    ("d", "DA"),
    ("*1d", "DR"),
    ("e", "EQ"),
    ("*1e", "EA"),
    ("*2e", "EL"),
    ("f", "FE"),
    ("*1f", "AL"),
    ("*2f", "F"),
    ("g", "GN"),
    ("*1g", "BI"),
    ("h", "HA"),
    ("*1h", "EH"),
    ("j", "GI"),
    ("*1j", "MG"),
    ("l", "LO"),
    ("*1l", "RO"),
    ("*2l", "SW"),
    ("m", "MA"),
    ("*1m", "MS"),
    ("o", "O"),
    ("*1o", "NE"),
    ("s", "SQ"),
    ("*1s", "SI"),
    ("t", "TR"),
    ("*1t", "KA"),
    ("u", "UU"),
    ("*1u", "DU"),
    ("v", "MO"),
    ("*1v", "NA"),
    ("w", "WE"),
    ("z", "ZR"),
    ("*1z", "CR"),
];

lazy_static! {
    static ref POPEYE_TO_NORMAL: HashMap<&'static str, &'static str> =
        PIECE_TABLE.iter().map(|&(normal, popeye)| (popeye, normal)).collect();
    static ref NORMAL_TO_POPEYE: HashMap<&'static str, &'static str> =
        PIECE_TABLE.iter().copied().collect();
}


// User overrides on top of `PIECE_TABLE`: our piece code -> Popeye piece name.
//
// The map is read-only while parsing. Callers that let the user edit it should build a new map
// for every parse.
#[derive(Clone, PartialEq, Eq, Default, Debug, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct PieceMap {
    overrides: BTreeMap<String, String>,
}

impl From<BTreeMap<String, String>> for PieceMap {
    fn from(overrides: BTreeMap<String, String>) -> Self { PieceMap::new(overrides) }
}

impl From<PieceMap> for BTreeMap<String, String> {
    fn from(map: PieceMap) -> Self { map.overrides }
}

impl PieceMap {
    // Entries whose code is not a single board token are dropped.
    pub fn new(overrides: BTreeMap<String, String>) -> Self {
        let overrides = overrides
            .into_iter()
            .filter(|(normal, popeye)| {
                let valid = is_valid_code(normal);
                if !valid {
                    warn!("Ignoring piece mapping {normal:?} -> {popeye:?}: not a piece code");
                }
                valid
            })
            .map(|(normal, popeye)| (normal.to_ascii_lowercase(), popeye.to_ascii_uppercase()))
            .collect();
        PieceMap { overrides }
    }

    // Whether `name` is a Popeye piece name we have a code for.
    pub fn knows(&self, name: &str) -> bool {
        self.overrides.values().any(|popeye| popeye.eq_ignore_ascii_case(name))
            || POPEYE_TO_NORMAL.contains_key(name.to_ascii_uppercase().as_str())
    }

    // Popeye piece name -> our piece code. Unknown single letters are passed through, other
    // unknown names become a text annotation so that they still take exactly one square.
    pub fn to_normal_piece(&self, code: &str) -> String {
        let custom = self
            .overrides
            .iter()
            .find(|(_, popeye)| popeye.eq_ignore_ascii_case(code))
            .map(|(normal, _)| normal.to_ascii_lowercase());
        if let Some(normal) = custom {
            return normal;
        }
        match POPEYE_TO_NORMAL.get(code.to_ascii_uppercase().as_str()) {
            Some(normal) => (*normal).to_owned(),
            None => fallback_code(code),
        }
    }

    // Our piece code -> Popeye piece name, upper case.
    pub fn popeye_code(&self, normal: &str) -> Option<String> {
        let normal = normal.to_ascii_lowercase();
        if let Some((_, popeye)) = self.overrides.iter().find(|(n, _)| n.eq_ignore_ascii_case(&normal)) {
            return Some(popeye.to_ascii_uppercase());
        }
        NORMAL_TO_POPEYE.get(normal.as_str()).map(|popeye| (*popeye).to_owned())
    }

    // Board token -> piece as written in a Popeye `forsyth` command: two-letter names are
    // preceded by a dot, neutral pieces by "=", case gives the color. A digit carries no case,
    // so names containing one are marked "+" for white and "-" for black.
    pub fn to_popeye_piece(&self, token: &str) -> Option<String> {
        let code = piece_code(token)?;
        let force = token_force(token)?;
        let popeye = self.popeye_code(&code)?;
        let numeric = popeye.chars().any(|ch| ch.is_ascii_digit());
        let name = if popeye.chars().count() > 1 { format!(".{popeye}") } else { popeye };
        Some(match force {
            PieceForce::White if numeric => format!("+{}", name.to_ascii_uppercase()),
            PieceForce::White => name.to_ascii_uppercase(),
            PieceForce::Black if numeric => format!("-{}", name.to_ascii_lowercase()),
            PieceForce::Black => name.to_ascii_lowercase(),
            PieceForce::Neutral => format!("={}", name.to_ascii_uppercase()),
        })
    }

    // Converts a token of a Popeye-bound position (forsyth or YACPDB notation) into our token.
    // Tokens that already carry our markup are kept as is.
    pub fn normalize_token(&self, token: &str) -> String {
        let yacpdb_re = once_cell_regex!(r"^\(([A-Za-z]{1,2})([0-3]?)\)$");
        if token.is_empty() || is_text(token) || token.contains('*') {
            return token.to_owned();
        }
        let marked = |rest: &str| rest.starts_with(|ch: char| ch == '.' || ch.is_ascii_digit());
        let (force, name) = if let Some(rest) = token.strip_prefix('=') {
            (PieceForce::Neutral, rest)
        } else if let Some(rest) = token.strip_prefix('+') {
            (PieceForce::White, rest)
        } else if let Some(rest) = token.strip_prefix('-').filter(|rest| marked(*rest)) {
            (PieceForce::Black, rest)
        } else if is_neutral(token) {
            return token.to_owned();
        } else if let Some(cap) = yacpdb_re.captures(token) {
            let letters = cap.get(1).unwrap().as_str();
            let force = force_of_letter(letters);
            let rotation = cap.get(2).unwrap().as_str();
            let code = match rotation {
                "" | "0" => self.to_normal_piece(letters),
                _ => format!("*{rotation}{}", letters.to_ascii_lowercase()),
            };
            return colorize(&code, force);
        } else {
            (force_of_letter(token.trim_start_matches('.')), token)
        };
        let name = name.trim_start_matches('.');
        if name.is_empty() {
            return token.to_owned();
        }
        colorize(&self.to_normal_piece(name), force)
    }
}

// A code that fits in one FFEN token: a letter, optionally rotated.
fn is_valid_code(code: &str) -> bool {
    once_cell_regex!(r"^(?:\*[0-3])?[A-Za-z]$").is_match(code)
}

fn fallback_code(name: &str) -> String {
    let name = name.to_ascii_lowercase();
    if is_valid_code(&name) {
        return name;
    }
    match name.chars().count() {
        1 => format!("'{name}"),
        _ => format!("''{}", name.chars().take(2).collect::<String>()),
    }
}

fn force_of_letter(s: &str) -> PieceForce {
    if s.chars().next().is_some_and(|ch| ch.is_ascii_uppercase()) {
        PieceForce::White
    } else {
        PieceForce::Black
    }
}

fn is_text(token: &str) -> bool { token.trim_start_matches(['-', '~']).starts_with('\'') }

fn is_neutral(token: &str) -> bool { token.starts_with('-') || token.starts_with('~') }

pub fn is_piece(token: &str) -> bool { !token.is_empty() && !is_text(token) }

pub fn token_force(token: &str) -> Option<PieceForce> {
    if !is_piece(token) {
        return None;
    }
    if is_neutral(token) {
        return Some(PieceForce::Neutral);
    }
    let letter = token.chars().rev().find(|ch| ch.is_ascii_alphabetic())?;
    Some(if letter.is_ascii_uppercase() { PieceForce::White } else { PieceForce::Black })
}

pub fn piece_code(token: &str) -> Option<String> {
    if !is_piece(token) {
        return None;
    }
    Some(token.trim_start_matches(['-', '~']).to_ascii_lowercase())
}

pub fn colorize(code: &str, force: PieceForce) -> String {
    match force {
        PieceForce::White => code.to_ascii_uppercase(),
        PieceForce::Black => code.to_ascii_lowercase(),
        PieceForce::Neutral => format!("-{}", code.to_ascii_lowercase()),
    }
}

// Keeps the piece, changes its color. Non-pieces are returned unchanged.
pub fn recolor(token: &str, force: PieceForce) -> String {
    match piece_code(token) {
        Some(code) => colorize(&code, force),
        None => token.to_owned(),
    }
}
