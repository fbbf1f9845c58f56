use std::collections::BTreeMap;

use anyhow::Context;
use popeye_replay::piece::PieceMap;


// Piece map file: yaml mapping from our piece code to a Popeye piece name, e.g.
//   "*1n": CA
//   "x": AM
pub fn read_piece_map(filename: Option<&String>) -> anyhow::Result<PieceMap> {
    let Some(filename) = filename else {
        return Ok(PieceMap::default());
    };
    let contents = std::fs::read_to_string(filename)
        .with_context(|| format!("Failed to read piece map '{filename}'."))?;
    parse_piece_map(&contents).with_context(|| format!("Failed to parse piece map '{filename}'."))
}

fn parse_piece_map(contents: &str) -> anyhow::Result<PieceMap> {
    let overrides: BTreeMap<String, String> = serde_yaml::from_str(contents)?;
    Ok(PieceMap::new(overrides))
}
