use anyhow::Context;
use popeye_replay::coord::BoardShape;
use popeye_replay::fen::{infer_dimension, parse_fen};
use popeye_replay::piece::PieceMap;
use popeye_replay::popeye_input::to_popeye_fen;


pub fn run(ffen: &str, piece_map: &PieceMap) -> anyhow::Result<()> {
    println!("{}", convert(ffen, piece_map)?);
    Ok(())
}

fn convert(ffen: &str, piece_map: &PieceMap) -> anyhow::Result<String> {
    let shape = infer_dimension(ffen).unwrap_or(BoardShape::standard());
    let board = parse_fen(ffen, shape.num_cols, shape.num_rows);
    to_popeye_fen(&board, piece_map).with_context(|| format!("Cannot convert '{ffen}'."))
}
