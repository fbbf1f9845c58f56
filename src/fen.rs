// Extended Forsyth notation ("FFEN"). Differences from classic FEN notation:
//   - Only the board part is used: no active color, castling rights, etc.
//   - A square may hold a multi-character token: neutral marker ("-" or "~"), rotation marker
//     ("*1".."*3") and a piece letter, or a free text annotation escaped with "'" (one
//     character) or "''" (two characters).
//   - Run-lengths of empty squares may exceed 9 on wide boards.
//   - When reading, YACPDB-style pieces ("(le)", "(q2)") and Popeye forsyth pieces (".le", "=s")
//     are accepted as single tokens. They are normalized later, see `PieceMap::normalize_token`.

use itertools::Itertools;

use crate::board::Board;
use crate::coord::BoardShape;
use crate::once_cell_regex;


pub const START_POSITION: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

const TOKEN_RE: &str = concat!(
    r"/",
    r"|\d+",
    r"|\([A-Za-z]{1,2}[0-3]?\)",
    r"|[-~]?(?:\*[0-3])?(?:''..|'.|[A-Za-z])",
    r"|[-+=]?\.[A-Za-z0-9]{2}|[+=][A-Za-z0-9]|-\d",
    r"|.",
);

enum FenToken<'a> {
    RowEnd,
    Empty(usize),
    Square(&'a str),
}

fn tokenize(fen: &str) -> impl Iterator<Item = FenToken<'_>> {
    let token_re = once_cell_regex!(TOKEN_RE);
    token_re.find_iter(fen).map(|m| {
        let s = m.as_str();
        if s == "/" {
            FenToken::RowEnd
        } else if s.chars().all(|ch| ch.is_ascii_digit()) {
            FenToken::Empty(s.parse().unwrap_or(0))
        } else {
            FenToken::Square(s)
        }
    })
}

// Never fails. Short rows are padded with empty squares, anything after the last square is
// ignored.
pub fn parse_fen(fen: &str, width: u8, height: u8) -> Board {
    let shape = BoardShape { num_rows: height, num_cols: width };
    let total = shape.num_squares();
    let width = width as usize;
    let mut squares = Vec::with_capacity(total);
    let mut col = 0;
    // Whether the current row was started by overflow rather than by "/".
    let mut wrapped = false;
    let push = |squares: &mut Vec<String>, token: &str, col: &mut usize, wrapped: &mut bool| {
        squares.push(token.to_owned());
        *col += 1;
        if *col == width {
            *col = 0;
            *wrapped = true;
        } else {
            *wrapped = false;
        }
    };
    for token in tokenize(fen) {
        if squares.len() >= total {
            break;
        }
        match token {
            FenToken::RowEnd => {
                if col > 0 || !wrapped {
                    let padding = width - col;
                    for _ in 0..padding {
                        if squares.len() >= total {
                            break;
                        }
                        push(&mut squares, "", &mut col, &mut wrapped);
                    }
                }
                wrapped = false;
            }
            FenToken::Empty(n) => {
                for _ in 0..n {
                    if squares.len() >= total {
                        break;
                    }
                    push(&mut squares, "", &mut col, &mut wrapped);
                }
            }
            FenToken::Square(s) => push(&mut squares, s, &mut col, &mut wrapped),
        }
    }
    squares.resize(total, String::new());
    Board::from_squares(shape, squares)
}

pub fn make_forsyth(board: &Board) -> String {
    let width = board.shape().num_cols as usize;
    board
        .squares()
        .chunks(width)
        .map(|row| {
            let mut row_notation = String::new();
            let mut empty_count = 0;
            for token in row {
                if token.is_empty() {
                    empty_count += 1;
                } else {
                    if empty_count > 0 {
                        row_notation.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    row_notation.push_str(token);
                }
            }
            if empty_count > 0 {
                row_notation.push_str(&empty_count.to_string());
            }
            row_notation
        })
        .join("/")
}

// Guesses board size from row lengths. Returns `None` if there is only one row or if rows
// disagree: the caller should fall back to the configured size.
pub fn infer_dimension(fen: &str) -> Option<BoardShape> {
    if !fen.contains('/') {
        return None;
    }
    let widths = fen
        .split('/')
        .map(|row| {
            tokenize(row)
                .map(|token| match token {
                    FenToken::Empty(n) => n,
                    FenToken::Square(_) => 1,
                    FenToken::RowEnd => 0,
                })
                .sum::<usize>()
        })
        .collect_vec();
    let (&width,) = widths.iter().unique().collect_tuple()?;
    let num_cols = u8::try_from(width).ok().filter(|&w| w > 0)?;
    let num_rows = u8::try_from(widths.len()).ok()?;
    Some(BoardShape { num_rows, num_cols })
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn start_position() {
        let board = parse_fen(START_POSITION, 8, 8);
        assert_eq!(board.squares()[0], "r");
        assert_eq!(board.squares()[63], "R");
        assert_eq!(make_forsyth(&board), START_POSITION);
    }

    #[test]
    fn fairy_tokens_round_trip() {
        let fen = "-q*2Q'x''ab~*1n3/8/8/8/8/8/8/8";
        let board = parse_fen(fen, 8, 8);
        assert_eq!(&board.squares()[..5], ["-q", "*2Q", "'x", "''ab", "~*1n"]);
        assert_eq!(make_forsyth(&board), fen);
    }

    #[test]
    fn round_trip_law() {
        let fens = [
            "r3k3/ppp1p2p/Nb2p3/P1PP2Pp/4N3/7B/3PPRP1/4K2R",
            "8/8/8/8/1k6/8/1K2R3/8",
            "*3K7/-c7/8/8/8/8/8/7''zz",
        ];
        for fen in fens {
            let board = parse_fen(fen, 8, 8);
            assert_eq!(parse_fen(&make_forsyth(&board), 8, 8), board);
            assert_eq!(make_forsyth(&board), fen);
        }
    }

    #[test]
    fn short_rows_are_padded() {
        let board = parse_fen("k/8/8/8/8/8/8/K", 8, 8);
        assert_eq!(make_forsyth(&board), "k7/8/8/8/8/8/8/K7");
        let board = parse_fen("8//8", 8, 3);
        assert_eq!(make_forsyth(&board), "8/8/8");
        let board = parse_fen("k", 8, 8);
        assert_eq!(make_forsyth(&board), "k7/8/8/8/8/8/8/8");
    }

    #[test]
    fn trailing_garbage_is_ignored() {
        let board = parse_fen("8/8/8/8/8/8/8/7K w - - 0 1", 8, 8);
        assert_eq!(make_forsyth(&board), "8/8/8/8/8/8/8/7K");
    }

    #[test]
    fn wide_board() {
        let board = parse_fen("10/k9", 10, 2);
        assert_eq!(board.squares()[10], "k");
        assert_eq!(make_forsyth(&board), "10/k9");
    }

    #[test]
    fn foreign_tokens() {
        let board = parse_fen("(le)=s.PA5/8/8/8/8/8/8/8", 8, 8);
        assert_eq!(&board.squares()[..4], ["(le)", "=s", ".PA", ""]);
        let board = parse_fen("+.1A-.1a-2+3=.2b3/8/8/8/8/8/8/8", 8, 8);
        assert_eq!(&board.squares()[..6], ["+.1A", "-.1a", "-2", "+3", "=.2b", ""]);
    }

    #[test]
    fn dimension() {
        assert_eq!(infer_dimension(START_POSITION), Some(BoardShape::standard()));
        assert_eq!(infer_dimension("3/k2/3/K2"), Some(BoardShape { num_rows: 4, num_cols: 3 }));
        assert_eq!(infer_dimension("8"), None);
        assert_eq!(infer_dimension("8/7"), None);
        assert_eq!(infer_dimension("*2Q''ab6/8"), Some(BoardShape { num_rows: 2, num_cols: 8 }));
    }
}
