// Regular expression fragments for Popeye input and output.
//
// Popeye accepts any keyword prefix that is at least four characters long (some keywords allow
// shorter prefixes), so keywords are matched with `create_abbr_exp`. Arrows in solver output may
// arrive HTML-escaped, so every arrow fragment accepts both spellings.

use itertools::Itertools;


pub const DEFAULT_MIN_ABBR_LEN: usize = 4;

pub const SQUARE: &str = "[a-h][1-8]";
pub const PIECE: &str = "[A-Z][A-Z0-9]?";
pub const COLOR: &str = "[wbn]";
pub const ARROW: &str = "(?:->|-&gt;)";
pub const SWAP_ARROW: &str = "(?:<->|&lt;-&gt;)";

// Twin header: optional "+" (continue from the previous twin), twin letter, description.
pub const TWIN_HEADER: &str = r"^\s*(\+?)([a-z])\)(.*)$";

// Matches every abbreviation of `word` allowed by Popeye. An optional leading digit overrides
// the minimum abbreviation length, e.g. "3beginproblem" accepts "beg", "begi", ..., "beginproblem".
pub fn create_abbr_exp(word: &str) -> String {
    let (min_len, word) = match word.chars().next().and_then(|ch| ch.to_digit(10)) {
        Some(digit) => (digit as usize, &word[1..]),
        None => (DEFAULT_MIN_ABBR_LEN, word),
    };
    let chars = word.chars().collect_vec();
    let (head, tail) = chars.split_at(min_len.min(chars.len()));
    format!(r"\b{}{}\b", regex_lite::escape(&head.iter().collect::<String>()), optional_tail(tail))
}

// Recursion depth equals the length of the tail.
fn optional_tail(chars: &[char]) -> String {
    match chars.split_first() {
        None => String::new(),
        Some((first, rest)) => {
            format!("(?:{}{})?", regex_lite::escape(&first.to_string()), optional_tail(rest))
        }
    }
}

// One half-move as printed by Popeye, with bracketed side effects:
//   "e2-e4", "Sg1*f3", "0-0-0", "c4*d3 ep.", "e7-e8=nQ", "Re2->h1-h8", "Qd1*d7-a4",
//   "Rd1-d7=b", "Qd1*d7[+bSb8]".
pub fn half_move_exp() -> String {
    format!(
        concat!(
            r"(?:0-0-0|0-0",
            r"|(?:n?{piece})?{sq}(?:{arrow}{sq})?[-*]{sq}(?:-{sq}|={color}?{piece})*(?:={color})?",
            r"(?:\s*ep\.)?)",
            r"(?:\s*\[[^\]]*\])*",
        ),
        piece = PIECE,
        sq = SQUARE,
        arrow = ARROW,
        color = COLOR,
    )
}

// Anchored version of `half_move_exp` with captures:
//   1: castling, 2: neutral marker, 3: piece, 4: from, 5: Mars Circe relocation square,
//   6: destination, 7: follow-up legs, 8: Volage color, 9: en passant, 10: effects.
pub fn half_move_parse_exp() -> String {
    format!(
        concat!(
            r"^(?:(0-0-0|0-0)",
            r"|(n)?({piece})?({sq})(?:{arrow}({sq}))?[-*]({sq})",
            r"((?:-{sq}|={color}?{piece})*)(?:=({color}))?)",
            r"(\s*ep\.)?",
            r"((?:\s*\[[^\]]*\])*)$",
        ),
        piece = PIECE,
        sq = SQUARE,
        arrow = ARROW,
        color = COLOR,
    )
}

// A step: optional move number ("3." or "3...") followed by one or more half-moves separated by
// "/" (parallel moves). Captures: 1: number, 2: continuation dots, 3: moves.
pub fn step_exp() -> String {
    let half_move = half_move_exp();
    format!(r"\b(?:(\d+)\.(\.\.)?)?({half_move}(?:/{half_move})*)")
}

// Piece list as used in the `pieces` command: "Ke1", "Sb1g1", "LEa1h8". Captures: 1: piece,
// 2: squares.
pub fn piece_list_exp() -> String { format!(r"^([A-Za-z][A-Za-z0-9]?)((?:{SQUARE})+)$") }


#[cfg(test)]
mod tests {
    use regex_lite::Regex;

    use super::*;

    fn full_match(exp: &str) -> Regex { Regex::new(&format!("^(?:{exp})$")).unwrap() }

    #[test]
    fn abbreviation() {
        let re = full_match(&create_abbr_exp("3beginproblem"));
        for len in 3..="beginproblem".len() {
            assert!(re.is_match(&"beginproblem"[..len]), "{}", &"beginproblem"[..len]);
        }
        assert!(!re.is_match("begx"));
        assert!(!re.is_match("be"));
        assert!(!re.is_match("beginproblems"));
    }

    #[test]
    fn abbreviation_default_length() {
        let re = Regex::new(&format!("(?i){}", create_abbr_exp("duplex"))).unwrap();
        assert!(re.is_match("option dupl"));
        assert!(re.is_match("opti Duplex noboard"));
        assert!(!re.is_match("option dup"));
        assert!(!re.is_match("option halfduplex"));
    }

    #[test]
    fn abbreviation_of_short_word() {
        let re = full_match(&create_abbr_exp("ep"));
        assert!(re.is_match("ep"));
        assert!(!re.is_match("e"));
    }

    #[test]
    fn half_moves() {
        let re = full_match(&half_move_exp());
        for half_move in [
            "e2-e4",
            "Sg1*f3",
            "0-0",
            "0-0-0",
            "c4*d3 ep.",
            "e7-e8=Q",
            "e7-e8=nQ",
            "nPb7-b8=nQ",
            "Re2->h1-h8",
            "Re2-&gt;h1-h8",
            "Qd1*d7-a4",
            "Rd1-d7=b",
            "Qd1*d7[+bSb8]",
            "Qd1*d7 [+bSb8][-e4]",
            "LEa1-h8",
        ] {
            assert!(re.is_match(half_move), "{half_move}");
        }
        for not_a_move in ["e2e4", "Time = 0.01 s", "a1<-->h1", "threat:"] {
            assert!(!re.is_match(not_a_move), "{not_a_move}");
        }
    }

    #[test]
    fn steps() {
        let re = Regex::new(&step_exp()).unwrap();
        let line = "  1.e2-e4 d7-d5   2.e4*d5 Qd8*d5 ! threat:";
        let steps = re.find_iter(line).map(|m| m.as_str()).collect_vec();
        assert_eq!(steps, vec!["1.e2-e4", "d7-d5", "2.e4*d5", "Qd8*d5"]);
        let cap = re.captures("1...Kc8-d7/Sa6-b8").unwrap();
        assert_eq!(cap.get(1).unwrap().as_str(), "1");
        assert!(cap.get(2).is_some());
        assert_eq!(cap.get(3).unwrap().as_str(), "Kc8-d7/Sa6-b8");
    }

    #[test]
    fn twin_header() {
        let re = Regex::new(TWIN_HEADER).unwrap();
        let cap = re.captures("+e) shift a1 ==&gt; b1").unwrap();
        assert_eq!(cap.get(1).unwrap().as_str(), "+");
        assert_eq!(cap.get(2).unwrap().as_str(), "e");
        assert_eq!(cap.get(3).unwrap().as_str(), " shift a1 ==&gt; b1");
        assert!(!re.is_match("  1.Rh1-f1 !"));
    }

    #[test]
    fn piece_list() {
        let re = Regex::new(&piece_list_exp()).unwrap();
        let cap = re.captures("Sb1g1").unwrap();
        assert_eq!(cap.get(1).unwrap().as_str(), "S");
        assert_eq!(cap.get(2).unwrap().as_str(), "b1g1");
        assert!(re.captures("LEa1").is_some());
        assert!(re.captures("white").is_none());
    }
}
