// Rust-upgrade (https://github.com/rust-lang/rust/issues/46379):
//   remove `#[allow(dead_code)]` before public functions.

use popeye_replay::piece::PieceMap;
use popeye_replay::solution::{Fragment, FragmentKind, LINE_SEPARATOR, ParsedSolution, parse_solution};


// Solver output the way it reaches us: HTML-escaped, lines joined with "<br>".
#[allow(dead_code)]
pub fn popeye_output(text: &str) -> String {
    text.trim_end()
        .lines()
        .map(|line| line.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;"))
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR)
}

#[allow(dead_code)]
pub struct Replay {
    pub solution: ParsedSolution,
    pub fragments: Vec<Fragment>,
}

#[allow(dead_code)]
impl Replay {
    pub fn fen(&self, index: usize) -> &str { &self.fragments[index].fen }

    pub fn kinds(&self) -> Vec<FragmentKind> { self.fragments.iter().map(|f| f.kind).collect() }

    pub fn count(&self, kind: FragmentKind) -> usize {
        self.fragments.iter().filter(|f| f.kind == kind).count()
    }
}

// Replays `output` and records every fragment. Each fragment is rendered as "{index}".
#[allow(dead_code)]
pub fn replay(input: &str, initial_fen: &str, output: &str) -> Replay {
    let mut fragments = Vec::new();
    let solution = parse_solution(
        input,
        initial_fen,
        &popeye_output(output),
        &PieceMap::default(),
        &mut |fragment: &Fragment| {
            fragments.push(fragment.clone());
            format!("{{{}}}", fragments.len() - 1)
        },
    )
    .unwrap();
    Replay { solution, fragments }
}
