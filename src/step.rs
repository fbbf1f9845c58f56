// Replay state: the position being shown, and how to get back to earlier positions.
//
// Popeye prints the solution tree depth-first. When a move number goes down (or repeats), the
// line branches off an earlier position: we find it on the stack of numbered steps.

use derive_new::new;
use itertools::Itertools;
use log::{debug, warn};

use crate::board::Board;
use crate::coord::{BoardShape, Coord};
use crate::error::{ParseWarning, ReplayError};
use crate::fen::{START_POSITION, infer_dimension, make_forsyth, parse_fen};
use crate::force::{Force, MoveOrder};
use crate::moves::{EffectOutcome, HalfMove, make_effect, make_move};
use crate::once_cell_regex;
use crate::piece::{IMITATOR, PieceMap};
use crate::popeye_input::{InputInfo, is_proof_game, ordering_for};
use crate::solution::{Annotator, Fragment, FragmentKind};
use crate::twin::make_twin;


// "3." < "3..." < "4.".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, new)]
pub struct Label {
    pub number: u32,
    pub continuation: bool,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Entry {
    pub label: Label,
    pub color: Force,
    pub fen: String,
    pub imitators: Vec<Coord>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Problem {
    pub pg: bool,
    pub diagram: String,
    pub fen: String, // where play starts
    pub imitators: Vec<Coord>,
    pub ordering: MoveOrder,
}

impl Problem {
    // `diagram` may use Popeye piece names; it is normalized.
    pub fn new(diagram: &str, stipulation: &str, info: &InputInfo, piece_map: &PieceMap) -> Self {
        let diagram = make_forsyth(&load(diagram).map(|token| piece_map.normalize_token(token)));
        let mut problem = Problem {
            pg: false,
            fen: diagram.clone(),
            diagram,
            imitators: info.imitators.clone(),
            ordering: MoveOrder::WhiteFirst,
        };
        problem.set_stipulation(stipulation, info);
        problem
    }

    pub fn set_stipulation(&mut self, stipulation: &str, info: &InputInfo) {
        self.pg = is_proof_game(stipulation);
        self.ordering = ordering_for(stipulation, info);
        self.update_fen();
    }

    pub fn set_diagram(&mut self, diagram: String) {
        self.diagram = diagram;
        self.update_fen();
    }

    fn update_fen(&mut self) {
        self.fen = if self.pg { START_POSITION.to_owned() } else { self.diagram.clone() };
    }
}

fn load(fen: &str) -> Board {
    let shape = infer_dimension(fen).unwrap_or(BoardShape::standard());
    parse_fen(fen, shape.num_cols, shape.num_rows)
}

// Sub-moves are separated by "/", except inside effect brackets.
fn split_sub_moves(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_u32;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

pub struct ParseState<'a> {
    stack: Vec<Entry>,
    solution_printed: bool,
    announced: bool,
    problem: Problem,
    root: Problem,
    board: Board,
    ordering: MoveOrder,
    imitators: Vec<Coord>,
    last_color: Force,
    piece_map: &'a PieceMap,
    warnings: Vec<ParseWarning>,
}

impl<'a> ParseState<'a> {
    pub fn new(root: Problem, piece_map: &'a PieceMap) -> Self {
        let mut state = ParseState {
            stack: Vec::new(),
            solution_printed: false,
            announced: false,
            problem: root.clone(),
            board: load(&root.fen),
            ordering: root.ordering,
            imitators: Vec::new(),
            last_color: root.ordering.second(),
            root,
            piece_map,
            warnings: Vec::new(),
        };
        state.reset();
        state
    }

    pub fn board(&self) -> &Board { &self.board }
    pub fn ordering(&self) -> MoveOrder { self.ordering }
    pub fn into_warnings(self) -> Vec<ParseWarning> { self.warnings }

    pub fn add_warning(&mut self, warning: ParseWarning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    // Back to the start of the current problem. Move ordering is kept.
    pub fn reset(&mut self) {
        self.stack.clear();
        let fen = self.problem.fen.clone();
        let imitators = self.problem.imitators.clone();
        self.restore(&fen, imitators);
        self.last_color = self.ordering.second();
    }

    // A run of `num_blank_lines` empty lines. The longest such run before a first move separates
    // the two halves of a duplex solution.
    pub fn paragraph_break(
        &mut self, num_blank_lines: usize, duplex_separator: Option<usize>, duplex: bool,
    ) {
        if duplex && duplex_separator == Some(num_blank_lines) && self.solution_printed {
            self.ordering = self.ordering.flipped();
            self.announced = false;
            self.solution_printed = false;
            debug!("Duplex: switching to {:?}", self.ordering);
        }
        self.reset();
    }

    fn restore(&mut self, fen: &str, imitators: Vec<Coord>) {
        self.board = load(fen);
        self.imitators = imitators;
        self.place_imitators();
    }

    fn place_imitators(&mut self) {
        for &pos in &self.imitators {
            if self.board.get(pos).is_some() {
                self.board[pos] = IMITATOR.to_owned();
            }
        }
    }

    fn clear_imitators(&mut self) {
        for &pos in &self.imitators {
            if self.board.get(pos) == Some(IMITATOR) {
                self.board[pos].clear();
            }
        }
    }

    fn start_fen(&self) -> String {
        let mut board = load(&self.problem.fen);
        for &pos in &self.problem.imitators {
            if board.get(pos).is_some() {
                board[pos] = IMITATOR.to_owned();
            }
        }
        make_forsyth(&board)
    }

    // Replays one step, e.g. "2...Ke8-d7" or "Sb1-c3/Sg8-f6", and returns its annotation.
    pub fn process_step(
        &mut self, text: &str, annotator: &mut impl Annotator,
    ) -> Result<String, ReplayError> {
        let label_re = once_cell_regex!(r"^(\d+)\.(\.\.)?");
        let (label, moves) = match label_re.captures(text) {
            Some(cap) => {
                let number = cap
                    .get(1)
                    .unwrap()
                    .as_str()
                    .parse()
                    .map_err(|_| ReplayError::UnrecognizedMove(text.to_owned()))?;
                let label = Label::new(number, cap.get(2).is_some());
                (Some(label), &text[cap.get(0).unwrap().end()..])
            }
            None => (None, text),
        };

        let mut retracted_from = None;
        if let Some(label) = label {
            if let Some(idx) = self.stack.iter().position(|entry| entry.label >= label) {
                retracted_from = Some(make_forsyth(&self.board));
                let (fen, imitators) = match idx.checked_sub(1) {
                    Some(prev) => (self.stack[prev].fen.clone(), self.stack[prev].imitators.clone()),
                    None => (self.problem.fen.clone(), self.problem.imitators.clone()),
                };
                self.restore(&fen, imitators);
                self.stack.truncate(idx);
            }
        }

        let color = match label {
            Some(Label { continuation: false, .. }) => self.ordering.first(),
            Some(Label { continuation: true, .. }) => self.ordering.second(),
            None => self.last_color.opponent(),
        };

        self.clear_imitators();
        let old_imitators = std::mem::take(&mut self.imitators);
        let mut anime = Vec::new();
        let mut displacement = (0, 0);
        let mut imitators_placed = false;
        for sub_move in split_sub_moves(moves) {
            let half_move = HalfMove::parse(sub_move)?;
            self.check_piece_names(text, &half_move);
            let (d_row, d_col) = make_move(
                &mut self.board,
                color,
                &half_move,
                &mut self.imitators,
                &mut anime,
                self.piece_map,
            )?;
            displacement = (displacement.0 + d_row, displacement.1 + d_col);
            for effect in &half_move.effects {
                let outcome = make_effect(
                    &mut self.board,
                    effect,
                    &mut self.imitators,
                    &mut anime,
                    self.piece_map,
                )?;
                match outcome {
                    EffectOutcome::Applied => {}
                    EffectOutcome::ImitatorsPlaced => imitators_placed = true,
                    EffectOutcome::Unrecognized => {
                        self.add_warning(ParseWarning::UnrecognizedEffect {
                            step: text.to_owned(),
                            effect: effect.clone(),
                        });
                    }
                }
            }
        }
        if !imitators_placed {
            let shape = self.board.shape();
            let promoted = std::mem::take(&mut self.imitators);
            self.imitators = old_imitators
                .iter()
                .filter_map(|pos| pos.offset(shape, displacement))
                .chain(promoted)
                .collect_vec();
        }
        self.place_imitators();

        let fen = make_forsyth(&self.board);
        debug!("{text:?} -> {fen}");
        if let Some(label) = label {
            self.stack.push(Entry {
                label,
                color,
                fen: fen.clone(),
                imitators: self.imitators.clone(),
            });
        }
        self.last_color = color;

        let mut annotated = String::new();
        if !self.announced {
            annotated.push_str(&annotator.annotate(&Fragment {
                kind: FragmentKind::Initial,
                text: String::new(),
                fen: self.start_fen(),
                animation: None,
                retracted_from: None,
            }));
            self.announced = true;
        }
        annotated.push_str(&annotator.annotate(&Fragment {
            kind: FragmentKind::Step,
            text: text.to_owned(),
            fen,
            animation: (!anime.is_empty()).then(|| anime.join(",")),
            retracted_from,
        }));
        self.solution_printed = true;
        Ok(annotated)
    }

    // Pieces we have no code for are drawn as text. Each one is reported once.
    fn check_piece_names(&mut self, step: &str, half_move: &HalfMove) {
        for piece in half_move.piece_names() {
            let reported = self.warnings.iter().any(|warning| {
                matches!(warning, ParseWarning::UnknownPiece { piece: known, .. } if known == piece)
            });
            if !reported && !self.piece_map.knows(piece) {
                self.add_warning(ParseWarning::UnknownPiece {
                    step: step.to_owned(),
                    piece: piece.to_owned(),
                });
            }
        }
    }

    // Handles a twin header line. `body` is the part after "a)".
    pub fn process_twin(
        &mut self, line: &str, continued: bool, letter: char, body: &str, info: &InputInfo,
        annotator: &mut impl Annotator,
    ) -> Result<String, ReplayError> {
        let mut problem = if continued { self.problem.clone() } else { self.root.clone() };
        let index = (letter as usize).saturating_sub('a' as usize);
        if let Some(stipulation) = info.stipulation(index) {
            problem.set_stipulation(stipulation, info);
        }
        let twin = make_twin(&problem.diagram, body, self.piece_map)?;
        debug!("Twin {letter}) -> {}", twin.fen);
        problem.set_diagram(twin.fen.clone());
        self.ordering = problem.ordering;
        self.problem = problem;
        self.solution_printed = false;
        self.reset();
        self.announced = true;
        Ok(annotator.annotate(&Fragment {
            kind: FragmentKind::Twin,
            text: line.to_owned(),
            fen: twin.fen,
            animation: (!twin.anime.is_empty()).then_some(twin.anime),
            retracted_from: None,
        }))
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sq(s: &str) -> Coord { Coord::from_algebraic(s).unwrap() }

    struct Harness {
        map: PieceMap,
        info: InputInfo,
    }

    impl Harness {
        fn new() -> Self { Harness { map: PieceMap::default(), info: InputInfo::default() } }

        fn state(&self, fen: &str, stipulation: &str) -> ParseState<'_> {
            ParseState::new(Problem::new(fen, stipulation, &self.info, &self.map), &self.map)
        }
    }

    fn play(state: &mut ParseState, steps: &[&str]) -> Vec<Fragment> {
        let mut fragments = Vec::new();
        let mut annotator = |fragment: &Fragment| {
            fragments.push(fragment.clone());
            String::new()
        };
        for step in steps {
            state.process_step(step, &mut annotator).unwrap();
        }
        fragments
    }

    fn fens(fragments: &[Fragment]) -> Vec<&str> {
        fragments.iter().map(|f| f.fen.as_str()).collect()
    }

    #[test]
    fn first_step_is_announced() {
        let h = Harness::new();
        let mut state = h.state("4k3/8/8/8/8/8/8/R3K3", "#2");
        let fragments = play(&mut state, &["1.Ra1-a7", "1...Ke8-f8"]);
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0].kind, FragmentKind::Initial);
        assert_eq!(fragments[0].fen, "4k3/8/8/8/8/8/8/R3K3");
        assert_eq!(fragments[1].animation.as_deref(), Some("a1a7"));
        assert_eq!(fragments[2].fen, "5k2/R7/8/8/8/8/8/4K3");
    }

    #[test]
    fn retraction() {
        let h = Harness::new();
        let mut state = h.state("4k3/8/8/8/8/8/8/R3K3", "#2");
        let fragments = play(&mut state, &[
            "1.Ra1-a7",
            "1...Ke8-f8",
            "2.Ra7-a8",
            "2.Ke1-e2",
            "1...Ke8-d8",
            "1.Ra1-a8",
        ]);
        assert_eq!(fens(&fragments[4..]), vec![
            "5k2/R7/8/8/8/8/4K3/8",
            "3k4/R7/8/8/8/8/8/4K3",
            "R3k3/8/8/8/8/8/8/4K3",
        ]);
        assert_eq!(fragments[4].retracted_from.as_deref(), Some("R4k2/8/8/8/8/8/8/4K3"));
        assert_eq!(fragments[3].retracted_from, None);
    }

    #[test]
    fn equal_labels_retract_to_the_same_position() {
        let h = Harness::new();
        let mut state = h.state("4k3/8/8/8/8/8/8/R3K3", "#2");
        let fragments =
            play(&mut state, &["1.Ra1-a7", "1...Ke8-f8", "2.Ra7-a8", "2.Ra7-b7", "2.Ra7-c7"]);
        assert_eq!(fens(&fragments[4..]), vec![
            "5k2/1R6/8/8/8/8/8/4K3",
            "5k2/2R5/8/8/8/8/8/4K3",
        ]);
        assert_eq!(state.stack.len(), 3);
    }

    #[test]
    fn unlabelled_steps_alternate() {
        let h = Harness::new();
        let mut state = h.state("r3k3/8/8/8/8/8/8/4K2R", "#2");
        let fragments = play(&mut state, &["1.0-0", "0-0-0"]);
        assert_eq!(fragments[2].fen, "2kr4/8/8/8/8/8/8/5RK1");
        assert_eq!(state.stack.len(), 1);
    }

    #[test]
    fn help_play_starts_with_black() {
        let h = Harness::new();
        let mut state = h.state("r3k3/8/8/8/8/8/8/4K3", "h#2");
        let fragments = play(&mut state, &["1.0-0-0"]);
        assert_eq!(fragments[1].fen, "2kr4/8/8/8/8/8/8/4K3");
    }

    #[test]
    fn proof_game_starts_from_the_array() {
        let h = Harness::new();
        let mut state = h.state("8/8/8/8/8/8/8/8", "dia1.0");
        let fragments = play(&mut state, &["1.e2-e4", "e7-e5"]);
        assert_eq!(fragments[0].fen, START_POSITION);
        assert_eq!(fragments[2].fen, "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR");
    }

    #[test]
    fn parallel_moves() {
        let h = Harness::new();
        let mut state = h.state("4k3/8/8/8/8/8/8/R3K3", "#2");
        let fragments = play(&mut state, &["1.Ra1-a7/Ke1-e2"]);
        assert_eq!(fragments[1].fen, "4k3/R7/8/8/8/8/4K3/8");
        assert_eq!(fragments[1].animation.as_deref(), Some("a1a7,e1e2"));
    }

    #[test]
    fn imitators_follow_the_move() {
        let mut h = Harness::new();
        h.info.imitators = vec![sq("c3")];
        let mut state = h.state("4k3/8/8/8/8/8/8/4K3", "#2");
        let fragments = play(&mut state, &["1.Ke1-e2", "1.Ke1-f2[Ia1]"]);
        assert_eq!(fragments[0].fen, "4k3/8/8/8/8/2-c5/8/4K3");
        assert_eq!(fragments[1].fen, "4k3/8/8/8/2-c5/8/4K3/8");
        assert_eq!(fragments[2].fen, "4k3/8/8/8/8/8/5K2/-c7");
        assert_eq!(state.imitators, vec![sq("a1")]);
    }

    #[test]
    fn unrecognized_effect_is_a_warning() {
        let h = Harness::new();
        let mut state = h.state("4k3/8/8/8/8/8/8/4K3", "#2");
        let fragments = play(&mut state, &["1.Ke1-e2[Madrasi]"]);
        assert_eq!(fragments[1].fen, "4k3/8/8/8/8/8/4K3/8");
        assert_eq!(state.into_warnings(), vec![ParseWarning::UnrecognizedEffect {
            step: "1.Ke1-e2[Madrasi]".to_owned(),
            effect: "Madrasi".to_owned(),
        }]);
    }

    #[test]
    fn unknown_pieces_are_reported_once() {
        let h = Harness::new();
        let mut state = h.state("4k3/8/8/8/8/8/8/''XY3K3", "#2");
        let fragments = play(&mut state, &["1.XYa1-a7", "1...Ke8-f8", "2.XYa7-a8", "2.Ke1-d2"]);
        assert_eq!(fragments[3].fen, "''XY4k2/8/8/8/8/8/8/4K3");
        assert_eq!(state.into_warnings(), vec![ParseWarning::UnknownPiece {
            step: "1.XYa1-a7".to_owned(),
            piece: "XY".to_owned(),
        }]);
    }

    #[test]
    fn missing_piece() {
        let h = Harness::new();
        let mut state = h.state("4k3/8/8/8/8/8/8/4K3", "#2");
        let result = state.process_step("1.Ra1-a7", &mut |_: &Fragment| String::new());
        assert_eq!(result, Err(ReplayError::PieceMissing("a1".to_owned())));
    }

    #[test]
    fn sub_moves() {
        assert_eq!(split_sub_moves("Ke1-e2"), vec!["Ke1-e2"]);
        assert_eq!(split_sub_moves("Ke1-e2/a2-a3[x/y]"), vec!["Ke1-e2", "a2-a3[x/y]"]);
    }
}
