// Annotates Popeye solver output with the positions reached after every step.
//
// Output lines are separated by literal "<br>". A line is either blank (a run of blank lines
// is a paragraph break: back to the initial position), a twin header, or text containing steps.

use itertools::Itertools;
use serde::Serialize;

use crate::error::{ParseWarning, PopeyeError};
use crate::grammar::{TWIN_HEADER, step_exp};
use crate::once_cell_regex;
use crate::piece::PieceMap;
use crate::popeye_input::InputInfo;
use crate::step::{ParseState, Problem};


pub const LINE_SEPARATOR: &str = "<br>";

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum FragmentKind {
    Initial, // synthetic: the position before the first step
    Twin,
    Step,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub text: String,
    pub fen: String,
    pub animation: Option<String>,
    pub retracted_from: Option<String>,
}

// Renders a fragment in place of its text.
pub trait Annotator {
    fn annotate(&mut self, fragment: &Fragment) -> String;
}

impl<F: FnMut(&Fragment) -> String> Annotator for F {
    fn annotate(&mut self, fragment: &Fragment) -> String { self(fragment) }
}

// HTML: `<span class="popeye-step" data-fen="...">1.e2-e4</span>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpanAnnotator;

impl Annotator for SpanAnnotator {
    fn annotate(&mut self, fragment: &Fragment) -> String {
        let class = match fragment.kind {
            FragmentKind::Initial => "popeye-initial",
            FragmentKind::Twin => "popeye-twin",
            FragmentKind::Step => "popeye-step",
        };
        let mut attributes = format!(r#"class="{class}" data-fen="{}""#, escape_attribute(&fragment.fen));
        if let Some(animation) = &fragment.animation {
            attributes.push_str(&format!(r#" data-anime="{}""#, escape_attribute(animation)));
        }
        if let Some(fen) = &fragment.retracted_from {
            attributes.push_str(&format!(r#" data-retracted-from="{}""#, escape_attribute(fen)));
        }
        format!("<span {attributes}>{}</span>", fragment.text)
    }
}

fn escape_attribute(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;").replace('>', "&gt;")
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParsedSolution {
    pub text: String,
    pub warnings: Vec<ParseWarning>,
}

// Length of the longest run of blank lines directly followed by a first move. In duplex output
// this run separates the two halves.
pub fn duplex_separator(lines: &[&str]) -> Option<usize> {
    let first_move_re = once_cell_regex!(r"^\s+1\.");
    let mut run = 0;
    let mut longest = None;
    for line in lines {
        if line.trim().is_empty() {
            run += 1;
            continue;
        }
        if run > 0 && first_move_re.is_match(line) {
            longest = longest.max(Some(run));
        }
        run = 0;
    }
    longest
}

// Replays `output` produced by Popeye for `input`, starting from `initial_fen` (Popeye `forsyth`
// syntax or our own). Every step and twin header is replaced by its annotation. A step that
// cannot be replayed stops the annotation: it and the rest of the output are kept as is.
pub fn parse_solution(
    input: &str, initial_fen: &str, output: &str, piece_map: &PieceMap,
    annotator: &mut impl Annotator,
) -> Result<ParsedSolution, PopeyeError> {
    let twin_re = once_cell_regex!(TWIN_HEADER);
    if initial_fen.trim().is_empty() {
        return Err(PopeyeError::InvalidFen(initial_fen.to_owned()));
    }
    let info = InputInfo::parse(input);
    let root = Problem::new(initial_fen.trim(), info.stipulation(0).unwrap_or(""), &info, piece_map);
    let mut state = ParseState::new(root, piece_map);

    let lines = output.split(LINE_SEPARATOR).collect_vec();
    let separator = duplex_separator(&lines);
    let mut annotated = Vec::with_capacity(lines.len());
    let mut blank_run = 0;
    let mut aborted = false;
    for line in lines {
        if aborted {
            annotated.push(line.to_owned());
            continue;
        }
        if line.trim().is_empty() {
            blank_run += 1;
            annotated.push(line.to_owned());
            continue;
        }
        if blank_run > 0 {
            state.paragraph_break(blank_run, separator, info.duplex);
            blank_run = 0;
        }
        if let Some(cap) = twin_re.captures(line) {
            let continued = !cap.get(1).unwrap().as_str().is_empty();
            let letter = cap.get(2).unwrap().as_str().chars().next().unwrap();
            let body = cap.get(3).unwrap().as_str();
            match state.process_twin(line, continued, letter, body, &info, annotator) {
                Ok(text) => annotated.push(text),
                Err(error) => {
                    state.add_warning(ParseWarning::ReplayAborted { token: line.to_owned(), error });
                    annotated.push(line.to_owned());
                    aborted = true;
                }
            }
        } else {
            let (text, ok) = annotate_steps(&mut state, line, annotator);
            annotated.push(text);
            aborted = !ok;
        }
    }
    Ok(ParsedSolution { text: annotated.join(LINE_SEPARATOR), warnings: state.into_warnings() })
}

// Returns the annotated line and whether all steps could be replayed.
fn annotate_steps(
    state: &mut ParseState, line: &str, annotator: &mut impl Annotator,
) -> (String, bool) {
    let step_re = once_cell_regex!(&step_exp());
    let mut text = String::new();
    let mut last = 0;
    for m in step_re.find_iter(line) {
        text.push_str(&line[last..m.start()]);
        match state.process_step(m.as_str(), annotator) {
            Ok(step) => text.push_str(&step),
            Err(error) => {
                state.add_warning(ParseWarning::ReplayAborted { token: m.as_str().to_owned(), error });
                text.push_str(&line[m.start()..]);
                return (text, false);
            }
        }
        last = m.end();
    }
    text.push_str(&line[last..]);
    (text, true)
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ReplayError;

    #[test]
    fn separator() {
        let lines = ["", "  1.e2-e4", "  1.d2-d4", "", "", "  1.e7-e5", "", "solution finished."];
        assert_eq!(duplex_separator(&lines), Some(2));
        assert_eq!(duplex_separator(&["1.e2-e4", "", "text"]), None);
    }

    #[test]
    fn span_annotation() {
        let input = "stipulation #1";
        let output = "<br>  1.Ra1-a8 #<br>";
        let parsed = parse_solution(
            input,
            "4k3/8/4K3/8/8/8/8/R7",
            output,
            &PieceMap::default(),
            &mut SpanAnnotator,
        )
        .unwrap();
        assert_eq!(
            parsed.text,
            concat!(
                r#"<br>  <span class="popeye-initial" data-fen="4k3/8/4K3/8/8/8/8/R7"></span>"#,
                r#"<span class="popeye-step" data-fen="R3k3/8/4K3/8/8/8/8/8" data-anime="a1a8">"#,
                r#"1.Ra1-a8</span> #<br>"#,
            )
        );
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn failed_step_keeps_the_rest_raw() {
        let output = "  1.Ra1-a8 #<br>  1.Rb1-b8 # 1.Ra1-a7<br>  1.Ra1-a6";
        let mut count = 0;
        let parsed = parse_solution(
            "stipulation #1",
            "4k3/8/4K3/8/8/8/8/R7",
            output,
            &PieceMap::default(),
            &mut |_: &Fragment| {
                count += 1;
                format!("<{count}>")
            },
        )
        .unwrap();
        assert_eq!(parsed.text, "  <1><2> #<br>  1.Rb1-b8 # 1.Ra1-a7<br>  1.Ra1-a6");
        assert_eq!(parsed.warnings, vec![ParseWarning::ReplayAborted {
            token: "1.Rb1-b8".to_owned(),
            error: ReplayError::PieceMissing("b1".to_owned()),
        }]);
    }

    #[test]
    fn empty_fen() {
        let result =
            parse_solution("", " ", "", &PieceMap::default(), &mut |_: &Fragment| String::new());
        assert_eq!(result, Err(PopeyeError::InvalidFen(" ".to_owned())));
    }
}
