use std::io::{self, Read};

use anyhow::Context;
use log::info;
use popeye_replay::piece::PieceMap;
use popeye_replay::popeye_input::{board_from_input, to_popeye_fen};
use popeye_replay::solution::{Fragment, SpanAnnotator, parse_solution};
use serde::Serialize;


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OutputFormat {
    Html,
    Json,
}

pub struct ReplayConfig {
    pub input_file: String,
    pub fen: Option<String>,
    pub piece_map: PieceMap,
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct JsonReport {
    text: String,
    fragments: Vec<Fragment>,
    warnings: Vec<String>,
}

pub fn run(config: ReplayConfig) -> anyhow::Result<()> {
    let input = std::fs::read_to_string(&config.input_file)
        .with_context(|| format!("Failed to read Popeye input '{}'.", config.input_file))?;
    let mut output = String::new();
    io::stdin().read_to_string(&mut output).context("Failed to read solver output.")?;
    print!("{}", annotate(&input, config.fen.as_deref(), &output, &config.piece_map, config.format)?);
    Ok(())
}

fn annotate(
    input: &str, fen: Option<&str>, output: &str, piece_map: &PieceMap, format: OutputFormat,
) -> anyhow::Result<String> {
    let fen = match fen {
        Some(fen) => fen.to_owned(),
        None => {
            let board = board_from_input(input, piece_map)
                .context("Popeye input has neither `forsyth` nor `pieces`.")?;
            to_popeye_fen(&board, piece_map)?
        }
    };
    match format {
        OutputFormat::Html => {
            let parsed = parse_solution(input, &fen, output, piece_map, &mut SpanAnnotator)?;
            if !parsed.warnings.is_empty() {
                info!("{} warning(s) while replaying the solution", parsed.warnings.len());
            }
            Ok(parsed.text)
        }
        OutputFormat::Json => {
            let mut fragments = Vec::new();
            let parsed = parse_solution(input, &fen, output, piece_map, &mut |f: &Fragment| {
                fragments.push(f.clone());
                f.text.clone()
            })?;
            let report = JsonReport {
                text: parsed.text,
                fragments,
                warnings: parsed.warnings.iter().map(|w| w.to_string()).collect(),
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
    }
}


#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    const INPUT: &str = indoc!(
        "
        BeginProblem
        Stipulation #1
        Pieces White Ke6 Ra1 Black Ke8
        EndProblem
        "
    );

    #[test]
    fn html_from_pieces_command() {
        let html = annotate(INPUT, None, "  1.Ra1-a8 #", &PieceMap::default(), OutputFormat::Html)
            .unwrap();
        assert!(html.contains(r#"class="popeye-initial" data-fen="4k3/8/4K3/8/8/8/8/R7""#));
        assert!(html.contains(r#"data-fen="R3k3/8/4K3/8/8/8/8/8" data-anime="a1a8">1.Ra1-a8</span> #"#));
    }

    #[test]
    fn json_report() {
        let json = annotate(
            INPUT,
            Some("4k3/8/4K3/8/8/8/8/R7"),
            "  1.Ra1-a8[Madrasi] #",
            &PieceMap::default(),
            OutputFormat::Json,
        )
        .unwrap();
        let report: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(report["fragments"].as_array().unwrap().len(), 2);
        assert_eq!(report["fragments"][0]["kind"], "Initial");
        assert_eq!(report["fragments"][1]["fen"], "R3k3/8/4K3/8/8/8/8/8");
        assert_eq!(report["text"], "  1.Ra1-a8[Madrasi] #");
        assert_eq!(report["warnings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn input_without_position() {
        let result = annotate("stipulation #2", None, "", &PieceMap::default(), OutputFormat::Html);
        assert!(result.is_err());
    }
}
