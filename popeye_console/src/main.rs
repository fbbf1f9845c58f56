#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

mod config;
mod forsyth;
mod replay;

use clap::{Command, arg};


fn main() -> anyhow::Result<()> {
    // Stdout carries the annotated solution, so logs go to stderr.
    env_logger::Builder::new()
        .target(env_logger::Target::Stderr)
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let matches = Command::new("Popeye replay")
        .author(clap::crate_authors!())
        .version(clap::crate_version!())
        .about("Annotates Popeye solutions with the positions reached after every move")
        .subcommand_required(true)
        .subcommand(
            Command::new("replay")
                .about("Reads solver output from stdin and writes the annotated solution to stdout.")
                .arg(arg!(<input_file> "Popeye input that produced the solution"))
                .arg(arg!(--"fen" <fen> "Initial position; taken from the input file by default"))
                .arg(arg!(--"piece-map" <file> "Custom pieces: yaml map from piece code to Popeye name"))
                .arg(
                    arg!(--"format" <format>)
                        .value_parser(["html", "json"])
                        .default_value("html"),
                ),
        )
        .subcommand(
            Command::new("forsyth")
                .about("Converts an FFEN position into a Popeye forsyth command argument.")
                .arg(arg!(<ffen> "Position"))
                .arg(arg!(--"piece-map" <file> "Custom pieces: yaml map from piece code to Popeye name")),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("replay", sub_matches)) => replay::run(replay::ReplayConfig {
            input_file: sub_matches.get_one::<String>("input_file").unwrap().clone(),
            fen: sub_matches.get_one::<String>("fen").cloned(),
            piece_map: config::read_piece_map(sub_matches.get_one::<String>("piece-map"))?,
            format: match sub_matches.get_one::<String>("format").unwrap().as_str() {
                "html" => replay::OutputFormat::Html,
                "json" => replay::OutputFormat::Json,
                _ => panic!(),
            },
        }),
        Some(("forsyth", sub_matches)) => forsyth::run(
            sub_matches.get_one::<String>("ffen").unwrap(),
            &config::read_piece_map(sub_matches.get_one::<String>("piece-map"))?,
        ),
        _ => unreachable!("Exhausted list of subcommands and subcommand_required prevents `None`"),
    }
}
