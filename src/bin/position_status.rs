use std::env;
use std::process::ExitCode;

use referee::board::{apply_move, generate_legal, mate_test, parse_move, MateStatus, Position, Variant};

fn main() -> ExitCode {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: position_status [-variant NAME] <move1> <move2> ...");
        return ExitCode::FAILURE;
    }

    let mut variant = Variant::Normal;
    if args.first().map(String::as_str) == Some("-variant") && args.len() >= 2 {
        match Variant::from_name(&args[1]) {
            Some(v) => variant = v,
            None => {
                eprintln!("unknown variant: {}", args[1]);
                return ExitCode::FAILURE;
            }
        }
        args.drain(..2);
    }

    let mut pos = Position::start(variant);
    for text in &args {
        match parse_move(&pos, pos.flags(), pos.ep_file(), text) {
            Ok(mv) => pos = apply_move(&pos, &mv),
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
        }
    }

    let (legal_moves, in_check) = generate_legal(&pos, pos.flags(), pos.ep_file());
    let status = mate_test(&pos, pos.flags(), pos.ep_file());
    println!("fen: {}", pos.to_fen());
    println!("side_to_move: {}", pos.side_to_move().protocol_name());
    println!("legal_moves: {}", legal_moves.len());
    println!("check: {in_check}");
    println!("checkmate: {}", status == MateStatus::Checkmate);
    println!("stalemate: {}", status == MateStatus::Stalemate);
    for mv in legal_moves.iter() {
        println!("{mv}");
    }
    ExitCode::SUCCESS
}
