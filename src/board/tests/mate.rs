//! Checkmate, stalemate and game-end detection.

use super::{fen, play_all};
use crate::board::{evaluate_end, generate_legal, mate_test, MateStatus, Position, Variant};
use crate::result::GameResult;

#[test]
fn test_fools_mate() {
    let pos = play_all(Position::start(Variant::Normal), &["f3", "e5", "g4", "Qh4"]);
    assert_eq!(mate_test(&pos, pos.flags(), pos.ep_file()), MateStatus::Checkmate);
    let (moves, in_check) = generate_legal(&pos, pos.flags(), pos.ep_file());
    assert!(moves.is_empty());
    assert!(in_check);
    assert_eq!(
        evaluate_end(&pos, pos.flags(), pos.ep_file()),
        Some((GameResult::BlackWins, "Black mates".to_string()))
    );
}

#[test]
fn test_stalemate_is_not_checkmate() {
    let pos = fen(Variant::Normal, "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
    assert_eq!(mate_test(&pos, pos.flags(), pos.ep_file()), MateStatus::Stalemate);
    let (moves, in_check) = generate_legal(&pos, pos.flags(), pos.ep_file());
    assert!(moves.is_empty());
    assert!(!in_check);
}

#[test]
fn test_smothered_mate() {
    let pos = fen(Variant::Normal, "6rk/5Npp/8/8/8/8/8/6K1 b - - 0 1");
    assert_eq!(mate_test(&pos, pos.flags(), pos.ep_file()), MateStatus::Checkmate);
}

#[test]
fn test_crazyhouse_drop_saves_mate() {
    // Back-rank check that a held piece can block
    let pos = fen(Variant::Normal, "R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
    assert_eq!(mate_test(&pos, pos.flags(), pos.ep_file()), MateStatus::Checkmate);
    let zh = fen(Variant::Crazyhouse, "R5k1/5ppp/8/8/8/8/8/6K1[n] b - - 0 1");
    assert_eq!(mate_test(&zh, zh.flags(), zh.ep_file()), MateStatus::Check);
    let quiet = fen(Variant::Normal, "6k1/5ppp/8/8/8/8/8/R5K1 b - - 0 1");
    assert_eq!(mate_test(&quiet, quiet.flags(), quiet.ep_file()), MateStatus::None);
}

#[test]
fn test_xiangqi_flying_general_restricts_moves() {
    // The red general may not step onto the open file facing the black general
    let pos = fen(Variant::Xiangqi, "4k4/9/9/9/9/9/9/9/9/3K5 w - - 0 1");
    let (moves, _) = generate_legal(&pos, pos.flags(), pos.ep_file());
    assert!(moves.iter().all(|m| m.to.1 != 4));
}

#[test]
fn test_xiangqi_stalemate_loses() {
    // chariots cover both neighbouring files, the soldier covers e9
    let pos = fen(Variant::Xiangqi, "4k4/9/4P4/9/9/9/9/9/9/3RKR3 b - - 0 1");
    assert_eq!(mate_test(&pos, pos.flags(), pos.ep_file()), MateStatus::Stalemate);
    assert_eq!(
        evaluate_end(&pos, pos.flags(), pos.ep_file()).map(|(r, _)| r),
        Some(GameResult::WhiteWins)
    );
}
