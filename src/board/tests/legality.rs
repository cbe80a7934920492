//! Classification, pins, castling and en passant.

use super::{fen, play};
use crate::board::{
    classify, generate_legal, is_in_check, Color, EpFile, MoveKind, Piece, Position, Square, Variant,
};

#[test]
fn test_every_legal_move_classifies_as_itself() {
    let pos = fen(
        Variant::Normal,
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    );
    let (moves, _) = generate_legal(&pos, pos.flags(), pos.ep_file());
    for mv in &moves {
        let from = mv.from.unwrap();
        let promo = mv.promotion.map(Piece::to_char);
        assert_eq!(
            classify(&pos, pos.flags(), pos.ep_file(), from, mv.to, promo),
            mv.kind,
            "{mv}"
        );
    }
}

#[test]
fn test_en_passant_only_right_after_double_step() {
    let pos = fen(Variant::Normal, "4k3/3p4/8/4P3/8/8/8/4K3 b - - 0 1");
    let pos = play(&pos, Square(6, 3), Square(4, 3));
    assert_eq!(
        classify(&pos, pos.flags(), pos.ep_file(), Square(4, 4), Square(5, 3), None),
        MoveKind::EnPassant
    );
    // a waiting move each and the chance is gone
    let pos = play(&pos, Square(0, 4), Square(0, 3));
    let pos = play(&pos, Square(7, 4), Square(7, 3));
    assert_eq!(
        classify(&pos, pos.flags(), pos.ep_file(), Square(4, 4), Square(5, 3), None),
        MoveKind::Illegal
    );
}

#[test]
fn test_unknown_ep_file_is_optimistic() {
    let pos = fen(Variant::Normal, "4k3/8/8/3pP3/8/8/8/4K3 w - - 0 1");
    assert_eq!(
        classify(&pos, pos.flags(), EpFile::None, Square(4, 4), Square(5, 3), None),
        MoveKind::Illegal
    );
    assert_eq!(
        classify(&pos, pos.flags(), EpFile::Unknown, Square(4, 4), Square(5, 3), None),
        MoveKind::EnPassant
    );
}

#[test]
fn test_en_passant_discovered_check_is_illegal() {
    // Capturing e.p. would open the rank between the rook and the king
    let pos = fen(Variant::Normal, "8/8/8/K2pP2r/8/8/8/7k w - d6 0 1");
    assert_eq!(
        classify(&pos, pos.flags(), pos.ep_file(), Square(4, 4), Square(5, 3), None),
        MoveKind::Illegal
    );
}

#[test]
fn test_castling_through_attack_is_illegal() {
    let pos = fen(Variant::Normal, "4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1");
    let f = pos.flags();
    assert_eq!(
        classify(&pos, f, pos.ep_file(), Square(0, 4), Square(0, 6), None),
        MoveKind::Illegal
    );
    assert_eq!(
        classify(&pos, f, pos.ep_file(), Square(0, 4), Square(0, 2), None),
        MoveKind::CastleQueenside
    );
}

#[test]
fn test_castling_rights_lost_after_rook_moves_back() {
    let pos = fen(Variant::Normal, "4k3/8/8/8/8/8/8/4K2R w K - 0 1");
    let pos = play(&pos, Square(0, 7), Square(1, 7));
    let pos = play(&pos, Square(7, 4), Square(7, 3));
    let pos = play(&pos, Square(1, 7), Square(0, 7));
    let pos = play(&pos, Square(7, 3), Square(7, 4));
    assert!(!pos.castling().has(Color::White, true));
    assert_eq!(
        classify(&pos, pos.flags(), pos.ep_file(), Square(0, 4), Square(0, 6), None),
        MoveKind::Illegal
    );
}

#[test]
fn test_double_check_allows_only_king_moves() {
    let pos = fen(Variant::Normal, "4k3/8/8/8/1b6/8/7N/r3K3 w - - 0 1");
    assert_eq!(is_in_check(&pos, pos.flags(), None), 2);
    let (moves, in_check) = generate_legal(&pos, pos.flags(), pos.ep_file());
    assert!(in_check);
    assert!(moves.iter().all(|m| m.piece == Piece::King));
}

#[test]
fn test_check_evasion_by_block_and_capture() {
    let pos = fen(Variant::Normal, "4k3/8/8/8/8/8/6B1/r3K3 w - - 0 1");
    let f = pos.flags();
    let ep = pos.ep_file();
    // f1 is behind the king and blocks nothing
    assert_eq!(classify(&pos, f, ep, Square(1, 6), Square(0, 5), None), MoveKind::Illegal);
    assert_eq!(classify(&pos, f, ep, Square(0, 4), Square(1, 4), None), MoveKind::Normal);
    let blocker = fen(Variant::Normal, "4k3/8/8/8/8/8/2B5/r3K3 w - - 0 1");
    assert_eq!(
        classify(&blocker, blocker.flags(), blocker.ep_file(), Square(1, 2), Square(0, 1), None),
        MoveKind::Normal
    );
}

#[test]
fn test_positions_are_not_mutated_by_queries() {
    let pos = Position::start(Variant::Normal);
    let before = pos.clone();
    let _ = generate_legal(&pos, pos.flags(), pos.ep_file());
    let _ = is_in_check(&pos, pos.flags(), None);
    assert_eq!(pos, before);
}
