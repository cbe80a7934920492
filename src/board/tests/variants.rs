//! Fairy pieces and variant rules.

use super::{fen, play_all};
use crate::board::{
    classify, evaluate_end, generate_legal, parse_move, Color, MoveKind, Piece, Position, Square,
    Variant,
};
use crate::result::GameResult;

#[test]
fn test_crazyhouse_capture_then_drop() {
    let pos = play_all(
        Position::start(Variant::Crazyhouse),
        &["e4", "d5", "exd5", "Qxd5", "Nc3", "Qa5"],
    );
    assert_eq!(pos.holdings(Color::White).count(Piece::Pawn), 1);
    assert_eq!(pos.holdings(Color::Black).count(Piece::Pawn), 1);
    let pos = play_all(pos, &["P@e6"]);
    assert_eq!(pos.holdings(Color::White).count(Piece::Pawn), 0);
    assert_eq!(pos.get(Square(5, 4)).map(|o| o.piece), Some(Piece::Pawn));
}

#[test]
fn test_three_check_game_ends() {
    let pos = play_all(
        Position::start(Variant::ThreeCheck),
        &["e4", "e5", "Bc4", "Nc6", "Bxf7+", "Kxf7", "Qh5+", "Ke7", "Qxe5+"],
    );
    assert_eq!(pos.checks_given(Color::White), 3);
    let (result, detail) = evaluate_end(&pos, pos.flags(), pos.ep_file()).unwrap();
    assert_eq!(result, GameResult::WhiteWins);
    assert_eq!(detail, "Three checks");
}

#[test]
fn test_atomic_capture_next_to_king_wins() {
    // h7 is out of the king's reach; d8 is next to it
    let pos = fen(Variant::Atomic, "rnbqkbnr/ppppp1pp/8/6N1/8/8/PPPPPPPP/RNBQKB1R w KQkq - 0 1");
    let pos = play_all(pos, &["Nxh7"]);
    assert!(pos.find_king(Color::Black).is_some());
    let pos = fen(Variant::Atomic, "rnbqkbnr/ppppp1pp/8/6N1/8/8/PPPPPPPP/RNBQKB1R w KQkq - 0 1");
    let pos = play_all(pos, &["Ne6", "a6", "Nxd8"]);
    assert!(pos.find_king(Color::Black).is_none());
    let (result, detail) = evaluate_end(&pos, pos.flags(), pos.ep_file()).unwrap();
    assert_eq!(result, GameResult::WhiteWins);
    assert_eq!(detail, "King exploded");
}

#[test]
fn test_suicide_king_is_an_ordinary_piece() {
    let pos = fen(Variant::Suicide, "8/8/8/8/8/8/3k4/4K3 w - - 0 1");
    let (moves, in_check) = generate_legal(&pos, pos.flags(), pos.ep_file());
    assert!(!in_check);
    // capture is mandatory, and capturing the king is allowed
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].captured, Some(Piece::King));
}

#[test]
fn test_kriegspiel_pawn_tries() {
    let pos = Position::start(Variant::Kriegspiel);
    let f = pos.flags();
    let ep = pos.ep_file();
    assert_eq!(classify(&pos, f, ep, Square(1, 4), Square(2, 3), None), MoveKind::Normal);
    let normal = Position::start(Variant::Normal);
    assert_eq!(
        classify(&normal, normal.flags(), ep, Square(1, 4), Square(2, 3), None),
        MoveKind::Illegal
    );
}

#[test]
fn test_berolina_pawns() {
    let pos = Position::start(Variant::Berolina);
    let f = pos.flags();
    let ep = pos.ep_file();
    assert_eq!(classify(&pos, f, ep, Square(1, 4), Square(2, 3), None), MoveKind::Normal);
    assert_eq!(classify(&pos, f, ep, Square(1, 4), Square(3, 2), None), MoveKind::Normal);
    assert_eq!(classify(&pos, f, ep, Square(1, 4), Square(2, 4), None), MoveKind::Illegal);
}

#[test]
fn test_makruk_promotes_on_sixth_rank() {
    let pos = fen(Variant::Makruk, "4k3/8/8/P7/8/8/8/4K3 w - - 0 1");
    let mv = parse_move(&pos, pos.flags(), pos.ep_file(), "a6").unwrap();
    assert_eq!(mv.promotion, Some(Piece::Ferz));
}

#[test]
fn test_capablanca_compound_pieces() {
    let pos = fen(Variant::Capablanca, "4k5/10/10/10/4A5/10/10/4K5 w - - 0 1");
    let (moves, _) = generate_legal(&pos, pos.flags(), pos.ep_file());
    let archbishop: Vec<_> = moves.iter().filter(|m| m.piece == Piece::Archbishop).collect();
    // 14 diagonal squares plus 8 knight jumps
    assert_eq!(archbishop.len(), 14 + 8);
}

#[test]
fn test_xiangqi_cannon_needs_a_screen() {
    let pos = fen(Variant::Xiangqi, "4k4/9/9/9/4p4/9/9/4O4/9/3K5 w - - 0 1");
    let f = pos.flags();
    let ep = pos.ep_file();
    // nothing to jump over on the way to e6
    assert_eq!(classify(&pos, f, ep, Square(2, 4), Square(5, 4), None), MoveKind::Illegal);
    let screened = fen(Variant::Xiangqi, "4k4/9/9/9/4p4/4P4/9/4O4/9/3K5 w - - 0 1");
    assert_eq!(
        classify(&screened, screened.flags(), ep, Square(2, 4), Square(5, 4), None),
        MoveKind::Capture
    );
}

#[test]
fn test_shuffle_start_keeps_castling() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    let mut rng = StdRng::seed_from_u64(960);
    for _ in 0..20 {
        let pos = Position::start_with_rng(Variant::FischerRandom, &mut rng);
        assert!(pos.castling().has(Color::White, true));
        assert!(pos.castling().has(Color::White, false));
        assert!(pos.castling().has(Color::Black, true));
        let (moves, _) = generate_legal(&pos, pos.flags(), pos.ep_file());
        assert!(moves.len() >= 16);
    }
}
