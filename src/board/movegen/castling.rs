//! Castling generation.
//!
//! Two encodings exist. Standard castling moves the king two or more files
//! toward a corner rook. Shuffle variants encode castling as the king taking
//! its own rook, which works for any rook file.

use crate::board::check::{attackers_of, frc_destinations, Simulation};
use crate::board::flags::PositionFlags;
use crate::board::state::Position;
use crate::board::{Color, Move, MoveKind, Piece, Square};

/// Castling moves available to the side to move.
///
/// The caller is responsible for not asking while the side to move is in check.
pub(crate) fn generate_castles(pos: &Position, flags: PositionFlags) -> Vec<Move> {
    let mut out = Vec::new();
    if flags.contains(PositionFlags::FRC_TYPE_CASTLING) {
        for h_side in [true, false] {
            out.extend(king_takes_rook(pos, flags, h_side));
        }
    } else {
        let width = pos.dimensions().width;
        let mut king_files = vec![width >> 1];
        if (width - 1) >> 1 != width >> 1 {
            king_files.push((width - 1) >> 1);
        }
        for ff in king_files {
            for h_side in [true, false] {
                out.extend(standard(pos, flags, ff, h_side));
            }
        }
    }
    out
}

fn owns(pos: &Position, sq: Square, color: Color, piece: Piece) -> bool {
    pos.get(sq)
        .is_some_and(|o| o.color == color && o.piece == piece)
}

fn standard(pos: &Position, flags: PositionFlags, ff: usize, h_side: bool) -> Option<Move> {
    let side = flags.side_to_move();
    let width = pos.dimensions().width;
    let rank = side.back_rank(pos.dimensions().height);
    let corner = if h_side { width - 1 } else { 0 };
    let rights = pos.castling();
    if !flags.may_castle(side, h_side)
        || rights.side(side).king_file != Some(ff)
        || rights.rook_file(side, h_side) != Some(corner)
    {
        return None;
    }
    let king = Square(rank, ff);
    if !owns(pos, king, side, Piece::King) || !owns(pos, Square(rank, corner), side, Piece::Rook) {
        return None;
    }
    let (lo, hi) = if h_side { (ff + 1, corner) } else { (corner + 1, ff) };
    if (lo..hi).any(|f| pos.get(Square(rank, f)).is_some()) {
        return None;
    }
    let reach = (width + 2) >> 2;
    let target = if h_side { ff + reach } else { ff.checked_sub(reach)? };
    if path_attacked(pos, flags, king, None, ff, target) {
        return None;
    }
    let kind = if h_side {
        MoveKind::CastleKingside
    } else {
        MoveKind::CastleQueenside
    };
    Some(Move::new(kind, side, Piece::King, king, Square(rank, target)))
}

fn king_takes_rook(pos: &Position, flags: PositionFlags, h_side: bool) -> Option<Move> {
    let side = flags.side_to_move();
    let width = pos.dimensions().width;
    let rank = side.back_rank(pos.dimensions().height);
    if !flags.may_castle(side, h_side) {
        return None;
    }
    let kf = pos.castling().side(side).king_file?;
    let rf = pos.castling().rook_file(side, h_side)?;
    let king = Square(rank, kf);
    let rook = Square(rank, rf);
    if !owns(pos, king, side, Piece::King) || !owns(pos, rook, side, Piece::Rook) {
        return None;
    }
    let (kd, rd) = frc_destinations(width, h_side);
    let lo = kf.min(rf).min(kd).min(rd);
    let hi = kf.max(rf).max(kd).max(rd);
    if (lo..=hi).any(|f| f != kf && f != rf && pos.get(Square(rank, f)).is_some()) {
        return None;
    }
    if path_attacked(pos, flags, king, Some(rook), kf, kd) {
        return None;
    }
    let kind = if h_side {
        MoveKind::CastleHSide
    } else {
        MoveKind::CastleASide
    };
    Some(Move::new(kind, side, Piece::King, king, rook))
}

/// Some square the king crosses, destination included, is attacked.
///
/// The king (and the castling rook, if given) are lifted off the board first
/// so they neither block nor shield the path.
fn path_attacked(
    pos: &Position,
    flags: PositionFlags,
    king: Square,
    rook: Option<Square>,
    from_file: usize,
    to_file: usize,
) -> bool {
    if flags.contains(PositionFlags::IGNORE_CHECK) {
        return false;
    }
    let side = flags.side_to_move();
    let Some(king_occ) = pos.get(king) else {
        return true;
    };
    let (lo, hi) = if from_file <= to_file {
        (from_file, to_file)
    } else {
        (to_file, from_file)
    };
    let mut scratch = pos.clone();
    (lo..=hi).filter(|&f| f != from_file).any(|f| {
        let stop = Square(king.0, f);
        let mut sim = Simulation::new(&mut scratch);
        if let Some(rook) = rook {
            sim.set(rook, None);
        }
        sim.set(king, None);
        sim.set(stop, Some(king_occ));
        attackers_of(&sim, stop, side.opponent(), flags) > 0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Variant;

    fn castles(variant: Variant, fen: &str) -> Vec<Move> {
        let pos = Position::try_from_fen(variant, fen).unwrap();
        generate_castles(&pos, pos.flags())
    }

    #[test]
    fn test_both_wings_open() {
        let moves = castles(Variant::Normal, "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let targets: Vec<Square> = moves.iter().map(|m| m.to).collect();
        assert_eq!(targets, vec![Square(0, 6), Square(0, 2)]);
        assert_eq!(moves[0].kind, MoveKind::CastleKingside);
    }

    #[test]
    fn test_no_castling_through_attack() {
        // Black rook on f8 covers f1
        let moves = castles(Variant::Normal, "5r1k/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].kind, MoveKind::CastleQueenside);
    }

    #[test]
    fn test_queenside_b_file_attack_allowed() {
        // b1 is crossed by the rook only
        let moves = castles(Variant::Normal, "1r5k/8/8/8/8/8/8/R3K3 w Q - 0 1");
        assert_eq!(moves.len(), 1);
    }

    #[test]
    fn test_rights_required() {
        assert!(castles(Variant::Normal, "r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1").is_empty());
    }

    #[test]
    fn test_capablanca_king_moves_three() {
        let moves = castles(Variant::Capablanca, "r4k3r/10/10/10/10/10/10/R4K3R w KQkq - 0 1");
        let targets: Vec<Square> = moves.iter().map(|m| m.to).collect();
        assert_eq!(targets, vec![Square(0, 8), Square(0, 2)]);
    }

    #[test]
    fn test_king_takes_rook_encoding() {
        // King b1, rooks a1 and h1
        let moves = castles(Variant::FischerRandom, "rk5r/8/8/8/8/8/8/RK5R w HAha - 0 1");
        let h = moves.iter().find(|m| m.kind == MoveKind::CastleHSide).unwrap();
        assert_eq!((h.from, h.to), (Some(Square(0, 1)), Square(0, 7)));
        let a = moves.iter().find(|m| m.kind == MoveKind::CastleASide).unwrap();
        assert_eq!(a.to, Square(0, 0));
    }

    #[test]
    fn test_king_takes_rook_blocked_destination() {
        // Knight on c1 blocks the a-side king destination
        let moves = castles(Variant::FischerRandom, "rk5r/8/8/8/8/8/8/RKN4R w HAha - 0 1");
        assert!(moves.iter().all(|m| m.kind != MoveKind::CastleASide));
    }
}
