//! Legal move generation and move classification.

use super::check::{checks_after, explosion_victims, is_in_check};
use super::flags::PositionFlags;
use super::movegen::{generate_castles, generate_pseudo_legal};
use super::state::{EpFile, Position};
use super::{Move, MoveKind, MoveList, Piece, Square};

/// Outcome of [`mate_test`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MateStatus {
    /// Legal moves exist and the side to move is not in check
    None,
    Check,
    Checkmate,
    Stalemate,
}

/// Every legal move for the side named by `flags`, plus whether that side is in check.
///
/// Castling is added only when the side to move is not in check. When capturing
/// is mandatory and some capture exists, only captures are returned.
#[must_use]
pub fn generate_legal(pos: &Position, flags: PositionFlags, ep: EpFile) -> (MoveList, bool) {
    let ignore_check = flags.contains(PositionFlags::IGNORE_CHECK);
    let atomic = flags.contains(PositionFlags::ATOMIC_CAPTURE);
    let side = flags.side_to_move();
    let in_check = !ignore_check && is_in_check(pos, flags, None) > 0;

    let mut moves = generate_pseudo_legal(pos, flags, ep);
    let mut scratch = pos.clone();
    moves.retain(|mv| {
        if atomic && mv.is_capture() {
            if mv.piece == Piece::King {
                return false;
            }
            let blast_hits_king = explosion_victims(pos, mv.to)
                .iter()
                .any(|(_, o)| o.color == side && o.piece == Piece::King);
            if blast_hits_king {
                return false;
            }
        }
        ignore_check || checks_after(&mut scratch, flags, Some(mv)) == 0
    });

    if !in_check {
        for castle in generate_castles(pos, flags) {
            moves.push(castle);
        }
    }

    if flags.contains(PositionFlags::MANDATORY_CAPTURE) && moves.iter().any(Move::is_capture) {
        moves.retain(Move::is_capture);
    }
    (moves, in_check)
}

/// Classify the board move `from`-`to` with an optional promotion letter.
///
/// Returns the kind of the matching legal move, or one of the verdicts
/// [`MoveKind::Impossible`] (no own piece on `from`, unknown promotion letter)
/// and [`MoveKind::Illegal`] (anything the rules forbid, including a promotion
/// letter on a move that does not promote). A promotion without a letter
/// takes the variant's default promotion piece.
#[must_use]
pub fn classify(
    pos: &Position,
    flags: PositionFlags,
    ep: EpFile,
    from: Square,
    to: Square,
    promotion: Option<char>,
) -> MoveKind {
    match find_legal(pos, flags, ep, from, to, promotion) {
        Ok(mv) => mv.kind,
        Err(verdict) => verdict,
    }
}

/// Like [`classify`], but hands back the legal move itself.
pub fn find_legal(
    pos: &Position,
    flags: PositionFlags,
    ep: EpFile,
    from: Square,
    to: Square,
    promotion: Option<char>,
) -> Result<Move, MoveKind> {
    let side = flags.side_to_move();
    if !pos.get(from).is_some_and(|o| o.color == side) {
        return Err(MoveKind::Impossible);
    }
    let wanted = match promotion {
        None | Some('x') => None,
        Some('=') => return Err(MoveKind::Illegal),
        Some(c) => Some(Piece::from_char(c).ok_or(MoveKind::Impossible)?),
    };

    let (legal, _) = generate_legal(pos, flags, ep);
    let candidates: Vec<Move> = legal
        .iter()
        .filter(|m| m.from == Some(from) && m.to == to)
        .copied()
        .collect();
    let Some(first) = candidates.first() else {
        return Err(MoveKind::Illegal);
    };
    if first.promotion.is_none() {
        return match wanted {
            Some(_) => Err(MoveKind::Illegal),
            None => Ok(*first),
        };
    }
    let wanted = wanted.unwrap_or_else(|| pos.variant().default_promotion());
    candidates
        .into_iter()
        .find(|m| m.promotion == Some(wanted))
        .ok_or(MoveKind::Illegal)
}

/// Classify dropping `piece` from holdings onto `to`.
#[must_use]
pub fn classify_drop(pos: &Position, flags: PositionFlags, piece: Piece, to: Square) -> MoveKind {
    match find_legal_drop(pos, flags, piece, to) {
        Ok(mv) => mv.kind,
        Err(verdict) => verdict,
    }
}

/// Like [`classify_drop`], but hands back the drop itself.
///
/// Bughouse drops are not checked against holdings since the partner
/// board supplies pieces the referee may not know about yet.
pub fn find_legal_drop(
    pos: &Position,
    flags: PositionFlags,
    piece: Piece,
    to: Square,
) -> Result<Move, MoveKind> {
    let variant = pos.variant();
    let side = flags.side_to_move();
    if !variant.has_drops() || !pos.contains(to) || pos.get(to).is_some() {
        return Err(MoveKind::Impossible);
    }
    if pos.holdings(side).count(piece) == 0 && !variant.unchecked_drops() {
        return Err(MoveKind::Impossible);
    }
    let height = pos.dimensions().height;
    if piece == Piece::Pawn && (to.0 == 0 || to.0 + 1 == height) {
        return Err(MoveKind::Illegal);
    }
    let mv = Move::drop(side, piece, to);
    if !flags.contains(PositionFlags::IGNORE_CHECK) {
        let mut scratch = pos.clone();
        if checks_after(&mut scratch, flags, Some(&mv)) > 0 {
            return Err(MoveKind::Illegal);
        }
    }
    Ok(mv)
}

/// Check, checkmate or stalemate for the side named by `flags`.
#[must_use]
pub fn mate_test(pos: &Position, flags: PositionFlags, ep: EpFile) -> MateStatus {
    let (moves, in_check) = generate_legal(pos, flags, ep);
    match (moves.is_empty(), in_check) {
        (false, false) => MateStatus::None,
        (false, true) => MateStatus::Check,
        (true, true) => MateStatus::Checkmate,
        (true, false) => MateStatus::Stalemate,
    }
}
