//! Game-end rules: mate, stalemate and the variant-specific endings.

use super::flags::PositionFlags;
use super::legality::{mate_test, MateStatus};
use super::state::{EpFile, Position};
use super::variant::{BareKingRule, StalematePolicy};
use super::{Color, Piece};
use crate::result::GameResult;

/// Decide whether the game is over in `pos` with the side named by `flags` to move.
///
/// Returns the result and a detail string suitable for `result 1-0 {...}`,
/// or `None` when play continues.
#[must_use]
pub fn evaluate_end(pos: &Position, flags: PositionFlags, ep: EpFile) -> Option<(GameResult, String)> {
    let variant = pos.variant();
    let side = flags.side_to_move();
    let other = side.opponent();
    let end = |result: GameResult, detail: &str| Some((result, detail.to_string()));

    if variant.is_atomic() && pos.find_king(side).is_none() {
        return end(GameResult::win_for(other), "King exploded");
    }
    if let Some(needed) = variant.checks_to_win() {
        for color in [other, side] {
            if pos.checks_given(color) >= needed {
                return end(GameResult::win_for(color), "Three checks");
            }
        }
    }

    let mine = pos.piece_count(side);
    let theirs = pos.piece_count(other);
    match variant.bare_king_rule() {
        BareKingRule::Ignored => {}
        // the side to move had its chance to bare the opponent in reply
        BareKingRule::Loses if is_bare(pos, other) => {
            return if mine > 1 {
                end(GameResult::win_for(side), "Bare king")
            } else {
                end(GameResult::Draw, "Bare kings")
            };
        }
        BareKingRule::Loses => {}
        BareKingRule::Wins => {
            for color in [side, other] {
                if is_bare(pos, color) {
                    return end(GameResult::win_for(color), "Bare king");
                }
            }
        }
    }

    match mate_test(pos, flags, ep) {
        MateStatus::None | MateStatus::Check => None,
        MateStatus::Checkmate if variant.mated_side_wins() => end(GameResult::win_for(side), "Trickmate"),
        MateStatus::Checkmate => match other {
            Color::White => end(GameResult::WhiteWins, "White mates"),
            Color::Black => end(GameResult::BlackWins, "Black mates"),
        },
        MateStatus::Stalemate => match variant.stalemate_policy() {
            StalematePolicy::Draw => end(GameResult::Draw, "Stalemate"),
            StalematePolicy::MoverLoses => {
                end(GameResult::win_for(other), "Xboard adjudication: stalemate loss")
            }
            StalematePolicy::MoverWins if variant.mated_side_wins() => {
                end(GameResult::win_for(side), "Stealmate")
            }
            StalematePolicy::MoverWins => {
                end(GameResult::win_for(side), "Xboard adjudication: stalemate win")
            }
            StalematePolicy::PieceCount => match mine.cmp(&theirs) {
                std::cmp::Ordering::Less => end(GameResult::win_for(side), "Stalemate: fewer pieces"),
                std::cmp::Ordering::Greater => {
                    end(GameResult::win_for(other), "Stalemate: fewer pieces")
                }
                std::cmp::Ordering::Equal => end(GameResult::Draw, "Stalemate: equal pieces"),
            },
        },
    }
}

/// Only the king is left
fn is_bare(pos: &Position, color: Color) -> bool {
    let mut pieces = pos.pieces(color);
    matches!(
        (pieces.next(), pieces.next()),
        (Some((_, occ)), None) if occ.piece == Piece::King
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Variant;

    fn outcome(variant: Variant, fen: &str) -> Option<(GameResult, String)> {
        let p = Position::try_from_fen(variant, fen).unwrap();
        evaluate_end(&p, p.flags(), p.ep_file())
    }

    #[test]
    fn test_ongoing_game() {
        let p = Position::start(Variant::Normal);
        assert_eq!(evaluate_end(&p, p.flags(), p.ep_file()), None);
    }

    #[test]
    fn test_checkmate_and_stalemate() {
        let (result, detail) = outcome(Variant::Normal, "R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
        assert_eq!(result, GameResult::WhiteWins);
        assert_eq!(detail, "White mates");
        let (result, detail) = outcome(Variant::Normal, "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(result, GameResult::Draw);
        assert_eq!(detail, "Stalemate");
    }

    #[test]
    fn test_stalemate_policies() {
        assert_eq!(
            outcome(Variant::Shatranj, "k7/8/1KN5/8/8/8/8/8 b - - 0 1").map(|(r, _)| r),
            Some(GameResult::WhiteWins)
        );
        let (result, detail) = outcome(Variant::Losers, "7k/5Q1p/7P/8/8/8/8/K7 b - - 0 1").unwrap();
        assert_eq!(result, GameResult::BlackWins);
        assert_eq!(detail, "Stealmate");
    }

    #[test]
    fn test_losers_trickmate() {
        let (result, detail) = outcome(Variant::Losers, "R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
        assert_eq!(result, GameResult::BlackWins);
        assert_eq!(detail, "Trickmate");
    }

    #[test]
    fn test_atomic_exploded_king() {
        let (result, detail) = outcome(Variant::Atomic, "8/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(result, GameResult::WhiteWins);
        assert_eq!(detail, "King exploded");
    }

    #[test]
    fn test_three_checks() {
        let mut p = Position::try_from_fen(Variant::ThreeCheck, "4k3/8/8/8/8/8/8/R3K3 b - - 0 1").unwrap();
        p.checks_given[Color::White.index()] = 3;
        let (result, _) = evaluate_end(&p, p.flags(), p.ep_file()).unwrap();
        assert_eq!(result, GameResult::WhiteWins);
    }

    #[test]
    fn test_shatranj_bare_king() {
        // Black just lost its last piece; White still has the rook
        let (result, _) = outcome(Variant::Shatranj, "4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        assert_eq!(result, GameResult::WhiteWins);
        let (result, _) = outcome(Variant::Shatranj, "4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(result, GameResult::Draw);
    }

    #[test]
    fn test_suicide_piece_count() {
        // Black to move, no moves, fewer pieces
        let (result, _) = outcome(Variant::Suicide, "8/8/8/8/8/p7/P7/N7 b - - 0 1").unwrap();
        assert_eq!(result, GameResult::BlackWins);
    }
}
