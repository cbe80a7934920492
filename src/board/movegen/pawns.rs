use super::leapers::on_own_side;
use super::{Contents, Generator};
use crate::board::flags::PositionFlags;
use crate::board::{Color, Move, MoveKind, Piece, Square};

impl Generator<'_> {
    pub(crate) fn pawn_moves(&mut self, from: Square) {
        let variant = self.pos.variant();
        if variant.is_xiangqi() {
            self.soldier_moves(from);
        } else if variant.berolina_pawns() {
            self.berolina_moves(from);
        } else {
            self.orthodox_pawn_moves(from);
        }
    }

    /// Rank index counted from the mover's own edge
    fn relative_rank(&self, sq: Square) -> usize {
        match self.side {
            Color::White => sq.0,
            Color::Black => self.pos.dimensions().height - 1 - sq.0,
        }
    }

    fn may_double_step(&self, from: Square) -> bool {
        self.pos.variant().has_double_step()
            && self.relative_rank(from) <= (self.pos.dimensions().height >> 1).saturating_sub(3)
    }

    fn in_promotion_zone(&self, sq: Square) -> bool {
        let variant = self.pos.variant();
        !variant.promotion_pieces().is_empty()
            && self.relative_rank(sq) + variant.promotion_depth() >= self.pos.dimensions().height
    }

    /// Push a pawn move, fanning out into one move per promotion piece
    fn push_pawn(&mut self, from: Square, to: Square, captured: Option<Piece>) {
        let kind = if captured.is_some() {
            MoveKind::Capture
        } else {
            MoveKind::Normal
        };
        let base = Move::new(kind, self.side, Piece::Pawn, from, to);
        let base = match captured {
            Some(p) => base.with_capture(p),
            None => base,
        };
        if self.in_promotion_zone(to) {
            for &promo in self.pos.variant().promotion_pieces() {
                let mut mv = base.with_promotion(promo);
                mv.kind = MoveKind::Promotion;
                self.moves.push(mv);
            }
        } else {
            self.moves.push(base);
        }
    }

    fn orthodox_pawn_moves(&mut self, from: Square) {
        let fwd = self.side.forward();
        if let Some(one) = self.target(from, fwd, 0) {
            if self.contents(one) == Contents::Empty {
                self.push_pawn(from, one, None);
                if self.may_double_step(from) {
                    if let Some(two) = self.target(from, 2 * fwd, 0) {
                        if self.contents(two) == Contents::Empty {
                            self.push_pawn(from, two, None);
                        }
                    }
                }
            }
        }
        for df in [-1, 1] {
            let Some(to) = self.target(from, fwd, df) else { continue };
            match self.contents(to) {
                Contents::Enemy(captured) => self.push_pawn(from, to, Some(captured)),
                Contents::Empty => {
                    if self.is_en_passant(from, to) {
                        self.moves.push(
                            Move::new(MoveKind::EnPassant, self.side, Piece::Pawn, from, to)
                                .with_capture(Piece::Pawn),
                        );
                    } else if self.flags.contains(PositionFlags::KRIEGSPIEL_CAPTURE) {
                        self.push_pawn(from, to, None);
                    }
                }
                Contents::Own => {}
            }
        }
    }

    /// En passant onto the empty square `to`, past an enemy pawn beside `from`
    fn is_en_passant(&self, from: Square, to: Square) -> bool {
        let height = self.pos.dimensions().height;
        if self.relative_rank(from) != height - 4 || !self.ep.allows(to.1) {
            return false;
        }
        let victim = Square(from.0, to.1);
        matches!(self.contents(victim), Contents::Enemy(Piece::Pawn))
    }

    /// Berolina pawns move diagonally and capture straight ahead
    fn berolina_moves(&mut self, from: Square) {
        let fwd = self.side.forward();
        for df in [-1, 1] {
            let Some(one) = self.target(from, fwd, df) else { continue };
            if self.contents(one) != Contents::Empty {
                continue;
            }
            self.push_pawn(from, one, None);
            if self.may_double_step(from) {
                if let Some(two) = self.target(from, 2 * fwd, 2 * df) {
                    if self.contents(two) == Contents::Empty {
                        self.push_pawn(from, two, None);
                    }
                }
            }
        }
        if let Some(to) = self.target(from, fwd, 0) {
            if let Contents::Enemy(captured) = self.contents(to) {
                self.push_pawn(from, to, Some(captured));
            }
        }
    }

    /// Xiangqi soldier: forward, and sideways once across the river; never promotes
    fn soldier_moves(&mut self, from: Square) {
        let fwd = self.side.forward();
        let height = self.pos.dimensions().height;
        let mut steps = vec![(fwd, 0)];
        if !on_own_side(self.side, from, height) {
            steps.extend([(0, -1), (0, 1)]);
        }
        self.step(from, &steps);
    }
}

#[cfg(test)]
mod tests {
    use crate::board::{generate_pseudo_legal, EpFile, MoveKind, Position, Square, Variant};

    fn pawn_moves(fen: &str, variant: Variant, ep: EpFile) -> Vec<(Square, Square, MoveKind)> {
        let pos = Position::try_from_fen(variant, fen).unwrap();
        generate_pseudo_legal(&pos, pos.flags(), ep)
            .iter()
            .filter(|m| m.piece == crate::board::Piece::Pawn)
            .map(|m| (m.from.unwrap(), m.to, m.kind))
            .collect()
    }

    #[test]
    fn test_en_passant_known_file() {
        let fen = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1";
        let moves = pawn_moves(fen, Variant::Normal, EpFile::File(3));
        assert!(moves.contains(&(Square(4, 4), Square(5, 3), MoveKind::EnPassant)));
        let moves = pawn_moves(fen, Variant::Normal, EpFile::None);
        assert!(!moves.iter().any(|m| m.2 == MoveKind::EnPassant));
    }

    #[test]
    fn test_en_passant_unknown_file_is_optimistic() {
        let fen = "4k3/8/8/2pPp3/8/8/8/4K3 w - - 0 1";
        let moves = pawn_moves(fen, Variant::Normal, EpFile::Unknown);
        let ep: Vec<_> = moves.iter().filter(|m| m.2 == MoveKind::EnPassant).collect();
        assert_eq!(ep.len(), 2);
    }

    #[test]
    fn test_promotion_fans_out() {
        let moves = pawn_moves("4k3/P7/8/8/8/8/8/4K3 w - - 0 1", Variant::Normal, EpFile::None);
        assert_eq!(moves.len(), 4);
        assert!(moves.iter().all(|m| m.2 == MoveKind::Promotion));
    }

    #[test]
    fn test_no_double_step_in_shatranj() {
        let moves = pawn_moves("k7/8/8/8/8/8/4P3/K7 w - - 0 1", Variant::Shatranj, EpFile::None);
        assert_eq!(moves.len(), 1);
    }

    #[test]
    fn test_makruk_promotes_on_sixth_rank() {
        let moves = pawn_moves("k7/8/8/4P3/8/8/8/K7 w - - 0 1", Variant::Makruk, EpFile::None);
        assert_eq!(moves, vec![(Square(4, 4), Square(5, 4), MoveKind::Promotion)]);
    }

    #[test]
    fn test_berolina_geometry() {
        let moves = pawn_moves("k7/8/8/8/8/3p4/3P4/K7 w - - 0 1", Variant::Berolina, EpFile::None);
        let targets: Vec<Square> = moves.iter().map(|m| m.1).collect();
        for sq in [Square(2, 2), Square(3, 1), Square(2, 4), Square(3, 5)] {
            assert!(targets.contains(&sq));
        }
        assert!(moves.contains(&(Square(1, 3), Square(2, 3), MoveKind::Capture)));

        let blocked = pawn_moves("k7/8/8/8/8/4p3/3P4/K7 w - - 0 1", Variant::Berolina, EpFile::None);
        let targets: Vec<Square> = blocked.iter().map(|m| m.1).collect();
        assert!(!targets.contains(&Square(2, 4)));
        assert!(!targets.contains(&Square(3, 5)));
    }

    #[test]
    fn test_soldier_crosses_river() {
        let fen = "4k4/9/9/9/4P4/9/9/9/9/4K4 w - - 0 1";
        let moves = pawn_moves(fen, Variant::Xiangqi, EpFile::None);
        assert_eq!(moves.len(), 3);
    }
}
