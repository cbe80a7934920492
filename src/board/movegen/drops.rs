use super::Generator;
use crate::board::{Move, Piece, Square};

impl Generator<'_> {
    /// Drops of every held piece kind onto every empty square.
    ///
    /// Pawns are never dropped on the first or last rank.
    pub(crate) fn drop_moves(&mut self) {
        let held: Vec<Piece> = self
            .pos
            .holdings(self.side)
            .iter()
            .map(|(piece, _)| piece)
            .collect();
        let dims = self.pos.dimensions();
        for piece in held {
            for rank in 0..dims.height {
                if piece == Piece::Pawn && (rank == 0 || rank + 1 == dims.height) {
                    continue;
                }
                for file in 0..dims.width {
                    let to = Square(rank, file);
                    if self.pos.get(to).is_none() {
                        self.moves.push(Move::drop(self.side, piece, to));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::board::{generate_pseudo_legal, Color, Piece, Position, Variant};

    #[test]
    fn test_drops_fill_empty_squares() {
        let mut pos =
            Position::try_from_fen(Variant::Crazyhouse, "4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        pos.holdings_mut(Color::White).add(Piece::Knight);
        let drops = generate_pseudo_legal(&pos, pos.flags(), pos.ep_file())
            .iter()
            .filter(|m| m.is_drop())
            .count();
        assert_eq!(drops, 62);
    }

    #[test]
    fn test_pawn_drops_skip_edge_ranks() {
        let mut pos =
            Position::try_from_fen(Variant::Crazyhouse, "4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        pos.holdings_mut(Color::White).add(Piece::Pawn);
        let moves = generate_pseudo_legal(&pos, pos.flags(), pos.ep_file());
        assert_eq!(moves.iter().filter(|m| m.is_drop()).count(), 48);
        assert!(moves.iter().all(|m| !m.is_drop() || (m.to.0 != 0 && m.to.0 != 7)));
    }

    #[test]
    fn test_no_drops_without_holdings() {
        let pos = Position::start(Variant::Crazyhouse);
        let moves = generate_pseudo_legal(&pos, pos.flags(), pos.ep_file());
        assert!(moves.iter().all(|m| !m.is_drop()));
    }
}
