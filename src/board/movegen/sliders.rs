use super::{Contents, Generator, KNIGHT_JUMPS, ORTHOGONALS};
use crate::board::{Move, MoveKind, Piece, Square};

impl Generator<'_> {
    /// Slide along each direction until blocked, capturing the first enemy piece
    pub(crate) fn slide(&mut self, from: Square, dirs: &[(isize, isize)]) {
        for &(dr, df) in dirs {
            self.ride(from, dr, df);
        }
    }

    fn ride(&mut self, from: Square, dr: isize, df: isize) {
        let mut cur = from;
        while let Some(to) = self.target(cur, dr, df) {
            if !self.push_to(from, to) {
                break;
            }
            cur = to;
        }
    }

    /// Repeated knight leaps in a fixed direction
    pub(crate) fn nightrider_moves(&mut self, from: Square) {
        for (dr, df) in KNIGHT_JUMPS {
            self.ride(from, dr, df);
        }
    }

    /// Rook moves without capturing; captures by jumping exactly one screen
    pub(crate) fn cannon_moves(&mut self, from: Square) {
        for (dr, df) in ORTHOGONALS {
            let mut cur = from;
            let mut screened = false;
            while let Some(to) = self.target(cur, dr, df) {
                cur = to;
                match (screened, self.contents(to)) {
                    (false, Contents::Empty) => {
                        self.moves
                            .push(Move::new(MoveKind::Normal, self.side, Piece::Cannon, from, to));
                    }
                    (false, _) => screened = true,
                    (true, Contents::Empty) => {}
                    (true, Contents::Enemy(captured)) => {
                        self.moves.push(
                            Move::new(MoveKind::Capture, self.side, Piece::Cannon, from, to)
                                .with_capture(captured),
                        );
                        break;
                    }
                    (true, Contents::Own) => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::board::{generate_pseudo_legal, MoveKind, Position, Square, Variant};

    #[test]
    fn test_cannon_needs_screen_to_capture() {
        let pos = Position::try_from_fen(Variant::Fairy, "k7/8/8/3p4/8/3P4/8/3O3K w - - 0 1").unwrap();
        let moves = generate_pseudo_legal(&pos, pos.flags(), pos.ep_file());
        let cannon: Vec<_> = moves.iter().filter(|m| m.from == Some(Square(0, 3))).collect();
        assert!(cannon
            .iter()
            .any(|m| m.to == Square(4, 3) && m.kind == MoveKind::Capture));
        assert!(!cannon.iter().any(|m| m.to == Square(2, 3)));
        assert!(cannon.iter().any(|m| m.to == Square(1, 3)));
    }

    #[test]
    fn test_nightrider_rides() {
        let pos = Position::try_from_fen(Variant::Fairy, "k7/8/8/8/8/8/8/H6K w - - 0 1").unwrap();
        let moves = generate_pseudo_legal(&pos, pos.flags(), pos.ep_file());
        let targets: Vec<Square> = moves
            .iter()
            .filter(|m| m.from == Some(Square(0, 0)))
            .map(|m| m.to)
            .collect();
        assert!(targets.contains(&Square(1, 2)));
        assert!(targets.contains(&Square(2, 4)));
        assert!(targets.contains(&Square(3, 6)));
        assert!(targets.contains(&Square(6, 3)));
    }
}
