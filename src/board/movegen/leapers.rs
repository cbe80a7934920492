use super::{Contents, Generator, DIAGONALS, KNIGHT_JUMPS, ORTHOGONALS};
use crate::board::{Color, Square};

/// Palace files of a 9-file xiangqi board
const PALACE_FILES: std::ops::RangeInclusive<usize> = 3..=5;

impl Generator<'_> {
    /// Single steps in each of the given directions
    pub(crate) fn step(&mut self, from: Square, dirs: &[(isize, isize)]) {
        for &(dr, df) in dirs {
            if let Some(to) = self.target(from, dr, df) {
                self.push_to(from, to);
            }
        }
    }

    pub(crate) fn knight_moves(&mut self, from: Square) {
        self.step(from, &KNIGHT_JUMPS);
    }

    pub(crate) fn king_step_moves(&mut self, from: Square) {
        self.step(from, &ORTHOGONALS);
        self.step(from, &DIAGONALS);
    }

    /// Makruk khon: one step forward or one step diagonally
    pub(crate) fn silver_moves(&mut self, from: Square) {
        let fwd = self.side.forward();
        self.step(from, &[(fwd, 0)]);
        self.step(from, &DIAGONALS);
    }

    /// Alfil jump; outside shatranj-like variants it may also step like a ferz
    pub(crate) fn alfil_moves(&mut self, from: Square) {
        self.step(from, &[(2, 2), (2, -2), (-2, 2), (-2, -2)]);
        if self.pos.variant().alfil_steps() {
            self.step(from, &DIAGONALS);
        }
    }

    /// Xiangqi horse: the orthogonal leg next to the horse must be empty
    pub(crate) fn horse_moves(&mut self, from: Square) {
        for (dr, df) in KNIGHT_JUMPS {
            let leg = if dr.abs() == 2 { (dr / 2, 0) } else { (0, df / 2) };
            let blocked = match self.target(from, leg.0, leg.1) {
                Some(sq) => self.contents(sq) != Contents::Empty,
                None => true,
            };
            if blocked {
                continue;
            }
            if let Some(to) = self.target(from, dr, df) {
                self.push_to(from, to);
            }
        }
    }

    /// Xiangqi elephant: blocked at the eye, never crosses the river
    pub(crate) fn elephant_moves(&mut self, from: Square) {
        for (dr, df) in DIAGONALS {
            let Some(eye) = self.target(from, dr, df) else { continue };
            if self.contents(eye) != Contents::Empty {
                continue;
            }
            let Some(to) = self.target(from, 2 * dr, 2 * df) else { continue };
            if on_own_side(self.side, to, self.pos.dimensions().height) {
                self.push_to(from, to);
            }
        }
    }

    /// Xiangqi advisor: ferz steps inside the palace
    pub(crate) fn advisor_moves(&mut self, from: Square) {
        self.palace_steps(from, &DIAGONALS);
    }

    /// Xiangqi general: wazir steps inside the palace
    pub(crate) fn general_moves(&mut self, from: Square) {
        self.palace_steps(from, &ORTHOGONALS);
    }

    fn palace_steps(&mut self, from: Square, dirs: &[(isize, isize)]) {
        let height = self.pos.dimensions().height;
        for &(dr, df) in dirs {
            if let Some(to) = self.target(from, dr, df) {
                if in_palace(self.side, to, height) {
                    self.push_to(from, to);
                }
            }
        }
    }
}

/// Square lies in `side`'s half of the board (xiangqi river rule)
pub(crate) fn on_own_side(side: Color, sq: Square, height: usize) -> bool {
    match side {
        Color::White => sq.0 < height / 2,
        Color::Black => sq.0 >= height / 2,
    }
}

/// Square lies in `side`'s palace
pub(crate) fn in_palace(side: Color, sq: Square, height: usize) -> bool {
    let ranks_ok = match side {
        Color::White => sq.0 <= 2,
        Color::Black => sq.0 + 3 >= height,
    };
    ranks_ok && PALACE_FILES.contains(&sq.1)
}

#[cfg(test)]
mod tests {
    use crate::board::{generate_pseudo_legal, Position, Square, Variant};

    fn targets(pos: &Position, from: Square) -> Vec<Square> {
        let mut t: Vec<Square> = generate_pseudo_legal(pos, pos.flags(), pos.ep_file())
            .iter()
            .filter(|m| m.from == Some(from))
            .map(|m| m.to)
            .collect();
        t.sort();
        t
    }

    #[test]
    fn test_shatranj_alfil_only_jumps() {
        let pos = Position::try_from_fen(Variant::Shatranj, "k7/8/8/8/3E4/8/8/7K w - - 0 1").unwrap();
        assert_eq!(targets(&pos, Square(3, 3)).len(), 4);
        let pos = Position::try_from_fen(Variant::Fairy, "k7/8/8/8/3E4/8/8/7K w - - 0 1").unwrap();
        assert_eq!(targets(&pos, Square(3, 3)).len(), 8);
    }

    #[test]
    fn test_xiangqi_horse_leg_blocks() {
        let start = Position::start(Variant::Xiangqi);
        // Horse on b1 has its leg at b2 free and c1 blocked by the elephant
        assert_eq!(targets(&start, Square(0, 1)), vec![Square(2, 0), Square(2, 2)]);
    }

    #[test]
    fn test_xiangqi_general_confined_to_palace() {
        let start = Position::start(Variant::Xiangqi);
        assert_eq!(targets(&start, Square(0, 4)), vec![Square(1, 4)]);
    }

    #[test]
    fn test_knightmate_king_jumps() {
        let pos = Position::try_from_fen(Variant::Knightmate, "k7/8/8/8/3K4/8/8/8 w - - 0 1").unwrap();
        assert_eq!(targets(&pos, Square(3, 3)).len(), 8);
        assert!(targets(&pos, Square(3, 3)).contains(&Square(5, 4)));
    }

    #[test]
    fn test_makruk_khon_moves() {
        let pos = Position::try_from_fen(Variant::Makruk, "k7/8/8/8/3M4/8/8/7K w - - 0 1").unwrap();
        assert_eq!(
            targets(&pos, Square(3, 3)),
            vec![Square(2, 2), Square(2, 4), Square(4, 2), Square(4, 3), Square(4, 4)]
        );
    }
}
