//! FEN reading and writing for every board size.
//!
//! Extensions over orthodox FEN: holdings in brackets after the placement
//! (`.../RNBQKBNR[Qn]`), a `~` after promoted pieces, two-digit empty runs on
//! wide boards, and Shredder-style file letters for shuffle-variant castling.

use super::error::FenError;
use super::state::{EpFile, Position};
use super::variant::{CastlingStyle, Variant};
use super::{parse_square_prefix, CastlingRights, Color, Occupant, Piece, Square};

/// Fill `pos` from the placement field (optionally carrying holdings).
pub(crate) fn parse_placement(pos: &mut Position, field: &str) -> Result<(), FenError> {
    let (board_part, holdings_part) = match field.find('[') {
        Some(open) => (&field[..open], Some(field[open + 1..].trim_end_matches(']'))),
        None => (field, None),
    };
    let dims = pos.dims;
    let rows: Vec<&str> = board_part.split('/').collect();
    if rows.len() != dims.height {
        return Err(FenError::RankCount {
            expected: dims.height,
            found: rows.len(),
        });
    }
    for (row_idx, row) in rows.iter().enumerate() {
        let rank = dims.height - 1 - row_idx;
        let mut file = 0;
        let mut run = 0usize;
        let mut last: Option<Square> = None;
        for c in row.chars() {
            if let Some(d) = c.to_digit(10) {
                run = run * 10 + d as usize;
                continue;
            }
            file += run;
            run = 0;
            if c == '~' {
                if let Some(sq) = last {
                    if let Some(mut occ) = pos.get(sq) {
                        occ.promoted = true;
                        pos.set(sq, Some(occ));
                    }
                }
                continue;
            }
            let occ = Occupant::from_fen_char(c).ok_or(FenError::InvalidPiece { char: c })?;
            if file >= dims.width {
                return Err(FenError::RankWidth {
                    rank: rank + 1,
                    files: file + 1,
                    expected: dims.width,
                });
            }
            pos.set(Square(rank, file), Some(occ));
            last = Some(Square(rank, file));
            file += 1;
        }
        file += run;
        if file != dims.width {
            return Err(FenError::RankWidth {
                rank: rank + 1,
                files: file,
                expected: dims.width,
            });
        }
    }
    if let Some(held) = holdings_part {
        for c in held.chars().filter(|&c| c != '-') {
            let occ = Occupant::from_fen_char(c).ok_or(FenError::InvalidHoldings { char: c })?;
            pos.holdings_mut(occ.color).add(occ.piece);
        }
    }
    Ok(())
}

fn parse_castling(pos: &Position, field: &str) -> Result<CastlingRights, FenError> {
    let derived = pos.derive_castling_rights();
    let mut rights = CastlingRights::none();
    if field == "-" {
        return Ok(rights);
    }
    let width = pos.dims.width;
    for c in field.chars() {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let king_file = pos
            .find_king(color)
            .filter(|sq| sq.0 == color.back_rank(pos.dims.height))
            .map(|sq| sq.1);
        let Some(kf) = king_file else { continue };
        let side = rights.side_mut(color);
        match c.to_ascii_lowercase() {
            'k' => side.h_rook = derived.side(color).h_rook.or(Some(width - 1)),
            'q' => side.a_rook = derived.side(color).a_rook.or(Some(0)),
            f @ 'a'..='p' => {
                let file = (f as u8 - b'a') as usize;
                if file >= width {
                    return Err(FenError::InvalidCastling { char: c });
                }
                if file > kf {
                    side.h_rook = Some(file);
                } else {
                    side.a_rook = Some(file);
                }
            }
            _ => return Err(FenError::InvalidCastling { char: c }),
        }
        side.king_file = Some(kf);
    }
    Ok(rights)
}

impl Position {
    /// Parse a position from FEN notation for the given variant.
    ///
    /// Only placement and side to move are required.
    pub fn try_from_fen(variant: Variant, fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 2 {
            return Err(FenError::TooFewParts { found: parts.len() });
        }
        let mut pos = Position::empty(variant);
        parse_placement(&mut pos, parts[0])?;

        pos.side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(FenError::InvalidSideToMove {
                    found: other.to_string(),
                })
            }
        };

        if let Some(field) = parts.get(2) {
            if variant.castling_style() != CastlingStyle::Forbidden {
                pos.castling = parse_castling(&pos, field)?;
            }
        }

        pos.ep = match parts.get(3) {
            None | Some(&"-") => EpFile::None,
            Some(field) => match parse_square_prefix(field) {
                Some((sq, used)) if used == field.len() && sq.1 < pos.dims.width => {
                    EpFile::File(sq.1)
                }
                _ => {
                    return Err(FenError::InvalidEnPassant {
                        found: (*field).to_string(),
                    })
                }
            },
        };

        pos.halfmove_clock = parts.get(4).and_then(|v| v.parse().ok()).unwrap_or(0);
        pos.fullmove_number = parts.get(5).and_then(|v| v.parse().ok()).unwrap_or(1);
        Ok(pos)
    }

    /// Convert the position to FEN notation.
    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut rows: Vec<String> = Vec::with_capacity(self.dims.height);
        for rank in (0..self.dims.height).rev() {
            let mut row = String::new();
            let mut empty = 0;
            for file in 0..self.dims.width {
                match self.get(Square(rank, file)) {
                    Some(occ) => {
                        if empty > 0 {
                            row.push_str(&empty.to_string());
                            empty = 0;
                        }
                        row.push(occ.to_fen_char());
                        if occ.promoted && self.variant.has_drops() {
                            row.push('~');
                        }
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                row.push_str(&empty.to_string());
            }
            rows.push(row);
        }
        let mut placement = rows.join("/");
        if self.variant.has_drops() {
            placement.push('[');
            for color in Color::BOTH {
                for (piece, n) in self.holdings(color).iter() {
                    for _ in 0..n {
                        placement.push(piece.to_fen_char(color));
                    }
                }
            }
            placement.push(']');
        }

        let active = if self.side_to_move == Color::White { "w" } else { "b" };
        let castling = self.castling_field();
        let ep = match self.ep {
            EpFile::File(f) => {
                let rank = match self.side_to_move {
                    Color::White => self.dims.height - 3,
                    Color::Black => 2,
                };
                Square(rank, f).to_string()
            }
            EpFile::None | EpFile::Unknown => "-".to_string(),
        };
        format!(
            "{placement} {active} {castling} {ep} {} {}",
            self.halfmove_clock, self.fullmove_number
        )
    }

    fn castling_field(&self) -> String {
        let width = self.dims.width;
        let shredder = self.variant.castling_style() == CastlingStyle::KingTakesRook;
        let mut field = String::new();
        for color in Color::BOTH {
            let side = self.castling.side(color);
            if side.king_file.is_none() {
                continue;
            }
            let wings = [(side.h_rook, width - 1, 'k'), (side.a_rook, 0, 'q')];
            for (rook, corner, letter) in wings {
                let Some(file) = rook else { continue };
                let c = if shredder || file != corner {
                    Square::file_char(file)
                } else {
                    letter
                };
                field.push(if color == Color::White {
                    c.to_ascii_uppercase()
                } else {
                    c
                });
            }
        }
        if field.is_empty() {
            field.push('-');
        }
        field
    }

    /// Count of a piece kind on the board for one side (used by FEN consumers and tests)
    #[must_use]
    pub fn count_pieces(&self, color: Color, piece: Piece) -> usize {
        self.pieces(color).filter(|(_, o)| o.piece == piece).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_start_fen_matches_start_position() {
        let pos = Position::try_from_fen(Variant::Normal, START).unwrap();
        assert_eq!(pos, Position::start(Variant::Normal));
        assert_eq!(pos.to_fen(), START);
    }

    #[test]
    fn test_en_passant_field() {
        let fen = "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3";
        let pos = Position::try_from_fen(Variant::Normal, fen).unwrap();
        assert_eq!(pos.ep_file(), EpFile::File(3));
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn test_wide_board_round_trip() {
        let pos = Position::start(Variant::Capablanca);
        let fen = pos.to_fen();
        assert!(fen.starts_with("rnabqkbcnr/pppppppppp/10/"));
        assert_eq!(Position::try_from_fen(Variant::Capablanca, &fen).unwrap(), pos);
    }

    #[test]
    fn test_xiangqi_ten_ranks() {
        let pos = Position::start(Variant::Xiangqi);
        let fen = pos.to_fen();
        assert_eq!(fen.split(' ').next().unwrap().split('/').count(), 10);
        assert_eq!(Position::try_from_fen(Variant::Xiangqi, &fen).unwrap(), pos);
    }

    #[test]
    fn test_holdings_and_promoted_marker() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNQ~[Nn] w Qkq - 0 1";
        let pos = Position::try_from_fen(Variant::Crazyhouse, fen).unwrap();
        assert_eq!(pos.holdings(Color::White).count(Piece::Knight), 1);
        assert_eq!(pos.holdings(Color::Black).count(Piece::Knight), 1);
        assert!(pos.get(Square(0, 7)).unwrap().promoted);
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn test_shredder_castling() {
        let fen = "bqnbrkrn/pppppppp/8/8/8/8/PPPPPPPP/BQNBRKRN w GEge - 0 1";
        let pos = Position::try_from_fen(Variant::FischerRandom, fen).unwrap();
        assert_eq!(pos.castling().side(Color::White).h_rook, Some(6));
        assert_eq!(pos.castling().side(Color::White).a_rook, Some(4));
        assert_eq!(pos.castling().side(Color::Black).king_file, Some(5));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Position::try_from_fen(Variant::Normal, "8/8 w"),
            Err(FenError::RankCount { .. })
        ));
        assert!(matches!(
            Position::try_from_fen(Variant::Normal, "9/8/8/8/8/8/8/8 w"),
            Err(FenError::RankWidth { .. })
        ));
        assert!(matches!(
            Position::try_from_fen(Variant::Normal, "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x"),
            Err(FenError::InvalidSideToMove { .. })
        ));
        assert!(matches!(
            Position::try_from_fen(Variant::Normal, "xnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w"),
            Err(FenError::InvalidPiece { char: 'x' })
        ));
    }
}
