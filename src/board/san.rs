//! Move notation.
//!
//! Output is short algebraic notation ("e4", "Nbd7", "exd6", "e8=Q#",
//! "O-O", "N@f3"). Input is anything an engine, a server or a user is likely
//! to send: coordinates ("e2e4", "e7e8q", "e1h1"), SAN, drops, castling in
//! either letter style, and game-end tokens.
//!
//! # Examples
//! ```
//! use referee::board::{parse_move, to_algebraic, Position, Variant};
//!
//! let pos = Position::start(Variant::Normal);
//! let mv = parse_move(&pos, pos.flags(), pos.ep_file(), "Nf3").unwrap();
//! let (_, san) = to_algebraic(&pos, pos.flags(), pos.ep_file(), &mv);
//! assert_eq!(san, "Nf3");
//! ```

use std::fmt;

use super::apply::apply_move;
use super::disambiguate::{disambiguate, Disambiguation, PartialMove};
use super::error::NotationError;
use super::flags::PositionFlags;
use super::legality::{
    classify, classify_drop, find_legal, find_legal_drop, generate_legal, mate_test, MateStatus,
};
use super::state::{EpFile, Position};
use super::{parse_square_prefix, Move, MoveKind, Piece, Square};
use crate::result::GameResult;

/// A move as written, before it is checked against a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveToken {
    /// Short algebraic notation, possibly partial
    Board(PartialMove),
    /// Both squares given, as engines write moves
    Coordinate {
        from: Square,
        to: Square,
        promotion: Option<char>,
    },
    Drop {
        piece: Piece,
        to: Square,
    },
    Castle {
        h_side: bool,
    },
    GameEnd(GameResult),
}

impl MoveToken {
    /// Parse a move token. Trailing check marks and annotations are ignored.
    pub fn parse(text: &str) -> Result<MoveToken, NotationError> {
        let raw = text.trim();
        let trimmed = raw.trim_end_matches(['+', '#', '!', '?']);
        if trimmed.is_empty() {
            return Err(NotationError::Empty);
        }
        let unparseable = || NotationError::Unparseable {
            notation: raw.to_string(),
        };
        if let Some(result) = GameResult::from_tag(trimmed) {
            return Ok(MoveToken::GameEnd(result));
        }
        match trimmed {
            "O-O" | "0-0" | "o-o" => return Ok(MoveToken::Castle { h_side: true }),
            "O-O-O" | "0-0-0" | "o-o-o" => return Ok(MoveToken::Castle { h_side: false }),
            _ => {}
        }

        if let Some((head, square)) = trimmed.split_once('@') {
            let mut letters = head.chars();
            let piece = match (letters.next(), letters.next()) {
                (Some(c), None) => Piece::from_char(c).ok_or_else(unparseable)?,
                _ => return Err(unparseable()),
            };
            let to: Square = square.parse().map_err(|_| unparseable())?;
            return Ok(MoveToken::Drop { piece, to });
        }

        let (piece, rest) = match trimmed.chars().next() {
            Some(c) if c.is_ascii_uppercase() => {
                (Some(Piece::from_char(c).ok_or_else(unparseable)?), &trimmed[1..])
            }
            _ => (None, trimmed),
        };
        let (body, promotion) = split_promotion(rest);

        let bytes = body.as_bytes();
        let mut from_file = None;
        let mut from_rank = None;
        let mut to: Option<Square> = None;
        let mut capture = false;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'x' | b':' => {
                    capture = true;
                    i += 1;
                }
                b'-' => i += 1,
                b'a'..=b'p' => match parse_square_prefix(&body[i..]) {
                    Some((sq, used)) => {
                        if let Some(prev) = to.replace(sq) {
                            from_file = Some(prev.1);
                            from_rank = Some(prev.0);
                        }
                        i += used;
                    }
                    None if to.is_none() => {
                        from_file = Some((bytes[i] - b'a') as usize);
                        i += 1;
                    }
                    None => return Err(unparseable()),
                },
                b'1'..=b'9' if to.is_none() => {
                    let digits = bytes[i..]
                        .iter()
                        .take(2)
                        .take_while(|b| b.is_ascii_digit())
                        .count();
                    let rank: usize = body[i..i + digits].parse().map_err(|_| unparseable())?;
                    from_rank = Some(rank - 1);
                    i += digits;
                }
                _ => return Err(unparseable()),
            }
        }
        let to = to.ok_or_else(unparseable)?;

        if let (None, Some(file), Some(rank)) = (piece, from_file, from_rank) {
            return Ok(MoveToken::Coordinate {
                from: Square(rank, file),
                to,
                promotion,
            });
        }
        let promotion = match promotion {
            None => None,
            Some(c) => Some(Piece::from_char(c).ok_or_else(unparseable)?),
        };
        Ok(MoveToken::Board(PartialMove {
            piece: Some(piece.unwrap_or(Piece::Pawn)),
            from_file,
            from_rank,
            to_file: Some(to.1),
            to_rank: Some(to.0),
            promotion,
            capture,
        }))
    }
}

/// Split "e8=Q" or "e7e8q" into the move part and the promotion letter.
fn split_promotion(text: &str) -> (&str, Option<char>) {
    if let Some(idx) = text.find('=') {
        return (&text[..idx], Some(text[idx + 1..].chars().next().unwrap_or('=')));
    }
    let mut tail = text.chars().rev();
    match (tail.next(), tail.next()) {
        (Some(last), Some(prev)) if last.is_ascii_alphabetic() && prev.is_ascii_digit() => {
            (&text[..text.len() - 1], Some(last))
        }
        _ => (text, None),
    }
}

impl fmt::Display for MoveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveToken::Board(spec) => {
                if let Some(piece) = spec.piece.filter(|&p| p != Piece::Pawn) {
                    write!(f, "{}", piece.san_char())?;
                }
                if let Some(file) = spec.from_file {
                    write!(f, "{}", Square::file_char(file))?;
                }
                if let Some(rank) = spec.from_rank {
                    write!(f, "{}", rank + 1)?;
                }
                if spec.capture {
                    f.write_str("x")?;
                }
                if let (Some(file), Some(rank)) = (spec.to_file, spec.to_rank) {
                    write!(f, "{}", Square(rank, file))?;
                }
                if let Some(promo) = spec.promotion {
                    write!(f, "={}", promo.san_char())?;
                }
                Ok(())
            }
            MoveToken::Coordinate {
                from,
                to,
                promotion,
            } => {
                write!(f, "{from}{to}")?;
                if let Some(c) = promotion {
                    write!(f, "{c}")?;
                }
                Ok(())
            }
            MoveToken::Drop { piece, to } => write!(f, "{}@{to}", piece.san_char()),
            MoveToken::Castle { h_side: true } => f.write_str("O-O"),
            MoveToken::Castle { h_side: false } => f.write_str("O-O-O"),
            MoveToken::GameEnd(result) => f.write_str(result.tag()),
        }
    }
}

/// Parse `text` and resolve it to a legal move.
pub fn parse_move(
    pos: &Position,
    flags: PositionFlags,
    ep: EpFile,
    text: &str,
) -> Result<Move, NotationError> {
    let token = MoveToken::parse(text)?;
    resolve_move(pos, flags, ep, &token)
}

/// Resolve a parsed token to the legal move it names.
pub fn resolve_move(
    pos: &Position,
    flags: PositionFlags,
    ep: EpFile,
    token: &MoveToken,
) -> Result<Move, NotationError> {
    let notation = token.to_string();
    let verdict = |kind: MoveKind| match kind {
        MoveKind::Impossible => NotationError::Impossible {
            notation: notation.clone(),
        },
        _ => NotationError::Illegal {
            notation: notation.clone(),
        },
    };
    match *token {
        MoveToken::GameEnd(_) => Err(NotationError::GameEnd {
            notation: notation.clone(),
        }),
        MoveToken::Coordinate {
            from,
            to,
            promotion,
        } => find_legal(pos, flags, ep, from, to, promotion).map_err(verdict),
        MoveToken::Drop { piece, to } => find_legal_drop(pos, flags, piece, to).map_err(verdict),
        MoveToken::Castle { h_side } => {
            let (legal, _) = generate_legal(pos, flags, ep);
            legal
                .iter()
                .find(|m| m.kind.is_castle() && m.kind.is_h_side_castle() == h_side)
                .copied()
                .ok_or_else(|| verdict(MoveKind::Illegal))
        }
        MoveToken::Board(mut spec) => {
            // a pawn written without a source file and without 'x' advances straight
            let straight_pawns = !pos.variant().berolina_pawns();
            if spec.piece == Some(Piece::Pawn) && spec.from_file.is_none() && !spec.capture && straight_pawns {
                spec.from_file = spec.to_file;
            }
            match disambiguate(pos, flags, ep, &spec) {
                Disambiguation::Unique(mv) => Ok(mv),
                Disambiguation::Ambiguous { count, .. } => Err(NotationError::Ambiguous {
                    notation: notation.clone(),
                    count,
                }),
                Disambiguation::Illegal(_) => Err(verdict(MoveKind::Illegal)),
                Disambiguation::Impossible => Err(verdict(MoveKind::Impossible)),
            }
        }
    }
}

/// Render `mv` in short algebraic notation and classify it.
///
/// Moves that are illegal only because they leave the king attacked keep
/// their short form; other illegal moves are written out in full, omitting
/// the source square when only one piece of that kind is on the board.
/// Legal moves get a `+` or `#` suffix.
pub fn to_algebraic(pos: &Position, flags: PositionFlags, ep: EpFile, mv: &Move) -> (MoveKind, String) {
    let Some(from) = mv.from else {
        let kind = classify_drop(pos, flags, mv.piece, mv.to);
        let mut text = format!("{}@{}", mv.piece.san_char(), mv.to);
        if kind.is_playable() {
            let played = Move::drop(flags.side_to_move(), mv.piece, mv.to);
            push_check_suffix(pos, flags, &played, &mut text);
        }
        return (kind, text);
    };
    let Some(occ) = pos.get(from) else {
        return (MoveKind::Impossible, long_form(pos, from, mv.to, None, mv.promotion));
    };
    let promo_char = mv.promotion.map(Piece::to_char);
    let resolved = find_legal(pos, flags, ep, from, mv.to, promo_char);
    let kind = match resolved {
        Ok(played) => played.kind,
        Err(verdict) => verdict,
    };
    let (shape_flags, shape_kind) = if kind.is_playable() || flags.contains(PositionFlags::IGNORE_CHECK) {
        (flags, kind)
    } else {
        let loose = flags | PositionFlags::IGNORE_CHECK;
        (loose, classify(pos, loose, ep, from, mv.to, promo_char))
    };
    let promotion = resolved.ok().and_then(|m| m.promotion).or(mv.promotion);

    let mut text = if !shape_kind.is_playable() {
        long_form(pos, from, mv.to, Some(occ.piece), promotion)
    } else if shape_kind.is_castle() {
        let castle = if shape_kind.is_h_side_castle() { "O-O" } else { "O-O-O" };
        castle.to_string()
    } else if occ.piece == Piece::Pawn {
        pawn_text(pos, from, mv.to, shape_kind, promotion)
    } else {
        piece_text(pos, shape_flags, ep, from, mv.to, occ.piece)
    };
    if let Ok(played) = resolved {
        push_check_suffix(pos, flags, &played, &mut text);
    }
    (kind, text)
}

fn push_check_suffix(pos: &Position, flags: PositionFlags, played: &Move, text: &mut String) {
    let next = apply_move(pos, played);
    match mate_test(&next, flags.flipped(), next.ep_file()) {
        MateStatus::Check => text.push('+'),
        MateStatus::Checkmate => text.push('#'),
        MateStatus::None | MateStatus::Stalemate => {}
    }
}

fn is_capture_on(pos: &Position, from: Square, to: Square) -> bool {
    match (pos.get(from), pos.get(to)) {
        (Some(mover), Some(target)) => mover.color != target.color,
        _ => false,
    }
}

fn pawn_text(pos: &Position, from: Square, to: Square, kind: MoveKind, promotion: Option<Piece>) -> String {
    let variant = pos.variant();
    let orthodox = !variant.berolina_pawns() && !variant.is_xiangqi();
    let capture = kind == MoveKind::EnPassant || is_capture_on(pos, from, to);
    let mut text = if orthodox && from.1 == to.1 && !capture {
        to.to_string()
    } else if orthodox && capture && from.1.abs_diff(to.1) == 1 {
        format!("{}x{to}", Square::file_char(from.1))
    } else {
        format!("{from}{}{to}", if capture { "x" } else { "" })
    };
    if let Some(promo) = promotion {
        text.push('=');
        text.push(promo.san_char());
    }
    text
}

/// "Nf3", "Nbd7", "R1e2" or "Qh4e1", naming only as much of the source as needed
fn piece_text(
    pos: &Position,
    flags: PositionFlags,
    ep: EpFile,
    from: Square,
    to: Square,
    piece: Piece,
) -> String {
    let (moves, _) = generate_legal(pos, flags, ep);
    let mut rivals: Vec<Square> = moves
        .iter()
        .filter(|m| m.to == to && !m.kind.is_castle() && m.from != Some(from))
        .filter_map(|m| m.from)
        .filter(|sq| pos.get(*sq).is_some_and(|o| o.piece == piece))
        .collect();
    rivals.sort_unstable();
    rivals.dedup();
    let same_rank = rivals.iter().filter(|sq| sq.0 == from.0).count();
    let same_file = rivals.iter().filter(|sq| sq.1 == from.1).count();
    let elsewhere = rivals.len() - same_rank - same_file;

    let mut text = String::new();
    text.push(piece.san_char());
    if same_rank > 0 || (elsewhere > 0 && same_file == 0) {
        text.push(Square::file_char(from.1));
    }
    if same_file > 0 {
        text.push_str(&(from.0 + 1).to_string());
    }
    if is_capture_on(pos, from, to) {
        text.push('x');
    }
    text.push_str(&to.to_string());
    text
}

fn long_form(
    pos: &Position,
    from: Square,
    to: Square,
    piece: Option<Piece>,
    promotion: Option<Piece>,
) -> String {
    let mut text = String::new();
    let mut lone_piece = false;
    if let (Some(piece), Some(occ)) = (piece.filter(|&p| p != Piece::Pawn), pos.get(from)) {
        text.push(piece.san_char());
        lone_piece = pos.count_pieces(occ.color, piece) == 1;
    }
    if !lone_piece {
        text.push_str(&from.to_string());
    }
    if pos.get(to).is_some() {
        text.push('x');
    }
    text.push_str(&to.to_string());
    if let Some(promo) = promotion {
        text.push('=');
        text.push(promo.san_char());
    }
    text
}
