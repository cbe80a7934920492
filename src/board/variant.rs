//! Game variants and the rule parameters each one selects.
//!
//! Every rule difference the legality engine knows about is expressed as a
//! query on [`Variant`]; move generation never matches on variant names
//! directly except through these methods.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::types::Piece;

/// Board size in files and ranks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

impl Dimensions {
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Dimensions { width, height }
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, rank: usize, file: usize) -> bool {
        rank < self.height && file < self.width
    }

    #[inline]
    #[must_use]
    pub const fn area(self) -> usize {
        self.width * self.height
    }
}

/// How a variant castles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastlingStyle {
    /// No castling at all
    Forbidden,
    /// King moves two (or more) squares toward a corner rook
    Standard,
    /// King "captures" its own rook, rook on any file
    KingTakesRook,
}

/// What happens to the side to move when it has no legal move and is not in check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StalematePolicy {
    Draw,
    /// The stalemated side loses
    MoverLoses,
    /// The stalemated side wins
    MoverWins,
    /// The side with fewer pieces wins; equal counts draw
    PieceCount,
}

/// Rule for a side reduced to a lone king.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BareKingRule {
    Ignored,
    /// A bared king loses unless it can bare the opponent in reply
    Loses,
    /// Losing every piece but the king wins
    Wins,
}

/// Supported variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Variant {
    #[default]
    Normal,
    WildCastle,
    NoCastle,
    FischerRandom,
    Bughouse,
    Crazyhouse,
    Losers,
    Suicide,
    Giveaway,
    TwoKings,
    Kriegspiel,
    Atomic,
    ThreeCheck,
    Shatranj,
    Courier,
    Capablanca,
    Gothic,
    CapaRandom,
    Knightmate,
    Berolina,
    Makruk,
    Xiangqi,
    Fairy,
}

const ORTHODOX_START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

const ORTHODOX_PROMOTIONS: &[Piece] = &[Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];
const CAPABLANCA_PROMOTIONS: &[Piece] = &[
    Piece::Queen,
    Piece::Chancellor,
    Piece::Archbishop,
    Piece::Rook,
    Piece::Bishop,
    Piece::Knight,
];
const SUICIDE_PROMOTIONS: &[Piece] = &[
    Piece::Queen,
    Piece::Rook,
    Piece::Bishop,
    Piece::Knight,
    Piece::King,
];
const KNIGHTMATE_PROMOTIONS: &[Piece] = &[Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Man];
const FERZ_PROMOTION: &[Piece] = &[Piece::Ferz];
const FAIRY_PROMOTIONS: &[Piece] = &[
    Piece::Queen,
    Piece::Chancellor,
    Piece::Archbishop,
    Piece::Rook,
    Piece::Bishop,
    Piece::Knight,
    Piece::Nightrider,
];

/// Lookup table from protocol name (lowercase) to variant
static VARIANT_NAMES: Lazy<HashMap<&'static str, Variant>> = Lazy::new(|| {
    let mut names: HashMap<&'static str, Variant> =
        Variant::ALL.iter().map(|v| (v.name(), *v)).collect();
    // Aliases accepted from engines and remote servers
    names.insert("chess", Variant::Normal);
    names.insert("standard", Variant::Normal);
    names.insert("chess960", Variant::FischerRandom);
    names.insert("frc", Variant::FischerRandom);
    names.insert("zh", Variant::Crazyhouse);
    names.insert("threecheck", Variant::ThreeCheck);
    names
});

impl Variant {
    pub const ALL: [Variant; 23] = [
        Variant::Normal,
        Variant::WildCastle,
        Variant::NoCastle,
        Variant::FischerRandom,
        Variant::Bughouse,
        Variant::Crazyhouse,
        Variant::Losers,
        Variant::Suicide,
        Variant::Giveaway,
        Variant::TwoKings,
        Variant::Kriegspiel,
        Variant::Atomic,
        Variant::ThreeCheck,
        Variant::Shatranj,
        Variant::Courier,
        Variant::Capablanca,
        Variant::Gothic,
        Variant::CapaRandom,
        Variant::Knightmate,
        Variant::Berolina,
        Variant::Makruk,
        Variant::Xiangqi,
        Variant::Fairy,
    ];

    /// Name used in the `variant` command and in `feature variants=`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Variant::Normal => "normal",
            Variant::WildCastle => "wildcastle",
            Variant::NoCastle => "nocastle",
            Variant::FischerRandom => "fischerandom",
            Variant::Bughouse => "bughouse",
            Variant::Crazyhouse => "crazyhouse",
            Variant::Losers => "losers",
            Variant::Suicide => "suicide",
            Variant::Giveaway => "giveaway",
            Variant::TwoKings => "twokings",
            Variant::Kriegspiel => "kriegspiel",
            Variant::Atomic => "atomic",
            Variant::ThreeCheck => "3check",
            Variant::Shatranj => "shatranj",
            Variant::Courier => "courier",
            Variant::Capablanca => "capablanca",
            Variant::Gothic => "gothic",
            Variant::CapaRandom => "caparandom",
            Variant::Knightmate => "knightmate",
            Variant::Berolina => "berolina",
            Variant::Makruk => "makruk",
            Variant::Xiangqi => "xiangqi",
            Variant::Fairy => "fairy",
        }
    }

    /// Look a variant up by name, case-insensitively
    #[must_use]
    pub fn from_name(name: &str) -> Option<Variant> {
        VARIANT_NAMES
            .get(name.trim().to_ascii_lowercase().as_str())
            .copied()
    }

    #[must_use]
    pub const fn dimensions(self) -> Dimensions {
        match self {
            Variant::Capablanca | Variant::Gothic | Variant::CapaRandom => Dimensions::new(10, 8),
            Variant::Courier => Dimensions::new(12, 8),
            Variant::Xiangqi => Dimensions::new(9, 10),
            _ => Dimensions::new(8, 8),
        }
    }

    #[must_use]
    pub const fn castling_style(self) -> CastlingStyle {
        match self {
            Variant::NoCastle
            | Variant::Shatranj
            | Variant::Courier
            | Variant::Makruk
            | Variant::Xiangqi => CastlingStyle::Forbidden,
            Variant::FischerRandom | Variant::CapaRandom => CastlingStyle::KingTakesRook,
            _ => CastlingStyle::Standard,
        }
    }

    /// Start positions are drawn at random each game
    #[must_use]
    pub const fn is_shuffle(self) -> bool {
        matches!(self, Variant::FischerRandom | Variant::CapaRandom)
    }

    /// Pawns may advance two squares from their start rank
    #[must_use]
    pub const fn has_double_step(self) -> bool {
        !matches!(
            self,
            Variant::Shatranj | Variant::Courier | Variant::Makruk | Variant::Xiangqi
        )
    }

    /// Number of ranks, counted from the far edge, in which pawns promote
    #[must_use]
    pub const fn promotion_depth(self) -> usize {
        match self {
            Variant::Makruk => 3,
            _ => 1,
        }
    }

    /// Pieces a pawn may promote to; empty means pawns never promote
    #[must_use]
    pub const fn promotion_pieces(self) -> &'static [Piece] {
        match self {
            Variant::Capablanca | Variant::Gothic | Variant::CapaRandom => CAPABLANCA_PROMOTIONS,
            Variant::Suicide | Variant::Giveaway => SUICIDE_PROMOTIONS,
            Variant::Knightmate => KNIGHTMATE_PROMOTIONS,
            Variant::Shatranj | Variant::Courier | Variant::Makruk => FERZ_PROMOTION,
            Variant::Xiangqi => &[],
            Variant::Fairy => FAIRY_PROMOTIONS,
            _ => ORTHODOX_PROMOTIONS,
        }
    }

    /// Promotion piece assumed when a promotion omits the piece
    #[must_use]
    pub const fn default_promotion(self) -> Piece {
        match self {
            Variant::Shatranj | Variant::Courier | Variant::Makruk => Piece::Ferz,
            _ => Piece::Queen,
        }
    }

    #[must_use]
    pub const fn stalemate_policy(self) -> StalematePolicy {
        match self {
            Variant::Shatranj | Variant::Courier | Variant::Xiangqi => StalematePolicy::MoverLoses,
            Variant::Losers | Variant::Giveaway => StalematePolicy::MoverWins,
            Variant::Suicide => StalematePolicy::PieceCount,
            _ => StalematePolicy::Draw,
        }
    }

    /// Being checkmated wins the game
    #[must_use]
    pub const fn mated_side_wins(self) -> bool {
        matches!(self, Variant::Losers)
    }

    #[must_use]
    pub const fn bare_king_rule(self) -> BareKingRule {
        match self {
            Variant::Shatranj | Variant::Courier => BareKingRule::Loses,
            Variant::Losers => BareKingRule::Wins,
            _ => BareKingRule::Ignored,
        }
    }

    /// A capture must be made when one is available
    #[must_use]
    pub const fn mandatory_capture(self) -> bool {
        matches!(self, Variant::Losers | Variant::Suicide | Variant::Giveaway)
    }

    /// The king carries no royalty: check does not restrict moves
    #[must_use]
    pub const fn ignores_check(self) -> bool {
        matches!(self, Variant::Suicide | Variant::Giveaway)
    }

    #[must_use]
    pub const fn is_atomic(self) -> bool {
        matches!(self, Variant::Atomic)
    }

    /// Captured pieces go to the capturer's holdings and may be dropped
    #[must_use]
    pub const fn has_drops(self) -> bool {
        matches!(self, Variant::Crazyhouse | Variant::Bughouse)
    }

    /// Drops are not checked against holdings (partner supplies pieces)
    #[must_use]
    pub const fn unchecked_drops(self) -> bool {
        matches!(self, Variant::Bughouse)
    }

    /// Pawns may try diagonal moves onto empty squares (hidden-board captures)
    #[must_use]
    pub const fn kriegspiel_captures(self) -> bool {
        matches!(self, Variant::Kriegspiel)
    }

    /// Number of checks that wins the game, if any
    #[must_use]
    pub const fn checks_to_win(self) -> Option<u8> {
        match self {
            Variant::ThreeCheck => Some(3),
            _ => None,
        }
    }

    /// The royal piece moves as a knight
    #[must_use]
    pub const fn royal_knight(self) -> bool {
        matches!(self, Variant::Knightmate)
    }

    #[must_use]
    pub const fn berolina_pawns(self) -> bool {
        matches!(self, Variant::Berolina)
    }

    /// Palace, river and blocking rules of xiangqi
    #[must_use]
    pub const fn is_xiangqi(self) -> bool {
        matches!(self, Variant::Xiangqi)
    }

    /// The man moves as a silver general (makruk khon)
    #[must_use]
    pub const fn man_is_silver(self) -> bool {
        matches!(self, Variant::Makruk)
    }

    /// The alfil also has the one-step diagonal move
    #[must_use]
    pub const fn alfil_steps(self) -> bool {
        !matches!(
            self,
            Variant::Shatranj | Variant::Courier | Variant::Xiangqi
        )
    }

    /// Placement part of the FEN for the fixed start position.
    ///
    /// Shuffle variants return their canonical (unshuffled) arrangement.
    #[must_use]
    pub const fn start_placement(self) -> &'static str {
        match self {
            Variant::WildCastle => "rnbkqbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR",
            Variant::TwoKings => "rnbqkknr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKKNR",
            Variant::Knightmate => "rmbqkbmr/pppppppp/8/8/8/8/PPPPPPPP/RMBQKBMR",
            Variant::Shatranj => "rnekfenr/pppppppp/8/8/8/8/PPPPPPPP/RNEKFENR",
            Variant::Courier => {
                "rnebmkfwbenr/pppppppppppp/12/12/12/12/PPPPPPPPPPPP/RNEBMKFWBENR"
            }
            Variant::Capablanca | Variant::CapaRandom => {
                "rnabqkbcnr/pppppppppp/10/10/10/10/PPPPPPPPPP/RNABQKBCNR"
            }
            Variant::Gothic => "rnbqckabnr/pppppppppp/10/10/10/10/PPPPPPPPPP/RNBQCKABNR",
            Variant::Makruk => "rnmfkmnr/8/pppppppp/8/8/PPPPPPPP/8/RNMKFMNR",
            Variant::Xiangqi => {
                "rnefkfenr/9/1o5o1/p1p1p1p1p/9/9/P1P1P1P1P/1O5O1/9/RNEFKFENR"
            }
            _ => ORTHODOX_START,
        }
    }

    /// Placement for a new game, shuffling the back rank where the variant asks for it.
    pub fn new_game_placement<R: Rng + ?Sized>(self, rng: &mut R) -> String {
        if !self.is_shuffle() {
            return self.start_placement().to_string();
        }
        let width = self.dimensions().width;
        let extra: &[Piece] = if self == Variant::CapaRandom {
            &[Piece::Archbishop, Piece::Chancellor]
        } else {
            &[]
        };
        let rank = shuffled_back_rank(width, extra, rng);
        let black: String = rank.iter().map(|p| p.to_char()).collect();
        let white: String = rank.iter().map(|p| p.san_char()).collect();
        let pawns = "p".repeat(width);
        let mut placement = format!("{black}/{pawns}/");
        for _ in 0..4 {
            placement.push_str(&format!("{width}/"));
        }
        placement.push_str(&format!("{}/{white}", pawns.to_ascii_uppercase()));
        placement
    }
}

/// Random back rank with bishops on opposite colors and the king between the rooks.
fn shuffled_back_rank<R: Rng + ?Sized>(width: usize, extra: &[Piece], rng: &mut R) -> Vec<Piece> {
    let dark: Vec<usize> = (0..width).step_by(2).collect();
    let light: Vec<usize> = (1..width).step_by(2).collect();
    let b1 = dark.choose(rng).copied().unwrap_or(0);
    let b2 = light.choose(rng).copied().unwrap_or(1);
    let mut empty: Vec<usize> = (0..width).filter(|&i| i != b1 && i != b2).collect();
    empty.shuffle(rng);

    let mut rank = vec![Piece::Pawn; width];
    rank[b1] = Piece::Bishop;
    rank[b2] = Piece::Bishop;
    let mut others = vec![Piece::Queen, Piece::Knight, Piece::Knight];
    others.extend_from_slice(extra);
    for (slot, piece) in empty.iter().zip(others.iter()) {
        rank[*slot] = *piece;
    }
    let mut rest: Vec<usize> = empty[others.len()..].to_vec();
    rest.sort_unstable();
    for (slot, piece) in rest.iter().zip([Piece::Rook, Piece::King, Piece::Rook]) {
        rank[*slot] = piece;
    }
    rank
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::from_name(s).ok_or_else(|| s.to_string())
    }
}
