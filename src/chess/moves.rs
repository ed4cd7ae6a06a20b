use super::types::{Role, Square};
use smallvec::SmallVec;
use std::fmt;

/// Move kind flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MoveFlags(u8);

impl MoveFlags {
    pub const QUIET: MoveFlags = MoveFlags(0);
    pub const CAPTURE: MoveFlags = MoveFlags(1 << 0);
    pub const DOUBLE_PUSH: MoveFlags = MoveFlags(1 << 1);
    pub const EN_PASSANT: MoveFlags = MoveFlags(1 << 2);
    pub const CASTLE: MoveFlags = MoveFlags(1 << 3);
    pub const PROMOTION: MoveFlags = MoveFlags(1 << 4);

    #[inline]
    pub fn contains(self, other: MoveFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn with(self, other: MoveFlags) -> MoveFlags {
        MoveFlags(self.0 | other.0)
    }
}

/// A chess move as produced by the move generator.
///
/// Castling is encoded as the king's two-square step; en-passant captures
/// land on the en-passant target square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
    pub flags: MoveFlags,
}

impl Move {
    #[inline]
    pub fn new(from: Square, to: Square, flags: MoveFlags) -> Move {
        Move {
            from,
            to,
            promotion: None,
            flags,
        }
    }

    #[inline]
    pub fn promotion(from: Square, to: Square, role: Role, capture: bool) -> Move {
        let flags = if capture {
            MoveFlags::PROMOTION.with(MoveFlags::CAPTURE)
        } else {
            MoveFlags::PROMOTION
        };
        Move {
            from,
            to,
            promotion: Some(role),
            flags,
        }
    }

    /// Captures include en passant
    #[inline]
    pub fn is_capture(&self) -> bool {
        self.flags.contains(MoveFlags::CAPTURE)
    }

    #[inline]
    pub fn is_en_passant(&self) -> bool {
        self.flags.contains(MoveFlags::EN_PASSANT)
    }

    #[inline]
    pub fn is_castle(&self) -> bool {
        self.flags.contains(MoveFlags::CASTLE)
    }

    #[inline]
    pub fn is_double_push(&self) -> bool {
        self.flags.contains(MoveFlags::DOUBLE_PUSH)
    }

    #[inline]
    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    /// Neither a capture nor a promotion
    #[inline]
    pub fn is_quiet(&self) -> bool {
        !self.is_capture() && !self.is_promotion()
    }

    /// Long algebraic (UCI) notation
    pub fn to_uci(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

pub type MoveList = SmallVec<[Move; 64]>;
