//! Error types for position setup and protocol handling.

use crate::chess::Color;
use thiserror::Error;

/// A position description that cannot be turned into a legal board
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("missing {0} field")]
    MissingField(&'static str),

    #[error("invalid board description: {0}")]
    InvalidBoard(String),

    #[error("invalid piece character '{0}'")]
    InvalidPiece(char),

    #[error("invalid side to move '{0}'")]
    InvalidTurn(String),

    #[error("invalid castling field '{0}'")]
    InvalidCastling(String),

    #[error("castling right '{0}' without king and rook on their home squares")]
    InconsistentCastling(char),

    #[error("invalid en passant square '{0}'")]
    InvalidEnPassant(String),

    #[error("invalid move counter '{0}'")]
    InvalidClock(String),

    #[error("{0:?} must have exactly one king, found {1}")]
    KingCount(Color, u32),

    #[error("{0:?} has too many pieces")]
    TooManyPieces(Color),

    #[error("pawn on the first or last rank")]
    PawnOnBackRank,

    #[error("side not to move is in check")]
    OppositeCheck,
}

/// A move that cannot be played in the current position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move {mv} in position {fen}")]
    Illegal { mv: String, fen: String },
}

/// Errors surfaced by the protocol bridge as a command rejection
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Fen(#[from] FenError),

    #[error(transparent)]
    Move(#[from] MoveError),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid option {name}: {reason}")]
    InvalidOption { name: String, reason: String },

    #[error("could not start the search thread: {0}")]
    Thread(#[from] std::io::Error),
}
