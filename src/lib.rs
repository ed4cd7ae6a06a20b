//! Alpha-beta chess engine: board and move generation, evaluation,
//! iterative-deepening search and the UCI front end.

pub mod chess;
pub mod defs;
pub mod error;
pub mod eval;
pub mod limits;
pub mod ordering;
pub mod pv_table;
pub mod search;
pub mod transposition_table;
pub mod uci;

pub use chess::{Move, Position};
pub use error::{EngineError, FenError, MoveError};
pub use eval::{EvalWeights, Evaluator};
pub use limits::SearchLimits;
pub use search::{Search, SearchOptions, SearchOutcome};
pub use uci::{EngineOptions, UciEngine};
