//! UCI front end.
//!
//! Commands are handled one line at a time. A `go` hands the `Search` to a
//! worker thread which streams progress and the final `bestmove` line into
//! the output channel, then gives the `Search` back when joined. Only one
//! job runs at a time: any command that needs the searcher, or an accepted
//! `position`, stops and joins the running job first.

use crate::{
    chess::{Move, Position, Role, Square},
    defs::{mate_in, Value},
    error::EngineError,
    eval::EvalWeights,
    limits::SearchLimits,
    ordering::MoveOrderer,
    search::{Search, SearchInfo, SearchOptions, SearchOutcome},
};
use crossbeam_channel::Sender;
use log::{debug, error, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use vampirc_uci::{
    parse_one, UciInfoAttribute, UciMessage, UciMove, UciOptionConfig, UciPiece, UciSquare,
};

pub const ENGINE_NAME: &str = "abengine";
pub const ENGINE_AUTHOR: &str = "the abengine developers";

const MAX_HASH_MB: i64 = 4096;
const MAX_WEIGHT: i64 = 1000;
const MAX_QUIESCENCE_DEPTH: i64 = 32;

/// Settings that survive between searches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub hash_mb: usize,
    pub quiescence_depth: i32,
    pub weights: EvalWeights,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            hash_mb: 16,
            quiescence_depth: SearchOptions::default().quiescence_depth,
            weights: EvalWeights::default(),
        }
    }
}

impl EngineOptions {
    fn build_search(&self) -> Search {
        let mut search = Search::new(
            self.hash_mb,
            SearchOptions {
                quiescence_depth: self.quiescence_depth,
                ..SearchOptions::default()
            },
        );
        search.set_weights(self.weights);
        search
    }
}

/// Whether the input loop should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A search running on its own thread
pub struct SearchJob {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Search>,
    /// Root of the job, to answer with a legal move if the worker dies
    root: Position,
}

impl SearchJob {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

pub struct UciEngine {
    options: EngineOptions,
    position: Position,
    /// Parked searcher, `None` while a job owns it
    search: Option<Search>,
    job: Option<SearchJob>,
    out: Sender<String>,
}

impl UciEngine {
    pub fn new(options: EngineOptions, out: Sender<String>) -> Self {
        let search = options.build_search();
        UciEngine {
            options,
            position: Position::startpos(),
            search: Some(search),
            job: None,
            out,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn is_searching(&self) -> bool {
        self.job.as_ref().is_some_and(|job| !job.is_finished())
    }

    /// Handles one input line, reporting rejected commands as `info string`
    pub fn handle_line(&mut self, line: &str) -> Flow {
        let line = line.trim();
        if line.is_empty() {
            return Flow::Continue;
        }
        debug!("<< {line}");
        match self.handle(parse_one(line)) {
            Ok(flow) => flow,
            Err(err) => {
                warn!("rejected '{line}': {err}");
                self.send(format!("info string error: {err}"));
                Flow::Continue
            }
        }
    }

    pub fn handle(&mut self, msg: UciMessage) -> Result<Flow, EngineError> {
        match msg {
            UciMessage::Uci => {
                self.send(
                    UciMessage::Id {
                        name: Some(format!("{} {}", ENGINE_NAME, env!("CARGO_PKG_VERSION"))),
                        author: None,
                    }
                    .to_string(),
                );
                self.send(
                    UciMessage::Id {
                        name: None,
                        author: Some(ENGINE_AUTHOR.to_string()),
                    }
                    .to_string(),
                );
                for option in self.option_configs() {
                    self.send(UciMessage::Option(option).to_string());
                }
                self.send(UciMessage::UciOk.to_string());
            }
            UciMessage::IsReady => self.send(UciMessage::ReadyOk.to_string()),
            UciMessage::UciNewGame => {
                self.searcher().new_game();
                self.position = Position::startpos();
            }
            UciMessage::Position {
                startpos,
                fen,
                moves,
            } => {
                let fen = fen.map(|f| f.0);
                let moves: Vec<String> = moves.iter().map(UciMove::to_string).collect();
                // the current position is only replaced once everything checks out
                let position = build_position(startpos, fen.as_deref(), &moves)?;
                self.stop();
                self.position = position;
            }
            UciMessage::SetOption { name, value } => self.set_option(&name, value.as_deref())?,
            UciMessage::Go {
                time_control,
                search_control,
            } => {
                let limits =
                    SearchLimits::from_uci(time_control, search_control, self.position.turn());
                self.start(limits)?;
            }
            UciMessage::Stop => self.stop(),
            UciMessage::PonderHit => debug!("ponderhit, continuing the search"),
            UciMessage::Quit => {
                self.stop();
                return Ok(Flow::Quit);
            }
            UciMessage::Unknown(text, _) => return Err(EngineError::UnknownCommand(text)),
            other => debug!("ignoring {other:?}"),
        }
        Ok(Flow::Continue)
    }

    /// Starts a search on the current position, cancelling any running one
    pub fn start(&mut self, limits: SearchLimits) -> Result<(), EngineError> {
        let mut search = self.searcher_owned();
        search.set_position(self.position.clone());
        let stop = search.reset_stop();
        let out = self.out.clone();
        let root = self.position.clone();

        debug!("starting search with {limits:?}");
        let handle = thread::Builder::new()
            .name("search".to_string())
            .spawn(move || {
                let outcome = search.go_with(limits, |info| {
                    let _ = out.send(info_line(info));
                });
                for line in outcome_lines(&outcome) {
                    let _ = out.send(line);
                }
                search
            })?;

        self.job = Some(SearchJob { stop, handle, root });
        Ok(())
    }

    /// Cancels the running job, if any, and waits for its `bestmove`
    pub fn stop(&mut self) {
        if let Some(job) = &self.job {
            job.stop.store(true, Ordering::Relaxed);
        }
        self.join();
    }

    /// Waits for the running job to finish on its own
    pub fn wait(&mut self) {
        self.join();
    }

    fn join(&mut self) {
        let Some(job) = self.job.take() else {
            return;
        };
        match job.handle.join() {
            Ok(search) => self.search = Some(search),
            Err(_) => {
                error!("search thread panicked, rebuilding the searcher");
                self.search = Some(self.options.build_search());
                self.send("info string search aborted".to_string());
                // the searcher died with its results, rank the root moves afresh
                let fallback = MoveOrderer::new().best_guess(&job.root, None);
                self.send(bestmove_line(fallback, None));
            }
        }
    }

    /// The parked searcher, after joining any running job
    fn searcher(&mut self) -> &mut Search {
        self.stop();
        self.search
            .get_or_insert_with(|| self.options.build_search())
    }

    fn searcher_owned(&mut self) -> Search {
        self.stop();
        match self.search.take() {
            Some(search) => search,
            None => self.options.build_search(),
        }
    }

    fn option_configs(&self) -> Vec<UciOptionConfig> {
        let spin = |name: &str, default: i64, min: i64, max: i64| UciOptionConfig::Spin {
            name: name.to_string(),
            default: Some(default),
            min: Some(min),
            max: Some(max),
        };
        let w = self.options.weights;
        vec![
            spin("Hash", self.options.hash_mb as i64, 0, MAX_HASH_MB),
            spin("MaterialWeight", w.material as i64, 0, MAX_WEIGHT),
            spin("MobilityWeight", w.mobility as i64, 0, MAX_WEIGHT),
            spin("PstWeight", w.pst as i64, 0, MAX_WEIGHT),
            spin("KingSafetyWeight", w.king_safety as i64, 0, MAX_WEIGHT),
            spin(
                "QuiescenceDepth",
                self.options.quiescence_depth as i64,
                0,
                MAX_QUIESCENCE_DEPTH,
            ),
        ]
    }

    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), EngineError> {
        let invalid = |reason: &str| EngineError::InvalidOption {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        let value: i64 = value
            .ok_or_else(|| invalid("missing value"))?
            .trim()
            .parse()
            .map_err(|_| invalid("not an integer"))?;
        let in_range = |max: i64| {
            if (0..=max).contains(&value) {
                Ok(value)
            } else {
                Err(invalid(&format!("must be between 0 and {max}")))
            }
        };

        let mut weights = self.options.weights;
        match name.to_ascii_lowercase().as_str() {
            "hash" => {
                let mb = in_range(MAX_HASH_MB)? as usize;
                self.options.hash_mb = mb;
                self.searcher().resize_tt(mb);
                return Ok(());
            }
            "quiescencedepth" => {
                let depth = in_range(MAX_QUIESCENCE_DEPTH)? as i32;
                self.options.quiescence_depth = depth;
                let search = self.searcher();
                let current = search.options();
                search.set_options(SearchOptions {
                    quiescence_depth: depth,
                    ..current
                });
                return Ok(());
            }
            "materialweight" => weights.material = in_range(MAX_WEIGHT)? as i32,
            "mobilityweight" => weights.mobility = in_range(MAX_WEIGHT)? as i32,
            "pstweight" => weights.pst = in_range(MAX_WEIGHT)? as i32,
            "kingsafetyweight" => weights.king_safety = in_range(MAX_WEIGHT)? as i32,
            _ => return Err(invalid("unknown option")),
        }
        self.options.weights = weights;
        self.searcher().set_weights(weights);
        Ok(())
    }

    fn send(&self, line: String) {
        let _ = self.out.send(line);
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sets up `startpos` or a FEN and replays `moves` on it
pub fn build_position(
    startpos: bool,
    fen: Option<&str>,
    moves: &[String],
) -> Result<Position, EngineError> {
    let mut position = match (startpos, fen) {
        (false, Some(fen)) => Position::from_fen(fen)?,
        _ => Position::startpos(),
    };
    for mv in moves {
        position.play_uci(mv)?;
    }
    Ok(position)
}

fn uci_square(sq: Square) -> UciSquare {
    UciSquare {
        file: (b'a' + sq.file()) as char,
        rank: sq.rank() + 1,
    }
}

pub fn to_uci_move(mv: Move) -> UciMove {
    UciMove {
        from: uci_square(mv.from),
        to: uci_square(mv.to),
        promotion: mv.promotion.map(|role| match role {
            Role::Knight => UciPiece::Knight,
            Role::Bishop => UciPiece::Bishop,
            Role::Rook => UciPiece::Rook,
            Role::Queen => UciPiece::Queen,
            _ => panic!("invalid promotion in {mv}"),
        }),
    }
}

fn score_attribute(score: Value) -> UciInfoAttribute {
    let (cp, mate) = match mate_in(score) {
        Some(moves) => (None, Some(moves as i8)),
        None => (Some(score), None),
    };
    UciInfoAttribute::Score {
        cp,
        mate,
        lower_bound: None,
        upper_bound: None,
    }
}

/// Progress line for a completed depth
pub fn info_line(info: &SearchInfo) -> String {
    UciMessage::Info(vec![
        UciInfoAttribute::Depth(info.depth.clamp(0, u8::MAX as i32) as u8),
        score_attribute(info.score),
        UciInfoAttribute::Nodes(info.nodes),
        UciInfoAttribute::Nps(info.nps()),
        UciInfoAttribute::HashFull(info.hashfull as u16),
        UciInfoAttribute::Pv(info.pv.iter().copied().map(to_uci_move).collect()),
    ])
    .to_string()
}

fn bestmove_line(best_move: Option<Move>, ponder: Option<Move>) -> String {
    match best_move {
        Some(best_move) => UciMessage::BestMove {
            best_move: to_uci_move(best_move),
            ponder: ponder.map(to_uci_move),
        }
        .to_string(),
        None => "bestmove (none)".to_string(),
    }
}

/// Terminal lines of a search: the game result at the root when there is
/// no move to play, then the `bestmove` line
pub fn outcome_lines(outcome: &SearchOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    if outcome.is_game_over() {
        let score = match outcome.score {
            Some(score) if score != 0 => "mate 0",
            _ => "cp 0",
        };
        lines.push(format!("info depth 0 score {score}"));
    }
    lines.push(bestmove_line(outcome.best_move, outcome.ponder));
    lines
}
