use crate::chess::Color;
use crate::defs::MAX_PLY;
use std::time::Duration;
use vampirc_uci::{UciSearchControl, UciTimeControl};

/// Search termination conditions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchLimits {
    /// Depth limit, do not exceed this depth
    pub depth: Option<i32>,
    /// Nodes limit, do not visit more nodes than this
    pub nodes: Option<u64>,
    /// Time limit, do not search for longer than this
    pub time: Option<Duration>,
}

impl SearchLimits {
    /// Empty limits, search until stopped
    pub fn none() -> Self {
        SearchLimits::default()
    }

    pub fn depth(depth: i32) -> Self {
        SearchLimits {
            depth: Some(depth),
            ..Default::default()
        }
    }

    pub fn nodes(nodes: u64) -> Self {
        SearchLimits {
            nodes: Some(nodes),
            ..Default::default()
        }
    }

    pub fn movetime(time: Duration) -> Self {
        SearchLimits {
            time: Some(time),
            ..Default::default()
        }
    }

    /// Whether nothing but a stop request ends the search
    pub fn is_infinite(&self) -> bool {
        self.depth.is_none() && self.nodes.is_none() && self.time.is_none()
    }

    /// Deepest iteration allowed
    pub fn max_depth(&self) -> i32 {
        self.depth
            .unwrap_or(MAX_PLY as i32 - 1)
            .clamp(1, MAX_PLY as i32 - 1)
    }

    /// Builds the limits from a parsed `go` command
    pub fn from_uci(
        time_control: Option<UciTimeControl>,
        search_control: Option<UciSearchControl>,
        turn: Color,
    ) -> Self {
        let time_limit = match time_control {
            None => None,
            // both run until an explicit stop
            Some(UciTimeControl::Infinite) | Some(UciTimeControl::Ponder) => None,
            Some(UciTimeControl::MoveTime(fixed_time)) => {
                Some(fixed_time.to_std().unwrap_or(Duration::ZERO))
            }
            Some(UciTimeControl::TimeLeft {
                white_time,
                black_time,
                white_increment,
                black_increment,
                moves_to_go: _,
            }) => {
                let white_time = white_time.map(|x| x.num_milliseconds()).unwrap_or(0);
                let black_time = black_time.map(|x| x.num_milliseconds()).unwrap_or(0);
                let white_incr = white_increment.map(|x| x.num_milliseconds()).unwrap_or(0);
                let black_incr = black_increment.map(|x| x.num_milliseconds()).unwrap_or(0);

                let (my_time, my_incr) = match turn {
                    Color::White => (white_time.max(0), white_incr.max(0)),
                    Color::Black => (black_time.max(0), black_incr.max(0)),
                };

                // move time = increment + 2% of the time left, never more
                // than what is left on the clock
                let budget = (my_incr + my_time / 50).min(my_time.max(1));
                Some(Duration::from_millis(budget as u64))
            }
        };

        let mut limits = SearchLimits {
            time: time_limit.map(|t| {
                // wiggle room to not time out
                t.saturating_sub(Duration::from_millis(2))
                    .max(Duration::from_millis(2))
            }),
            ..Default::default()
        };

        if let Some(search_control) = search_control {
            if let Some(depth) = search_control.depth {
                limits.depth = Some((depth as i32).max(1));
            }
            if let Some(nodes) = search_control.nodes {
                limits.nodes = Some(nodes.max(1));
            }
        }

        limits
    }
}
