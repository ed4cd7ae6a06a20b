use crate::chess::Move;
use crate::defs::MAX_PLY;

/// Triangular Principal Variation table
/// --------------------------------
/// Row `ply` holds the best line found from `ply` onwards; writing a move
/// at `ply` pulls up the line from the row below it.
///
/// ```text
///      0    1    2    3
/// 0    m1   m2   m3   m4
/// 1         m2   m3   m4
/// 2              m3   m4
/// 3                   m4
/// ```
pub struct PVTable {
    table: Box<[[Option<Move>; MAX_PLY]; MAX_PLY]>,
    length: [usize; MAX_PLY + 1],
}

impl PVTable {
    pub fn new() -> Self {
        PVTable {
            table: Box::new([[None; MAX_PLY]; MAX_PLY]),
            length: [0; MAX_PLY + 1],
        }
    }

    /// Empties the line starting at `ply`
    pub fn reset(&mut self, ply: usize) {
        assert!(ply < MAX_PLY);
        self.length[ply] = ply;
        self.length[ply + 1] = ply + 1;
    }

    /// `mv` is the new best move at `ply`, followed by the line below it
    pub fn write(&mut self, ply: usize, mv: Move) {
        self.table[ply][ply] = Some(mv);
        let end = self.length[ply + 1].clamp(ply + 1, MAX_PLY);
        for next_ply in ply + 1..end {
            self.table[ply][next_ply] = self.table[ply + 1][next_ply];
        }
        self.length[ply] = end;
    }

    /// Returns the main line of moves from the root
    pub fn mainline(&self) -> Vec<Move> {
        (0..self.length[0])
            .map_while(|ply| self.table[0][ply])
            .collect()
    }
}

impl Default for PVTable {
    fn default() -> Self {
        Self::new()
    }
}
