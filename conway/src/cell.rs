// cell.rs - Single automaton cell with a staged next state

/// One cell of a [`Grid`](crate::Grid).
///
/// `pending_alive` only carries meaning between the compute and commit
/// phases of a single `advance()`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Cell {
    pub(crate) alive: bool,
    pub(crate) pending_alive: bool,
}

impl Cell {
    pub(crate) fn new(alive: bool) -> Self {
        Self { alive, pending_alive: false }
    }

    /// Stage the next state from the neighbour count (B3/S23).
    pub(crate) fn stage(&mut self, neighbours: u8) {
        self.pending_alive = match (self.alive, neighbours) {
            (true, 2) | (true, 3) => true,   // Survival
            (false, 3)            => true,   // Birth
            _                     => false,  // Death or stays dead
        };
    }

    pub(crate) fn commit(&mut self) {
        self.alive = self.pending_alive;
    }
}
