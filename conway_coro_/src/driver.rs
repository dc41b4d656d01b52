// driver.rs - Runs a Grid on a tokio task, one generation per tick
//
// The task owns the grid for as long as it runs. Stopping hands it back, so
// the caller can only touch the grid once the worker is done with it.

use std::time::Duration;

use conway::{ConwayError, Grid, TMatrix};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, trace};

/// A committed generation as seen by observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub generation: u64,
    pub cells: TMatrix,
}

/// Validate a stepping interval.
pub fn interval_from_millis(millis: u64) -> Result<Duration, ConwayError> {
    if millis < 1 {
        return Err(ConwayError::InvalidInterval(millis));
    }
    Ok(Duration::from_millis(millis))
}

/// Handle to a grid being advanced on a background task.
///
/// Dropping the handle without calling [`stop`](Simulation::stop) also ends
/// the worker at its next sleep, but the grid is lost with it.
pub struct Simulation {
    cancel: watch::Sender<bool>,
    interval: watch::Sender<Duration>,
    frames: watch::Receiver<Frame>,
    task: JoinHandle<(Grid, u64)>,
}

impl Simulation {
    /// Start stepping `grid` from generation 0. Must be called from within a
    /// tokio runtime.
    pub fn start<F>(grid: Grid, interval_millis: u64, on_generation: F) -> Result<Self, ConwayError>
    where
        F: FnMut(u64, &TMatrix) + Send + 'static,
    {
        Self::resume(grid, 0, interval_millis, on_generation)
    }

    /// Start stepping `grid`, numbering generations on from `generation`.
    pub fn resume<F>(
        grid: Grid,
        generation: u64,
        interval_millis: u64,
        on_generation: F,
    ) -> Result<Self, ConwayError>
    where
        F: FnMut(u64, &TMatrix) + Send + 'static,
    {
        Self::spawn(grid, generation, u64::MAX, interval_millis, on_generation)
    }

    /// Like [`resume`](Simulation::resume), but the worker finishes on its
    /// own once generation `last` has been committed and reported. The
    /// observer is dropped at that point, which closes any channel it holds.
    pub fn resume_until<F>(
        grid: Grid,
        generation: u64,
        last: u64,
        interval_millis: u64,
        on_generation: F,
    ) -> Result<Self, ConwayError>
    where
        F: FnMut(u64, &TMatrix) + Send + 'static,
    {
        Self::spawn(grid, generation, last, interval_millis, on_generation)
    }

    fn spawn<F>(
        grid: Grid,
        generation: u64,
        last: u64,
        interval_millis: u64,
        on_generation: F,
    ) -> Result<Self, ConwayError>
    where
        F: FnMut(u64, &TMatrix) + Send + 'static,
    {
        let interval = interval_from_millis(interval_millis)?;

        let (cancel, cancel_rx) = watch::channel(false);
        let (interval_tx, interval_rx) = watch::channel(interval);
        let (frames_tx, frames) = watch::channel(Frame {
            generation,
            cells: grid.live_cell_matrix(),
        });

        info!(generation, interval_millis, "simulation started");
        let task = tokio::spawn(run(
            grid,
            generation,
            last,
            cancel_rx,
            interval_rx,
            frames_tx,
            on_generation,
        ));

        Ok(Self { cancel, interval: interval_tx, frames, task })
    }

    /// Change the pause between generations. Applies from the next sleep on;
    /// a sleep already in progress keeps its old length.
    pub fn set_interval(&self, interval_millis: u64) -> Result<(), ConwayError> {
        let interval = interval_from_millis(interval_millis)?;
        self.interval.send_replace(interval);
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        *self.interval.borrow()
    }

    /// Most recently committed generation.
    pub fn latest(&self) -> Frame {
        self.frames.borrow().clone()
    }

    pub fn generation(&self) -> u64 {
        self.frames.borrow().generation
    }

    /// Request cancellation and wait for the worker to finish.
    ///
    /// A step already underway completes first. A worker that already
    /// reached its last generation is simply joined. Returns the grid together
    /// with the number of its last committed generation.
    pub async fn stop(self) -> (Grid, u64) {
        self.cancel.send_replace(true);
        match self.task.await {
            Ok(stopped) => stopped,
            // The task is never aborted, so a join error means the observer panicked
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        }
    }
}

async fn run<F>(
    mut grid: Grid,
    mut generation: u64,
    last: u64,
    mut cancel: watch::Receiver<bool>,
    interval: watch::Receiver<Duration>,
    frames: watch::Sender<Frame>,
    mut on_generation: F,
) -> (Grid, u64)
where
    F: FnMut(u64, &TMatrix) + Send + 'static,
{
    while !*cancel.borrow() && generation < last {
        grid.advance();
        generation += 1;

        let cells = grid.live_cell_matrix();
        on_generation(generation, &cells);
        frames.send_replace(Frame { generation, cells });
        trace!(generation, "frame published");
        if generation >= last {
            break;
        }

        let pause = *interval.borrow();
        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            changed = cancel.changed() => {
                // Handle dropped without stop()
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!(generation, "simulation stopped");
    (grid, generation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conway::{Fill, Pattern};
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const T: bool = true;
    const F: bool = false;

    fn blinker() -> Grid {
        let pattern: Pattern = "x = 5, y = 5\n5b$5b$b3o!".parse().unwrap();
        Grid::from_pattern(pattern)
    }

    fn horizontal() -> TMatrix {
        let mut cells = vec![vec![F; 5]; 5];
        cells[2] = vec![F, T, T, T, F];
        cells
    }

    fn vertical() -> TMatrix {
        let mut cells = vec![vec![F; 5]; 5];
        for row in 1..=3 {
            cells[row][2] = T;
        }
        cells
    }

    #[tokio::test]
    async fn rejects_zero_interval() {
        let result = Simulation::start(blinker(), 0, |_, _| {});
        assert_eq!(result.err(), Some(ConwayError::InvalidInterval(0)));
    }

    #[tokio::test]
    async fn reports_every_generation_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let simulation = Simulation::start(blinker(), 1, move |generation, cells: &TMatrix| {
            let _ = tx.send((generation, cells.clone()));
        })
        .unwrap();

        for expected in 1..=4u64 {
            let (generation, cells) = timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(generation, expected);
            let shape = if generation % 2 == 1 { vertical() } else { horizontal() };
            assert_eq!(cells, shape);
        }

        let (grid, generation) = simulation.stop().await;
        assert!(generation >= 4);
        let shape = if generation % 2 == 1 { vertical() } else { horizontal() };
        assert_eq!(grid.live_cell_matrix(), shape);
    }

    #[tokio::test]
    async fn stop_before_first_tick_leaves_grid_untouched() {
        // The current-thread test runtime cannot poll the worker before we await
        let simulation = Simulation::start(blinker(), 10, |_, _| {}).unwrap();
        let (grid, generation) = simulation.stop().await;
        assert_eq!(generation, 0);
        assert_eq!(grid.live_cell_matrix(), horizontal());
    }

    #[tokio::test]
    async fn stop_interrupts_a_long_sleep() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let simulation = Simulation::start(blinker(), 60_000, move |generation, _: &TMatrix| {
            let _ = tx.send(generation);
        })
        .unwrap();

        assert_eq!(rx.recv().await, Some(1));
        let (_, generation) = timeout(Duration::from_secs(5), simulation.stop())
            .await
            .expect("stop waited out the full interval");
        assert_eq!(generation, 1);
    }

    #[tokio::test]
    async fn resume_continues_numbering_and_publishes_frames() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let simulation = Simulation::resume(blinker(), 41, 60_000, move |generation, _: &TMatrix| {
            let _ = tx.send(generation);
        })
        .unwrap();
        assert_eq!(simulation.generation(), 41);

        assert_eq!(rx.recv().await, Some(42));
        let frame = simulation.latest();
        assert_eq!(frame.generation, 42);
        assert_eq!(frame.cells, vertical());

        simulation.stop().await;
    }

    #[tokio::test]
    async fn bounded_run_stops_on_its_last_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let simulation = Simulation::resume_until(blinker(), 2, 5, 1, move |generation, _: &TMatrix| {
            let _ = tx.send(generation);
        })
        .unwrap();

        let mut seen = Vec::new();
        // Channel closes when the worker drops the observer
        while let Some(generation) = timeout(Duration::from_secs(5), rx.recv()).await.unwrap() {
            seen.push(generation);
        }
        assert_eq!(seen, vec![3, 4, 5]);
        assert_eq!(simulation.generation(), 5);

        let (grid, generation) = simulation.stop().await;
        assert_eq!(generation, 5);
        assert_eq!(grid.live_cell_matrix(), vertical());
    }

    #[tokio::test]
    async fn bounded_run_already_at_its_limit_does_nothing() {
        let simulation = Simulation::resume_until(blinker(), 7, 7, 1, |_, _| {}).unwrap();
        let (grid, generation) = simulation.stop().await;
        assert_eq!(generation, 7);
        assert_eq!(grid.live_cell_matrix(), horizontal());
    }

    #[tokio::test]
    async fn interval_can_be_changed_while_running() {
        let grid = Grid::new(3, 3, Fill::Uniform(false)).unwrap();
        let simulation = Simulation::start(grid, 60_000, |_, _| {}).unwrap();

        assert_eq!(simulation.set_interval(0), Err(ConwayError::InvalidInterval(0)));
        simulation.set_interval(25).unwrap();
        assert_eq!(simulation.interval(), Duration::from_millis(25));

        let (grid, _) = simulation.stop().await;
        assert_eq!(grid.population(), 0);
    }
}
