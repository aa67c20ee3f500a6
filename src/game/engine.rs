use std::collections::VecDeque;

use log::{debug, info, warn};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use tokio::sync::mpsc::UnboundedReceiver;

use super::{
    direction::Direction,
    error::Result,
    events::{EventHub, GameEvent},
    level::{LevelLayout, LevelSize, LevelSource, SPAWN_LENGTH},
    state::{CellState, CollisionType, Grid, Position, Snake},
};

/// Turns that may be buffered ahead of the next step
pub const MAX_PENDING_DIRECTIONS: usize = 2;

/// The Snake game model
///
/// Owns the grid, the snake, the level's barriers and the buffered turns.
/// [`GridSimulation::move_snake`] advances exactly one step; outcomes are
/// observed through the state accessors and the [`GameEvent`]s sent to
/// subscribers.
pub struct GridSimulation {
    source: Box<dyn LevelSource>,
    level_size: LevelSize,
    grid: Grid,
    snake: Snake,
    barriers: Vec<Position>,
    heading: Direction,
    pending: VecDeque<Direction>,
    score: u32,
    steps: u32,
    is_over: bool,
    is_running: bool,
    collision: Option<CollisionType>,
    generation: u64,
    events: EventHub,
    rng: StdRng,
}

impl GridSimulation {
    /// Create a simulation with no level loaded yet
    pub fn new(source: impl LevelSource + 'static) -> Self {
        Self::with_rng(source, StdRng::from_entropy())
    }

    /// Same as [`GridSimulation::new`] with reproducible food placement
    pub fn with_seed(source: impl LevelSource + 'static, seed: u64) -> Self {
        Self::with_rng(source, StdRng::seed_from_u64(seed))
    }

    fn with_rng(source: impl LevelSource + 'static, rng: StdRng) -> Self {
        Self {
            source: Box::new(source),
            level_size: LevelSize::Medium,
            grid: Grid::new(0, 0),
            snake: Snake::new(),
            barriers: Vec::new(),
            heading: Direction::Right,
            pending: VecDeque::with_capacity(MAX_PENDING_DIRECTIONS),
            score: 0,
            steps: 0,
            is_over: false,
            is_running: false,
            collision: None,
            generation: 0,
            events: EventHub::new(),
            rng,
        }
    }

    /// Register for [`GameEvent`]s
    pub fn subscribe(&mut self) -> UnboundedReceiver<GameEvent> {
        self.events.subscribe()
    }

    /// Load the level for `size` and set up a fresh board
    ///
    /// The level is fetched and parsed before anything is touched, so on
    /// error the current board is left exactly as it was.
    pub fn load(&mut self, size: LevelSize) -> Result<()> {
        let text = self.source.level_text(size)?;
        let layout = LevelLayout::parse(&text)?;

        info!(
            "Loaded {} level: {}x{} with {} barriers",
            size,
            layout.rows,
            layout.cols,
            layout.barriers.len()
        );

        self.level_size = size;
        self.barriers = layout.barriers;
        self.reset_board(layout.rows, layout.cols);
        self.is_over = false;
        self.is_running = false;

        self.events.emit(GameEvent::LevelLoaded);
        Ok(())
    }

    /// Start over on the current level
    ///
    /// The caller is expected to (re)start the step loop afterwards.
    pub fn restart_game(&mut self) {
        if !self.is_loaded() {
            warn!("Restart requested before any level was loaded");
            return;
        }

        self.reset_board(self.grid.rows(), self.grid.cols());
        self.is_over = false;
        self.is_running = true;
        debug!("Game restarted on {} level", self.level_size);
    }

    fn reset_board(&mut self, rows: usize, cols: usize) {
        self.generation += 1;
        self.snake.clear();
        self.pending.clear();
        self.score = 0;
        self.steps = 0;
        self.collision = None;

        self.grid = Grid::new(rows, cols);
        for barrier in &self.barriers {
            self.grid.set(*barrier, CellState::Outside);
        }

        self.heading = Direction::Right;
        self.add_snake();
        self.add_food();
    }

    fn add_snake(&mut self) {
        let row = (self.grid.rows() / 2) as i32;
        for col in 1..=SPAWN_LENGTH as i32 {
            self.add_head(Position::new(row, col));
        }
    }

    fn add_head(&mut self, pos: Position) {
        self.grid.set(pos, CellState::Snake);
        self.snake.push_head(pos);
    }

    fn remove_tail(&mut self) {
        if let Some(tail) = self.snake.pop_tail() {
            self.grid.set(tail, CellState::Empty);
        }
    }

    /// Put food on a random empty cell; a full board gets none
    fn add_food(&mut self) {
        let empty = self.grid.positions_of(CellState::Empty);
        match empty.choose(&mut self.rng) {
            Some(&pos) => self.grid.set(pos, CellState::Food),
            None => debug!("Board is full, no food placed"),
        }
    }

    /// Queue a turn for an upcoming step
    ///
    /// Dropped silently when two turns are already queued, or when `direction`
    /// equals or reverses the most recently queued direction (or the heading
    /// when nothing is queued).
    pub fn change_direction(&mut self, direction: Direction) {
        if self.pending.len() >= MAX_PENDING_DIRECTIONS {
            return;
        }

        let last = self.pending.back().copied().unwrap_or(self.heading);
        if direction == last || direction.is_opposite(last) {
            return;
        }

        self.pending.push_back(direction);
    }

    /// Advance the snake by one cell
    pub fn move_snake(&mut self) {
        if self.is_over {
            return;
        }

        if let Some(next) = self.pending.pop_front() {
            self.heading = next;
        }

        let Some(head) = self.snake.head() else {
            return;
        };
        let new_head = head.moved_in_direction(self.heading);
        self.steps += 1;

        match self.will_hit(new_head) {
            CellState::Outside => self.end_game(CollisionType::Wall),
            CellState::Snake => self.end_game(CollisionType::SelfCollision),
            CellState::Empty => {
                self.remove_tail();
                self.add_head(new_head);
            }
            CellState::Food => {
                self.add_head(new_head);
                self.score += 1;
                self.add_food();
                self.events.emit(GameEvent::AteFood);
            }
        }
    }

    /// Classify what the head would run into at `pos`
    ///
    /// Leaving the board or entering a barrier wins over everything else. The
    /// current tail counts as empty since it moves away during the same step.
    fn will_hit(&self, pos: Position) -> CellState {
        if !self.grid.contains(pos) || self.barriers.contains(&pos) {
            return CellState::Outside;
        }

        if self.snake.tail() == Some(pos) {
            return CellState::Empty;
        }

        self.grid.get(pos).unwrap_or(CellState::Outside)
    }

    fn end_game(&mut self, collision: CollisionType) {
        self.is_over = true;
        self.collision = Some(collision);
        info!(
            "Game over ({:?}) with score {} after {} steps",
            collision, self.score, self.steps
        );
        self.events.emit(GameEvent::GameOver);
    }

    /// Toggle between paused and running
    pub fn manage_pause(&mut self) {
        self.is_running = !self.is_running;
        debug!("Running: {}", self.is_running);
        self.events.emit(GameEvent::RunStateChanged(self.is_running));
    }

    /// One tick of the step loop
    ///
    /// Paused ticks change nothing. Returns `false` once the game is over and
    /// no further ticks should be scheduled.
    pub fn tick(&mut self) -> bool {
        if self.is_over {
            return false;
        }
        if !self.is_running {
            return true;
        }

        self.move_snake();
        self.events.emit(GameEvent::StateChanged);
        !self.is_over
    }

    pub fn is_loaded(&self) -> bool {
        self.grid.rows() > 0
    }

    pub fn level_size(&self) -> LevelSize {
        self.level_size
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cell(&self, pos: Position) -> Option<CellState> {
        self.grid.get(pos)
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn barriers(&self) -> &[Position] {
        &self.barriers
    }

    /// Current food cell, if any
    pub fn food(&self) -> Option<Position> {
        self.grid.positions_of(CellState::Food).first().copied()
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn pending_directions(&self) -> impl Iterator<Item = Direction> + '_ {
        self.pending.iter().copied()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn is_over(&self) -> bool {
        self.is_over
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Bumped every time the board is rebuilt by a load or restart
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// What ended the last game
    pub fn collision(&self) -> Option<CollisionType> {
        self.collision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::error::LevelError;
    use crate::game::level::InMemoryLevelSource;

    fn source(text: &str) -> InMemoryLevelSource {
        InMemoryLevelSource::new().with_level(LevelSize::Medium, text)
    }

    fn started(text: &str) -> GridSimulation {
        let mut sim = GridSimulation::with_seed(source(text), 7);
        sim.load(LevelSize::Medium).unwrap();
        sim.restart_game();
        sim
    }

    fn clear_food(sim: &mut GridSimulation) {
        for pos in sim.grid.positions_of(CellState::Food) {
            sim.grid.set(pos, CellState::Empty);
        }
    }

    fn drain(rx: &mut UnboundedReceiver<GameEvent>) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_load_reads_dimensions_and_barriers() {
        let mut sim = GridSimulation::with_seed(source("20 20 15 15 5 5 12 4"), 1);
        let mut rx = sim.subscribe();

        sim.load(LevelSize::Medium).unwrap();

        assert_eq!(sim.rows(), 20);
        assert_eq!(sim.cols(), 20);
        assert_eq!(
            sim.barriers(),
            &[
                Position::new(15, 15),
                Position::new(5, 5),
                Position::new(12, 4)
            ]
        );
        for barrier in sim.barriers() {
            assert_eq!(sim.cell(*barrier), Some(CellState::Outside));
        }
        assert_eq!(sim.grid().count(CellState::Outside), 3);
        assert_eq!(sim.score(), 0);
        assert_eq!(sim.heading(), Direction::Right);
        assert_eq!(sim.snake().len(), 5);
        assert!(sim.food().is_some());
        assert!(!sim.is_running());
        assert_eq!(drain(&mut rx), vec![GameEvent::LevelLoaded]);
    }

    #[test]
    fn test_failed_load_keeps_previous_board() {
        let mut sim = GridSimulation::with_seed(
            source("12 12 0 0").with_level(LevelSize::Small, "12 twelve"),
            3,
        );
        sim.load(LevelSize::Medium).unwrap();
        sim.restart_game();
        sim.move_snake();
        let grid_before = sim.grid().clone();
        let snake_before = sim.snake().clone();

        let err = sim.load(LevelSize::Large).unwrap_err();
        assert!(matches!(err, LevelError::Source { .. }));

        let err = sim.load(LevelSize::Small).unwrap_err();
        assert!(matches!(err, LevelError::Parse(_)));

        assert_eq!(sim.grid(), &grid_before);
        assert_eq!(sim.snake(), &snake_before);
        assert_eq!(sim.level_size(), LevelSize::Medium);
        assert_eq!(sim.steps(), 1);
        assert!(sim.is_running());
    }

    #[test]
    fn test_oversized_level_is_rejected() {
        let mut sim = GridSimulation::with_seed(
            source("10 10").with_level(LevelSize::Large, "2147483647 2147483647"),
            3,
        );
        sim.load(LevelSize::Medium).unwrap();

        let err = sim.load(LevelSize::Large).unwrap_err();

        assert!(matches!(err, LevelError::Parse(_)));
        assert_eq!(sim.rows(), 10);
        assert_eq!(sim.level_size(), LevelSize::Medium);
    }

    #[test]
    fn test_load_replaces_game_in_progress() {
        let mut sim = GridSimulation::with_seed(
            source("20 20 15 15 5 5 12 4").with_level(LevelSize::Large, "12 10 0 0"),
            9,
        );
        sim.load(LevelSize::Medium).unwrap();
        sim.restart_game();
        clear_food(&mut sim);
        sim.grid.set(Position::new(10, 6), CellState::Food);
        sim.move_snake();
        sim.change_direction(Direction::Up);
        sim.change_direction(Direction::Left);
        assert_eq!(sim.score(), 1);
        assert_eq!(sim.pending_directions().count(), 2);
        let generation = sim.generation();
        let mut rx = sim.subscribe();

        sim.load(LevelSize::Large).unwrap();

        assert_eq!(sim.level_size(), LevelSize::Large);
        assert_eq!((sim.rows(), sim.cols()), (12, 10));
        assert_eq!(sim.barriers(), &[Position::new(0, 0)]);
        assert_eq!(sim.grid().count(CellState::Outside), 1);
        assert_eq!(sim.pending_directions().count(), 0);
        assert_eq!(sim.score(), 0);
        assert_eq!(sim.steps(), 0);
        assert_eq!(sim.heading(), Direction::Right);
        assert_eq!(sim.snake().len(), 5);
        assert_eq!(sim.snake().head(), Some(Position::new(6, 5)));
        assert_eq!(sim.grid().count(CellState::Snake), 5);
        assert_eq!(sim.grid().count(CellState::Food), 1);
        assert!(!sim.is_running());
        assert!(!sim.is_over());
        assert!(sim.generation() > generation);
        assert_eq!(drain(&mut rx), vec![GameEvent::LevelLoaded]);
    }

    #[test]
    fn test_restart_spawns_snake_in_middle_row() {
        let sim = started("12 16 0 0");

        assert_eq!(sim.snake().len(), 5);
        assert_eq!(sim.snake().head(), Some(Position::new(6, 5)));
        assert_eq!(sim.snake().tail(), Some(Position::new(6, 1)));
        assert_eq!(sim.grid().count(CellState::Snake), 5);
        assert_eq!(sim.grid().count(CellState::Food), 1);
        assert_eq!(sim.score(), 0);
        assert!(!sim.is_over());
        assert!(sim.is_running());
    }

    #[test]
    fn test_restart_before_load_is_ignored() {
        let mut sim = GridSimulation::with_seed(source("10 10"), 1);
        sim.restart_game();

        assert!(!sim.is_loaded());
        assert!(sim.snake().is_empty());
        assert!(!sim.is_running());
    }

    #[test]
    fn test_restart_after_game_over_restores_board() {
        let mut sim = started("10 10 0 9");
        for _ in 0..5 {
            sim.move_snake();
        }
        assert!(sim.is_over());

        sim.restart_game();

        assert!(!sim.is_over());
        assert_eq!(sim.collision(), None);
        assert_eq!(sim.steps(), 0);
        assert_eq!(sim.snake().head(), Some(Position::new(5, 5)));
        assert_eq!(sim.cell(Position::new(0, 9)), Some(CellState::Outside));
        assert_eq!(sim.grid().count(CellState::Snake), 5);
    }

    #[test]
    fn test_reverse_turn_is_ignored() {
        let mut sim = started("10 10");
        let heading = sim.heading();

        sim.change_direction(heading.opposite());
        sim.move_snake();

        assert_eq!(sim.heading(), heading);
        assert_eq!(sim.snake().head(), Some(Position::new(5, 6)));
    }

    #[test]
    fn test_queue_holds_at_most_two_turns() {
        let mut sim = started("10 10");

        sim.change_direction(Direction::Up);
        sim.change_direction(Direction::Left);
        sim.change_direction(Direction::Down);

        assert_eq!(
            sim.pending_directions().collect::<Vec<_>>(),
            vec![Direction::Up, Direction::Left]
        );
    }

    #[test]
    fn test_queue_compares_against_last_queued_turn() {
        let mut sim = started("10 10");

        sim.change_direction(Direction::Up);
        // Repeats and reversals of the queued turn are dropped
        sim.change_direction(Direction::Up);
        sim.change_direction(Direction::Down);
        assert_eq!(sim.pending_directions().count(), 1);

        sim.change_direction(Direction::Right);
        assert_eq!(
            sim.pending_directions().collect::<Vec<_>>(),
            vec![Direction::Up, Direction::Right]
        );
    }

    #[test]
    fn test_queued_turns_apply_one_per_step() {
        let mut sim = started("10 10");
        clear_food(&mut sim);

        sim.change_direction(Direction::Up);
        sim.change_direction(Direction::Left);

        sim.move_snake();
        assert_eq!(sim.heading(), Direction::Up);
        assert_eq!(sim.snake().head(), Some(Position::new(4, 5)));

        sim.move_snake();
        assert_eq!(sim.heading(), Direction::Left);
        assert_eq!(sim.snake().head(), Some(Position::new(4, 4)));
        assert_eq!(sim.pending_directions().count(), 0);
    }

    #[test]
    fn test_plain_move_translates_snake() {
        let mut sim = started("10 10");
        clear_food(&mut sim);

        sim.move_snake();

        assert_eq!(sim.snake().len(), 5);
        assert_eq!(sim.snake().head(), Some(Position::new(5, 6)));
        assert_eq!(sim.snake().tail(), Some(Position::new(5, 2)));
        assert_eq!(sim.cell(Position::new(5, 1)), Some(CellState::Empty));
        assert_eq!(sim.cell(Position::new(5, 6)), Some(CellState::Snake));
        assert_eq!(sim.grid().count(CellState::Snake), 5);
    }

    #[test]
    fn test_running_off_the_right_edge() {
        let mut sim = started("10 10");
        let mut rx = sim.subscribe();

        for _ in 0..4 {
            sim.move_snake();
            assert!(!sim.is_over());
        }
        sim.move_snake();

        assert!(sim.is_over());
        assert_eq!(sim.collision(), Some(CollisionType::Wall));
        assert_eq!(sim.snake().head(), Some(Position::new(5, 9)));
        assert!(drain(&mut rx).contains(&GameEvent::GameOver));
    }

    #[test]
    fn test_barrier_ends_game() {
        let mut sim = started("10 10 5 7");
        clear_food(&mut sim);

        sim.move_snake();
        assert!(!sim.is_over());
        sim.move_snake();

        assert!(sim.is_over());
        assert_eq!(sim.collision(), Some(CollisionType::Wall));
        assert_eq!(sim.snake().head(), Some(Position::new(5, 6)));
        assert_eq!(sim.cell(Position::new(5, 7)), Some(CellState::Outside));
    }

    #[test]
    fn test_eating_food_grows_snake() {
        let mut sim = started("10 10");
        clear_food(&mut sim);
        sim.grid.set(Position::new(5, 6), CellState::Food);
        let mut rx = sim.subscribe();

        sim.move_snake();

        assert_eq!(sim.snake().len(), 6);
        assert_eq!(sim.score(), 1);
        assert_eq!(sim.snake().head(), Some(Position::new(5, 6)));
        assert_eq!(sim.snake().tail(), Some(Position::new(5, 1)));
        assert_eq!(sim.grid().count(CellState::Food), 1);
        assert_ne!(sim.food(), Some(Position::new(5, 6)));
        assert_eq!(drain(&mut rx), vec![GameEvent::AteFood]);
    }

    #[test]
    fn test_no_food_on_full_board() {
        let mut sim = started("10 10");
        clear_food(&mut sim);
        for pos in sim.grid.positions_of(CellState::Empty) {
            sim.grid.set(pos, CellState::Snake);
        }

        sim.add_food();

        assert_eq!(sim.food(), None);
    }

    #[test]
    fn test_self_collision() {
        let mut sim = started("20 20");
        clear_food(&mut sim);

        // Head (10,5): down, left, then up into the body at (10,4)
        sim.change_direction(Direction::Down);
        sim.move_snake();
        sim.change_direction(Direction::Left);
        sim.move_snake();
        sim.change_direction(Direction::Up);
        sim.move_snake();

        assert!(sim.is_over());
        assert_eq!(sim.collision(), Some(CollisionType::SelfCollision));
        assert_eq!(sim.snake().head(), Some(Position::new(11, 4)));
    }

    #[test]
    fn test_moving_into_own_tail_is_allowed() {
        let mut sim = started("20 20");
        clear_food(&mut sim);
        sim.grid.set(Position::new(10, 6), CellState::Food);
        sim.move_snake();
        clear_food(&mut sim);
        assert_eq!(sim.snake().len(), 6);

        sim.change_direction(Direction::Down);
        sim.change_direction(Direction::Left);
        sim.move_snake();
        sim.move_snake();
        sim.move_snake();
        assert_eq!(sim.snake().tail(), Some(Position::new(10, 4)));

        sim.change_direction(Direction::Up);
        sim.move_snake();

        assert!(!sim.is_over());
        assert_eq!(sim.snake().head(), Some(Position::new(10, 4)));
        assert_eq!(sim.snake().len(), 6);
        assert_eq!(sim.grid().count(CellState::Snake), 6);
    }

    #[test]
    fn test_will_hit_ordering() {
        let sim = started("10 10 0 0");

        assert_eq!(sim.will_hit(Position::new(0, 0)), CellState::Outside);
        assert_eq!(sim.will_hit(Position::new(-1, 3)), CellState::Outside);
        assert_eq!(sim.will_hit(Position::new(5, 1)), CellState::Empty);
        assert_eq!(sim.will_hit(Position::new(5, 3)), CellState::Snake);
    }

    #[test]
    fn test_move_after_game_over_is_noop() {
        let mut sim = started("10 10");
        for _ in 0..5 {
            sim.move_snake();
        }
        let grid = sim.grid().clone();
        let steps = sim.steps();
        let mut rx = sim.subscribe();

        sim.change_direction(Direction::Up);
        sim.move_snake();

        assert_eq!(sim.grid(), &grid);
        assert_eq!(sim.steps(), steps);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_pause_toggles_without_touching_board() {
        let mut sim = started("10 10");
        let mut rx = sim.subscribe();
        let grid = sim.grid().clone();

        sim.manage_pause();
        assert!(!sim.is_running());
        sim.manage_pause();
        assert!(sim.is_running());

        assert_eq!(
            drain(&mut rx),
            vec![
                GameEvent::RunStateChanged(false),
                GameEvent::RunStateChanged(true)
            ]
        );
        assert_eq!(sim.grid(), &grid);
        assert_eq!(sim.score(), 0);
        assert!(!sim.is_over());
    }

    #[test]
    fn test_paused_tick_does_nothing() {
        let mut sim = started("10 10");
        sim.manage_pause();
        let mut rx = sim.subscribe();
        let head = sim.snake().head();

        assert!(sim.tick());
        assert!(sim.tick());

        assert_eq!(sim.snake().head(), head);
        assert_eq!(sim.steps(), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_tick_steps_and_notifies() {
        let mut sim = started("10 10");
        clear_food(&mut sim);
        let mut rx = sim.subscribe();

        assert!(sim.tick());

        assert_eq!(sim.steps(), 1);
        assert_eq!(sim.snake().head(), Some(Position::new(5, 6)));
        assert_eq!(drain(&mut rx), vec![GameEvent::StateChanged]);
    }

    #[test]
    fn test_tick_stops_on_game_over() {
        let mut sim = started("10 10");
        let mut rx = sim.subscribe();

        let mut ticks = 0;
        while sim.tick() {
            ticks += 1;
        }

        assert_eq!(ticks, 4);
        assert!(sim.is_over());
        let events = drain(&mut rx);
        assert_eq!(events.last(), Some(&GameEvent::StateChanged));
        assert_eq!(
            events
                .iter()
                .filter(|e| **e == GameEvent::StateChanged)
                .count(),
            5
        );

        assert!(!sim.tick());
        assert!(drain(&mut rx).is_empty());
    }
}
