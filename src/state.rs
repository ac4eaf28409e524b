//! # Game State Model
//!
//! The single shared record every task works on. It is constructed once
//! (usually as a `static`), handed to each task as a `&'static GameState`,
//! and reinitialized in place by [`GameState::reset`].
//!
//! ## Access discipline
//!
//! | Field | Writer | Readers | Protection |
//! |-------|--------|---------|------------|
//! | snake body | movement task | fruit, input, render | per-cell atomics |
//! | fruit set | fruit task (append), movement task (remove) | render | [`Locked`] |
//! | direction, running, needs_reset | input task (movement on reset) | all | atomics |
//! | lose, score | movement task | render | atomics |
//!
//! Only the fruit set sits behind an exclusion primitive, because it is the
//! only structure with two writers doing read-modify-write on the same
//! backing storage. Every other field has a single writer. Readers may see
//! torn multi-field state (a new direction before the move that uses it,
//! or a body mid-shift); each individual cell or flag is always whole.

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, AtomicUsize, Ordering};

use heapless::Vec;

use crate::config::{INITIAL_SNAKE_LEN, MAX_LEN};
use crate::error::{Error, Result};
use crate::grid::{wrap_sub, Direction, Position};
use crate::render::Snapshot;
use crate::sync::Locked;

/// Slots in the body arena: `MAX_LEN` segments plus the spare slot that
/// the shift before every move writes into.
pub const BODY_SLOTS: usize = MAX_LEN + 1;

// ---------------------------------------------------------------------------
// Snake body
// ---------------------------------------------------------------------------

/// Fixed-capacity snake body. Head at index 0.
///
/// Single writer (the movement engine). Cells are stored packed in atomics
/// so concurrent readers never observe half of a `Position`.
pub struct SnakeBody {
    cells: [AtomicU16; BODY_SLOTS],
    len: AtomicUsize,
}

impl SnakeBody {
    /// A one-segment body at the grid centre.
    pub const fn new() -> Self {
        Self {
            cells: [const { AtomicU16::new(Position::center().pack()) }; BODY_SLOTS],
            len: AtomicUsize::new(1),
        }
    }

    /// Current logical length. Always in `1..=MAX_LEN`.
    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    #[inline]
    pub fn head(&self) -> Position {
        self.get(0)
    }

    /// Segment `index`. Indices up to the spare slot are readable.
    #[inline]
    pub fn get(&self, index: usize) -> Position {
        Position::unpack(self.cells[index].load(Ordering::Relaxed))
    }

    /// True if any logical segment occupies `pos`.
    pub fn contains(&self, pos: Position) -> bool {
        (0..self.len()).any(|i| self.get(i) == pos)
    }

    /// True if any segment other than the head occupies `pos`.
    pub fn body_contains(&self, pos: Position) -> bool {
        (1..self.len()).any(|i| self.get(i) == pos)
    }

    /// Copies the logical segments out, head first.
    pub fn to_vec(&self) -> Vec<Position, MAX_LEN> {
        let len = self.len();
        (0..len).map(|i| self.get(i)).collect()
    }

    #[inline]
    pub(crate) fn set(&self, index: usize, pos: Position) {
        self.cells[index].store(pos.pack(), Ordering::Relaxed);
    }

    /// Publishes a new length after the cells it covers were written.
    #[inline]
    pub(crate) fn set_len(&self, len: usize) {
        debug_assert!((1..=MAX_LEN).contains(&len));
        self.len.store(len, Ordering::Release);
    }

    /// Moves every segment one slot toward the tail (slot i ← slot i−1, for
    /// i from the length down to 1). Slot `len` receives the old tail, so
    /// growth only needs `set_len(len + 1)`.
    pub(crate) fn shift_toward_tail(&self) {
        for i in (1..=self.len()).rev() {
            self.set(i, self.get(i - 1));
        }
    }

    /// Grows by one segment into the spare slot.
    pub(crate) fn grow(&self) -> Result<()> {
        let len = self.len();
        if len >= MAX_LEN {
            return Err(Error::SnakeFull);
        }
        self.set_len(len + 1);
        Ok(())
    }

    /// Overwrites the body with `segments`, head first.
    pub(crate) fn place(&self, segments: &[Position]) {
        debug_assert!(!segments.is_empty() && segments.len() <= MAX_LEN);
        for (i, &pos) in segments.iter().enumerate() {
            self.set(i, pos);
        }
        self.set_len(segments.len());
    }
}

impl Default for SnakeBody {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Fruit set
// ---------------------------------------------------------------------------

/// Live fruit, in insertion order, guarded by a critical section.
pub struct FruitSet {
    items: Locked<Vec<Position, MAX_LEN>>,
}

impl FruitSet {
    pub const fn new() -> Self {
        Self {
            items: Locked::new(Vec::new()),
        }
    }

    /// Appends a fruit. Refuses when the set holds `MAX_LEN` entries.
    pub fn push(&self, pos: Position) -> Result<()> {
        self.items
            .lock(|items| items.push(pos).map_err(|_| Error::FruitSetFull))
    }

    /// Removes the first fruit equal to `pos`, shifting later entries down
    /// so they keep their relative order. Search and compaction happen in
    /// one critical section. Returns the index the fruit was stored at.
    pub fn take(&self, pos: Position) -> Option<usize> {
        self.items.lock(|items| {
            let index = items.iter().position(|&f| f == pos)?;
            items.remove(index);
            Some(index)
        })
    }

    pub fn len(&self) -> usize {
        self.items.lock(|items| items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == MAX_LEN
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.items.lock(|items| items.contains(&pos))
    }

    pub fn clear(&self) {
        self.items.lock(|items| items.clear());
    }

    /// Consistent copy of the whole set.
    pub fn to_vec(&self) -> Vec<Position, MAX_LEN> {
        self.items.lock(|items| items.clone())
    }
}

impl Default for FruitSet {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Game state
// ---------------------------------------------------------------------------

/// The shared game record.
pub struct GameState {
    snake: SnakeBody,
    fruit: FruitSet,
    direction: AtomicU8,
    running: AtomicBool,
    needs_reset: AtomicBool,
    lose: AtomicBool,
    score: AtomicU16,
}

impl GameState {
    /// Running, heading right, one segment at the centre. Call
    /// [`reset`](Self::reset) before starting any task to get the full
    /// starting layout.
    pub const fn new() -> Self {
        Self {
            snake: SnakeBody::new(),
            fruit: FruitSet::new(),
            direction: AtomicU8::new(Direction::Right as u8),
            running: AtomicBool::new(true),
            needs_reset: AtomicBool::new(false),
            lose: AtomicBool::new(false),
            score: AtomicU16::new(0),
        }
    }

    /// Reinitializes the whole record: snake of length 4 with its head at
    /// the centre and the body trailing toward negative x (wrapping), heading
    /// right, running, no loss, score 0, no fruit.
    ///
    /// Nothing of the previous round survives. Only the snake's owner (the
    /// movement task) may call this once tasks are running.
    pub fn reset(&self) {
        self.fruit.clear();

        let head = Position::center();
        let mut segments: Vec<Position, INITIAL_SNAKE_LEN> = Vec::new();
        for i in 0..INITIAL_SNAKE_LEN {
            // Capacity equals the loop bound
            let _ = segments.push(Position::new(wrap_sub(head.x, i as u8), head.y));
        }
        self.snake.place(&segments);

        self.set_direction(Direction::Right);
        self.score.store(0, Ordering::Relaxed);
        self.lose.store(false, Ordering::Relaxed);
        self.needs_reset.store(false, Ordering::Relaxed);
        self.running.store(true, Ordering::Relaxed);

        info!("game reset");
    }

    #[inline]
    pub fn snake(&self) -> &SnakeBody {
        &self.snake
    }

    #[inline]
    pub fn fruit(&self) -> &FruitSet {
        &self.fruit
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        Direction::from_u8(self.direction.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_direction(&self, direction: Direction) {
        self.direction.store(direction as u8, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
    }

    /// Flips the pause state and returns the new `running` value.
    pub fn toggle_running(&self) -> bool {
        !self.running.fetch_xor(true, Ordering::Relaxed)
    }

    #[inline]
    pub fn needs_reset(&self) -> bool {
        self.needs_reset.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn request_reset(&self) {
        self.needs_reset.store(true, Ordering::Relaxed);
    }

    /// Observes and clears a pending reset request in one step.
    #[inline]
    pub fn take_reset_request(&self) -> bool {
        self.needs_reset.swap(false, Ordering::Relaxed)
    }

    #[inline]
    pub fn has_lost(&self) -> bool {
        self.lose.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_lost(&self) {
        self.lose.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn score(&self) -> u16 {
        self.score.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn add_point(&self) -> u16 {
        self.score.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Owned copy for the presentation adapter. Fields are read one after
    /// another without a global lock, so the copy may straddle an update.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            snake: self.snake.to_vec(),
            fruit: self.fruit.to_vec(),
            direction: self.direction(),
            score: self.score(),
            running: self.is_running(),
            lose: self.has_lost(),
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
