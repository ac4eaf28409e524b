//! # Input Resolver
//!
//! Turns raw button levels and joystick axis readings into game actions.
//!
//! ```text
//!  RawInput ──► Controls::sample() ──► InputSample ──► resolve_input() ──► GameState
//!  (levels,      (debounce, edge,       (edges +          (pause, reset,
//!   ADC axes)     8-way mapping)         8-way dir)        safe turns)
//! ```
//!
//! Buttons are edge-triggered: holding one down fires once. A turn is only
//! committed if the cell one step from the head in the new direction is
//! free of snake, which rules out reversing into the neck.

use crate::audio::{AudioQueue, BuzzerEvent};
use crate::config::{BUTTON_DEBOUNCE_SAMPLES, JOYSTICK_CENTER, JOYSTICK_DEAD_ZONE};
use crate::grid::Direction;
use crate::state::GameState;

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------

/// Debounced push button.
///
/// The debounced level only changes after `BUTTON_DEBOUNCE_SAMPLES`
/// consecutive raw samples disagree with it. Each debounced transition to
/// pressed latches one press for [`was_pressed`](Self::was_pressed).
#[derive(Debug, Clone, Default)]
pub struct Button {
    stable: bool,
    disagree: u8,
    pending: bool,
}

impl Button {
    pub const fn new() -> Self {
        Self {
            stable: false,
            disagree: 0,
            pending: false,
        }
    }

    /// Feed one raw sample (`true` = pressed).
    pub fn tick(&mut self, level: bool) {
        if level == self.stable {
            self.disagree = 0;
            return;
        }
        self.disagree += 1;
        if self.disagree >= BUTTON_DEBOUNCE_SAMPLES {
            self.stable = level;
            self.disagree = 0;
            if level {
                self.pending = true;
            }
        }
    }

    /// True once per physical press.
    pub fn was_pressed(&mut self) -> bool {
        core::mem::take(&mut self.pending)
    }

    /// Debounced level.
    pub fn is_down(&self) -> bool {
        self.stable
    }
}

// ---------------------------------------------------------------------------
// Joystick
// ---------------------------------------------------------------------------

/// 8-way stick reading. `N` is up on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StickDirection {
    Center,
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl StickDirection {
    /// Game heading for this reading. Diagonals with a vertical component
    /// resolve to that vertical; `Center` keeps the current heading.
    pub const fn heading(self) -> Option<Direction> {
        match self {
            StickDirection::N | StickDirection::NE | StickDirection::NW => Some(Direction::Up),
            StickDirection::S | StickDirection::SE | StickDirection::SW => Some(Direction::Down),
            StickDirection::E => Some(Direction::Right),
            StickDirection::W => Some(Direction::Left),
            StickDirection::Center => None,
        }
    }
}

/// Maps 12-bit analog axes to an 8-way direction with a centre dead zone.
/// A larger Y reading means the stick is pushed up.
#[derive(Debug, Clone, Copy)]
pub struct Joystick {
    center: u16,
    dead_zone: u16,
}

impl Joystick {
    pub const fn new() -> Self {
        Self::with_calibration(JOYSTICK_CENTER, JOYSTICK_DEAD_ZONE)
    }

    pub const fn with_calibration(center: u16, dead_zone: u16) -> Self {
        Self { center, dead_zone }
    }

    pub fn direction8(&self, x: u16, y: u16) -> StickDirection {
        let dx = x as i32 - self.center as i32;
        let dy = y as i32 - self.center as i32;
        let dz = self.dead_zone as i32;

        let east = dx > dz;
        let west = dx < -dz;
        let north = dy > dz;
        let south = dy < -dz;

        match (north, south, east, west) {
            (true, _, true, _) => StickDirection::NE,
            (true, _, _, true) => StickDirection::NW,
            (true, _, _, _) => StickDirection::N,
            (_, true, true, _) => StickDirection::SE,
            (_, true, _, true) => StickDirection::SW,
            (_, true, _, _) => StickDirection::S,
            (_, _, true, _) => StickDirection::E,
            (_, _, _, true) => StickDirection::W,
            _ => StickDirection::Center,
        }
    }
}

impl Default for Joystick {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// One raw poll of the input hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawInput {
    pub pause_down: bool,
    pub reset_down: bool,
    pub stick_x: u16,
    pub stick_y: u16,
}

impl RawInput {
    /// Nothing pressed, stick at rest.
    pub const IDLE: Self = Self {
        pause_down: false,
        reset_down: false,
        stick_x: JOYSTICK_CENTER,
        stick_y: JOYSTICK_CENTER,
    };
}

/// Debounced, edge-detected input for one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputSample {
    pub pause_pressed: bool,
    pub reset_pressed: bool,
    pub stick: StickDirection,
}

impl InputSample {
    pub const fn stick(stick: StickDirection) -> Self {
        Self {
            pause_pressed: false,
            reset_pressed: false,
            stick,
        }
    }
}

/// Pause button, reset button and joystick, polled together.
#[derive(Debug, Clone, Default)]
pub struct Controls {
    pause: Button,
    reset: Button,
    joystick: Joystick,
}

impl Controls {
    pub const fn new() -> Self {
        Self {
            pause: Button::new(),
            reset: Button::new(),
            joystick: Joystick::new(),
        }
    }

    pub fn sample(&mut self, raw: RawInput) -> InputSample {
        self.pause.tick(raw.pause_down);
        self.reset.tick(raw.reset_down);
        InputSample {
            pause_pressed: self.pause.was_pressed(),
            reset_pressed: self.reset.was_pressed(),
            stick: self.joystick.direction8(raw.stick_x, raw.stick_y),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Applies one input sample. Returns the heading committed by the stick,
/// if any.
pub fn resolve_input(
    sample: &InputSample,
    state: &GameState,
    audio: &AudioQueue,
) -> Option<Direction> {
    if sample.pause_pressed {
        let running = state.toggle_running();
        let _ = audio.post(BuzzerEvent::PAUSE);
        debug!("running = {}", running);
    }

    if sample.reset_pressed {
        state.request_reset();
        let _ = audio.post(BuzzerEvent::RESET);
        debug!("reset requested");
    }

    let direction = sample.stick.heading()?;
    let target = state.snake().head().step(direction);
    if state.snake().contains(target) {
        return None;
    }
    state.set_direction(direction);
    Some(direction)
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Position;

    fn fresh() -> (GameState, AudioQueue) {
        let state = GameState::new();
        state.reset();
        (state, AudioQueue::new())
    }

    #[test]
    fn test_button_fires_once_per_press() {
        let mut button = Button::new();
        let mut presses = 0;
        // Bouncy press, long hold, bouncy release, second press
        let levels = [
            true, false, true, true, true, true, true, true, true, true, false, true, false,
            false, false, false, true, true, true, true,
        ];
        for level in levels {
            button.tick(level);
            if button.was_pressed() {
                presses += 1;
            }
        }
        assert_eq!(presses, 2);
        assert!(button.is_down());
    }

    #[test]
    fn test_button_ignores_short_glitch() {
        let mut button = Button::new();
        for level in [true, true, false, true, false] {
            button.tick(level);
        }
        assert!(!button.was_pressed());
        assert!(!button.is_down());
    }

    #[test]
    fn test_joystick_eight_way() {
        let js = Joystick::new();
        let (lo, mid, hi) = (100, JOYSTICK_CENTER, 4000);
        assert_eq!(js.direction8(mid, mid), StickDirection::Center);
        assert_eq!(js.direction8(mid + 500, mid - 500), StickDirection::Center);
        assert_eq!(js.direction8(mid, hi), StickDirection::N);
        assert_eq!(js.direction8(hi, hi), StickDirection::NE);
        assert_eq!(js.direction8(hi, mid), StickDirection::E);
        assert_eq!(js.direction8(hi, lo), StickDirection::SE);
        assert_eq!(js.direction8(mid, lo), StickDirection::S);
        assert_eq!(js.direction8(lo, lo), StickDirection::SW);
        assert_eq!(js.direction8(lo, mid), StickDirection::W);
        assert_eq!(js.direction8(lo, hi), StickDirection::NW);
    }

    #[test]
    fn test_stick_heading_collapse() {
        use StickDirection::*;
        for s in [N, NE, NW] {
            assert_eq!(s.heading(), Some(Direction::Up));
        }
        for s in [S, SE, SW] {
            assert_eq!(s.heading(), Some(Direction::Down));
        }
        assert_eq!(E.heading(), Some(Direction::Right));
        assert_eq!(W.heading(), Some(Direction::Left));
        assert_eq!(Center.heading(), None);
    }

    #[test]
    fn test_reversal_into_neck_rejected() {
        let (state, audio) = fresh();
        assert_eq!(state.direction(), Direction::Right);

        let turned = resolve_input(&InputSample::stick(StickDirection::W), &state, &audio);
        assert_eq!(turned, None);
        assert_eq!(state.direction(), Direction::Right);
    }

    #[test]
    fn test_free_turn_committed() {
        let (state, audio) = fresh();
        let turned = resolve_input(&InputSample::stick(StickDirection::NE), &state, &audio);
        assert_eq!(turned, Some(Direction::Up));
        assert_eq!(state.direction(), Direction::Up);

        let turned = resolve_input(&InputSample::stick(StickDirection::Center), &state, &audio);
        assert_eq!(turned, None);
        assert_eq!(state.direction(), Direction::Up);
        assert!(audio.is_empty());
    }

    #[test]
    fn test_turn_blocked_across_wrap() {
        let (state, audio) = fresh();
        // Head on the left edge, a segment on the right edge of the same row
        state.snake().place(&[
            Position::new(0, 4),
            Position::new(0, 5),
            Position::new(15, 5),
            Position::new(15, 4),
        ]);
        state.set_direction(Direction::Up);
        let turned = resolve_input(&InputSample::stick(StickDirection::W), &state, &audio);
        assert_eq!(turned, None);
        assert_eq!(state.direction(), Direction::Up);
    }

    #[test]
    fn test_pause_and_reset_buttons() {
        let (state, audio) = fresh();
        let sample = InputSample {
            pause_pressed: true,
            reset_pressed: true,
            stick: StickDirection::Center,
        };
        resolve_input(&sample, &state, &audio);

        assert!(!state.is_running());
        assert!(state.needs_reset());
        assert_eq!(audio.try_receive(), Some(BuzzerEvent::PAUSE));
        assert_eq!(audio.try_receive(), Some(BuzzerEvent::RESET));

        resolve_input(&InputSample { reset_pressed: false, ..sample }, &state, &audio);
        assert!(state.is_running());
    }

    #[test]
    fn test_controls_held_pause_toggles_once() {
        let (state, audio) = fresh();
        let mut controls = Controls::new();
        let held = RawInput { pause_down: true, ..RawInput::IDLE };
        for _ in 0..20 {
            let sample = controls.sample(held);
            resolve_input(&sample, &state, &audio);
        }
        assert!(!state.is_running());
        assert_eq!(audio.len(), 1);
    }
}
