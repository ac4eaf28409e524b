//! # eqsnake Configuration
//!
//! Compile-time constants for the game and the task runtime.
//! All limits are fixed at compile time. Nothing is heap allocated.

// ---------------------------------------------------------------------------
// Game geometry and capacities
// ---------------------------------------------------------------------------

/// Width and height of the square, toroidal play field in cells.
/// A 128×128 LCD renders each cell as an 8×8 pixel block.
pub const GRID_SIZE: u8 = 16;

/// Maximum number of snake segments, and maximum number of simultaneously
/// live fruit. The snake body reserves one extra slot for the shift that
/// precedes every move.
pub const MAX_LEN: usize = 64;

/// Snake length right after a reset.
pub const INITIAL_SNAKE_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Task periods (milliseconds)
// ---------------------------------------------------------------------------

/// Button and joystick sampling period.
pub const INPUT_TICK_MS: u32 = 10;

/// Fruit generation period.
pub const FRUIT_TICK_MS: u32 = 250;

/// Movement period. One cell per tick.
pub const SNAKE_TICK_MS: u32 = 150;

/// Render period (~30 Hz).
pub const RENDER_TICK_MS: u32 = 33;

// ---------------------------------------------------------------------------
// Fruit generation
// ---------------------------------------------------------------------------

/// Probability that one more placement attempt is made in a fruit tick.
/// Each tick places zero fruit ~90% of the time.
pub const FRUIT_SPAWN_PROBABILITY: f64 = 0.1;

/// Hard bound on placement attempts per fruit tick.
pub const FRUIT_MAX_ATTEMPTS: u8 = 8;

/// Seed for the fruit generator PRNG.
pub const RNG_SEED: u64 = 0x5EED_CAFE_F00D_0001;

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Capacity of the buzzer event queue. Posting to a full queue drops the
/// newest event.
pub const AUDIO_QUEUE_CAPACITY: usize = 4;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Consecutive pressed samples required before a button press registers.
/// At `INPUT_TICK_MS` = 10 this is a 30 ms debounce window.
pub const BUTTON_DEBOUNCE_SAMPLES: u8 = 3;

/// Rest reading of a 12-bit joystick axis.
pub const JOYSTICK_CENTER: u16 = 2048;

/// Distance from `JOYSTICK_CENTER` an axis must travel before it counts
/// as deflected.
pub const JOYSTICK_DEAD_ZONE: u16 = 600;

// ---------------------------------------------------------------------------
// Task runtime
// ---------------------------------------------------------------------------

/// Maximum number of tasks, idle task included.
/// This bounds the static TCB array. Each task consumes `STACK_SIZE`
/// bytes of RAM.
pub const MAX_TASKS: usize = 8;

/// SysTick frequency in Hz. One tick is one millisecond.
pub const TICK_HZ: u32 = 1000;

/// Default time slice in ticks for round-robin among equal priorities.
pub const DEFAULT_TIME_SLICE: u32 = 10;

/// Per-task stack size in bytes. Must be large enough for the
/// deepest call chain plus the hardware exception frame (32 bytes)
/// and the software-saved context (32 bytes for R4–R11).
pub const STACK_SIZE: usize = 2048;

/// Core clock after PLL configuration (TM4C1294 at 120 MHz).
pub const SYSTEM_CLOCK_HZ: u32 = 120_000_000;

/// Task priorities (higher preempts lower). The idle task runs at 0.
pub const FRUIT_TASK_PRIORITY: u8 = 2;
pub const INPUT_TASK_PRIORITY: u8 = 2;
pub const SNAKE_TASK_PRIORITY: u8 = 3;
pub const RENDER_TASK_PRIORITY: u8 = 1;
pub const AUDIO_TASK_PRIORITY: u8 = 1;

/// Converts milliseconds to scheduler ticks.
#[inline]
pub const fn ms_to_ticks(ms: u32) -> u32 {
    ms * TICK_HZ / 1000
}
