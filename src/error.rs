//! # Error Taxonomy
//!
//! Every failure the game core can observe is a capacity check that refused
//! to write past a fixed bound. None of them corrupt state; the caller
//! decides whether the condition is fatal (task table at startup) or
//! ignorable (a dropped tone).

/// Errors returned by fixed-capacity containers and the task runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The fruit set already holds `MAX_LEN` entries.
    #[error("fruit set is full")]
    FruitSetFull,

    /// The snake already has `MAX_LEN` segments.
    #[error("snake is at maximum length")]
    SnakeFull,

    /// The buzzer queue is full; the newest event was dropped.
    #[error("audio queue is full, event dropped")]
    AudioQueueFull,

    /// No free slot left in the task table.
    #[error("task table is full")]
    TaskTableFull,
}

pub type Result<T> = core::result::Result<T, Error>;
