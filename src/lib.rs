//! # eqsnake: real-time Snake on a Cortex-M4
//!
//! Snake split across five preemptive tasks that share one game record.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Tasks (main.rs)                                                 │
//! │  input 10ms · fruit 250ms · snake 150ms · render 33ms · audio    │
//! ├───────────────┬──────────────┬──────────────┬────────────────────┤
//! │ Input Resolver│ Fruit Gen.   │ Movement /   │ Audio Event Queue  │
//! │ input.rs      │ fruit.rs     │ Collision    │ audio.rs           │
//! │ ─ debounce    │ ─ Bernoulli  │ engine.rs    │ ─ bounded FIFO     │
//! │ ─ 8-way stick │   placement  │ ─ shift/wrap │ ─ drop newest      │
//! │ ─ safe turns  │              │ ─ eat/lose   │ ─ sequential play  │
//! ├───────────────┴──────────────┴──────────────┴────────────────────┤
//! │  Game State Model (state.rs)  ·  Presentation contract (render.rs)│
//! │  atomics for single-writer fields, critical section for fruit    │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  Geometry (grid.rs) · Config (config.rs) · Errors (error.rs)     │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  Task runtime: task.rs · scheduler.rs · kernel.rs · arch/        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Memory Model
//!
//! - **No heap**: all state is statically allocated
//! - **Fixed capacity**: snake and fruit hold at most `MAX_LEN` cells and
//!   refuse further growth instead of overrunning
//! - **One lock**: only the fruit set is behind a critical section; the
//!   rest is single-writer atomics with relaxed cross-field consistency
//!
//! The game core and the scheduler build and test on the host; the kernel
//! and Cortex-M4 port only exist for `arm-none` targets.

#![no_std]

#[cfg(test)]
extern crate std;

// Must come first so the logging macros are visible to every module
mod fmt;

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod fruit;
pub mod grid;
pub mod input;
pub mod render;
pub mod scheduler;
pub mod state;
pub mod sync;
pub mod task;

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod arch;
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod kernel;

pub use error::{Error, Result};
