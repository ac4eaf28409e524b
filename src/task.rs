//! # Task Control Block
//!
//! Defines the task model of the runtime. Every game activity (input,
//! fruit, movement, render, audio) is one task with a fixed priority, its
//! own inline stack, and a small amount of blocking state.
//!
//! ```text
//!   ┌──────────┐     schedule()      ┌─────────┐
//!   │  Ready   │ ──────────────────► │ Running │
//!   └──────────┘                     └─────────┘
//!        ▲        preempt / slice         │
//!        ├────────────────────────────────┤
//!        │                                │ delay() / wait_notification()
//!        │   tick() past wake / notify()  ▼
//!        │                          ┌──────────┐
//!        └───────────────────────── │ Blocked  │
//!                                   └──────────┘
//! ```

use crate::config::{DEFAULT_TIME_SLICE, STACK_SIZE};

/// Task entry point. Receives the `arg` given at creation in R0 and never
/// returns.
pub type TaskEntry = extern "C" fn(usize) -> !;

// ---------------------------------------------------------------------------
// Task state machine
// ---------------------------------------------------------------------------

/// Why a blocked task is waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// Sleeping until the tick counter reaches this value.
    Sleep { until: u64 },
    /// Waiting for [`notify`](crate::scheduler::Scheduler::notify).
    Notification,
}

/// Execution state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Ready,
    Running,
    Blocked(BlockReason),
    /// Free slot; never scheduled.
    Unused,
}

// ---------------------------------------------------------------------------
// Task configuration
// ---------------------------------------------------------------------------

/// Static configuration for a task, set at creation time.
#[derive(Debug, Clone, Copy)]
pub struct TaskConfig {
    /// Fixed priority (higher = more important). 0 is the idle task.
    pub priority: u8,

    /// Round-robin slice in ticks among equal priorities.
    /// 0 means `DEFAULT_TIME_SLICE`.
    pub time_slice: u32,
}

impl TaskConfig {
    pub const fn with_priority(priority: u8) -> Self {
        Self {
            priority,
            time_slice: 0,
        }
    }

    /// Returns the effective time slice, falling back to the system default.
    #[inline]
    pub const fn effective_time_slice(&self) -> u32 {
        if self.time_slice > 0 {
            self.time_slice
        } else {
            DEFAULT_TIME_SLICE
        }
    }
}

// ---------------------------------------------------------------------------
// Task Control Block
// ---------------------------------------------------------------------------

/// Per-task stack, aligned to 8 bytes as required by the ARM AAPCS.
#[repr(C, align(8))]
pub struct TaskStack(pub [u8; STACK_SIZE]);

/// Task Control Block. Stored inline in the scheduler's fixed array.
pub struct TaskControlBlock {
    pub id: usize,

    pub state: TaskState,

    pub config: TaskConfig,

    /// Saved process stack pointer. Points into `self.stack` and is
    /// updated on every context switch.
    pub stack_pointer: *mut u32,

    pub stack: TaskStack,

    /// Remaining ticks in the current time slice.
    pub ticks_remaining: u32,

    /// Total ticks this task has been Running.
    pub total_ticks: u32,

    /// A notification arrived while the task was not waiting for one.
    /// The next `wait_notification` consumes it without blocking.
    pub notified: bool,
}

// Safety: `stack_pointer` always points into the task's own stack. TCBs are
// only touched inside critical sections or from the PendSV/SysTick handlers.
unsafe impl Send for TaskControlBlock {}
unsafe impl Sync for TaskControlBlock {}

impl TaskControlBlock {
    /// A free slot. Used to initialize the static array.
    pub const EMPTY: Self = Self {
        id: 0,
        state: TaskState::Unused,
        config: TaskConfig::with_priority(0),
        stack_pointer: core::ptr::null_mut(),
        stack: TaskStack([0u8; STACK_SIZE]),
        ticks_remaining: 0,
        total_ticks: 0,
        notified: false,
    };

    /// Initialize a TCB for a new task. The stack frame is laid out
    /// separately by the scheduler.
    pub fn init(&mut self, id: usize, config: TaskConfig) {
        self.id = id;
        self.state = TaskState::Ready;
        self.config = config;
        self.ticks_remaining = config.effective_time_slice();
        self.total_ticks = 0;
        self.notified = false;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state != TaskState::Unused
    }

    #[inline]
    pub fn is_runnable(&self) -> bool {
        matches!(self.state, TaskState::Ready | TaskState::Running)
    }

    #[inline]
    pub fn priority(&self) -> u8 {
        self.config.priority
    }

    /// Moves a sleeper whose wake tick has passed back to Ready.
    /// Returns true if the task woke.
    pub fn wake_if_due(&mut self, now: u64) -> bool {
        match self.state {
            TaskState::Blocked(BlockReason::Sleep { until }) if until <= now => {
                self.state = TaskState::Ready;
                true
            }
            _ => false,
        }
    }

    /// Delivers a notification. Returns true if it unblocked the task;
    /// otherwise the notification is latched.
    pub fn deliver_notification(&mut self) -> bool {
        match self.state {
            TaskState::Blocked(BlockReason::Notification) => {
                self.state = TaskState::Ready;
                true
            }
            TaskState::Unused => false,
            _ => {
                self.notified = true;
                false
            }
        }
    }

    /// Consumes a latched notification, if any.
    #[inline]
    pub fn take_notification(&mut self) -> bool {
        core::mem::take(&mut self.notified)
    }

    /// Refills the round-robin slice.
    #[inline]
    pub fn refill_slice(&mut self) {
        self.ticks_remaining = self.config.effective_time_slice();
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
