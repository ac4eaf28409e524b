//! # Scheduler
//!
//! Preemptive fixed-priority scheduler with round-robin among equal
//! priorities, tick-based sleeping and latched task notifications.
//!
//! ## Scheduling Algorithm
//!
//! At each SysTick interrupt:
//! 1. **Advance time**: increment the tick counter, charge the running task
//! 2. **Time slice**: on expiry, request a switch if an equal-priority task
//!    is ready (round-robin)
//! 3. **Wake sleepers** whose wake tick has passed; request a switch if one
//!    outranks the running task
//! 4. **Select next task** (in PendSV): highest-priority runnable task,
//!    searching from the slot after the current one so equals rotate
//!
//! Slot 0 holds the idle task, which never blocks, so selection always
//! finds a runnable task.

use crate::config::{MAX_TASKS, STACK_SIZE};
use crate::error::{Error, Result};
use crate::task::{BlockReason, TaskConfig, TaskControlBlock, TaskEntry, TaskState};

// ---------------------------------------------------------------------------
// Scheduler struct
// ---------------------------------------------------------------------------

/// The central scheduler state. Stored as a global in `kernel.rs`.
pub struct Scheduler {
    /// Fixed-size array of TCBs. Index 0 is reserved for the idle task.
    pub tasks: [TaskControlBlock; MAX_TASKS],

    /// Index of the currently running task.
    pub current_task: usize,

    /// Number of allocated tasks (including the idle task).
    pub task_count: usize,

    /// Monotonic tick counter.
    pub tick_count: u64,

    /// Set when a context switch should happen at the next opportunity.
    pub needs_reschedule: bool,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            tasks: [TaskControlBlock::EMPTY; MAX_TASKS],
            current_task: 0,
            task_count: 0,
            tick_count: 0,
            needs_reschedule: false,
        }
    }

    /// Register a new task. `arg` is passed to `entry` in R0.
    ///
    /// # Returns
    /// - `Ok(task_id)`: the index of the newly created task
    /// - `Err(Error::TaskTableFull)`: the task array is full
    pub fn create_task(&mut self, entry: TaskEntry, arg: usize, config: TaskConfig) -> Result<usize> {
        if self.task_count >= MAX_TASKS {
            return Err(Error::TaskTableFull);
        }

        let id = self.task_count;
        self.tasks[id].init(id, config);
        init_task_stack(&mut self.tasks[id], entry, arg);

        self.task_count += 1;
        Ok(id)
    }

    /// Called from the SysTick handler every tick.
    pub fn tick(&mut self) {
        self.tick_count += 1;
        let now = self.tick_count;

        let current = self.current_task;
        let current_priority = self.tasks[current].priority();
        let current_runnable = self.tasks[current].is_runnable();

        if current_runnable {
            let tcb = &mut self.tasks[current];
            tcb.total_ticks = tcb.total_ticks.wrapping_add(1);
            tcb.ticks_remaining = tcb.ticks_remaining.saturating_sub(1);
            if tcb.ticks_remaining == 0 {
                tcb.refill_slice();
                if self.has_ready_peer(current) {
                    self.needs_reschedule = true;
                }
            }
        }

        for i in 0..self.task_count {
            if self.tasks[i].wake_if_due(now)
                && (!current_runnable || self.tasks[i].priority() > current_priority)
            {
                self.needs_reschedule = true;
            }
        }
    }

    /// True if another ready task shares the priority of `index`.
    fn has_ready_peer(&self, index: usize) -> bool {
        let priority = self.tasks[index].priority();
        (0..self.task_count)
            .any(|i| i != index && self.tasks[i].state == TaskState::Ready && self.tasks[i].priority() == priority)
    }

    /// Select the next task to run and mark it Running.
    ///
    /// # Returns
    /// Index of the next task to run.
    pub fn schedule(&mut self) -> usize {
        let count = self.task_count.max(1);
        let mut best_task = 0;
        let mut best_priority: i32 = -1;

        for offset in 1..=count {
            let i = (self.current_task + offset) % count;
            if !self.tasks[i].is_runnable() {
                continue;
            }
            let priority = self.tasks[i].priority() as i32;
            if priority > best_priority {
                best_priority = priority;
                best_task = i;
            }
        }

        let prev = self.current_task;
        if self.tasks[prev].state == TaskState::Running {
            self.tasks[prev].state = TaskState::Ready;
        }
        if best_task < self.task_count {
            self.tasks[best_task].state = TaskState::Running;
        }

        self.current_task = best_task;
        self.needs_reschedule = false;
        best_task
    }

    /// Give up the rest of the current slice.
    pub fn yield_current(&mut self) {
        let current = self.current_task;
        if self.tasks[current].is_active() {
            self.tasks[current].refill_slice();
            self.needs_reschedule = true;
        }
    }

    /// Block the current task for `ticks` ticks. A zero delay just yields.
    pub fn sleep_current(&mut self, ticks: u32) {
        if ticks == 0 {
            self.yield_current();
            return;
        }
        let until = self.tick_count + ticks as u64;
        let _ = self.block_current(BlockReason::Sleep { until });
    }

    /// Fixed-rate sleep: block until `*last_wake + period`, then advance
    /// `*last_wake` by one period. If that tick has already passed the task
    /// keeps running, so a late task catches up instead of drifting.
    pub fn sleep_until_current(&mut self, last_wake: &mut u64, period: u32) {
        let next = *last_wake + period as u64;
        *last_wake = next;
        if next > self.tick_count {
            let _ = self.block_current(BlockReason::Sleep { until: next });
        }
    }

    /// Block the current task until notified, unless a notification is
    /// already latched. Returns true if the task blocked.
    pub fn wait_notification_current(&mut self) -> bool {
        let current = self.current_task;
        if self.tasks[current].take_notification() {
            return false;
        }
        self.block_current(BlockReason::Notification)
    }

    /// Notify task `id`. Requests a switch if the task was waiting and now
    /// outranks the running task.
    pub fn notify(&mut self, id: usize) {
        if id >= self.task_count {
            return;
        }
        if self.tasks[id].deliver_notification()
            && self.tasks[id].priority() > self.tasks[self.current_task].priority()
        {
            self.needs_reschedule = true;
        }
    }

    /// Returns false for the idle task, which must stay runnable.
    fn block_current(&mut self, reason: BlockReason) -> bool {
        let current = self.current_task;
        if current == 0 {
            return false;
        }
        self.tasks[current].state = TaskState::Blocked(reason);
        self.needs_reschedule = true;
        true
    }

    pub fn current_tcb_mut(&mut self) -> &mut TaskControlBlock {
        &mut self.tasks[self.current_task]
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Stack initialization helper
// ---------------------------------------------------------------------------

/// Lay out the initial exception frame so the first PendSV "return" (or
/// the first-task launch) starts executing `entry(arg)`.
///
/// ```text
/// [Hardware stacked frame]   <- high address
///   xPSR  (Thumb bit set)
///   PC    (task entry point)
///   LR    (task_exit)
///   R12, R3, R2, R1 (0)
///   R0    (arg)
/// [Software saved context]
///   R11 .. R4 (0)            <- stack_pointer after init
/// ```
fn init_task_stack(tcb: &mut TaskControlBlock, entry: TaskEntry, arg: usize) {
    let stack_top = tcb.stack.0.as_mut_ptr() as usize + STACK_SIZE;
    // Align to 8 bytes (AAPCS requirement)
    let aligned_top = stack_top & !0x07;

    // 16 registers: 8 software-saved + 8 hardware-stacked
    let frame_ptr = (aligned_top - 16 * 4) as *mut u32;

    let frame: [u32; 16] = [
        0, 0, 0, 0, 0, 0, 0, 0, // R4–R11
        arg as u32,             // R0
        0,                      // R1
        0,                      // R2
        0,                      // R3
        0,                      // R12
        task_exit as usize as u32,
        entry as usize as u32,
        0x0100_0000, // xPSR, Thumb bit
    ];

    // Safety: the 64-byte frame lies inside this task's own stack.
    unsafe {
        for (i, word) in frame.iter().enumerate() {
            frame_ptr.add(i).write(*word);
        }
    }

    tcb.stack_pointer = frame_ptr;
}

/// Landing pad for a task entry that returns (the signature forbids it).
extern "C" fn task_exit() -> ! {
    loop {
        #[cfg(all(target_arch = "arm", target_os = "none"))]
        cortex_m::asm::wfi();
        #[cfg(not(all(target_arch = "arm", target_os = "none")))]
        core::hint::spin_loop();
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
