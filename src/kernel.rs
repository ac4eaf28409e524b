//! # Kernel
//!
//! Global scheduler instance and the task-facing runtime API.
//! Thread-mode calls go through critical sections; the SysTick and PendSV
//! handlers share one priority and therefore never interleave.
//!
//! ## Startup Sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► kernel::init()        ← idle task in slot 0
//!         ├─► kernel::create_task() ← game tasks (×5)
//!         └─► kernel::start()       ← no return
//!               ├─► Configure SysTick
//!               ├─► Set handler priorities
//!               └─► Launch the highest-priority task
//! ```

use core::ptr::addr_of_mut;

use crate::arch::cortex_m4;
use crate::config::ms_to_ticks;
use crate::error::Result;
use crate::scheduler::Scheduler;
use crate::sync;
use crate::task::{TaskConfig, TaskEntry};

// ---------------------------------------------------------------------------
// Global scheduler instance
// ---------------------------------------------------------------------------

/// Only reached through [`with_scheduler`].
static mut SCHEDULER: Scheduler = Scheduler::new();

/// Run `f` with exclusive access to the scheduler.
pub(crate) fn with_scheduler<R>(f: impl FnOnce(&mut Scheduler) -> R) -> R {
    sync::critical_section(|_cs| {
        // Safety: the critical section excludes every other thread-mode
        // caller, and the handlers that call this share one priority.
        let scheduler = unsafe { &mut *addr_of_mut!(SCHEDULER) };
        f(scheduler)
    })
}

/// Update the scheduler and pend a context switch if it asked for one.
fn with_scheduler_then_switch<R>(f: impl FnOnce(&mut Scheduler) -> R) -> R {
    let (result, switch) = with_scheduler(|scheduler| {
        let result = f(scheduler);
        (result, scheduler.needs_reschedule)
    });
    if switch {
        cortex_m4::trigger_pendsv();
    }
    result
}

// ---------------------------------------------------------------------------
// Kernel API
// ---------------------------------------------------------------------------

extern "C" fn idle_task(_: usize) -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}

/// Initialize the kernel and create the idle task.
///
/// Must be called exactly once, from `main`, before any other kernel
/// function.
pub fn init() -> Result<()> {
    with_scheduler(|scheduler| {
        *scheduler = Scheduler::new();
        scheduler
            .create_task(idle_task, 0, TaskConfig::with_priority(0))
            .map(|_| ())
    })
}

/// Create a task. `arg` is handed to `entry` as its only parameter,
/// typically the address of a `'static` shared context.
pub fn create_task(entry: TaskEntry, arg: usize, config: TaskConfig) -> Result<usize> {
    let id = with_scheduler(|scheduler| scheduler.create_task(entry, arg, config))?;
    info!("task {} created, priority {}", id, config.priority);
    Ok(id)
}

/// Start the scheduler. **Does not return.**
pub fn start(mut core_peripherals: cortex_m::Peripherals) -> ! {
    cortex_m4::configure_systick(&mut core_peripherals.SYST);
    cortex_m4::set_interrupt_priorities(&mut core_peripherals.SCB);

    let first_sp = with_scheduler(|scheduler| {
        let first = scheduler.schedule();
        info!("scheduler starting with task {}", first);
        scheduler.tasks[first].stack_pointer as *const u32
    });

    // Safety: `first_sp` is a frame laid out by `Scheduler::create_task`.
    unsafe { cortex_m4::start_first_task(first_sp) }
}

/// Ticks elapsed since `start`.
pub fn now() -> u64 {
    with_scheduler(|scheduler| scheduler.tick_count)
}

/// Give up the rest of the current time slice.
pub fn yield_task() {
    with_scheduler_then_switch(|scheduler| scheduler.yield_current());
}

/// Block the calling task for `ms` milliseconds.
pub fn delay_ms(ms: u32) {
    with_scheduler_then_switch(|scheduler| scheduler.sleep_current(ms_to_ticks(ms)));
}

/// Block until one `period_ms` after `*last_wake`, advancing `*last_wake`.
/// Initialize `last_wake` with [`now`].
pub fn delay_until(last_wake: &mut u64, period_ms: u32) {
    with_scheduler_then_switch(|scheduler| {
        scheduler.sleep_until_current(last_wake, ms_to_ticks(period_ms))
    });
}

/// Block the calling task until another task calls [`notify`] on it.
/// Returns at once if a notification is already pending.
pub fn wait_notification() {
    with_scheduler_then_switch(|scheduler| {
        scheduler.wait_notification_current();
    });
}

/// Wake task `id` if it waits for a notification, otherwise latch one.
pub fn notify(id: usize) {
    with_scheduler_then_switch(|scheduler| scheduler.notify(id));
}
