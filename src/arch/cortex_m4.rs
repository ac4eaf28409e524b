//! # Cortex-M4 Port Layer
//!
//! Hardware-specific code for the ARM Cortex-M4 (Thumb-2) processor:
//! SysTick configuration, PendSV context switching and first-task launch.
//!
//! ## Context Switch Mechanism
//!
//! Tasks run in Thread mode on the PSP; the kernel and handlers use the MSP.
//! On exception entry the hardware stacks R0–R3, R12, LR, PC and xPSR onto
//! the process stack. PendSV saves and restores R4–R11, which completes the
//! context. The build targets `thumbv7em-none-eabi` (soft float), so no FPU
//! registers are part of a task's context.
//!
//! ## Interrupt Priorities
//!
//! SysTick and PendSV both run at the lowest priority, so they never
//! preempt each other and never delay device interrupts.

use core::arch::{asm, naked_asm};

use cortex_m::peripheral::scb::SystemHandler;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::{SCB, SYST};
use cortex_m_rt::exception;

use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ};
use crate::kernel;

/// Lowest priority with the 3 implemented priority bits of the TM4C129.
const LOWEST_PRIORITY: u8 = 0xE0;

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Configure SysTick to fire at `TICK_HZ` from the core clock.
pub fn configure_systick(syst: &mut SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

/// Put PendSV and SysTick at the lowest priority.
pub fn set_interrupt_priorities(scb: &mut SCB) {
    // Safety: changing handler priorities before the scheduler starts
    // cannot break any priority-based critical section.
    unsafe {
        scb.set_priority(SystemHandler::PendSV, LOWEST_PRIORITY);
        scb.set_priority(SystemHandler::SysTick, LOWEST_PRIORITY);
    }
}

/// Pend a context switch. It runs as soon as no other handler is active
/// and interrupts are unmasked.
#[inline]
pub fn trigger_pendsv() {
    SCB::set_pendsv();
    cortex_m::asm::dsb();
    cortex_m::asm::isb();
}

// ---------------------------------------------------------------------------
// First task launch
// ---------------------------------------------------------------------------

/// Switch Thread mode to the PSP and branch into the first task.
///
/// # Safety
/// Must only be called once, with a stack pointer produced by the
/// scheduler's frame initialization.
pub unsafe fn start_first_task(psp: *const u32) -> ! {
    asm!(
        // Skip the software-saved R4–R11 and make the rest the PSP
        "adds r0, #32",
        "msr psp, r0",

        // Thread mode uses the PSP from here on (CONTROL.SPSEL = 1)
        "movs r0, #2",
        "msr control, r0",
        "isb",

        // Unwind the hardware frame by hand: R0 carries the task argument
        "pop {{r0-r3, r12}}",
        "pop {{r4}}",          // LR (task_exit)
        "pop {{r5}}",          // PC (entry)
        "pop {{r6}}",          // xPSR (discarded)
        "mov lr, r4",

        "cpsie i",
        "bx r5",

        in("r0") psp,
        options(noreturn)
    );
}

// ---------------------------------------------------------------------------
// PendSV handler (context switch)
// ---------------------------------------------------------------------------

/// Save the outgoing task's R4–R11, pick the next task, restore its R4–R11
/// and return to Thread mode on its PSP.
///
/// # Safety
/// Entered only by the NVIC as the PendSV exception.
#[unsafe(naked)]
#[no_mangle]
pub unsafe extern "C" fn PendSV() {
    naked_asm!(
        "mrs r0, psp",
        "stmdb r0!, {{r4-r11}}",
        "bl {save_context}",

        // Returns the next task's PSP in r0
        "bl {do_schedule}",

        "ldmia r0!, {{r4-r11}}",
        "msr psp, r0",

        // EXC_RETURN: Thread mode, PSP, basic frame
        "ldr r0, =0xFFFFFFFD",
        "bx r0",

        save_context = sym save_current_context,
        do_schedule = sym do_context_switch,
    );
}

/// Store the outgoing task's stack pointer. Called from PendSV.
unsafe extern "C" fn save_current_context(psp: *mut u32) {
    kernel::with_scheduler(|scheduler| {
        scheduler.current_tcb_mut().stack_pointer = psp;
    });
}

/// Select the next task and return its saved stack pointer. Called from
/// PendSV.
unsafe extern "C" fn do_context_switch() -> *mut u32 {
    kernel::with_scheduler(|scheduler| {
        let next = scheduler.schedule();
        scheduler.tasks[next].stack_pointer
    })
}

// ---------------------------------------------------------------------------
// SysTick handler
// ---------------------------------------------------------------------------

#[exception]
fn SysTick() {
    let switch = kernel::with_scheduler(|scheduler| {
        scheduler.tick();
        scheduler.needs_reschedule
    });
    if switch {
        trigger_pendsv();
    }
}
