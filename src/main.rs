//! # eqsnake Firmware
//!
//! Wires the game core to five kernel tasks:
//!
//! | Task | Priority | Period | Work |
//! |------|----------|--------|------|
//! | `snake_task` | 3 | 150 ms | reset on request, advance one cell |
//! | `input_task` | 2 | 10 ms | debounce buttons, map stick, resolve |
//! | `fruit_task` | 2 | 250 ms | place fruit |
//! | `render_task` | 1 | 33 ms | snapshot and present |
//! | `audio_task` | 1 | on event | play queued tones back to back |
//!
//! The board adapters in this build trace frames and tones over RTT and
//! report a resting joystick with no buttons held. Display, PWM and ADC
//! drivers plug in behind `Presenter`, `ToneDriver` and `InputSource`.

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicUsize, Ordering};

use cortex_m_rt::entry;
use defmt_rtt as _;
use panic_halt as _;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use eqsnake::audio::{self, AudioQueue, ToneDriver};
use eqsnake::config::{
    AUDIO_TASK_PRIORITY, FRUIT_TASK_PRIORITY, FRUIT_TICK_MS, GRID_SIZE, INPUT_TASK_PRIORITY,
    INPUT_TICK_MS, RENDER_TASK_PRIORITY, RENDER_TICK_MS, RNG_SEED, SNAKE_TASK_PRIORITY,
    SNAKE_TICK_MS,
};
use eqsnake::engine::{self, StepOutcome};
use eqsnake::fruit::FruitGenerator;
use eqsnake::input::{self, Controls, RawInput};
use eqsnake::kernel;
use eqsnake::render::{Presenter, Snapshot};
use eqsnake::state::GameState;
use eqsnake::task::TaskConfig;
use eqsnake::Error;

// ---------------------------------------------------------------------------
// Shared context
// ---------------------------------------------------------------------------

static GAME: GameState = GameState::new();
static AUDIO: AudioQueue = AudioQueue::with_wake(wake_audio_task);

/// Kernel id of the playback task, set once before the scheduler starts.
static AUDIO_TASK: AtomicUsize = AtomicUsize::new(usize::MAX);

/// Handles every task receives at creation.
struct Shared {
    game: &'static GameState,
    audio: &'static AudioQueue,
}

static SHARED: Shared = Shared {
    game: &GAME,
    audio: &AUDIO,
};

/// Recovers the context from a task argument.
fn shared(arg: usize) -> &'static Shared {
    // Safety: every task is created with `&SHARED` as its argument.
    unsafe { &*(arg as *const Shared) }
}

fn wake_audio_task() {
    let id = AUDIO_TASK.load(Ordering::Relaxed);
    if id != usize::MAX {
        kernel::notify(id);
    }
}

// ---------------------------------------------------------------------------
// Board adapters
// ---------------------------------------------------------------------------

/// Source of raw input levels.
trait InputSource {
    fn read(&mut self) -> RawInput;
}

/// No input hardware: stick at rest, nothing pressed.
struct RestingInput;

impl InputSource for RestingInput {
    fn read(&mut self) -> RawInput {
        RawInput::IDLE
    }
}

/// Traces tones instead of driving a buzzer.
struct RttBuzzer;

impl ToneDriver for RttBuzzer {
    fn start_tone(&mut self, frequency_hz: u16) {
        defmt::debug!("tone on {=u16} Hz", frequency_hz);
    }

    fn stop_tone(&mut self) {
        defmt::debug!("tone off");
    }
}

/// Dumps a text frame whenever the picture changes.
struct RttPresenter {
    last: Option<Snapshot>,
}

impl Presenter for RttPresenter {
    type Error = core::convert::Infallible;

    fn present(&mut self, frame: &Snapshot) -> Result<(), Self::Error> {
        if self.last.as_ref() == Some(frame) {
            return Ok(());
        }
        defmt::info!(
            "score {=u16} running {=bool} lose {=bool}",
            frame.score,
            frame.running,
            frame.lose
        );
        for y in 0..GRID_SIZE {
            let row = frame.row(y);
            defmt::info!("{=[u8]:a}", &row[..]);
        }
        self.last = Some(frame.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

extern "C" fn snake_task(arg: usize) -> ! {
    let ctx = shared(arg);
    let mut last_wake = kernel::now();
    loop {
        if engine::snake_tick(ctx.game, ctx.audio) == StepOutcome::Collided {
            defmt::info!("game over, score {=u16}", ctx.game.score());
        }
        kernel::delay_until(&mut last_wake, SNAKE_TICK_MS);
    }
}

extern "C" fn input_task(arg: usize) -> ! {
    let ctx = shared(arg);
    let mut controls = Controls::new();
    let mut source = RestingInput;
    loop {
        let sample = controls.sample(source.read());
        input::resolve_input(&sample, ctx.game, ctx.audio);
        kernel::delay_ms(INPUT_TICK_MS);
    }
}

extern "C" fn fruit_task(arg: usize) -> ! {
    let ctx = shared(arg);
    let mut generator = FruitGenerator::new(SmallRng::seed_from_u64(RNG_SEED ^ kernel::now()));
    let mut last_wake = kernel::now();
    loop {
        generator.generate_fruit_tick(ctx.game);
        kernel::delay_until(&mut last_wake, FRUIT_TICK_MS);
    }
}

extern "C" fn render_task(arg: usize) -> ! {
    let ctx = shared(arg);
    let mut presenter = RttPresenter { last: None };
    let mut last_wake = kernel::now();
    loop {
        let Ok(()) = presenter.present(&ctx.game.snapshot());
        kernel::delay_until(&mut last_wake, RENDER_TICK_MS);
    }
}

extern "C" fn audio_task(arg: usize) -> ! {
    let ctx = shared(arg);
    let mut buzzer = RttBuzzer;
    loop {
        audio::dequeue_and_play(ctx.audio, &mut buzzer, kernel::wait_notification, kernel::delay_ms);
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Startup failures leave the invariants unprotected: stop here.
fn halt(error: Error) -> ! {
    defmt::error!("startup failed: {}", error);
    loop {
        cortex_m::asm::wfi();
    }
}

#[entry]
fn main() -> ! {
    let Some(cp) = cortex_m::Peripherals::take() else {
        loop {
            cortex_m::asm::wfi();
        }
    };

    defmt::info!("eqsnake {=str}", env!("CARGO_PKG_VERSION"));
    GAME.reset();
    kernel::init().unwrap_or_else(|e| halt(e));

    let arg = &SHARED as *const Shared as usize;
    let tasks: [(extern "C" fn(usize) -> !, u8); 5] = [
        (snake_task, SNAKE_TASK_PRIORITY),
        (input_task, INPUT_TASK_PRIORITY),
        (fruit_task, FRUIT_TASK_PRIORITY),
        (render_task, RENDER_TASK_PRIORITY),
        (audio_task, AUDIO_TASK_PRIORITY),
    ];
    for (entry, priority) in tasks {
        let id = kernel::create_task(entry, arg, TaskConfig::with_priority(priority))
            .unwrap_or_else(|e| halt(e));
        if entry as usize == audio_task as usize {
            AUDIO_TASK.store(id, Ordering::Relaxed);
        }
    }

    kernel::start(cp)
}
