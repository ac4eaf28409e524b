//! # Audio Event Queue
//!
//! Tone requests travel from any task to a single playback task through a
//! small bounded FIFO. Producers never block: when the queue is full the
//! newest event is dropped, since a lost beep is not a game-correctness
//! failure. The consumer blocks on an empty queue and, for every event,
//! drives the tone for its full duration before taking the next one, so
//! tones never overlap.
//!
//! ```text
//!  engine ─┐
//!  input  ─┼─► post() ─► [ FIFO, cap 4 ] ─► receive() ─► play() ─► ToneDriver
//!  ...    ─┘        └─► wake hook ───────────┘ (unblocks consumer)
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::Deque;

use crate::config::AUDIO_QUEUE_CAPACITY;
use crate::error::{Error, Result};
use crate::sync::Locked;

/// One tone request. `frequency` 0 requests silence for the duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BuzzerEvent {
    /// Frequency in Hz.
    pub frequency: u16,
    /// Duration in milliseconds.
    pub duration_ms: u16,
}

impl BuzzerEvent {
    pub const fn new(frequency: u16, duration_ms: u16) -> Self {
        Self { frequency, duration_ms }
    }

    /// Silence for `duration_ms`.
    pub const fn rest(duration_ms: u16) -> Self {
        Self::new(0, duration_ms)
    }

    /// Short high beep when a fruit is eaten.
    pub const EAT: Self = Self::new(1500, 100);
    /// Pause toggled.
    pub const PAUSE: Self = Self::new(440, 250);
    /// Reset requested.
    pub const RESET: Self = Self::new(850, 250);
    /// The defeat jingle alternates these two, twice.
    pub const DEFEAT_HIGH: Self = Self::new(3000, 150);
    pub const DEFEAT_LOW: Self = Self::new(2500, 150);

    pub const DEFEAT: [Self; 4] = [
        Self::DEFEAT_HIGH,
        Self::DEFEAT_LOW,
        Self::DEFEAT_HIGH,
        Self::DEFEAT_LOW,
    ];
}

/// Tone hardware. Implemented by the board's PWM/buzzer driver.
pub trait ToneDriver {
    /// Start a square wave at `frequency_hz`.
    fn start_tone(&mut self, frequency_hz: u16);

    fn stop_tone(&mut self);
}

/// Bounded multi-producer, single-consumer event queue.
pub struct AudioQueue {
    events: Locked<Deque<BuzzerEvent, AUDIO_QUEUE_CAPACITY>>,
    wake: Option<fn()>,
    dropped: AtomicU32,
}

impl AudioQueue {
    pub const fn new() -> Self {
        Self {
            events: Locked::new(Deque::new()),
            wake: None,
            dropped: AtomicU32::new(0),
        }
    }

    /// A queue that calls `wake` after every successful post. The firmware
    /// uses this to notify the blocked playback task.
    pub const fn with_wake(wake: fn()) -> Self {
        Self {
            events: Locked::new(Deque::new()),
            wake: Some(wake),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueues without blocking. On a full queue the event is dropped and
    /// counted.
    pub fn post(&self, event: BuzzerEvent) -> Result<()> {
        let pushed = self.events.lock(|events| events.push_back(event));
        match pushed {
            Ok(()) => {
                if let Some(wake) = self.wake {
                    wake();
                }
                Ok(())
            }
            Err(event) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!("audio queue full, dropped {}", event);
                Err(Error::AudioQueueFull)
            }
        }
    }

    /// Takes the oldest event, if any.
    pub fn try_receive(&self) -> Option<BuzzerEvent> {
        self.events.lock(|events| events.pop_front())
    }

    /// Takes the oldest event, calling `wait` for as long as the queue is
    /// empty. `wait` is expected to suspend the caller until a producer
    /// signals (the firmware blocks on a task notification).
    pub fn receive(&self, mut wait: impl FnMut()) -> BuzzerEvent {
        loop {
            if let Some(event) = self.try_receive() {
                return event;
            }
            wait();
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock(|events| events.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of events dropped because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for AudioQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Plays one event: start the tone (or stay silent for frequency 0), hold it
/// for the full duration via `delay_ms`, then stop.
pub fn play<T: ToneDriver>(event: BuzzerEvent, driver: &mut T, mut delay_ms: impl FnMut(u32)) {
    if event.frequency == 0 {
        driver.stop_tone();
    } else {
        driver.start_tone(event.frequency);
    }
    delay_ms(event.duration_ms as u32);
    driver.stop_tone();
}

/// One iteration of the playback task: block for the next event and play it
/// to completion.
pub fn dequeue_and_play<T: ToneDriver>(
    queue: &AudioQueue,
    driver: &mut T,
    wait: impl FnMut(),
    delay_ms: impl FnMut(u32),
) -> BuzzerEvent {
    let event = queue.receive(wait);
    play(event, driver, delay_ms);
    event
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use core::sync::atomic::AtomicUsize;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Trace {
        Start(u16),
        Stop,
        Elapsed(u32),
    }

    /// Driver and clock share one log so ordering can be checked.
    struct Recorder<'a> {
        log: &'a RefCell<Vec<Trace>>,
    }

    impl ToneDriver for Recorder<'_> {
        fn start_tone(&mut self, frequency_hz: u16) {
            self.log.borrow_mut().push(Trace::Start(frequency_hz));
        }

        fn stop_tone(&mut self) {
            self.log.borrow_mut().push(Trace::Stop);
        }
    }

    #[test]
    fn test_fifo_order_and_full_drop() {
        let queue = AudioQueue::new();
        for f in 1..=4 {
            queue.post(BuzzerEvent::new(f, 10)).unwrap();
        }
        assert_eq!(queue.post(BuzzerEvent::new(5, 10)), Err(Error::AudioQueueFull));
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.len(), AUDIO_QUEUE_CAPACITY);

        // Oldest first; the dropped newest never appears
        for f in 1..=4 {
            assert_eq!(queue.try_receive(), Some(BuzzerEvent::new(f, 10)));
        }
        assert_eq!(queue.try_receive(), None);
    }

    static WAKES: AtomicUsize = AtomicUsize::new(0);

    fn count_wake() {
        WAKES.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_wake_hook_only_on_success() {
        let queue = AudioQueue::with_wake(count_wake);
        for _ in 0..AUDIO_QUEUE_CAPACITY + 2 {
            let _ = queue.post(BuzzerEvent::EAT);
        }
        assert_eq!(WAKES.load(Ordering::SeqCst), AUDIO_QUEUE_CAPACITY);
    }

    #[test]
    fn test_events_play_sequentially() {
        let queue = AudioQueue::new();
        queue.post(BuzzerEvent::new(1000, 100)).unwrap();
        queue.post(BuzzerEvent::new(2000, 50)).unwrap();

        let log = RefCell::new(Vec::new());
        let mut driver = Recorder { log: &log };
        for _ in 0..2 {
            dequeue_and_play(
                &queue,
                &mut driver,
                || panic!("queue should not be empty"),
                |ms| log.borrow_mut().push(Trace::Elapsed(ms)),
            );
        }

        assert_eq!(
            log.into_inner(),
            [
                Trace::Start(1000),
                Trace::Elapsed(100),
                Trace::Stop,
                Trace::Start(2000),
                Trace::Elapsed(50),
                Trace::Stop,
            ]
        );
    }

    #[test]
    fn test_silence_event_never_starts_tone() {
        let log = RefCell::new(Vec::new());
        let mut driver = Recorder { log: &log };
        play(BuzzerEvent::rest(30), &mut driver, |ms| {
            log.borrow_mut().push(Trace::Elapsed(ms))
        });
        assert_eq!(log.into_inner(), [Trace::Stop, Trace::Elapsed(30), Trace::Stop]);
    }

    #[test]
    fn test_receive_waits_until_posted() {
        let queue = AudioQueue::new();
        let mut waits = 0;
        let event = queue.receive(|| {
            waits += 1;
            if waits == 3 {
                queue.post(BuzzerEvent::RESET).unwrap();
            }
        });
        assert_eq!(event, BuzzerEvent::RESET);
        assert_eq!(waits, 3);
    }
}
