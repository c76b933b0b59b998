//! Game time management
//!
//! [`TimeManager`] turns a monotonic clock into three readings (milliseconds):
//!
//! - **real time**: everything since creation or [`TimeManager::reset`]
//! - **elapsed time**: real time minus every paused span
//! - **game time**: elapsed time integrated against the time scale
//!
//! [`Timer`] and [`TimerQueue`] count in game time, so pausing or scaling to
//! zero freezes them. Nothing here runs on its own thread: timers only advance
//! when polled with `update`.

use slotmap::{new_key_type, SlotMap};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

/// Source of monotonic time in milliseconds
pub trait Clock {
    /// Current reading in milliseconds
    fn now_ms(&self) -> f64;
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock starting at zero now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually advanced clock for tests and deterministic replays
///
/// Clones share the same reading, so a test can keep one handle and give the
/// other to a [`TimeManager`].
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    /// Create a clock reading zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward; negative steps are ignored
    pub fn advance(&self, ms: f64) {
        if ms > 0.0 {
            self.now.set(self.now.get() + ms);
        }
    }

    /// Current reading
    pub fn now(&self) -> f64 {
        self.now.get()
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Scalable, pausable virtual clock
pub struct TimeManager {
    clock: Box<dyn Clock>,
    start: f64,
    time_scale: f64,
    paused_at: Option<f64>,
    total_paused: f64,
    // Game time accumulated before the last scale change, and the elapsed
    // reading at which that change happened.
    game_base: f64,
    scale_anchor: f64,
}

impl TimeManager {
    /// Create a time manager driven by the wall clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }

    /// Create a time manager driven by a custom clock
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        let clock: Box<dyn Clock> = Box::new(clock);
        let start = clock.now_ms();
        Self {
            clock,
            start,
            time_scale: 1.0,
            paused_at: None,
            total_paused: 0.0,
            game_base: 0.0,
            scale_anchor: 0.0,
        }
    }

    fn now(&self) -> f64 {
        self.clock.now_ms()
    }

    /// Milliseconds since creation or the last reset, pauses included
    pub fn get_real_time(&self) -> f64 {
        self.now() - self.start
    }

    /// Milliseconds since creation with every paused span removed
    pub fn get_elapsed_time(&self) -> f64 {
        let now = self.now();
        let current_pause = self.paused_at.map_or(0.0, |paused_at| now - paused_at);
        (now - self.start) - self.total_paused - current_pause
    }

    /// Elapsed time integrated against the time scale
    pub fn get_game_time(&self) -> f64 {
        self.game_base + (self.get_elapsed_time() - self.scale_anchor) * self.time_scale
    }

    /// Total paused milliseconds, including the pause in progress
    pub fn get_total_paused_time(&self) -> f64 {
        self.get_real_time() - self.get_elapsed_time()
    }

    /// Current time scale
    pub const fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Change the time scale
    ///
    /// Game time already accumulated is kept; the new scale applies from now.
    /// Negative or non-finite values are rejected and `false` is returned.
    pub fn set_time_scale(&mut self, scale: f64) -> bool {
        if !scale.is_finite() || scale < 0.0 {
            log::warn!("Ignoring invalid time scale {scale}");
            return false;
        }
        self.game_base = self.get_game_time();
        self.scale_anchor = self.get_elapsed_time();
        self.time_scale = scale;
        true
    }

    /// Scale a frame delta (seconds) into game seconds
    ///
    /// This is `delta_time * time_scale` whether or not the clock is paused;
    /// callers that must stand still while paused check [`is_paused`](Self::is_paused).
    #[allow(clippy::cast_possible_truncation)]
    pub fn scale_delta_time(&self, delta_time: f32) -> f32 {
        delta_time * self.time_scale as f32
    }

    /// Stop elapsed and game time; calling it again has no further effect
    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(self.now());
            log::debug!("Time paused at {:.1}ms", self.get_real_time());
        }
    }

    /// Continue after [`pause`](Self::pause); a no-op when not paused
    pub fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.total_paused += self.now() - paused_at;
            log::debug!("Time resumed, {:.1}ms paused in total", self.total_paused);
        }
    }

    /// Whether [`pause`](Self::pause) is in effect
    pub const fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Restart every reading at zero, keeping the time scale
    pub fn reset(&mut self) {
        self.start = self.now();
        self.paused_at = None;
        self.total_paused = 0.0;
        self.game_base = 0.0;
        self.scale_anchor = 0.0;
    }
}

impl Default for TimeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeManager")
            .field("time_scale", &self.time_scale)
            .field("paused", &self.is_paused())
            .field("elapsed_ms", &self.get_elapsed_time())
            .finish_non_exhaustive()
    }
}

/// Whether a timer fires once or keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Fire once, then deactivate
    Once,
    /// Fire every period, restarting the count at each firing
    Repeating,
}

/// Countdown measured in game time
///
/// Polled cooperatively: [`Timer::update`] checks progress and fires the
/// callback at most once per call.
pub struct Timer {
    delay: f64,
    mode: TimerMode,
    started_at: f64,
    active: bool,
    fire_count: u32,
    callback: Option<Box<dyn FnMut()>>,
}

impl Timer {
    /// Create a timer that runs `callback` when it fires
    pub fn new(delay: f64, mode: TimerMode, callback: impl FnMut() + 'static, time: &TimeManager) -> Self {
        let mut timer = Self::countdown(delay, mode, time);
        timer.callback = Some(Box::new(callback));
        timer
    }

    /// One-shot timer with a callback
    pub fn once(delay: f64, callback: impl FnMut() + 'static, time: &TimeManager) -> Self {
        Self::new(delay, TimerMode::Once, callback, time)
    }

    /// Repeating timer with a callback
    pub fn repeating(interval: f64, callback: impl FnMut() + 'static, time: &TimeManager) -> Self {
        Self::new(interval, TimerMode::Repeating, callback, time)
    }

    /// Timer without a callback; poll [`update`](Self::update) for firings
    pub fn countdown(delay: f64, mode: TimerMode, time: &TimeManager) -> Self {
        Self {
            delay: delay.max(0.0),
            mode,
            started_at: time.get_game_time(),
            active: true,
            fire_count: 0,
            callback: None,
        }
    }

    /// Advance the timer; returns `true` if it fired during this call
    pub fn update(&mut self, time: &TimeManager) -> bool {
        if !self.active {
            return false;
        }
        let now = time.get_game_time();
        if now - self.started_at < self.delay {
            return false;
        }

        self.fire_count += 1;
        match self.mode {
            TimerMode::Once => self.active = false,
            TimerMode::Repeating => self.started_at = now,
        }
        if let Some(callback) = self.callback.as_mut() {
            callback();
        }
        true
    }

    /// Stop the timer for good
    pub fn cancel(&mut self) {
        self.active = false;
    }

    /// Whether the timer can still fire
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Game milliseconds left before the next firing; zero once fired or cancelled
    pub fn get_remaining_time(&self, time: &TimeManager) -> f64 {
        if !self.active {
            return 0.0;
        }
        (self.delay - (time.get_game_time() - self.started_at)).max(0.0)
    }

    /// Configured delay or period
    pub const fn delay(&self) -> f64 {
        self.delay
    }

    /// How many times the timer has fired
    pub const fn fire_count(&self) -> u32 {
        self.fire_count
    }

    /// Once or repeating
    pub const fn mode(&self) -> TimerMode {
        self.mode
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("delay", &self.delay)
            .field("mode", &self.mode)
            .field("active", &self.active)
            .field("fire_count", &self.fire_count)
            .finish_non_exhaustive()
    }
}

new_key_type! {
    /// Handle to a timer in a [`TimerQueue`]
    pub struct TimerId;
}

/// Set of countdowns, each carrying a payload handed back when it fires
///
/// Meant to be owned by a system: schedule work (crafting jobs, shop
/// restocks), poll [`update`](Self::update) once per tick and act on what
/// comes back. Finished one-shot entries are dropped automatically.
#[derive(Debug)]
pub struct TimerQueue<T> {
    timers: SlotMap<TimerId, (Timer, T)>,
}

impl<T> TimerQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            timers: SlotMap::with_key(),
        }
    }

    /// Schedule a one-shot countdown
    pub fn schedule_once(&mut self, delay: f64, payload: T, time: &TimeManager) -> TimerId {
        self.timers
            .insert((Timer::countdown(delay, TimerMode::Once, time), payload))
    }

    /// Schedule a repeating countdown
    pub fn schedule_repeating(&mut self, interval: f64, payload: T, time: &TimeManager) -> TimerId {
        self.timers
            .insert((Timer::countdown(interval, TimerMode::Repeating, time), payload))
    }

    /// Cancel a countdown, returning its payload
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        self.timers.remove(id).map(|(_, payload)| payload)
    }

    /// Game milliseconds until a countdown fires
    pub fn remaining(&self, id: TimerId, time: &TimeManager) -> Option<f64> {
        self.timers
            .get(id)
            .map(|(timer, _)| timer.get_remaining_time(time))
    }

    /// Payload of a pending countdown
    pub fn get(&self, id: TimerId) -> Option<&T> {
        self.timers.get(id).map(|(_, payload)| payload)
    }

    /// Whether a countdown is still pending
    pub fn contains(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Number of pending countdowns
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Drop every pending countdown
    pub fn clear(&mut self) {
        self.timers.clear();
    }
}

impl<T: Clone> TimerQueue<T> {
    /// Advance every countdown and collect the payloads that fired
    ///
    /// One-shot payloads are moved out; repeating payloads are cloned.
    pub fn update(&mut self, time: &TimeManager) -> Vec<(TimerId, T)> {
        let fired: Vec<(TimerId, Option<T>)> = self
            .timers
            .iter_mut()
            .filter_map(|(id, (timer, payload))| {
                if !timer.update(time) {
                    return None;
                }
                Some((id, timer.is_active().then(|| payload.clone())))
            })
            .collect();

        fired
            .into_iter()
            .filter_map(|(id, payload)| {
                payload
                    .or_else(|| self.timers.remove(id).map(|(_, payload)| payload))
                    .map(|payload| (id, payload))
            })
            .collect()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn manual() -> (ManualClock, TimeManager) {
        let clock = ManualClock::new();
        let time = TimeManager::with_clock(clock.clone());
        (clock, time)
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnMut() + 'static) {
        let count = Rc::new(Cell::new(0));
        let handle = Rc::clone(&count);
        (count, move || handle.set(handle.get() + 1))
    }

    #[test]
    fn test_pause_round_trip() {
        let (clock, mut time) = manual();
        clock.advance(500.0);
        time.pause();
        clock.advance(300.0);
        time.resume();
        clock.advance(200.0);

        assert_relative_eq!(time.get_elapsed_time(), 700.0);
        assert_relative_eq!(time.get_real_time(), 1000.0);
        assert_relative_eq!(time.get_total_paused_time(), 300.0);
    }

    #[test]
    fn test_elapsed_excludes_current_pause() {
        let (clock, mut time) = manual();
        clock.advance(100.0);
        time.pause();
        clock.advance(50.0);
        assert_relative_eq!(time.get_elapsed_time(), 100.0);
        assert!(time.is_paused());
    }

    #[test]
    fn test_pause_and_resume_are_idempotent() {
        let (clock, mut time) = manual();
        time.resume();
        clock.advance(100.0);
        time.pause();
        clock.advance(100.0);
        time.pause();
        clock.advance(100.0);
        time.resume();
        time.resume();
        clock.advance(100.0);

        assert_relative_eq!(time.get_elapsed_time(), 200.0);
        assert!(!time.is_paused());
    }

    #[test]
    fn test_game_time_follows_scale_changes() {
        let (clock, mut time) = manual();
        clock.advance(100.0);
        assert!(time.set_time_scale(2.0));
        clock.advance(100.0);
        assert!(time.set_time_scale(0.0));
        clock.advance(100.0);
        assert!(time.set_time_scale(0.5));
        clock.advance(100.0);

        assert_relative_eq!(time.get_game_time(), 100.0 + 200.0 + 0.0 + 50.0);
        assert_relative_eq!(time.get_elapsed_time(), 400.0);
    }

    #[test]
    fn test_invalid_scale_is_rejected() {
        let (_, mut time) = manual();
        assert!(!time.set_time_scale(-1.0));
        assert!(!time.set_time_scale(f64::NAN));
        assert_relative_eq!(time.time_scale(), 1.0);
    }

    #[test]
    fn test_scale_delta_time() {
        let (_, mut time) = manual();
        time.set_time_scale(1.5);
        assert_relative_eq!(time.scale_delta_time(2.0), 3.0);
        time.pause();
        assert_relative_eq!(time.scale_delta_time(2.0), 3.0);
    }

    #[test]
    fn test_scale_delta_time_ignores_pause_but_not_zero_scale() {
        let (_, mut time) = manual();
        time.pause();
        assert_relative_eq!(time.scale_delta_time(2.0), 2.0);
        time.resume();
        time.set_time_scale(0.0);
        assert_relative_eq!(time.scale_delta_time(2.0), 0.0);
    }

    #[test]
    fn test_reset() {
        let (clock, mut time) = manual();
        clock.advance(250.0);
        time.pause();
        time.reset();
        clock.advance(10.0);
        assert_relative_eq!(time.get_real_time(), 10.0);
        assert_relative_eq!(time.get_game_time(), 10.0);
        assert!(!time.is_paused());
    }

    #[test]
    fn test_one_shot_timer_fires_once() {
        let (clock, time) = manual();
        let (fired, callback) = counter();
        let mut timer = Timer::once(100.0, callback, &time);

        clock.advance(50.0);
        assert!(!timer.update(&time));
        assert_eq!(fired.get(), 0);
        assert_relative_eq!(timer.get_remaining_time(&time), 50.0);

        clock.advance(60.0);
        assert!(timer.update(&time));
        assert_eq!(fired.get(), 1);
        assert!(!timer.is_active());
        assert_relative_eq!(timer.get_remaining_time(&time), 0.0);

        clock.advance(500.0);
        assert!(!timer.update(&time));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_timer_ignores_paused_span() {
        let (clock, mut time) = manual();
        let (fired, callback) = counter();
        let mut timer = Timer::once(100.0, callback, &time);

        clock.advance(50.0);
        timer.update(&time);
        time.pause();
        clock.advance(100.0);
        assert!(!timer.update(&time));
        assert_relative_eq!(timer.get_remaining_time(&time), 50.0);
        time.resume();
        clock.advance(60.0);
        assert!(timer.update(&time));

        assert_eq!(fired.get(), 1);
        assert!(!timer.is_active());
    }

    #[test]
    fn test_timer_frozen_at_zero_scale() {
        let (clock, mut time) = manual();
        let mut timer = Timer::countdown(100.0, TimerMode::Once, &time);
        time.set_time_scale(0.0);
        clock.advance(1000.0);
        assert!(!timer.update(&time));
        time.set_time_scale(2.0);
        clock.advance(50.0);
        assert!(timer.update(&time));
    }

    #[test]
    fn test_repeating_timer_restarts_from_now() {
        let (clock, time) = manual();
        let (fired, callback) = counter();
        let mut timer = Timer::repeating(100.0, callback, &time);

        clock.advance(100.0);
        assert!(timer.update(&time));
        // Late poll: only one firing, next period counts from this update
        clock.advance(250.0);
        assert!(timer.update(&time));
        clock.advance(90.0);
        assert!(!timer.update(&time));
        clock.advance(10.0);
        assert!(timer.update(&time));

        assert_eq!(fired.get(), 3);
        assert_eq!(timer.fire_count(), 3);
        assert!(timer.is_active());
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let (clock, time) = manual();
        let (fired, callback) = counter();
        let mut timer = Timer::once(10.0, callback, &time);
        timer.cancel();
        clock.advance(100.0);
        assert!(!timer.update(&time));
        assert_eq!(fired.get(), 0);
        assert_relative_eq!(timer.get_remaining_time(&time), 0.0);
    }

    #[test]
    fn test_timer_queue() {
        let (clock, time) = manual();
        let mut queue = TimerQueue::new();
        let bread = queue.schedule_once(100.0, "bread", &time);
        let restock = queue.schedule_repeating(40.0, "restock", &time);
        let cancelled = queue.schedule_once(10.0, "cancelled", &time);
        assert_eq!(queue.cancel(cancelled), Some("cancelled"));

        clock.advance(50.0);
        assert_eq!(queue.update(&time), vec![(restock, "restock")]);
        assert_relative_eq!(queue.remaining(bread, &time).unwrap_or_default(), 50.0);

        clock.advance(50.0);
        let mut fired: Vec<_> = queue.update(&time).into_iter().map(|(_, p)| p).collect();
        fired.sort_unstable();
        assert_eq!(fired, vec!["bread", "restock"]);
        assert!(!queue.contains(bread));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get(restock), Some(&"restock"));
    }
}
