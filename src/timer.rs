use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::inspection::{self, InspectionOutcome, HOLD_TO_ARM_MS, INSPECTION_MS};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::solve;
use crate::util::format_time;
use crate::warning::{Warning, WarningSignaler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TimerState {
    Idle,
    Inspection,
    Armed,
    Running,
    Stopped,
}

impl TimerState {
    /// Whether the frame loop should be alive in this state
    pub fn is_active(self) -> bool {
        matches!(
            self,
            TimerState::Inspection | TimerState::Armed | TimerState::Running
        )
    }
}

/// Independent input sources; each tracks its own press state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum InputChannel {
    Keyboard,
    Pointer,
}

impl InputChannel {
    pub const ALL: [InputChannel; 2] = [InputChannel::Keyboard, InputChannel::Pointer];

    fn index(self) -> usize {
        match self {
            InputChannel::Keyboard => 0,
            InputChannel::Pointer => 1,
        }
    }
}

/// `Wca` runs a 15 second inspection before arming; `Off` arms straight
/// from idle and never penalises.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InspectionMode {
    #[default]
    Wca,
    Off,
}

impl InspectionMode {
    pub fn toggled(self) -> Self {
        match self {
            InspectionMode::Wca => InspectionMode::Off,
            InspectionMode::Off => InspectionMode::Wca,
        }
    }
}

/// Outcome of one completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveResult {
    pub elapsed_ms: u64,
    pub inspection_outcome: InspectionOutcome,
}

impl SolveResult {
    pub fn display(&self) -> String {
        solve::display_time(self.elapsed_ms, self.inspection_outcome)
    }
}

/// Work the timer schedules for itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    HoldToArm(InputChannel),
    Frame,
}

/// Observable results of feeding input to the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    InspectionStarted,
    Armed,
    Started { outcome: InspectionOutcome },
    Stopped(SolveResult),
    Warning(Warning),
}

/// WCA timer state machine.
///
/// All transitions happen inside `press`, `release`, `poll` and `reset`.
/// Deferred work (the hold-to-arm delay and the display frame loop) goes
/// through the scheduler and comes back via `poll`.
pub struct Timer<C: Clock, S: Scheduler<Task>> {
    clock: C,
    scheduler: S,
    mode: InspectionMode,
    state: TimerState,
    held: [bool; 2],
    pressed_at: [u64; 2],
    pending_arm: Option<(TaskHandle, InputChannel)>,
    armed_by: Option<InputChannel>,
    frame: Option<TaskHandle>,
    inspection_started_at: Option<u64>,
    run_started_at: Option<u64>,
    outcome: InspectionOutcome,
    sampled_remaining: Option<u64>,
    frozen_elapsed: u64,
    last_result: Option<SolveResult>,
    signaler: WarningSignaler,
}

impl<C: Clock, S: Scheduler<Task>> Timer<C, S> {
    pub fn new(clock: C, scheduler: S, mode: InspectionMode) -> Self {
        Self {
            clock,
            scheduler,
            mode,
            state: TimerState::Idle,
            held: [false; 2],
            pressed_at: [0; 2],
            pending_arm: None,
            armed_by: None,
            frame: None,
            inspection_started_at: None,
            run_started_at: None,
            outcome: InspectionOutcome::None,
            sampled_remaining: None,
            frozen_elapsed: 0,
            last_result: None,
            signaler: WarningSignaler::new(),
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn mode(&self) -> InspectionMode {
        self.mode
    }

    /// Switch inspection mode. The timer is reset first.
    pub fn set_mode(&mut self, mode: InspectionMode) {
        self.reset();
        self.mode = mode;
    }

    pub fn is_held(&self, channel: InputChannel) -> bool {
        self.held[channel.index()]
    }

    pub fn has_pending_arm(&self) -> bool {
        self.pending_arm
            .is_some_and(|(handle, _)| self.scheduler.is_scheduled(handle))
    }

    pub fn is_frame_active(&self) -> bool {
        self.frame.is_some()
    }

    /// Number of tasks waiting in the scheduler
    pub fn scheduled_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn last_result(&self) -> Option<SolveResult> {
        self.last_result
    }

    pub fn warning_fired(&self, warning: Warning) -> bool {
        self.signaler.has_fired(warning)
    }

    /// Time since inspection began, while an inspection is in progress
    pub fn inspection_elapsed_ms(&self) -> Option<u64> {
        self.inspection_started_at
            .map(|started| self.clock.now_ms().saturating_sub(started))
    }

    /// Inspection countdown, while an inspection is in progress
    pub fn remaining_ms(&self) -> Option<u64> {
        self.inspection_elapsed_ms().map(inspection::remaining_ms)
    }

    /// Live time while running, frozen time once stopped
    pub fn elapsed_ms(&self) -> u64 {
        match (self.state, self.run_started_at) {
            (TimerState::Running, Some(started)) => self.clock.now_ms().saturating_sub(started),
            (TimerState::Stopped, _) => self.frozen_elapsed,
            _ => 0,
        }
    }

    /// Text for the main timer display
    pub fn display(&self) -> String {
        match self.state {
            TimerState::Idle => format_time(0),
            TimerState::Inspection | TimerState::Armed => match self.inspection_elapsed_ms() {
                Some(elapsed) => inspection::countdown_label(elapsed),
                None => format_time(0),
            },
            TimerState::Running => format_time(self.elapsed_ms()),
            TimerState::Stopped => self
                .last_result
                .map(|r| r.display())
                .unwrap_or_else(|| format_time(0)),
        }
    }

    /// A press on `channel`. While running this stops the clock at once;
    /// otherwise it starts the hold-to-arm delay.
    pub fn press(&mut self, channel: InputChannel) -> Vec<TimerEvent> {
        let now = self.clock.now_ms();
        if self.state == TimerState::Running {
            return self.stop(now);
        }
        if self.held[channel.index()] {
            return Vec::new();
        }
        self.held[channel.index()] = true;
        self.pressed_at[channel.index()] = now;

        if self.can_arm() && self.pending_arm.is_none() {
            self.schedule_arm(channel, HOLD_TO_ARM_MS, now);
        }
        Vec::new()
    }

    /// A release on `channel`. Cancels a hold that has not matured yet, or
    /// starts the solve when this channel armed the timer.
    pub fn release(&mut self, channel: InputChannel) -> Vec<TimerEvent> {
        if !self.held[channel.index()] {
            return Vec::new();
        }
        self.held[channel.index()] = false;

        if let Some((handle, owner)) = self.pending_arm {
            if owner == channel {
                self.scheduler.cancel(handle);
                self.pending_arm = None;
                self.hand_over_arm();
            }
            return Vec::new();
        }

        if self.state == TimerState::Armed && self.armed_by == Some(channel) {
            let now = self.clock.now_ms();
            return self.start(now);
        }
        Vec::new()
    }

    /// Run whatever the scheduler has due. Call on every display tick.
    pub fn poll(&mut self) -> Vec<TimerEvent> {
        let now = self.clock.now_ms();
        let due = self.scheduler.due(now);
        due.into_iter()
            .flat_map(|(handle, task)| self.dispatch(handle, task, now))
            .collect()
    }

    /// Back to idle from anywhere, cancelling all scheduled work
    pub fn reset(&mut self) {
        self.cancel_pending_arm();
        self.cancel_frame();
        self.held = [false; 2];
        self.armed_by = None;
        self.inspection_started_at = None;
        self.run_started_at = None;
        self.outcome = InspectionOutcome::None;
        self.sampled_remaining = None;
        self.frozen_elapsed = 0;
        self.last_result = None;
        self.signaler.reset();
        self.transition(TimerState::Idle);
    }

    fn dispatch(&mut self, handle: TaskHandle, task: Task, now: u64) -> Vec<TimerEvent> {
        match task {
            Task::HoldToArm(channel) => {
                if self.pending_arm != Some((handle, channel)) {
                    return Vec::new();
                }
                self.pending_arm = None;
                if !self.held[channel.index()] {
                    return Vec::new();
                }
                match (self.state, self.mode) {
                    (TimerState::Idle | TimerState::Stopped, InspectionMode::Wca) => {
                        self.begin_inspection(now)
                    }
                    (TimerState::Idle | TimerState::Stopped, InspectionMode::Off)
                    | (TimerState::Inspection, _) => self.arm(channel),
                    _ => Vec::new(),
                }
            }
            Task::Frame => {
                if self.frame != Some(handle) {
                    return Vec::new();
                }
                self.refresh(now)
            }
        }
    }

    fn can_arm(&self) -> bool {
        matches!(
            self.state,
            TimerState::Idle | TimerState::Stopped | TimerState::Inspection
        )
    }

    fn schedule_arm(&mut self, channel: InputChannel, delay_ms: u64, now: u64) {
        let handle = self
            .scheduler
            .schedule_once(Task::HoldToArm(channel), delay_ms, now);
        self.pending_arm = Some((handle, channel));
    }

    /// A channel still held after the arming one let go continues its own
    /// hold, measured from when it was pressed.
    fn hand_over_arm(&mut self) {
        if !self.can_arm() {
            return;
        }
        let Some(channel) = InputChannel::ALL
            .into_iter()
            .find(|c| self.held[c.index()])
        else {
            return;
        };
        let now = self.clock.now_ms();
        let matures_at = self.pressed_at[channel.index()].saturating_add(HOLD_TO_ARM_MS);
        self.schedule_arm(channel, matures_at.saturating_sub(now), now);
    }

    fn begin_inspection(&mut self, now: u64) -> Vec<TimerEvent> {
        self.inspection_started_at = Some(now);
        self.run_started_at = None;
        self.outcome = InspectionOutcome::None;
        self.sampled_remaining = Some(INSPECTION_MS);
        self.frozen_elapsed = 0;
        self.last_result = None;
        self.signaler.reset();
        self.transition(TimerState::Inspection);
        self.ensure_frame();
        vec![TimerEvent::InspectionStarted]
    }

    fn arm(&mut self, channel: InputChannel) -> Vec<TimerEvent> {
        self.armed_by = Some(channel);
        self.transition(TimerState::Armed);
        vec![TimerEvent::Armed]
    }

    fn start(&mut self, now: u64) -> Vec<TimerEvent> {
        let outcome = self
            .inspection_started_at
            .map(|started| inspection::outcome_for(now.saturating_sub(started)))
            .unwrap_or_default();

        self.cancel_pending_arm();
        self.cancel_frame();
        self.inspection_started_at = None;
        self.sampled_remaining = None;
        self.armed_by = None;
        self.run_started_at = Some(now);
        self.outcome = outcome;
        self.transition(TimerState::Running);
        self.ensure_frame();
        vec![TimerEvent::Started { outcome }]
    }

    fn stop(&mut self, now: u64) -> Vec<TimerEvent> {
        let elapsed_ms = self
            .run_started_at
            .map(|started| now.saturating_sub(started))
            .unwrap_or_default();
        let result = SolveResult {
            elapsed_ms,
            inspection_outcome: self.outcome,
        };

        self.cancel_pending_arm();
        self.cancel_frame();
        self.held = [false; 2];
        self.run_started_at = None;
        self.frozen_elapsed = elapsed_ms;
        self.last_result = Some(result);
        self.transition(TimerState::Stopped);
        tracing::info!(
            elapsed_ms,
            outcome = %result.inspection_outcome,
            "solve finished"
        );
        vec![TimerEvent::Stopped(result)]
    }

    fn refresh(&mut self, now: u64) -> Vec<TimerEvent> {
        let Some(started) = self.inspection_started_at else {
            return Vec::new();
        };
        let current = inspection::remaining_ms(now.saturating_sub(started));
        let previous = self.sampled_remaining.unwrap_or(INSPECTION_MS);
        self.sampled_remaining = Some(current);

        let warnings = self.signaler.observe(previous, current);
        for warning in &warnings {
            tracing::debug!(%warning, remaining_ms = current, "inspection warning");
        }
        warnings.into_iter().map(TimerEvent::Warning).collect()
    }

    fn ensure_frame(&mut self) {
        if self.frame.is_none() {
            self.frame = Some(self.scheduler.schedule_recurring(Task::Frame));
        }
    }

    fn cancel_frame(&mut self) {
        if let Some(handle) = self.frame.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn cancel_pending_arm(&mut self) {
        if let Some((handle, _)) = self.pending_arm.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn transition(&mut self, to: TimerState) {
        if self.state != to {
            tracing::debug!(from = %self.state, %to, "timer transition");
        }
        self.state = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::scheduler::DeadlineScheduler;
    use assert_matches::assert_matches;

    type TestTimer = Timer<ManualClock, DeadlineScheduler<Task>>;

    const KEY: InputChannel = InputChannel::Keyboard;
    const POINTER: InputChannel = InputChannel::Pointer;

    fn timer(mode: InspectionMode) -> (TestTimer, ManualClock) {
        let clock = ManualClock::new(0);
        let timer = Timer::new(clock.clone(), DeadlineScheduler::new(), mode);
        (timer, clock)
    }

    /// Hold `channel` long enough for the hold delay to mature
    fn hold(timer: &mut TestTimer, clock: &ManualClock, channel: InputChannel) -> Vec<TimerEvent> {
        timer.press(channel);
        clock.advance(HOLD_TO_ARM_MS);
        timer.poll()
    }

    /// Start inspection at the returned timestamp, keyboard released afterwards
    fn into_inspection(timer: &mut TestTimer, clock: &ManualClock) -> u64 {
        hold(timer, clock, KEY);
        timer.release(KEY);
        assert_eq!(timer.state(), TimerState::Inspection);
        clock.now_ms()
    }

    /// Arm during inspection and release at `t0 + start_at`
    fn start_at(start_at: u64) -> (TestTimer, ManualClock) {
        let (mut t, clock) = timer(InspectionMode::Wca);
        let t0 = into_inspection(&mut t, &clock);
        clock.set(t0 + start_at - HOLD_TO_ARM_MS);
        hold(&mut t, &clock, KEY);
        assert_eq!(t.state(), TimerState::Armed);
        t.release(KEY);
        (t, clock)
    }

    #[test]
    fn new_timer_is_idle_with_nothing_scheduled() {
        let (t, _) = timer(InspectionMode::Wca);
        assert_eq!(t.state(), TimerState::Idle);
        assert_eq!(t.scheduled_tasks(), 0);
        assert_eq!(t.display(), "0.00");
    }

    #[test]
    fn hold_from_idle_enters_inspection() {
        let (mut t, clock) = timer(InspectionMode::Wca);
        t.press(KEY);
        clock.advance(299);
        assert!(t.poll().is_empty());
        assert_eq!(t.state(), TimerState::Idle);

        clock.advance(1);
        assert_eq!(t.poll(), vec![TimerEvent::InspectionStarted]);
        assert_eq!(t.state(), TimerState::Inspection);
        assert_eq!(t.remaining_ms(), Some(15_000));
        assert_eq!(t.display(), "15");
    }

    #[test]
    fn early_release_changes_nothing() {
        let (mut t, clock) = timer(InspectionMode::Wca);
        t.press(KEY);
        clock.advance(200);
        t.release(KEY);
        clock.advance(500);
        assert!(t.poll().is_empty());
        assert_eq!(t.state(), TimerState::Idle);
        assert_eq!(t.scheduled_tasks(), 0);
    }

    #[test]
    fn early_release_during_inspection_keeps_countdown() {
        let (mut t, clock) = timer(InspectionMode::Wca);
        let t0 = into_inspection(&mut t, &clock);

        clock.set(t0 + 3_000);
        t.press(KEY);
        clock.advance(100);
        t.release(KEY);
        clock.advance(1_000);
        t.poll();

        assert_eq!(t.state(), TimerState::Inspection);
        assert_eq!(t.inspection_elapsed_ms(), Some(4_100));
        assert!(!t.has_pending_arm());
    }

    #[test]
    fn outcome_none_just_before_limit() {
        let (t, _) = start_at(14_999);
        assert_eq!(t.state(), TimerState::Running);
        assert_matches!(t.outcome, InspectionOutcome::None);
    }

    #[test]
    fn outcome_plus_two_in_grace_window() {
        let (mut t, clock) = start_at(15_500);
        clock.advance(9_500);
        let events = t.press(KEY);
        assert_eq!(
            events,
            vec![TimerEvent::Stopped(SolveResult {
                elapsed_ms: 9_500,
                inspection_outcome: InspectionOutcome::Plus2,
            })]
        );
        assert_eq!(t.display(), "11.50+");
    }

    #[test]
    fn outcome_dnf_after_grace_window() {
        let (mut t, clock) = start_at(17_001);
        clock.advance(5_000);
        t.press(POINTER);
        assert_eq!(t.display(), "DNF");
        assert_matches!(
            t.last_result(),
            Some(SolveResult {
                inspection_outcome: InspectionOutcome::Dnf,
                ..
            })
        );
    }

    #[test]
    fn release_from_armed_reports_outcome() {
        let (mut t, clock) = timer(InspectionMode::Wca);
        let t0 = into_inspection(&mut t, &clock);
        clock.set(t0 + 10_000);
        assert_eq!(hold(&mut t, &clock, KEY), vec![TimerEvent::Armed]);
        assert_eq!(
            t.release(KEY),
            vec![TimerEvent::Started {
                outcome: InspectionOutcome::None
            }]
        );
    }

    #[test]
    fn countdown_keeps_running_while_armed() {
        let (mut t, clock) = timer(InspectionMode::Wca);
        let t0 = into_inspection(&mut t, &clock);
        clock.set(t0 + 2_000);
        hold(&mut t, &clock, KEY);
        assert_eq!(t.state(), TimerState::Armed);
        assert_eq!(t.remaining_ms(), Some(12_700));

        clock.advance(4_000);
        t.poll();
        assert_eq!(t.remaining_ms(), Some(8_700));
        assert!(t.is_frame_active());
    }

    #[test]
    fn running_stops_on_any_press_and_freezes_time() {
        let (mut t, clock) = start_at(5_000);
        clock.advance(12_345);
        assert_eq!(t.display(), "12.34");

        t.press(POINTER);
        assert_eq!(t.state(), TimerState::Stopped);
        clock.advance(10_000);
        assert_eq!(t.elapsed_ms(), 12_345);
        assert_eq!(t.scheduled_tasks(), 0);
    }

    #[test]
    fn entering_running_leaves_only_the_frame_loop() {
        let (t, _) = start_at(1_000);
        assert!(!t.has_pending_arm());
        assert!(t.is_frame_active());
        assert_eq!(t.scheduled_tasks(), 1);
    }

    #[test]
    fn duplicate_press_is_ignored() {
        let (mut t, clock) = timer(InspectionMode::Wca);
        t.press(KEY);
        clock.advance(100);
        t.press(KEY);
        assert_eq!(t.scheduled_tasks(), 1);

        clock.advance(200);
        assert_eq!(t.poll(), vec![TimerEvent::InspectionStarted]);
    }

    #[test]
    fn release_on_other_channel_does_not_cancel_hold() {
        let (mut t, clock) = timer(InspectionMode::Wca);
        t.press(KEY);
        t.press(POINTER);
        clock.advance(100);
        t.release(POINTER);
        clock.advance(200);

        assert_eq!(t.poll(), vec![TimerEvent::InspectionStarted]);
        assert!(t.is_held(KEY));
        assert!(!t.is_held(POINTER));
    }

    #[test]
    fn held_channel_takes_over_when_the_arming_one_lets_go() {
        let (mut t, clock) = timer(InspectionMode::Wca);
        t.press(KEY);
        clock.advance(100);
        t.press(POINTER);
        clock.advance(100);
        t.release(KEY);
        assert!(t.has_pending_arm());

        // pointer went down at 100, so its hold matures at 400
        clock.set(399);
        assert!(t.poll().is_empty());
        clock.set(400);
        assert_eq!(t.poll(), vec![TimerEvent::InspectionStarted]);
        assert!(t.is_held(POINTER));
        assert!(!t.has_pending_arm());
    }

    #[test]
    fn matured_takeover_arms_on_next_poll() {
        let (mut t, clock) = timer(InspectionMode::Wca);
        let t0 = into_inspection(&mut t, &clock);
        clock.set(t0 + 1_000);
        t.press(KEY);
        clock.set(t0 + 1_100);
        t.press(POINTER);
        clock.set(t0 + 1_450);
        t.release(KEY);

        assert_eq!(t.poll(), vec![TimerEvent::Armed]);
        assert_eq!(
            t.release(POINTER),
            vec![TimerEvent::Started {
                outcome: InspectionOutcome::None
            }]
        );
    }

    #[test]
    fn only_the_arming_channel_starts_the_solve() {
        let (mut t, clock) = timer(InspectionMode::Wca);
        into_inspection(&mut t, &clock);
        hold(&mut t, &clock, KEY);
        assert_eq!(t.state(), TimerState::Armed);

        t.press(POINTER);
        assert!(t.release(POINTER).is_empty());
        assert_eq!(t.state(), TimerState::Armed);

        t.release(KEY);
        assert_eq!(t.state(), TimerState::Running);
    }

    #[test]
    fn release_without_press_is_a_no_op() {
        let (mut t, _) = timer(InspectionMode::Wca);
        assert!(t.release(KEY).is_empty());
        assert_eq!(t.state(), TimerState::Idle);
    }

    #[test]
    fn release_after_stop_is_ignored() {
        let (mut t, clock) = start_at(1_000);
        clock.advance(3_000);
        t.press(KEY);
        clock.advance(1_000);
        assert!(t.release(KEY).is_empty());
        assert!(t.poll().is_empty());
        assert_eq!(t.state(), TimerState::Stopped);
    }

    #[test]
    fn warnings_fire_once_per_episode() {
        let (mut t, clock) = timer(InspectionMode::Wca);
        let t0 = into_inspection(&mut t, &clock);

        let mut warnings = Vec::new();
        for ms in (0..=16_000).step_by(250) {
            clock.set(t0 + ms);
            warnings.extend(t.poll());
        }
        assert_eq!(
            warnings,
            vec![
                TimerEvent::Warning(Warning::EightSeconds),
                TimerEvent::Warning(Warning::FiveSeconds),
            ]
        );
    }

    #[test]
    fn new_episode_resets_countdown_and_warnings() {
        let (mut t, clock) = timer(InspectionMode::Wca);
        let t0 = into_inspection(&mut t, &clock);
        clock.set(t0 + 11_000);
        t.poll();
        assert!(t.warning_fired(Warning::FiveSeconds));

        hold(&mut t, &clock, KEY);
        t.release(KEY);
        clock.advance(2_000);
        t.press(KEY);
        assert_eq!(t.state(), TimerState::Stopped);
        t.release(KEY);

        let t1 = into_inspection(&mut t, &clock);
        assert_eq!(t.remaining_ms(), Some(15_000));
        assert!(!t.warning_fired(Warning::EightSeconds));

        clock.set(t1 + 7_000);
        assert_eq!(t.poll(), vec![TimerEvent::Warning(Warning::EightSeconds)]);
    }

    #[test]
    fn off_mode_arms_from_idle_without_penalty() {
        let (mut t, clock) = timer(InspectionMode::Off);
        assert_eq!(hold(&mut t, &clock, POINTER), vec![TimerEvent::Armed]);
        assert_eq!(t.remaining_ms(), None);
        assert_eq!(t.scheduled_tasks(), 0);

        clock.advance(60_000);
        assert_eq!(
            t.release(POINTER),
            vec![TimerEvent::Started {
                outcome: InspectionOutcome::None
            }]
        );
    }

    #[test]
    fn reset_from_every_state_is_idempotent() {
        let setups: Vec<Box<dyn Fn() -> TestTimer>> = vec![
            Box::new(|| timer(InspectionMode::Wca).0),
            Box::new(|| {
                let (mut t, _) = timer(InspectionMode::Wca);
                t.press(KEY);
                t
            }),
            Box::new(|| {
                let (mut t, c) = timer(InspectionMode::Wca);
                into_inspection(&mut t, &c);
                t.press(POINTER);
                t
            }),
            Box::new(|| {
                let (mut t, c) = timer(InspectionMode::Wca);
                into_inspection(&mut t, &c);
                hold(&mut t, &c, KEY);
                t
            }),
            Box::new(|| start_at(2_000).0),
            Box::new(|| {
                let (mut t, _) = start_at(2_000);
                t.press(KEY);
                t
            }),
        ];

        for setup in setups {
            let mut t = setup();
            t.reset();
            assert_eq!(t.state(), TimerState::Idle);
            assert_eq!(t.scheduled_tasks(), 0);
            assert!(!t.is_held(KEY) && !t.is_held(POINTER));
            assert_eq!(t.display(), "0.00");

            t.reset();
            assert_eq!(t.state(), TimerState::Idle);
            assert_eq!(t.scheduled_tasks(), 0);
            assert!(t.poll().is_empty());
        }
    }

    #[test]
    fn set_mode_resets() {
        let (mut t, clock) = timer(InspectionMode::Wca);
        into_inspection(&mut t, &clock);
        t.set_mode(InspectionMode::Off);
        assert_eq!(t.state(), TimerState::Idle);
        assert_eq!(t.mode(), InspectionMode::Off);
        assert_eq!(t.scheduled_tasks(), 0);
    }

    #[test]
    fn backward_clock_jump_does_not_panic() {
        let (mut t, clock) = start_at(1_000);
        clock.set(0);
        assert_eq!(t.elapsed_ms(), 0);
        t.press(KEY);
        assert_eq!(t.last_result().map(|r| r.elapsed_ms), Some(0));
    }
}
