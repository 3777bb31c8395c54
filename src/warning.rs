use std::io::{self, Write};

/// Inspection warnings, called at 8 and 5 seconds remaining
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Warning {
    #[strum(serialize = "8 seconds")]
    EightSeconds,
    #[strum(serialize = "5 seconds")]
    FiveSeconds,
}

impl Warning {
    pub const ALL: [Warning; 2] = [Warning::EightSeconds, Warning::FiveSeconds];

    /// Remaining inspection time at which the warning fires
    pub fn threshold_ms(self) -> u64 {
        match self {
            Warning::EightSeconds => 8_000,
            Warning::FiveSeconds => 5_000,
        }
    }
}

/// Threshold-crossing detector for one inspection episode at a time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarningSignaler {
    fired_eight: bool,
    fired_five: bool,
}

impl WarningSignaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new inspection episode
    pub fn reset(&mut self) {
        self.fired_eight = false;
        self.fired_five = false;
    }

    pub fn has_fired(&self, warning: Warning) -> bool {
        match warning {
            Warning::EightSeconds => self.fired_eight,
            Warning::FiveSeconds => self.fired_five,
        }
    }

    /// Warnings crossed between two successive samples of the remaining time.
    /// A coarse sample that skips over both thresholds yields both.
    pub fn observe(&mut self, previous_ms: u64, current_ms: u64) -> Vec<Warning> {
        let mut fired = Vec::new();
        for warning in Warning::ALL {
            let threshold = warning.threshold_ms();
            if previous_ms > threshold && current_ms <= threshold && !self.has_fired(warning) {
                match warning {
                    Warning::EightSeconds => self.fired_eight = true,
                    Warning::FiveSeconds => self.fired_five = true,
                }
                fired.push(warning);
            }
        }
        fired
    }
}

/// Receives inspection warnings and renders them (sound, flash, ...)
pub trait WarningSink {
    /// Called on the first user gesture; output resources may be opened here
    fn acquire(&mut self) {}
    fn signal(&mut self, warning: Warning);
    /// Called when the session ends
    fn release(&mut self) {}
}

/// Sink that drops everything, used when sound is off
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl WarningSink for NullSink {
    fn signal(&mut self, _warning: Warning) {}
}

/// Sink that remembers what it was sent
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub received: Vec<Warning>,
}

impl WarningSink for RecordingSink {
    fn signal(&mut self, warning: Warning) {
        self.received.push(warning);
    }
}

/// Rings the terminal bell: once for 8 seconds, twice for 5 seconds.
///
/// The output is opened lazily on `acquire` and dropped on `release`;
/// signals sent while not acquired are discarded.
pub struct TerminalBell<W: Write> {
    open: fn() -> io::Result<W>,
    out: Option<W>,
}

impl TerminalBell<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(|| Ok(io::stdout()))
    }
}

impl<W: Write> TerminalBell<W> {
    pub fn new(open: fn() -> io::Result<W>) -> Self {
        Self { open, out: None }
    }

    pub fn is_acquired(&self) -> bool {
        self.out.is_some()
    }

    pub fn writer(&self) -> Option<&W> {
        self.out.as_ref()
    }

    fn ring(&mut self, times: usize) -> io::Result<()> {
        if let Some(out) = self.out.as_mut() {
            out.write_all("\x07".repeat(times).as_bytes())?;
            out.flush()?;
        }
        Ok(())
    }
}

impl<W: Write> WarningSink for TerminalBell<W> {
    fn acquire(&mut self) {
        if self.out.is_some() {
            return;
        }
        match (self.open)() {
            Ok(out) => self.out = Some(out),
            Err(e) => tracing::warn!(error = %e, "failed to open warning output"),
        }
    }

    fn signal(&mut self, warning: Warning) {
        let times = match warning {
            Warning::EightSeconds => 1,
            Warning::FiveSeconds => 2,
        };
        if let Err(e) = self.ring(times) {
            tracing::warn!(error = %e, %warning, "failed to ring bell");
        }
    }

    fn release(&mut self) {
        if let Some(mut out) = self.out.take() {
            let _ = out.flush();
        }
    }
}
