//! Session statistics, following WCA conventions.
//!
//! Everything here is recomputed from the full history on each call;
//! sessions hold tens to a few hundred solves.

use itertools::Itertools;
use std::fmt;

use crate::solve::SolveEntry;
use crate::util::{format_time, mean};

/// Placeholder shown when there are not enough solves
pub const NO_DATA: &str = "—";

/// A derived statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatValue {
    NoData,
    Dnf,
    Time(u64),
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::NoData => f.write_str(NO_DATA),
            StatValue::Dnf => f.write_str("DNF"),
            StatValue::Time(ms) => f.write_str(&format_time(*ms)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub current: StatValue,
    pub best: StatValue,
    pub ao5: StatValue,
    pub ao12: StatValue,
    pub mo3: StatValue,
}

pub fn compute_session_stats(history: &[SolveEntry]) -> SessionStats {
    SessionStats {
        current: current(history),
        best: best(history),
        ao5: average_of(history, 5),
        ao12: average_of(history, 12),
        mo3: mean_of(history, 3),
    }
}

/// The most recent solve
pub fn current(history: &[SolveEntry]) -> StatValue {
    match history.last() {
        None => StatValue::NoData,
        Some(entry) => entry.numeric_ms().map_or(StatValue::Dnf, StatValue::Time),
    }
}

/// Fastest non-DNF solve in the whole history
pub fn best(history: &[SolveEntry]) -> StatValue {
    history
        .iter()
        .filter_map(SolveEntry::numeric_ms)
        .min()
        .map_or(StatValue::NoData, StatValue::Time)
}

/// Average of the last `n`: drop the single best and worst, mean the rest.
/// Any DNF among them makes the whole average a DNF.
pub fn average_of(history: &[SolveEntry], n: usize) -> StatValue {
    match last_times(history, n) {
        Window::Short => StatValue::NoData,
        Window::HasDnf => StatValue::Dnf,
        Window::Times(times) if times.len() < 3 => mean_value(&times),
        Window::Times(times) => {
            let trimmed: Vec<u64> = times
                .into_iter()
                .sorted_unstable()
                .skip(1)
                .collect();
            mean_value(&trimmed[..trimmed.len() - 1])
        }
    }
}

/// Plain mean of the last `n`, no trimming
pub fn mean_of(history: &[SolveEntry], n: usize) -> StatValue {
    match last_times(history, n) {
        Window::Short => StatValue::NoData,
        Window::HasDnf => StatValue::Dnf,
        Window::Times(times) => mean_value(&times),
    }
}

enum Window {
    Short,
    HasDnf,
    Times(Vec<u64>),
}

fn last_times(history: &[SolveEntry], n: usize) -> Window {
    if n == 0 || history.len() < n {
        return Window::Short;
    }
    history[history.len() - n..]
        .iter()
        .map(SolveEntry::numeric_ms)
        .collect::<Option<Vec<u64>>>()
        .map_or(Window::HasDnf, Window::Times)
}

/// Mean truncated to whole milliseconds, so display truncation matches
fn mean_value(times: &[u64]) -> StatValue {
    let as_f64: Vec<f64> = times.iter().map(|&t| t as f64).collect();
    mean(&as_f64).map_or(StatValue::NoData, |m| StatValue::Time(m.floor() as u64))
}
