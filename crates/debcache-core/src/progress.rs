//! Progress reporting for long-running cache operations.
//!
//! Sinks are called synchronously on the calling thread. They must return
//! quickly and must not touch the [`DepCache`](crate::DepCache) being worked on.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Update,
    Resolve,
    Upgrade,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Update => "Building dependency tree",
            Phase::Resolve => "Resolving dependencies",
            Phase::Upgrade => "Calculating upgrade",
        }
    }
}

/// Receives `(phase, percent)` updates; `percent` is in `0.0..=100.0`.
pub trait ProgressSink {
    fn progress(&mut self, phase: Phase, percent: f32);

    fn finish(&mut self) {}
}

/// Sink that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn progress(&mut self, _phase: Phase, _percent: f32) {}
}

/// Terminal progress bar, one per phase
pub struct ProgressBarSink {
    enabled: bool,
    bar: Option<(Phase, ProgressBar)>,
}

impl ProgressBarSink {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    fn create_bar(&self, phase: Phase) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}%")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message(phase.label());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for ProgressBarSink {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ProgressSink for ProgressBarSink {
    fn progress(&mut self, phase: Phase, percent: f32) {
        let switch = self.bar.as_ref().map_or(true, |(current, _)| *current != phase);
        if switch {
            if let Some((_, bar)) = self.bar.take() {
                bar.finish_and_clear();
            }
            self.bar = Some((phase, self.create_bar(phase)));
        }
        if let Some((_, bar)) = &self.bar {
            bar.set_position(percent.clamp(0.0, 100.0) as u64);
        }
    }

    fn finish(&mut self) {
        if let Some((_, bar)) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
