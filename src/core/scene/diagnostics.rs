//=========================================================================
// Transition Diagnostics
//=========================================================================
//
// Phase timers for a single transition and the report built from them.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::time::{Duration, Instant};

//=== DiagnosticPhase =====================================================

/// Timed pipeline phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticPhase {
    Leave,
    Load,
    Prepare,
}

impl DiagnosticPhase {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        match self {
            Self::Leave => 0,
            Self::Load => 1,
            Self::Prepare => 2,
        }
    }
}

//=== TransitionReport ====================================================

/// Timings of one completed transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionReport {
    pub scene: String,
    pub leave: Duration,
    pub load: Duration,
    pub prepare: Duration,
    pub total: Duration,
}

impl fmt::Display for TransitionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scene transition: {}", self.scene)?;
        writeln!(f, "  Leave   : {:>9.2} ms", millis(self.leave))?;
        writeln!(f, "  Load    : {:>9.2} ms", millis(self.load))?;
        writeln!(f, "  Prepare : {:>9.2} ms", millis(self.prepare))?;
        write!(f, "  Total   : {:>9.2} ms", millis(self.total))
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

//=== TransitionDiagnostics ===============================================

/// Stopwatch set for the in-flight transition.
///
/// A phase that never ran reports zero.
#[derive(Debug, Default)]
pub struct TransitionDiagnostics {
    started: Option<Instant>,
    open: [Option<Instant>; DiagnosticPhase::COUNT],
    elapsed: [Duration; DiagnosticPhase::COUNT],
}

impl TransitionDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets every timer and starts the total clock.
    pub fn begin_transition(&mut self) {
        *self = Self {
            started: Some(Instant::now()),
            ..Self::default()
        };
    }

    pub fn begin(&mut self, phase: DiagnosticPhase) {
        self.open[phase.index()] = Some(Instant::now());
    }

    /// Stops a phase timer. Ignored if the phase was never begun.
    pub fn end(&mut self, phase: DiagnosticPhase) {
        if let Some(start) = self.open[phase.index()].take() {
            self.elapsed[phase.index()] += start.elapsed();
        }
    }

    pub fn elapsed(&self, phase: DiagnosticPhase) -> Duration {
        self.elapsed[phase.index()]
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Stops the total clock and builds the report.
    ///
    /// Returns `None` if no transition was begun.
    pub fn finish(&mut self, scene: impl Into<String>) -> Option<TransitionReport> {
        let started = self.started.take()?;

        Some(TransitionReport {
            scene: scene.into(),
            leave: self.elapsed(DiagnosticPhase::Leave),
            load: self.elapsed(DiagnosticPhase::Load),
            prepare: self.elapsed(DiagnosticPhase::Prepare),
            total: started.elapsed(),
        })
    }
}

//=========================================================================
// Tests
//=========================================================================
