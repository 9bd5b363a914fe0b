//! Trace parsing and replay - no hardware, fully deterministic.
//!
//! A trace is a line-oriented recording of pointer samples. Blank lines and
//! `#` comments are ignored; every other line is
//! `<offset_ms> <phase> <x> <y> [pointer_count]`:
//!
//! ```text
//! # a quick double tap
//! 0    down 100 100
//! 40   up   100 101
//! 180  down 101 100
//! 220  up   101 101
//! ```
//!
//! [`replay`] drives a classifier through a trace with timers fired in time
//! order, then lets the remaining deadlines settle, and returns the ordered
//! log of gesture callbacks.

use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;
use std::time::{Duration, Instant};

use log::debug;

use crate::classifier::{DoubleTapListener, GestureClassifier, GestureListener};
use crate::config::{ClassifierConfig, TapkitError};
use crate::sample::{Phase, PointerSample};

/// One parsed trace line. Offsets are relative so a trace can replay from
/// any base instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSample {
    pub offset_ms: u64,
    pub phase: Phase,
    pub x: f64,
    pub y: f64,
    pub pointer_count: u32,
}

impl TraceSample {
    /// Materialize the sample against a base instant.
    pub fn at(&self, base: Instant) -> PointerSample {
        PointerSample::new(
            self.phase,
            self.x,
            self.y,
            base + Duration::from_millis(self.offset_ms),
        )
        .with_pointer_count(self.pointer_count)
    }
}

/// Parse a trace file's contents.
pub fn parse_trace(text: &str) -> Result<Vec<TraceSample>, TapkitError> {
    let mut samples = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line = idx + 1;
        let content = raw_line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let fields: Vec<&str> = content.split_whitespace().collect();
        if fields.len() < 4 || fields.len() > 5 {
            return Err(TapkitError::TraceParseError {
                line,
                message: format!(
                    "expected '<offset_ms> <phase> <x> <y> [pointer_count]', got {} field(s)",
                    fields.len()
                ),
            });
        }

        let field_err = |what: &str, value: &str| TapkitError::TraceParseError {
            line,
            message: format!("invalid {what}: '{value}'"),
        };

        let offset_ms: u64 = fields[0]
            .parse()
            .map_err(|_| field_err("offset", fields[0]))?;
        let phase = Phase::from_str(fields[1]).map_err(|_| field_err("phase", fields[1]))?;
        let x: f64 = fields[2].parse().map_err(|_| field_err("x", fields[2]))?;
        let y: f64 = fields[3].parse().map_err(|_| field_err("y", fields[3]))?;
        let pointer_count: u32 = match fields.get(4) {
            Some(raw) => raw.parse().map_err(|_| field_err("pointer_count", raw))?,
            None => 1,
        };
        if pointer_count == 0 {
            return Err(field_err("pointer_count", "0"));
        }

        samples.push(TraceSample {
            offset_ms,
            phase,
            x,
            y,
            pointer_count,
        });
    }

    Ok(samples)
}

/// Shared, ordered log of fired gesture callbacks.
pub type GestureLog = Rc<RefCell<Vec<String>>>;

/// Listener that appends one formatted line per callback to a shared log.
pub struct RecordingListener {
    log: GestureLog,
}

impl RecordingListener {
    pub fn new(log: GestureLog) -> Self {
        Self { log }
    }
}

impl GestureListener for RecordingListener {
    fn on_down(&mut self, sample: PointerSample) -> bool {
        self.log
            .borrow_mut()
            .push(format!("down x={} y={}", sample.x, sample.y));
        false
    }

    fn on_show_press(&mut self, sample: PointerSample) {
        self.log
            .borrow_mut()
            .push(format!("show_press x={} y={}", sample.x, sample.y));
    }

    fn on_single_tap_up(&mut self, sample: PointerSample) -> bool {
        self.log
            .borrow_mut()
            .push(format!("single_tap_up x={} y={}", sample.x, sample.y));
        false
    }

    fn on_scroll(&mut self, _from: PointerSample, _to: PointerSample, dx: f64, dy: f64) -> bool {
        self.log
            .borrow_mut()
            .push(format!("scroll dx={dx} dy={dy}"));
        false
    }

    fn on_long_press(&mut self, sample: PointerSample) {
        self.log
            .borrow_mut()
            .push(format!("long_press x={} y={}", sample.x, sample.y));
    }

    fn on_fling(&mut self, _from: PointerSample, _to: PointerSample, vx: f64, vy: f64) -> bool {
        self.log
            .borrow_mut()
            .push(format!("fling vx={vx:.1} vy={vy:.1}"));
        false
    }
}

/// Double-tap counterpart of [`RecordingListener`], sharing its log so the
/// combined callback order is preserved.
pub struct RecordingDoubleTapListener {
    log: GestureLog,
}

impl RecordingDoubleTapListener {
    pub fn new(log: GestureLog) -> Self {
        Self { log }
    }
}

impl DoubleTapListener for RecordingDoubleTapListener {
    fn on_single_tap_confirmed(&mut self, sample: PointerSample) -> bool {
        self.log
            .borrow_mut()
            .push(format!("single_tap_confirmed x={} y={}", sample.x, sample.y));
        false
    }

    fn on_double_tap(&mut self, first_down: PointerSample) -> bool {
        self.log
            .borrow_mut()
            .push(format!("double_tap x={} y={}", first_down.x, first_down.y));
        false
    }

    fn on_double_tap_event(&mut self, sample: PointerSample) -> bool {
        self.log
            .borrow_mut()
            .push(format!("double_tap_event {} x={} y={}", sample.phase, sample.x, sample.y));
        false
    }
}

/// Replay a trace through a fresh classifier and return the gesture log.
///
/// Timers due before each sample fire first, and after the last sample the
/// classifier runs long enough for any pending tap-confirmation or
/// long-press deadline to settle.
pub fn replay(trace: &[TraceSample], config: &ClassifierConfig) -> Vec<String> {
    let log: GestureLog = Rc::new(RefCell::new(Vec::new()));
    let base = Instant::now();

    let mut classifier = GestureClassifier::new(
        config.clone(),
        RecordingListener::new(Rc::clone(&log)),
    );
    classifier.set_double_tap_listener(Some(Box::new(RecordingDoubleTapListener::new(
        Rc::clone(&log),
    ))));

    let mut last_offset_ms = 0;
    for trace_sample in trace {
        let sample = trace_sample.at(base);
        classifier.advance_to(sample.timestamp);
        classifier.handle_pointer_event(&sample);
        last_offset_ms = last_offset_ms.max(trace_sample.offset_ms);
    }

    let settle = config.tap_timeout + config.long_press_timeout + config.double_tap_timeout;
    classifier.advance_to(base + Duration::from_millis(last_offset_ms) + settle);

    let lines = log.borrow().clone();
    debug!(
        "Replayed {} sample(s), fired {} gesture callback(s)",
        trace.len(),
        lines.len()
    );
    lines
}
