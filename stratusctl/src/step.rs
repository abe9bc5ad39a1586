use termion::{color, style};

pub const SUCCESS_GLYPH: &str = "✅";
pub const FAILURE_GLYPH: &str = "❌";
pub const INFO_GLYPH: &str = "ℹ️";

/// Receives the semantic progress transitions emitted by the watchers.
///
/// `start` opens a new step, `success`/`failure` close the currently open
/// one. A sink is free to render this however it likes; the watchers only
/// guarantee that transitions arrive in observation order.
pub trait ProgressSink {
    fn start(&mut self, label: &str);
    fn status(&mut self, msg: &str);
    fn success(&mut self);
    fn failure(&mut self);
    fn log_info(&mut self, msg: &str);
    fn log_error(&mut self, msg: &str);
}

/// Glyph-based terminal rendering of steps.
#[derive(Debug, Default)]
pub struct TermStep {
    current: Option<String>,
}

impl TermStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink with `label` already open.
    pub fn begin(label: &str) -> Self {
        let mut step = Self::new();
        step.start(label);
        step
    }
}

impl ProgressSink for TermStep {
    fn start(&mut self, label: &str) {
        println!("{}", label);
        self.current = Some(label.to_owned());
    }

    fn status(&mut self, msg: &str) {
        match &self.current {
            Some(label) => println!("{} : {}", label, msg),
            None => println!("{}", msg),
        }
    }

    fn success(&mut self) {
        // A terminal success with no open step has nothing left to close.
        if let Some(label) = self.current.take() {
            println!("{} {}", label, SUCCESS_GLYPH);
        }
    }

    fn failure(&mut self) {
        match self.current.take() {
            Some(label) => println!("{} {}", label, FAILURE_GLYPH),
            None => println!("{}", FAILURE_GLYPH),
        }
    }

    fn log_info(&mut self, msg: &str) {
        println!("{} {}", INFO_GLYPH, msg);
    }

    fn log_error(&mut self, msg: &str) {
        eprintln!(
            "{}{}{}",
            color::Fg(color::Red),
            msg,
            style::Reset
        );
    }
}
