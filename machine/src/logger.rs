//! Sinks for script trace output.

/// Collects messages emitted by the `trace` builtin
pub trait Logger {
    fn log(&mut self, message: String);

    /// Every message logged so far, oldest first
    fn logs(&self) -> Vec<String>;
}

/// Discards every message
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLogger;

impl Logger for NoLogger {
    fn log(&mut self, _message: String) {}

    fn logs(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Keeps every message in order
#[derive(Debug, Default, Clone)]
pub struct Log {
    lines: Vec<String>,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Logger for Log {
    fn log(&mut self, message: String) {
        self.lines.push(message);
    }

    fn logs(&self) -> Vec<String> {
        self.lines.clone()
    }
}
