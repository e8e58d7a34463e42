use std::io::{self, Write};

use monitor_logging::monitor_debug;

use super::render::{Stream, TerminalLine};

/// Where rendered lines end up: stdout and stderr in the binary, anything in tests.
pub struct Console {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
}

impl Console {
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn new(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self { out, err }
    }

    pub fn write(&mut self, lines: impl IntoIterator<Item = TerminalLine>) {
        for line in lines {
            let target = match line.stream {
                Stream::Out => &mut self.out,
                Stream::Err => &mut self.err,
            };
            if let Err(err) = writeln!(target, "{}", line.text) {
                monitor_debug!("Console write failed: {}", err);
            }
        }
        let _ = self.out.flush();
    }

    /// Raw output, used for JSON Lines export to stdout.
    pub fn write_raw(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()) {
            monitor_debug!("Console write failed: {}", err);
        }
        let _ = self.out.flush();
    }
}
