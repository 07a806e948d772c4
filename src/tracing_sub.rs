use std::io::{self, Write};

use tracing::Level;

use crate::log_buffer::{LogWriter, global_log};

/// Where one formatted event goes: the registered log panel, else stderr.
pub enum LogSink {
    Panel(LogWriter),
    Stderr(io::Stderr),
}

impl LogSink {
    fn current() -> Self {
        match global_log() {
            Some(handle) => LogSink::Panel(handle.writer()),
            None => LogSink::Stderr(io::stderr()),
        }
    }
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::Panel(w) => w.write(buf),
            LogSink::Stderr(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::Panel(w) => w.flush(),
            LogSink::Stderr(s) => s.flush(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SinkMakeWriter;

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SinkMakeWriter {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        LogSink::current()
    }
}

/// Installs a compact fmt subscriber. `DEBUG` covers phase transitions and
/// placements; `TRACE` adds one line per pointer tick.
/// Later calls are no-ops.
pub fn init(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(SinkMakeWriter)
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_falls_back_to_stderr_without_a_panel() {
        if global_log().is_none() {
            assert!(matches!(LogSink::current(), LogSink::Stderr(_)));
        }
    }
}
