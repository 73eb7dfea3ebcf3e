//! Human-readable local sink.
//!
//! One line per record, structured fields hidden:
//! `[12:04:05.123] INFO (4211): [query]: me.get - 3ms - OK`

use super::Sink;
use crate::{LogLevel, LogRecord};
use nu_ansi_term::{Color, Style};
use parking_lot::Mutex;
use std::io::{self, Write};

/// Colorized line writer for developer terminals.
pub struct PrettySink {
    writer: Mutex<Box<dyn Write + Send>>,
    colorize: bool,
    pid: u32,
}

impl PrettySink {
    pub fn new<W>(writer: W, colorize: bool) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            writer: Mutex::new(Box::new(writer)),
            colorize,
            pid: std::process::id(),
        }
    }

    pub fn stdout(colorize: bool) -> Self {
        Self::new(io::stdout(), colorize)
    }

    fn format(&self, record: &LogRecord) -> String {
        let time = record.timestamp().format("%H:%M:%S%.3f");
        let label = record.level().label();
        if self.colorize {
            format!(
                "[{}] {} ({}): {}",
                time,
                level_style(record.level()).paint(label),
                self.pid,
                Color::Cyan.paint(record.message())
            )
        } else {
            format!("[{}] {} ({}): {}", time, label, self.pid, record.message())
        }
    }
}

impl Sink for PrettySink {
    fn write(&self, record: &LogRecord) {
        let line = self.format(record);
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "{}", line);
    }

    fn flush(&self) {
        let _ = self.writer.lock().flush();
    }
}

fn level_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Emerg | LogLevel::Alert => Color::White.on(Color::Red).bold(),
        LogLevel::Crit => Color::Red.bold(),
        LogLevel::Error => Color::Red.normal(),
        LogLevel::Warn => Color::Yellow.normal(),
        LogLevel::Notice => Color::Blue.normal(),
        LogLevel::Info => Color::Green.normal(),
        LogLevel::Debug => Color::Purple.normal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Environment, Fields};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn record(level: LogLevel) -> LogRecord {
        let mut fields = Fields::new();
        fields.insert("durationInMs".into(), 7.into());
        LogRecord::new(level, Environment::Development, &Fields::new(), fields, "call done".into())
    }

    #[test]
    fn test_plain_line_hides_fields() {
        let buf = SharedBuf::default();
        let sink = PrettySink::new(buf.clone(), false);
        sink.write(&record(LogLevel::Warn));

        let out = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert!(out.contains("WARN"));
        assert!(out.ends_with("call done\n"));
        assert!(!out.contains("durationInMs"));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn test_colorized_line_has_escape_codes() {
        let buf = SharedBuf::default();
        let sink = PrettySink::new(buf.clone(), true);
        sink.write(&record(LogLevel::Error));

        let out = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert!(out.contains('\u{1b}'));
        assert!(out.contains("ERROR"));
    }

    #[test]
    fn test_file_writer_gets_one_line_per_record() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let sink = PrettySink::new(file.reopen().unwrap(), false);
        sink.write(&record(LogLevel::Info));
        sink.write(&record(LogLevel::Notice));
        sink.flush();

        let out = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("INFO ("));
        assert!(lines[1].contains("NOTICE ("));
    }
}
