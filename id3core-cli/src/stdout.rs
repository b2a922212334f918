use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

static LOGGER: PedanticLogger = PedanticLogger;

/// A small colored logger. Library messages go to stdout when informational and to stderr
/// when something went wrong.
pub struct PedanticLogger;

impl PedanticLogger {
    pub fn setup(level: LevelFilter) {
        // Only fails if a logger was already installed, which would be just as good.
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(level);
        }
    }
}

impl Log for PedanticLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        let md = record.metadata();

        if !self.enabled(md) {
            return;
        }

        let mut spec = ColorSpec::new();

        let mut out = match md.level() {
            Level::Error => {
                spec.set_fg(Some(Color::Red));
                StandardStream::stderr(ColorChoice::Auto)
            }

            Level::Warn => {
                spec.set_fg(Some(Color::Yellow)).set_intense(true);
                StandardStream::stderr(ColorChoice::Auto)
            }

            Level::Info => {
                spec.set_dimmed(true);
                StandardStream::stdout(ColorChoice::Auto)
            }

            Level::Debug | Level::Trace => {
                spec.set_fg(Some(Color::Black)).set_intense(true);
                StandardStream::stdout(ColorChoice::Auto)
            }
        };

        // There is nowhere left to report a failed log write.
        let _ = out.set_color(&spec);
        let _ = writeln![out, "{}: {}", record.target(), record.args()];
        let _ = out.reset();
    }

    fn flush(&self) {}
}

#[macro_export]
macro_rules! print_header {
    ($($arg:tt)+) => {{
        use std::io::Write;
        use termcolor::{StandardStream, ColorChoice, Color, ColorSpec, WriteColor};

        let mut stdout = StandardStream::stdout(ColorChoice::Auto);

        let _ = stdout.set_color(
            ColorSpec::new()
                .set_bold(true)
                .set_intense(true)
                .set_fg(Some(Color::Blue))
        );

        let _ = writeln![&mut stdout, $($arg)+];
        let _ = stdout.reset();
    }};
}

#[macro_export]
macro_rules! print_entry {
    ($($arg:tt)+) => {{
        use std::io::Write;
        use termcolor::{StandardStream, ColorChoice, Color, ColorSpec, WriteColor};

        let mut stdout = StandardStream::stdout(ColorChoice::Auto);

        let _ = stdout.set_color(
            ColorSpec::new()
                .set_fg(Some(Color::Green))
        );

        let _ = write![&mut stdout, $($arg)+];
        let _ = stdout.reset();
    }};
}

#[macro_export]
macro_rules! errorln {
    ($($arg:tt)+) => {{
        use std::io::Write;
        use termcolor::{StandardStream, ColorChoice, Color, ColorSpec, WriteColor};

        let mut stderr = StandardStream::stderr(ColorChoice::Auto);

        let _ = stderr.set_color(
            ColorSpec::new()
                .set_fg(Some(Color::Red))
                .set_bold(true)
        );

        let _ = write![&mut stderr, "error"];
        let _ = stderr.reset();
        let _ = write![&mut stderr, ": "];
        let _ = writeln![&mut stderr, $($arg)+];
    }};
}
