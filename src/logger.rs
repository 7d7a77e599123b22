//! Pluggable message sink for the engine and the dependency detector.

use std::fmt;

use log::Level;

/// Receives the informational and warning messages produced while running.
///
/// Components take a logger instead of writing to a process-wide console, so
/// callers can route messages anywhere or drop them entirely.
pub trait Logger {
    /// Emits a single message at the given level.
    fn log(&self, level: Level, args: fmt::Arguments<'_>);

    /// Emits an informational message.
    fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args)
    }

    /// Emits a warning.
    fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args)
    }

    /// Emits a debug message.
    fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args)
    }
}

/// Forwards every message to the [`log`] facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogFacade;

impl Logger for LogFacade {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        log::log!(target: "apksource", level, "{}", args);
    }
}

/// Discards every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl Logger for Silent {
    fn log(&self, _level: Level, _args: fmt::Arguments<'_>) {}
}

impl<L: Logger + ?Sized> Logger for &L {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        (**self).log(level, args)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::*;

    /// Keeps every message so tests can assert on them.
    #[derive(Debug, Default)]
    pub(crate) struct Recorder {
        pub(crate) messages: RefCell<Vec<(Level, String)>>,
    }

    impl Recorder {
        pub(crate) fn count(&self, level: Level) -> usize {
            self.messages
                .borrow()
                .iter()
                .filter(|(l, _)| *l == level)
                .count()
        }
    }

    impl Logger for Recorder {
        fn log(&self, level: Level, args: fmt::Arguments<'_>) {
            self.messages.borrow_mut().push((level, args.to_string()));
        }
    }
}
