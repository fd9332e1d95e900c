use log::{Level, LevelFilter};

/// Verbosity handle handed to every component that reports progress.
///
/// Components never consult a global verbosity setting; they ask their own
/// handle whether a level is enabled and only then go through the `log`
/// facade. Whoever builds the handle decides how chatty the computation is,
/// and the binary is the only place that installs an actual logger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogHandle {
    level: LevelFilter,
}

impl LogHandle {
    pub fn new(level: LevelFilter) -> Self {
        LogHandle { level }
    }

    /// A handle that suppresses everything; handy in tests.
    pub fn silent() -> Self {
        LogHandle::new(LevelFilter::Off)
    }

    pub fn from_debug_flag(debug: bool) -> Self {
        if debug {
            LogHandle::new(LevelFilter::Debug)
        } else {
            LogHandle::new(LevelFilter::Info)
        }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    pub fn debug(&self) -> bool {
        self.enabled(Level::Debug)
    }

    pub fn info(&self) -> bool {
        self.enabled(Level::Info)
    }
}

impl Default for LogHandle {
    fn default() -> Self {
        LogHandle::new(LevelFilter::Info)
    }
}
