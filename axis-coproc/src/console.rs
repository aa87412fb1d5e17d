//! # Diagnostic console logger
//!
//! Blocking [log] backend which formats every record into a [core::fmt::Write] sink, usually the
//! UART which is connected to the lab PC. The write happens inside a critical section, so the
//! logger can be used from both the main flow and interrupt handlers.
use core::{
    cell::RefCell,
    fmt::Write,
    sync::atomic::{AtomicBool, Ordering},
};

use critical_section::Mutex;
use log::{LevelFilter, set_logger, set_max_level};

static LOGGER_INIT_DONE: AtomicBool = AtomicBool::new(false);

pub type Sink = &'static mut (dyn Write + Send);

pub struct ConsoleLogger(Mutex<RefCell<Option<Sink>>>);

static CONSOLE_LOGGER: ConsoleLogger = ConsoleLogger(Mutex::new(RefCell::new(None)));

/// Initialize the logger with a blocking sink.
///
/// Calling this again replaces the sink and the level filter.
pub fn init_with_locks(sink: Sink, level: LevelFilter) -> Result<(), log::SetLoggerError> {
    critical_section::with(|cs| {
        CONSOLE_LOGGER.0.borrow(cs).replace(Some(sink));
    });
    if !LOGGER_INIT_DONE.swap(true, Ordering::Relaxed) {
        set_logger(&CONSOLE_LOGGER)?;
    }
    set_max_level(level);
    Ok(())
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        critical_section::with(|cs| {
            let mut sink = self.0.borrow(cs).borrow_mut();
            let Some(sink) = sink.as_mut() else {
                return;
            };
            // There is nowhere to report a failing console to.
            let _ = write!(sink, "{} - {}\r\n", record.level(), record.args());
        })
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::{boxed::Box, string::String};

    static CAPTURED: Mutex<RefCell<String>> = Mutex::new(RefCell::new(String::new()));

    struct CaptureSink;

    impl Write for CaptureSink {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            critical_section::with(|cs| CAPTURED.borrow(cs).borrow_mut().push_str(s));
            Ok(())
        }
    }

    #[test]
    fn test_records_reach_sink() {
        init_with_locks(Box::leak(Box::new(CaptureSink)), LevelFilter::Trace).unwrap();
        log::warn!("fifo status {:#x}", 0x0c00_0000);
        let captured = critical_section::with(|cs| CAPTURED.borrow(cs).borrow().clone());
        assert!(captured.contains("WARN - fifo status 0xc000000\r\n"));
    }
}
