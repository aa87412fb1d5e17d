//! Interrupt handler registration.
//!
//! Handlers are closures registered per interrupt line. The top level interrupt handler of the
//! application acknowledges the interrupt at the interrupt controller and forwards the interrupt
//! ID to [IrqDispatcher::dispatch_raw].
use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Vec;

/// Shared peripheral interrupt IDs of the PL to PS interrupt lines used by the labs.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, num_enum::TryFromPrimitive, num_enum::IntoPrimitive,
)]
#[repr(u32)]
pub enum IrqLine {
    AxiFifo = 61,
    AxiDmaToDevice = 62,
    AxiDmaFromDevice = 63,
    AxiTimer = 64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("interrupt line {0:?} already has a handler")]
    LineTaken(IrqLine),
    #[error("handler table is full")]
    TableFull,
}

pub type Handler<'a> = &'a mut (dyn FnMut() + Send);

/// Table of registered interrupt handlers.
pub struct IrqDispatcher<'a, const SLOTS: usize = 4> {
    handlers: Mutex<RefCell<Vec<(IrqLine, Handler<'a>), SLOTS>>>,
}

impl<const SLOTS: usize> Default for IrqDispatcher<'_, SLOTS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const SLOTS: usize> IrqDispatcher<'a, SLOTS> {
    pub const fn new() -> Self {
        Self {
            handlers: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    pub fn register(&self, line: IrqLine, handler: Handler<'a>) -> Result<(), DispatchError> {
        critical_section::with(|cs| {
            let mut handlers = self.handlers.borrow(cs).borrow_mut();
            if handlers.iter().any(|(registered, _)| *registered == line) {
                return Err(DispatchError::LineTaken(line));
            }
            handlers
                .push((line, handler))
                .map_err(|_| DispatchError::TableFull)
        })
    }

    /// Remove the handler of a line. Returns the handler if one was registered.
    pub fn deregister(&self, line: IrqLine) -> Option<Handler<'a>> {
        critical_section::with(|cs| {
            let mut handlers = self.handlers.borrow(cs).borrow_mut();
            let idx = handlers
                .iter()
                .position(|(registered, _)| *registered == line)?;
            Some(handlers.swap_remove(idx).1)
        })
    }

    /// Run the handler of a line to completion. Returns whether a handler was registered.
    pub fn dispatch(&self, line: IrqLine) -> bool {
        critical_section::with(|cs| {
            let mut handlers = self.handlers.borrow(cs).borrow_mut();
            match handlers.iter_mut().find(|(registered, _)| *registered == line) {
                Some((_, handler)) => {
                    handler();
                    true
                }
                None => false,
            }
        })
    }

    /// Dispatch by raw interrupt ID.
    pub fn dispatch_raw(&self, id: u32) -> bool {
        match IrqLine::try_from(id) {
            Ok(line) => self.dispatch(line),
            Err(_) => {
                log::warn!("spurious interrupt with ID {}", id);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_register_dispatch_deregister() {
        let calls = AtomicU32::new(0);
        let mut handler = || {
            calls.fetch_add(1, Ordering::Relaxed);
        };
        let dispatcher: IrqDispatcher<2> = IrqDispatcher::new();
        dispatcher.register(IrqLine::AxiFifo, &mut handler).unwrap();
        assert!(dispatcher.dispatch(IrqLine::AxiFifo));
        assert!(dispatcher.dispatch_raw(61));
        assert!(!dispatcher.dispatch(IrqLine::AxiTimer));
        assert!(dispatcher.deregister(IrqLine::AxiFifo).is_some());
        assert!(!dispatcher.dispatch(IrqLine::AxiFifo));
        assert!(dispatcher.deregister(IrqLine::AxiFifo).is_none());
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_registration_errors() {
        let mut first = || ();
        let mut duplicate = || ();
        let mut second = || ();
        let mut third = || ();
        let dispatcher: IrqDispatcher<2> = IrqDispatcher::new();
        dispatcher.register(IrqLine::AxiFifo, &mut first).unwrap();
        assert_eq!(
            dispatcher.register(IrqLine::AxiFifo, &mut duplicate),
            Err(DispatchError::LineTaken(IrqLine::AxiFifo))
        );
        dispatcher.register(IrqLine::AxiTimer, &mut second).unwrap();
        assert_eq!(
            dispatcher.register(IrqLine::AxiDmaToDevice, &mut third),
            Err(DispatchError::TableFull)
        );
    }

    #[test]
    fn test_raw_ids() {
        let dispatcher: IrqDispatcher<1> = IrqDispatcher::new();
        assert!(!dispatcher.dispatch_raw(1023));
        assert_eq!(u32::from(IrqLine::AxiDmaFromDevice), 63);
        assert_eq!(IrqLine::try_from(64), Ok(IrqLine::AxiTimer));
    }
}
