//! Test utilities and helper functions

use crate::common::mock_interface::MockInterface;
use drv8711::{Drv8711, Event, EventSink};
use std::cell::RefCell;
use std::rc::Rc;

/// Recording delay implementation for testing
///
/// Implements the embedded-hal `DelayNs` trait and logs every
/// requested delay in microseconds instead of sleeping, so tests can
/// assert on the backoff sequence. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct MockDelay {
    delays_us: Rc<RefCell<Vec<u32>>>,
}

impl MockDelay {
    /// Create a new recording delay
    pub fn new() -> Self {
        Self::default()
    }

    /// All delays requested so far, in microseconds
    pub fn delays_us(&self) -> Vec<u32> {
        self.delays_us.borrow().clone()
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_us.borrow_mut().push(ns / 1_000);
    }

    fn delay_us(&mut self, us: u32) {
        self.delays_us.borrow_mut().push(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_us.borrow_mut().push(ms * 1_000);
    }
}

/// Recording event sink. Clones share the event log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<Event>>>,
}

impl RecordingSink {
    /// Create a new recording sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }
}

impl EventSink for RecordingSink {
    fn record(&mut self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

/// Create a mock driver for testing.
///
/// Returns (driver, interface, delay) where interface and delay are
/// clones sharing state with the ones the driver owns.
pub fn create_mock_driver() -> (
    Drv8711<MockInterface, MockDelay>,
    MockInterface,
    MockDelay,
) {
    let interface = MockInterface::new();
    let delay = MockDelay::new();
    let driver = Drv8711::new(interface.clone(), delay.clone());
    (driver, interface, delay)
}

/// Create a mock driver with a recording event sink attached
pub fn create_mock_driver_with_sink() -> (
    Drv8711<MockInterface, MockDelay, RecordingSink>,
    MockInterface,
    RecordingSink,
) {
    let interface = MockInterface::new();
    let sink = RecordingSink::new();
    let driver = Drv8711::with_event_sink(interface.clone(), MockDelay::new(), sink.clone());
    (driver, interface, sink)
}
