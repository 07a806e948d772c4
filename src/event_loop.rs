use std::io;
use std::time::{Duration, Instant};

use crossterm::event::Event;

use crate::drivers::InputDriver;

pub enum ControlFlow {
    Continue,
    /// Keep running and call the handler again no later than this instant.
    WakeAt(Instant),
    Quit,
}

/// What the loop hands to its handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    Input(Event),
    /// No input arrived before the timeout; time to draw and run timers.
    Idle(Instant),
}

/// Single-threaded input pump for the demo host.
///
/// The handler is called with [`Tick::Idle`] once per iteration and with
/// [`Tick::Input`] for every pending event. A handler returning
/// [`ControlFlow::WakeAt`] shortens the next poll so timers (such as settle
/// deadlines of the drag engine) fire on time.
pub struct EventLoop<D> {
    driver: D,
    poll_interval: Duration,
}

impl<D: InputDriver> EventLoop<D> {
    pub fn new(driver: D, poll_interval: Duration) -> Self {
        Self {
            driver,
            poll_interval,
        }
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn run<F>(&mut self, mut handler: F) -> io::Result<()>
    where
        F: FnMut(&mut D, Tick) -> io::Result<ControlFlow>,
    {
        loop {
            let timeout = match handler(&mut self.driver, Tick::Idle(Instant::now()))? {
                ControlFlow::Quit => return Ok(()),
                ControlFlow::WakeAt(deadline) => self.timeout_until(deadline),
                ControlFlow::Continue => self.poll_interval,
            };

            if !self.driver.poll(timeout)? {
                continue;
            }
            // Drain bursts (mouse drags) before the next idle tick.
            loop {
                let event = self.driver.read()?;
                if let ControlFlow::Quit = handler(&mut self.driver, Tick::Input(event))? {
                    return Ok(());
                }
                if !self.driver.poll(Duration::ZERO)? {
                    break;
                }
            }
        }
    }

    fn timeout_until(&self, deadline: Instant) -> Duration {
        deadline
            .saturating_duration_since(Instant::now())
            .min(self.poll_interval)
    }
}
