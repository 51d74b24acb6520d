//! Core traits and types for instruction-stepped emulation.
//!
//! A CPU executes one instruction per `step()` and reports the T-states it
//! took. Memory, ports and interrupt lines live outside the CPU and are
//! reached through the traits defined here.

mod bus;
mod cpu;
mod interrupt;
mod observable;
mod simple_bus;
mod ticks;

pub use bus::Bus;
pub use cpu::Cpu;
pub use interrupt::InterruptLine;
pub use observable::{Observable, Value};
pub use simple_bus::SimpleBus;
pub use ticks::Ticks;
