//! Backends for the bench seams: a simulated rig for development and tests,
//! a text-grid display, and (behind the `hardware` feature) the Raspberry Pi
//! PWM, GPIO and SPI ADC drivers.
pub mod buttons;
pub mod display;
pub mod error;
pub mod sim;

pub use buttons::{PressEvent, PressTracker};
pub use display::TerminalDisplay;
pub use sim::{LoggingSleep, SimConfig, SimPower, SimSensor, SimulatedRig};

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod hardware;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use hardware::{AdcSensor, GpioButtons, Mcp3208, PwmPower};
