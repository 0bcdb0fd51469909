#![cfg_attr(not(test), no_std)]

// Control-plane logic for a QSC6085-class baseband modem driven over discrete
// signal lines.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library and exposing the hardware seams as traits the other
// crates implement.

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod control;
pub mod error;
pub mod irq;
pub mod lifecycle;
pub mod lines;
pub mod link;
pub mod monitor;
pub mod retry;
pub mod sequences;
pub mod telemetry;

pub use control::{ModemControl, ModemOps, ModemParts, SequenceDelay};
pub use error::ModemError;
pub use lifecycle::{LifecycleNotifier, LifecycleState};
pub use lines::{GpioBank, GpioNum, Level, ModemLine, ModemPlatformData};
