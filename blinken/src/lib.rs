//! Control loop for a single LED with three modes (off, on, flash) and a
//! runtime adjustable flash period.
//!
//! The [`Supervisor`] acquires the pin, publishes the `mode` and
//! `blinkPeriod` attributes through a [`Registry`] and starts the
//! [`BlinkWorker`]. From then on the worker and the attribute handlers
//! share a single [`ConfigState`]; the worker is the only writer of the
//! output level and the attributes are the only writers of mode and period.

pub mod attr;
mod error;
pub mod mode;
pub mod pin;
pub mod registry;
pub mod state;
pub mod supervisor;
pub mod worker;

#[cfg(test)]
pub(crate) mod mock;

pub use self::{
	attr::{Attribute, ModeAttribute, Outcome, PeriodAttribute, Store},
	error::{Error, ErrorKind},
	mode::Mode,
	pin::{Gpio, OutputPin},
	registry::{AttributeGroup, Namespace, Registry},
	state::ConfigState,
	supervisor::{Settings, Supervisor},
	worker::{BlinkWorker, WorkerStatus},
};
