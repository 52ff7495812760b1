//! Tray host and presentation
//!
//! Rendering into a desktop tray toolkit is left to the toolkit; this module
//! keeps the view model and the action dispatch.

pub mod host;
pub mod presenter;
