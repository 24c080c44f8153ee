//! Recording sessions and script generation.
//!
//! A [`recorder::Recorder`] owns one browser page for the lifetime of a session and
//! appends every captured event to an ordered action log. Stopping a session
//! flushes the log through the [`store::ActionLogStore`]; the
//! [`generator::ScriptGenerator`] later compiles a stored log into test scripts
//! without touching a browser.

pub mod backend;
pub mod cli;
pub mod config;
pub mod generator;
pub mod recorder;
pub mod registry;
pub mod session;
pub mod store;

pub use trailmark_common as common;
