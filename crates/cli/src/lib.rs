//! Command line front end for the `lcu` connection core.
//!
//! `lcu run` watches the client process, keeps the client API and lobby
//! transports alive and prints every UI boundary event to stdout as one JSON
//! object per line. Logs go to stderr.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
