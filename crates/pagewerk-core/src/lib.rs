// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagewerk — Core types, errors, and configuration shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod job;
pub mod types;

pub use config::EngineConfig;
pub use error::{PagewerkError, ParseError, Result};
pub use job::{CancelFlag, JobControl, Progress};
pub use types::*;
