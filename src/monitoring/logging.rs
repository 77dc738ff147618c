// Copyright (c) 2026 Groupledger
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Global `tracing` subscriber setup.

use crate::config::{LogConfig, LogFormat};
use thiserror::Error;
use tracing::Level;

/// Logging errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level: {0}")]
    InvalidLevel(String),
    #[error("global subscriber already set")]
    AlreadyInitialized,
}

/// Install the global subscriber described by `cfg`.
pub fn init_tracing(cfg: &LogConfig) -> Result<(), LoggingError> {
    let level: Level = cfg
        .level
        .parse()
        .map_err(|_| LoggingError::InvalidLevel(cfg.level.clone()))?;

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level);

    let res = match cfg.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    res.map_err(|_| LoggingError::AlreadyInitialized)
}
