/* amplitude-identify - validated payloads for the Amplitude Identify API
 * Copyright (C) 2023 Withings
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>. */

use crate::config;

use flexi_logger::{DeferredNow, FlexiLoggerError, LogSpecification, Logger, LoggerHandle};
use thiserror::Error;

/// Modules whose records make it through the log specification
const LOGGED_MODULES: [&str; 2] = ["amplitude_identify", "identify_check"];

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("failed to start logger: {0}")]
    Start(#[from] FlexiLoggerError),
}

/// Starts logging to stderr, stdout is kept for payloads
/// The returned handle must be kept alive for as long as logging is needed
pub fn init_logger(log_config: &config::Logging) -> Result<LoggerHandle, LoggingError> {
    let mut spec = LogSpecification::builder();
    for module in LOGGED_MODULES {
        spec.module(module, log_config.level);
    }

    let handle = Logger::with(spec.build())
        .log_to_stderr()
        .format(record_formatter)
        .start()?;
    Ok(handle)
}

/// Formats one record, the writer terminates the line
fn record_formatter(
    writer: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record) -> Result<(), std::io::Error> {
    write!(
        writer,
        "{} {} [{}] {}",
        now.format_rfc3339(),
        record.level(),
        record.module_path().unwrap_or("amplitude_identify::<unknown>"),
        record.args(),
    )
}
