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

use amplitude_identify::config;
use amplitude_identify::identify::{check_identification, Identification, ParseOptions};
use amplitude_identify::logging;

use clap::Parser;
use std::path::{Path, PathBuf};

/// Checks an identification document and prints the payload to send to the Identify API
#[derive(Parser, Debug)]
#[command(name = "identify-check", version, about)]
struct Args {
    /// Configuration file to use instead of the usual locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Indent the payload
    #[arg(long)]
    pretty: bool,

    /// Reject keys the Identify API does not know
    #[arg(long)]
    strict: bool,

    /// Identification document, read from stdin if omitted
    input: Option<PathBuf>,
}

fn read_input(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(p),
        None => std::io::read_to_string(std::io::stdin()),
    }
}

fn render(identification: &Identification, pretty: bool) -> serde_json::Result<String> {
    match pretty {
        true => serde_json::to_string_pretty(identification),
        false => serde_json::to_string(identification),
    }
}

/// Pass an identification on stdin (or as a file), get the payload or an explanation
fn main() {
    let args = Args::parse();

    /* Locate and parse the configuration file, see config.rs */
    let loaded = match config::get_configuration(args.config.as_deref()) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("failed to process configuration file: {}", e);
            std::process::exit(1);
        }
    };

    let configuration = loaded.configuration;

    let _logger = match logging::init_logger(&configuration.logging) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    /* Guessed files that failed to parse can only be reported now */
    for skipped in &loaded.skipped {
        log::warn!("skipping configuration file: {}", skipped);
    }

    let input = match read_input(args.input.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to read input: {}", e);
            std::process::exit(1);
        }
    };

    let mut options = ParseOptions::from(&configuration.validation);
    options.deny_unknown_fields |= args.strict;

    let identification = match check_identification(&input, &options) {
        Ok(i) => i,
        Err(explanations) => {
            println!("{}", explanations.join("\n"));
            std::process::exit(1);
        }
    };

    match render(&identification, args.pretty || configuration.output.pretty) {
        Ok(payload) => {
            log::debug!("identification accepted");
            println!("{}", payload);
        },
        Err(e) => {
            log::error!("failed to serialise payload: {}", e);
            std::process::exit(1);
        }
    }
}
