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

use crate::identify::identification::Identification;
use crate::identify::ParseOptions;

use serde_json::Value;

/// Parses a raw document into an identification, or explains why not
/// Explanations are numbered, log-friendly messages
pub fn check_identification(payload: &str, options: &ParseOptions) -> Result<Identification, Vec<String>> {
    let generic_json = match serde_json::from_str::<Value>(payload) {
        Ok(j) => j,
        Err(e) => return Err(vec!(format!("(1) invalid JSON structure: {}", e))),
    };

    if let Ok(identification) = Identification::from_value_with(&generic_json, options) {
        return Ok(identification);
    }

    let messages = Identification::problems(&generic_json, options).iter().enumerate()
        .map(|(i, e)| format!("({}) {}", i + 1, e))
        .collect::<Vec<String>>();
    Err(messages)
}

/// Attempts to explain why a payload is being rejected, empty if it is valid
pub fn explain_rejection(payload: &str, options: &ParseOptions) -> Vec<String> {
    check_identification(payload, options).err().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_documents_have_no_explanation() {
        assert!(explain_rejection(r#"{"user_id": "u1"}"#, &ParseOptions::default()).is_empty());
    }

    #[test]
    fn broken_json() {
        let messages = explain_rejection("{\"user_id\": ", &ParseOptions::default());
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("(1) invalid JSON structure"));
    }

    #[test]
    fn messages_are_numbered() {
        let messages = explain_rejection(r#"{"os_name": 7, "extra": 1}"#, &ParseOptions { deny_unknown_fields: true });
        assert_eq!(messages, vec!(
            String::from("(1) os_name: expected a string, found a number"),
            String::from("(2) extra: unknown field"),
            String::from("(3) must provide at least one of user_id and device_id"),
        ));
    }

    #[test]
    fn checked_documents_come_back_parsed() {
        let identification = check_identification(r#"{"device_id": "d1", "region": "IDF"}"#, &ParseOptions::default()).unwrap();
        assert_eq!(identification.region(), Some("IDF"));
    }
}
