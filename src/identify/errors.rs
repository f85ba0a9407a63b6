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

use serde_json::Value;
use thiserror::Error;

/// Everything that can go wrong when building an identification
/// Payload generation itself never fails: once a model exists, it is valid
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Neither user_id nor device_id was given, or both were empty
    #[error("must provide at least one of user_id and device_id")]
    MissingIdentifier,

    /// A field holds a value of the wrong JSON type
    #[error("{field}: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The document root is not a JSON object
    #[error("root element is not a map (found {0})")]
    NotAnObject(&'static str),

    /// Key not recognised, only reported in strict mode
    #[error("{0}: unknown field")]
    UnknownField(String),
}

impl ValidationError {
    pub(crate) fn type_mismatch(field: impl Into<String>, expected: &'static str, found: &Value) -> Self {
        ValidationError::TypeMismatch {
            field: field.into(),
            expected,
            found: json_type(found),
        }
    }
}

/// Human-friendly name for the type of a JSON value
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}
