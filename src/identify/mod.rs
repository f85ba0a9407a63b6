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

//! Models for the Amplitude Identify API
//!
//! See <https://developers.amplitude.com/docs/identify-api#keys-for-the-identification-argument>
//! for the documentation of each field.

pub mod device;
pub mod errors;
pub mod identification;
pub mod location;
pub mod rejections;
pub mod user_properties;

pub use device::DeviceInfo;
pub use errors::ValidationError;
pub use identification::{Identification, IdentificationBuilder};
pub use location::LocationInfo;
pub use rejections::{check_identification, explain_rejection};
pub use user_properties::{Operation, Properties, UserProperties};

/// How lenient parsing of untyped documents should be
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Report keys that are not part of the Identify API instead of ignoring them
    pub deny_unknown_fields: bool,
}
