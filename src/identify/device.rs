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

/// Device fields of an identification
///
/// The Identify API updates these as a group: setting any of them resets
/// the others to null server-side unless they are sent in the same call.
/// Amplitude uses device_brand, device_manufacturer and device_model to map
/// the device type. Nothing here enforces the grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub platform: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub device_brand: Option<String>,
    pub device_manufacturer: Option<String>,
    pub device_model: Option<String>,
    pub carrier: Option<String>,
}

impl DeviceInfo {
    /// Wire names, in payload order
    pub const FIELDS: [&'static str; 7] = [
        "platform",
        "os_name",
        "os_version",
        "device_brand",
        "device_manufacturer",
        "device_model",
        "carrier",
    ];

    pub(crate) fn values(&self) -> [&Option<String>; 7] {
        [
            &self.platform,
            &self.os_name,
            &self.os_version,
            &self.device_brand,
            &self.device_manufacturer,
            &self.device_model,
            &self.carrier,
        ]
    }

    pub(crate) fn values_mut(&mut self) -> [&mut Option<String>; 7] {
        [
            &mut self.platform,
            &mut self.os_name,
            &mut self.os_version,
            &mut self.device_brand,
            &mut self.device_manufacturer,
            &mut self.device_model,
            &mut self.carrier,
        ]
    }
}
