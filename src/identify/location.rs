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

/// Location fields of an identification
///
/// Same as the device fields: country, region, city and dma are updated
/// together by the backend, the others are reset if left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationInfo {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    /// Designated market area
    pub dma: Option<String>,
}

impl LocationInfo {
    pub const FIELDS: [&'static str; 4] = ["country", "region", "city", "dma"];

    pub(crate) fn values(&self) -> [&Option<String>; 4] {
        [&self.country, &self.region, &self.city, &self.dma]
    }

    pub(crate) fn values_mut(&mut self) -> [&mut Option<String>; 4] {
        [&mut self.country, &mut self.region, &mut self.city, &mut self.dma]
    }
}
