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

use crate::identify::device::DeviceInfo;
use crate::identify::errors::{json_type, ValidationError};
use crate::identify::location::LocationInfo;
use crate::identify::user_properties::UserProperties;
use crate::identify::ParseOptions;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Wire names of the identity fields, in payload order
pub const IDENTITY_FIELDS: [&str; 5] = ["user_id", "device_id", "language", "paying", "start_version"];

/// Key under which user property operations are sent
pub const USER_PROPERTIES: &str = "user_properties";

/// A user identification, as accepted by the Identify API
///
/// Always holds a user_id or a device_id (or both): the only way to get one
/// is through [`IdentificationBuilder::build`] or one of the parsing helpers,
/// all of which check this. Device and location fields are kept in their own
/// groups but sent flat, next to the identity fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    user_id: Option<String>,
    device_id: Option<String>,
    language: Option<String>,
    paying: Option<String>,
    start_version: Option<String>,
    device: DeviceInfo,
    location: LocationInfo,
    user_properties: Option<UserProperties>,
}

macro_rules! field_accessors {
    ($($name:ident => $($path:ident).+;)*) => {
        $(
            pub fn $name(&self) -> Option<&str> {
                self.$($path).+.as_deref()
            }
        )*
    };
}

macro_rules! field_setters {
    ($($name:ident => $($path:ident).+;)*) => {
        $(
            pub fn $name(mut self, value: impl Into<String>) -> Self {
                self.$($path).+ = Some(value.into());
                self
            }
        )*
    };
}

/// A present, non-empty identifier
fn is_given(identifier: &Option<String>) -> bool {
    identifier.as_deref().is_some_and(|s| !s.is_empty())
}

fn is_known_field(key: &str) -> bool {
    key == USER_PROPERTIES
        || IDENTITY_FIELDS.contains(&key)
        || DeviceInfo::FIELDS.contains(&key)
        || LocationInfo::FIELDS.contains(&key)
}

impl Identification {
    pub fn builder() -> IdentificationBuilder {
        IdentificationBuilder::default()
    }

    field_accessors! {
        user_id => user_id;
        device_id => device_id;
        language => language;
        paying => paying;
        start_version => start_version;
        platform => device.platform;
        os_name => device.os_name;
        os_version => device.os_version;
        device_brand => device.device_brand;
        device_manufacturer => device.device_manufacturer;
        device_model => device.device_model;
        carrier => device.carrier;
        country => location.country;
        region => location.region;
        city => location.city;
        dma => location.dma;
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn location(&self) -> &LocationInfo {
        &self.location
    }

    pub fn user_properties(&self) -> Option<&UserProperties> {
        self.user_properties.as_ref()
    }

    /// Every scalar field with its wire name, present or not
    fn scalar_fields(&self) -> impl Iterator<Item = (&'static str, &Option<String>)> + '_ {
        let identity = [
            &self.user_id,
            &self.device_id,
            &self.language,
            &self.paying,
            &self.start_version,
        ];

        IDENTITY_FIELDS.into_iter().zip(identity)
            .chain(DeviceInfo::FIELDS.into_iter().zip(self.device.values()))
            .chain(LocationInfo::FIELDS.into_iter().zip(self.location.values()))
    }

    /// Generates the identification payload for the Identify API
    ///
    /// Absent fields are left out rather than sent as null, and so is
    /// user_properties when it holds no operation.
    pub fn payload(&self) -> Map<String, Value> {
        let mut output: Map<String, Value> = self.scalar_fields()
            .filter_map(|(name, value)| value.as_ref().map(|v| (name.to_string(), Value::String(v.clone()))))
            .collect();

        if let Some(user_properties) = &self.user_properties {
            let operations = user_properties.payload();
            if !operations.is_empty() {
                output.insert(USER_PROPERTIES.to_string(), Value::Object(operations));
            }
        }

        output
    }

    /// Builds an identification from an untyped JSON document
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        Self::from_value_with(value, &ParseOptions::default())
    }

    /// Same as [`Identification::from_value`], reports the first problem found
    pub fn from_value_with(value: &Value, options: &ParseOptions) -> Result<Self, ValidationError> {
        let mut errors = vec![];
        let builder = IdentificationBuilder::from_json(value, options, &mut errors);
        match errors.into_iter().next() {
            Some(e) => {
                log::debug!("rejecting identification: {}", e);
                Err(e)
            },
            None => builder.build(),
        }
    }

    /// Lists every problem preventing a JSON document from being an identification
    pub fn problems(value: &Value, options: &ParseOptions) -> Vec<ValidationError> {
        let mut errors = vec![];
        let builder = IdentificationBuilder::from_json(value, options, &mut errors);
        if value.is_object() {
            if let Err(e) = builder.build() {
                errors.push(e);
            }
        }
        errors
    }
}

impl TryFrom<Value> for Identification {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Identification::from_value(&value)
    }
}

impl Serialize for Identification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Identification {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Identification::from_value(&value).map_err(de::Error::custom)
    }
}

/// Staged construction of an [`Identification`]
#[derive(Debug, Clone, Default)]
pub struct IdentificationBuilder {
    user_id: Option<String>,
    device_id: Option<String>,
    language: Option<String>,
    paying: Option<String>,
    start_version: Option<String>,
    device: DeviceInfo,
    location: LocationInfo,
    user_properties: Option<UserProperties>,
}

impl IdentificationBuilder {
    field_setters! {
        user_id => user_id;
        device_id => device_id;
        language => language;
        paying => paying;
        start_version => start_version;
        platform => device.platform;
        os_name => device.os_name;
        os_version => device.os_version;
        device_brand => device.device_brand;
        device_manufacturer => device.device_manufacturer;
        device_model => device.device_model;
        carrier => device.carrier;
        country => location.country;
        region => location.region;
        city => location.city;
        dma => location.dma;
    }

    /// Replaces all device fields at once
    pub fn device(mut self, device: DeviceInfo) -> Self {
        self.device = device;
        self
    }

    /// Replaces all location fields at once
    pub fn location(mut self, location: LocationInfo) -> Self {
        self.location = location;
        self
    }

    pub fn user_properties(mut self, user_properties: UserProperties) -> Self {
        self.user_properties = Some(user_properties);
        self
    }

    fn scalar_slots(&mut self) -> impl Iterator<Item = (&'static str, &mut Option<String>)> + '_ {
        let identity = [
            &mut self.user_id,
            &mut self.device_id,
            &mut self.language,
            &mut self.paying,
            &mut self.start_version,
        ];

        IDENTITY_FIELDS.into_iter().zip(identity)
            .chain(DeviceInfo::FIELDS.into_iter().zip(self.device.values_mut()))
            .chain(LocationInfo::FIELDS.into_iter().zip(self.location.values_mut()))
    }

    /// Fills a builder from an untyped JSON document
    /// Problems are pushed to `errors`, fields in error are left unset
    pub(crate) fn from_json(value: &Value, options: &ParseOptions, errors: &mut Vec<ValidationError>) -> Self {
        let mut builder = IdentificationBuilder::default();
        let map = match value.as_object() {
            Some(m) => m,
            None => {
                errors.push(ValidationError::NotAnObject(json_type(value)));
                return builder;
            }
        };

        for (field, slot) in builder.scalar_slots() {
            match map.get(field) {
                None | Some(Value::Null) => {},
                Some(Value::String(s)) => *slot = Some(s.clone()),
                Some(other) => errors.push(ValidationError::type_mismatch(field, "a string", other)),
            }
        }

        if let Some(user_properties) = map.get(USER_PROPERTIES) {
            builder.user_properties = UserProperties::from_json(user_properties, options, errors);
        }

        for key in map.keys().filter(|k| !is_known_field(k)) {
            match options.deny_unknown_fields {
                true => errors.push(ValidationError::UnknownField(key.clone())),
                false => log::debug!("ignoring unknown identification field: {}", key),
            }
        }

        builder
    }

    /// Checks the identifiers and hands out the identification
    pub fn build(self) -> Result<Identification, ValidationError> {
        if !is_given(&self.user_id) && !is_given(&self.device_id) {
            log::debug!("refusing identification without user_id or device_id");
            return Err(ValidationError::MissingIdentifier);
        }

        Ok(Identification {
            user_id: self.user_id,
            device_id: self.device_id,
            language: self.language,
            paying: self.paying,
            start_version: self.start_version,
            device: self.device,
            location: self.location,
            user_properties: self.user_properties,
        })
    }
}
