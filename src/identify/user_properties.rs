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

use crate::identify::errors::ValidationError;
use crate::identify::ParseOptions;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Convenience type: arbitrary key-value user properties
pub type Properties = HashMap<String, Value>;

/// User property operations supported by the Identify API
///
/// - `$set` sets the value of a property
/// - `$setOnce` sets the value of a property, without overriding an existing one
/// - `$add` adds a numeric value to a numeric property
/// - `$append` and `$prepend` append or prepend values to an array property
/// - `$unset` removes a property
/// - `$preInsert` and `$postInsert` insert values at the beginning or the end
///   of an array property if they are not already in it
/// - `$remove` removes all instances of the given values from an array property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Set,
    SetOnce,
    Add,
    Append,
    Prepend,
    Unset,
    PreInsert,
    PostInsert,
    Remove,
}

impl Operation {
    /// All operations, in the order they are written to the payload
    pub const ALL: [Operation; 9] = [
        Operation::Set,
        Operation::SetOnce,
        Operation::Add,
        Operation::Append,
        Operation::Prepend,
        Operation::Unset,
        Operation::PreInsert,
        Operation::PostInsert,
        Operation::Remove,
    ];

    /// The key used for this operation in the user_properties map
    pub fn key(&self) -> &'static str {
        match self {
            Operation::Set => "$set",
            Operation::SetOnce => "$setOnce",
            Operation::Add => "$add",
            Operation::Append => "$append",
            Operation::Prepend => "$prepend",
            Operation::Unset => "$unset",
            Operation::PreInsert => "$preInsert",
            Operation::PostInsert => "$postInsert",
            Operation::Remove => "$remove",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Operation::ALL.into_iter().find(|operation| operation.key() == key)
    }
}

/// A set of operations to apply to the stored properties of a user
///
/// Operations are independent: any subset may be given. Empty ones are
/// treated as absent and never make it to the payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProperties {
    set: Option<Properties>,
    set_once: Option<Properties>,
    add: Option<Properties>,
    append: Option<Properties>,
    prepend: Option<Properties>,
    unset: Option<Properties>,
    pre_insert: Option<Properties>,
    post_insert: Option<Properties>,
    remove: Option<Properties>,
}

impl UserProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the properties for one operation, replacing what was there
    pub fn with<K, V>(mut self, operation: Operation, properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        *self.slot_mut(operation) = Some(
            properties.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect()
        );
        self
    }

    pub fn with_set<K: Into<String>, V: Into<Value>>(self, properties: impl IntoIterator<Item = (K, V)>) -> Self {
        self.with(Operation::Set, properties)
    }

    pub fn with_set_once<K: Into<String>, V: Into<Value>>(self, properties: impl IntoIterator<Item = (K, V)>) -> Self {
        self.with(Operation::SetOnce, properties)
    }

    pub fn with_add<K: Into<String>, V: Into<Value>>(self, properties: impl IntoIterator<Item = (K, V)>) -> Self {
        self.with(Operation::Add, properties)
    }

    pub fn with_append<K: Into<String>, V: Into<Value>>(self, properties: impl IntoIterator<Item = (K, V)>) -> Self {
        self.with(Operation::Append, properties)
    }

    pub fn with_prepend<K: Into<String>, V: Into<Value>>(self, properties: impl IntoIterator<Item = (K, V)>) -> Self {
        self.with(Operation::Prepend, properties)
    }

    pub fn with_unset<K: Into<String>, V: Into<Value>>(self, properties: impl IntoIterator<Item = (K, V)>) -> Self {
        self.with(Operation::Unset, properties)
    }

    pub fn with_pre_insert<K: Into<String>, V: Into<Value>>(self, properties: impl IntoIterator<Item = (K, V)>) -> Self {
        self.with(Operation::PreInsert, properties)
    }

    pub fn with_post_insert<K: Into<String>, V: Into<Value>>(self, properties: impl IntoIterator<Item = (K, V)>) -> Self {
        self.with(Operation::PostInsert, properties)
    }

    pub fn with_remove<K: Into<String>, V: Into<Value>>(self, properties: impl IntoIterator<Item = (K, V)>) -> Self {
        self.with(Operation::Remove, properties)
    }

    /// Properties given for an operation, if any (possibly empty)
    pub fn get(&self, operation: Operation) -> Option<&Properties> {
        match operation {
            Operation::Set => self.set.as_ref(),
            Operation::SetOnce => self.set_once.as_ref(),
            Operation::Add => self.add.as_ref(),
            Operation::Append => self.append.as_ref(),
            Operation::Prepend => self.prepend.as_ref(),
            Operation::Unset => self.unset.as_ref(),
            Operation::PreInsert => self.pre_insert.as_ref(),
            Operation::PostInsert => self.post_insert.as_ref(),
            Operation::Remove => self.remove.as_ref(),
        }
    }

    fn slot_mut(&mut self, operation: Operation) -> &mut Option<Properties> {
        match operation {
            Operation::Set => &mut self.set,
            Operation::SetOnce => &mut self.set_once,
            Operation::Add => &mut self.add,
            Operation::Append => &mut self.append,
            Operation::Prepend => &mut self.prepend,
            Operation::Unset => &mut self.unset,
            Operation::PreInsert => &mut self.pre_insert,
            Operation::PostInsert => &mut self.post_insert,
            Operation::Remove => &mut self.remove,
        }
    }

    /// Operations that will actually be sent
    pub fn operations(&self) -> impl Iterator<Item = (Operation, &Properties)> + '_ {
        Operation::ALL.into_iter()
            .filter_map(|operation| self.get(operation).map(|properties| (operation, properties)))
            .filter(|(_, properties)| !properties.is_empty())
    }

    /// True when no operation would be sent
    pub fn is_empty(&self) -> bool {
        self.operations().next().is_none()
    }

    /// Converts the operations into the map expected under user_properties
    pub fn payload(&self) -> Map<String, Value> {
        self.operations()
            .map(|(operation, properties)| {
                let object = properties.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<Map<String, Value>>();
                (operation.key().to_string(), Value::Object(object))
            })
            .collect()
    }

    /// Reads operations from an untyped user_properties value
    /// Problems are pushed to `errors`, whatever could be read is returned
    pub(crate) fn from_json(value: &Value, options: &ParseOptions, errors: &mut Vec<ValidationError>) -> Option<Self> {
        let map = match value {
            Value::Null => return None,
            Value::Object(map) => map,
            other => {
                errors.push(ValidationError::type_mismatch("user_properties", "a map", other));
                return None;
            }
        };

        let mut user_properties = UserProperties::new();
        for (key, value) in map {
            let field = format!("user_properties.{}", key);
            match Operation::from_key(key) {
                Some(operation) => match value {
                    Value::Null => {},
                    Value::Object(properties) => {
                        user_properties = user_properties.with(operation, properties.clone());
                    },
                    other => errors.push(ValidationError::type_mismatch(field, "a map", other)),
                },
                None if options.deny_unknown_fields => errors.push(ValidationError::UnknownField(field)),
                None => log::debug!("ignoring unknown user property operation: {}", key),
            }
        }
        Some(user_properties)
    }
}

impl Serialize for UserProperties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_populated_operations_are_sent() {
        let user_properties = UserProperties::new()
            .with_set([("plan", "pro")])
            .with_unset([("trial", "")]);

        assert_eq!(
            Value::Object(user_properties.payload()),
            json!({"$set": {"plan": "pro"}, "$unset": {"trial": ""}})
        );
    }

    #[test]
    fn add_alone_yields_a_single_key() {
        let user_properties = UserProperties::new().with_add([("logins", json!(1)), ("score", json!(2.5))]);
        let payload = user_properties.payload();

        assert_eq!(payload.len(), 1);
        assert_eq!(payload["$add"], json!({"logins": 1, "score": 2.5}));
    }

    #[test]
    fn empty_operations_are_dropped() {
        let user_properties = UserProperties::new()
            .with_set(Properties::new())
            .with_append([("tags", json!(["a", "b"]))]);

        assert_eq!(Value::Object(user_properties.payload()), json!({"$append": {"tags": ["a", "b"]}}));
        assert!(user_properties.get(Operation::Set).is_some());
    }

    #[test]
    fn nothing_set_is_empty() {
        assert!(UserProperties::new().is_empty());
        assert!(UserProperties::new().with_remove(Properties::new()).is_empty());
        assert!(UserProperties::new().payload().is_empty());
    }

    #[test]
    fn every_operation_has_its_own_key() {
        let mut user_properties = UserProperties::new();
        for operation in Operation::ALL {
            user_properties = user_properties.with(operation, [("k", operation.key())]);
        }

        let payload = user_properties.payload();
        assert_eq!(payload.len(), Operation::ALL.len());
        for operation in Operation::ALL {
            assert_eq!(payload[operation.key()], json!({"k": operation.key()}));
            assert_eq!(Operation::from_key(operation.key()), Some(operation));
        }
    }

    #[test]
    fn serializes_like_its_payload() {
        let user_properties = UserProperties::new().with_set_once([("signup", "2023-01-01")]);
        assert_eq!(
            serde_json::to_value(&user_properties).unwrap(),
            json!({"$setOnce": {"signup": "2023-01-01"}})
        );
    }

    #[test]
    fn reads_operations_from_json() {
        let mut errors = vec![];
        let parsed = UserProperties::from_json(
            &json!({"$set": {"plan": "pro"}, "$add": null, "$append": 3, "$bogus": {}}),
            &ParseOptions::default(),
            &mut errors,
        ).unwrap();

        assert_eq!(parsed, UserProperties::new().with_set([("plan", "pro")]));
        assert_eq!(errors, vec![ValidationError::TypeMismatch {
            field: "user_properties.$append".into(),
            expected: "a map",
            found: "a number",
        }]);
    }

    #[test]
    fn strict_mode_reports_unknown_operations() {
        let mut errors = vec![];
        UserProperties::from_json(
            &json!({"$bogus": {}}),
            &ParseOptions { deny_unknown_fields: true },
            &mut errors,
        );
        assert_eq!(errors, vec![ValidationError::UnknownField("user_properties.$bogus".into())]);
    }

    #[test]
    fn rejects_non_map_user_properties() {
        let mut errors = vec![];
        assert!(UserProperties::from_json(&json!(["$set"]), &ParseOptions::default(), &mut errors).is_none());
        assert_eq!(errors.len(), 1);
    }
}
