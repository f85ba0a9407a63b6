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

use amplitude_identify::identify::{
    explain_rejection, DeviceInfo, Identification, LocationInfo, ParseOptions, UserProperties, ValidationError,
};

use assert_json_diff::assert_json_eq;
use indoc::indoc;
use rstest::rstest;
use serde_json::{json, Value};

fn payload_of(identification: &Identification) -> Value {
    Value::Object(identification.payload())
}

#[rstest]
#[case::user_id_only(Some("u1"), None, true)]
#[case::device_id_only(None, Some("d1"), true)]
#[case::both(Some("u1"), Some("d1"), true)]
#[case::neither(None, None, false)]
#[case::both_empty(Some(""), Some(""), false)]
#[case::empty_user_id(Some(""), Some("d1"), true)]
fn requires_an_identifier(#[case] user_id: Option<&str>, #[case] device_id: Option<&str>, #[case] accepted: bool) {
    let mut builder = Identification::builder().language("en").city("Paris");
    if let Some(id) = user_id {
        builder = builder.user_id(id);
    }
    if let Some(id) = device_id {
        builder = builder.device_id(id);
    }

    match builder.build() {
        Ok(_) => assert!(accepted),
        Err(e) => {
            assert!(!accepted);
            assert_eq!(e, ValidationError::MissingIdentifier);
        },
    }
}

#[test]
fn sparse_records_never_carry_nulls() {
    let identification = Identification::builder()
        .device_id("d1")
        .device(DeviceInfo { os_name: Some("iOS".into()), ..Default::default() })
        .location(LocationInfo { region: Some("Bretagne".into()), ..Default::default() })
        .build()
        .unwrap();

    let payload = identification.payload();
    assert!(payload.values().all(|v| !v.is_null()));
    assert_json_eq!(payload_of(&identification), json!({"device_id": "d1", "os_name": "iOS", "region": "Bretagne"}));
}

#[test]
fn add_only_operation_set() {
    let identification = Identification::builder()
        .user_id("u1")
        .user_properties(UserProperties::new().with_add([("purchases", 3)]))
        .build()
        .unwrap();

    assert_json_eq!(
        payload_of(&identification)["user_properties"],
        json!({"$add": {"purchases": 3}})
    );
}

#[test]
fn no_user_properties_key_without_operations() {
    let without = Identification::builder().user_id("u1").build().unwrap();
    let empty = Identification::builder().user_id("u1").user_properties(UserProperties::new()).build().unwrap();

    assert_json_eq!(payload_of(&without), json!({"user_id": "u1"}));
    assert_json_eq!(payload_of(&empty), json!({"user_id": "u1"}));
}

#[test]
fn full_document_round_trip() {
    let document = indoc! {r#"
        {
            "user_id": "u-42",
            "device_id": "C8F9E604-F01A-4BD9-95C6-8E5357DF265D",
            "language": "fr",
            "paying": "true",
            "start_version": "5.12.0",
            "platform": "iOS",
            "os_name": "iOS",
            "os_version": "17.1",
            "device_brand": "Apple",
            "device_manufacturer": "Apple",
            "device_model": "iPhone15,2",
            "carrier": "Free",
            "country": "France",
            "region": "Ile-de-France",
            "city": "Issy-les-Moulineaux",
            "dma": null,
            "user_properties": {
                "$set": {"plan": "premium", "devices": 3},
                "$setOnce": {"first_device": "scale"},
                "$append": {"devices_owned": "watch"},
                "$unset": null
            }
        }
    "#};

    let identification: Identification = serde_json::from_str(document).unwrap();
    let mut expected: Value = serde_json::from_str(document).unwrap();
    let expected_map = expected.as_object_mut().unwrap();
    expected_map.remove("dma");
    expected_map["user_properties"].as_object_mut().unwrap().remove("$unset");

    assert_json_eq!(serde_json::to_value(&identification).unwrap(), expected);
    assert_eq!(identification.payload(), identification.payload());
}

#[test]
fn strict_explanations_list_everything() {
    let messages = explain_rejection(
        r#"{"device_id": 12, "user_properties": {"$insert": {}}, "ip": "10.0.0.1"}"#,
        &ParseOptions { deny_unknown_fields: true },
    );

    assert_eq!(messages, vec![
        "(1) device_id: expected a string, found a number".to_string(),
        "(2) user_properties.$insert: unknown field".to_string(),
        "(3) ip: unknown field".to_string(),
        "(4) must provide at least one of user_id and device_id".to_string(),
    ]);
}

#[test]
fn lenient_parsing_ignores_extra_keys() {
    let messages = explain_rejection(r#"{"user_id": "u1", "ip": "10.0.0.1"}"#, &ParseOptions::default());
    assert!(messages.is_empty());
}

#[test]
fn identifications_are_shareable_across_threads() {
    let identification = std::sync::Arc::new(Identification::builder().user_id("u1").build().unwrap());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let identification = identification.clone();
            std::thread::spawn(move || identification.payload())
        })
        .collect();

    for handle in handles {
        assert_json_eq!(Value::Object(handle.join().unwrap()), json!({"user_id": "u1"}));
    }
}
