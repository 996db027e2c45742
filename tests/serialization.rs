use std::collections::BTreeMap;

use rest_forwarder::{FieldNaming, SerializationOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Property {
    id_short: String,
    value_type: Option<String>,
    value: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Submodel {
    id: String,
    id_short: String,
    description: Option<String>,
    submodel_elements: Vec<Property>,
}

fn nameplate() -> Submodel {
    Submodel {
        id: "urn:example:sm:nameplate".to_string(),
        id_short: "Nameplate".to_string(),
        description: None,
        submodel_elements: vec![Property {
            id_short: "ManufacturerName".to_string(),
            value_type: Some("xs:string".to_string()),
            value: None,
        }],
    }
}

#[test]
fn build_defaults_to_indented_and_omits_nulls() {
    let options = SerializationOptions::default();
    assert!(options.indented());
    assert!(options.omit_null_on_write());
    assert_eq!(options.field_naming(), FieldNaming::Preserve);
    assert_eq!(options, SerializationOptions::build(true));
}

#[test]
fn indented_and_compact_differ_only_in_pretty_print() {
    let indented = SerializationOptions::build(true);
    let compact = SerializationOptions::build(false);

    assert!(indented.indented());
    assert!(!compact.indented());
    assert_eq!(indented.omit_null_on_write(), compact.omit_null_on_write());
    assert!(compact.omit_null_on_write());
    assert_eq!(indented.field_naming(), compact.field_naming());
    assert_eq!(compact.field_naming(), FieldNaming::Preserve);
    assert_eq!(indented.with_indented(false), compact);
}

#[test]
fn successive_builds_are_independent_values() {
    let first = SerializationOptions::build(true);
    let second = SerializationOptions::build(true);
    assert!(!std::ptr::eq(&first, &second));

    let changed = first.with_field_naming(FieldNaming::CamelCase).with_indented(false);
    assert_eq!(changed.field_naming(), FieldNaming::CamelCase);
    assert_eq!(second.field_naming(), FieldNaming::Preserve);
    assert!(second.indented());
    assert_eq!(first, second);
}

#[test]
fn compact_output_drops_null_members_and_keeps_names() {
    let json = SerializationOptions::build(false)
        .to_string(&nameplate())
        .expect("submodel should encode");

    assert_eq!(
        json,
        r#"{"id":"urn:example:sm:nameplate","id_short":"Nameplate","submodel_elements":[{"id_short":"ManufacturerName","value_type":"xs:string"}]}"#
    );
}

#[test]
fn indented_output_uses_two_space_pretty_print() {
    let json = SerializationOptions::build(true)
        .to_string(&Property {
            id_short: "SerialNumber".to_string(),
            value_type: None,
            value: Some("1234".to_string()),
        })
        .expect("property should encode");

    assert_eq!(json, "{\n  \"id_short\": \"SerialNumber\",\n  \"value\": \"1234\"\n}");
}

#[test]
fn nulls_inside_arrays_are_kept() {
    let json = SerializationOptions::build(false)
        .to_string(&vec![Some(1), None, Some(3)])
        .expect("array should encode");
    assert_eq!(json, "[1,null,3]");
}

#[test]
fn to_vec_matches_to_string() {
    let options = SerializationOptions::build(true);
    let bytes = options.to_vec(&nameplate()).expect("submodel should encode");
    let text = options.to_string(&nameplate()).expect("submodel should encode");
    assert_eq!(bytes, text.into_bytes());
}

#[test]
fn decoding_restores_omitted_options_as_none() {
    let options = SerializationOptions::build(true);
    let encoded = options.to_vec(&nameplate()).expect("submodel should encode");
    let decoded: Submodel = options.from_slice(&encoded).expect("submodel should decode");
    assert_eq!(decoded, nameplate());
}

#[test]
fn camel_case_naming_renames_on_write_and_read() {
    let options = SerializationOptions::build(false).with_field_naming(FieldNaming::CamelCase);
    let json = options.to_string(&nameplate()).expect("submodel should encode");
    assert_eq!(
        json,
        r#"{"id":"urn:example:sm:nameplate","idShort":"Nameplate","submodelElements":[{"idShort":"ManufacturerName","valueType":"xs:string"}]}"#
    );

    let decoded: Submodel = options
        .from_slice(json.as_bytes())
        .expect("camel-case payload should decode");
    assert_eq!(decoded, nameplate());
}

#[allow(non_snake_case)]
#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Slot {
    item_1: u32,
    a__b: bool,
    trailing_: String,
    #[serde(rename = "modelType")]
    model_type: String,
}

#[test]
fn camel_case_round_trips_unusual_field_names() {
    let options = SerializationOptions::build(false).with_field_naming(FieldNaming::CamelCase);
    let slot = Slot {
        item_1: 7,
        a__b: true,
        trailing_: "x".to_string(),
        model_type: "Property".to_string(),
    };

    let json = options.to_string(&slot).expect("slot should encode");
    assert_eq!(json, r#"{"item1":7,"aB":true,"trailing":"x","modelType":"Property"}"#);

    let decoded: Slot = options.from_slice(json.as_bytes()).expect("slot should decode");
    assert_eq!(decoded, slot);
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Labelled {
    id_short: String,
    display_names: BTreeMap<String, String>,
}

#[test]
fn camel_case_leaves_map_keys_alone() {
    let options = SerializationOptions::build(false).with_field_naming(FieldNaming::CamelCase);
    let labelled = Labelled {
        id_short: "Nameplate".to_string(),
        display_names: BTreeMap::from([
            ("ManufacturerName".to_string(), "ACME".to_string()),
            ("my_label".to_string(), "plate".to_string()),
        ]),
    };

    let json = options.to_string(&labelled).expect("labelled should encode");
    assert_eq!(
        json,
        r#"{"idShort":"Nameplate","displayNames":{"ManufacturerName":"ACME","my_label":"plate"}}"#
    );

    let decoded: Labelled = options.from_slice(json.as_bytes()).expect("labelled should decode");
    assert_eq!(decoded, labelled);
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Readings {
    unit: Option<String>,
    samples: BTreeMap<String, Option<i32>>,
}

#[test]
fn null_map_entries_are_kept_while_null_fields_are_dropped() {
    let readings = Readings {
        unit: None,
        samples: BTreeMap::from([
            ("explicit_null".to_string(), None),
            ("present".to_string(), Some(1)),
        ]),
    };

    let json = SerializationOptions::build(false)
        .to_string(&readings)
        .expect("readings should encode");
    assert_eq!(json, r#"{"samples":{"explicit_null":null,"present":1}}"#);

    let decoded: Readings = SerializationOptions::build(false)
        .from_slice(json.as_bytes())
        .expect("readings should decode");
    assert_eq!(decoded, readings);
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
enum Element {
    Range { min_value: i32, max_value: Option<i32> },
    Blob(String),
    Empty,
}

#[test]
fn camel_case_renames_struct_variant_fields() {
    let options = SerializationOptions::build(false).with_field_naming(FieldNaming::CamelCase);
    let elements = vec![
        Element::Range {
            min_value: 1,
            max_value: None,
        },
        Element::Blob("AAEC".to_string()),
        Element::Empty,
    ];

    let json = options.to_string(&elements).expect("elements should encode");
    assert_eq!(json, r#"[{"Range":{"minValue":1}},{"Blob":"AAEC"},"Empty"]"#);

    let decoded: Vec<Element> = options.from_slice(json.as_bytes()).expect("elements should decode");
    assert_eq!(decoded, elements);
}

#[test]
fn malformed_input_is_a_decode_error() {
    let err = SerializationOptions::default()
        .from_slice::<Submodel>(b"{not json")
        .expect_err("garbage should not decode");
    assert!(err.to_string().starts_with("failed to decode value"));
}
