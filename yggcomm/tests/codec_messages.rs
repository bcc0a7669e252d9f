//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Messages exchanged between independently configured codecs.

use serde_json::{json, Map};
use std::sync::Arc;
use std::thread;
use yggcomm::datatypes::{
    NdArray, ObjFaceVertex, ObjMesh, Ply, Scalar, TypeDefinition, TypeRegistry, Value, ValueMap, Vertex,
};
use yggcomm::serialization::{split_message, Codec, MESSAGE_SEPARATOR};

fn unbound() -> Codec {
    Codec::new(TypeRegistry::global())
}

fn triangle() -> Ply {
    let mut mesh = Ply::new();
    mesh.vertices.push(Vertex::new(0.0, 0.0, 0.0).with_color([255, 0, 0]));
    mesh.vertices.push(Vertex::new(1.0, 0.0, 0.0).with_color([0, 255, 0]));
    mesh.vertices.push(Vertex::new(0.0, 1.0, 0.5).with_color([0, 0, 255]));
    mesh.add_face([0, 1, 2]).unwrap();
    mesh
}

fn square() -> ObjMesh {
    let mut mesh = ObjMesh::new();
    mesh.vertices = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
    mesh.faces = vec![(0..4).map(ObjFaceVertex::new).collect()];
    mesh
}

fn samples() -> Vec<Value> {
    vec![
        Value::from(Scalar::int(-7, 16)),
        Value::from(Scalar::uint(200, 8)),
        Value::from(Scalar::float32(1.5).with_units("cm")),
        Value::from(Scalar::complex(1.0, -2.0, 128)),
        Value::from(Scalar::bytes(b"raw\x00bytes".to_vec())),
        Value::from("unicode \u{00e9}"),
        Value::from(NdArray::from_data(vec![0.25, 0.5, 0.75]).with_units("s")),
        Value::from(NdArray::from_data(vec![1i64, 2, 3, 4, 5, 6]).reshape(vec![2, 3]).unwrap()),
        Value::from(
            ValueMap::new()
                .with("count", 3i64)
                .with("inner", ValueMap::new().with("name", "sensor").with("depth", 12.5)),
        ),
        Value::Set(vec![Value::from(1i64), Value::from("two"), Value::Set(vec![Value::from(3.0)])]),
        Value::from(triangle()),
        Value::from(square()),
    ]
}

#[test]
fn test_every_builtin_kind_round_trips() {
    let codec = unbound();
    for value in samples() {
        let message = codec.serialize(&value).unwrap();
        let decoded = codec.decode_value(&message).unwrap();
        assert_eq!(decoded, value, "{} did not survive a round trip", value.kind());
    }
}

#[test]
fn test_header_is_json_before_separator() {
    let message = unbound().serialize(&Value::from(NdArray::from_data(vec![1i64, 2]))).unwrap();
    let (header, body) = split_message(&message).unwrap();
    assert_eq!(&message[header.len()..header.len() + MESSAGE_SEPARATOR.len()], MESSAGE_SEPARATOR);
    let header: serde_json::Value = serde_json::from_slice(header).unwrap();
    assert_eq!(header["typename"], "1darray");
    assert_eq!(header["length"], 2);
    assert_eq!(body.len(), 16);
}

#[test]
fn test_bound_consumer_converts_producer_units() {
    let producer = unbound();
    let consumer = Codec::bound(TypeRegistry::global(), TypeDefinition::new("float64").with("units", "m")).unwrap();

    let message = producer.serialize(&Value::from(Scalar::float32(250.0).with_units("cm"))).unwrap();
    let value = consumer.decode_value(&message).unwrap();
    let scalar = value.as_scalar().unwrap();
    assert_eq!(scalar.precision(), 64);
    assert_eq!(scalar.units(), "m");
    assert_eq!(scalar.value().as_f64(), Some(2.5));
}

#[test]
fn test_narrower_consumer_rejects_wider_producer() {
    let producer = unbound();
    let consumer = Codec::bound(TypeRegistry::global(), TypeDefinition::new("int16")).unwrap();
    let message = producer.serialize(&Value::from(Scalar::int(3, 64))).unwrap();
    assert!(consumer.deserialize(&message).unwrap_err().is_type_mismatch());
}

#[test]
fn test_caller_fields_travel_with_the_message() {
    let codec = unbound();
    let mut extra = Map::new();
    extra.insert("request_id".to_string(), json!("r-17"));
    extra.insert("zero_copy".to_string(), json!(false));

    let message = codec.serialize_with_header(&Value::from(1.0), &extra).unwrap();
    let (value, header) = codec.deserialize(&message).unwrap();
    assert_eq!(value, Value::from(1.0));
    assert_eq!(header.get_str("request_id"), Some("r-17"));
    assert_eq!(header.get("zero_copy"), Some(&json!(false)));

    extra.insert("typename".to_string(), json!("map"));
    assert!(codec.serialize_with_header(&Value::from(1.0), &extra).unwrap_err().is_malformed());
}

#[test]
fn test_empty_message_takes_bound_shape() {
    let codec = Codec::bound(TypeRegistry::global(), TypeDefinition::new("ply")).unwrap();
    assert_eq!(codec.decode_value(&codec.serialize_empty()).unwrap(), Value::from(Ply::new()));
    assert!(unbound().deserialize(b"").unwrap_err().is_malformed());
}

#[test]
fn test_body_may_contain_separator() {
    let codec = unbound();
    let value = Value::from(Scalar::bytes(b"before:YGG_TAG:after".to_vec()));
    let message = codec.serialize(&value).unwrap();
    assert_eq!(codec.decode_value(&message).unwrap(), value);
}

#[test]
fn test_codecs_share_the_global_registry_across_threads() {
    let registry = TypeRegistry::global();
    let handles: Vec<_> = (0..4i64)
        .map(|worker| {
            let codec = Codec::new(Arc::clone(&registry));
            thread::spawn(move || {
                (0..50i64)
                    .map(|step| {
                        let value = Value::from(ValueMap::new().with("worker", worker).with("step", step));
                        codec.decode_value(&codec.serialize(&value).unwrap()).unwrap() == value
                    })
                    .all(|same| same)
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
