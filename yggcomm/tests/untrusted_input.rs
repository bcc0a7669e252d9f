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

//! Headers and files from an untrusted peer must fail with errors, never
//! panic or allocate what the input cannot back.

use std::fs;
use tempfile::tempdir;
use yggcomm::datatypes::{TypeDefinition, TypeRegistry};
use yggcomm::serialization::Codec;
use yggcomm::{Direction, FileComm, FileCommConfig, FileFormat};

fn unbound() -> Codec {
    Codec::new(TypeRegistry::global())
}

#[test]
fn test_ndarray_shape_overflow() {
    let message = br#"{"typename":"ndarray","subtype":"int","precision":32,"units":"","shape":[4294967296,4294967296,16]}:YGG_TAG:"#;
    let error = unbound().deserialize(message).unwrap_err();
    assert!(error.is_corrupt());
}

#[test]
fn test_array_length_beyond_payload() {
    let message = br#"{"typename":"1darray","subtype":"float","precision":64,"units":"","length":18446744073709551615}:YGG_TAG:abcdefgh"#;
    let error = unbound().deserialize(message).unwrap_err();
    assert!(error.is_corrupt());
}

#[test]
fn test_unit_exponent_overflow() {
    let codec = Codec::bound(TypeRegistry::global(), TypeDefinition::new("float64").with("units", "m")).unwrap();
    for units in ["m**2147483647*m", "m**99999999999", "(m**40)**40"] {
        let header = format!(
            r#"{{"typename":"scalar","subtype":"float","precision":64,"units":"{}"}}"#,
            units
        );
        let mut message = header.into_bytes();
        message.extend_from_slice(b":YGG_TAG:");
        message.extend_from_slice(&1.0f64.to_le_bytes());
        assert!(codec.deserialize(&message).is_err(), "units {} were accepted", units);
    }
}

#[test]
fn test_ply_element_count_beyond_body() {
    let body = "ply\nformat ascii 1.0\nelement vertex 18446744073709551615\nproperty float x\nproperty float y\nproperty float z\nend_header\n0 0 0\n";
    let mut message = br#"{"typename":"ply"}:YGG_TAG:"#.to_vec();
    message.extend_from_slice(body.as_bytes());
    let error = unbound().deserialize(&message).unwrap_err();
    assert!(error.is_corrupt());
}

#[test]
fn test_netpbm_dimensions_on_disk() {
    let dir = tempdir().unwrap();
    for (name, contents) in [
        ("overflow.pgm", b"P5 4294967296 4294967296 255\n".to_vec()),
        ("huge_plain.pgm", b"P2 3000000 3000000 255\n1 2 3\n".to_vec()),
        ("huge_raw.ppm", b"P6 3000000 3000000 255\n\x01\x02\x03".to_vec()),
    ] {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        let mut comm = FileComm::new(
            "image_in",
            path.to_str().unwrap(),
            Direction::Recv,
            FileCommConfig::new(FileFormat::Netpbm),
        )
        .unwrap();
        let opened = comm.try_open();
        let error = match opened {
            Err(error) => error,
            Ok(()) => comm.recv_value().unwrap_err(),
        };
        assert!(error.is_corrupt(), "{} gave {}", name, error);
    }
}
