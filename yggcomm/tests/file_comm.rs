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

//! File channels driven end to end through real files.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;
use tracing_subscriber::EnvFilter;
use yggcomm::datatypes::{NdArray, Ply, Scalar, Value, ValueMap, Vertex};
use yggcomm::serialization::{FormatSerializer, PandasSerializer, PlySerializer};
use yggcomm::{Direction, FileComm, FileCommConfig, FileFormat, EOF_SENTINEL};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn address(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn opened(name: &str, address: &str, direction: Direction, config: FileCommConfig) -> FileComm {
    let mut comm = FileComm::new(name, address, direction, config).unwrap();
    assert!(comm.open(), "{} failed to open", name);
    comm
}

fn triangle(offset: f64, color: [u8; 3]) -> Ply {
    let mut mesh = Ply::new();
    mesh.vertices.push(Vertex::new(offset, 0.0, 0.0).with_color(color));
    mesh.vertices.push(Vertex::new(offset + 1.0, 0.0, 0.0).with_color(color));
    mesh.vertices.push(Vertex::new(offset, 1.0, 0.5).with_color(color));
    mesh.add_face([0, 1, 2]).unwrap();
    mesh
}

#[test]
fn test_ply_append_merges_into_one_document() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = dir.path().join("mesh.ply");
    let first = Value::from(triangle(0.0, [255, 0, 0]));
    let second = Value::from(triangle(2.0, [0, 0, 255]));

    let mut sender = opened(
        "mesh_out",
        address(&path),
        Direction::Send,
        FileCommConfig::new(FileFormat::Ply).with_append(true),
    );
    assert!(sender.send_value(&first).unwrap());
    assert!(sender.send_value(&second).unwrap());
    assert_eq!(sender.metrics().merges(), 1);
    assert_eq!(sender.metrics().messages_sent(), 2);
    sender.close();

    let mut serializer = PlySerializer;
    let merged = serializer.merge(&[first, second]).unwrap();
    assert_eq!(fs::read(&path).unwrap(), serializer.serialize(&merged).unwrap());

    let mut receiver = opened("mesh_in", address(&path), Direction::Recv, FileCommConfig::new(FileFormat::Ply));
    let received = receiver.recv_value().unwrap().unwrap();
    assert_eq!(received, merged);
    assert_eq!(received.as_ply().unwrap().faces[1].vertex_index, vec![3, 4, 5]);
    assert_eq!(receiver.recv().unwrap(), (false, EOF_SENTINEL.to_vec()));
}

#[test]
fn test_whole_file_is_delivered_once_even_after_a_merge() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = dir.path().join("mesh.ply");
    let first = Value::from(triangle(0.0, [255, 0, 0]));

    let config = FileCommConfig::new(FileFormat::Ply).with_append(true);
    let mut sender = opened("mesh_out", address(&path), Direction::Send, config);
    assert!(sender.send_value(&first).unwrap());

    let mut receiver = opened("mesh_in", address(&path), Direction::Recv, FileCommConfig::new(FileFormat::Ply));
    assert_eq!(receiver.recv_value().unwrap(), Some(first));

    assert!(sender.send_value(&Value::from(triangle(2.0, [0, 0, 255]))).unwrap());
    assert_eq!(sender.metrics().merges(), 1);
    assert_eq!(receiver.recv().unwrap(), (false, EOF_SENTINEL.to_vec()));
    assert_eq!(receiver.recv_value().unwrap(), None);
    assert_eq!(receiver.metrics().messages_received(), 1);
}

#[test]
fn test_reopening_without_append_starts_over() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = dir.path().join("mesh.ply");
    let config = FileCommConfig::new(FileFormat::Ply);

    for offset in [0.0, 5.0] {
        let mut sender = opened("mesh_out", address(&path), Direction::Send, config.clone());
        assert!(sender.send_value(&Value::from(triangle(offset, [1, 2, 3]))).unwrap());
    }

    let mut receiver = opened("mesh_in", address(&path), Direction::Recv, config);
    let mesh = receiver.recv_value().unwrap().unwrap();
    assert_eq!(mesh.as_ply().unwrap().vertices.len(), 3);
    assert_eq!(mesh.as_ply().unwrap().vertices[0].x, 5.0);
}

#[test]
fn test_series_reads_members_in_order_then_stops() {
    init_tracing();
    let dir = tempdir().unwrap();
    for (index, text) in ["zero", "one", "two"].iter().enumerate() {
        fs::write(dir.path().join(format!("file{}.txt", index)), text).unwrap();
    }
    let template = dir.path().join("file%d.txt");
    let config = FileCommConfig::new(FileFormat::Direct).with_series(0, Some(1));

    let mut receiver = opened("series_in", address(&template), Direction::Recv, config);
    assert_eq!(receiver.recv().unwrap(), (true, b"zero".to_vec()));
    assert_eq!(receiver.recv().unwrap(), (true, b"one".to_vec()));
    assert_eq!(receiver.recv().unwrap(), (false, EOF_SENTINEL.to_vec()));
    assert!(receiver.is_exhausted());
    assert_eq!(receiver.remaining_bytes(), 0);
    assert_eq!(receiver.metrics().series_advances(), 2);
}

#[test]
fn test_series_without_end_stops_at_missing_member() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("part_%03d.dat");
    let config = FileCommConfig::new(FileFormat::Direct).with_series(1, None);

    let mut sender = opened("parts_out", address(&template), Direction::Send, config.clone());
    assert!(sender.send(b"first"));
    assert!(sender.advance_in_series().unwrap());
    assert!(sender.send(b"second"));
    sender.close();
    assert_eq!(fs::read(dir.path().join("part_001.dat")).unwrap(), b"first");
    assert_eq!(fs::read(dir.path().join("part_002.dat")).unwrap(), b"second");

    let mut receiver = opened("parts_in", address(&template), Direction::Recv, config);
    assert_eq!(receiver.recv_value().unwrap(), Some(Value::from(Scalar::bytes(b"first".to_vec()))));
    assert_eq!(receiver.recv_value().unwrap(), Some(Value::from(Scalar::bytes(b"second".to_vec()))));
    assert_eq!(receiver.recv_value().unwrap(), None);
    assert_eq!(receiver.series_index(), 3);
}

#[test]
fn test_table_rows_written_and_discovered() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = dir.path().join("table.txt");
    let row = |name: &str, count: i64, size: f64| {
        Value::Set(vec![
            Value::from(Scalar::bytes(name)),
            Value::from(Scalar::int(count, 64)),
            Value::from(size),
        ])
    };

    let mut sender = opened(
        "table_out",
        address(&path),
        Direction::Send,
        FileCommConfig::new(FileFormat::Table)
            .with_format_str("%5s\t%ld\t%f\n")
            .with_column_names(["name", "count", "size"]),
    );
    assert!(sender.send_value(&row("one", 1, 1.5)).unwrap());
    assert!(sender.send_value(&row("three", 3, 3.0)).unwrap());
    sender.close();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("# name\tcount\tsize\n"));
    assert!(text.ends_with("  one\t1\t1.500000\nthree\t3\t3.000000\n"));

    let mut receiver = opened("table_in", address(&path), Direction::Recv, FileCommConfig::new(FileFormat::Table));
    assert_eq!(receiver.recv_value().unwrap(), Some(Value::Set(vec![row("one", 1, 1.5)])));
    assert_eq!(receiver.recv_value().unwrap(), Some(Value::Set(vec![row("three", 3, 3.0)])));
    assert_eq!(receiver.recv_value().unwrap(), None);
}

#[test]
fn test_pandas_append_keeps_one_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("frame.tsv");
    let frame = |x: Vec<i64>, name: Vec<&str>| {
        Value::Map(
            ValueMap::new()
                .with("x", NdArray::from_data(x))
                .with("name", NdArray::from_data(name.into_iter().map(str::to_string).collect::<Vec<_>>())),
        )
    };

    let config = FileCommConfig::new(FileFormat::Pandas).with_append(true);
    let mut sender = opened("frame_out", address(&path), Direction::Send, config.clone());
    assert!(sender.send_value(&frame(vec![1, 2], vec!["ab", "c"])).unwrap());
    assert!(sender.send_value(&frame(vec![3], vec!["d"])).unwrap());
    sender.close();
    assert_eq!(fs::read(&path).unwrap(), b"x\tname\n1\tab\n2\tc\n3\td\n");

    let expected = PandasSerializer::default()
        .merge(&[frame(vec![1, 2], vec!["ab", "c"]), frame(vec![3], vec!["d"])])
        .unwrap();
    let mut receiver = opened("frame_in", address(&path), Direction::Recv, config);
    assert_eq!(receiver.recv_value().unwrap(), Some(expected));
}

#[test]
fn test_pickle_records_read_one_at_a_time() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records.pkl");
    let values = vec![
        Value::from(1i64),
        Value::from("two"),
        Value::from(ValueMap::new().with("three", 3.0)),
    ];

    let mut sender = opened("records_out", address(&path), Direction::Send, FileCommConfig::new(FileFormat::Pickle));
    for value in &values {
        assert!(sender.send_value(value).unwrap());
    }
    sender.close();

    let mut receiver = opened("records_in", address(&path), Direction::Recv, FileCommConfig::new(FileFormat::Pickle));
    let total = receiver.remaining_bytes();
    assert_eq!(total, fs::metadata(&path).unwrap().len());
    for value in &values {
        assert_eq!(receiver.recv_value().unwrap().as_ref(), Some(value));
        assert!(receiver.remaining_bytes() < total);
    }
    assert_eq!(receiver.remaining_bytes(), 0);
    assert_eq!(receiver.recv_value().unwrap(), None);
    assert_eq!(receiver.metrics().messages_received(), 3);
}

#[test]
fn test_recv_timeout_waits_for_a_writer() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = dir.path().join("late.txt");
    fs::write(&path, b"").unwrap();

    let mut receiver = opened("late_in", address(&path), Direction::Recv, FileCommConfig::new(FileFormat::Direct));
    assert_eq!(
        receiver.recv_timeout(Duration::from_millis(30)).unwrap(),
        (false, EOF_SENTINEL.to_vec())
    );

    let writer_path = path.clone();
    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        fs::write(writer_path, b"arrived").unwrap();
    });
    assert_eq!(
        receiver.recv_timeout(Duration::from_secs(5)).unwrap(),
        (true, b"arrived".to_vec())
    );
    writer.join().unwrap();
}

#[test]
fn test_misuse_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.txt");
    let mut comm = FileComm::new("out", address(&path), Direction::Send, FileCommConfig::new(FileFormat::Direct)).unwrap();
    assert!(!comm.send(b"early"));
    assert_eq!(comm.metrics().send_failures(), 1);
    assert_eq!(comm.error_metrics().comm_errors(), 1);

    assert!(comm.open());
    let error = comm.recv().unwrap_err();
    assert_eq!(error.to_string(), "comm out cannot receive: it was opened for send");

    let missing = dir.path().join("missing.txt");
    let mut receiver =
        FileComm::new("missing", address(&missing), Direction::Recv, FileCommConfig::new(FileFormat::Direct)).unwrap();
    assert!(!receiver.open());
    assert!(receiver.try_open().unwrap_err().is_recoverable());
    assert_eq!(receiver.error_metrics().comm_errors(), 1);
    assert_eq!(receiver.error_metrics().recoverable_errors(), 1);
    assert_eq!(receiver.error_metrics().total_errors(), 1);
}
