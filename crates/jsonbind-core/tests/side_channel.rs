//! Integration test: binary side-channel isolation across concurrent codec
//! calls, and tree round trips through the public API.

use std::sync::{Arc, Barrier};
use std::thread;

use jsonbind_core::{ByteStream, Codec, JsonError, NodeType, ParseError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Attachment {
    label: String,
    data: ByteStream,
}

#[test]
fn test_concurrent_calls_do_not_share_channels() {
    let codec = Arc::new(Codec::default());
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let codec = Arc::clone(&codec);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let payload = format!("payload-{i}").into_bytes();
                let attachment = Attachment {
                    label: format!("a{i}"),
                    data: ByteStream::from_bytes(payload.clone()),
                };
                barrier.wait();
                let encoded = codec.serialize(&attachment).unwrap();
                assert_eq!(encoded.streams.len(), 1);

                let decoded: Attachment = codec
                    .parse_with_streams(&encoded.json, encoded.streams)
                    .unwrap();
                assert!(decoded.data.ptr_eq(&attachment.data));
                assert_eq!(decoded.data.read_to_end().unwrap(), payload);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_tokens_from_one_call_unknown_to_another() {
    let codec = Codec::default();
    let first = codec
        .serialize(&Attachment {
            label: "first".to_string(),
            data: ByteStream::from_bytes(b"1".to_vec()),
        })
        .unwrap();

    let err = codec.parse::<Attachment>(&first.json).unwrap_err();
    assert!(matches!(err, JsonError::Parse(ParseError::Mapping(_))));
}

#[test]
fn test_stream_token_resolves_through_parsed_node() {
    let codec = Codec::default();
    let data = ByteStream::from_bytes(b"bytes".to_vec());
    let encoded = codec
        .serialize(&Attachment {
            label: "x".to_string(),
            data: data.clone(),
        })
        .unwrap();

    let node = codec
        .parse_node_with_streams(&encoded.json, encoded.streams)
        .unwrap();
    let field = node.get("data").unwrap();
    assert_eq!(field.node_type(), NodeType::String);
    let resolved = field.as_stream().unwrap().unwrap();
    assert!(resolved.ptr_eq(&data));

    let label = node.get("label").unwrap();
    assert!(label.as_stream().unwrap().is_none());
    assert!(node.as_stream().is_err());
}

#[test]
fn test_round_trip_of_sample_documents() {
    let codec = Codec::default();
    let samples = [
        r#"{"a": 1, "b": [true, false, null], "c": {"d": "e"}}"#,
        r#"{"a": null, "b": [{"c": null}]}"#,
        r#"[1, 2.5, "three", {"four": [4]}]"#,
        r#""just a string""#,
        "null",
        "",
    ];
    for sample in samples {
        let first = codec.parse_node(sample).unwrap();
        let text = codec.to_json(&first).unwrap();
        let second = codec.parse_node(&text).unwrap();
        assert_eq!(first, second, "sample {sample:?}");
    }
}
