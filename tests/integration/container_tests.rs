//! Container and card payload tests on complete PNG files

use crate::common::{bare_png, build_card};
use card_localizer::card::{decode_card, encode_card};
use card_localizer::container::{
    decode, encode, write_chunk, ChunkReader, CURRENT_KEYWORD, LEGACY_KEYWORD, PNG_SIGNATURE,
};
use card_localizer::ContainerError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;

/// Collects (type, raw bytes) of every chunk
fn chunks(png: &[u8]) -> Vec<(String, Vec<u8>)> {
    ChunkReader::new(png)
        .unwrap()
        .map(|chunk| {
            let chunk = chunk.unwrap();
            (chunk.type_name(), chunk.raw.to_vec())
        })
        .collect()
}

#[test]
fn test_round_trip_payloads() {
    let encoded = encode(&bare_png(), "TEVHQUNZ", "Q1VSUkVOVA==").unwrap();
    let payloads = decode(&encoded).unwrap();

    assert_eq!(payloads.legacy.as_deref(), Some("TEVHQUNZ"));
    assert_eq!(payloads.current.as_deref(), Some("Q1VSUkVOVA=="));
}

#[test]
fn test_non_metadata_chunks_preserved_in_order() {
    let original = bare_png();
    let encoded = encode(&original, "a", "b").unwrap();

    let before = chunks(&original);
    let after: Vec<_> = chunks(&encoded)
        .into_iter()
        .filter(|(kind, _)| kind != "tEXt")
        .collect();

    assert_eq!(before, after);
    assert_eq!(&encoded[..8], &PNG_SIGNATURE);
}

#[test]
fn test_metadata_inserted_before_terminal_chunk() {
    let encoded = encode(&bare_png(), "a", "b").unwrap();
    let kinds: Vec<String> = chunks(&encoded).into_iter().map(|(kind, _)| kind).collect();

    assert_eq!(kinds, vec!["IHDR", "IDAT", "tEXt", "tEXt", "IEND"]);
}

#[test]
fn test_reencoding_replaces_old_metadata() {
    let first = build_card(&json!({"name": "Ann", "v": 1}));
    let second = encode_card(&first, &json!({"name": "Ann", "v": 2})).unwrap();

    let text_chunks = chunks(&second)
        .into_iter()
        .filter(|(kind, _)| kind == "tEXt")
        .count();
    assert_eq!(text_chunks, 2);
    assert_eq!(decode_card(&second).unwrap()["v"], 2);
}

#[test]
fn test_unrelated_text_chunks_survive() {
    let mut png = PNG_SIGNATURE.to_vec();
    write_chunk(&mut png, b"IHDR", &[0; 13]);
    write_chunk(&mut png, b"tEXt", b"Comment\0made by hand");
    write_chunk(&mut png, b"IEND", &[]);

    let encoded = encode_card(&png, &json!({"name": "Ann"})).unwrap();
    let comments = chunks(&encoded)
        .into_iter()
        .filter(|(_, raw)| raw.windows(7).any(|w| w == b"Comment"))
        .count();
    assert_eq!(comments, 1);
}

#[test]
fn test_payload_shapes() {
    let card = build_card(&json!({"name": "Ann", "spec": "chara_card_v2", "spec_version": "2.0"}));
    let payloads = decode(&card).unwrap();

    let legacy: serde_json::Value =
        serde_json::from_slice(&STANDARD.decode(payloads.legacy.unwrap()).unwrap()).unwrap();
    let current: serde_json::Value =
        serde_json::from_slice(&STANDARD.decode(payloads.current.unwrap()).unwrap()).unwrap();

    assert!(legacy.get("spec").is_none());
    assert!(legacy.get("spec_version").is_none());
    assert_eq!(current["spec"], "chara_card_v3");
    assert_eq!(current["spec_version"], "3.0");
    assert_eq!(current["name"], "Ann");
}

#[test]
fn test_current_payload_is_authoritative() {
    let legacy = STANDARD.encode(br#"{"name":"Old"}"#);
    let current = STANDARD.encode(br#"{"name":"New"}"#);

    let mut png = PNG_SIGNATURE.to_vec();
    write_chunk(&mut png, b"IHDR", &[0; 13]);
    write_chunk(&mut png, b"tEXt", format!("{}\0{}", LEGACY_KEYWORD, legacy).as_bytes());
    write_chunk(&mut png, b"tEXt", format!("{}\0{}", CURRENT_KEYWORD, current).as_bytes());
    write_chunk(&mut png, b"IEND", &[]);

    assert_eq!(decode_card(&png).unwrap()["name"], "New");
}

#[test]
fn test_legacy_only_card() {
    let legacy = STANDARD.encode(br#"{"name":"Old"}"#);

    let mut png = PNG_SIGNATURE.to_vec();
    write_chunk(&mut png, b"tEXt", format!("{}\0{}", LEGACY_KEYWORD, legacy).as_bytes());
    write_chunk(&mut png, b"IEND", &[]);

    assert_eq!(decode_card(&png).unwrap()["name"], "Old");
}

#[test]
fn test_corrupted_chunk_detected() {
    let mut card = build_card(&json!({"name": "Ann"}));
    // Flip one byte inside the IHDR payload
    card[8 + 8] ^= 0xff;

    assert!(matches!(
        decode(&card),
        Err(ContainerError::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_missing_metadata() {
    assert_eq!(decode(&bare_png()), Err(ContainerError::MetadataNotFound));
}

#[test]
fn test_encode_requires_terminal_chunk() {
    let mut png = PNG_SIGNATURE.to_vec();
    write_chunk(&mut png, b"IHDR", &[0; 13]);

    assert_eq!(
        encode(&png, "a", "b"),
        Err(ContainerError::MissingTerminalChunk)
    );
}
