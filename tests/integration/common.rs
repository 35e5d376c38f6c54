//! Helpers shared by the integration tests

use card_localizer::card::encode_card;
use card_localizer::container::{write_chunk, PNG_SIGNATURE};
use card_localizer::LocalizeOptions;
use serde_json::Value;
use std::path::Path;

/// A minimal PNG with header, data and terminal chunks but no card metadata
pub fn bare_png() -> Vec<u8> {
    let mut png = PNG_SIGNATURE.to_vec();
    write_chunk(
        &mut png,
        b"IHDR",
        &[0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0],
    );
    write_chunk(&mut png, b"IDAT", &[0x78, 0x9c, 0x63, 0x60, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01]);
    write_chunk(&mut png, b"IEND", &[]);
    png
}

/// A PNG card embedding `document`
pub fn build_card(document: &Value) -> Vec<u8> {
    encode_card(&bare_png(), document).unwrap()
}

/// Options writing resources under `dir`
pub fn test_options(dir: &Path) -> LocalizeOptions {
    let mut options = LocalizeOptions::new(dir);
    options.max_workers = 4;
    options
}
