//! Character card payloads
//!
//! This module turns the base64 payloads found by the container codec into a
//! JSON document and back. Two card shapes are written on every save:
//! - legacy (`chara`): the document without `spec` / `spec_version`
//! - current (`ccv3`): the document tagged `chara_card_v3` / `3.0`

mod name;

pub use name::{character_name, sanitize_character_name};

use crate::container::{self, MetadataPayloads, CURRENT_KEYWORD, LEGACY_KEYWORD};
use crate::{CardError, LocalizerError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

/// `spec` value of current-shape cards
pub const CURRENT_SPEC: &str = "chara_card_v3";

/// `spec_version` value of current-shape cards
pub const CURRENT_SPEC_VERSION: &str = "3.0";

/// Base64 payloads ready to be written into a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardPayloads {
    pub legacy: String,
    pub current: String,
}

/// Parses one base64 payload into a JSON object
fn parse_payload(keyword: &'static str, text: &str) -> Result<Value, CardError> {
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|source| CardError::Base64 { keyword, source })?;
    let document: Value =
        serde_json::from_slice(&bytes).map_err(|source| CardError::Json { keyword, source })?;

    if !document.is_object() {
        return Err(CardError::NotAnObject { keyword });
    }

    Ok(document)
}

/// Reads the card document from decoded container payloads
///
/// The current payload is authoritative. If it is missing, or present but
/// undecodable while a legacy payload exists, the legacy payload is used.
///
/// # Returns
///
/// * `Ok(Value)` - The card document (always a JSON object)
/// * `Err(CardError)` - No usable payload
pub fn read_document(payloads: &MetadataPayloads) -> Result<Value, CardError> {
    match (&payloads.current, &payloads.legacy) {
        (Some(current), Some(legacy)) => match parse_payload(CURRENT_KEYWORD, current) {
            Ok(document) => Ok(document),
            Err(e) => {
                tracing::warn!("Ignoring unreadable current payload, using legacy: {}", e);
                parse_payload(LEGACY_KEYWORD, legacy)
            }
        },
        (Some(current), None) => parse_payload(CURRENT_KEYWORD, current),
        (None, Some(legacy)) => parse_payload(LEGACY_KEYWORD, legacy),
        (None, None) => Err(CardError::MissingPayload),
    }
}

/// Builds the legacy and current payloads for a document
///
/// Non-object documents are encoded unchanged in both shapes.
pub fn build_payloads(document: &Value) -> Result<CardPayloads, CardError> {
    let mut legacy = document.clone();
    let mut current = document.clone();

    if let Some(map) = legacy.as_object_mut() {
        map.remove("spec");
        map.remove("spec_version");
    }

    if let Some(map) = current.as_object_mut() {
        map.insert("spec".to_string(), Value::from(CURRENT_SPEC));
        map.insert("spec_version".to_string(), Value::from(CURRENT_SPEC_VERSION));
    }

    let legacy = serde_json::to_vec(&legacy).map_err(CardError::Serialize)?;
    let current = serde_json::to_vec(&current).map_err(CardError::Serialize)?;

    Ok(CardPayloads {
        legacy: STANDARD.encode(legacy),
        current: STANDARD.encode(current),
    })
}

/// Decodes the card document embedded in PNG bytes
pub fn decode_card(bytes: &[u8]) -> Result<Value, LocalizerError> {
    let payloads = container::decode(bytes)?;
    Ok(read_document(&payloads)?)
}

/// Writes a document into a copy of the original PNG bytes
pub fn encode_card(original: &[u8], document: &Value) -> Result<Vec<u8>, LocalizerError> {
    let payloads = build_payloads(document)?;
    Ok(container::encode(original, &payloads.legacy, &payloads.current)?)
}
