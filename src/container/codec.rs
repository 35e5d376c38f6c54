use crate::container::chunk::{write_chunk, ChunkReader, RawChunk};
use crate::container::{CURRENT_KEYWORD, LEGACY_KEYWORD, METADATA_CHUNK_TYPE, PNG_SIGNATURE};
use crate::{ContainerError, ContainerResult};

/// Raw (still base64-encoded) card payloads found in a container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataPayloads {
    /// Text of the `chara` chunk
    pub legacy: Option<String>,

    /// Text of the `ccv3` chunk
    pub current: Option<String>,
}

impl MetadataPayloads {
    /// Returns the authoritative payload: current if present, else legacy
    pub fn preferred(&self) -> Option<&str> {
        self.current.as_deref().or(self.legacy.as_deref())
    }
}

/// Which card payload a metadata chunk holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardKeyword {
    Legacy,
    Current,
}

/// Identifies `chara`/`ccv3` metadata chunks
fn card_keyword(chunk: &RawChunk<'_>) -> Option<CardKeyword> {
    if chunk.chunk_type != METADATA_CHUNK_TYPE {
        return None;
    }

    match chunk.keyword_and_text()?.0 {
        k if k == LEGACY_KEYWORD.as_bytes() => Some(CardKeyword::Legacy),
        k if k == CURRENT_KEYWORD.as_bytes() => Some(CardKeyword::Current),
        _ => None,
    }
}

/// Decodes the card payloads embedded in a PNG container
///
/// Every chunk up to and including `IEND` is CRC-checked. Bytes after `IEND`
/// are ignored. When a keyword appears more than once, the last chunk wins.
///
/// # Arguments
///
/// * `bytes` - The complete PNG file
///
/// # Returns
///
/// * `Ok(MetadataPayloads)` - At least one of the two payloads was found
/// * `Err(ContainerError)` - Bad signature, truncated chunk, CRC mismatch, or
///   no card metadata at all
///
/// # Example
///
/// ```no_run
/// use card_localizer::container::decode;
///
/// let bytes = std::fs::read("card.png").unwrap();
/// let payloads = decode(&bytes).unwrap();
/// println!("has v3 payload: {}", payloads.current.is_some());
/// ```
pub fn decode(bytes: &[u8]) -> ContainerResult<MetadataPayloads> {
    let mut payloads = MetadataPayloads::default();

    for chunk in ChunkReader::new(bytes)? {
        let chunk = chunk?;

        let Some(keyword) = card_keyword(&chunk) else {
            continue;
        };
        let text = chunk
            .keyword_and_text()
            .map(|(_, text)| String::from_utf8_lossy(text).into_owned())
            .unwrap_or_default();

        match keyword {
            CardKeyword::Legacy => payloads.legacy = Some(text),
            CardKeyword::Current => payloads.current = Some(text),
        }
    }

    if payloads.legacy.is_none() && payloads.current.is_none() {
        return Err(ContainerError::MetadataNotFound);
    }

    Ok(payloads)
}

/// Re-encodes a PNG container with new card payloads
///
/// The signature and every chunk other than the old `chara`/`ccv3` chunks are
/// copied byte-for-byte in their original order. Fresh `chara` and `ccv3`
/// chunks are inserted immediately before the original `IEND` chunk, which is
/// written unmodified. Anything after `IEND` is dropped.
///
/// # Arguments
///
/// * `original` - The source PNG file
/// * `legacy` - Base64 text for the `chara` chunk
/// * `current` - Base64 text for the `ccv3` chunk
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - The new PNG file
/// * `Err(ContainerError)` - The source is malformed or has no `IEND` chunk
pub fn encode(original: &[u8], legacy: &str, current: &str) -> ContainerResult<Vec<u8>> {
    let legacy_data = metadata_data(LEGACY_KEYWORD, legacy)?;
    let current_data = metadata_data(CURRENT_KEYWORD, current)?;

    let mut out = Vec::with_capacity(original.len() + legacy_data.len() + current_data.len() + 24);
    out.extend_from_slice(&PNG_SIGNATURE);

    let mut reader = ChunkReader::new(original)?;
    for chunk in reader.by_ref() {
        let chunk = chunk?;

        if card_keyword(&chunk).is_some() {
            tracing::debug!(
                offset = chunk.offset,
                "Dropping stale card metadata chunk"
            );
            continue;
        }

        if chunk.is_terminal() {
            write_chunk(&mut out, &METADATA_CHUNK_TYPE, &legacy_data);
            write_chunk(&mut out, &METADATA_CHUNK_TYPE, &current_data);
        }

        out.extend_from_slice(chunk.raw);
    }

    if !reader.saw_terminal() {
        return Err(ContainerError::MissingTerminalChunk);
    }

    Ok(out)
}

/// Builds `keyword NUL text` chunk data
fn metadata_data(keyword: &str, text: &str) -> ContainerResult<Vec<u8>> {
    let mut data = Vec::with_capacity(keyword.len() + 1 + text.len());
    data.extend_from_slice(keyword.as_bytes());
    data.push(0);
    data.extend_from_slice(text.as_bytes());

    if u32::try_from(data.len()).is_err() {
        return Err(ContainerError::PayloadTooLarge { len: data.len() });
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_data(keyword: &str, text: &str) -> Vec<u8> {
        metadata_data(keyword, text).unwrap()
    }

    fn build_png(chunks: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        for (chunk_type, data) in chunks {
            write_chunk(&mut bytes, chunk_type, data);
        }
        bytes
    }

    fn sample_card() -> Vec<u8> {
        build_png(&[
            (b"IHDR", vec![0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0]),
            (b"tEXt", text_data("Comment", "made with love")),
            (b"tEXt", text_data(LEGACY_KEYWORD, "bGVnYWN5")),
            (b"IDAT", vec![1, 2, 3, 4, 5]),
            (b"tEXt", text_data(CURRENT_KEYWORD, "Y3VycmVudA==")),
            (b"IEND", vec![]),
        ])
    }

    fn non_metadata_chunks(bytes: &[u8]) -> Vec<Vec<u8>> {
        ChunkReader::new(bytes)
            .unwrap()
            .map(|c| c.unwrap())
            .filter(|c| card_keyword(c).is_none())
            .map(|c| c.raw.to_vec())
            .collect()
    }

    #[test]
    fn test_decode_both_payloads() {
        let payloads = decode(&sample_card()).unwrap();
        assert_eq!(payloads.legacy.as_deref(), Some("bGVnYWN5"));
        assert_eq!(payloads.current.as_deref(), Some("Y3VycmVudA=="));
        assert_eq!(payloads.preferred(), Some("Y3VycmVudA=="));
    }

    #[test]
    fn test_decode_legacy_only() {
        let bytes = build_png(&[
            (b"tEXt", text_data(LEGACY_KEYWORD, "abc")),
            (b"IEND", vec![]),
        ]);
        let payloads = decode(&bytes).unwrap();
        assert_eq!(payloads.current, None);
        assert_eq!(payloads.preferred(), Some("abc"));
    }

    #[test]
    fn test_decode_without_metadata() {
        let bytes = build_png(&[
            (b"tEXt", text_data("Comment", "nothing here")),
            (b"IEND", vec![]),
        ]);
        assert_eq!(decode(&bytes), Err(ContainerError::MetadataNotFound));
    }

    #[test]
    fn test_decode_ignores_chunks_after_iend() {
        let mut bytes = build_png(&[
            (b"tEXt", text_data(LEGACY_KEYWORD, "first")),
            (b"IEND", vec![]),
        ]);
        write_chunk(&mut bytes, b"tEXt", &text_data(CURRENT_KEYWORD, "late"));

        let payloads = decode(&bytes).unwrap();
        assert_eq!(payloads.current, None);
    }

    #[test]
    fn test_decode_rejects_corruption() {
        let mut bytes = sample_card();
        // Flip a payload byte of the IDAT chunk
        let idat = ChunkReader::new(&bytes)
            .unwrap()
            .map(|c| c.unwrap())
            .find(|c| &c.chunk_type == b"IDAT")
            .unwrap()
            .offset;
        bytes[idat + 8] ^= 0x01;

        assert!(matches!(
            decode(&bytes),
            Err(ContainerError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_bad_signature() {
        assert_eq!(decode(b"not a png"), Err(ContainerError::BadSignature));
    }

    #[test]
    fn test_round_trip() {
        let original = sample_card();
        let encoded = encode(&original, "TkVXLUxFR0FDWQ==", "TkVXLUNVUlJFTlQ=").unwrap();

        let payloads = decode(&encoded).unwrap();
        assert_eq!(payloads.legacy.as_deref(), Some("TkVXLUxFR0FDWQ=="));
        assert_eq!(payloads.current.as_deref(), Some("TkVXLUNVUlJFTlQ="));

        assert_eq!(non_metadata_chunks(&original), non_metadata_chunks(&encoded));
    }

    #[test]
    fn test_encode_places_metadata_before_iend() {
        let encoded = encode(&sample_card(), "L", "C").unwrap();
        let types: Vec<[u8; 4]> = ChunkReader::new(&encoded)
            .unwrap()
            .map(|c| c.unwrap().chunk_type)
            .collect();

        assert_eq!(
            types,
            vec![*b"IHDR", *b"tEXt", *b"IDAT", *b"tEXt", *b"tEXt", *b"IEND"]
        );

        let chunks: Vec<_> = ChunkReader::new(&encoded)
            .unwrap()
            .map(|c| c.unwrap())
            .collect();
        assert_eq!(card_keyword(&chunks[3]), Some(CardKeyword::Legacy));
        assert_eq!(card_keyword(&chunks[4]), Some(CardKeyword::Current));
    }

    #[test]
    fn test_encode_keeps_unrelated_text_chunks() {
        let encoded = encode(&sample_card(), "L", "C").unwrap();
        let comment = ChunkReader::new(&encoded)
            .unwrap()
            .map(|c| c.unwrap())
            .find(|c| c.keyword_and_text().map(|(k, _)| k) == Some(b"Comment".as_slice()));
        assert!(comment.is_some());
    }

    #[test]
    fn test_encode_card_without_metadata() {
        let original = build_png(&[(b"IHDR", vec![1]), (b"IEND", vec![])]);
        let encoded = encode(&original, "L", "C").unwrap();

        let payloads = decode(&encoded).unwrap();
        assert_eq!(payloads.legacy.as_deref(), Some("L"));
        assert_eq!(payloads.current.as_deref(), Some("C"));
    }

    #[test]
    fn test_encode_is_stable() {
        let once = encode(&sample_card(), "L", "C").unwrap();
        let twice = encode(&once, "L", "C").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_encode_missing_iend() {
        let original = build_png(&[(b"IHDR", vec![1]), (b"IDAT", vec![2])]);
        assert_eq!(
            encode(&original, "L", "C"),
            Err(ContainerError::MissingTerminalChunk)
        );
    }

    #[test]
    fn test_encode_rejects_bad_signature() {
        assert_eq!(
            encode(b"\x89PNX\r\n\x1a\n", "L", "C"),
            Err(ContainerError::BadSignature)
        );
    }
}
