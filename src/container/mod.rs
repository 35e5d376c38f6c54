//! PNG chunk container codec
//!
//! Character cards are ordinary PNG images carrying their document in
//! `tEXt` chunks:
//!
//! ```text
//! 89 50 4E 47 0D 0A 1A 0A            signature
//! [len:u32 BE][type:4][data][crc:u32 BE] ...   chunks, IEND last
//! ```
//!
//! A metadata chunk's data is `keyword NUL base64(json)`. Two keywords are
//! recognized: `chara` (the legacy card shape) and `ccv3` (the current shape).
//! Decoding collects both payloads; encoding replaces them while copying every
//! other chunk byte-for-byte.

mod chunk;
mod codec;

pub use chunk::{crc32, write_chunk, ChunkReader, RawChunk};
pub use codec::{decode, encode, MetadataPayloads};

/// The fixed 8-byte PNG signature
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Chunk type carrying keyword-tagged text
pub const METADATA_CHUNK_TYPE: [u8; 4] = *b"tEXt";

/// Chunk type terminating the stream
pub const TERMINAL_CHUNK_TYPE: [u8; 4] = *b"IEND";

/// Keyword of the legacy card payload
pub const LEGACY_KEYWORD: &str = "chara";

/// Keyword of the current card payload
pub const CURRENT_KEYWORD: &str = "ccv3";
