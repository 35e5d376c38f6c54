use crate::container::{PNG_SIGNATURE, TERMINAL_CHUNK_TYPE};
use crate::{ContainerError, ContainerResult};
use crc32fast::Hasher as Crc32;

/// Bytes taken by the length, type and CRC fields of a chunk
const CHUNK_OVERHEAD: usize = 12;

/// A chunk borrowed from the original container bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'a> {
    /// Four-byte chunk type tag
    pub chunk_type: [u8; 4],

    /// Chunk payload
    pub data: &'a [u8],

    /// The complete encoded chunk (length, type, data, CRC)
    pub raw: &'a [u8],

    /// Byte offset of the chunk in the container
    pub offset: usize,
}

impl<'a> RawChunk<'a> {
    /// Returns the chunk type as text, for diagnostics
    pub fn type_name(&self) -> String {
        String::from_utf8_lossy(&self.chunk_type).into_owned()
    }

    /// Returns true if this is the terminal `IEND` chunk
    pub fn is_terminal(&self) -> bool {
        self.chunk_type == TERMINAL_CHUNK_TYPE
    }

    /// Splits a text chunk payload into its keyword and text
    ///
    /// Returns None when the payload has no NUL separator.
    pub fn keyword_and_text(&self) -> Option<(&'a [u8], &'a [u8])> {
        let nul = self.data.iter().position(|b| *b == 0)?;
        Some((&self.data[..nul], &self.data[nul + 1..]))
    }
}

/// Iterates over the chunks of a PNG container, verifying each CRC
///
/// Iteration ends after the terminal chunk has been yielded, or cleanly when
/// the input ends on a chunk boundary. Any error ends iteration.
#[derive(Debug)]
pub struct ChunkReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    saw_terminal: bool,
    failed: bool,
}

impl<'a> ChunkReader<'a> {
    /// Creates a reader after checking the PNG signature
    ///
    /// # Returns
    ///
    /// * `Ok(ChunkReader)` - Signature verified, positioned at the first chunk
    /// * `Err(ContainerError::BadSignature)` - Input is not a PNG
    pub fn new(bytes: &'a [u8]) -> ContainerResult<Self> {
        if bytes.len() < PNG_SIGNATURE.len() || bytes[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
            return Err(ContainerError::BadSignature);
        }

        Ok(Self {
            bytes,
            pos: PNG_SIGNATURE.len(),
            saw_terminal: false,
            failed: false,
        })
    }

    /// Returns true once the terminal chunk has been read
    pub fn saw_terminal(&self) -> bool {
        self.saw_terminal
    }

    fn read_chunk(&mut self) -> ContainerResult<RawChunk<'a>> {
        let offset = self.pos;
        let remaining = &self.bytes[offset..];

        if remaining.len() < CHUNK_OVERHEAD {
            return Err(ContainerError::TruncatedChunk { offset });
        }

        let length = u32::from_be_bytes([remaining[0], remaining[1], remaining[2], remaining[3]]);
        let total = usize::try_from(length)
            .ok()
            .and_then(|len| len.checked_add(CHUNK_OVERHEAD))
            .ok_or(ContainerError::TruncatedChunk { offset })?;

        if remaining.len() < total {
            return Err(ContainerError::TruncatedChunk { offset });
        }

        let raw = &remaining[..total];
        let chunk_type = [raw[4], raw[5], raw[6], raw[7]];
        let data = &raw[8..total - 4];
        let stored = u32::from_be_bytes([
            raw[total - 4],
            raw[total - 3],
            raw[total - 2],
            raw[total - 1],
        ]);

        let computed = crc32(&chunk_type, data);
        if stored != computed {
            return Err(ContainerError::ChecksumMismatch {
                chunk_type: String::from_utf8_lossy(&chunk_type).into_owned(),
                stored,
                computed,
            });
        }

        self.pos += total;

        Ok(RawChunk {
            chunk_type,
            data,
            raw,
            offset,
        })
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = ContainerResult<RawChunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.saw_terminal || self.failed || self.pos >= self.bytes.len() {
            return None;
        }

        match self.read_chunk() {
            Ok(chunk) => {
                self.saw_terminal = chunk.is_terminal();
                Some(Ok(chunk))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Computes the CRC-32/IEEE of a chunk's type and data
pub fn crc32(chunk_type: &[u8; 4], data: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(chunk_type);
    hasher.update(data);
    hasher.finalize()
}

/// Appends a freshly encoded chunk to `out`
///
/// The length field and CRC are computed from `data`. Callers keep `data`
/// below `u32::MAX` bytes; `encode` rejects larger payloads before writing.
pub fn write_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    let length = data.len() as u32;
    out.reserve(data.len() + CHUNK_OVERHEAD);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc32(chunk_type, data).to_be_bytes());
}
