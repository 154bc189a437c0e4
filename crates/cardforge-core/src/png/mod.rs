//! PNG chunk stream codec.
//!
//! Parses a PNG byte stream into an ordered chunk sequence and rebuilds it
//! with freshly computed CRCs. The codec never looks inside `IDAT`: pixel
//! data is carried as opaque bytes, so any number of parse/build round
//! trips leaves it bit-identical.

use thiserror::Error;

pub mod card;
pub mod text;

/// The fixed 8-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Error, Debug)]
pub enum PngError {
    #[error("not a valid PNG file: invalid signature")]
    InvalidSignature,
}

/// A single chunk: four-byte type tag plus raw payload.
///
/// The on-wire CRC is not stored; it is recomputed on every serialize and
/// never trusted from input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub tag: [u8; 4],
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn new(tag: [u8; 4], data: Vec<u8>) -> Self {
        Self { tag, data }
    }

    /// Whether this is one of the three text-bearing chunk types.
    pub fn is_text(&self) -> bool {
        matches!(&self.tag, b"tEXt" | b"iTXt" | b"zTXt")
    }
}

/// Parse a PNG byte stream into its chunk sequence.
///
/// Parsing stops after the first `IEND` chunk; trailing bytes are ignored.
/// A stream truncated mid-chunk yields the chunks fully contained before
/// the cut, without error. Chunk CRCs are skipped, not validated, so
/// slightly malformed producer output still reads.
///
/// # Errors
///
/// [`PngError::InvalidSignature`] when the input is shorter than 8 bytes or
/// does not start with the PNG signature.
pub fn parse_chunks(data: &[u8]) -> Result<Vec<Chunk>, PngError> {
    if data.len() < PNG_SIGNATURE.len() || data[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(PngError::InvalidSignature);
    }

    let mut chunks = Vec::new();
    let mut pos = PNG_SIGNATURE.len();

    while pos + 8 <= data.len() {
        let length =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        let tag = [data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]];

        // length + 4-byte CRC must fit; otherwise the stream is truncated
        let Some(end) = pos.checked_add(12 + length) else {
            break;
        };
        if end > data.len() {
            break;
        }

        chunks.push(Chunk::new(tag, data[pos + 8..pos + 8 + length].to_vec()));
        pos = end;

        if &tag == b"IEND" {
            break;
        }
    }

    Ok(chunks)
}

/// Serialize a chunk sequence back to a PNG byte stream.
///
/// Pure mechanical encoder: signature, then `length ‖ tag ‖ data ‖ crc` per
/// chunk, in the given order. Structural sanity (`IHDR` first, `IEND` last) is
/// the caller's job.
pub fn build_png(chunks: &[Chunk]) -> Vec<u8> {
    let total: usize = chunks.iter().map(|c| 12 + c.data.len()).sum();
    let mut out = Vec::with_capacity(PNG_SIGNATURE.len() + total);
    out.extend_from_slice(&PNG_SIGNATURE);

    for chunk in chunks {
        out.extend_from_slice(&(chunk.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&chunk.tag);
        out.extend_from_slice(&chunk.data);

        let mut crc = flate2::Crc::new();
        crc.update(&chunk.tag);
        crc.update(&chunk.data);
        out.extend_from_slice(&crc.sum().to_be_bytes());
    }

    out
}

/// Raw payloads of every `IDAT` chunk, in stream order.
///
/// Used to assert pixel-data integrity across metadata operations.
///
/// # Errors
///
/// Propagates [`PngError`] from parsing.
pub fn extract_idat(data: &[u8]) -> Result<Vec<Vec<u8>>, PngError> {
    Ok(parse_chunks(data)?
        .into_iter()
        .filter(|c| &c.tag == b"IDAT")
        .map(|c| c.data)
        .collect())
}


#[cfg(test)]
mod tests {
    use super::*;
    use test_support::minimal_png;

    #[test]
    fn rejects_bad_signature() {
        assert!(matches!(
            parse_chunks(b"JFIF....not a png"),
            Err(PngError::InvalidSignature)
        ));
        assert!(matches!(parse_chunks(b"\x89PN"), Err(PngError::InvalidSignature)));
    }

    #[test]
    fn parses_minimal_stream() {
        let chunks = parse_chunks(&minimal_png()).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(&chunks[0].tag, b"IHDR");
        assert_eq!(&chunks[1].tag, b"IDAT");
        assert_eq!(&chunks[2].tag, b"IEND");
    }

    #[test]
    fn round_trip_is_identity() {
        let png = minimal_png();
        let rebuilt = build_png(&parse_chunks(&png).unwrap());
        assert_eq!(png, rebuilt);
    }

    #[test]
    fn crc_is_recomputed_not_trusted() {
        let mut png = minimal_png();
        // Corrupt the final 4 bytes (IEND's CRC). Known value: 0xAE426082.
        let n = png.len();
        png[n - 4..].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

        let chunks = parse_chunks(&png).unwrap();
        let rebuilt = build_png(&chunks);
        assert_eq!(&rebuilt[rebuilt.len() - 4..], &[0xAE, 0x42, 0x60, 0x82]);
    }

    #[test]
    fn truncated_stream_yields_complete_chunks_only() {
        let png = minimal_png();
        // Cut into the middle of the IDAT chunk.
        let truncated = &png[..png.len() - 30];
        let chunks = parse_chunks(truncated).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0].tag, b"IHDR");
    }

    #[test]
    fn signature_only_parses_to_empty() {
        let chunks = parse_chunks(&PNG_SIGNATURE).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn garbage_after_iend_is_ignored() {
        let mut png = minimal_png();
        let clean = parse_chunks(&png).unwrap();
        png.extend_from_slice(b"arbitrary trailing garbage \x00\xFF\x13");
        let dirty = parse_chunks(&png).unwrap();
        assert_eq!(clean, dirty);
    }

    #[test]
    fn idat_extraction() {
        let idat = extract_idat(&minimal_png()).unwrap();
        assert_eq!(idat.len(), 1);
        assert_eq!(idat[0][..2], [0x78, 0x9C]);
    }
}
