//! Keyword-addressed card metadata on top of the chunk codec.
//!
//! Read merges every decodable text chunk into one keyword map; write
//! splices a single `tEXt` chunk while copying every other chunk through
//! byte-identically. That copy-through is the integrity property this whole
//! module exists for: `IDAT` hashes the same before and after any number of
//! injections.

use std::collections::HashMap;

use super::text;
use super::{Chunk, PngError, build_png, parse_chunks};

/// Keyword carrying the V3 card payload.
pub const KEYWORD_CCV3: &str = "ccv3";

/// Legacy keyword carrying the V2 card payload.
pub const KEYWORD_CHARA: &str = "chara";

/// Which chunk a card payload was read from. `Ccv3` always wins when both
/// are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKeyword {
    Ccv3,
    Chara,
}

impl CardKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ccv3 => KEYWORD_CCV3,
            Self::Chara => KEYWORD_CHARA,
        }
    }
}

impl std::fmt::Display for CardKeyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn decode_chunk(chunk: &Chunk) -> Option<(String, String)> {
    match &chunk.tag {
        b"tEXt" => text::decode_text(&chunk.data),
        b"iTXt" => text::decode_itxt(&chunk.data),
        b"zTXt" => text::decode_ztxt(&chunk.data),
        _ => None,
    }
}

/// Read all text chunks into a keyword → text map.
///
/// Chunks are decoded in stream order; on keyword collision the later chunk
/// wins. Returns `None` when the bytes are not a PNG stream or no chunk
/// decodes.
pub fn read_text_chunks(data: &[u8]) -> Option<HashMap<String, String>> {
    let chunks = parse_chunks(data).ok()?;

    let mut map = HashMap::new();
    for chunk in &chunks {
        if let Some((keyword, value)) = decode_chunk(chunk) {
            map.insert(keyword, value);
        }
    }

    if map.is_empty() { None } else { Some(map) }
}

/// Inject or replace a `tEXt` chunk.
///
/// With `replace`, the first `tEXt` chunk decoding to `keyword` is swapped
/// in place (`iTXt`/`zTXt` with the same keyword are read targets only, never
/// replace targets). Without a match the new chunk goes immediately before
/// `IEND`, or at the end of a stream that lacks one.
///
/// # Errors
///
/// [`PngError`] when the input is not a valid PNG stream.
pub fn inject_text_chunk(
    data: &[u8],
    keyword: &str,
    value: &str,
    replace: bool,
) -> Result<Vec<u8>, PngError> {
    let chunks = parse_chunks(data)?;
    let payload = text::encode_text(keyword, value);

    let mut out = Vec::with_capacity(chunks.len() + 1);
    let mut replaced = false;

    for chunk in chunks {
        if replace && !replaced && chunk.tag == *b"tEXt" {
            if let Some((k, _)) = text::decode_text(&chunk.data) {
                if k == keyword {
                    out.push(Chunk::new(*b"tEXt", payload.clone()));
                    replaced = true;
                    continue;
                }
            }
        }
        out.push(chunk);
    }

    if !replaced {
        let chunk = Chunk::new(*b"tEXt", payload);
        match out.iter().position(|c| &c.tag == b"IEND") {
            Some(i) => out.insert(i, chunk),
            None => out.push(chunk),
        }
    }

    Ok(build_png(&out))
}

/// Remove every text chunk (all three kinds) whose keyword matches.
///
/// # Errors
///
/// [`PngError`] when the input is not a valid PNG stream.
pub fn remove_text_chunk(data: &[u8], keyword: &str) -> Result<Vec<u8>, PngError> {
    let chunks = parse_chunks(data)?;

    let kept: Vec<Chunk> = chunks
        .into_iter()
        .filter(|chunk| {
            if !chunk.is_text() {
                return true;
            }
            !matches!(decode_chunk(chunk), Some((k, _)) if k == keyword)
        })
        .collect();

    Ok(build_png(&kept))
}

/// Extract the card payload, preferring `ccv3` over `chara`.
pub fn card_payload(data: &[u8]) -> Option<(CardKeyword, String)> {
    let mut map = read_text_chunks(data)?;

    if let Some(value) = map.remove(KEYWORD_CCV3) {
        return Some((CardKeyword::Ccv3, value));
    }
    map.remove(KEYWORD_CHARA)
        .map(|value| (CardKeyword::Chara, value))
}
