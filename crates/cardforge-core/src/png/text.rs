//! Text chunk transcoding.
//!
//! One logical record `(keyword, text)` has three wire encodings: plain
//! `tEXt`, compressed `zTXt`, and international `iTXt`. All three are read;
//! only base64 `tEXt` is ever written. Base64 keeps NULs and newlines out
//! of the payload, so chunk framing can never be broken by card content.
//!
//! Decoders return `None` for anything malformed - a chunk another tool
//! botched is treated as absent, not as a stream error.

use std::io::Read;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::read::ZlibDecoder;

/// Keyword bytes are Latin-1 per the PNG spec.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn inflate(data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data).read_to_end(&mut out).ok()?;
    Some(out)
}

fn split_at_nul(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = data.iter().position(|&b| b == 0)?;
    Some((&data[..pos], &data[pos + 1..]))
}

/// Decode a `tEXt` chunk payload.
///
/// The text portion is tried as base64-encoded UTF-8 first (our own write
/// format); producers that store raw text fall back to a lossy UTF-8 read.
/// Once the keyword NUL is found this cannot fail.
pub fn decode_text(data: &[u8]) -> Option<(String, String)> {
    let (keyword, payload) = split_at_nul(data)?;

    let text = BASE64
        .decode(payload)
        .ok()
        .and_then(|raw| String::from_utf8(raw).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(payload).into_owned());

    Some((latin1(keyword), text))
}

/// Decode a `zTXt` chunk payload: `keyword NUL method deflate-stream`.
///
/// Only compression method 0 (zlib deflate) is understood. Bad zlib data or
/// non-UTF-8 output yields `None`.
pub fn decode_ztxt(data: &[u8]) -> Option<(String, String)> {
    let (keyword, rest) = split_at_nul(data)?;
    let (&method, compressed) = rest.split_first()?;
    if method != 0 {
        return None;
    }

    let inflated = inflate(compressed)?;
    let text = String::from_utf8(inflated).ok()?;
    Some((latin1(keyword), text))
}

/// Decode an `iTXt` chunk payload:
/// `keyword NUL flag method language NUL translated NUL text`.
///
/// Language tag and translated keyword are skipped. Text is UTF-8 with
/// replacement on bad sequences, deflate-decompressed first when flag = 1.
pub fn decode_itxt(data: &[u8]) -> Option<(String, String)> {
    let (keyword, rest) = split_at_nul(data)?;
    if rest.len() < 2 {
        return None;
    }
    let compressed = rest[0] == 1;
    // rest[1] is the compression method; presence is all that matters here
    let rest = &rest[2..];

    let (_language, rest) = split_at_nul(rest)?;
    let (_translated, text_bytes) = split_at_nul(rest)?;

    let text = if compressed {
        let inflated = inflate(text_bytes)?;
        String::from_utf8_lossy(&inflated).into_owned()
    } else {
        String::from_utf8_lossy(text_bytes).into_owned()
    };

    Some((latin1(keyword), text))
}

/// Encode a text record as `tEXt` payload bytes: `keyword NUL base64(text)`.
///
/// This is the only write format; `iTXt`/`zTXt` exist on the read path alone.
/// The keyword must be Latin-1 (in practice: `ccv3` or `chara`).
pub fn encode_text(keyword: &str, text: &str) -> Vec<u8> {
    let encoded = BASE64.encode(text.as_bytes());
    let mut out = Vec::with_capacity(keyword.len() + 1 + encoded.len());
    out.extend_from_slice(keyword.as_bytes());
    out.push(0);
    out.extend_from_slice(encoded.as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn encode_decode_inverse() {
        let text = "line one\nline two\u{0} with a NUL and 日本語";
        let payload = encode_text("ccv3", text);
        let (k, t) = decode_text(&payload).unwrap();
        assert_eq!(k, "ccv3");
        assert_eq!(t, text);
    }

    #[test]
    fn plain_raw_utf8_fallback() {
        let mut payload = b"chara\x00".to_vec();
        payload.extend_from_slice("not base64! but readable".as_bytes());
        let (k, t) = decode_text(&payload).unwrap();
        assert_eq!(k, "chara");
        assert_eq!(t, "not base64! but readable");
    }

    #[test]
    fn plain_invalid_bytes_replaced() {
        let payload = b"chara\x00\xFF\xFEoops".to_vec();
        let (_, t) = decode_text(&payload).unwrap();
        assert!(t.contains('\u{FFFD}'));
    }

    #[test]
    fn plain_without_nul_is_unreadable() {
        assert_eq!(decode_text(b"no delimiter here"), None);
    }

    #[test]
    fn ztxt_round_trip() {
        let mut payload = b"ccv3\x00\x00".to_vec();
        payload.extend_from_slice(&deflate("compressed content".as_bytes()));
        let (k, t) = decode_ztxt(&payload).unwrap();
        assert_eq!(k, "ccv3");
        assert_eq!(t, "compressed content");
    }

    #[test]
    fn ztxt_unknown_method_is_unreadable() {
        let mut payload = b"ccv3\x00\x01".to_vec();
        payload.extend_from_slice(&deflate(b"x"));
        assert_eq!(decode_ztxt(&payload), None);
    }

    #[test]
    fn ztxt_bad_stream_is_unreadable() {
        assert_eq!(decode_ztxt(b"ccv3\x00\x00garbage"), None);
        assert_eq!(decode_ztxt(b"ccv3\x00"), None);
        assert_eq!(decode_ztxt(b"ccv3"), None);
    }

    #[test]
    fn itxt_uncompressed() {
        // keyword NUL flag=0 method=0 lang NUL translated NUL text
        let payload = b"ccv3\x00\x00\x00en\x00\x00hello world".to_vec();
        let (k, t) = decode_itxt(&payload).unwrap();
        assert_eq!(k, "ccv3");
        assert_eq!(t, "hello world");
    }

    #[test]
    fn itxt_compressed() {
        let mut payload = b"ccv3\x00\x01\x00\x00\x00".to_vec();
        payload.extend_from_slice(&deflate("packed \u{4F60}\u{597D}".as_bytes()));
        let (_, t) = decode_itxt(&payload).unwrap();
        assert_eq!(t, "packed \u{4F60}\u{597D}");
    }

    #[test]
    fn itxt_truncated_fields_are_unreadable() {
        assert_eq!(decode_itxt(b"ccv3\x00\x00"), None); // flag without method
        assert_eq!(decode_itxt(b"ccv3\x00"), None); // missing flag and method
        assert_eq!(decode_itxt(b"ccv3\x00\x00\x00en\x00"), None); // no translated terminator
    }

    #[test]
    fn itxt_bad_deflate_is_unreadable() {
        assert_eq!(decode_itxt(b"ccv3\x00\x01\x00\x00\x00not-deflate"), None);
    }

    #[test]
    fn keyword_is_latin1() {
        let payload = b"caf\xE9\x00dGV4dA==".to_vec(); // "café" in Latin-1
        let (k, t) = decode_text(&payload).unwrap();
        assert_eq!(k, "café");
        assert_eq!(t, "text");
    }
}
