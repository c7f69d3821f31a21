use crate::diagnostics::Diagnostics;
use chardetng::EncodingDetector;
use encoding_rs::{Decoder, DecoderResult, Encoding};
use std::path::Path;

/// Candidates tried in order when detection is not confident.
pub const FALLBACK_ENCODINGS: [&str; 3] = ["utf-8", "iso-8859-1", "windows-1252"];

/// Best-guess encoding for `bytes`, or `None` when detection is not confident.
///
/// A byte-order mark wins outright. Otherwise the statistical guess is only
/// accepted if the whole buffer decodes under it without a malformed sequence.
pub fn resolve(bytes: &[u8]) -> Option<&'static Encoding> {
    if bytes.is_empty() {
        return None;
    }
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return Some(encoding);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guess = detector.guess(None, true);

    guess
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|_| guess)
}

/// Decode `bytes`, dropping malformed sequences instead of replacing them.
/// A leading BOM for `encoding` is removed.
pub fn decode_ignoring(encoding: &'static Encoding, bytes: &[u8]) -> String {
    drain(encoding.new_decoder_with_bom_removal(), bytes)
}

/// Like [`decode_ignoring`], but a leading BOM survives as U+FEFF.
pub fn decode_ignoring_keep_bom(encoding: &'static Encoding, bytes: &[u8]) -> String {
    drain(encoding.new_decoder_without_bom_handling(), bytes)
}

fn drain(mut decoder: Decoder, bytes: &[u8]) -> String {
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(bytes.len())
        .unwrap_or(bytes.len());
    let mut text = String::with_capacity(capacity);
    let mut input = bytes;

    loop {
        let (result, read) = decoder.decode_to_string_without_replacement(input, &mut text, true);
        input = &input[read..];
        match result {
            DecoderResult::InputEmpty => break,
            DecoderResult::OutputFull => {
                let more = decoder
                    .max_utf8_buffer_length_without_replacement(input.len())
                    .unwrap_or(input.len())
                    .max(4);
                text.reserve(more);
            }
            // The malformed bytes are already consumed; keep going.
            DecoderResult::Malformed(_, _) => {}
        }
    }

    text
}

/// Try each fallback candidate in order and return the first decoded text
/// along with the label that produced it.
pub fn decode_with_fallback(
    bytes: &[u8],
    path: &Path,
    diagnostics: &dyn Diagnostics,
) -> (String, &'static str) {
    diagnostics.warn(&format!(
        "Could not detect encoding for {}. Trying common encodings.",
        path.display()
    ));

    for label in FALLBACK_ENCODINGS {
        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => {
                let text = decode_ignoring(encoding, bytes);
                diagnostics.info(&format!("Text extracted using {label} encoding."));
                return (text, label);
            }
            None => diagnostics.error(&format!("Error decoding with {label}: unknown encoding")),
        }
    }

    // Omitting malformed bytes means UTF-8 never fails.
    (decode_ignoring(encoding_rs::UTF_8, bytes), "utf-8")
}

/// Decode `bytes` with the resolved encoding, or the fallback list when
/// detection is not confident.
pub fn decode_detected(bytes: &[u8], path: &Path, diagnostics: &dyn Diagnostics) -> String {
    match resolve(bytes) {
        Some(encoding) => {
            let text = decode_ignoring(encoding, bytes);
            diagnostics.info(&format!(
                "Text extracted using detected encoding ({}).",
                encoding.name()
            ));
            text
        }
        None => decode_with_fallback(bytes, path, diagnostics).0,
    }
}
