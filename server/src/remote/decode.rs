use base64::Engine;

/// Fixed printable-ASCII key the remote uses to obfuscate `streamInfo.url`
/// values. Baked into the code per §4.4 ("a constant string").
const XOR_KEY: &[u8] = b"p0dBr1dg3-streamInfo-key";

/// Decodes a `streamInfo.url` value: base64-decode, then XOR against
/// `XOR_KEY` repeated cyclically, then interpret as UTF-8.
pub fn decode_enclosure_url(encoded: &str) -> Result<String, DecodeError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(DecodeError::Base64)?;
    let xored: Vec<u8> = bytes
        .iter()
        .enumerate()
        .map(|(i, b)| b ^ XOR_KEY[i % XOR_KEY.len()])
        .collect();
    String::from_utf8(xored).map_err(DecodeError::Utf8)
}

/// Encodes a plaintext URL the same way the remote would have, used only
/// by tests to build round-trip fixtures.
pub fn encode_enclosure_url(plain: &str) -> String {
    let xored: Vec<u8> = plain
        .as_bytes()
        .iter()
        .enumerate()
        .map(|(i, b)| b ^ XOR_KEY[i % XOR_KEY.len()])
        .collect();
    base64::engine::general_purpose::STANDARD.encode(xored)
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded bytes are not valid UTF-8: {0}")]
    Utf8(std::string::FromUtf8Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let original = "https://shard3.example.com/media/track-42.m4a?sig=abc";
        let encoded = encode_enclosure_url(original);
        let decoded = decode_enclosure_url(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert!(decode_enclosure_url("not valid base64!!").is_err());
    }
}
