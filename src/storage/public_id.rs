//! Short user-facing file identifiers.

use base64::Engine;

/// Length of a public id in characters.
pub const PUBLIC_ID_LEN: usize = 8;

/// Give up after this many consecutive collisions.
pub const MAX_ATTEMPTS: usize = 8;

/// Draw a candidate public id.
///
/// Takes the leading 48 bits of a v4 UUID (all random) and encodes them as
/// URL-safe base64, which yields exactly [`PUBLIC_ID_LEN`] characters.
/// Candidates are not unique on their own; the caller claims them in the
/// public-id index and draws again on conflict.
pub fn generate() -> String {
    let random = uuid::Uuid::new_v4();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&random.as_bytes()[..6])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let id = generate();
        assert_eq!(id.len(), PUBLIC_ID_LEN);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_generate_varies() {
        assert_ne!(generate(), generate());
    }
}
