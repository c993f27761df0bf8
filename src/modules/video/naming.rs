//! Object naming: extensions from media types, random file names, and
//! prefixed storage keys.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::TryRngCore;
use rand::rngs::OsRng;

const FALLBACK_EXTENSION: &str = ".bin";
const RANDOM_NAME_BYTES: usize = 32;

/// `"video/mp4"` becomes `".mp4"`. Anything that is not exactly
/// `type/subtype` gets `.bin`.
pub fn extension_for(media_type: &str) -> String {
    let parts: Vec<&str> = media_type.split('/').collect();
    if parts.len() != 2 {
        return FALLBACK_EXTENSION.to_string();
    }
    format!(".{}", parts[1])
}

/// URL-safe random file name carrying the extension for `media_type`.
///
/// # Panics
///
/// Panics if the operating system's random source is unavailable.
pub fn random_file_name(media_type: &str) -> String {
    let mut bytes = [0u8; RANDOM_NAME_BYTES];
    if let Err(e) = OsRng.try_fill_bytes(&mut bytes) {
        panic!("failed to generate random bytes: {e}");
    }
    format!("{}{}", URL_SAFE_NO_PAD.encode(bytes), extension_for(media_type))
}

pub fn object_key(prefix: &str, file_name: &str) -> String {
    format!("{prefix}/{file_name}")
}
