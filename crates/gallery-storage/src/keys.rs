//! Shared key generation for storage backends.
//!
//! Key format: `assets/{owner_id}/{uuid}{.ext}`.

use gallery_core::constants::STORAGE_KEY_PREFIX;
use uuid::Uuid;

const MAX_EXTENSION_LEN: usize = 10;

/// Generate a fresh storage key for an upload by `owner_id`.
///
/// The extension is taken from the original filename when it is short and alphanumeric;
/// anything else is dropped.
pub fn generate_storage_key(owner_id: Uuid, original_name: Option<&str>) -> String {
    let ext = original_name.and_then(sanitized_extension);
    match ext {
        Some(ext) => format!("{}/{}/{}.{}", STORAGE_KEY_PREFIX, owner_id, Uuid::new_v4(), ext),
        None => format!("{}/{}/{}", STORAGE_KEY_PREFIX, owner_id, Uuid::new_v4()),
    }
}

fn sanitized_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_owner_scoped_and_unique() {
        let owner = Uuid::new_v4();
        let a = generate_storage_key(owner, Some("photo.JPG"));
        let b = generate_storage_key(owner, Some("photo.JPG"));

        assert!(a.starts_with(&format!("assets/{}/", owner)));
        assert!(a.ends_with(".jpg"));
        assert_ne!(a, b);
    }

    #[test]
    fn suspicious_extensions_are_dropped() {
        let owner = Uuid::new_v4();
        for name in ["archive.tar/../x", ".bashrc", "noext", "weird.p h p", "long.abcdefghijk"] {
            let key = generate_storage_key(owner, Some(name));
            let last = key.rsplit('/').next().unwrap();
            assert!(!last.contains('.'), "{} produced {}", name, key);
        }
        assert!(!generate_storage_key(owner, None).contains(".."));
    }
}
