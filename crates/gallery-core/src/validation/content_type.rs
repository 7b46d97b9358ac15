//! Upload acceptance policy.
//!
//! Blob backends hold an [`UploadPolicy`] and consult it before writing a single byte. The
//! whitelist accepts exact MIME types (`image/png`) and whole families (`image/*`).

use crate::constants::{DEFAULT_ALLOWED_CONTENT_TYPES, DEFAULT_CONTENT_TYPE, DEFAULT_MAX_FILE_SIZE_MB};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("content type '{0}' is not in the allowed list")]
    ContentType(String),

    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },
}

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    allowed_content_types: Vec<String>,
    max_size_bytes: usize,
    allow_undeclared: bool,
}

impl UploadPolicy {
    pub fn new<I, S>(allowed_content_types: I, max_size_bytes: usize, allow_undeclared: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| normalize_content_type(ct.as_ref()))
                .filter(|ct| !ct.is_empty())
                .collect(),
            max_size_bytes,
            allow_undeclared,
        }
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.allowed_content_types
    }

    pub fn max_size_bytes(&self) -> usize {
        self.max_size_bytes
    }

    pub fn allow_undeclared(&self) -> bool {
        self.allow_undeclared
    }

    /// Whether a declared content type is on the whitelist.
    pub fn accepts(&self, content_type: &str) -> bool {
        let content_type = normalize_content_type(content_type);
        self.allowed_content_types.iter().any(|allowed| {
            match allowed.strip_suffix("/*") {
                Some(family) => content_type
                    .split_once('/')
                    .map(|(top, _)| top == family)
                    .unwrap_or(false),
                None => *allowed == content_type,
            }
        })
    }

    /// Check a payload before it is written.
    ///
    /// Matching is done on the normalized type; the declared string itself is not altered.
    /// An undeclared (missing or empty) content type is treated as `application/octet-stream`
    /// and passes when the policy allows undeclared uploads or whitelists that type.
    pub fn check(&self, content_type: Option<&str>, size: usize) -> Result<(), PolicyViolation> {
        match content_type.filter(|ct| !ct.is_empty()) {
            Some(declared) => {
                if !self.accepts(declared) {
                    return Err(PolicyViolation::ContentType(normalize_content_type(declared)));
                }
            }
            None => {
                if !self.allow_undeclared && !self.accepts(DEFAULT_CONTENT_TYPE) {
                    return Err(PolicyViolation::ContentType(DEFAULT_CONTENT_TYPE.to_string()));
                }
            }
        }

        if size > self.max_size_bytes {
            return Err(PolicyViolation::TooLarge {
                size,
                max: self.max_size_bytes,
            });
        }

        Ok(())
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_ALLOWED_CONTENT_TYPES.iter().copied(),
            DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
            true,
        )
    }
}

/// Lowercase a MIME type and drop any parameters (`text/plain; charset=utf-8` -> `text/plain`).
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_accepts_common_images() {
        let policy = UploadPolicy::default();
        assert!(policy.check(Some("image/png"), 10).is_ok());
        assert!(policy.check(Some("IMAGE/JPEG; charset=binary"), 10).is_ok());
        assert_eq!(
            policy.check(Some("text/html"), 10),
            Err(PolicyViolation::ContentType("text/html".to_string()))
        );
    }

    #[test]
    fn undeclared_type_follows_flag() {
        let lenient = UploadPolicy::new(["image/png"], 1024, true);
        assert!(lenient.check(None, 1).is_ok());
        assert!(lenient.check(Some(""), 1).is_ok());

        let strict = UploadPolicy::new(["image/png"], 1024, false);
        assert_eq!(
            strict.check(None, 1),
            Err(PolicyViolation::ContentType(DEFAULT_CONTENT_TYPE.to_string()))
        );

        let octet = UploadPolicy::new(["application/octet-stream"], 1024, false);
        assert!(octet.check(None, 1).is_ok());
    }

    #[test]
    fn wildcard_matches_family_only() {
        let policy = UploadPolicy::new(["image/*"], 1024, false);
        assert!(policy.accepts("image/avif"));
        assert!(!policy.accepts("video/mp4"));
        assert!(!policy.accepts("image"));
    }

    #[test]
    fn size_cap_is_inclusive() {
        let policy = UploadPolicy::new(["image/png"], 4, true);
        assert!(policy.check(Some("image/png"), 4).is_ok());
        assert_eq!(
            policy.check(Some("image/png"), 5),
            Err(PolicyViolation::TooLarge { size: 5, max: 4 })
        );
    }
}
