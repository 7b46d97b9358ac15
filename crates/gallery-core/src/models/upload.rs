use bytes::Bytes;

/// Binary payload handed to the coordinator on create.
///
/// Name and content type are whatever the uploader declared, if anything.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            original_name: None,
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Declared name exactly as supplied. An empty string counts as undeclared.
    pub fn declared_name(&self) -> Option<&str> {
        self.original_name.as_deref().filter(|n| !n.is_empty())
    }

    /// Declared content type exactly as supplied. An empty string counts as undeclared.
    pub fn declared_content_type(&self) -> Option<&str> {
        self.content_type.as_deref().filter(|ct| !ct.is_empty())
    }
}
