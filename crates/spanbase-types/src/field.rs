use bytes::Bytes;

/// An uploaded file part: bytes plus whatever the client said about them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl FilePart {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            file_name: None,
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A request field as the transport decoded it.
///
/// Form submissions are loosely typed: a field named `file` can arrive as a
/// plain string, and a field named `text` can arrive as a binary part. The
/// validator decides which shapes are acceptable for which field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    /// A plain textual value.
    Text(String),
    /// A file part with optional name and content type.
    File(FilePart),
    /// Raw bytes with no file metadata.
    Binary(Bytes),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The payload bytes, if this value is any recognized binary shape.
    pub fn as_binary(&self) -> Option<&Bytes> {
        match self {
            Self::File(part) => Some(&part.data),
            Self::Binary(data) => Some(data),
            Self::Text(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::File(_) => "file",
            Self::Binary(_) => "binary",
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<FilePart> for FieldValue {
    fn from(part: FilePart) -> Self {
        Self::File(part)
    }
}
