use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct FileData {
    pub content: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
}

impl FileData {
    pub fn new(content: Vec<u8>, filename: String, mime_type: String) -> Self {
        Self {
            content,
            filename,
            mime_type,
        }
    }

    pub fn validate_size(&self, max_size: u64) -> bool {
        self.size() <= max_size
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Raw entry as returned by the storage backend's list call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageEntry {
    pub name: String,
    #[serde(default)]
    pub metadata: Option<ObjectMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectMetadata {
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, rename = "mimetype")]
    pub mime_type: Option<String>,
}

impl StorageEntry {
    pub fn size(&self) -> u64 {
        self.metadata.as_ref().and_then(|m| m.size).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Image,
    Csv,
    Json,
    Other,
}

impl ContentCategory {
    /// Category from the file extension, case-insensitive.
    pub fn from_file_name(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" => ContentCategory::Image,
            "csv" => ContentCategory::Csv,
            "json" => ContentCategory::Json,
            _ => ContentCategory::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
    pub url: String,
    pub category: ContentCategory,
    pub mime_type: Option<String>,
}

impl StoredFile {
    pub fn new(name: String, size: u64, url: String) -> Self {
        let category = ContentCategory::from_file_name(&name);
        Self {
            name,
            size,
            url,
            category,
            mime_type: None,
        }
    }

    pub fn from_entry(entry: StorageEntry, url: String) -> Self {
        let size = entry.size();
        let mime_type = entry.metadata.and_then(|m| m.mime_type);
        Self {
            mime_type,
            ..Self::new(entry.name, size, url)
        }
    }
}
