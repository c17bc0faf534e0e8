//! Engine configuration

use serde::{Deserialize, Serialize};

/// Per-file size limit: 5 MiB, inclusive
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Accepted MIME types for file fields
pub const ALLOWED_MIME_TYPES: [&str; 5] = [
    "application/pdf",
    "image/jpeg",
    "image/png",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Extensions offered to the file picker
pub const ALLOWED_EXTENSIONS: [&str; 6] = [".pdf", ".jpg", ".jpeg", ".png", ".doc", ".docx"];

/// File upload constraints
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConstraints {
    /// Maximum size per file in bytes
    pub max_size_bytes: u64,
    /// Allowed MIME types (exact match)
    pub allowed_mime_types: Vec<String>,
    /// Extensions for the picker's `accept` attribute
    pub allowed_extensions: Vec<String>,
}

impl Default for FileConstraints {
    fn default() -> Self {
        Self {
            max_size_bytes: MAX_FILE_SIZE,
            allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FileConstraints {
    pub fn allows_mime(&self, mime: &str) -> bool {
        self.allowed_mime_types.iter().any(|m| m == mime)
    }

    /// Value for an HTML `accept` attribute, e.g. `.pdf,.jpg,.jpeg,.png,.doc,.docx`
    pub fn accept_attribute(&self) -> String {
        self.allowed_extensions.join(",")
    }

    /// Size limit as shown in messages: `5MB`, `1.5MB`, `512KB`, `900 bytes`
    pub fn max_size_label(&self) -> String {
        const KIB: u64 = 1024;
        const MIB: u64 = 1024 * 1024;
        let bytes = self.max_size_bytes;
        if bytes >= MIB {
            format!("{}MB", scaled(bytes, MIB))
        } else if bytes >= KIB {
            format!("{}KB", scaled(bytes, KIB))
        } else {
            format!("{} bytes", bytes)
        }
    }
}

/// `bytes / unit` truncated to two decimals, trailing zeros dropped
fn scaled(bytes: u64, unit: u64) -> String {
    let hundredths = u128::from(bytes) * 100 / u128::from(unit);
    let whole = hundredths / 100;
    match hundredths % 100 {
        0 => whole.to_string(),
        frac if frac % 10 == 0 => format!("{}.{}", whole, frac / 10),
        frac => format!("{}.{:02}", whole, frac),
    }
}

/// Which fields a value change re-validates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Revalidation {
    /// The changed field plus every field whose conditional rule depends on it
    #[default]
    Dependents,
    /// Every field, on every change
    All,
}

/// Form engine configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub files: FileConstraints,
    pub revalidation: Revalidation,
}

impl EngineConfig {
    pub fn with_revalidation(mut self, revalidation: Revalidation) -> Self {
        self.revalidation = revalidation;
        self
    }
}
