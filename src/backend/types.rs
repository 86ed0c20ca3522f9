//! Wire types for the segmentation backend contract.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Upload contract variant.
///
/// Deployments expect either a "UID" or a "CPID" identifiers file. The two
/// contracts differ in endpoint path, multipart field name, and accepted
/// file extensions, and are not interchangeable; the active one is fixed by
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadContract {
    #[default]
    UidFile,
    CpidFile,
}

impl UploadContract {
    /// Path of the upload endpoint, relative to the backend base URL.
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            UploadContract::UidFile => "/upload_uid_file",
            UploadContract::CpidFile => "/upload_cpid_file",
        }
    }

    /// Multipart form field name carrying the file payload.
    pub fn field_name(&self) -> &'static str {
        match self {
            UploadContract::UidFile => "uid_file",
            UploadContract::CpidFile => "cpid_file",
        }
    }

    /// File extensions accepted by this contract, lowercase without dots.
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            UploadContract::UidFile => &["csv", "txt", "xls", "xlsx"],
            UploadContract::CpidFile => &["csv", "json", "xls", "xlsx"],
        }
    }

    /// Check a path against the extension allow-list. This mirrors the file
    /// dialog filter of the original tool; the backend remains the actual
    /// validator of file contents.
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .map(|e| self.allowed_extensions().contains(&e.as_str()))
            .unwrap_or(false)
    }
}

impl fmt::Display for UploadContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl FromStr for UploadContract {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "uid" | "uid_file" => Ok(UploadContract::UidFile),
            "cpid" | "cpid_file" => Ok(UploadContract::CpidFile),
            other => Err(format!(
                "unknown upload contract {:?} (expected \"uid_file\" or \"cpid_file\")",
                other
            )),
        }
    }
}

/// Response of a successful identifiers-file upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    /// Server-issued handle for the uploaded file. The file content never
    /// comes back to the client; this identifier is all later calls need.
    pub file_id: String,
}

/// Body of the select-users call, assembled fresh from the current form
/// values on each submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub category: String,
    pub open_rate: u8,
    pub newsletter_content: String,
    pub file_id: String,
}

/// Summary statistics of a completed selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionStats {
    pub total_users: u64,
    pub expected_open_rate: u32,
    pub mail_group: u64,
    pub whatsapp_group: u64,
    pub ignored_group: u64,
}

impl SelectionStats {
    /// Sum of the three disjoint contact-channel groups.
    pub fn groups_total(&self) -> u64 {
        self.mail_group + self.whatsapp_group + self.ignored_group
    }

    /// Whether the groups partition the total user count. The backend is
    /// expected to uphold this; a mismatch is reported, not rejected.
    pub fn is_balanced(&self) -> bool {
        self.groups_total() == self.total_users
    }
}

/// Response of a successful select-users call: the statistics plus the name
/// of the archive that a later download call can fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOutcome {
    pub stats: SelectionStats,
    pub zip_filename: String,
}
