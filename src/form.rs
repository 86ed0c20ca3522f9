//! Form field model for the segment preparation screen.
//!
//! Holds the campaign category, target response rate, newsletter content,
//! and the chosen identifiers file. The category set is closed and the rate
//! is bounded, so both are validated at the edge and everything downstream
//! can rely on them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// Default target response rate in percent.
pub const DEFAULT_RESPONSE_RATE: u8 = 69;

/// Upper bound for the response rate (percent, inclusive).
pub const MAX_RESPONSE_RATE: u8 = 100;

/// Campaign category. Fixed, mutually exclusive set; the first entry is the
/// default selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Webinar,
    DigestAnalytics,
    DigestProduct,
    Ads,
    OfflineEvent,
    Other,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 6] = [
        Category::Webinar,
        Category::DigestAnalytics,
        Category::DigestProduct,
        Category::Ads,
        Category::OfflineEvent,
        Category::Other,
    ];

    /// Human-readable label, as sent to the backend.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Webinar => "Webinar",
            Category::DigestAnalytics => "Digest Analytics",
            Category::DigestProduct => "Digest Product",
            Category::Ads => "Ads",
            Category::OfflineEvent => "Offline Event",
            Category::Other => "Other",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::ALL[0]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = FormError;

    /// Parse a category from its label. Case-insensitive; hyphens and
    /// underscores are accepted in place of spaces ("offline-event").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        Category::ALL
            .iter()
            .find(|c| c.label().to_lowercase() == normalized)
            .copied()
            .ok_or_else(|| FormError::UnknownCategory(s.trim().to_string()))
    }
}

/// The file chosen in the picker, before or after upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChosenFile {
    /// Local path of the file.
    pub path: PathBuf,
    /// Display name (final path component).
    pub name: String,
}

impl ChosenFile {
    pub fn new(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path: path.to_path_buf(),
            name,
        }
    }
}

/// Current values of the form fields.
///
/// Content is reported verbatim and never validated; the rate only changes
/// through [`FormState::set_rate`], which enforces the 0-100 bound.
#[derive(Debug, Clone)]
pub struct FormState {
    /// Active category, always one of [`Category::ALL`].
    pub category: Category,
    /// Newsletter content, sent verbatim to the backend.
    pub content: String,
    /// The chosen identifiers file, if any.
    pub chosen: Option<ChosenFile>,
    rate: u8,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            category: Category::default(),
            content: String::new(),
            chosen: None,
            rate: DEFAULT_RESPONSE_RATE,
        }
    }
}

impl FormState {
    /// Current target response rate in percent.
    pub fn rate(&self) -> u8 {
        self.rate
    }

    /// Set the target response rate. Values above 100 are rejected.
    pub fn set_rate(&mut self, rate: u8) -> Result<(), FormError> {
        if rate > MAX_RESPONSE_RATE {
            return Err(FormError::RateOutOfRange(rate));
        }
        self.rate = rate;
        Ok(())
    }
}

/// Errors for form field validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("unknown category: {0:?}")]
    UnknownCategory(String),
    #[error("response rate {0} is outside 0-100")]
    RateOutOfRange(u8),
}
