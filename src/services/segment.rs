//! Orchestration of the segment preparation flow.
//!
//! [`SegmentService`] is the single owner of the screen state: it holds the
//! backend client, the session state machine, and the notification port,
//! and exposes the three actions (upload, select, download) plus the form
//! mutators. Gating runs through the session's transition function, so the
//! service cannot fire a call the current state forbids, and every failure
//! settles the session back on its prior stable state before the error is
//! surfaced.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{BackendClient, BackendError, SelectionOutcome, SelectionRequest};
use crate::form::{Category, ChosenFile, FormError};
use crate::notify::Notifier;
use crate::services::archive::{self, ArchiveError};
use crate::session::{Session, SessionError, SessionEvent};

/// Errors surfaced by the service actions. Each of these has already been
/// reported through the notification port by the time it is returned.
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("unsupported file type {name:?} (expected {expected})")]
    UnsupportedExtension { name: String, expected: String },
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Gate(#[from] SessionError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// The screen, minus the screen: form state, gating, backend calls, and
/// outcome notifications behind one API usable from any frontend.
pub struct SegmentService {
    client: BackendClient,
    session: Session,
    notifier: Box<dyn Notifier>,
}

impl SegmentService {
    pub fn new(client: BackendClient, notifier: Box<dyn Notifier>) -> Self {
        Self {
            client,
            session: Session::new(),
            notifier,
        }
    }

    /// Current session state, for rendering and gate checks.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn set_category(&mut self, category: Category) {
        self.session.form_mut().category = category;
    }

    pub fn set_rate(&mut self, rate: u8) -> Result<(), SegmentError> {
        self.session.form_mut().set_rate(rate)?;
        Ok(())
    }

    pub fn set_content(&mut self, content: String) {
        self.session.form_mut().content = content;
    }

    /// Choose an identifiers file and upload it immediately.
    ///
    /// Between the FileChosen transition and the completion event there is
    /// no early return, so the uploading state is exited on every path.
    pub async fn upload_file(&mut self, path: &Path) -> Result<(), SegmentError> {
        let contract = self.client.contract();
        if !contract.accepts(path) {
            let name = path.display().to_string();
            let expected = contract.allowed_extensions().join("/");
            self.notifier.error(
                "Upload rejected",
                &format!("{} is not a {} file", name, expected),
            );
            return Err(SegmentError::UnsupportedExtension { name, expected });
        }

        let chosen = ChosenFile::new(path);
        let name = chosen.name.clone();
        if let Err(err) = self.session.apply(SessionEvent::FileChosen(chosen)) {
            self.notifier.error("Upload unavailable", &err.to_string());
            return Err(err.into());
        }

        info!("Uploading {} as {}", name, contract.field_name());
        match self.client.upload_identifiers(path).await {
            Ok(receipt) => {
                let file_id = receipt.file_id;
                self.session.apply(SessionEvent::UploadSucceeded {
                    file_id: file_id.clone(),
                })?;
                self.notifier
                    .success("File uploaded", &format!("{} is ready ({})", name, file_id));
                Ok(())
            }
            Err(err) => {
                warn!("Upload of {} failed: {}", name, err);
                self.session.apply(SessionEvent::UploadFailed)?;
                self.notifier.error("Upload failed", &err.to_string());
                Err(err.into())
            }
        }
    }

    /// Run the selection with the current form values.
    pub async fn select_users(&mut self) -> Result<SelectionOutcome, SegmentError> {
        if let Err(err) = self.session.apply(SessionEvent::SelectionStarted) {
            self.notifier.error("Cannot select users", &err.to_string());
            return Err(err.into());
        }

        let form = self.session.form();
        let request = SelectionRequest {
            category: form.category.to_string(),
            open_rate: form.rate(),
            newsletter_content: form.content.clone(),
            file_id: self.session.file_id().unwrap_or_default().to_string(),
        };

        info!(
            "Selecting users: category={} rate={}%",
            request.category, request.open_rate
        );
        match self.client.select_users(&request).await {
            Ok(outcome) => {
                self.session
                    .apply(SessionEvent::SelectionSucceeded(outcome.clone()))?;
                let stats = &outcome.stats;
                self.notifier.success(
                    "Users selected",
                    &format!(
                        "{} users: {} mail, {} messaging, {} ignored",
                        stats.total_users, stats.mail_group, stats.whatsapp_group,
                        stats.ignored_group
                    ),
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!("Selection failed: {}", err);
                self.session.apply(SessionEvent::SelectionFailed)?;
                self.notifier.error("Selection failed", &err.to_string());
                Err(err.into())
            }
        }
    }

    /// Fetch the groups archive and save it under `dest_dir`.
    pub async fn download_groups(&mut self, dest_dir: &Path) -> Result<PathBuf, SegmentError> {
        if !self.session.can_download() {
            let err = SessionError::NoResultsReady;
            self.notifier.error("Cannot download", &err.to_string());
            return Err(err.into());
        }
        let zip_filename = self
            .session
            .outcome()
            .map(|o| o.zip_filename.clone())
            .unwrap_or_default();

        info!("Downloading {}", zip_filename);
        let bytes = match self.client.download_groups(&zip_filename).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Download of {} failed: {}", zip_filename, err);
                self.notifier.error("Download failed", &err.to_string());
                return Err(err.into());
            }
        };

        match archive::save_archive(&bytes, dest_dir, &zip_filename) {
            Ok(path) => {
                if let Ok(entries) = archive::list_entries(&bytes) {
                    debug!("Archive entries: {}", entries.join(", "));
                }
                self.notifier
                    .success("Groups downloaded", &format!("saved {}", path.display()));
                Ok(path)
            }
            Err(err) => {
                warn!("Saving {} failed: {}", zip_filename, err);
                self.notifier.error("Download failed", &err.to_string());
                Err(err.into())
            }
        }
    }
}
