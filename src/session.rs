//! Session state machine for the segment preparation flow.
//!
//! The screen's lifecycle is linear: a file is chosen and uploaded, the
//! selection runs against the uploaded file, the resulting archive becomes
//! downloadable. Rather than a handful of boolean flags, the state is an
//! explicit enumeration driven through a single transition function, so
//! impossible combinations (uploading while selecting, selecting without a
//! file identifier) cannot be represented.
//!
//! Failures never advance the machine: they return it to the prior stable
//! state, and a previously ready outcome is kept so its archive stays
//! downloadable.

use thiserror::Error;

use crate::backend::SelectionOutcome;
use crate::form::{ChosenFile, FormState};

/// Stable and in-flight states of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No usable file identifier; upload required.
    NoFile,
    /// An upload round-trip is in flight.
    Uploading,
    /// Upload completed; a file identifier is held.
    FileReady,
    /// A selection request is pending.
    Selecting,
    /// A selection outcome (and its archive name) is held.
    ResultsReady,
}

/// Inputs to the transition function.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A file was chosen in the picker; the upload starts immediately.
    FileChosen(ChosenFile),
    /// The upload round-trip ended with a server-issued identifier.
    UploadSucceeded { file_id: String },
    /// The upload round-trip ended without an identifier.
    UploadFailed,
    /// The primary action was invoked.
    SelectionStarted,
    /// The selection call returned statistics and an archive name.
    SelectionSucceeded(SelectionOutcome),
    /// The selection call failed.
    SelectionFailed,
}

/// Rejected transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("an upload is already in flight")]
    UploadInFlight,
    #[error("a selection request is already pending")]
    SelectionPending,
    #[error("no uploaded file is ready; choose a file first")]
    NotReadyToSelect,
    #[error("no results are ready to download")]
    NoResultsReady,
    #[error("unexpected {event} in phase {phase:?}")]
    UnexpectedEvent { event: &'static str, phase: Phase },
}

/// The single owner of all screen state: form values, upload identifier,
/// and the latest selection outcome.
#[derive(Debug, Clone)]
pub struct Session {
    phase: Phase,
    form: FormState,
    file_id: Option<String>,
    outcome: Option<SelectionOutcome>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::NoFile,
            form: FormState::default(),
            file_id: None,
            outcome: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    /// Server-issued identifier of the uploaded file, if one is held.
    pub fn file_id(&self) -> Option<&str> {
        self.file_id.as_deref()
    }

    /// Latest selection outcome, if one is held.
    pub fn outcome(&self) -> Option<&SelectionOutcome> {
        self.outcome.as_ref()
    }

    /// True for the exact span of one upload round-trip.
    pub fn uploading(&self) -> bool {
        self.phase == Phase::Uploading
    }

    /// True while a selection request is pending.
    pub fn selecting(&self) -> bool {
        self.phase == Phase::Selecting
    }

    /// The picker refuses new files while a round-trip is in flight.
    pub fn can_choose_file(&self) -> bool {
        !self.uploading() && !self.selecting()
    }

    /// The primary action needs a held identifier and no in-flight call.
    pub fn can_select(&self) -> bool {
        self.file_id.is_some() && matches!(self.phase, Phase::FileReady | Phase::ResultsReady)
    }

    /// The download action needs a ready outcome with a non-empty archive
    /// name. Later upload or selection activity does not revoke it.
    pub fn can_download(&self) -> bool {
        self.outcome
            .as_ref()
            .map(|o| !o.zip_filename.is_empty())
            .unwrap_or(false)
    }

    /// Display state of the file picker.
    pub fn file_label(&self) -> String {
        match (&self.phase, &self.form.chosen) {
            (Phase::Uploading, Some(chosen)) => format!("uploading {}...", chosen.name),
            (_, Some(chosen)) => chosen.name.clone(),
            (_, None) => "no file selected".to_string(),
        }
    }

    /// The transition function. Every state change goes through here;
    /// invalid transitions are rejected and leave the session untouched.
    pub fn apply(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        match event {
            SessionEvent::FileChosen(chosen) => {
                match self.phase {
                    Phase::Uploading => return Err(SessionError::UploadInFlight),
                    Phase::Selecting => return Err(SessionError::SelectionPending),
                    _ => {}
                }
                // A new file supersedes the old one; the identifier is
                // invalid for the whole round-trip so dependent actions
                // stay disabled.
                self.form.chosen = Some(chosen);
                self.file_id = None;
                self.phase = Phase::Uploading;
                Ok(())
            }
            SessionEvent::UploadSucceeded { file_id } => {
                self.expect_phase(Phase::Uploading, "UploadSucceeded")?;
                self.file_id = Some(file_id);
                self.phase = Phase::FileReady;
                Ok(())
            }
            SessionEvent::UploadFailed => {
                self.expect_phase(Phase::Uploading, "UploadFailed")?;
                self.file_id = None;
                self.phase = if self.outcome.is_some() {
                    Phase::ResultsReady
                } else {
                    Phase::NoFile
                };
                Ok(())
            }
            SessionEvent::SelectionStarted => {
                match self.phase {
                    Phase::Uploading => return Err(SessionError::UploadInFlight),
                    Phase::Selecting => return Err(SessionError::SelectionPending),
                    _ => {}
                }
                if self.file_id.is_none() {
                    return Err(SessionError::NotReadyToSelect);
                }
                self.phase = Phase::Selecting;
                Ok(())
            }
            SessionEvent::SelectionSucceeded(outcome) => {
                self.expect_phase(Phase::Selecting, "SelectionSucceeded")?;
                self.outcome = Some(outcome);
                self.phase = Phase::ResultsReady;
                Ok(())
            }
            SessionEvent::SelectionFailed => {
                self.expect_phase(Phase::Selecting, "SelectionFailed")?;
                // Prior results (if any) are left untouched.
                self.phase = if self.outcome.is_some() {
                    Phase::ResultsReady
                } else {
                    Phase::FileReady
                };
                Ok(())
            }
        }
    }

    fn expect_phase(&self, expected: Phase, event: &'static str) -> Result<(), SessionError> {
        if self.phase != expected {
            return Err(SessionError::UnexpectedEvent {
                event,
                phase: self.phase,
            });
        }
        Ok(())
    }
}
