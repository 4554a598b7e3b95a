use std::fmt;

use thiserror::Error;
use utils::api::users::{UpdateUserRequest, UserProfile};

use crate::services::directory_client::{DirectoryError, TargetError, UserTarget};

pub const PROFILE_UPDATED_MESSAGE: &str = "Username updated successfully";
pub const ACCOUNT_DELETED_MESSAGE: &str = "Your account has been deleted successfully";
pub const CONFIRMATION_MISMATCH_MESSAGE: &str =
    "Email does not match. Please enter your email address to confirm deletion.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
    Loading,
    Viewing,
    Editing,
    DeleteConfirming,
    Deleted,
}

impl fmt::Display for PanelPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loading => "loading",
            Self::Viewing => "viewing",
            Self::Editing => "editing",
            Self::DeleteConfirming => "delete-confirming",
            Self::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PanelError {
    #[error("invalid panel target: {0}")]
    InvalidTarget(#[from] TargetError),
    #[error("failed to load profile: {0}")]
    Fetch(#[source] DirectoryError),
    #[error("failed to save profile: {0}")]
    Save(#[source] DirectoryError),
    #[error("failed to delete account: {0}")]
    Delete(#[source] DirectoryError),
    #[error("{}", CONFIRMATION_MISMATCH_MESSAGE)]
    ConfirmationMismatch,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("cannot {operation} while {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: PanelPhase,
    },
    #[error("account deletion already in progress")]
    DeleteInProgress,
}

/// Fields of a profile the user may edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Username,
}

impl DraftField {
    pub fn name(self) -> &'static str {
        match self {
            Self::Username => "username",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditDraft {
    pub username: String,
}

impl EditDraft {
    fn from_profile(profile: Option<&UserProfile>) -> Self {
        Self {
            username: profile.map(|p| p.username.clone()).unwrap_or_default(),
        }
    }

    fn set(&mut self, field: DraftField, value: String) {
        match field {
            DraftField::Username => self.username = value,
        }
    }

    fn to_request(&self) -> Result<UpdateUserRequest, PanelError> {
        if self.username.trim().is_empty() {
            return Err(PanelError::MissingField(DraftField::Username.name()));
        }
        Ok(UpdateUserRequest {
            username: self.username.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionRequest {
    pub confirmation_email: String,
    pub error: Option<String>,
    pub deleting: bool,
}

/// Handed out when a network call starts; the matching `finish_*` applies the
/// result only if no newer request has superseded it.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    generation: u64,
    target: UserTarget,
}

impl RequestTicket {
    pub fn target(&self) -> &UserTarget {
        &self.target
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Superseded,
}

/// View/edit/delete state of one profile panel.
#[derive(Debug, Clone)]
pub struct PanelState {
    target: UserTarget,
    generation: u64,
    loading: bool,
    profile: Option<UserProfile>,
    draft: Option<EditDraft>,
    deletion: Option<DeletionRequest>,
    image_failed: bool,
    deleted: bool,
}

impl PanelState {
    pub fn new(target: UserTarget) -> Self {
        Self {
            target,
            generation: 0,
            loading: true,
            profile: None,
            draft: None,
            deletion: None,
            image_failed: false,
            deleted: false,
        }
    }

    pub fn phase(&self) -> PanelPhase {
        if self.loading {
            PanelPhase::Loading
        } else if self.deleted {
            PanelPhase::Deleted
        } else if self.deletion.is_some() {
            PanelPhase::DeleteConfirming
        } else if self.draft.is_some() {
            PanelPhase::Editing
        } else {
            PanelPhase::Viewing
        }
    }

    pub fn target(&self) -> &UserTarget {
        &self.target
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        self.draft.as_ref()
    }

    pub fn deletion(&self) -> Option<&DeletionRequest> {
        self.deletion.as_ref()
    }

    pub fn image_failed(&self) -> bool {
        self.image_failed
    }

    fn expect_phase(&self, expected: PanelPhase, operation: &'static str) -> Result<(), PanelError> {
        let phase = self.phase();
        if phase == expected {
            Ok(())
        } else {
            Err(PanelError::InvalidTransition { operation, phase })
        }
    }

    fn ticket(&self) -> RequestTicket {
        RequestTicket {
            generation: self.generation,
            target: self.target.clone(),
        }
    }

    fn is_current(&self, ticket: &RequestTicket, operation: &'static str) -> bool {
        if ticket.generation == self.generation {
            return true;
        }
        tracing::warn!(
            operation,
            ticket = ticket.generation,
            generation = self.generation,
            "discarding superseded response"
        );
        false
    }

    /// Switches to new identifying inputs. Returns false, leaving the state
    /// untouched, when they match the current ones.
    pub fn retarget(&mut self, target: UserTarget) -> bool {
        if self.target.same_as(&target) {
            return false;
        }
        tracing::debug!(user_id = target.user_id(), "panel target changed");
        self.target = target;
        self.generation += 1;
        self.loading = true;
        self.profile = None;
        self.draft = None;
        self.deletion = None;
        self.image_failed = false;
        self.deleted = false;
        true
    }

    pub fn begin_load(&mut self) -> RequestTicket {
        self.generation += 1;
        self.loading = true;
        self.draft = None;
        self.deletion = None;
        self.ticket()
    }

    pub fn finish_load(
        &mut self,
        ticket: &RequestTicket,
        result: Result<UserProfile, DirectoryError>,
    ) -> Result<Completion, PanelError> {
        if !self.is_current(ticket, "load") {
            return Ok(Completion::Superseded);
        }
        self.loading = false;

        let profile = result.map_err(PanelError::Fetch)?;
        self.profile = Some(profile);
        self.image_failed = false;
        self.deleted = false;
        Ok(Completion::Applied)
    }

    pub fn begin_edit(&mut self) -> Result<(), PanelError> {
        self.expect_phase(PanelPhase::Viewing, "edit")?;
        self.draft = Some(EditDraft::from_profile(self.profile.as_ref()));
        Ok(())
    }

    pub fn update_draft_field(
        &mut self,
        field: DraftField,
        value: impl Into<String>,
    ) -> Result<(), PanelError> {
        self.expect_phase(PanelPhase::Editing, "update draft")?;
        if let Some(draft) = self.draft.as_mut() {
            draft.set(field, value.into());
        }
        Ok(())
    }

    /// Drops the draft. Does nothing unless editing.
    pub fn cancel_edit(&mut self) {
        if self.phase() == PanelPhase::Editing {
            self.draft = None;
        }
    }

    pub fn begin_save(&mut self) -> Result<(RequestTicket, UpdateUserRequest), PanelError> {
        self.expect_phase(PanelPhase::Editing, "save")?;
        let request = match &self.draft {
            Some(draft) => draft.to_request()?,
            None => EditDraft::default().to_request()?,
        };
        Ok((self.ticket(), request))
    }

    pub fn finish_save(
        &mut self,
        ticket: &RequestTicket,
        result: Result<UserProfile, DirectoryError>,
    ) -> Result<Completion, PanelError> {
        if !self.is_current(ticket, "save") {
            return Ok(Completion::Superseded);
        }

        let profile = result.map_err(PanelError::Save)?;
        self.profile = Some(profile);
        self.image_failed = false;
        self.draft = None;
        Ok(Completion::Applied)
    }

    pub fn request_delete(&mut self) -> Result<(), PanelError> {
        self.expect_phase(PanelPhase::Viewing, "delete")?;
        if self.profile.is_none() {
            return Err(PanelError::InvalidTransition {
                operation: "delete without a profile",
                phase: PanelPhase::Viewing,
            });
        }
        self.deletion = Some(DeletionRequest::default());
        Ok(())
    }

    pub fn update_delete_confirmation_email(
        &mut self,
        value: impl Into<String>,
    ) -> Result<(), PanelError> {
        let phase = self.phase();
        let Some(deletion) = self.deletion.as_mut() else {
            return Err(PanelError::InvalidTransition {
                operation: "enter confirmation email",
                phase,
            });
        };
        if deletion.deleting {
            return Err(PanelError::DeleteInProgress);
        }
        deletion.confirmation_email = value.into();
        deletion.error = None;
        Ok(())
    }

    /// Closes the deletion dialog. Ignored while the delete request is in flight.
    pub fn cancel_delete(&mut self) {
        if self.deletion.as_ref().is_some_and(|d| !d.deleting) {
            self.deletion = None;
        }
    }

    pub fn begin_delete(&mut self) -> Result<RequestTicket, PanelError> {
        self.expect_phase(PanelPhase::DeleteConfirming, "confirm delete")?;
        let ticket = self.ticket();
        let email = self
            .profile
            .as_ref()
            .map(|p| p.email.trim().to_string())
            .unwrap_or_default();
        let Some(deletion) = self.deletion.as_mut() else {
            return Err(PanelError::InvalidTransition {
                operation: "confirm delete",
                phase: PanelPhase::Viewing,
            });
        };
        if deletion.deleting {
            return Err(PanelError::DeleteInProgress);
        }

        if deletion.confirmation_email.trim() != email {
            deletion.error = Some(CONFIRMATION_MISMATCH_MESSAGE.to_string());
            return Err(PanelError::ConfirmationMismatch);
        }

        deletion.deleting = true;
        deletion.error = None;
        Ok(ticket)
    }

    pub fn finish_delete(
        &mut self,
        ticket: &RequestTicket,
        result: Result<(), DirectoryError>,
    ) -> Result<Completion, PanelError> {
        if !self.is_current(ticket, "delete") {
            return Ok(Completion::Superseded);
        }

        match result {
            Ok(()) => {
                self.deletion = None;
                self.profile = None;
                self.deleted = true;
                Ok(Completion::Applied)
            }
            Err(e) => {
                if let Some(deletion) = self.deletion.as_mut() {
                    deletion.deleting = false;
                    deletion.error = Some(e.to_string());
                }
                Err(PanelError::Delete(e))
            }
        }
    }

    /// The avatar picture failed to load; render the fallback until the
    /// profile is replaced.
    pub fn report_image_error(&mut self) {
        self.image_failed = true;
    }
}
