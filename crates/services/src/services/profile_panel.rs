//! Headless profile panel: loads one user from the directory, lets the user
//! edit the display name and delete the account behind an email confirmation.

mod state;
mod view;

use std::sync::Arc;

use secrecy::SecretString;

pub use state::{
    ACCOUNT_DELETED_MESSAGE, CONFIRMATION_MISMATCH_MESSAGE, Completion, DeletionRequest,
    DraftField, EditDraft, PROFILE_UPDATED_MESSAGE, PanelError, PanelPhase, PanelState,
    RequestTicket,
};
pub use view::{
    AvatarView, BodyView, DeleteDialogView, DetailsView, EditFormView, HeaderView, PanelView,
    ProfileView,
};

use super::directory_client::{UserDirectory, UserTarget};

pub type ErrorCallback = Arc<dyn Fn(&PanelError) + Send + Sync>;
pub type SuccessCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Host notifications. Both are optional.
#[derive(Clone, Default)]
pub struct PanelCallbacks {
    on_error: Option<ErrorCallback>,
    on_success: Option<SuccessCallback>,
}

impl PanelCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_error(mut self, f: impl Fn(&PanelError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn on_success(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(f));
        self
    }

    fn error(&self, err: &PanelError) {
        if let Some(cb) = &self.on_error {
            cb(err);
        }
    }

    fn success(&self, message: &str) {
        if let Some(cb) = &self.on_success {
            cb(message);
        }
    }
}

pub struct ProfilePanel<D> {
    directory: D,
    state: PanelState,
    callbacks: PanelCallbacks,
}

impl<D: UserDirectory> ProfilePanel<D> {
    /// Creates a panel in the loading phase. Call [`ProfilePanel::load`] to fetch.
    pub fn new(directory: D, target: UserTarget, callbacks: PanelCallbacks) -> Self {
        Self {
            directory,
            state: PanelState::new(target),
            callbacks,
        }
    }

    /// Validates the identifying inputs and creates a panel for them.
    pub fn open(
        directory: D,
        service_url: &str,
        user_id: &str,
        credential: Option<SecretString>,
        callbacks: PanelCallbacks,
    ) -> Result<Self, PanelError> {
        let target = UserTarget::new(service_url, user_id, credential)?;
        Ok(Self::new(directory, target, callbacks))
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn phase(&self) -> PanelPhase {
        self.state.phase()
    }

    pub fn view(&self) -> PanelView {
        PanelView::from(&self.state)
    }

    pub async fn load(&mut self) -> Result<(), PanelError> {
        let ticket = self.state.begin_load();
        let user_id = ticket.target().user_id().to_string();
        let result = self.directory.fetch_user(ticket.target()).await;

        match self.state.finish_load(&ticket, result) {
            Ok(Completion::Applied) => {
                tracing::info!(user_id = %user_id, "loaded user profile");
                Ok(())
            }
            Ok(Completion::Superseded) => Ok(()),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "profile load failed");
                self.callbacks.error(&e);
                Err(e)
            }
        }
    }

    /// Points the panel at a different user, service or credential and
    /// reloads. Unchanged inputs leave the panel alone.
    pub async fn retarget(&mut self, target: UserTarget) -> Result<(), PanelError> {
        if !self.state.retarget(target) {
            return Ok(());
        }
        self.load().await
    }

    pub fn begin_edit(&mut self) -> Result<(), PanelError> {
        self.state.begin_edit()
    }

    pub fn update_draft_field(
        &mut self,
        field: DraftField,
        value: impl Into<String>,
    ) -> Result<(), PanelError> {
        self.state.update_draft_field(field, value)
    }

    pub fn cancel_edit(&mut self) {
        self.state.cancel_edit();
    }

    pub async fn save(&mut self) -> Result<(), PanelError> {
        let (ticket, request) = self.state.begin_save()?;
        let result = self.directory.update_user(ticket.target(), &request).await;

        match self.state.finish_save(&ticket, result) {
            Ok(Completion::Applied) => {
                tracing::info!(user_id = ticket.target().user_id(), "saved user profile");
                self.callbacks.success(PROFILE_UPDATED_MESSAGE);
                Ok(())
            }
            Ok(Completion::Superseded) => Ok(()),
            Err(e) => {
                tracing::warn!(user_id = ticket.target().user_id(), error = %e, "profile save failed");
                self.callbacks.error(&e);
                Err(e)
            }
        }
    }

    pub fn request_delete(&mut self) -> Result<(), PanelError> {
        self.state.request_delete()
    }

    pub fn update_delete_confirmation_email(
        &mut self,
        value: impl Into<String>,
    ) -> Result<(), PanelError> {
        self.state.update_delete_confirmation_email(value)
    }

    pub fn cancel_delete(&mut self) {
        self.state.cancel_delete();
    }

    /// Deletes the account if the entered email matches the profile's.
    /// A mismatch is reported in the dialog only and sends nothing.
    pub async fn confirm_delete(&mut self) -> Result<(), PanelError> {
        let ticket = self.state.begin_delete()?;
        let result = self.directory.delete_user(ticket.target()).await;

        match self.state.finish_delete(&ticket, result) {
            Ok(Completion::Applied) => {
                tracing::info!(user_id = ticket.target().user_id(), "deleted user account");
                self.callbacks.success(ACCOUNT_DELETED_MESSAGE);
                Ok(())
            }
            Ok(Completion::Superseded) => Ok(()),
            Err(e) => {
                tracing::warn!(user_id = ticket.target().user_id(), error = %e, "account deletion failed");
                self.callbacks.error(&e);
                Err(e)
            }
        }
    }

    pub fn report_image_error(&mut self) {
        self.state.report_image_error();
    }
}
