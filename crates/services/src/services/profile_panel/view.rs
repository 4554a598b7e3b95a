use std::fmt;

use super::state::{PanelPhase, PanelState};

/// What a host should draw for a panel at a given moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelView {
    Loading,
    Deleted,
    Profile(ProfileView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub avatar: AvatarView,
    pub header: HeaderView,
    pub body: BodyView,
    pub delete_dialog: Option<DeleteDialogView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarView {
    Picture(String),
    /// Upper-cased first letter of the display name, if there is one.
    Initial(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub display_name: Option<String>,
    pub email_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyView {
    Details(DetailsView),
    EditForm(EditFormView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsView {
    pub username: Option<String>,
    pub email: Option<String>,
    pub email_verified: bool,
    pub created_via: Option<String>,
    /// `None` when the profile has no linked providers; the section is hidden.
    pub auth_providers: Option<Vec<String>>,
    pub can_edit: bool,
    pub can_delete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFormView {
    pub username: String,
    pub username_required: bool,
    pub can_save: bool,
    pub can_cancel: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteDialogView {
    pub target_email: Option<String>,
    pub confirmation_email: String,
    pub error: Option<String>,
    pub deleting: bool,
    pub can_confirm: bool,
    pub can_cancel: bool,
}

impl From<&PanelState> for PanelView {
    fn from(state: &PanelState) -> Self {
        let phase = state.phase();
        match phase {
            PanelPhase::Loading => return PanelView::Loading,
            PanelPhase::Deleted => return PanelView::Deleted,
            _ => {}
        }

        let profile = state.profile();
        let display_name = profile.map(|p| p.username.clone());

        let picture = profile
            .and_then(|p| p.picture_url.as_deref())
            .filter(|url| !url.trim().is_empty() && !state.image_failed());
        let avatar = match picture {
            Some(url) => AvatarView::Picture(url.to_string()),
            None => AvatarView::Initial(
                display_name
                    .as_deref()
                    .and_then(|name| name.chars().next())
                    .map(|c| c.to_uppercase().collect()),
            ),
        };

        let header = HeaderView {
            display_name: display_name.clone(),
            email_verified: profile.is_some_and(|p| p.email_verified),
        };

        let body = match state.draft() {
            Some(draft) => BodyView::EditForm(EditFormView {
                username: draft.username.clone(),
                username_required: true,
                can_save: !draft.username.trim().is_empty(),
                can_cancel: true,
            }),
            None => BodyView::Details(DetailsView {
                username: display_name,
                email: profile.map(|p| p.email.clone()),
                email_verified: profile.is_some_and(|p| p.email_verified),
                created_via: profile.map(|p| p.created_via.clone()),
                auth_providers: profile
                    .map(|p| p.auth_providers.clone())
                    .filter(|providers| !providers.is_empty()),
                can_edit: phase == PanelPhase::Viewing,
                can_delete: phase == PanelPhase::Viewing && profile.is_some(),
            }),
        };

        let delete_dialog = state.deletion().map(|deletion| DeleteDialogView {
            target_email: profile.map(|p| p.email.clone()),
            confirmation_email: deletion.confirmation_email.clone(),
            error: deletion.error.clone(),
            deleting: deletion.deleting,
            can_confirm: !deletion.deleting && !deletion.confirmation_email.trim().is_empty(),
            can_cancel: !deletion.deleting,
        });

        PanelView::Profile(ProfileView {
            avatar,
            header,
            body,
            delete_dialog,
        })
    }
}

fn or_blank(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

impl fmt::Display for PanelView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = match self {
            PanelView::Loading => return writeln!(f, "Loading..."),
            PanelView::Deleted => return writeln!(f, "Account deleted."),
            PanelView::Profile(view) => view,
        };

        match &view.avatar {
            AvatarView::Picture(url) => write!(f, "[{url}] ")?,
            AvatarView::Initial(initial) => write!(f, "({}) ", or_blank(initial))?,
        }
        write!(f, "{}", or_blank(&view.header.display_name))?;
        if view.header.email_verified {
            write!(f, "  [Email Verified]")?;
        }
        writeln!(f)?;

        match &view.body {
            BodyView::Details(details) => {
                writeln!(f, "Username:    {}", or_blank(&details.username))?;
                writeln!(f, "Email:       {}", or_blank(&details.email))?;
                writeln!(f, "Created Via: {}", or_blank(&details.created_via))?;
                if let Some(providers) = &details.auth_providers {
                    writeln!(f, "Auth Providers: {}", providers.join(", "))?;
                }
            }
            BodyView::EditForm(form) => {
                writeln!(f, "Username*: {}", form.username)?;
            }
        }

        if let Some(dialog) = &view.delete_dialog {
            writeln!(f, "-- Delete Profile --")?;
            writeln!(
                f,
                "To confirm, please enter your email address: {}",
                or_blank(&dialog.target_email)
            )?;
            writeln!(f, "Email Address: {}", dialog.confirmation_email)?;
            if let Some(error) = &dialog.error {
                writeln!(f, "Error: {error}")?;
            }
            if dialog.deleting {
                writeln!(f, "Deleting...")?;
            }
        }
        Ok(())
    }
}
