//! Todo workflow controller.
//!
//! # Responsibility
//! - Orchestrate list/detail/create/update/delete over a `TodoRepository`.
//! - Enforce authentication and authorship before any mutation.
//! - Emit user-facing outcome notifications.
//!
//! # Invariants
//! - `author` is taken from the acting context at creation and never changed.
//! - Update/delete call `can_modify` before touching storage.
//! - Invalid form input never reaches storage.

use crate::auth::permission::can_modify;
use crate::context::{FlashMessage, Outcome, Redirect, RequestContext, Submission};
use crate::forms::note_form::NoteForm;
use crate::forms::Form;
use crate::model::todo::{Todo, TodoId};
use crate::model::user::User;
use crate::repo::todo_repo::TodoRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MSG_NOTE_CREATED: &str = "Заметка создана";
pub const MSG_NOTE_UPDATED: &str = "Заметка обновлена";
pub const MSG_NOTE_DELETED: &str = "Заметка удалена";

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Failure of a workflow operation.
#[derive(Debug)]
pub enum WorkflowError {
    /// The operation needs an authenticated user and there is none.
    LoginRequired,
    /// The acting user is not the author of the note.
    PermissionDenied(TodoId),
    NotFound(TodoId),
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl WorkflowError {
    /// True for both anonymous access and author mismatch.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, Self::LoginRequired | Self::PermissionDenied(_))
    }
}

impl Display for WorkflowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoginRequired => write!(f, "authentication required"),
            Self::PermissionDenied(id) => write!(f, "no permission to modify note {id}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for WorkflowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for WorkflowError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "todo",
                id,
            } => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// When the delete notification is queued relative to the authorship check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteNoticePolicy {
    /// Notify only after the note was actually removed.
    #[default]
    AfterSuccess,
    /// Notify as soon as a delete is requested, even if it is then refused.
    BeforeAuthorization,
}

impl DeleteNoticePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AfterSuccess => "after_success",
            Self::BeforeAuthorization => "before_authorization",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "after_success" => Some(Self::AfterSuccess),
            "before_authorization" => Some(Self::BeforeAuthorization),
            _ => None,
        }
    }
}

/// Workflow controller over a note repository.
pub struct TodoWorkflow<R: TodoRepository> {
    repo: R,
    delete_notice: DeleteNoticePolicy,
}

impl<R: TodoRepository> TodoWorkflow<R> {
    /// Creates a workflow with the default delete notification policy.
    pub fn new(repo: R) -> Self {
        Self::with_policy(repo, DeleteNoticePolicy::default())
    }

    pub fn with_policy(repo: R, delete_notice: DeleteNoticePolicy) -> Self {
        Self {
            repo,
            delete_notice,
        }
    }

    /// All notes ordered by ascending id.
    pub fn list(&self) -> WorkflowResult<Vec<Todo>> {
        Ok(self.repo.list_todos()?)
    }

    pub fn detail(&self, id: TodoId) -> WorkflowResult<Todo> {
        self.repo.get_todo(id)?.ok_or(WorkflowError::NotFound(id))
    }

    /// Data for the create page: every note, for the authenticated user only.
    pub fn create_page(&self, ctx: &RequestContext) -> WorkflowResult<Vec<Todo>> {
        require_user(ctx)?;
        self.list()
    }

    /// Creates a note authored by the acting user.
    pub fn create(
        &self,
        ctx: &mut RequestContext,
        form: &NoteForm,
    ) -> WorkflowResult<Submission<Todo>> {
        let author = require_user(ctx)?.id;
        let fields = match form.validate() {
            Ok(fields) => fields,
            Err(errors) => {
                info!("event=todo_create module=workflow status=invalid author_id={author}");
                return Ok(Submission::Invalid(errors));
            }
        };

        let id = self.repo.create_todo(&fields, author)?;
        let created = self
            .repo
            .get_todo(id)?
            .ok_or(WorkflowError::InconsistentState(
                "created note not found in read-back",
            ))?;
        info!("event=todo_create module=workflow status=ok todo_id={id} author_id={author}");

        Ok(Submission::Accepted(accepted(
            ctx,
            created,
            Redirect::EditPageFor(id),
            MSG_NOTE_CREATED,
        )))
    }

    /// Data for the edit page. Only the author may open it.
    pub fn edit_page(&self, ctx: &RequestContext, id: TodoId) -> WorkflowResult<Todo> {
        let user = require_user(ctx)?;
        let note = self.detail(id)?;
        authorize(user, &note, "todo_edit_page")?;
        Ok(note)
    }

    /// Overwrites every editable field of a note owned by the acting user.
    pub fn update(
        &self,
        ctx: &mut RequestContext,
        id: TodoId,
        form: &NoteForm,
    ) -> WorkflowResult<Submission<Todo>> {
        let user = require_user(ctx)?;
        let note = self.detail(id)?;
        authorize(user, &note, "todo_update")?;

        let fields = match form.validate() {
            Ok(fields) => fields,
            Err(errors) => {
                info!("event=todo_update module=workflow status=invalid todo_id={id}");
                return Ok(Submission::Invalid(errors));
            }
        };

        self.repo.update_todo(id, &fields)?;
        let updated = self
            .repo
            .get_todo(id)?
            .ok_or(WorkflowError::InconsistentState(
                "updated note not found in read-back",
            ))?;
        info!("event=todo_update module=workflow status=ok todo_id={id}");

        Ok(Submission::Accepted(accepted(
            ctx,
            updated,
            Redirect::EditPageFor(id),
            MSG_NOTE_UPDATED,
        )))
    }

    /// Data for the delete confirmation page.
    pub fn delete_page(&self, ctx: &RequestContext, id: TodoId) -> WorkflowResult<Todo> {
        require_user(ctx)?;
        self.detail(id)
    }

    /// Removes a note owned by the acting user and returns its last state.
    pub fn delete(&self, ctx: &mut RequestContext, id: TodoId) -> WorkflowResult<Outcome<Todo>> {
        require_user(ctx)?;
        if self.delete_notice == DeleteNoticePolicy::BeforeAuthorization {
            ctx.notify(FlashMessage::success(MSG_NOTE_DELETED));
        }

        let note = self.detail(id)?;
        let user = require_user(ctx)?;
        authorize(user, &note, "todo_delete")?;

        self.repo.delete_todo(id)?;
        info!("event=todo_delete module=workflow status=ok todo_id={id}");

        let message = FlashMessage::success(MSG_NOTE_DELETED);
        if self.delete_notice == DeleteNoticePolicy::AfterSuccess {
            ctx.notify(message.clone());
        }
        Ok(Outcome {
            value: note,
            redirect: Redirect::EditPage,
            message: Some(message),
        })
    }
}

fn require_user(ctx: &RequestContext) -> WorkflowResult<&User> {
    ctx.user().ok_or(WorkflowError::LoginRequired)
}

fn authorize(user: &User, note: &Todo, event: &str) -> WorkflowResult<()> {
    if can_modify(user, note) {
        return Ok(());
    }
    warn!(
        "event={event} module=workflow status=denied todo_id={} user_id={}",
        note.id, user.id
    );
    Err(WorkflowError::PermissionDenied(note.id))
}

fn accepted(
    ctx: &mut RequestContext,
    value: Todo,
    redirect: Redirect,
    text: &str,
) -> Outcome<Todo> {
    let message = FlashMessage::success(text);
    ctx.notify(message.clone());
    Outcome {
        value,
        redirect,
        message: Some(message),
    }
}
