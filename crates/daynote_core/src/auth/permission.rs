//! Authorship gate for note mutations.

use crate::model::todo::Todo;
use crate::model::user::User;

/// Returns whether `user` may update or delete `note`.
///
/// Only the author may mutate a note; notes without an author are immutable
/// through the workflow.
pub fn can_modify(user: &User, note: &Todo) -> bool {
    note.is_authored_by(user.id)
}
