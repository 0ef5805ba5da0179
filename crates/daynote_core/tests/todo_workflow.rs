use daynote_core::db::open_db_in_memory;
use daynote_core::service::todo_workflow::{MSG_NOTE_CREATED, MSG_NOTE_DELETED, MSG_NOTE_UPDATED};
use daynote_core::{
    DeleteNoticePolicy, NoteForm, Redirect, RequestContext, SqliteTodoRepository,
    SqliteUserRepository, Submission, Todo, TodoFields, TodoWorkflow, User, UserRepository,
    WorkflowError,
};
use rusqlite::Connection;

fn create_user(conn: &Connection, username: &str) -> User {
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .create_user(username, "$argon2id$placeholder")
        .unwrap()
}

fn note_form(day: &str, month: &str, year: &str, time: &str, task: &str) -> NoteForm {
    NoteForm {
        day: Some(day.to_string()),
        month: Some(month.to_string()),
        year: Some(year.to_string()),
        time: Some(time.to_string()),
        task: Some(task.to_string()),
    }
}

fn create_note(workflow: &TodoWorkflow<SqliteTodoRepository<'_>>, author: &User, task: &str) -> Todo {
    let mut ctx = RequestContext::authenticated(author.clone());
    workflow
        .create(&mut ctx, &note_form("Mon", "6", "2024", "", task))
        .unwrap()
        .accepted()
        .expect("valid note should be accepted")
        .value
}

#[test]
fn create_stores_fields_and_acting_author() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let workflow = TodoWorkflow::new(SqliteTodoRepository::try_new(&conn).unwrap());

    let mut ctx = RequestContext::authenticated(alice.clone());
    let outcome = workflow
        .create(&mut ctx, &note_form("Fri", "12", "2025", "18", "Dinner"))
        .unwrap()
        .accepted()
        .expect("accepted");

    let created = outcome.value;
    assert_eq!(created.author, Some(alice.id));
    assert_eq!(
        created.fields(),
        TodoFields {
            day: "Fri".to_string(),
            month: 12,
            year: 2025,
            time: Some(18),
            task: "Dinner".to_string(),
        }
    );
    assert_eq!(outcome.redirect, Redirect::EditPageFor(created.id));
    assert_eq!(
        outcome.message.map(|message| message.text).as_deref(),
        Some(MSG_NOTE_CREATED)
    );
    assert_eq!(ctx.pending_messages().len(), 1);
    assert_eq!(workflow.list().unwrap(), vec![created]);
}

#[test]
fn create_requires_authenticated_user() {
    let conn = open_db_in_memory().unwrap();
    let workflow = TodoWorkflow::new(SqliteTodoRepository::try_new(&conn).unwrap());

    let mut ctx = RequestContext::anonymous();
    let err = workflow
        .create(&mut ctx, &note_form("Mon", "6", "2024", "", "Buy milk"))
        .unwrap_err();
    assert!(matches!(err, WorkflowError::LoginRequired));
    assert!(workflow.list().unwrap().is_empty());
    assert!(matches!(
        workflow.create_page(&ctx).unwrap_err(),
        WorkflowError::LoginRequired
    ));
}

#[test]
fn invalid_create_returns_field_errors_and_persists_nothing() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let workflow = TodoWorkflow::new(SqliteTodoRepository::try_new(&conn).unwrap());

    let mut ctx = RequestContext::authenticated(alice);
    let submission = workflow
        .create(&mut ctx, &note_form("", "six", "2024", "", ""))
        .unwrap();

    let errors = submission.errors().expect("form should be rejected");
    assert!(errors.has_field("day"));
    assert!(errors.has_field("month"));
    assert!(errors.has_field("task"));
    assert!(!errors.has_field("year"));
    assert!(ctx.pending_messages().is_empty());
    assert!(workflow.list().unwrap().is_empty());
}

#[test]
fn non_author_cannot_update_or_delete() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let bob = create_user(&conn, "bob");
    let workflow = TodoWorkflow::new(SqliteTodoRepository::try_new(&conn).unwrap());
    let note = create_note(&workflow, &alice, "Buy milk");

    let mut bob_ctx = RequestContext::authenticated(bob);
    let err = workflow
        .update(
            &mut bob_ctx,
            note.id,
            &note_form("Sun", "1", "1999", "1", "hijacked"),
        )
        .unwrap_err();
    assert!(matches!(err, WorkflowError::PermissionDenied(id) if id == note.id));

    let err = workflow.delete(&mut bob_ctx, note.id).unwrap_err();
    assert!(matches!(err, WorkflowError::PermissionDenied(_)));
    assert!(err.is_authorization_failure());

    let err = workflow.edit_page(&bob_ctx, note.id).unwrap_err();
    assert!(matches!(err, WorkflowError::PermissionDenied(_)));

    assert_eq!(workflow.detail(note.id).unwrap(), note);
    assert!(bob_ctx.pending_messages().is_empty());
}

#[test]
fn author_update_overwrites_fields_and_keeps_author() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let workflow = TodoWorkflow::new(SqliteTodoRepository::try_new(&conn).unwrap());
    let note = create_note(&workflow, &alice, "Buy milk");

    let mut ctx = RequestContext::authenticated(alice.clone());
    assert_eq!(workflow.edit_page(&ctx, note.id).unwrap(), note);

    let outcome = workflow
        .update(&mut ctx, note.id, &note_form("Tue", "7", "2024", "9", "Buy bread"))
        .unwrap()
        .accepted()
        .expect("accepted");

    let updated = workflow.detail(note.id).unwrap();
    assert_eq!(updated, outcome.value);
    assert_eq!(updated.author, Some(alice.id));
    assert_eq!(updated.day, "Tue");
    assert_eq!(updated.month, 7);
    assert_eq!(updated.time, Some(9));
    assert_eq!(updated.task, "Buy bread");
    assert_eq!(outcome.redirect, Redirect::EditPageFor(note.id));
    assert_eq!(ctx.pending_messages()[0].text, MSG_NOTE_UPDATED);
}

#[test]
fn invalid_update_by_author_leaves_note_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let workflow = TodoWorkflow::new(SqliteTodoRepository::try_new(&conn).unwrap());
    let note = create_note(&workflow, &alice, "Buy milk");

    let mut ctx = RequestContext::authenticated(alice);
    let long_day = "d".repeat(26);
    let submission = workflow
        .update(&mut ctx, note.id, &note_form(&long_day, "7", "2024", "", "x"))
        .unwrap();
    assert!(matches!(submission, Submission::Invalid(_)));
    assert_eq!(workflow.detail(note.id).unwrap(), note);
}

#[test]
fn author_delete_removes_note_and_detail_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let workflow = TodoWorkflow::new(SqliteTodoRepository::try_new(&conn).unwrap());
    let note = create_note(&workflow, &alice, "Buy milk");

    let mut ctx = RequestContext::authenticated(alice);
    let outcome = workflow.delete(&mut ctx, note.id).unwrap();
    assert_eq!(outcome.value, note);
    assert_eq!(outcome.redirect, Redirect::EditPage);
    assert_eq!(ctx.pending_messages()[0].text, MSG_NOTE_DELETED);

    assert!(matches!(
        workflow.detail(note.id).unwrap_err(),
        WorkflowError::NotFound(id) if id == note.id
    ));
    assert!(matches!(
        workflow.delete(&mut ctx, note.id).unwrap_err(),
        WorkflowError::NotFound(_)
    ));
}

#[test]
fn list_returns_survivors_in_ascending_id_order() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let bob = create_user(&conn, "bob");
    let workflow = TodoWorkflow::new(SqliteTodoRepository::try_new(&conn).unwrap());

    let first = create_note(&workflow, &alice, "first");
    let second = create_note(&workflow, &bob, "second");
    let third = create_note(&workflow, &alice, "third");

    let mut bob_ctx = RequestContext::authenticated(bob);
    workflow.delete(&mut bob_ctx, second.id).unwrap();
    let mut alice_ctx = RequestContext::authenticated(alice.clone());
    workflow
        .update(&mut alice_ctx, first.id, &note_form("Wed", "6", "2024", "", "first v2"))
        .unwrap();
    let fourth = create_note(&workflow, &alice, "fourth");

    let ids: Vec<i64> = workflow.list().unwrap().iter().map(|todo| todo.id).collect();
    assert_eq!(ids, vec![first.id, third.id, fourth.id]);
    assert!(first.id < third.id && third.id < fourth.id);
    assert_eq!(workflow.create_page(&alice_ctx).unwrap().len(), 3);
}

#[test]
fn ids_are_not_reused_after_delete() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let workflow = TodoWorkflow::new(SqliteTodoRepository::try_new(&conn).unwrap());

    let first = create_note(&workflow, &alice, "first");
    let mut ctx = RequestContext::authenticated(alice.clone());
    workflow.delete(&mut ctx, first.id).unwrap();
    let second = create_note(&workflow, &alice, "second");
    assert!(second.id > first.id);
}

#[test]
fn before_authorization_policy_notifies_even_when_delete_is_refused() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let bob = create_user(&conn, "bob");
    let workflow = TodoWorkflow::with_policy(
        SqliteTodoRepository::try_new(&conn).unwrap(),
        DeleteNoticePolicy::BeforeAuthorization,
    );
    let note = create_note(&workflow, &alice, "Buy milk");

    let mut bob_ctx = RequestContext::authenticated(bob);
    workflow.delete(&mut bob_ctx, note.id).unwrap_err();
    assert_eq!(bob_ctx.pending_messages().len(), 1);
    assert_eq!(bob_ctx.pending_messages()[0].text, MSG_NOTE_DELETED);
    assert!(workflow.detail(note.id).is_ok());

    let mut alice_ctx = RequestContext::authenticated(alice);
    workflow.delete(&mut alice_ctx, note.id).unwrap();
    assert_eq!(alice_ctx.pending_messages().len(), 1);
}

#[test]
fn anonymous_pages_and_mutations_require_login() {
    let conn = open_db_in_memory().unwrap();
    let alice = create_user(&conn, "alice");
    let workflow = TodoWorkflow::new(SqliteTodoRepository::try_new(&conn).unwrap());
    let note = create_note(&workflow, &alice, "Buy milk");

    let mut anon = RequestContext::anonymous();
    for err in [
        workflow.edit_page(&anon, note.id).unwrap_err(),
        workflow.delete_page(&anon, note.id).unwrap_err(),
        workflow
            .update(&mut anon, note.id, &note_form("Mon", "1", "2024", "", "x"))
            .unwrap_err(),
        workflow.delete(&mut anon, note.id).unwrap_err(),
    ] {
        assert!(matches!(err, WorkflowError::LoginRequired), "{err}");
    }
    assert!(anon.pending_messages().is_empty());
    assert_eq!(workflow.detail(note.id).unwrap(), note);
}
