use daynote_core::db::open_db_in_memory;
use daynote_core::forms::NON_FIELD_ERRORS;
use daynote_core::service::auth_service::{MSG_INVALID_LOGIN, MSG_USERNAME_TAKEN, MSG_USER_CREATED};
use daynote_core::service::todo_workflow::MSG_NOTE_CREATED;
use daynote_core::{
    AuthService, LoginForm, NoteForm, Redirect, RegisterForm, RequestContext,
    SqliteTodoRepository, SqliteUserRepository, TodoWorkflow, UserRepository, WorkflowError,
};

fn register_form(username: &str, password: &str, confirm: &str) -> RegisterForm {
    RegisterForm {
        username: Some(username.to_string()),
        password: Some(password.to_string()),
        password_confirm: Some(confirm.to_string()),
    }
}

fn login_form(username: &str, password: &str) -> LoginForm {
    LoginForm {
        username: Some(username.to_string()),
        password: Some(password.to_string()),
    }
}

#[test]
fn register_creates_hashed_user_and_logs_in() {
    let conn = open_db_in_memory().unwrap();
    let service = AuthService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let mut ctx = RequestContext::anonymous();
    let outcome = service
        .register(&mut ctx, &register_form("alice", "pw1", "pw1"))
        .unwrap()
        .accepted()
        .expect("registration accepted");

    assert_eq!(outcome.value.username, "alice");
    assert_ne!(outcome.value.password_hash, "pw1");
    assert!(outcome.value.last_login.is_some());
    assert_eq!(outcome.redirect, Redirect::EditPage);
    assert_eq!(ctx.user().map(|user| user.id), Some(outcome.value.id));
    assert_eq!(
        ctx.user().and_then(|user| user.last_login),
        outcome.value.last_login
    );
    let stored = SqliteUserRepository::try_new(&conn)
        .unwrap()
        .get_user(outcome.value.id)
        .unwrap()
        .expect("registered user stored");
    assert_eq!(stored, outcome.value);
    assert!(ctx.auth_changed());
    assert_eq!(ctx.pending_messages()[0].text, MSG_USER_CREATED);
}

#[test]
fn register_rejects_taken_username_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let service = AuthService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let mut ctx = RequestContext::anonymous();
    service
        .register(&mut ctx, &register_form("alice", "pw1", "pw1"))
        .unwrap();

    let mut other = RequestContext::anonymous();
    let submission = service
        .register(&mut other, &register_form("ALICE", "pw2", "pw2"))
        .unwrap();
    let errors = submission.errors().expect("duplicate must be rejected");
    assert_eq!(errors.field("username"), [MSG_USERNAME_TAKEN.to_string()]);
    assert!(!other.is_authenticated());
    assert!(other.pending_messages().is_empty());
}

#[test]
fn register_with_mismatched_passwords_creates_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let service = AuthService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let mut ctx = RequestContext::anonymous();
    let submission = service
        .register(&mut ctx, &register_form("alice", "pw1", "pw2"))
        .unwrap();
    assert!(!submission.is_accepted());
    assert!(repo.find_by_username("alice").unwrap().is_none());
}

#[test]
fn login_accepts_correct_credentials_only() {
    let conn = open_db_in_memory().unwrap();
    let service = AuthService::new(SqliteUserRepository::try_new(&conn).unwrap());
    service
        .register(
            &mut RequestContext::anonymous(),
            &register_form("alice", "pw1", "pw1"),
        )
        .unwrap();

    let mut wrong = RequestContext::anonymous();
    let submission = service.login(&mut wrong, &login_form("alice", "nope")).unwrap();
    let errors = submission.errors().expect("wrong password must be rejected");
    assert_eq!(errors.non_field(), [MSG_INVALID_LOGIN.to_string()]);
    assert!(!wrong.is_authenticated());

    let submission = service.login(&mut wrong, &login_form("ghost", "pw1")).unwrap();
    assert!(!submission.is_accepted());

    let mut ctx = RequestContext::anonymous();
    let outcome = service
        .login(&mut ctx, &login_form("alice", "pw1"))
        .unwrap()
        .accepted()
        .expect("login accepted");
    assert_eq!(outcome.value.username, "alice");
    assert_eq!(outcome.message, None);
    assert!(ctx.is_authenticated());
}

#[test]
fn login_errors_serialize_under_non_field_key() {
    let conn = open_db_in_memory().unwrap();
    let service = AuthService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let submission = service
        .login(&mut RequestContext::anonymous(), &login_form("ghost", "pw"))
        .unwrap();
    let json = serde_json::to_value(submission.errors().unwrap()).unwrap();
    assert_eq!(json[NON_FIELD_ERRORS][0], MSG_INVALID_LOGIN);
}

#[test]
fn logout_clears_user() {
    let conn = open_db_in_memory().unwrap();
    let service = AuthService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let mut ctx = RequestContext::anonymous();
    service
        .register(&mut ctx, &register_form("alice", "pw1", "pw1"))
        .unwrap();

    let outcome = service.logout(&mut ctx);
    assert_eq!(outcome.redirect, Redirect::EditPage);
    assert!(!ctx.is_authenticated());
}

#[test]
fn register_create_logout_then_foreign_update_is_refused() {
    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let workflow = TodoWorkflow::new(SqliteTodoRepository::try_new(&conn).unwrap());

    let mut session = RequestContext::anonymous();
    let alice = auth
        .register(&mut session, &register_form("alice", "pw1", "pw1"))
        .unwrap()
        .accepted()
        .expect("alice registered")
        .value;
    assert!(session.is_authenticated());

    let note_form = NoteForm {
        day: Some("Mon".to_string()),
        month: Some("6".to_string()),
        year: Some("2024".to_string()),
        time: None,
        task: Some("Buy milk".to_string()),
    };
    let note = workflow
        .create(&mut session, &note_form)
        .unwrap()
        .accepted()
        .expect("note created")
        .value;

    let all = workflow.list().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].author, Some(alice.id));
    let queued: Vec<&str> = session
        .pending_messages()
        .iter()
        .map(|message| message.text.as_str())
        .collect();
    assert_eq!(queued, vec![MSG_USER_CREATED, MSG_NOTE_CREATED]);

    auth.logout(&mut session);
    let edit = NoteForm {
        task: Some("Buy beer".to_string()),
        ..note_form.clone()
    };
    let err = workflow.update(&mut session, note.id, &edit).unwrap_err();
    assert!(err.is_authorization_failure());

    let mut bob_session = RequestContext::anonymous();
    auth.register(&mut bob_session, &register_form("bob", "pw2", "pw2"))
        .unwrap();
    let err = workflow.update(&mut bob_session, note.id, &edit).unwrap_err();
    assert!(matches!(err, WorkflowError::PermissionDenied(_)));

    assert_eq!(workflow.detail(note.id).unwrap(), note);
}
