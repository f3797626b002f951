use crm_core::{
    ChangeEvent, ChangeNotifier, DashboardTab, DomainError, MemoryKeyValueBackend, Role,
    SqliteKeyValueBackend, ValidationError,
};
use std::sync::{Arc, Mutex};

fn memory_tab(hub: &Arc<ChangeNotifier>) -> DashboardTab<MemoryKeyValueBackend> {
    DashboardTab::with_backend(MemoryKeyValueBackend::new(), hub, 5.0)
}

#[test]
fn register_then_login_sets_session_to_registered_user() {
    let hub = Arc::new(ChangeNotifier::new("crm"));
    let tab = memory_tab(&hub);
    let repo = tab.repo();

    for (email, name) in [("a@x.com", "A"), ("Mixed.Case@Y.org", "Bee"), ("c@z.io", "C c")] {
        let user = repo.register_user(email, name, Role::Referrer).unwrap();
        let logged_in = repo.login_user(email).unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(tab.current_user().unwrap().id, user.id);
    }
}

#[test]
fn register_rejects_email_differing_only_in_case() {
    let hub = Arc::new(ChangeNotifier::new("crm"));
    let tab = memory_tab(&hub);
    let repo = tab.repo();

    repo.register_user("a@x.com", "A", Role::Admin).unwrap();
    let err = repo
        .register_user("A@X.COM", "Another", Role::Customer)
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
    assert_eq!(repo.list_users().len(), 1);
}

#[test]
fn register_requires_email_and_name() {
    let hub = Arc::new(ChangeNotifier::new("crm"));
    let tab = memory_tab(&hub);

    let err = tab.repo().register_user("", "A", Role::Admin).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationError::MissingField("email"))
    ));
    let err = tab
        .repo()
        .register_user("a@x.com", "   ", Role::Admin)
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationError::MissingField("name"))
    ));
    assert!(tab.repo().list_users().is_empty());
}

#[test]
fn login_unknown_email_fails_and_keeps_session() {
    let hub = Arc::new(ChangeNotifier::new("crm"));
    let tab = memory_tab(&hub);
    let repo = tab.repo();
    let user = repo.register_user("a@x.com", "A", Role::Admin).unwrap();
    repo.login_user("a@x.com").unwrap();

    let err = repo.login_user("nobody@x.com").unwrap_err();
    assert!(matches!(err, DomainError::NotFound { kind: "user", .. }));
    assert_eq!(tab.current_user().unwrap().id, user.id);
}

#[test]
fn session_is_tab_scoped_and_login_broadcasts_auth_event() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crm.db");
    let hub = Arc::new(ChangeNotifier::new("crm"));
    let tab_a = DashboardTab::with_backend(SqliteKeyValueBackend::open(&path).unwrap(), &hub, 5.0);
    let tab_b = DashboardTab::with_backend(SqliteKeyValueBackend::open(&path).unwrap(), &hub, 5.0);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let observer = hub.open_context();
    hub.subscribe(observer, move |event: &ChangeEvent| {
        sink.lock().unwrap().push(event.clone());
    });

    let user = tab_a
        .repo()
        .register_user("a@x.com", "A", Role::Referrer)
        .unwrap();
    tab_a.repo().login_user("a@x.com").unwrap();

    assert!(tab_b.current_user().is_none());
    assert_eq!(tab_b.repo().find_user_by_email("A@x.com").unwrap().id, user.id);
    assert_eq!(tab_b.sync_status().last_event, Some("auth-changed"));

    tab_a.repo().logout().unwrap();
    assert!(tab_a.current_user().is_none());
    let events = seen.lock().unwrap();
    assert!(events.contains(&ChangeEvent::AuthChanged {
        user_id: Some(user.id.clone())
    }));
    assert_eq!(events.last(), Some(&ChangeEvent::AuthCleared));
}

#[test]
fn session_snapshot_goes_stale_after_store_changes() {
    let hub = Arc::new(ChangeNotifier::new("crm"));
    let tab = memory_tab(&hub);
    let repo = tab.repo();
    repo.register_user("a@x.com", "A", Role::Admin).unwrap();
    repo.login_user("a@x.com").unwrap();

    repo.store()
        .write(crm_core::Collection::Users, &Vec::<crm_core::User>::new())
        .unwrap();

    assert!(repo.list_users().is_empty());
    assert_eq!(tab.current_user().unwrap().email, "a@x.com");
}
