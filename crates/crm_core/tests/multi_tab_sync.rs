use crm_core::{
    admin_overview, referrer_summary, ChangeEvent, ChangeNotifier, ChannelMessage, Collection,
    CoreConfig, DashboardTab, NewProject, Project, ProjectPatch, ProjectStatus, Role,
    SubscribeOptions,
};
use std::path::Path;
use std::sync::{Arc, Mutex};

fn open_tab(path: &Path, hub: &Arc<ChangeNotifier>) -> DashboardTab {
    let config = CoreConfig {
        db_path: path.to_path_buf(),
        ..CoreConfig::default()
    };
    DashboardTab::open(&config, hub).unwrap()
}

#[test]
fn write_in_one_tab_is_visible_and_announced_in_another() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crm.db");
    let hub = Arc::new(ChangeNotifier::new("crm"));
    let tab_a = open_tab(&path, &hub);
    let tab_b = open_tab(&path, &hub);

    let user = tab_a
        .repo()
        .register_user("a@x.com", "A", Role::Admin)
        .unwrap();

    let status = tab_b.sync_status();
    assert_eq!(status.events_received, 1);
    assert_eq!(status.last_event, Some("data-changed"));
    assert_eq!(status.last_collection, Some(Collection::Users));
    assert!(tab_b.take_refresh());
    assert!(!tab_b.take_refresh());
    assert_eq!(tab_b.repo().get_user(&user.id).unwrap().email, "a@x.com");

    assert_eq!(tab_a.sync_status().events_received, 0);
}

#[test]
fn broadcast_carries_sync_message_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crm.db");
    let hub = Arc::new(ChangeNotifier::new("crm"));
    let tab = open_tab(&path, &hub);

    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    hub.subscribe_with(
        tab.context(),
        SubscribeOptions { include_own: true },
        move |event: &ChangeEvent| {
            let message = serde_json::to_value(ChannelMessage::from(event)).unwrap();
            sink.lock().unwrap().push(message);
        },
    );

    tab.repo()
        .register_user("a@x.com", "A", Role::Referrer)
        .unwrap();

    let messages = messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["type"], "sync");
    assert_eq!(messages[0]["key"], "users");
    assert!(messages[0]["ts"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn interleaved_read_modify_write_loses_the_earlier_update() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crm.db");
    let hub = Arc::new(ChangeNotifier::new("crm"));
    let tab_a = open_tab(&path, &hub);
    let tab_b = open_tab(&path, &hub);

    let customer = tab_a
        .repo()
        .register_user("c@x.com", "C", Role::Customer)
        .unwrap();
    let project = tab_a
        .repo()
        .add_project(&customer.id, NewProject::default())
        .unwrap();

    // Tab A reads, tab B commits, then tab A writes its stale copy back.
    let mut stale: Vec<Project> = tab_a.repo().list_projects();
    tab_b
        .repo()
        .update_project(
            &project.id,
            ProjectPatch {
                plot: Some("Lot 9".to_string()),
                ..ProjectPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    stale[0].location = "River Rd".to_string();
    tab_a
        .repo()
        .store()
        .write(Collection::Projects, &stale)
        .unwrap();

    let stored = tab_b.repo().get_project(&project.id).unwrap();
    assert_eq!(stored.location, "River Rd");
    assert_eq!(stored.plot, "");
}

#[test]
fn clear_all_empties_store_and_only_resets_own_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crm.db");
    let hub = Arc::new(ChangeNotifier::new("crm"));
    let tab_a = open_tab(&path, &hub);
    let tab_b = open_tab(&path, &hub);

    assert!(tab_a.start().unwrap());
    tab_a
        .repo()
        .login_user(crm_core::service::seed_service::DEMO_ADMIN_EMAIL)
        .unwrap();
    tab_b
        .repo()
        .login_user(crm_core::service::seed_service::DEMO_CUSTOMER_EMAIL)
        .unwrap();

    tab_a.repo().clear_all().unwrap();

    assert!(tab_a.current_user().is_none());
    assert!(tab_b.current_user().is_some());
    assert_eq!(tab_b.sync_status().last_event, Some("store-cleared"));
    for collection in Collection::ALL {
        let raw = tab_b.repo().store().backend().connection().query_row(
            "SELECT COUNT(*) FROM kv_items WHERE key = ?1;",
            [collection.key()],
            |row| row.get::<_, i64>(0),
        );
        assert_eq!(raw.unwrap(), 0);
    }
    assert!(tab_b.repo().list_users().is_empty());
    assert_eq!(tab_b.repo().read_defaults().default_commission, 5.0);
}

#[test]
fn seed_runs_once_per_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crm.db");
    let hub = Arc::new(ChangeNotifier::new("crm"));
    let tab_a = open_tab(&path, &hub);
    let tab_b = open_tab(&path, &hub);

    assert!(tab_a.start().unwrap());
    assert!(!tab_b.start().unwrap());

    let repo = tab_b.repo();
    let users = repo.list_users();
    assert_eq!(users.len(), 3);
    for role in Role::ALL {
        assert_eq!(users.iter().filter(|u| u.role == role).count(), 1);
    }
    assert_eq!(repo.list_leads().len(), 1);
    let projects = repo.list_projects();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].stages.iter().filter(|s| s.done).count(), 1);
    assert!(projects[0].stage("foundation").unwrap().done);
    assert_eq!(projects[0].status, ProjectStatus::Pending);
}

#[test]
fn corrupt_collection_reads_as_empty_until_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crm.db");
    let hub = Arc::new(ChangeNotifier::new("crm"));
    let tab = open_tab(&path, &hub);

    tab.repo()
        .store()
        .backend()
        .connection()
        .execute(
            "INSERT INTO kv_items (key, value) VALUES ('users', '[{\"id\":');",
            [],
        )
        .unwrap();

    assert!(tab.repo().list_users().is_empty());
    tab.repo()
        .register_user("a@x.com", "A", Role::Admin)
        .unwrap();
    assert_eq!(tab.repo().list_users().len(), 1);
}

#[test]
fn dropped_tab_stops_listening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crm.db");
    let hub = Arc::new(ChangeNotifier::new("crm"));
    let tab_a = open_tab(&path, &hub);
    let tab_b = open_tab(&path, &hub);
    assert_eq!(hub.subscriber_count(), 2);

    drop(tab_b);
    assert_eq!(hub.subscriber_count(), 1);
    tab_a
        .repo()
        .register_user("a@x.com", "A", Role::Admin)
        .unwrap();
}

#[test]
fn dashboard_views_follow_other_tab_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crm.db");
    let hub = Arc::new(ChangeNotifier::new("crm"));
    let writer = open_tab(&path, &hub);
    let viewer = open_tab(&path, &hub);

    let referrer = writer
        .repo()
        .register_user("r@x.com", "R", Role::Referrer)
        .unwrap();
    let lead = writer.repo().add_lead(&referrer.id, "l1@y.com", "").unwrap();
    writer.repo().add_lead(&referrer.id, "l2@y.com", "").unwrap();
    let project = writer
        .repo()
        .convert_lead_to_project(&lead.id, "L One", 42_000.0)
        .unwrap();
    writer
        .repo()
        .update_project(
            &project.id,
            ProjectPatch {
                commission_percent: Some(7.0),
                ..ProjectPatch::default()
            },
        )
        .unwrap();

    let summary = referrer_summary(viewer.repo(), &referrer.id);
    assert_eq!(summary.total_leads, 2);
    assert_eq!(summary.converted_leads, 1);
    assert_eq!(summary.new_leads, 1);
    assert_eq!(summary.referred_projects, 1);
    assert_eq!(summary.total_commission, 2940);

    let overview = admin_overview(viewer.repo());
    assert_eq!(overview.users_by_role["referrer"], 1);
    assert_eq!(overview.users_by_role["customer"], 1);
    assert_eq!(overview.projects_by_status["pending"], 1);
    assert_eq!(overview.leads_by_status["converted"], 1);
    assert_eq!(overview.awaiting_verification, 1);
    assert_eq!(overview.pipeline_budget, 42_000.0);
}
