mod common;

use common::setup_test_env;
use mapocket_core::{
    core::services::{BudgetService, ProjectService},
    core::{Collection, WorkspaceManager},
    domain::{BudgetPath, ProjectStatus},
    storage::{keys, FileStore, KeyValueStore, MemoryStore, Repository},
};

#[test]
fn workspace_survives_a_reload() {
    let (mut manager, _config, base) = setup_test_env();
    let ws = &mut manager.current;
    ProjectService::create(ws, "Move to Lyon", Some("moving"), None).unwrap();
    let project = ws.project_mut("Move to Lyon").unwrap();
    let first = project.categories[0].name.clone();
    BudgetService::add(project, &BudgetPath::category("Extras"), 120.0).unwrap();
    ProjectService::set_status(ws, "Move to Lyon", ProjectStatus::Completed).unwrap();
    manager.save_all().unwrap();

    let store = FileStore::new(Some(base), Some(3)).unwrap();
    let mut reloaded = WorkspaceManager::new(Box::new(store));
    let report = reloaded.load().unwrap();
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    let project = reloaded.current.project("move to lyon").unwrap();
    assert_eq!(project.project_status, ProjectStatus::Completed);
    assert_eq!(project.categories[0].name, first);
    assert!(project.category("Extras").is_some());
    assert!(project.discrepancies().is_empty());
}

#[test]
fn legacy_projects_are_migrated_once() {
    let legacy = r#"[
        {"id": 1690000000000, "name": "Old party", "totalBudget": "300",
         "categories": [{"name": "Food", "amount": "200"}, {"name": "Music", "amount": 100}]}
    ]"#;
    let store = MemoryStore::with_values([(keys::LEGACY_PROJECTS, legacy)]);
    let mut manager = WorkspaceManager::new(Box::new(store));
    let report = manager.load().unwrap();
    assert_eq!(report.migrations.len(), 1);
    let project = &manager.current.projects[0];
    assert_eq!(project.project_name, "Old party");
    assert_eq!(project.id.as_str(), "1690000000000");
    assert_eq!(project.total_budget, 300.0);

    manager.save(&[Collection::Projects]).unwrap();
    assert!(!manager.storage().contains(keys::LEGACY_PROJECTS).unwrap());
    assert!(manager.storage().contains(keys::PROJECTS_BACKUP).unwrap());

    let report = manager.load().unwrap();
    assert!(report.migrations.is_empty());
    assert_eq!(manager.current.projects.len(), 1);
}

#[test]
fn corrupt_projects_fall_back_to_the_mirror() {
    let mirror = r#"[{"id": "a1b2c3d4", "projectName": "Kept", "totalBudget": 50}]"#;
    let store = MemoryStore::with_values([
        (keys::PROJECTS, "{not json"),
        (keys::PROJECTS_BACKUP, mirror),
    ]);
    let report = Repository::new(&store).load_projects().unwrap();
    assert_eq!(report.value.len(), 1);
    assert_eq!(report.value[0].project_name, "Kept");
    assert!(!report.warnings.is_empty());
}

#[test]
fn malformed_records_are_skipped_not_fatal() {
    let store = MemoryStore::with_values([(
        keys::INVOICES,
        r#"[{"id": "x1", "number": "FAC-2025-001", "clientName": "Ok"}, 42]"#,
    )]);
    let mut manager = WorkspaceManager::new(Box::new(store));
    let report = manager.load().unwrap();
    assert_eq!(manager.current.invoices.len(), 1);
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn overwrites_keep_bounded_backups() {
    let (_manager, _config, base) = setup_test_env();
    let store = FileStore::new(Some(base), Some(2)).unwrap();
    for version in 0..4 {
        store
            .set(keys::WALLETS, &format!("[{{\"v\": {}}}]", version))
            .unwrap();
    }
    let backups = store.list_backups(keys::WALLETS).unwrap();
    assert!(!backups.is_empty());
    assert!(backups.len() <= 2);
    assert_eq!(
        store.get(keys::WALLETS).unwrap().as_deref(),
        Some("[{\"v\": 3}]")
    );
}

#[test]
fn config_backups_restore_previous_settings() {
    let (_manager, config_manager, _base) = setup_test_env();
    let mut config = config_manager.load().unwrap();
    config.set("locale", "en-US").unwrap();
    config_manager.save(&config).unwrap();
    let backup = config_manager.backup(&config, Some("english")).unwrap();

    config.set("locale", "de-DE").unwrap();
    config_manager.save(&config).unwrap();

    let restored = config_manager.restore(&backup).unwrap();
    assert_eq!(restored.locale, "en-US");
    assert!(config_manager.list_backups().unwrap().contains(&backup));
}

#[test]
fn unknown_statuses_survive_a_save() {
    let stored = r#"[
        {"id": "p1", "projectName": "Keep me", "projectStatus": "en_attente"},
        {"id": "p2", "projectName": "Half read", "totalBudget": {"value": 10}}
    ]"#;
    let store = MemoryStore::with_values([(keys::PROJECTS, stored)]);
    let mut manager = WorkspaceManager::new(Box::new(store));
    let report = manager.load().unwrap();
    assert_eq!(manager.current.projects.len(), 2);
    assert_eq!(report.warnings.len(), 2, "{:?}", report.warnings);

    manager.save(&[Collection::Projects]).unwrap();
    let report = manager.load().unwrap();
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    let kept = manager.current.project("Keep me").unwrap();
    assert_eq!(kept.project_status, ProjectStatus::InProgress);
    assert_eq!(manager.current.project("Half read").unwrap().total_budget, 0.0);
}
