use minehost_core::{Action, CoreError, HostConfig, LifecycleState, Manager, Outcome};
use minehost_engine::EngineTimeouts;
use minehost_store::{Edition, LogKind, NewServer, ServerStatus};

// Nothing listens on port 1, so every engine call fails fast.
fn offline_engine_config(dir: &std::path::Path) -> HostConfig {
    let mut config = HostConfig::default()
        .with_store_dir(Some(dir.to_path_buf()))
        .with_engine_url(Some("http://127.0.0.1:1"));
    config.engine.timeouts = EngineTimeouts {
        create_secs: 2,
        start_secs: 2,
        lifecycle_secs: 2,
        inspect_secs: 2,
    };
    config
}

fn creative(owner: &str) -> NewServer {
    NewServer {
        owner: owner.to_owned(),
        name: "creative".to_owned(),
        ip: "198.51.100.4".to_owned(),
        edition: Edition::Bedrock,
        version: "1.20.1".to_owned(),
        max_players: 10,
    }
}

#[test]
fn no_store_dir_means_no_manager() {
    let config = HostConfig::default();
    assert!(Manager::from_config(&config).unwrap().is_none());
}

#[test]
fn invalid_engine_url_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = HostConfig::default()
        .with_store_dir(Some(dir.path().to_path_buf()))
        .with_engine_url(Some("unix:///var/run/docker.sock"));
    assert!(matches!(
        Manager::from_config(&config),
        Err(CoreError::Config(_))
    ));
}

#[test]
fn file_backed_lifecycle_without_engine() {
    let dir = tempfile::tempdir().unwrap();
    let manager = Manager::from_config(&offline_engine_config(dir.path()))
        .unwrap()
        .unwrap();

    let record = manager.register(&creative("alice")).unwrap();
    assert_eq!(record.id.as_str(), "1");
    assert_eq!(record.port, 25565);
    assert_eq!(record.status, None);

    let outcome = manager.apply(&record.id, Action::Create).unwrap();
    assert!(matches!(outcome, Outcome::Created(_)));
    assert!(outcome.is_degraded());
    assert_eq!(manager.get(&record.id).unwrap().status, None);

    let outcome = manager.apply(&record.id, Action::Start).unwrap();
    assert!(outcome.is_degraded());
    assert_eq!(outcome.message(), "Server start (simulation mode)");
    assert_eq!(
        manager.get(&record.id).unwrap().status,
        Some(ServerStatus::Online)
    );

    let observed = manager.status(&record.id).unwrap();
    assert_eq!(observed.status, LifecycleState::Online);
    assert!(observed.simulated);

    let logs = manager.logs(&record.id, 100).unwrap();
    let messages: Vec<&str> = logs.iter().map(|l| l.message.as_str()).collect();
    assert_eq!(messages.len(), 4);
    assert!(messages[0].starts_with("Status check failed: "));
    assert!(messages[1].starts_with("Container start failed: "));
    assert!(messages[2].starts_with("Failed to create container: "));
    assert_eq!(messages[3], "Server creative created successfully");
    assert_eq!(logs[3].kind, LogKind::Info);
}

#[test]
fn state_survives_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = offline_engine_config(dir.path());

    let id = {
        let manager = Manager::from_config(&config).unwrap().unwrap();
        let record = manager.register(&creative("bob")).unwrap();
        manager.apply(&record.id, Action::Stop).unwrap();
        record.id
    };

    let manager = Manager::from_config(&config).unwrap().unwrap();
    assert_eq!(
        manager.get(&id).unwrap().status,
        Some(ServerStatus::Offline)
    );
    assert_eq!(manager.list("bob").unwrap().len(), 1);
    assert!(manager.list("carol").unwrap().is_empty());
    assert_eq!(manager.logs(&id, 100).unwrap().len(), 2);
}
