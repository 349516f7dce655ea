use crate::layout::StoreLayout;
use crate::lock::StoreLock;
use crate::logs::{LogEntry, Transition};
use crate::records::{allocate_port, next_id, sort_newest_first, NewServer, ServerId, ServerRecord};
use crate::{fsync_dir, ServerStore, StoreError};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// File-backed [`ServerStore`].
///
/// Records are JSON files replaced atomically (temp file, rename, dir fsync);
/// logs are JSON lines appended per server. All writes run under the store
/// lock so concurrent processes sharing a data directory see whole commits.
pub struct FileStore {
    layout: StoreLayout,
}

impl FileStore {
    /// Open (and initialize if needed) the store rooted at `layout`.
    pub fn open(layout: StoreLayout) -> Result<Self, StoreError> {
        layout.initialize()?;
        Ok(Self { layout })
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    fn lock(&self) -> Result<StoreLock, StoreError> {
        StoreLock::acquire(&self.layout.lock_file())
    }

    fn read_record(&self, id: &ServerId) -> Result<ServerRecord, StoreError> {
        let path = self.layout.server_path(id.as_str());
        if !path.exists() {
            return Err(StoreError::ServerNotFound(id.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        let record: ServerRecord = serde_json::from_str(&content)?;
        record.verify()?;
        Ok(record)
    }

    fn write_record(&self, record: &ServerRecord) -> Result<(), StoreError> {
        let sealed = record.with_checksum()?;
        let content = serde_json::to_string_pretty(&sealed)?;

        let dir = self.layout.servers_dir();
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.layout.server_path(record.id.as_str()))
            .map_err(|e| StoreError::Io(e.error))?;
        fsync_dir(&dir)?;
        Ok(())
    }

    fn append_log(&self, entry: &LogEntry) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.layout.log_path(entry.server_id.as_str()))?;
        file.write_all(line.as_bytes())?;
        file.sync_data()?;
        Ok(())
    }

    /// Every readable record; unreadable ones are skipped with a warning.
    fn read_all(&self) -> Result<Vec<ServerRecord>, StoreError> {
        let mut records = Vec::new();
        for id in ids_in(&self.layout.servers_dir(), ".json")? {
            match self.read_record(&id) {
                Ok(record) => records.push(record),
                Err(e) => warn!("skipping unreadable server record '{id}': {e}"),
            }
        }
        Ok(records)
    }

    /// Every record, failing on the first one that does not verify.
    fn read_all_strict(&self) -> Result<Vec<ServerRecord>, StoreError> {
        ids_in(&self.layout.servers_dir(), ".json")?
            .iter()
            .map(|id| self.read_record(id))
            .collect()
    }

    /// Ids that own a record file or a log file.
    fn known_ids(&self) -> Result<Vec<ServerId>, StoreError> {
        let mut ids = ids_in(&self.layout.servers_dir(), ".json")?;
        ids.extend(ids_in(&self.layout.logs_dir(), ".jsonl")?);
        Ok(ids)
    }
}

fn ids_in(dir: &Path, suffix: &str) -> Result<Vec<ServerId>, StoreError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut ids = Vec::new();
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(suffix)) else {
            continue;
        };
        if let Ok(id) = ServerId::parse(stem) {
            ids.push(id);
        }
    }
    Ok(ids)
}

impl ServerStore for FileStore {
    fn get(&self, id: &ServerId) -> Result<ServerRecord, StoreError> {
        self.read_record(id)
    }

    fn list(&self, owner: &str) -> Result<Vec<ServerRecord>, StoreError> {
        let mut records: Vec<ServerRecord> = self
            .read_all()?
            .into_iter()
            .filter(|r| r.owner == owner)
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    fn register(&self, new: &NewServer) -> Result<ServerRecord, StoreError> {
        new.validate()?;
        let _lock = self.lock()?;

        // A record that fails verification still owns its id and port.
        let existing = self.read_all_strict()?;
        let taken = self.known_ids()?;
        let id = next_id(existing.iter().map(|r| &r.id).chain(taken.iter()));
        let used: Vec<u16> = existing.iter().map(|r| r.port).collect();
        let port = allocate_port(&used)?;

        let now = chrono::Utc::now().to_rfc3339();
        let record = new.clone().into_record(id, port, &now);
        self.write_record(&record)?;
        let created = Transition::info(format!("Server {} created successfully", record.name))
            .entry(&record.id, &now);
        if let Err(e) = self.append_log(&created) {
            let _ = fs::remove_file(self.layout.server_path(record.id.as_str()));
            return Err(e);
        }

        debug!("registered server {} on port {}", record.id, record.port);
        Ok(record)
    }

    fn commit(&self, id: &ServerId, transition: &Transition) -> Result<(), StoreError> {
        let _lock = self.lock()?;

        let previous = self.read_record(id)?;
        let now = chrono::Utc::now().to_rfc3339();
        let Some(status) = transition.status else {
            return self.append_log(&transition.entry(id, &now));
        };

        let mut record = previous.clone();
        record.status = Some(status);
        record.updated_at.clone_from(&now);
        self.write_record(&record)?;
        if let Err(e) = self.append_log(&transition.entry(id, &now)) {
            warn!("log append failed for server {id}, restoring previous status: {e}");
            self.write_record(&previous)?;
            return Err(e);
        }
        Ok(())
    }

    fn logs(&self, id: &ServerId, limit: usize) -> Result<Vec<LogEntry>, StoreError> {
        let path = self.layout.log_path(id.as_str());
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(fs::File::open(&path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("skipping malformed log line for server {id}: {e}"),
            }
        }
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::LogKind;
    use crate::records::{Edition, ServerStatus};

    fn open_store(dir: &std::path::Path) -> FileStore {
        FileStore::open(StoreLayout::new(dir)).unwrap()
    }

    fn survival() -> NewServer {
        NewServer {
            owner: "demo-user".to_owned(),
            name: "Survival".to_owned(),
            ip: "play.example.com".to_owned(),
            edition: Edition::Java,
            version: "1.20.1".to_owned(),
            max_players: 20,
        }
    }

    #[test]
    fn register_assigns_sequential_ids_and_ports() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());

        let a = store.register(&survival()).unwrap();
        let b = store.register(&survival()).unwrap();
        assert_eq!(a.id.as_str(), "1");
        assert_eq!(b.id.as_str(), "2");
        assert_eq!(a.port, 25565);
        assert_eq!(b.port, 25566);
        assert_eq!(b.rcon_port, 35566);
    }

    #[test]
    fn register_writes_creation_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        let record = store.register(&survival()).unwrap();

        let logs = store.logs(&record.id, 100).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].kind, LogKind::Info);
        assert_eq!(logs[0].message, "Server Survival created successfully");
    }

    #[test]
    fn get_unknown_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        let id = ServerId::parse("404").unwrap();
        assert!(matches!(
            store.get(&id),
            Err(StoreError::ServerNotFound(_))
        ));
    }

    #[test]
    fn commit_updates_status_and_appends_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        let record = store.register(&survival()).unwrap();

        store
            .commit(
                &record.id,
                &Transition::info("Container start completed").with_status(ServerStatus::Online),
            )
            .unwrap();

        let reloaded = store.get(&record.id).unwrap();
        assert_eq!(reloaded.status, Some(ServerStatus::Online));

        let logs = store.logs(&record.id, 100).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "Container start completed");
    }

    #[test]
    fn commit_without_status_leaves_record_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        let record = store.register(&survival()).unwrap();

        store
            .commit(&record.id, &Transition::error("Failed to create container: conflict"))
            .unwrap();

        let reloaded = store.get(&record.id).unwrap();
        assert_eq!(reloaded.status, None);
        assert_eq!(reloaded.updated_at, record.updated_at);
        assert_eq!(store.logs(&record.id, 100).unwrap()[0].kind, LogKind::Error);
    }

    #[test]
    fn commit_to_unknown_server_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        let id = ServerId::parse("9").unwrap();
        assert!(store.commit(&id, &Transition::info("x")).is_err());
        assert!(!store.layout().log_path("9").exists());
    }

    #[test]
    fn logs_are_newest_first_and_limited() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        let record = store.register(&survival()).unwrap();
        for i in 0..5 {
            store
                .commit(&record.id, &Transition::info(format!("entry {i}")))
                .unwrap();
        }

        let logs = store.logs(&record.id, 3).unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].message, "entry 4");
        assert_eq!(logs[2].message, "entry 2");
    }

    #[test]
    fn list_filters_by_owner() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        store.register(&survival()).unwrap();
        let mut other = survival();
        other.owner = "alice".to_owned();
        store.register(&other).unwrap();

        assert_eq!(store.list("demo-user").unwrap().len(), 1);
        assert_eq!(store.list("alice").unwrap().len(), 1);
        assert!(store.list("bob").unwrap().is_empty());
    }

    #[test]
    fn tampered_record_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        let record = store.register(&survival()).unwrap();

        let path = store.layout().server_path(record.id.as_str());
        let content = fs::read_to_string(&path).unwrap();
        fs::write(&path, content.replace("Survival", "Hacked")).unwrap();

        assert!(matches!(
            store.get(&record.id),
            Err(StoreError::IntegrityFailure { .. })
        ));
        // Listing skips the corrupted entry instead of failing.
        assert!(store.list("demo-user").unwrap().is_empty());
    }

    #[test]
    fn failed_log_append_keeps_previous_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        let record = store.register(&survival()).unwrap();

        let log = store.layout().log_path(record.id.as_str());
        fs::remove_file(&log).unwrap();
        fs::create_dir(&log).unwrap();

        let result = store.commit(
            &record.id,
            &Transition::info("Container start completed").with_status(ServerStatus::Online),
        );
        assert!(result.is_err());
        let after = store.get(&record.id).unwrap();
        assert_eq!(after.status, None);
        assert_eq!(after.updated_at, record.updated_at);
    }

    #[test]
    fn register_refuses_while_a_record_is_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        let mut second = survival();
        second.name = "Second".to_owned();
        store.register(&survival()).unwrap();
        let second = store.register(&second).unwrap();
        store
            .commit(&second.id, &Transition::error("Failed to create container: boom"))
            .unwrap();

        let path = store.layout().server_path(second.id.as_str());
        let content = fs::read_to_string(&path).unwrap();
        fs::write(&path, content.replace("Second", "Tampered")).unwrap();

        let mut third = survival();
        third.name = "Third".to_owned();
        assert!(matches!(
            store.register(&third),
            Err(StoreError::IntegrityFailure { .. })
        ));
        let logs = store.logs(&second.id, 100).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].message, "Server Second created successfully");
    }

    #[test]
    fn register_skips_ids_that_still_own_a_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path());
        let first = store.register(&survival()).unwrap();
        fs::remove_file(store.layout().server_path(first.id.as_str())).unwrap();

        let next = store.register(&survival()).unwrap();
        assert_eq!(next.id.as_str(), "2");
        assert_eq!(store.logs(&next.id, 100).unwrap().len(), 1);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let store = open_store(dir.path());
            let record = store.register(&survival()).unwrap();
            store
                .commit(
                    &record.id,
                    &Transition::info("Container stop completed").with_status(ServerStatus::Offline),
                )
                .unwrap();
            record.id
        };

        let store = open_store(dir.path());
        assert_eq!(store.get(&id).unwrap().status, Some(ServerStatus::Offline));
    }
}
