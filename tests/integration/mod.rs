//! Integration tests for filetrack
//!
//! Drives a monitor through randomized sequences of real file operations and
//! checks the ledger against the files on disk after every step.

use ::filetrack::fingerprint::hash_bytes;
use ::filetrack::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::info;

/// Test harness pairing a monitor with the content it should have seen
pub struct TrackerTestHarness {
    pub temp_dir: TempDir,
    pub monitor: Monitor,
    pub root: PathBuf,
    pub expected: HashMap<PathBuf, Option<Vec<u8>>>,
    rng: StdRng,
}

#[derive(Debug, Clone, Copy)]
pub enum TestOperation {
    Create,
    Modify,
    Touch,
    Delete,
}

impl TrackerTestHarness {
    pub fn new(seed: u64) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let monitor = MonitorBuilder::new()
            .root_path(temp_dir.path())
            .user("harness")
            .parallel_workers(2)
            .build()
            .unwrap();
        let root = monitor.root_path().to_path_buf();
        Self {
            temp_dir,
            monitor,
            root,
            expected: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Write `count` files spread over a few nested directories
    pub fn populate(&mut self, count: usize) {
        for i in 0..count {
            let dir = self.root.join(format!("dir{}", i % 4)).join(format!("sub{}", i % 3));
            fs::create_dir_all(&dir).unwrap();
            let path = dir.join(format!("file_{}.txt", i));
            let content = self.random_content();
            fs::write(&path, &content).unwrap();
            self.expected.insert(path, Some(content));
        }
    }

    pub fn seed(&self) -> ScanStats {
        self.monitor.seed().unwrap()
    }

    fn random_content(&mut self) -> Vec<u8> {
        let len = self.rng.random_range(0..2048);
        let mut content = vec![0u8; len];
        self.rng.fill(&mut content[..]);
        content
    }

    fn pick_existing(&mut self) -> Option<PathBuf> {
        let mut live: Vec<_> = self
            .expected
            .iter()
            .filter(|(_, content)| content.is_some())
            .map(|(path, _)| path.clone())
            .collect();
        if live.is_empty() {
            return None;
        }
        live.sort();
        let idx = self.rng.random_range(0..live.len());
        Some(live.swap_remove(idx))
    }

    /// Perform one random operation on disk and deliver its notification
    pub fn step(&mut self, n: usize) -> TestOperation {
        let op = match self.rng.random_range(0..4) {
            0 => TestOperation::Create,
            1 => TestOperation::Modify,
            2 => TestOperation::Touch,
            _ => TestOperation::Delete,
        };

        match op {
            TestOperation::Create => {
                let path = self.root.join(format!("new_{}.dat", n));
                let content = self.random_content();
                fs::write(&path, &content).unwrap();
                self.monitor.handle(&Notification::Created(path.clone()));
                self.expected.insert(path, Some(content));
            }
            TestOperation::Modify => {
                if let Some(path) = self.pick_existing() {
                    let mut content = self.random_content();
                    content.extend_from_slice(format!("#{}", n).as_bytes());
                    fs::write(&path, &content).unwrap();
                    let before = self.monitor.store().get(&path).unwrap().history.len();
                    let event = self.monitor.handle(&Notification::Modified(path.clone()));
                    let after = self.monitor.store().get(&path).unwrap().history.len();
                    if event.is_some() {
                        assert_eq!(after, before + 2);
                    } else {
                        assert_eq!(after, before);
                    }
                    self.expected.insert(path, Some(content));
                }
            }
            TestOperation::Touch => {
                if let Some(path) = self.pick_existing() {
                    let before = self.monitor.store().get(&path).unwrap();
                    assert!(self
                        .monitor
                        .handle(&Notification::Modified(path.clone()))
                        .is_none());
                    let after = self.monitor.store().get(&path).unwrap();
                    assert_eq!(before, after);
                }
            }
            TestOperation::Delete => {
                if let Some(path) = self.pick_existing() {
                    fs::remove_file(&path).unwrap();
                    self.monitor.handle(&Notification::Removed(path.clone()));
                    self.expected.insert(path, None);
                }
            }
        }
        op
    }

    /// Assert the ledger matches what is on disk
    pub fn verify(&self) {
        let store = self.monitor.store();
        assert_eq!(store.len(), self.expected.len());

        for (path, content) in &self.expected {
            let file = store
                .get(path)
                .unwrap_or_else(|| panic!("{} not tracked", path.display()));
            assert!(file.is_consistent(), "{} inconsistent", path.display());
            assert!(!file.history.is_empty());
            match content {
                Some(bytes) => {
                    assert_eq!(file.current_hash, Some(hash_bytes(bytes)));
                    assert_ne!(file.status, FileStatus::Deleted);
                }
                None => {
                    assert_eq!(file.current_hash, None);
                    assert_eq!(file.status, FileStatus::Deleted);
                }
            }
        }

        let snapshot = store.snapshot();
        for pair in snapshot.windows(2) {
            assert!(pair[0].last_timestamp >= pair[1].last_timestamp);
        }
    }
}

#[test]
fn test_seed_nested_tree() {
    let mut harness = TrackerTestHarness::new(7);
    harness.populate(60);
    let stats = harness.seed();
    assert_eq!(stats.files_seeded, 60);
    harness.verify();
    assert!(harness
        .monitor
        .store()
        .snapshot()
        .iter()
        .all(|f| f.status == FileStatus::Unchanged && f.history.len() == 1));
}

#[test]
fn test_random_operation_sequence() {
    let mut harness = TrackerTestHarness::new(42);
    harness.populate(20);
    harness.seed();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for n in 0..200 {
        let op = harness.step(n);
        *counts.entry(format!("{:?}", op)).or_default() += 1;
        if n % 25 == 0 {
            harness.verify();
        }
    }
    harness.verify();
    info!("Operation mix: {:?}", counts);
}

#[test]
fn test_history_only_grows_without_limit() {
    let mut harness = TrackerTestHarness::new(3);
    harness.populate(5);
    harness.seed();

    let mut lengths: HashMap<PathBuf, usize> = harness
        .monitor
        .store()
        .snapshot()
        .into_iter()
        .map(|f| (f.path.clone(), f.history.len()))
        .collect();

    for n in 0..100 {
        harness.step(n);
        for file in harness.monitor.store().snapshot() {
            let previous = lengths.get(&file.path).copied().unwrap_or(0);
            // A re-creation resets history; everything else may only grow
            if file.status != FileStatus::Created {
                assert!(file.history.len() >= previous);
            }
            lengths.insert(file.path.clone(), file.history.len());
        }
    }
}

#[test]
fn test_unicode_filenames() {
    let temp_dir = TempDir::new().unwrap();
    let names = ["файл.txt", "文件.txt", "ファイル.txt", "🚀🌟💾.txt"];
    let mut created = Vec::new();
    for name in &names {
        if fs::write(temp_dir.path().join(name), name.as_bytes()).is_ok() {
            created.push(*name);
        }
    }

    let monitor = MonitorBuilder::new()
        .root_path(temp_dir.path())
        .build()
        .unwrap();
    monitor.seed().unwrap();

    let store = monitor.store();
    assert_eq!(store.len(), created.len());
    for name in created {
        let file = store.get(&monitor.root_path().join(name)).unwrap();
        assert_eq!(file.current_hash, Some(hash_bytes(name.as_bytes())));
    }
}

#[test]
fn test_ignore_patterns_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("tree");
    fs::create_dir_all(root.join("target/debug")).unwrap();
    fs::write(root.join("main.rs"), "fn main() {}").unwrap();
    fs::write(root.join("target/debug/app"), "binary").unwrap();
    fs::write(root.join("notes.bak"), "backup").unwrap();

    let config_path = temp_dir.path().join("config.json");
    let config = serde_json::json!({
        "root_path": root,
        "ignore_patterns": ["**/target/**", "*.bak"],
        "history_limit": 10
    });
    fs::write(&config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let config = TrackerConfig::from_json_file(&config_path).unwrap();
    assert_eq!(config.history_limit, Some(10));

    let monitor = MonitorBuilder::from_config(config).build().unwrap();
    let stats = monitor.seed().unwrap();
    assert_eq!(stats.files_seeded, 1);
    assert!(monitor
        .store()
        .contains(&monitor.root_path().join("main.rs")));
}
