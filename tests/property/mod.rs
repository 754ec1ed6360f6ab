//! Property-based testing for filetrack
//!
//! Uses proptest to verify filter, fingerprint and ledger invariants across
//! randomly generated inputs.

use ::filetrack::fingerprint::{fingerprint_reader, hash_bytes};
use ::filetrack::*;
use proptest::prelude::*;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tempfile::TempDir;

/// Generate a visible base name without an ignored suffix
fn plain_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,10}\\.(txt|rs|md|json)",
        "[A-Za-z0-9_-]{1,12}",
        "file[0-9]{1,3}",
    ]
}

/// Generate relative directory prefixes (0-3 components)
fn dir_strategy() -> impl Strategy<Value = PathBuf> {
    prop::collection::vec("[a-z]{1,8}", 0..=3).prop_map(|dirs| dirs.iter().collect())
}

/// Reader that hands out at most `step` bytes per call
struct Chunked<'a> {
    data: &'a [u8],
    step: usize,
}

impl Read for Chunked<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.step.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_plain_names_are_trackable(dir in dir_strategy(), name in plain_name_strategy()) {
        let filter = PathFilter::default();
        prop_assert!(filter.is_trackable(&dir.join(&name)));
    }

    #[test]
    fn prop_hidden_names_are_rejected(dir in dir_strategy(), name in plain_name_strategy()) {
        let filter = PathFilter::default();
        let hidden = format!(".{}", name);
        prop_assert!(!filter.is_trackable(&dir.join(hidden)));
    }

    #[test]
    fn prop_ignored_suffixes_are_rejected(
        dir in dir_strategy(),
        name in plain_name_strategy(),
        idx in 0..DEFAULT_IGNORED_EXTENSIONS.len(),
    ) {
        let filter = PathFilter::default();
        let ignored = format!("{}{}", name, DEFAULT_IGNORED_EXTENSIONS[idx]);
        prop_assert!(!filter.is_trackable(&dir.join(ignored)));
    }

    #[test]
    fn prop_fingerprint_independent_of_chunking(
        data in prop::collection::vec(any::<u8>(), 0..20_000),
        step in 1usize..9000,
    ) {
        let chunked = fingerprint_reader(Chunked { data: &data, step }).unwrap();
        prop_assert_eq!(chunked, hash_bytes(&data));
    }

    #[test]
    fn prop_file_fingerprint_matches_content(data in prop::collection::vec(any::<u8>(), 0..10_000)) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.bin");
        fs::write(&path, &data).unwrap();
        prop_assert_eq!(fingerprint(&path), Some(hash_bytes(&data)));
    }

    #[test]
    fn prop_modifications_keep_ledger_consistent(
        contents in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..12),
        limit in prop::option::of(2usize..8),
    ) {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), b"seed").unwrap();
        let monitor = MonitorBuilder::new()
            .root_path(temp_dir.path())
            .history_limit(limit)
            .build()
            .unwrap();
        monitor.seed().unwrap();
        let path = monitor.root_path().join("a.txt");

        let mut current = b"seed".to_vec();
        for content in contents {
            fs::write(&path, &content).unwrap();
            let before = monitor.store().get(&path).unwrap();
            let event = monitor.handle(&Notification::Modified(path.clone()));
            let after = monitor.store().get(&path).unwrap();

            if content == current {
                prop_assert!(event.is_none());
                prop_assert_eq!(&before, &after);
            } else {
                prop_assert!(event.is_some());
                prop_assert_eq!(after.status, FileStatus::Modified);
                let n = after.history.len();
                prop_assert!(n >= 2);
                prop_assert!(after.history[n - 2].timestamp < after.history[n - 1].timestamp);
                prop_assert_ne!(&after.history[n - 2].hash, &after.history[n - 1].hash);
            }
            prop_assert!(after.is_consistent());
            if let Some(limit) = limit {
                prop_assert!(after.history.len() <= limit);
            }
            current = content;
        }
    }
}
