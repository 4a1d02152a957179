//! End-to-end protocol scenarios
//!
//! Each "machine" is an independent state root; all machines share one
//! local-directory store, standing in for the remote bucket.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use conf_core::settings::{ConfigEntry, Links, Settings};
use conf_core::{Context, Error, Manifest, SyncCoordinator, SyncOutcome};
use conf_store::StoreConfig;

const ENTRY: &str = "nvim";

struct Machine {
    state: TempDir,
    links: TempDir,
    settings: Settings,
}

impl Machine {
    fn new(store: &Path) -> Self {
        Self::with_commands(store, Vec::new())
    }

    fn with_commands(store: &Path, cmd: Vec<String>) -> Self {
        let state = TempDir::new().unwrap();
        let links = TempDir::new().unwrap();
        let link_path = links.path().join(ENTRY);
        let settings = Settings {
            version: 1,
            cfg: vec![ConfigEntry {
                name: ENTRY.to_string(),
                oss: format!("file://store/confsync/cfg/{ENTRY}"),
                link: Links(vec![link_path.display().to_string()]),
                cmd,
            }],
            lib: Vec::new(),
            oss: StoreConfig {
                name: "local".to_string(),
                access_key: String::new(),
                secret_key: String::new(),
                bucket: "store".to_string(),
                endpoint: store.display().to_string(),
            },
        };
        Self {
            state,
            links,
            settings,
        }
    }

    fn coordinator(&self) -> SyncCoordinator {
        let ctx = Context::new(self.state.path(), self.settings.clone());
        SyncCoordinator::open(ctx).unwrap()
    }

    fn cfg_dir(&self) -> PathBuf {
        self.state.path().join("cfg").join(ENTRY)
    }

    fn link_path(&self) -> PathBuf {
        self.links.path().join(ENTRY)
    }

    fn write_file(&self, rel: &str, content: &str) {
        let path = self.cfg_dir().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn local_manifest(&self) -> Manifest {
        Manifest::load(&self.state.path().join("cfg").join("manifest.json")).unwrap()
    }
}

fn remote_manifest(store: &Path) -> Manifest {
    Manifest::load(&store.join("confsync").join("cfg").join("manifest.json")).unwrap()
}

#[test]
fn scenario_a_fresh_machine_pull_is_a_noop() {
    let store = TempDir::new().unwrap();
    let machine = Machine::new(store.path());

    let outcome = machine.coordinator().pull(ENTRY).unwrap();
    assert!(outcome.is_skipped());
    assert!(!machine.cfg_dir().exists());
    assert!(machine.local_manifest().entries.is_empty());
}

#[test]
fn scenario_b_push_then_pull_on_a_second_machine() {
    let store = TempDir::new().unwrap();
    let x = Machine::new(store.path());
    let y = Machine::new(store.path());

    x.write_file("a.txt", "from machine x");
    assert_eq!(x.coordinator().push(ENTRY).unwrap(), SyncOutcome::Completed);
    assert_eq!(remote_manifest(store.path()).revision_of(ENTRY), 1);

    assert_eq!(y.coordinator().pull(ENTRY).unwrap(), SyncOutcome::Completed);
    assert_eq!(
        fs::read_to_string(y.cfg_dir().join("a.txt")).unwrap(),
        "from machine x"
    );
    assert_eq!(y.local_manifest().revision_of(ENTRY), 1);

    // Local entry adopted byte-identically from the remote.
    let remote = remote_manifest(store.path());
    assert_eq!(
        y.local_manifest().entries.get(ENTRY),
        remote.entries.get(ENTRY)
    );

    // The declared link now points at the managed directory.
    assert_eq!(fs::read_link(y.link_path()).unwrap(), y.cfg_dir());
}

#[test]
fn scenario_c_push_without_changes_is_skipped() {
    let store = TempDir::new().unwrap();
    let x = Machine::new(store.path());

    x.write_file("a.txt", "one");
    x.coordinator().push(ENTRY).unwrap();
    x.write_file("a.txt", "two");
    x.coordinator().push(ENTRY).unwrap();
    assert_eq!(remote_manifest(store.path()).revision_of(ENTRY), 2);

    let outcome = x.coordinator().push(ENTRY).unwrap();
    assert!(outcome.is_skipped());
    assert_eq!(remote_manifest(store.path()).revision_of(ENTRY), 2);
    assert_eq!(x.local_manifest().revision_of(ENTRY), 2);
}

#[test]
fn scenario_d_divergence_blocks_pull_but_not_push() {
    let store = TempDir::new().unwrap();
    let x = Machine::new(store.path());
    let y = Machine::new(store.path());

    x.write_file("a.txt", "v1");
    x.coordinator().push(ENTRY).unwrap();
    y.coordinator().pull(ENTRY).unwrap();

    // Manual edit after a successful pull, remote unchanged.
    y.write_file("a.txt", "edited locally");

    let err = y.coordinator().pull(ENTRY).unwrap_err();
    assert!(matches!(err, Error::DivergedAtRevision { .. }));
    assert!(err.is_conflict());
    assert_eq!(
        fs::read_to_string(y.cfg_dir().join("a.txt")).unwrap(),
        "edited locally"
    );

    // Push resolves the divergence by producing the next revision.
    assert_eq!(y.coordinator().push(ENTRY).unwrap(), SyncOutcome::Completed);
    assert_eq!(remote_manifest(store.path()).revision_of(ENTRY), 2);
}

#[test]
fn pull_with_local_ahead_fails_without_mutation() {
    let store = TempDir::new().unwrap();
    let x = Machine::new(store.path());
    let y = Machine::new(store.path());

    x.write_file("a.txt", "v1");
    x.coordinator().push(ENTRY).unwrap();
    y.coordinator().pull(ENTRY).unwrap();

    // Advance to revision 2 locally on y only.
    y.write_file("a.txt", "v2");
    y.coordinator().push(ENTRY).unwrap();

    // Rewind the remote manifest to simulate y being ahead.
    let mut rewound = remote_manifest(store.path());
    let mut entry = rewound.entries.get(ENTRY).unwrap().clone();
    entry.revision = 1;
    rewound.entries.insert(ENTRY.to_string(), entry);
    rewound
        .save(&store.path().join("confsync").join("cfg").join("manifest.json"))
        .unwrap();

    let before = fs::read_to_string(y.cfg_dir().join("a.txt")).unwrap();
    let err = y.coordinator().pull(ENTRY).unwrap_err();
    assert!(matches!(err, Error::LocalAhead { .. }));
    assert_eq!(fs::read_to_string(y.cfg_dir().join("a.txt")).unwrap(), before);
    assert_eq!(y.local_manifest().revision_of(ENTRY), 2);
}

#[test]
fn pull_fails_when_local_files_exist_without_a_remote_entry() {
    let store = TempDir::new().unwrap();
    let machine = Machine::new(store.path());
    machine.write_file("orphan.txt", "never pushed");

    let err = machine.coordinator().pull(ENTRY).unwrap_err();
    assert!(matches!(err, Error::DivergedWithoutRemoteEntry { .. }));
}

#[test]
fn push_increments_revision_by_exactly_one_and_mirrors_manifests() {
    let store = TempDir::new().unwrap();
    let x = Machine::new(store.path());

    for (revision, content) in [(1u64, "a"), (2, "b"), (3, "c")] {
        x.write_file("a.txt", content);
        x.coordinator().push(ENTRY).unwrap();
        let remote = remote_manifest(store.path());
        assert_eq!(remote.revision_of(ENTRY), revision);
        assert_eq!(
            x.local_manifest().entries.get(ENTRY),
            remote.entries.get(ENTRY)
        );
    }
}

#[test]
fn pull_replaces_stale_local_content_exactly() {
    let store = TempDir::new().unwrap();
    let x = Machine::new(store.path());
    let y = Machine::new(store.path());

    x.write_file("keep.txt", "v1");
    x.write_file("drop.txt", "v1");
    x.coordinator().push(ENTRY).unwrap();
    y.coordinator().pull(ENTRY).unwrap();

    fs::remove_file(x.cfg_dir().join("drop.txt")).unwrap();
    x.write_file("keep.txt", "v2");
    x.write_file("sub/new.txt", "v2");
    x.coordinator().push(ENTRY).unwrap();

    assert_eq!(y.coordinator().pull(ENTRY).unwrap(), SyncOutcome::Completed);
    let snapshot = conf_fs::snapshot_dir(&y.cfg_dir()).unwrap();
    let remote = remote_manifest(store.path());
    assert!(conf_fs::records_equal(
        &snapshot,
        &remote.entries.get(ENTRY).unwrap().files
    ));
    assert!(!y.cfg_dir().join("drop.txt").exists());
    assert_eq!(y.local_manifest().revision_of(ENTRY), 2);
}

#[test]
fn pull_rematerializes_a_deleted_local_copy() {
    let store = TempDir::new().unwrap();
    let x = Machine::new(store.path());

    x.write_file("a.txt", "content");
    x.coordinator().push(ENTRY).unwrap();

    fs::remove_dir_all(x.cfg_dir()).unwrap();
    assert_eq!(x.coordinator().pull(ENTRY).unwrap(), SyncOutcome::Completed);
    assert_eq!(
        fs::read_to_string(x.cfg_dir().join("a.txt")).unwrap(),
        "content"
    );
}

#[test]
fn pull_at_same_revision_with_identical_content_is_skipped() {
    let store = TempDir::new().unwrap();
    let x = Machine::new(store.path());

    x.write_file("a.txt", "same");
    x.coordinator().push(ENTRY).unwrap();

    let outcome = x.coordinator().pull(ENTRY).unwrap();
    assert!(outcome.is_skipped());
}

#[cfg(unix)]
#[test]
fn post_sync_commands_run_after_a_completed_pull() {
    let store = TempDir::new().unwrap();
    let x = Machine::new(store.path());
    x.write_file("a.txt", "v1");
    x.coordinator().push(ENTRY).unwrap();

    let marker_dir = TempDir::new().unwrap();
    let marker = marker_dir.path().join("ran");
    let y = Machine::with_commands(
        store.path(),
        vec![format!("touch {}", marker.display())],
    );
    y.coordinator().pull(ENTRY).unwrap();
    assert!(marker.exists());
}

#[cfg(unix)]
#[test]
fn init_migrates_a_plain_directory() {
    let store = TempDir::new().unwrap();
    let machine = Machine::new(store.path());

    // A pre-existing plain config directory at the primary link path.
    let original = machine.link_path();
    fs::create_dir_all(original.join("lua")).unwrap();
    fs::write(original.join("init.lua"), "-- init").unwrap();
    fs::write(original.join("lua/opts.lua"), "-- opts").unwrap();

    assert_eq!(
        machine.coordinator().init(ENTRY).unwrap(),
        SyncOutcome::Completed
    );

    // Managed copy holds the content, the original is now a symlink to it.
    assert_eq!(
        fs::read_to_string(machine.cfg_dir().join("init.lua")).unwrap(),
        "-- init"
    );
    assert_eq!(fs::read_link(&original).unwrap(), machine.cfg_dir());
    assert_eq!(remote_manifest(store.path()).revision_of(ENTRY), 1);

    // Re-running init is the "already initialized" skip.
    assert!(machine.coordinator().init(ENTRY).unwrap().is_skipped());
}

#[test]
fn init_requires_the_primary_link_to_exist() {
    let store = TempDir::new().unwrap();
    let machine = Machine::new(store.path());

    let err = machine.coordinator().init(ENTRY).unwrap_err();
    assert!(matches!(err, Error::InitMissingSource { .. }));
}

#[test]
fn push_behind_the_remote_is_refused() {
    let store = TempDir::new().unwrap();
    let x = Machine::new(store.path());
    let y = Machine::new(store.path());

    x.write_file("a.txt", "v1");
    x.coordinator().push(ENTRY).unwrap();

    // y never pulled; its local revision is still 0.
    y.write_file("a.txt", "written blind");
    let err = y.coordinator().push(ENTRY).unwrap_err();
    assert!(matches!(err, Error::LocalBehind { .. }));
    assert!(err.is_conflict());
    assert_eq!(remote_manifest(store.path()).revision_of(ENTRY), 1);
}

#[test]
fn push_requires_the_local_directory() {
    let store = TempDir::new().unwrap();
    let machine = Machine::new(store.path());

    let err = machine.coordinator().push(ENTRY).unwrap_err();
    assert!(matches!(err, Error::PushSourceMissing { .. }));
}
