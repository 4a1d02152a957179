//! Library pull against a local-directory store

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use conf_core::settings::{ConfigEntry, Links, Settings};
use conf_core::{Context, Error, library};
use conf_store::{StoreConfig, open_backend};

const ENTRY: &str = "fonts";

struct Setup {
    store: TempDir,
    state: TempDir,
    links: TempDir,
    settings: Settings,
}

impl Setup {
    fn new() -> Self {
        let store = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let links = TempDir::new().unwrap();
        let link_path = links.path().join(ENTRY);
        let settings = Settings {
            version: 1,
            cfg: Vec::new(),
            lib: vec![ConfigEntry {
                name: ENTRY.to_string(),
                oss: format!("file://store/confsync/lib/{ENTRY}"),
                link: Links(vec![link_path.display().to_string()]),
                cmd: Vec::new(),
            }],
            oss: StoreConfig {
                name: "local".to_string(),
                access_key: String::new(),
                secret_key: String::new(),
                bucket: "store".to_string(),
                endpoint: store.path().display().to_string(),
            },
        };
        Self {
            store,
            state,
            links,
            settings,
        }
    }

    fn seed_remote(&self, rel: &str, content: &str) {
        let path = self
            .store
            .path()
            .join("confsync")
            .join("lib")
            .join(ENTRY)
            .join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn ctx(&self) -> Context {
        Context::new(self.state.path(), self.settings.clone())
    }

    fn lib_dir(&self) -> PathBuf {
        self.state.path().join("lib").join(ENTRY)
    }

    fn link_path(&self) -> PathBuf {
        self.links.path().join(ENTRY)
    }

    fn pull(&self) -> conf_core::Result<()> {
        let backend = open_backend(&self.settings.oss).unwrap();
        library::pull(&self.ctx(), backend.as_ref(), ENTRY)
    }
}

#[test]
fn pull_downloads_the_tree_and_links_it() {
    let setup = Setup::new();
    setup.seed_remote("FiraCode.ttf", "glyphs");
    setup.seed_remote("nested/NotoMono.ttf", "more glyphs");

    setup.pull().unwrap();

    assert_eq!(
        fs::read_to_string(setup.lib_dir().join("FiraCode.ttf")).unwrap(),
        "glyphs"
    );
    assert_eq!(
        fs::read_to_string(setup.lib_dir().join("nested").join("NotoMono.ttf")).unwrap(),
        "more glyphs"
    );
    assert_eq!(fs::read_link(setup.link_path()).unwrap(), setup.lib_dir());
}

#[test]
fn pull_refuses_an_existing_library_directory() {
    let setup = Setup::new();
    setup.seed_remote("FiraCode.ttf", "glyphs");
    fs::create_dir_all(setup.lib_dir()).unwrap();

    let err = setup.pull().unwrap_err();
    assert!(matches!(err, Error::LibraryDirExists { .. }));
}

#[test]
fn pull_refuses_an_occupied_link_path() {
    let setup = Setup::new();
    setup.seed_remote("FiraCode.ttf", "glyphs");
    fs::write(setup.link_path(), "unrelated file").unwrap();

    let err = setup.pull().unwrap_err();
    assert!(matches!(err, Error::LinkPathExists { .. }));
    assert!(!setup.lib_dir().exists());
}

#[test]
fn pull_of_a_missing_remote_prefix_is_a_store_error() {
    let setup = Setup::new();

    let err = setup.pull().unwrap_err();
    match err {
        Error::Store(store_err) => assert!(store_err.is_not_found()),
        other => panic!("expected a store error, got {other}"),
    }
}
