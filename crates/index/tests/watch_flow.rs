use relmap_index::{
    AllAccessible, CommitDepth, FsStorage, MapIndex, MapWatcher, Progress, Vcs, VcsError,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

struct NoVcs;

impl Vcs for NoVcs {
    fn set_comment(&self, _text: &str) -> Result<(), VcsError> {
        Ok(())
    }

    fn commit(
        &self,
        _resources: &[PathBuf],
        _depth: CommitDepth,
        _progress: &dyn Progress,
    ) -> Result<(), VcsError> {
        Ok(())
    }
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    condition()
}

#[cfg_attr(
    not(target_os = "linux"),
    ignore = "watcher latency is only reliable on Linux"
)]
#[test]
fn live_edit_is_reconciled_into_the_index() {
    if std::env::var("SKIP_WATCH_FLOW").is_ok() {
        eprintln!("skipping watch_flow due to SKIP_WATCH_FLOW");
        return;
    }

    let temp = TempDir::new().expect("tempdir");
    let maps = temp.path().join("maps");
    std::fs::create_dir_all(&maps).expect("create maps dir");
    let map_path = maps.join("release.map");
    std::fs::write(&map_path, "org.example.core=v1\n").expect("seed map");

    let index = Arc::new(
        MapIndex::open(
            &maps,
            Arc::new(FsStorage::new()),
            Arc::new(NoVcs),
            Arc::new(AllAccessible),
        )
        .expect("open index"),
    );
    let _watcher =
        MapWatcher::start(index.clone(), Duration::from_millis(100)).expect("start watcher");

    std::fs::write(&map_path, "org.example.core=v2\n").expect("edit map");
    assert!(
        wait_until(Duration::from_secs(4), || {
            index
                .map_entry("org.example.core")
                .is_some_and(|entry| entry.tag() == "v2")
        }),
        "edited tag never became visible"
    );
}

#[cfg_attr(
    not(target_os = "linux"),
    ignore = "watcher latency is only reliable on Linux"
)]
#[test]
fn live_removal_drops_the_file_from_the_index() {
    if std::env::var("SKIP_WATCH_FLOW").is_ok() {
        eprintln!("skipping watch_flow due to SKIP_WATCH_FLOW");
        return;
    }

    let temp = TempDir::new().expect("tempdir");
    let maps = temp.path().join("maps");
    std::fs::create_dir_all(&maps).expect("create maps dir");
    std::fs::write(maps.join("a.map"), "org.example.core=v1\n").expect("seed a");
    std::fs::write(maps.join("b.map"), "org.example.ui=v2\n").expect("seed b");

    let index = Arc::new(
        MapIndex::open(
            &maps,
            Arc::new(FsStorage::new()),
            Arc::new(NoVcs),
            Arc::new(AllAccessible),
        )
        .expect("open index"),
    );
    let _watcher =
        MapWatcher::start(index.clone(), Duration::from_millis(100)).expect("start watcher");

    std::fs::remove_file(maps.join("a.map")).expect("remove a");
    assert!(
        wait_until(Duration::from_secs(4), || {
            index.map_entry("org.example.core").is_none()
        }),
        "removed file still resolves"
    );
    assert_eq!(
        index.map_entry("org.example.ui").expect("entry").tag(),
        "v2"
    );
}
