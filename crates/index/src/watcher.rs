use crate::error::{IndexError, Result};
use crate::event::{ChangeEvent, ChangeKind, PathDelta, ResourceKind};
use crate::index::MapIndex;
use notify::event::ModifyKind;
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::sync::Arc;
use std::time::Duration;

/// Bridge between the platform file notifier and [`MapIndex::reconcile`].
///
/// Watches the index's map directory (non-recursively) and translates raw
/// notifier events into typed [`ChangeEvent`]s on the notifier's own
/// thread. Dropping the watcher unsubscribes; a disposed index ignores
/// anything still in flight.
pub struct MapWatcher {
    _watcher: RecommendedWatcher,
}

impl MapWatcher {
    pub fn start(index: Arc<MapIndex>, poll_interval: Duration) -> Result<Self> {
        let root = index.root().to_path_buf();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let deltas = deltas_from(&event);
                    if !deltas.is_empty() {
                        index.reconcile(&ChangeEvent::new(deltas));
                    }
                }
                Err(err) => log::warn!("watcher error: {err}"),
            },
            NotifyConfig::default().with_poll_interval(poll_interval),
        )
        .map_err(|e| IndexError::Other(format!("watcher init failed: {e}")))?;

        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .map_err(|e| IndexError::Other(format!("failed to watch {}: {e}", root.display())))?;

        Ok(Self { _watcher: watcher })
    }
}

fn deltas_from(event: &Event) -> Vec<PathDelta> {
    let kind = match event.kind {
        EventKind::Create(_) => Some(ChangeKind::Added),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        // Renames surface as Modify(Name); resolve add-vs-remove per path.
        EventKind::Modify(ModifyKind::Name(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Changed),
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .map(|path| {
            let resolved = kind.unwrap_or(if path.exists() {
                ChangeKind::Added
            } else {
                ChangeKind::Removed
            });
            let resource = if path.is_dir() {
                ResourceKind::Directory
            } else {
                ResourceKind::File
            };
            PathDelta {
                path: path.clone(),
                kind: resolved,
                resource,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::deltas_from;
    use crate::event::{ChangeKind, ResourceKind};
    use notify::event::{CreateKind, DataChange, ModifyKind};
    use notify::{Event, EventKind};
    use std::path::PathBuf;

    #[test]
    fn create_maps_to_added() {
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/maps/a.map"));
        let deltas = deltas_from(&event);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].kind, ChangeKind::Added);
    }

    #[test]
    fn content_modify_maps_to_changed() {
        let event = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from("/maps/a.map"));
        let deltas = deltas_from(&event);
        assert_eq!(deltas[0].kind, ChangeKind::Changed);
        assert_eq!(deltas[0].resource, ResourceKind::File);
    }

    #[test]
    fn access_events_are_dropped() {
        let event = Event::new(EventKind::Access(notify::event::AccessKind::Read))
            .add_path(PathBuf::from("/maps/a.map"));
        assert!(deltas_from(&event).is_empty());
    }
}
