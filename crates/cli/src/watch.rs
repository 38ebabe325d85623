use anyhow::Result;
use notify::event::{EventKind, ModifyKind};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use proposals_core::catalog::Catalog;
use proposals_core::extractor::PROPOSAL_FILE;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Quiet period after the last event before a reload is triggered.
pub const SETTLE: Duration = Duration::from_millis(300);

/// Whether a filesystem event can change the collection.
pub fn is_relevant(event: &Event) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    // Removing or renaming a proposal directory changes ids without touching
    // any README event.
    let structural = matches!(
        event.kind,
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
    );
    event.paths.iter().any(|p| {
        structural || p.file_name().and_then(|n| n.to_str()) == Some(PROPOSAL_FILE)
    })
}

/// Reloads the catalog whenever proposal files under `root` change. Runs
/// until the watcher channel closes.
pub async fn watch_corpus(catalog: Arc<Catalog>, root: &Path) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    catalog.get_or_load().await?;
    println!("Watching {} for proposal changes...", root.display());

    while let Some(res) = rx.recv().await {
        let mut dirty = match res {
            Ok(event) => is_relevant(&event),
            Err(e) => {
                warn!(error = %e, "watch error");
                false
            }
        };
        // Editors emit bursts; fold them into one reload.
        while let Ok(Some(more)) = tokio::time::timeout(SETTLE, rx.recv()).await {
            if let Ok(event) = more {
                dirty |= is_relevant(&event);
            }
        }
        if !dirty {
            continue;
        }
        debug!("proposal files changed");
        match catalog.reload().await {
            Ok(snapshot) => info!(
                loaded = snapshot.len(),
                rejected = snapshot.rejected(),
                "catalog reloaded"
            ),
            Err(e) => warn!(error = %e, "reload failed; keeping previous snapshot"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, RemoveKind, RenameMode};
    use std::path::PathBuf;

    #[test]
    fn only_proposal_files_and_removals_count() {
        let readme = PathBuf::from("ACPs/1-a/README.md");
        let notes = PathBuf::from("ACPs/1-a/notes.md");
        assert!(is_relevant(
            &Event::new(EventKind::Modify(ModifyKind::Any)).add_path(readme.clone())
        ));
        assert!(is_relevant(
            &Event::new(EventKind::Create(CreateKind::File)).add_path(readme.clone())
        ));
        assert!(!is_relevant(
            &Event::new(EventKind::Modify(ModifyKind::Any)).add_path(notes)
        ));
        assert!(is_relevant(
            &Event::new(EventKind::Remove(RemoveKind::Folder)).add_path(PathBuf::from("ACPs/1-a"))
        ));
        assert!(!is_relevant(
            &Event::new(EventKind::Access(AccessKind::Any)).add_path(readme)
        ));
    }

    #[test]
    fn directory_rename_counts() {
        let renamed = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("ACPs/42-x"))
            .add_path(PathBuf::from("ACPs/43-x"));
        assert!(is_relevant(&renamed));
        let from_only = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path(PathBuf::from("ACPs/42-x"));
        assert!(is_relevant(&from_only));
    }
}
