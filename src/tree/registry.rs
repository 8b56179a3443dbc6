//! Tracker registry: the path-keyed tree of live nodes.
//!
//! # Responsibilities
//! - Resolve or create the node at a path, creating missing ancestors
//! - Guarantee a single node per path under concurrent creation
//! - Decide when a path stops being addressable and evict its node
//! - Serve inspection queries (paths, kinds, snapshots)
//! - Stop every node on tree shutdown
//!
//! # Slot accounting
//! ```text
//! Slot { node, parent, bindings, children }
//!
//! locate     entry(path): bindings += 1, send Bind
//! close      remove_if_mut(path): bindings -= 1, evict at 0
//! traverse   entry(ancestor): children += 1 while passing through, kept
//!            only when the next level attached itself to this incarnation
//! evict      send Evict, Release the parent, children -= 1 on the parent,
//!            evict the parent too once it is unbound and childless
//! ```
//!
//! # Design Decisions
//! - `DashMap` entry API gives insert-if-absent with the lock scoped to the
//!   shard holding the path, so unrelated paths never contend
//! - Every tally change happens while holding that shard lock, so a locate
//!   either lands before the last close (and keeps the node) or after it
//!   (and finds the slot gone)
//! - The last unbind evicts a node even when it still has children; they stay
//!   addressable as orphans and a missing ancestor is re-created by the next
//!   locate that passes through it
//! - Ancestors that were never bound leave once their last child does
//! - Never hold one slot guard while touching another

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::config::schema::TreeConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::observability::metrics;
use crate::observability::sink::{LogSink, TracingSink};
use crate::tree::host::{NodeHost, TokioHost};
use crate::tree::kind::TrackerKind;
use crate::tree::message::{TrackerMessage, TrackerSnapshot};
use crate::tree::node::{NodeRef, TrackerNode};
use crate::tree::path::{PathError, TrackerPath};

/// Registry entry for one path.
#[derive(Debug)]
struct Slot {
    node: NodeRef,
    /// Incarnation of the parent this slot is counted against.
    parent: Option<Uuid>,
    bindings: usize,
    children: usize,
}

impl Slot {
    fn is_unused(&self) -> bool {
        self.bindings == 0 && self.children == 0
    }
}

/// Shared registry state. Handles hold a `Weak` to it.
pub(crate) struct RegistryInner {
    nodes: DashMap<TrackerPath, Slot>,
    host: Arc<dyn NodeHost>,
    sink: Arc<dyn LogSink>,
    config: TreeConfig,
    closed: AtomicBool,
}

impl RegistryInner {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Insert-if-absent for one level of a traversal.
    ///
    /// `pin` reserves a child reference for the next level, `bind` adds a
    /// binding. Returns the node and whether the slot (re)attached itself to
    /// `parent`, in which case the parent keeps its pin.
    fn attach(
        self: &Arc<Self>,
        path: &TrackerPath,
        kind: TrackerKind,
        parent: Option<&NodeRef>,
        pin: bool,
        bind: bool,
    ) -> TrackerResult<(NodeRef, bool)> {
        let parent_id = parent.map(NodeRef::id);
        match self.nodes.entry(path.clone()) {
            Entry::Occupied(mut entry) => {
                if self.is_closed() {
                    return Err(TrackerError::TreeClosed);
                }
                let slot = entry.get_mut();
                if slot.node.is_stopped() {
                    tracing::debug!(tracker = %path, id = %slot.node.id(), "Respawning stopped tracker");
                    let current = slot.node.kind();
                    slot.node = self.spawn_node(path, current, Some(slot.node.id()));
                }
                slot.node.claim_kind(kind)?;
                if bind {
                    slot.node.send(TrackerMessage::Bind)?;
                    slot.bindings += 1;
                }
                if pin {
                    slot.children += 1;
                }

                let adopted = slot.parent != parent_id;
                if adopted {
                    slot.parent = parent_id;
                    adopt(parent, &slot.node);
                }
                Ok((slot.node.clone(), adopted))
            }
            Entry::Vacant(entry) => {
                if self.is_closed() {
                    return Err(TrackerError::TreeClosed);
                }
                let node = self.spawn_node(path, kind, None);
                if bind {
                    node.send(TrackerMessage::Bind)?;
                }
                adopt(parent, &node);
                entry.insert(Slot {
                    node: node.clone(),
                    parent: parent_id,
                    bindings: usize::from(bind),
                    children: usize::from(pin),
                });
                Ok((node, true))
            }
        }
    }

    fn spawn_node(self: &Arc<Self>, path: &TrackerPath, kind: TrackerKind, id: Option<Uuid>) -> NodeRef {
        let (node_ref, node) = TrackerNode::new(path.clone(), kind, id, self.sink.clone(), &self.config);

        metrics::record_node_created(kind.as_str());
        tracing::debug!(tracker = %path, id = %node_ref.id(), kind = %kind, "Tracker created");

        self.host.spawn(path, Box::pin(node.run()));
        node_ref
    }

    /// Drop one binding of incarnation `id`, evicting it at zero.
    pub(crate) fn release_binding(&self, path: &TrackerPath, id: Uuid) {
        let evicted = self.nodes.remove_if_mut(path, |_, slot| {
            if slot.node.id() != id {
                return false;
            }
            slot.bindings = slot.bindings.saturating_sub(1);
            slot.bindings == 0
        });
        if let Some((path, slot)) = evicted {
            self.retire(path, slot);
        }
    }

    /// Drop one child reference of incarnation `id`.
    fn unpin(&self, path: &TrackerPath, id: Uuid) {
        if let Some((path, slot)) = self.take_child_pin(path, id) {
            self.retire(path, slot);
        }
    }

    fn take_child_pin(&self, path: &TrackerPath, id: Uuid) -> Option<(TrackerPath, Slot)> {
        self.nodes.remove_if_mut(path, |_, slot| {
            if slot.node.id() != id {
                return false;
            }
            slot.children = slot.children.saturating_sub(1);
            slot.is_unused()
        })
    }

    /// Stop an evicted node and walk up through ancestors left unused.
    fn retire(&self, path: TrackerPath, slot: Slot) {
        let mut next = Some((path, slot));
        while let Some((path, slot)) = next.take() {
            let id = slot.node.id();
            let _ = slot.node.send(TrackerMessage::Evict);
            metrics::record_node_retired();
            tracing::debug!(tracker = %path, id = %id, orphaned = slot.children, "Tracker retired");

            let (Some(parent_path), Some(parent_id)) = (path.parent(), slot.parent) else {
                continue;
            };
            let parent = self
                .nodes
                .get(&parent_path)
                .filter(|entry| entry.node.id() == parent_id)
                .map(|entry| entry.node.clone());
            if let Some(parent) = parent {
                let _ = parent.send(TrackerMessage::Release(path, id));
            }
            next = self.take_child_pin(&parent_path, parent_id);
        }
    }
}

/// Tell `parent` about a child incarnation. A stopped parent just misses it.
fn adopt(parent: Option<&NodeRef>, child: &NodeRef) {
    if let Some(parent) = parent {
        let _ = parent.send(TrackerMessage::Adopt(child.path().clone(), child.id()));
    }
}

/// The tracker tree. Cheap to clone; all clones share one registry.
#[derive(Clone)]
pub struct TrackerTree {
    inner: Arc<RegistryInner>,
}

impl std::fmt::Debug for TrackerTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerTree")
            .field("nodes", &self.inner.nodes.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl TrackerTree {
    /// Create a tree with an explicit host and log sink.
    pub fn new(config: TreeConfig, host: Arc<dyn NodeHost>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                nodes: DashMap::new(),
                host,
                sink,
                config,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Create a tree hosted on the current tokio runtime, logging through `tracing`.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn on_current_runtime(config: TreeConfig) -> Self {
        Self::new(config, Arc::new(TokioHost::current()), Arc::new(TracingSink))
    }

    pub fn config(&self) -> &TreeConfig {
        &self.inner.config
    }

    pub(crate) fn downgrade(&self) -> Weak<RegistryInner> {
        Arc::downgrade(&self.inner)
    }

    /// Resolve the node at `path`, creating it and any missing ancestors.
    ///
    /// With `bind` set, the binding is counted and its `Bind` enqueued under
    /// the slot lock before the reference is returned.
    pub(crate) fn resolve_or_create(
        &self,
        path: &TrackerPath,
        kind: TrackerKind,
        bind: bool,
    ) -> TrackerResult<NodeRef> {
        if self.is_closed() {
            return Err(TrackerError::TreeClosed);
        }
        self.check_addressable(path)?;

        let mut parent: Option<NodeRef> = None;
        for level in path.ancestors().chain(std::iter::once(path.clone())) {
            let target = &level == path;
            let (kind, pin, bind) = if target {
                (kind, false, bind)
            } else {
                (TrackerKind::Generic, true, false)
            };

            let attached = self.inner.attach(&level, kind, parent.as_ref(), pin, bind);
            let (node, adopted) = match attached {
                Ok(attached) => attached,
                Err(e) => {
                    if let Some(parent) = &parent {
                        self.inner.unpin(parent.path(), parent.id());
                    }
                    return Err(e);
                }
            };
            if let Some(parent) = parent.as_ref().filter(|_| !adopted) {
                self.inner.unpin(parent.path(), parent.id());
            }
            parent = Some(node);
        }

        parent.ok_or(TrackerError::InvalidPath(PathError::Empty))
    }

    /// Make sure a node exists at `path` without binding to it.
    pub fn ensure(&self, path: &TrackerPath, kind: TrackerKind) -> TrackerResult<()> {
        self.resolve_or_create(path, kind, false).map(|_| ())
    }

    fn check_addressable(&self, path: &TrackerPath) -> TrackerResult<()> {
        if path.is_root() {
            return Err(PathError::Empty.into());
        }
        let max = self.inner.config.max_depth;
        if path.depth() > max {
            return Err(PathError::TooDeep {
                depth: path.depth(),
                max,
            }
            .into());
        }
        Ok(())
    }

    /// Remove the node at `path` if nothing is bound to it.
    ///
    /// Returns false when no node is registered or it is still bound. Children
    /// of a removed node stay in the tree as orphans.
    pub fn remove(&self, path: &TrackerPath) -> bool {
        match self.inner.nodes.remove_if(path, |_, slot| slot.bindings == 0) {
            Some((path, slot)) => {
                self.inner.retire(path, slot);
                true
            }
            None => {
                if let Some(slot) = self.inner.nodes.get(path) {
                    tracing::debug!(tracker = %path, bindings = slot.bindings, "Remove ignored, tracker still bound");
                }
                false
            }
        }
    }

    pub fn contains(&self, path: &TrackerPath) -> bool {
        self.inner.nodes.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.inner.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.nodes.is_empty()
    }

    /// Every registered path, sorted.
    pub fn paths(&self) -> Vec<TrackerPath> {
        let mut paths: Vec<TrackerPath> = self.inner.nodes.iter().map(|entry| entry.key().clone()).collect();
        paths.sort();
        paths
    }

    pub fn kind_of(&self, path: &TrackerPath) -> Option<TrackerKind> {
        self.inner.nodes.get(path).map(|entry| entry.node.kind())
    }

    /// Current state of the node at `path`, as seen by its own loop.
    pub async fn snapshot(&self, path: &TrackerPath) -> Option<TrackerSnapshot> {
        let node = self.inner.nodes.get(path).map(|entry| entry.node.clone())?;
        node.snapshot().await.ok()
    }

    /// Snapshots of every node, in path order. Nodes that retire meanwhile are skipped.
    pub async fn snapshot_all(&self) -> Vec<TrackerSnapshot> {
        let mut snapshots = Vec::new();
        for path in self.paths() {
            if let Some(snapshot) = self.snapshot(&path).await {
                snapshots.push(snapshot);
            }
        }
        snapshots
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Stop every node and refuse further bindings. Idempotent.
    ///
    /// The flag flips before the map is drained, and `attach` re-reads it
    /// under the slot lock, so no node can be inserted after the drain.
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut stopped = 0usize;
        self.inner.nodes.retain(|_, slot| {
            let _ = slot.node.send(TrackerMessage::Evict);
            stopped += 1;
            false
        });
        tracing::info!(trackers = stopped, "Tracker tree shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::sink::NullSink;

    fn tree() -> TrackerTree {
        TrackerTree::new(
            TreeConfig::default(),
            Arc::new(TokioHost::current()),
            Arc::new(NullSink),
        )
    }

    fn path(raw: &str) -> TrackerPath {
        raw.parse().unwrap()
    }

    #[tokio::test]
    async fn test_ensure_creates_ancestors() {
        let tree = tree();
        tree.ensure(&path("a/b/c"), TrackerKind::Counter).unwrap();

        let paths: Vec<String> = tree.paths().iter().map(|p| p.to_string()).collect();
        assert_eq!(paths, vec!["/", "a", "a/b", "a/b/c"]);
        assert_eq!(tree.kind_of(&path("a/b")), Some(TrackerKind::Generic));
        assert_eq!(tree.kind_of(&path("a/b/c")), Some(TrackerKind::Counter));
    }

    #[tokio::test]
    async fn test_parent_tracks_children() {
        let tree = tree();
        tree.ensure(&path("svc/web"), TrackerKind::Generic).unwrap();
        tree.ensure(&path("svc/db"), TrackerKind::Generic).unwrap();

        let snapshot = tree.snapshot(&path("svc")).await.unwrap();
        assert_eq!(snapshot.children, vec![path("svc/db"), path("svc/web")]);
        assert_eq!(snapshot.bindings, 0);
    }

    #[tokio::test]
    async fn test_generic_node_specializes_once() {
        let tree = tree();
        tree.ensure(&path("jobs/nightly"), TrackerKind::Generic).unwrap();
        tree.ensure(&path("jobs"), TrackerKind::Counter).unwrap();
        assert_eq!(tree.kind_of(&path("jobs")), Some(TrackerKind::Counter));

        let err = tree.ensure(&path("jobs"), TrackerKind::Log).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::TypeMismatch {
                expected: TrackerKind::Log,
                actual: TrackerKind::Counter,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let config = TreeConfig {
            max_depth: 2,
            ..TreeConfig::default()
        };
        let tree = TrackerTree::new(config, Arc::new(TokioHost::current()), Arc::new(NullSink));

        let err = tree.ensure(&path("a/b/c"), TrackerKind::Generic).unwrap_err();
        assert_eq!(err, TrackerError::InvalidPath(PathError::TooDeep { depth: 3, max: 2 }));
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn test_root_is_not_addressable() {
        let tree = tree();
        let err = tree.ensure(&TrackerPath::root(), TrackerKind::Generic).unwrap_err();
        assert_eq!(err, TrackerError::InvalidPath(PathError::Empty));
    }

    #[tokio::test]
    async fn test_release_binding_evicts_synchronously() {
        let tree = tree();
        let node = tree.resolve_or_create(&path("jobs/a"), TrackerKind::Counter, true).unwrap();

        tree.inner.release_binding(node.path(), node.id());
        assert!(!tree.contains(&path("jobs/a")));
        assert!(tree.is_empty());

        let fresh = tree.resolve_or_create(&path("jobs/a"), TrackerKind::Counter, true).unwrap();
        assert_ne!(fresh.id(), node.id());
    }

    #[tokio::test]
    async fn test_stale_release_leaves_new_incarnation() {
        let tree = tree();
        let old = tree.resolve_or_create(&path("a"), TrackerKind::Counter, true).unwrap();
        tree.inner.release_binding(old.path(), old.id());
        let new = tree.resolve_or_create(&path("a"), TrackerKind::Counter, true).unwrap();

        tree.inner.release_binding(old.path(), old.id());
        assert!(tree.contains(&path("a")));
        assert_eq!(tree.snapshot(&path("a")).await.unwrap().id, new.id());
    }

    #[tokio::test]
    async fn test_unbound_ancestors_leave_with_last_child() {
        let tree = tree();
        tree.ensure(&path("a/b"), TrackerKind::Counter).unwrap();
        let c = tree.resolve_or_create(&path("a/c"), TrackerKind::Log, true).unwrap();

        tree.inner.release_binding(c.path(), c.id());
        assert_eq!(tree.paths(), vec![TrackerPath::root(), path("a"), path("a/b")]);

        assert!(tree.remove(&path("a/b")));
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn test_failed_claim_keeps_ancestor_tallies() {
        let tree = tree();
        let leaf = tree.resolve_or_create(&path("jobs/nightly"), TrackerKind::Log, true).unwrap();
        tree.ensure(&path("jobs"), TrackerKind::Counter).unwrap();
        assert!(tree.ensure(&path("jobs/nightly"), TrackerKind::Counter).is_err());

        tree.inner.release_binding(leaf.path(), leaf.id());
        assert!(!tree.contains(&path("jobs/nightly")));
        // "jobs" was specialized but never bound, so it leaves with its child.
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn test_remove_orphans_children() {
        let tree = tree();
        let leaf = tree.resolve_or_create(&path("x/y"), TrackerKind::Counter, true).unwrap();

        assert!(!tree.remove(&path("x/y")));
        assert!(tree.remove(&path("x")));
        assert!(tree.contains(&path("x/y")));

        // The orphan re-attaches to a fresh parent on the next traversal.
        tree.ensure(&path("x/y"), TrackerKind::Counter).unwrap();
        let parent = tree.snapshot(&path("x")).await.unwrap();
        assert_eq!(parent.children, vec![path("x/y")]);

        tree.inner.release_binding(leaf.path(), leaf.id());
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn test_attach_rechecks_closed_flag() {
        let tree = tree();
        tree.inner.closed.store(true, Ordering::Release);

        let err = tree
            .inner
            .attach(&path("late"), TrackerKind::Generic, None, false, true)
            .unwrap_err();
        assert_eq!(err, TrackerError::TreeClosed);
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_refuses_new_nodes() {
        let tree = tree();
        tree.ensure(&path("a"), TrackerKind::Generic).unwrap();
        tree.shutdown();

        assert!(tree.is_empty());
        assert_eq!(
            tree.ensure(&path("a"), TrackerKind::Generic).unwrap_err(),
            TrackerError::TreeClosed
        );
    }
}
