//! Hierarchical lock for name-path subtrees.
//!
//! Operations on the unified namespace are serialized by a tree-structured
//! reader/writer lock keyed by name paths. Acquiring a path takes shared
//! locks on every ancestor root-to-leaf and the requested mode at the leaf:
//! a writer at `lake.pg` therefore excludes every reader and writer below
//! `lake.pg`, while disjoint subtrees proceed concurrently.
//!
//! Acquisition is strictly top-down, which gives deadlock freedom; fairness
//! comes from the underlying write-preferring `RwLock`. Guards are RAII and
//! release on all exit paths. Nodes are reference-counted and pruned from
//! the tree once no holder or waiter remains.
//!
//! # Example
//!
//! ```rust
//! use strata_core::lock::{LockMode, TreeLock};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let lock = TreeLock::new();
//! let path = ["lake".to_string(), "pg".to_string()];
//!
//! let guard = lock.acquire(&path, LockMode::Write).await;
//! // ... mutate the catalog's schema set ...
//! drop(guard);
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// Lock mode requested at the leaf of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Shared access; excludes writers on this path and its ancestors.
    Read,
    /// Exclusive access; excludes all other holders at the leaf.
    Write,
}

/// A tree-structured reader/writer lock keyed by name paths.
#[derive(Debug, Clone, Default)]
pub struct TreeLock {
    root: Arc<LockNode>,
}

#[derive(Debug, Default)]
struct LockNode {
    lock: Arc<RwLock<()>>,
    children: Mutex<HashMap<String, Arc<LockNode>>>,
    /// Holders plus waiters currently routed through this node. A node is
    /// prunable only at zero.
    holds: AtomicUsize,
}

impl LockNode {
    fn children(&self) -> MutexGuard<'_, HashMap<String, Arc<LockNode>>> {
        // A poisoned map only means a panic elsewhere; the map itself is
        // still structurally sound for these single-operation sections.
        self.children.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches or creates the named child, registering a hold on it.
    ///
    /// The hold is registered under the parent's child-map mutex so pruning
    /// can never race with a fresh acquirer that already cloned the `Arc`.
    fn child_with_hold(&self, name: &str) -> Arc<Self> {
        let mut children = self.children();
        let child = children
            .entry(name.to_string())
            .or_default()
            .clone();
        child.holds.fetch_add(1, Ordering::SeqCst);
        child
    }

    fn prune_child(&self, name: &str) {
        let mut children = self.children();
        let prunable = children
            .get(name)
            .is_some_and(|c| c.holds.load(Ordering::SeqCst) == 0 && c.children().is_empty());
        if prunable {
            children.remove(name);
        }
    }

    fn subtree_size(&self) -> usize {
        1 + self
            .children()
            .values()
            .map(|c| c.subtree_size())
            .sum::<usize>()
    }
}

/// Held lock on one node; releasing is dropping.
#[derive(Debug)]
enum NodeGuard {
    Read {
        _guard: OwnedRwLockReadGuard<()>,
    },
    Write {
        _guard: OwnedRwLockWriteGuard<()>,
    },
}

/// One locked node on an acquired path.
#[derive(Debug)]
struct Hold {
    node: Arc<LockNode>,
    /// Parent node and child key, absent for the root.
    parent: Option<(Arc<LockNode>, String)>,
    /// Set once the node's lock is held. `None` only while the acquire
    /// future is still waiting on this node, so a cancelled acquire still
    /// unwinds its registered holds.
    guard: Option<NodeGuard>,
}

/// RAII guard over a locked name path.
///
/// Dropping the guard releases leaf-to-root and prunes nodes that no longer
/// carry holders, waiters, or children.
#[derive(Debug)]
pub struct TreeLockGuard {
    holds: Vec<Hold>,
}

impl Drop for TreeLockGuard {
    fn drop(&mut self) {
        while let Some(hold) = self.holds.pop() {
            drop(hold.guard);
            let remaining = hold.node.holds.fetch_sub(1, Ordering::SeqCst) - 1;
            if remaining == 0 {
                if let Some((parent, name)) = hold.parent {
                    parent.prune_child(&name);
                }
            }
        }
    }
}

impl TreeLock {
    /// Creates an empty lock tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the given path in the given mode.
    ///
    /// Ancestors are taken shared, the leaf in `mode`, strictly top-down.
    /// The returned guard releases everything on drop. Waits until the path
    /// is available; cancellation while waiting releases all partial state.
    pub async fn acquire(&self, path: &[String], mode: LockMode) -> TreeLockGuard {
        let mut acquired = TreeLockGuard {
            holds: Vec::with_capacity(path.len() + 1),
        };

        self.root.holds.fetch_add(1, Ordering::SeqCst);
        acquired.holds.push(Hold {
            node: self.root.clone(),
            parent: None,
            guard: None,
        });
        let root_mode = if path.is_empty() { mode } else { LockMode::Read };
        let guard = lock_node(&self.root, root_mode).await;
        if let Some(last) = acquired.holds.last_mut() {
            last.guard = Some(guard);
        }

        let mut current = self.root.clone();
        for (depth, name) in path.iter().enumerate() {
            let child = current.child_with_hold(name);
            acquired.holds.push(Hold {
                node: child.clone(),
                parent: Some((current.clone(), name.clone())),
                guard: None,
            });

            let node_mode = if depth + 1 == path.len() {
                mode
            } else {
                LockMode::Read
            };
            let guard = lock_node(&child, node_mode).await;
            if let Some(last) = acquired.holds.last_mut() {
                last.guard = Some(guard);
            }
            current = child;
        }

        acquired
    }

    /// Returns the number of nodes currently in the tree, root included.
    ///
    /// Exposed so housekeeping can be observed; the count shrinks back to 1
    /// once all guards on all paths are released.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.root.subtree_size()
    }
}

async fn lock_node(node: &Arc<LockNode>, mode: LockMode) -> NodeGuard {
    match mode {
        LockMode::Read => NodeGuard::Read {
            _guard: node.lock.clone().read_owned().await,
        },
        LockMode::Write => NodeGuard::Write {
            _guard: node.lock.clone().write_owned().await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn path(levels: &[&str]) -> Vec<String> {
        levels.iter().map(ToString::to_string).collect()
    }

    async fn is_pending<F: std::future::Future>(fut: F) -> bool {
        tokio::time::timeout(Duration::from_millis(50), fut)
            .await
            .is_err()
    }

    #[tokio::test]
    async fn readers_share_a_path() {
        let lock = TreeLock::new();
        let p = path(&["lake", "pg", "sales"]);

        let g1 = lock.acquire(&p, LockMode::Read).await;
        let g2 = lock.acquire(&p, LockMode::Read).await;
        drop((g1, g2));
    }

    #[tokio::test]
    async fn writer_excludes_readers_at_leaf() {
        let lock = TreeLock::new();
        let p = path(&["lake", "pg", "sales"]);

        let writer = lock.acquire(&p, LockMode::Write).await;
        assert!(is_pending(lock.acquire(&p, LockMode::Read)).await);

        drop(writer);
        let _reader = lock.acquire(&p, LockMode::Read).await;
    }

    #[tokio::test]
    async fn parent_writer_blocks_descendants() {
        let lock = TreeLock::new();
        let catalog = path(&["lake", "pg"]);
        let schema = path(&["lake", "pg", "sales"]);

        let writer = lock.acquire(&catalog, LockMode::Write).await;
        assert!(is_pending(lock.acquire(&schema, LockMode::Read)).await);
        assert!(is_pending(lock.acquire(&schema, LockMode::Write)).await);

        drop(writer);
        let _reader = lock.acquire(&schema, LockMode::Read).await;
    }

    #[tokio::test]
    async fn descendant_reader_blocks_parent_writer() {
        let lock = TreeLock::new();
        let catalog = path(&["lake", "pg"]);
        let schema = path(&["lake", "pg", "sales"]);

        let reader = lock.acquire(&schema, LockMode::Read).await;
        assert!(is_pending(lock.acquire(&catalog, LockMode::Write)).await);

        drop(reader);
        let _writer = lock.acquire(&catalog, LockMode::Write).await;
    }

    #[tokio::test]
    async fn disjoint_subtrees_do_not_contend() {
        let lock = TreeLock::new();

        let g1 = lock.acquire(&path(&["lake", "pg"]), LockMode::Write).await;
        let g2 = lock.acquire(&path(&["lake", "mem"]), LockMode::Write).await;
        drop((g1, g2));
    }

    #[tokio::test]
    async fn nodes_are_pruned_after_release() {
        let lock = TreeLock::new();
        assert_eq!(lock.node_count(), 1);

        let g = lock.acquire(&path(&["lake", "pg", "sales"]), LockMode::Write).await;
        assert_eq!(lock.node_count(), 4);

        drop(g);
        assert_eq!(lock.node_count(), 1);
    }

    #[tokio::test]
    async fn shared_prefix_survives_partial_release() {
        let lock = TreeLock::new();

        let g1 = lock.acquire(&path(&["lake", "pg", "a"]), LockMode::Read).await;
        let g2 = lock.acquire(&path(&["lake", "pg", "b"]), LockMode::Read).await;
        assert_eq!(lock.node_count(), 5);

        drop(g1);
        // The shared prefix stays while g2 holds it; only the leaf goes.
        assert_eq!(lock.node_count(), 4);

        drop(g2);
        assert_eq!(lock.node_count(), 1);
    }

    #[tokio::test]
    async fn cancelled_acquire_leaves_no_residue() {
        let lock = TreeLock::new();
        let p = path(&["lake", "pg"]);

        let writer = lock.acquire(&p, LockMode::Write).await;

        // This acquire parks on the leaf; dropping the future must unwind
        // the holds it registered.
        let pending = lock.acquire(&p, LockMode::Write);
        assert!(is_pending(pending).await);

        drop(writer);
        assert_eq!(lock.node_count(), 1);

        let _g = lock.acquire(&p, LockMode::Write).await;
    }

    #[tokio::test]
    async fn writers_serialize_under_contention() {
        let lock = TreeLock::new();
        let p = path(&["lake", "pg", "sales"]);
        let counter = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let lock = lock.clone();
                let p = p.clone();
                let counter = counter.clone();
                tokio::spawn(async move {
                    let _g = lock.acquire(&p, LockMode::Write).await;
                    // No other writer may be inside while we hold the leaf.
                    assert_eq!(counter.fetch_add(1, Ordering::SeqCst), 0);
                    tokio::task::yield_now().await;
                    counter.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for t in tasks {
            t.await.unwrap();
        }
    }
}
