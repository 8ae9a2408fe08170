//! Hierarchical key-value store
//!
//! The [`TreeStore`] trait is the interface boundary to the external
//! persistent store: subtree reads, child writes, subtree deletes, and
//! key-ordered child listing, each atomic at the single-path level. There
//! are no multi-key transactions; callers issuing more than one store call
//! per operation accept that a concurrent write may land between them.
//!
//! [`MemoryStore`] is the shipped implementation: a lock-guarded tree with
//! optional whole-file JSON persistence. The push-key counter is stored
//! with the tree so generated ids stay unique across restarts. The store
//! is constructed once by the process composition root and shared by
//! handle.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use log::debug;
use serde::{Deserialize, Serialize};

/// Error type for store access.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A value in the hierarchical store: a string leaf, a bool leaf, or an
/// ordered branch. Branch children are kept in natural key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Bool(bool),
    Str(String),
    Branch(BTreeMap<String, Node>),
}

impl Node {
    /// Empty branch node.
    pub fn branch() -> Self {
        Node::Branch(BTreeMap::new())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_branch(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Branch(children) => Some(children),
            _ => None,
        }
    }

    fn is_empty_branch(&self) -> bool {
        matches!(self, Node::Branch(children) if children.is_empty())
    }
}

/// The hierarchical store at its interface boundary.
///
/// Paths are slices of key segments from the root. Every method resolves
/// atomically with respect to the others; nothing here holds a lock across
/// calls.
pub trait TreeStore {
    /// Read the subtree at `path`, or `None` if nothing is stored there.
    fn get(&self, path: &[&str]) -> Result<Option<Node>, StoreError>;

    /// Write `value` at `path`, creating intermediate branches as needed
    /// and replacing whatever was there before.
    fn set(&self, path: &[&str], value: Node) -> Result<(), StoreError>;

    /// Append `value` under `path` with a generated child key and return
    /// the key. Generated keys are unique and sort in insertion order.
    /// The shipped implementation pads the counter to ten digits, which
    /// holds the ordering guarantee for the first 10^10 pushes.
    fn push(&self, path: &[&str], value: Node) -> Result<String, StoreError>;

    /// Delete the subtree at `path`. Deleting an absent path is a no-op.
    fn delete(&self, path: &[&str]) -> Result<(), StoreError>;

    /// List child keys at `path` in natural key order, truncated to
    /// `limit`. An absent or leaf path yields an empty list.
    fn children(&self, path: &[&str], limit: usize) -> Result<Vec<String>, StoreError>;
}

/// In-memory tree store with optional JSON file persistence.
///
/// When opened with a backing file the whole tree is loaded at
/// construction and rewritten after every mutation. The push-key
/// high-water mark is persisted alongside the tree, so entry ids are
/// never reused across restarts even when the newest entry was deleted
/// before shutdown.
pub struct MemoryStore {
    root: RwLock<Node>,
    file: Option<PathBuf>,
    next_push: AtomicU64,
}

/// On-disk shape of a file-backed store: the tree plus the push-key
/// counter. The counter is carried explicitly; inferring it from
/// surviving keys would recycle the id of a deleted newest entry.
#[derive(Serialize, Deserialize)]
struct StoreFile {
    #[serde(rename = "nextPush")]
    next_push: u64,
    root: Node,
}

/// Borrowed form of [`StoreFile`] so persisting never clones the tree.
#[derive(Serialize)]
struct StoreFileRef<'a> {
    #[serde(rename = "nextPush")]
    next_push: u64,
    root: &'a Node,
}

impl MemoryStore {
    /// Ephemeral store with no backing file.
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Node::branch()),
            file: None,
            next_push: AtomicU64::new(0),
        }
    }

    /// Open a file-backed store, loading existing state if the file exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let state = if path.exists() {
            let raw = fs::read_to_string(path)
                .map_err(|e| StoreError::Unavailable(format!("read {}: {e}", path.display())))?;
            serde_json::from_str(&raw)
                .map_err(|e| StoreError::Unavailable(format!("parse {}: {e}", path.display())))?
        } else {
            StoreFile { next_push: 0, root: Node::branch() }
        };
        debug!("opened store at {} (next push key {})", path.display(), state.next_push);
        Ok(Self {
            root: RwLock::new(state.root),
            file: Some(path.to_path_buf()),
            next_push: AtomicU64::new(state.next_push),
        })
    }

    fn persist(&self, root: &Node) -> Result<(), StoreError> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        if let Some(parent) = file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Unavailable(format!("mkdir {}: {e}", parent.display())))?;
            }
        }
        let state = StoreFileRef {
            next_push: self.next_push.load(Ordering::SeqCst),
            root,
        };
        let raw = serde_json::to_string_pretty(&state)
            .map_err(|e| StoreError::Unavailable(format!("serialize store: {e}")))?;
        fs::write(file, raw)
            .map_err(|e| StoreError::Unavailable(format!("write {}: {e}", file.display())))?;
        debug!("persisted store to {}", file.display());
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeStore for MemoryStore {
    fn get(&self, path: &[&str]) -> Result<Option<Node>, StoreError> {
        let root = self.root.read().map_err(|_| poisoned())?;
        Ok(lookup(&root, path).cloned())
    }

    fn set(&self, path: &[&str], value: Node) -> Result<(), StoreError> {
        let mut root = self.root.write().map_err(|_| poisoned())?;
        insert(&mut root, path, value);
        self.persist(&root)
    }

    fn push(&self, path: &[&str], value: Node) -> Result<String, StoreError> {
        let key = format!("k{:010}", self.next_push.fetch_add(1, Ordering::SeqCst));
        let mut root = self.root.write().map_err(|_| poisoned())?;
        let mut child_path: Vec<&str> = path.to_vec();
        child_path.push(&key);
        insert(&mut root, &child_path, value);
        self.persist(&root)?;
        Ok(key)
    }

    fn delete(&self, path: &[&str]) -> Result<(), StoreError> {
        let mut root = self.root.write().map_err(|_| poisoned())?;
        remove(&mut root, path);
        self.persist(&root)
    }

    fn children(&self, path: &[&str], limit: usize) -> Result<Vec<String>, StoreError> {
        let root = self.root.read().map_err(|_| poisoned())?;
        let keys = match lookup(&root, path).and_then(Node::as_branch) {
            Some(children) => children.keys().take(limit).cloned().collect(),
            None => Vec::new(),
        };
        Ok(keys)
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}

fn lookup<'a>(node: &'a Node, path: &[&str]) -> Option<&'a Node> {
    let mut current = node;
    for segment in path {
        current = current.as_branch()?.get(*segment)?;
    }
    Some(current)
}

fn insert(node: &mut Node, path: &[&str], value: Node) {
    let Some((first, rest)) = path.split_first() else {
        *node = value;
        return;
    };
    // A leaf on the way down is replaced by a branch.
    if node.as_branch().is_none() {
        *node = Node::branch();
    }
    let Node::Branch(children) = node else { unreachable!() };
    let child = children.entry(first.to_string()).or_insert_with(Node::branch);
    insert(child, rest, value);
}

/// Delete the subtree at `path`, pruning branches emptied by the removal
/// so an exhausted list disappears instead of lingering as `{}`.
fn remove(node: &mut Node, path: &[&str]) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    let Node::Branch(children) = node else {
        return;
    };
    if rest.is_empty() {
        children.remove(*first);
    } else {
        let prune = match children.get_mut(*first) {
            Some(child) => {
                remove(child, rest);
                child.is_empty_branch()
            }
            None => false,
        };
        if prune {
            children.remove(*first);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_round_trip() {
        let store = MemoryStore::new();
        store.set(&["a", "b"], Node::Str("x".into())).unwrap();
        assert_eq!(store.get(&["a", "b"]).unwrap(), Some(Node::Str("x".into())));
        assert!(store.get(&["a", "missing"]).unwrap().is_none());
    }

    #[test]
    fn test_push_keys_sort_in_insertion_order() {
        let store = MemoryStore::new();
        let k1 = store.push(&["list"], Node::Str("first".into())).unwrap();
        let k2 = store.push(&["list"], Node::Str("second".into())).unwrap();
        let k3 = store.push(&["list"], Node::Str("third".into())).unwrap();
        assert!(k1 < k2 && k2 < k3);
        assert_eq!(store.children(&["list"], usize::MAX).unwrap(), vec![k1, k2, k3]);
    }

    #[test]
    fn test_children_ordered_and_truncated() {
        let store = MemoryStore::new();
        for key in ["c", "a", "b"] {
            store.set(&["tree", key], Node::Bool(true)).unwrap();
        }
        assert_eq!(store.children(&["tree"], usize::MAX).unwrap(), vec!["a", "b", "c"]);
        assert_eq!(store.children(&["tree"], 1).unwrap(), vec!["a"]);
        assert!(store.children(&["nowhere"], 5).unwrap().is_empty());
    }

    #[test]
    fn test_delete_is_idempotent_and_prunes() {
        let store = MemoryStore::new();
        store.set(&["a", "b", "c"], Node::Str("x".into())).unwrap();
        store.delete(&["a", "b", "c"]).unwrap();
        // Emptied ancestors are gone too.
        assert!(store.get(&["a"]).unwrap().is_none());
        // Deleting again is not an error.
        store.delete(&["a", "b", "c"]).unwrap();
    }

    #[test]
    fn test_file_persistence_and_push_seed() {
        let dir = std::env::temp_dir().join(format!("sift-tree-test-{}", std::process::id()));
        let path = dir.join("store.json");
        let _ = fs::remove_file(&path);

        let store = MemoryStore::open(&path).unwrap();
        let k1 = store.push(&["list"], Node::Str("one".into())).unwrap();
        drop(store);

        let reopened = MemoryStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(&["list", &k1]).unwrap(),
            Some(Node::Str("one".into()))
        );
        // A key pushed after reload sorts after every pre-existing key.
        let k2 = reopened.push(&["list"], Node::Str("two".into())).unwrap();
        assert!(k2 > k1);

        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir(&dir);
    }

    #[test]
    fn test_deleted_newest_id_is_not_recycled_after_reload() {
        let dir = std::env::temp_dir().join(format!("sift-tree-seed-{}", std::process::id()));
        let path = dir.join("store.json");
        let _ = fs::remove_file(&path);

        let store = MemoryStore::open(&path).unwrap();
        let k1 = store.push(&["reports", "a+com"], Node::Str("one".into())).unwrap();
        let k2 = store.push(&["reports", "a+com"], Node::Str("two".into())).unwrap();
        store.delete(&["reports", "a+com", &k2]).unwrap();
        drop(store);

        // The counter survives the restart even though its newest key does
        // not, so a stale id can never point at a different entry.
        let reopened = MemoryStore::open(&path).unwrap();
        let k3 = reopened.push(&["reports", "a+com"], Node::Str("three".into())).unwrap();
        assert_ne!(k3, k2);
        assert!(k3 > k2);
        assert!(k1 < k3);

        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir(&dir);
    }

    #[test]
    fn test_node_json_shape() {
        let store = MemoryStore::new();
        store.set(&["d", "disabled"], Node::Bool(true)).unwrap();
        store.set(&["d", "name"], Node::Str("x".into())).unwrap();
        let json = serde_json::to_value(store.get(&["d"]).unwrap().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"disabled": true, "name": "x"}));
    }
}
