//! Snapshot assembly: walk a directory once and synthesize the Git object
//! graph that mirrors it, with one blob per file, one tree per directory,
//! and a single parentless commit on top.

pub mod store;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::Utc;

use crate::{
    errors::GitError,
    hash::ObjectHash,
    internal::{
        object::{
            ObjectTrait,
            blob::Blob,
            commit::Commit,
            signature::{Signature, SignatureType},
            tree::{Tree, TreeItem, TreeItemMode},
            types::ObjectType,
        },
        pack::entry::Entry,
    },
    snapshot::store::ObjectStore,
};

/// Name and email stamped on the synthetic commit.
const COMMIT_AUTHOR_NAME: &str = "GitDIR";
const COMMIT_AUTHOR_EMAIL: &str = "gitdir@localhost";
const COMMIT_MESSAGE: &str = "Initial commit";

/// The object graph for one directory state, captured at most once per
/// process. The head commit id doubles as the advertised value for both
/// `HEAD` and `refs/heads/main`.
#[derive(Debug)]
pub struct Snapshot {
    pub head: ObjectHash,
    pub tree_id: ObjectHash,
    pub store: ObjectStore,
}

impl Snapshot {
    /// Walk `root` and populate a fresh object store.
    ///
    /// Skip rules: directories named `.git` are pruned; files whose name
    /// starts with `.` are skipped. Other dot-directories are traversed.
    /// Empty subdirectories yield no tree entry; the root always yields a
    /// tree, possibly empty.
    pub fn capture(root: &Path) -> Result<Snapshot, GitError> {
        let mut store = ObjectStore::new();

        let tree_id = match build_tree(root, &mut store)? {
            Some(id) => id,
            None => {
                let empty = Tree::from_tree_items(vec![])?;
                let id = empty.id;
                store.insert(Entry::from(empty));
                id
            }
        };

        let timestamp = Utc::now().timestamp();
        let commit = Commit::new(
            signature(SignatureType::Author, timestamp),
            signature(SignatureType::Committer, timestamp),
            tree_id,
            vec![],
            COMMIT_MESSAGE,
        );
        let head = commit.id;
        store.insert(Entry::from(commit));

        tracing::info!(
            head = %head,
            tree = %tree_id,
            objects = store.len(),
            root = %root.display(),
            "directory snapshot captured"
        );

        Ok(Snapshot {
            head,
            tree_id,
            store,
        })
    }

    /// Collect every object reachable from `root`, ordered commit first,
    /// then trees, then blobs, as the pack encoder expects.
    pub fn reachable_entries(&self, root: &ObjectHash) -> Result<Vec<Entry>, GitError> {
        let root_entry = self
            .store
            .get(root)
            .ok_or_else(|| GitError::ObjectNotFound(root.to_string()))?
            .clone();

        let mut trees = Vec::new();
        let mut blobs = Vec::new();
        let mut visited = HashSet::new();

        let mut entries = Vec::new();
        match root_entry.obj_type {
            ObjectType::Commit => {
                let commit = Commit::from_bytes(&root_entry.data, root_entry.hash)?;
                self.collect_tree_entries(&commit.tree_id, &mut trees, &mut blobs, &mut visited)?;
                entries.push(root_entry);
            }
            ObjectType::Tree => {
                self.collect_tree_entries(&root_entry.hash, &mut trees, &mut blobs, &mut visited)?;
            }
            ObjectType::Blob => {
                entries.push(root_entry);
            }
        }
        entries.extend(trees);
        entries.extend(blobs);
        Ok(entries)
    }

    /// Depth-first walk over stored trees, deduplicating shared objects.
    fn collect_tree_entries(
        &self,
        tree_hash: &ObjectHash,
        trees: &mut Vec<Entry>,
        blobs: &mut Vec<Entry>,
        visited: &mut HashSet<ObjectHash>,
    ) -> Result<(), GitError> {
        if !visited.insert(*tree_hash) {
            return Ok(());
        }
        let entry = self
            .store
            .get(tree_hash)
            .ok_or_else(|| GitError::ObjectNotFound(tree_hash.to_string()))?
            .clone();
        let tree = Tree::from_bytes(&entry.data, entry.hash)?;

        for item in &tree.tree_items {
            match item.mode {
                TreeItemMode::Tree => {
                    self.collect_tree_entries(&item.id, trees, blobs, visited)?;
                }
                TreeItemMode::Blob | TreeItemMode::BlobExecutable | TreeItemMode::Link => {
                    if visited.insert(item.id) {
                        let blob = self
                            .store
                            .get(&item.id)
                            .ok_or_else(|| GitError::ObjectNotFound(item.id.to_string()))?
                            .clone();
                        blobs.push(blob);
                    }
                }
            }
        }

        trees.push(entry);
        Ok(())
    }
}

fn signature(signature_type: SignatureType, timestamp: i64) -> Signature {
    Signature::new_with_time(
        signature_type,
        COMMIT_AUTHOR_NAME.to_string(),
        COMMIT_AUTHOR_EMAIL.to_string(),
        timestamp,
        "+0000".to_string(),
    )
}

/// Recursively build the tree object for one directory, storing blobs and
/// subtrees along the way. Returns `None` for a directory that contributes
/// no entries.
fn build_tree(dir: &Path, store: &mut ObjectStore) -> Result<Option<ObjectHash>, GitError> {
    let mut dir_entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    // Deterministic walk regardless of readdir order.
    dir_entries.sort_by_key(|e| e.file_name());

    let mut items = Vec::new();
    for dir_entry in dir_entries {
        let file_name = dir_entry.file_name();
        let name = match file_name.to_str() {
            Some(s) => s.to_string(),
            None => {
                return Err(GitError::InvalidTreeItem(
                    file_name.to_string_lossy().to_string(),
                ));
            }
        };

        let file_type = dir_entry.file_type()?;
        if file_type.is_dir() {
            if name == ".git" {
                continue;
            }
            if let Some(subtree) = build_tree(&dir_entry.path(), store)? {
                items.push(TreeItem::new(TreeItemMode::Tree, subtree, name));
            }
            continue;
        }

        // Dotfiles are never part of the snapshot.
        if name.starts_with('.') {
            continue;
        }

        if file_type.is_symlink() {
            let target = fs::read_link(dir_entry.path())?;
            let blob = Blob::from_content_bytes(target.as_os_str().as_encoded_bytes().to_vec());
            items.push(TreeItem::new(TreeItemMode::Link, blob.id, name));
            store.insert(Entry::from(blob));
            continue;
        }

        let data = fs::read(dir_entry.path())?;
        let blob = Blob::from_content_bytes(data);
        let mode = file_mode(&dir_entry)?;
        items.push(TreeItem::new(mode, blob.id, name));
        store.insert(Entry::from(blob));
    }

    if items.is_empty() {
        return Ok(None);
    }

    let tree = Tree::from_tree_items(items)?;
    let id = tree.id;
    store.insert(Entry::from(tree));
    Ok(Some(id))
}

#[cfg(unix)]
fn file_mode(entry: &fs::DirEntry) -> Result<TreeItemMode, GitError> {
    use std::os::unix::fs::PermissionsExt;
    let mode = entry.metadata()?.permissions().mode();
    if mode & 0o111 != 0 {
        Ok(TreeItemMode::BlobExecutable)
    } else {
        Ok(TreeItemMode::Blob)
    }
}

#[cfg(not(unix))]
fn file_mode(_entry: &fs::DirEntry) -> Result<TreeItemMode, GitError> {
    Ok(TreeItemMode::Blob)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_file(dir: &Path, name: &str, content: &[u8]) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_capture_two_files() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "a.txt", b"A");
        write_file(tmp.path(), "b.txt", b"B");

        let snapshot = Snapshot::capture(tmp.path()).unwrap();
        // Two blobs, one tree, one commit.
        assert_eq!(snapshot.store.len(), 4);

        let tree_entry = snapshot.store.get(&snapshot.tree_id).unwrap();
        let tree = Tree::from_bytes(&tree_entry.data, tree_entry.hash).unwrap();
        let names: Vec<&str> = tree.tree_items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt"]);
    }

    #[test]
    fn test_known_blob_hash() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "x", b"hello\n");

        let snapshot = Snapshot::capture(tmp.path()).unwrap();
        let expected: ObjectHash = "ce013625030ba8dba906f756967f9e9ca394464a".parse().unwrap();
        assert!(snapshot.store.contains(&expected));
    }

    #[test]
    fn test_skip_rules() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "visible.txt", b"v");
        write_file(tmp.path(), ".secret", b"s");
        fs::create_dir(tmp.path().join(".git")).unwrap();
        write_file(&tmp.path().join(".git"), "config", b"c");

        let snapshot = Snapshot::capture(tmp.path()).unwrap();
        let tree_entry = snapshot.store.get(&snapshot.tree_id).unwrap();
        let tree = Tree::from_bytes(&tree_entry.data, tree_entry.hash).unwrap();
        let names: Vec<&str> = tree.tree_items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["visible.txt"]);
        // Neither hidden blob made it into the store: blob + tree + commit.
        assert_eq!(snapshot.store.len(), 3);
    }

    #[test]
    fn test_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "top.txt", b"top");
        fs::create_dir(tmp.path().join("sub")).unwrap();
        write_file(&tmp.path().join("sub"), "inner.txt", b"inner");
        fs::create_dir(tmp.path().join("empty")).unwrap();

        let snapshot = Snapshot::capture(tmp.path()).unwrap();
        let tree_entry = snapshot.store.get(&snapshot.tree_id).unwrap();
        let tree = Tree::from_bytes(&tree_entry.data, tree_entry.hash).unwrap();

        // Empty directories are not tracked.
        assert_eq!(tree.tree_items.len(), 2);
        let sub = tree
            .tree_items
            .iter()
            .find(|i| i.name == "sub")
            .expect("sub entry");
        assert_eq!(sub.mode, TreeItemMode::Tree);

        let sub_entry = snapshot.store.get(&sub.id).unwrap();
        let sub_tree = Tree::from_bytes(&sub_entry.data, sub_entry.hash).unwrap();
        assert_eq!(sub_tree.tree_items.len(), 1);
        assert_eq!(sub_tree.tree_items[0].name, "inner.txt");
    }

    #[test]
    fn test_empty_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::capture(tmp.path()).unwrap();

        // The empty tree plus the commit.
        assert_eq!(snapshot.store.len(), 2);
        assert_eq!(
            snapshot.tree_id.to_string(),
            "4b825dc642cb6eb9a060e54bf8d69288fbee4904"
        );
        let head = snapshot.store.get(&snapshot.head).unwrap();
        let commit = Commit::from_bytes(&head.data, head.hash).unwrap();
        assert_eq!(commit.tree_id, snapshot.tree_id);
        assert!(commit.parent_commit_ids.is_empty());
    }

    /// Every id referenced by a stored tree or commit must resolve.
    #[test]
    fn test_referential_integrity() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "a", b"1");
        fs::create_dir(tmp.path().join("d")).unwrap();
        write_file(&tmp.path().join("d"), "b", b"2");

        let snapshot = Snapshot::capture(tmp.path()).unwrap();
        for entry in snapshot.store.iter() {
            match entry.obj_type {
                ObjectType::Tree => {
                    let tree = Tree::from_bytes(&entry.data, entry.hash).unwrap();
                    for item in &tree.tree_items {
                        assert!(snapshot.store.contains(&item.id), "dangling {}", item.id);
                    }
                }
                ObjectType::Commit => {
                    let commit = Commit::from_bytes(&entry.data, entry.hash).unwrap();
                    assert!(snapshot.store.contains(&commit.tree_id));
                }
                ObjectType::Blob => {}
            }
        }
    }

    #[test]
    fn test_reachable_entries_order_and_coverage() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "a", b"1");
        fs::create_dir(tmp.path().join("d")).unwrap();
        write_file(&tmp.path().join("d"), "b", b"2");

        let snapshot = Snapshot::capture(tmp.path()).unwrap();
        let entries = snapshot.reachable_entries(&snapshot.head).unwrap();

        // Everything in the store is reachable from the head.
        assert_eq!(entries.len(), snapshot.store.len());
        assert_eq!(entries[0].obj_type, ObjectType::Commit);
        let kinds: Vec<ObjectType> = entries.iter().map(|e| e.obj_type).collect();
        let first_blob = kinds.iter().position(|k| *k == ObjectType::Blob).unwrap();
        let last_tree = kinds.iter().rposition(|k| *k == ObjectType::Tree).unwrap();
        assert!(last_tree < first_blob, "trees must precede blobs");
    }

    #[test]
    fn test_reachable_entries_unknown_root() {
        let tmp = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::capture(tmp.path()).unwrap();
        let res = snapshot.reachable_entries(&ObjectHash::default());
        assert!(matches!(res, Err(GitError::ObjectNotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_and_symlink_modes() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "run.sh", b"#!/bin/sh\n");
        let mut perms = fs::metadata(tmp.path().join("run.sh")).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(tmp.path().join("run.sh"), perms).unwrap();
        std::os::unix::fs::symlink("run.sh", tmp.path().join("link")).unwrap();

        let snapshot = Snapshot::capture(tmp.path()).unwrap();
        let tree_entry = snapshot.store.get(&snapshot.tree_id).unwrap();
        let tree = Tree::from_bytes(&tree_entry.data, tree_entry.hash).unwrap();

        let run = tree.tree_items.iter().find(|i| i.name == "run.sh").unwrap();
        assert_eq!(run.mode, TreeItemMode::BlobExecutable);

        let link = tree.tree_items.iter().find(|i| i.name == "link").unwrap();
        assert_eq!(link.mode, TreeItemMode::Link);
        let target = snapshot.store.get(&link.id).unwrap();
        assert_eq!(target.data, b"run.sh");
    }
}
