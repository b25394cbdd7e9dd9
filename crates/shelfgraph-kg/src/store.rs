//! Blob persistence for the graph stores.
//!
//! The entity and relation stores are written as two independent bincode
//! blobs so a caller can reload either without the other. Each blob carries
//! a magic tag and a format version up front; a mismatch surfaces as a typed
//! error instead of silently misreading a stale artifact.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::{EntityStore, RelationStore};

/// Bumped on any structural change to a persisted store.
pub const STORE_FORMAT_VERSION: u32 = 1;

const BLOB_MAGIC: [u8; 4] = *b"SHLF";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("blob {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },
    #[error("blob {} is not a shelfgraph blob", .path.display())]
    BadMagic { path: PathBuf },
    #[error("blob {} has format version {found}, this build reads {expected}", .path.display())]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

#[derive(Serialize, Deserialize)]
struct BlobHeader {
    magic: [u8; 4],
    version: u32,
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    magic: [u8; 4],
    version: u32,
    payload: T,
}

pub fn save_entities(store: &EntityStore, path: &Path) -> Result<(), StoreError> {
    save_blob(store, path)
}

pub fn load_entities(path: &Path) -> Result<EntityStore, StoreError> {
    load_blob(path)
}

pub fn save_relations(store: &RelationStore, path: &Path) -> Result<(), StoreError> {
    save_blob(store, path)
}

pub fn load_relations(path: &Path) -> Result<RelationStore, StoreError> {
    load_blob(path)
}

/// Write any serializable payload as a version-tagged blob.
///
/// Shared by the graph blobs here and the keyword cache downstream so every
/// persisted artifact speaks the same envelope.
pub fn save_blob<T: Serialize>(payload: &T, path: &Path) -> Result<(), StoreError> {
    let envelope = Envelope {
        magic: BLOB_MAGIC,
        version: STORE_FORMAT_VERSION,
        payload,
    };
    let bytes = bincode::serialize(&envelope).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, bytes).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a version-tagged blob written by [`save_blob`].
pub fn load_blob<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let bytes = std::fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // Header first: a version check must not depend on the payload layout.
    let header: BlobHeader =
        bincode::deserialize(&bytes).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
    if header.magic != BLOB_MAGIC {
        return Err(StoreError::BadMagic {
            path: path.to_path_buf(),
        });
    }
    if header.version != STORE_FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: header.version,
            expected: STORE_FORMAT_VERSION,
        });
    }

    let envelope: Envelope<T> =
        bincode::deserialize(&bytes).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(envelope.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_graph;
    use crate::model::RawBookRecord;

    fn sample() -> Vec<RawBookRecord> {
        vec![
            RawBookRecord {
                url: Some("u/1".into()),
                name: Some("A".into()),
                author: Some("X".into()),
                rating: Some(8.8),
                ..Default::default()
            },
            RawBookRecord {
                url: Some("u/2".into()),
                name: Some("B".into()),
                author: Some("X".into()),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn blobs_round_trip_independently() {
        let dir = tempfile::tempdir().unwrap();
        let graph = build_graph(&sample());

        let epath = dir.path().join("entities.bin");
        let rpath = dir.path().join("relations.bin");
        save_entities(&graph.entities, &epath).unwrap();
        save_relations(&graph.relations, &rpath).unwrap();

        let entities = load_entities(&epath).unwrap();
        assert_eq!(entities, graph.entities);

        let relations = load_relations(&rpath).unwrap();
        assert_eq!(relations, graph.relations);
    }

    #[test]
    fn foreign_bytes_are_rejected_by_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.bin");
        std::fs::write(&path, b"garbage that is no blob").unwrap();
        assert!(matches!(
            load_entities(&path),
            Err(StoreError::BadMagic { .. })
        ));
    }

    #[test]
    fn truncated_blob_is_an_explicit_corruption_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.bin");

        let graph = build_graph(&sample());
        save_entities(&graph.entities, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        // Valid header, payload cut short.
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        match load_entities(&path) {
            Err(StoreError::Corrupt { .. }) => {}
            other => panic!("expected corruption error, got {other:?}"),
        }
    }

    #[test]
    fn missing_blob_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.bin");
        assert!(matches!(
            load_entities(&path),
            Err(StoreError::Io { .. })
        ));
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.bin");
        let graph = build_graph(&sample());

        let envelope = Envelope {
            magic: BLOB_MAGIC,
            version: STORE_FORMAT_VERSION + 1,
            payload: &graph.entities,
        };
        std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();

        match load_entities(&path) {
            Err(StoreError::UnsupportedVersion { found, expected, .. }) => {
                assert_eq!(found, STORE_FORMAT_VERSION + 1);
                assert_eq!(expected, STORE_FORMAT_VERSION);
            }
            other => panic!("expected version error, got {other:?}"),
        }
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.bin");
        let envelope = Envelope {
            magic: *b"XXXX",
            version: STORE_FORMAT_VERSION,
            payload: EntityStore::new(),
        };
        std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();
        assert!(matches!(
            load_entities(&path),
            Err(StoreError::BadMagic { .. })
        ));
    }
}
