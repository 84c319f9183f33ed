//! Snapshot publication for external consumers.

pub mod snapshot;

pub use snapshot::{
    generate_snapshot, write_current_state, write_snapshot, write_snapshot_to_dir,
    SnapshotPublisher,
};
