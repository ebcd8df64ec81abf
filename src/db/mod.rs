//! Database layer (Firestore).

pub mod firestore;

pub use self::firestore::{new_document_id, FirestoreDb};

/// Collection names as constants.
pub mod collections {
    /// Survivor stories (keyed by 24-hex document id)
    pub const STORIES: &str = "stories";
}
