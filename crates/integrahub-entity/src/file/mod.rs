//! File and folder domain entities.

pub mod model;

pub use model::{FileRecord, HOME_FOLDER, NewFile};
