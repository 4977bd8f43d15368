pub mod reader;
pub mod timestamp;

pub use reader::{EventReader, RawRecord, ReaderError};
