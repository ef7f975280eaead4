pub mod recording;
pub mod stream_metadata;

pub use recording::{Recording, RecordingStatus};
pub use stream_metadata::{StreamMetadata, StreamStatus};
