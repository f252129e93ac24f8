pub mod backend;
pub mod http;
pub mod stream;
pub mod types;

pub use backend::{BackendError, ChatBackend, ChunkStream};
pub use http::HttpBackend;
pub use stream::{IngestError, IngestEvent, MalformedEnvelope, StreamFailure, StreamIngestor, ingest};
pub use types::{ChatRequest, WireMessage};
