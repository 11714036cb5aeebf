// src/gateway/mod.rs
// Generation Gateway: everything between an operation request and a validated result.

pub mod cache;
pub mod deadline;
pub mod extract;
pub mod prompts;
pub mod scenes;
pub mod service;
pub mod transport;

pub use cache::{cache_key, FileStore, KeyValueStore, MemoryStore, ResponseCache};
pub use deadline::{with_deadline, DeadlineElapsed};
pub use prompts::{build_request, BuiltRequest, GenerationRequest, Subject};
pub use scenes::attribute_scenes;
pub use service::{GeneratedImage, GenerationGateway, ImageSource, ObjectImage};
pub use transport::{GenerationTransport, RawOutput};
