pub mod element;
pub mod resolver;
pub mod snapshot;
pub mod text;

pub use element::{DomElement, ElementRect};
pub use resolver::ElementResolver;
pub use snapshot::{ControlDescriptor, Snapshot, SnapshotProducer};
pub use text::summary_context;
