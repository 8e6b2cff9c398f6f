// Downloader module - variant extraction, selection and acquisition

pub mod backends;
pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod tools;
pub mod traits;
pub mod utils;

pub use errors::{
    AcquisitionError, DeliveryError, RelayError, ResolutionError, SelectionError, TransportError,
};
pub use format_selector::FormatSelector;
pub use models::{
    Artifact, ChoiceEntry, ChoiceSet, DirectMedia, ExtractionResult, FetchParams, MediaKind,
    MediaVariant, MessageRef, ProbeResult, ProviderKind, RequesterId, StreamDescriptor, SIZE_LIMIT,
};
pub use orchestrator::Downloader;
pub use traits::{ChatTransport, FetchJob, MediaFetcher};
