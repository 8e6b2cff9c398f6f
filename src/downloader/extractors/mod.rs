// Variant extraction
//
// - cli: metadata via the native `yt-dlp` binary (structured provider)
// - pinterest: embedded page state scrape (direct provider)
// - orchestrator: picks the path for a provider kind

mod cli;
mod orchestrator;
mod pinterest;
mod traits;

pub use cli::CliInfoExtractor;
pub use orchestrator::VariantExtractor;
pub use pinterest::{parse_pin_page, HttpPageFetcher, STATE_SCRIPT_ID};
pub use traits::{ExtractorConfig, MetadataSource, PageFetcher};
