//! Source normalization.
//!
//! Callers hand us either a link or a free-text search term. Links to the
//! same video come in several shapes (watch page, `/shorts/` style paths,
//! the short-link host); all of them are rewritten to one canonical watch
//! link so argument building and logging only ever see a single form.

mod normalize;

pub use normalize::{canonical_watch_url, normalize, NormalizedSource, SourceInput};
