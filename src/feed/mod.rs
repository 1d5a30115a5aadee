//! Feed metadata resolution for subscription previews.
//!
//! - **Extraction**: literal tag matching with an RSS/Atom fallback chain
//! - **Resolution**: URL validation, a single HTTP GET, and error reporting
//!
//! # Example
//!
//! ```no_run
//! use curio_feed::feed::FeedMetadataResolver;
//!
//! # async fn run() -> Result<(), curio_feed::feed::ResolveError> {
//! let resolver = FeedMetadataResolver::new(reqwest::Client::new());
//! let meta = resolver.resolve("https://example.com/feed.xml").await?;
//! println!("{}", meta.title);
//! # Ok(())
//! # }
//! ```

mod extract;
mod meta;
mod resolver;

pub use extract::{extract_atom, extract_feed_meta, extract_rss, sniff_format};
pub use meta::{FeedFormat, FeedMeta};
pub use resolver::{
    redirect_policy, FeedMetadataResolver, ResolveError, ResolverOptions, DEFAULT_MAX_BODY_BYTES,
    FEED_ACCEPT,
};
