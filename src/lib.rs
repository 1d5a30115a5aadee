//! Resolves the title and description of an RSS or Atom feed from its URL.

pub mod config;
pub mod feed;
pub mod util;
