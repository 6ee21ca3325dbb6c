//! Topograph Search - tag-guided graph search
//!
//! Finds "top" aggregate vertices from arbitrary start points, and collects
//! everything hanging under a top vertex, by following edges carrying
//! boolean tags instead of a declared model.

pub mod error;
pub mod filter;
pub mod tag;

pub use error::{SearchError, SearchResult};
pub use filter::{find_start_vertices, StartFilter};
pub use tag::{collect_tagged, find_top_nodes, tagged_neighbours, CollectOptions, PruneRule};
