//! External retrieval tools
//!
//! # Module Structure
//!
//! - [`search`](crate::tools::search) - Web search and page fetching (DuckDuckGo via daedra)
//!
//! ```ignore
//! let search = DaedraSearch::new();
//! for hit in search.search("rust programming", 5).await? {
//!     println!("{}: {}", hit.title, hit.url);
//! }
//! ```

/// Web search tool using DuckDuckGo.
pub mod search;

pub use search::{DaedraSearch, SearchHit, WebSearch};
