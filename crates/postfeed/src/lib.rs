pub mod error;
pub mod feeds;
pub mod index;
pub mod loader;
pub mod pages;
pub mod parsing;
pub mod pipeline;
pub mod types;
pub mod xml;

pub use error::*;
pub use feeds::*;
pub use index::*;
pub use loader::*;
pub use pages::*;
pub use parsing::*;
pub use pipeline::*;
pub use types::*;
