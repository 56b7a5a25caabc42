pub mod aggregate;
pub mod dates;
pub mod export;
pub mod search;

pub use crate::domain::model::{Article, Platform, RawArticle, ScoredArticle};
pub use crate::domain::ports::{NewsSource, Storage};
pub use crate::utils::error::Result;
