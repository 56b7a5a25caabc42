use crate::domain::model::{NewsQuery, RawArticle};
use crate::utils::error::Result;
use async_trait::async_trait;

/// A keyword-driven news source that can be queried without authentication.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch(&self, query: &NewsQuery) -> Result<Vec<RawArticle>>;
}

/// File storage rooted at a base directory (the downloads dir in practice).
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
