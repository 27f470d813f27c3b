use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

use crate::classification::{
    extract::{DeviceExtractor, ExtractError},
    model::DeviceRecord,
};
use crate::fetcher::{FetchError, RetryPolicy, fetch_with_retry};

#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("invalid product code: {0:?}")]
    InvalidProductCode(String),

    #[error("failed to fetch {product_code}: {source}")]
    Fetch {
        product_code: String,
        source: FetchError,
    },
}

impl ClassificationError {
    pub fn product_code(&self) -> &str {
        match self {
            Self::InvalidProductCode(code) => code,
            Self::Fetch { product_code, .. } => product_code,
        }
    }
}

/// Product codes are non-empty and purely alphabetic.
pub fn validate_product_code(code: &str) -> Result<(), ClassificationError> {
    if !code.is_empty() && code.chars().all(char::is_alphabetic) {
        Ok(())
    } else {
        Err(ClassificationError::InvalidProductCode(code.to_string()))
    }
}

/// Fetches and extracts classification pages for product codes.
#[derive(Debug)]
pub struct Classifier {
    base_url: Url,
    retry: RetryPolicy,
    extractor: DeviceExtractor,
}

impl Classifier {
    pub fn new(base_url: Url, retry: RetryPolicy) -> Result<Self, ExtractError> {
        Ok(Self {
            base_url,
            retry,
            extractor: DeviceExtractor::new()?,
        })
    }

    /// Address of the classification page for `product_code`.
    pub fn source_url(&self, product_code: &str) -> Result<Url, ClassificationError> {
        validate_product_code(product_code)?;
        let mut url = self.base_url.clone();
        url.query_pairs_mut().clear().append_pair("id", product_code);
        Ok(url)
    }

    /// Fetch and extract one product code.
    ///
    /// `Ok(None)` means the page exists but carries no classification data.
    #[instrument(skip_all, fields(product_code = %product_code))]
    pub async fn classify(
        &self,
        product_code: &str,
    ) -> Result<Option<DeviceRecord>, ClassificationError> {
        let url = self.source_url(product_code)?;
        debug!(%url, "fetching classification page");

        let page = fetch_with_retry(&url, &self.retry)
            .await
            .map_err(|source| ClassificationError::Fetch {
                product_code: product_code.to_string(),
                source,
            })?;

        info!(
            status = %page.status,
            charset = page.charset(),
            bytes = page.body_utf8.len(),
            "fetched classification page"
        );

        Ok(self.extract_page(&page.body_utf8, &url))
    }

    /// Extract an already fetched page. `url` is recorded as the source.
    pub fn classify_html(
        &self,
        product_code: &str,
        html: &str,
    ) -> Result<Option<DeviceRecord>, ClassificationError> {
        let url = self.source_url(product_code)?;
        Ok(self.extract_page(html, &url))
    }

    fn extract_page(&self, html: &str, url: &Url) -> Option<DeviceRecord> {
        let record = self.extractor.extract_html(html, url);
        if record.is_none() {
            info!(%url, "page carried no classification data");
        }
        record
    }
}
