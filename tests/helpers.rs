use devclass::{classification::Classifier, fetcher::RetryPolicy};
use std::sync::Arc;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

pub const CLASSIFICATION_PATH: &str = "/classification.cfm";

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("src/classification/tests/fixtures/{name}"))
        .expect("Failed to read test fixture")
}

/// Serve `status` and `body` for `?id=<code>` on the classification path.
pub async fn mount_page(server: &MockServer, code: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(CLASSIFICATION_PATH))
        .and(query_param("id", code))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_bytes(body.into_bytes())
                .insert_header("Content-Type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

pub fn test_classifier(server: &MockServer) -> Arc<Classifier> {
    let base = Url::parse(&format!("{}{}", server.uri(), CLASSIFICATION_PATH)).unwrap();
    let retry = RetryPolicy {
        max_attempts: 2,
        base_backoff_secs: 0,
    };
    Arc::new(Classifier::new(base, retry).unwrap())
}
