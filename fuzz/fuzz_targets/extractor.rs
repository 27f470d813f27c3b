#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::LazyLock;
use url::Url;

use devclass::classification::DeviceExtractor;

static EXTRACTOR: LazyLock<DeviceExtractor> =
    LazyLock::new(|| DeviceExtractor::new().expect("selectors compile"));

static SOURCE: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://www.accessdata.fda.gov/scripts/cdrh/cfdocs/cfPCD/classification.cfm?id=BTR")
        .unwrap()
});

fuzz_target!(|data: &[u8]| {
    // Handle invalid UTF-8 the way the fetcher would have
    let html = String::from_utf8_lossy(data);

    // The extractor should never panic regardless of input
    if let Some(record) = EXTRACTOR.extract_html(&html, &SOURCE) {
        let _ = record.to_json();
    }
});
