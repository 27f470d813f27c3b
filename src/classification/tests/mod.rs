use std::fs;
use url::Url;

use crate::classification::{DeviceExtractor, DeviceRecord, Field};

const SOURCE: &str =
    "https://www.accessdata.fda.gov/scripts/cdrh/cfdocs/cfPCD/classification.cfm?id=BTR";

fn extract_fixture(name: &str) -> Option<DeviceRecord> {
    let html = fs::read_to_string(format!("src/classification/tests/fixtures/{name}"))
        .expect("Failed to read test fixture");
    let url = Url::parse(SOURCE).unwrap();
    DeviceExtractor::new().unwrap().extract_html(&html, &url)
}

fn present(text: &str) -> Field<String> {
    Field::Present(text.to_string())
}

#[test]
fn test_extract_full_page() {
    let record = extract_fixture("tracheal_tube.html").expect("record");

    assert_eq!(record.device, present("Tube, Tracheal (W/Wo Connector)"));
    assert_eq!(record.regulation_description, present("Tracheal tube."));
    assert_eq!(
        record.definition,
        present(
            "A tracheal tube is a device inserted into a patient's trachea via the nose or mouth and used to maintain an open airway."
        )
    );
    assert_eq!(record.regulation_medical_specialty, present("Anesthesiology"));
    assert_eq!(record.review_panel, present("Anesthesiology"));
    assert_eq!(record.product_code, present("BTR"));
    assert_eq!(record.submission_type, present("510(k)"));
    assert_eq!(record.regulation_number, present("868.5730"));
    assert_eq!(record.device_class, present("2"));
    assert_eq!(record.gmp_exempt, present("No"));
    assert_eq!(record.summary_malfunction_reporting, present("Eligible"));
    assert_eq!(record.implanted_device, present("No"));
    assert_eq!(record.life_sustain_support_device, present("Yes"));
    assert_eq!(record.url.as_str(), SOURCE);
}

#[test]
fn test_rows_missing_from_page_are_absent() {
    let record = extract_fixture("tracheal_tube.html").expect("record");

    assert!(record.physical_state.is_absent());
    assert!(record.technical_method.is_absent());
    assert!(record.target_area.is_absent());

    let value = record.to_json();
    assert_eq!(value["physical_state"], "N/A");
    assert_eq!(value["technical_method"], "N/A");
    assert_eq!(value["target_area"], "N/A");
}

#[test]
fn test_premarket_review_entries() {
    let record = extract_fixture("tracheal_tube.html").expect("record");

    assert_eq!(
        record.premarket_review,
        Field::Present(vec![
            "Office of Health Technology 1 (OHT1)".to_string(),
            "Division of Anesthesiology, General Hospital, Respiratory, Infection Control, and Dental Devices (DHT1C)".to_string(),
            "Submitted under 510(k); see 21 CFR 868.9 for limitations".to_string(),
        ])
    );
}

#[test]
fn test_consensus_standards_skip_items_without_number() {
    let record = extract_fixture("tracheal_tube.html").expect("record");

    assert_eq!(
        record.recognized_consensus_standards,
        Field::Present(vec![
            "1-146 ISO 5361 Third edition 2016-04-01 Anaesthetic and respiratory equipment - Tracheal tubes and connectors".to_string(),
            "1-147 ISO 5366 First edition 2016-10-15 Anaesthetic and respiratory equipment - Tracheostomy tubes and connectors".to_string(),
        ])
    );
}

#[test]
fn test_unknown_code_page_has_no_data() {
    assert!(extract_fixture("unknown_code.html").is_none());
}

#[test]
fn test_malformed_html() {
    let html = "<html><body><table><tr><th>Device<td>Cannula, Surgical<tr><th>Device Class<td>1";
    let url = Url::parse(SOURCE).unwrap();
    let record = DeviceExtractor::new().unwrap().extract_html(html, &url);

    // The parser closes the cells itself
    let record = record.expect("record");
    assert_eq!(record.device, present("Cannula, Surgical"));
    assert_eq!(record.device_class, present("1"));
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extract_never_panics(html in ".*") {
            let url = Url::parse(SOURCE).unwrap();
            let _ = DeviceExtractor::new().unwrap().extract_html(&html, &url);
        }

        #[test]
        fn test_extracted_text_is_never_empty(cell in "[a-z \t\r\n]{0,20}") {
            let html = format!("<table><tr><th>Definition</th><td>{cell}</td></tr></table>");
            let url = Url::parse(SOURCE).unwrap();
            if let Some(record) = DeviceExtractor::new().unwrap().extract_html(&html, &url) {
                match record.definition {
                    Field::Present(text) => prop_assert!(!text.is_empty()),
                    Field::Absent => prop_assert!(false, "a non-empty record needs a definition"),
                }
            }
        }
    }
}
