use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

use crate::classification::{
    field::Field,
    model::DeviceRecord,
    normalize::{clean_nbsp, normalize, title_case},
    premarket,
    queries::{self, Casing, CellValue, HeaderMatch, RowQuery},
};

const ROW_HEADER_SELECTOR: &str = "tr > th";
const SECTION_MARKER_SELECTOR: &str = "td > strong";
const LIST_ITEM_SELECTOR: &str = "li";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("invalid selector {selector:?}: {reason}")]
    Selector {
        selector: &'static str,
        reason: String,
    },
}

/// Reads a classification page into a [`DeviceRecord`].
///
/// Holds only compiled selectors, so one instance can be shared across
/// threads and reused for every page.
#[derive(Debug)]
pub struct DeviceExtractor {
    row_headers: Selector,
    section_markers: Selector,
    list_items: Selector,
}

impl DeviceExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            row_headers: compile(ROW_HEADER_SELECTOR)?,
            section_markers: compile(SECTION_MARKER_SELECTOR)?,
            list_items: compile(LIST_ITEM_SELECTOR)?,
        })
    }

    /// Parse `html` and extract it. See [`DeviceExtractor::extract`].
    pub fn extract_html(&self, html: &str, url: &Url) -> Option<DeviceRecord> {
        let document = Html::parse_document(html);
        self.extract(&document, url)
    }

    /// Extract every field; `None` when the page yields nothing but its url.
    pub fn extract(&self, document: &Html, url: &Url) -> Option<DeviceRecord> {
        let record = DeviceRecord {
            device: self.scalar(document, &queries::DEVICE),
            regulation_description: self.scalar(document, &queries::REGULATION_DESCRIPTION),
            definition: self.scalar(document, &queries::DEFINITION),
            physical_state: self.scalar(document, &queries::PHYSICAL_STATE),
            technical_method: self.scalar(document, &queries::TECHNICAL_METHOD),
            target_area: self.scalar(document, &queries::TARGET_AREA),
            regulation_medical_specialty: self
                .scalar(document, &queries::REGULATION_MEDICAL_SPECIALTY),
            review_panel: self.scalar(document, &queries::REVIEW_PANEL),
            product_code: self.scalar(document, &queries::PRODUCT_CODE),
            premarket_review: self.premarket_review(document),
            submission_type: self.scalar(document, &queries::SUBMISSION_TYPE),
            regulation_number: self.scalar(document, &queries::REGULATION_NUMBER),
            device_class: self.scalar(document, &queries::DEVICE_CLASS),
            gmp_exempt: self.scalar(document, &queries::GMP_EXEMPT),
            summary_malfunction_reporting: self
                .scalar(document, &queries::SUMMARY_MALFUNCTION_REPORTING),
            implanted_device: self.scalar(document, &queries::IMPLANTED_DEVICE),
            life_sustain_support_device: self
                .scalar(document, &queries::LIFE_SUSTAIN_SUPPORT_DEVICE),
            recognized_consensus_standards: self.consensus_standards(document),
            url: url.clone(),
        };

        (!record.is_empty()).then_some(record)
    }

    fn scalar(&self, document: &Html, query: &RowQuery) -> Field<String> {
        let raw = self
            .data_cells(document, query.label, query.header)
            .find_map(|cell| match query.value {
                CellValue::Text => own_text(cell).next(),
                CellValue::LinkText => {
                    child_elements(cell, "a").find_map(|link| own_text(link).next())
                }
            });

        let text = normalize(raw).map(|text| match query.casing {
            Casing::FirstLetter => text,
            Casing::EveryWord => title_case(&text),
        });

        Field::from_text(text)
    }

    fn premarket_review(&self, document: &Html) -> Field<Vec<String>> {
        let fragments = self
            .data_cells(document, queries::PREMARKET_REVIEW_LABEL, HeaderMatch::Exact)
            .flat_map(|cell| cell.text());

        Field::from_entries(premarket::segment(fragments))
    }

    fn consensus_standards(&self, document: &Html) -> Field<Vec<String>> {
        let mut seen = HashSet::new();
        let entries = document
            .select(&self.section_markers)
            .filter(|marker| own_text(*marker).any(|t| t == queries::CONSENSUS_STANDARDS_LABEL))
            .flat_map(|marker| following_elements(marker, "table"))
            .flat_map(|table| table.select(&self.list_items))
            .filter(|item| seen.insert(item.id()))
            .filter_map(standard_entry)
            .collect();

        Field::from_entries(entries)
    }

    /// First data cell of every row whose header carries `label`, in
    /// document order.
    fn data_cells<'a>(
        &'a self,
        document: &'a Html,
        label: &'a str,
        mode: HeaderMatch,
    ) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        document
            .select(&self.row_headers)
            .filter(move |header| header_matches(*header, label, mode))
            .filter_map(|header| following_elements(header, "td").next())
    }
}

fn compile(selector: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector,
        reason: e.to_string(),
    })
}

fn header_matches(header: ElementRef<'_>, label: &str, mode: HeaderMatch) -> bool {
    match mode {
        HeaderMatch::Exact => own_text(header).any(|text| text == label),
        HeaderMatch::Contains => own_text(header)
            .next()
            .is_some_and(|text| text.contains(label)),
    }
}

/// `<li>&nbsp;5-120 <a>ISO 5361 ...</a></li>` becomes `"5-120 ISO 5361 ..."`.
fn standard_entry(item: ElementRef<'_>) -> Option<String> {
    let number = clean_nbsp(own_text(item).next()?);
    let description = clean_nbsp(child_elements(item, "a").find_map(|link| own_text(link).next())?);
    if number.is_empty() || description.is_empty() {
        return None;
    }
    Some(format!("{number} {description}"))
}

/// Text nodes that are direct children of `element`.
fn own_text<'a>(element: ElementRef<'a>) -> impl Iterator<Item = &'a str> {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
}

fn child_elements<'a>(element: ElementRef<'a>, name: &'a str) -> impl Iterator<Item = ElementRef<'a>> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

fn following_elements<'a>(
    element: ElementRef<'a>,
    name: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .filter(move |sibling| sibling.value().name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://example.gov/classification.cfm?id=FTL").unwrap()
    }

    fn extract(body: &str) -> Option<DeviceRecord> {
        let html = format!("<html><body><table>{body}</table></body></html>");
        DeviceExtractor::new().unwrap().extract_html(&html, &url())
    }

    #[test]
    fn test_device_is_title_cased() {
        let record = extract("<tr><th>Device</th><td>surgical mesh</td></tr>").unwrap();
        assert_eq!(record.device, Field::Present("Surgical Mesh".to_string()));
    }

    #[test]
    fn test_missing_rows_are_absent() {
        let record = extract("<tr><th>Device Class</th><td>2</td></tr>").unwrap();
        assert_eq!(record.device_class, Field::Present("2".to_string()));
        assert!(record.device.is_absent());
        assert!(record.definition.is_absent());
        assert!(record.regulation_number.is_absent());
        assert!(record.premarket_review.is_absent());
        assert!(record.recognized_consensus_standards.is_absent());
    }

    #[test]
    fn test_blank_cell_is_absent() {
        let record = extract(
            "<tr><th>Definition</th><td>\r\n\t&nbsp;</td></tr>\
             <tr><th>Device Class</th><td>1</td></tr>",
        )
        .unwrap();
        assert!(record.definition.is_absent());
    }

    #[test]
    fn test_header_label_must_match_exactly() {
        let record = extract(
            "<tr><th>Device Classification</th><td>wrong row</td></tr>\
             <tr><th>Device Class</th><td>3</td></tr>",
        )
        .unwrap();
        assert_eq!(record.device_class, Field::Present("3".to_string()));
        assert!(record.device.is_absent());
    }

    #[test]
    fn test_contains_match_for_flag_rows() {
        let record = extract(
            "<tr><th>Implanted Device? <a href=\"#fn\">*</a></th><td>\r\n  Yes  </td></tr>\
             <tr><th>Life-Sustain/Support Device?</th><td>No</td></tr>",
        )
        .unwrap();
        assert_eq!(record.implanted_device, Field::Present("Yes".to_string()));
        assert_eq!(
            record.life_sustain_support_device,
            Field::Present("No".to_string())
        );
    }

    #[test]
    fn test_regulation_number_reads_link_text() {
        let record = extract(
            "<tr><th>Regulation Number</th><td><a href=\"/cfr/868.5730\">868.5730</a></td></tr>",
        )
        .unwrap();
        assert_eq!(
            record.regulation_number,
            Field::Present("868.5730".to_string())
        );
    }

    #[test]
    fn test_header_split_by_line_break() {
        let record = extract(
            "<tr><th>Summary Malfunction<br>Reporting</th><td>eligible</td></tr>",
        )
        .unwrap();
        assert_eq!(
            record.summary_malfunction_reporting,
            Field::Present("Eligible".to_string())
        );
    }

    #[test]
    fn test_value_uses_first_following_cell() {
        let record = extract("<tr><th>Review Panel</th><td>Anesthesiology</td><td>ignored</td></tr>")
            .unwrap();
        assert_eq!(
            record.review_panel,
            Field::Present("Anesthesiology".to_string())
        );
    }

    #[test]
    fn test_premarket_review_segments_across_markup() {
        let record = extract(
            "<tr><th>Premarket Review</th><td>Submitted under<a href=\"#\"> 510(k)</a> see<br> above.\
             <br>Office of Health Technology 1 <a href=\"#\">(OHT1)</a></td></tr>",
        )
        .unwrap();
        assert_eq!(
            record.premarket_review,
            Field::Present(vec![
                "Submitted under 510(k) see above.".to_string(),
                "Office of Health Technology 1 (OHT1)".to_string(),
            ])
        );
    }

    #[test]
    fn test_consensus_standards() {
        let record = extract(
            "<tr><td colspan=\"2\"><strong>Recognized Consensus Standards</strong>\
             <table><tr><td><ul>\
             <li>&nbsp;ISO 1135-4 <a href=\"#\">Transfusion equipment</a></li>\
             <li>no link here</li>\
             </ul></td></tr></table></td></tr>",
        )
        .unwrap();
        assert_eq!(
            record.recognized_consensus_standards,
            Field::Present(vec!["ISO 1135-4 Transfusion equipment".to_string()])
        );
    }

    #[test]
    fn test_consensus_standards_without_items_is_absent() {
        let record = extract(
            "<tr><th>Device Class</th><td>2</td></tr>\
             <tr><td><strong>Recognized Consensus Standards</strong><table><tr><td></td></tr></table></td></tr>",
        )
        .unwrap();
        assert!(record.recognized_consensus_standards.is_absent());
    }

    #[test]
    fn test_page_without_fields_yields_none() {
        assert!(extract("<tr><th>Third Party Review</th><td>Not Third Party Eligible</td></tr>").is_none());
        let document = Html::parse_document("");
        assert!(DeviceExtractor::new().unwrap().extract(&document, &url()).is_none());
    }

    #[test]
    fn test_page_of_marker_values_yields_none() {
        let record = extract(
            "<tr><th>Device</th><td>n/a</td></tr>\
             <tr><th>Device Class</th><td>N/A</td></tr>",
        );
        assert!(record.is_none());
    }
}
