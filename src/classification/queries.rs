//! Row labels on the classification page and how each cell is read.

/// How a row's header cell is matched against the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMatch {
    /// One of the header's own text nodes equals the label.
    Exact,
    /// The header's first text node contains the label. Used where the
    /// header carries a trailing help link or footnote.
    Contains,
}

/// Where the value sits inside the data cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellValue {
    /// First text node directly inside the cell.
    Text,
    /// First text node of the cell's link.
    LinkText,
}

/// Casing applied once the text is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Casing {
    FirstLetter,
    EveryWord,
}

#[derive(Debug, Clone, Copy)]
pub struct RowQuery {
    pub label: &'static str,
    pub header: HeaderMatch,
    pub value: CellValue,
    pub casing: Casing,
}

const fn text_row(label: &'static str) -> RowQuery {
    RowQuery {
        label,
        header: HeaderMatch::Exact,
        value: CellValue::Text,
        casing: Casing::FirstLetter,
    }
}

pub const DEVICE: RowQuery = RowQuery {
    casing: Casing::EveryWord,
    ..text_row("Device")
};
pub const REGULATION_DESCRIPTION: RowQuery = text_row("Regulation Description");
pub const DEFINITION: RowQuery = text_row("Definition");
pub const PHYSICAL_STATE: RowQuery = text_row("Physical State");
pub const TECHNICAL_METHOD: RowQuery = text_row("Technical Method");
pub const TARGET_AREA: RowQuery = text_row("Target Area");
pub const REGULATION_MEDICAL_SPECIALTY: RowQuery = text_row("Regulation Medical Specialty");
pub const REVIEW_PANEL: RowQuery = text_row("Review Panel");
pub const PRODUCT_CODE: RowQuery = text_row("Product Code");
pub const SUBMISSION_TYPE: RowQuery = text_row("Submission Type");
pub const REGULATION_NUMBER: RowQuery = RowQuery {
    value: CellValue::LinkText,
    ..text_row("Regulation Number")
};
pub const DEVICE_CLASS: RowQuery = text_row("Device Class");
pub const GMP_EXEMPT: RowQuery = text_row("GMP Exempt?");
// The header reads "Summary Malfunction<br>Reporting"
pub const SUMMARY_MALFUNCTION_REPORTING: RowQuery = text_row("Reporting");
pub const IMPLANTED_DEVICE: RowQuery = RowQuery {
    header: HeaderMatch::Contains,
    ..text_row("Implanted Device?")
};
pub const LIFE_SUSTAIN_SUPPORT_DEVICE: RowQuery = RowQuery {
    header: HeaderMatch::Contains,
    ..text_row("Life-Sustain/Support Device?")
};

pub const PREMARKET_REVIEW_LABEL: &str = "Premarket Review";
pub const CONSENSUS_STANDARDS_LABEL: &str = "Recognized Consensus Standards";
