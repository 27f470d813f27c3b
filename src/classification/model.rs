use serde::{Deserialize, Serialize};
use url::Url;

use crate::classification::field::Field;

/// One product-classification page, field by field.
///
/// Field order is the persisted order. Every field is always present; the
/// page leaving something out shows up as `"N/A"` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device: Field<String>,
    pub regulation_description: Field<String>,
    pub definition: Field<String>,
    pub physical_state: Field<String>,
    pub technical_method: Field<String>,
    pub target_area: Field<String>,
    pub regulation_medical_specialty: Field<String>,
    pub review_panel: Field<String>,
    pub product_code: Field<String>,
    pub premarket_review: Field<Vec<String>>,
    pub submission_type: Field<String>,
    pub regulation_number: Field<String>,
    pub device_class: Field<String>,
    pub gmp_exempt: Field<String>,
    pub summary_malfunction_reporting: Field<String>,
    pub implanted_device: Field<String>,
    pub life_sustain_support_device: Field<String>,
    pub recognized_consensus_standards: Field<Vec<String>>,
    pub url: Url,
}

impl DeviceRecord {
    /// A record with every field absent.
    pub fn blank(url: Url) -> Self {
        Self {
            device: Field::Absent,
            regulation_description: Field::Absent,
            definition: Field::Absent,
            physical_state: Field::Absent,
            technical_method: Field::Absent,
            target_area: Field::Absent,
            regulation_medical_specialty: Field::Absent,
            review_panel: Field::Absent,
            product_code: Field::Absent,
            premarket_review: Field::Absent,
            submission_type: Field::Absent,
            regulation_number: Field::Absent,
            device_class: Field::Absent,
            gmp_exempt: Field::Absent,
            summary_malfunction_reporting: Field::Absent,
            implanted_device: Field::Absent,
            life_sustain_support_device: Field::Absent,
            recognized_consensus_standards: Field::Absent,
            url,
        }
    }

    /// True when nothing but `url` was found.
    pub fn is_empty(&self) -> bool {
        let scalars = [
            &self.device,
            &self.regulation_description,
            &self.definition,
            &self.physical_state,
            &self.technical_method,
            &self.target_area,
            &self.regulation_medical_specialty,
            &self.review_panel,
            &self.product_code,
            &self.submission_type,
            &self.regulation_number,
            &self.device_class,
            &self.gmp_exempt,
            &self.summary_malfunction_reporting,
            &self.implanted_device,
            &self.life_sustain_support_device,
        ];

        scalars.iter().all(|field| field.is_absent())
            && self.premarket_review.is_absent()
            && self.recognized_consensus_standards.is_absent()
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Field and Url serialization cannot fail
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
