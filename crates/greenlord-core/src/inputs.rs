//! The raw grant checker form, before any field is trusted.

use crate::error::ValidationError;
use crate::model::{GrantEligibilityInputs, ParseEnumError, Postcode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A form submission where every answer may be missing or misspelled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputForm {
    pub postcode: Option<String>,
    pub property_type: Option<String>,
    pub tenure: Option<String>,
    pub heating_system: Option<String>,
    pub current_epc_rating: Option<String>,
    pub tenant_benefit_status: Option<String>,
    pub tenant_income_status: Option<String>,
}

impl InputForm {
    /// Check every field, collecting one message per bad field.
    pub fn validate(&self) -> Result<GrantEligibilityInputs, ValidationError> {
        let mut errors = ValidationError::default();

        let postcode = match present(&self.postcode) {
            Some(raw) => match Postcode::parse(raw) {
                Ok(pc) => Some(pc),
                Err(e) => {
                    errors.errors.extend(e.errors);
                    None
                }
            },
            None => {
                errors.push("postcode", "Please enter a valid UK postcode");
                None
            }
        };

        let property_type = field(
            &mut errors,
            "propertyType",
            &self.property_type,
            "Please select a property type",
        );
        let tenure = field(
            &mut errors,
            "tenure",
            &self.tenure,
            "Please select property tenure (freehold or leasehold)",
        );
        let heating_system = field(
            &mut errors,
            "heatingSystem",
            &self.heating_system,
            "Please select your current heating system",
        );
        let current_epc_rating = field(
            &mut errors,
            "currentEpcRating",
            &self.current_epc_rating,
            "Please select your current EPC rating",
        );
        let tenant_benefit_status = field(
            &mut errors,
            "tenantBenefitStatus",
            &self.tenant_benefit_status,
            "Please indicate tenant benefit status",
        );
        let tenant_income_status = field(
            &mut errors,
            "tenantIncomeStatus",
            &self.tenant_income_status,
            "Please indicate tenant income level",
        );

        match (
            postcode,
            property_type,
            tenure,
            heating_system,
            current_epc_rating,
            tenant_benefit_status,
            tenant_income_status,
        ) {
            (Some(pc), Some(pt), Some(t), Some(h), Some(epc), Some(b), Some(i))
                if errors.is_empty() =>
            {
                Ok(GrantEligibilityInputs {
                    postcode: pc.to_string(),
                    property_type: pt,
                    tenure: t,
                    heating_system: h,
                    current_epc_rating: epc,
                    tenant_benefit_status: b,
                    tenant_income_status: i,
                })
            }
            _ => Err(errors),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn field<T>(
    errors: &mut ValidationError,
    name: &'static str,
    value: &Option<String>,
    missing: &str,
) -> Option<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    let Some(raw) = present(value) else {
        errors.push(name, missing);
        return None;
    };
    match raw.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            errors.push(name, e.to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CurrentEpcRating, PropertyType, TenantBenefitStatus};

    fn complete() -> InputForm {
        InputForm {
            postcode: Some("m1 4bt".into()),
            property_type: Some("terraced-house".into()),
            tenure: Some("freehold".into()),
            heating_system: Some("gas-boiler".into()),
            current_epc_rating: Some("unknown".into()),
            tenant_benefit_status: Some("yes".into()),
            tenant_income_status: Some("unknown".into()),
        }
    }

    #[test]
    fn test_complete_form_validates() {
        let inputs = complete().validate().unwrap();
        assert_eq!(inputs.postcode, "M1 4BT");
        assert_eq!(inputs.property_type, PropertyType::TerracedHouse);
        assert_eq!(inputs.current_epc_rating, CurrentEpcRating::Unknown);
        assert_eq!(inputs.tenant_benefit_status, TenantBenefitStatus::Yes);
    }

    #[test]
    fn test_empty_form_reports_every_field() {
        let err = InputForm::default().validate().unwrap_err();
        assert_eq!(err.errors.len(), 7);
        assert_eq!(
            err.message_for("propertyType"),
            Some("Please select a property type")
        );
        assert_eq!(
            err.message_for("postcode"),
            Some("Please enter a valid UK postcode")
        );
    }

    #[test]
    fn test_bad_postcode_and_enum_both_reported() {
        let mut form = complete();
        form.postcode = Some("not a postcode".into());
        form.heating_system = Some("wood-stove".into());
        let err = form.validate().unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert!(err
            .message_for("heatingSystem")
            .unwrap()
            .contains("wood-stove"));
    }

    #[test]
    fn test_whitespace_only_is_missing() {
        let mut form = complete();
        form.tenure = Some("   ".into());
        let err = form.validate().unwrap_err();
        assert_eq!(
            err.message_for("tenure"),
            Some("Please select property tenure (freehold or leasehold)")
        );
    }
}
