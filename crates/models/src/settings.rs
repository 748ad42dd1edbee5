use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

pub const DEFAULT_CURRENCY: &str = "RWF";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Fare configuration held by `GET|PUT /admin/settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareSettings {
    pub base_fare: f64,
    pub per_km_rate: f64,
    pub service_fee_percent: f64,
    pub cancellation_fee: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl FareSettings {
    pub fn validate(&self) -> Result<(), ModelError> {
        for (name, value) in [
            ("base_fare", self.base_fare),
            ("per_km_rate", self.per_km_rate),
            ("cancellation_fee", self.cancellation_fee),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::Validation(format!("{name} must be a non-negative number")));
            }
        }
        if !(0.0..=100.0).contains(&self.service_fee_percent) {
            return Err(ModelError::Validation("service_fee_percent must be within 0..=100".into()));
        }
        if self.currency.trim().is_empty() {
            return Err(ModelError::required("currency"));
        }
        Ok(())
    }
}

/// Partially filled settings form; every field must be present to submit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsForm {
    pub base_fare: Option<f64>,
    pub per_km_rate: Option<f64>,
    pub service_fee_percent: Option<f64>,
    pub cancellation_fee: Option<f64>,
    pub currency: Option<String>,
}

impl SettingsForm {
    /// Pre-fill from the server's current values, like the edit form does.
    pub fn from_current(current: &FareSettings) -> Self {
        Self {
            base_fare: Some(current.base_fare),
            per_km_rate: Some(current.per_km_rate),
            service_fee_percent: Some(current.service_fee_percent),
            cancellation_fee: Some(current.cancellation_fee),
            currency: Some(current.currency.clone()),
        }
    }

    /// Overlay the fields set in `edits`.
    pub fn apply(mut self, edits: SettingsForm) -> Self {
        self.base_fare = edits.base_fare.or(self.base_fare);
        self.per_km_rate = edits.per_km_rate.or(self.per_km_rate);
        self.service_fee_percent = edits.service_fee_percent.or(self.service_fee_percent);
        self.cancellation_fee = edits.cancellation_fee.or(self.cancellation_fee);
        self.currency = edits.currency.or(self.currency);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == SettingsForm::default()
    }

    pub fn into_settings(self) -> Result<FareSettings, ModelError> {
        let settings = FareSettings {
            base_fare: self.base_fare.ok_or_else(|| ModelError::required("base_fare"))?,
            per_km_rate: self.per_km_rate.ok_or_else(|| ModelError::required("per_km_rate"))?,
            service_fee_percent: self
                .service_fee_percent
                .ok_or_else(|| ModelError::required("service_fee_percent"))?,
            cancellation_fee: self.cancellation_fee.ok_or_else(|| ModelError::required("cancellation_fee"))?,
            currency: self.currency.unwrap_or_else(default_currency),
        };
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> FareSettings {
        FareSettings {
            base_fare: 1000.0,
            per_km_rate: 300.0,
            service_fee_percent: 10.0,
            cancellation_fee: 500.0,
            currency: "RWF".into(),
        }
    }

    #[test]
    fn currency_defaults_when_absent() {
        let s: FareSettings = serde_json::from_str(
            r#"{"base_fare":1,"per_km_rate":2,"service_fee_percent":3,"cancellation_fee":4}"#,
        )
        .unwrap();
        assert_eq!(s.currency, "RWF");
    }

    #[test]
    fn partial_edit_keeps_other_fields() {
        let edits = SettingsForm { per_km_rate: Some(350.0), ..SettingsForm::default() };
        let s = SettingsForm::from_current(&current()).apply(edits).into_settings().unwrap();
        assert_eq!(s.per_km_rate, 350.0);
        assert_eq!(s.base_fare, 1000.0);
    }

    #[test]
    fn missing_field_blocks_submission() {
        let form = SettingsForm { base_fare: Some(1.0), ..SettingsForm::default() };
        assert_eq!(form.into_settings(), Err(ModelError::required("per_km_rate")));
    }

    #[test]
    fn service_fee_out_of_range() {
        let s = FareSettings { service_fee_percent: 120.0, ..current() };
        assert!(s.validate().is_err());
    }
}
