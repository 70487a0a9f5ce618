//! Built-in source registry for the HKMA public statistics API.

use crate::domain::{SourceConfig, SourceId};
use crate::error::AppError;

macro_rules! api_endpoint {
    ($path:literal) => {
        concat!("https://api.hkma.gov.hk/public/market-data-and-statistics/", $path)
    };
}

const INTERBANK_DAILY: &str = api_endpoint!("monthly-statistical-bulletin/er-ir/hk-interbank-ir-daily");
const EERI_DAILY: &str = api_endpoint!("monthly-statistical-bulletin/er-ir/er-eeri-daily");
const MONEY_SUPPLY_MONTHLY: &str = api_endpoint!("monthly-statistical-bulletin/money/supply-adjusted");

impl SourceId {
    /// Static configuration for this source.
    pub const fn config(self) -> SourceConfig {
        match self {
            SourceId::Hibor => SourceConfig {
                id: self,
                endpoint: INTERBANK_DAILY,
                segment: Some("hibor.fixing"),
                date_field: "end_of_day",
                title: "HIBOR Fixings",
            },
            SourceId::InterbankRates => SourceConfig {
                id: self,
                endpoint: INTERBANK_DAILY,
                segment: None,
                date_field: "end_of_day",
                title: "HK Interbank Interest Rates",
            },
            SourceId::ExchangeRates => SourceConfig {
                id: self,
                endpoint: EERI_DAILY,
                segment: None,
                date_field: "end_of_day",
                title: "Effective Exchange Rate Index",
            },
            SourceId::MoneySupply => SourceConfig {
                id: self,
                endpoint: MONEY_SUPPLY_MONTHLY,
                segment: None,
                date_field: "end_of_month",
                title: "Money Supply (Seasonally Adjusted)",
            },
        }
    }
}

/// All known sources, indexed by [`SourceId`].
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: [SourceConfig; 4],
}

impl SourceRegistry {
    pub fn builtin() -> Self {
        Self {
            sources: SourceId::ALL.map(SourceId::config),
        }
    }

    pub fn get(&self, id: SourceId) -> &SourceConfig {
        &self.sources[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter()
    }

    /// Check every entry once at start-up.
    pub fn validate(&self) -> Result<(), AppError> {
        for cfg in &self.sources {
            validate_config(cfg)?;
        }
        Ok(())
    }
}

fn validate_config(cfg: &SourceConfig) -> Result<(), AppError> {
    let name = cfg.id.slug();
    if !cfg.endpoint.starts_with("https://") {
        return Err(AppError::new(
            2,
            format!("Source `{name}`: endpoint must be an https URL (got '{}').", cfg.endpoint),
        ));
    }
    if cfg.date_field.trim().is_empty() {
        return Err(AppError::new(2, format!("Source `{name}`: missing date field.")));
    }
    if cfg.title.trim().is_empty() {
        return Err(AppError::new(2, format!("Source `{name}`: missing title.")));
    }
    if let Some(segment) = cfg.segment {
        if segment.trim().is_empty() {
            return Err(AppError::new(
                2,
                format!("Source `{name}`: segment filter is set but empty."),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DateGranularity;

    #[test]
    fn builtin_registry_is_valid_and_indexed_by_id() {
        let registry = SourceRegistry::builtin();
        registry.validate().unwrap();
        for id in SourceId::ALL {
            assert_eq!(registry.get(id).id, id);
        }
    }

    #[test]
    fn hibor_uses_fixing_segment() {
        let cfg = *SourceRegistry::builtin().get(SourceId::Hibor);
        assert_eq!(cfg.segment, Some("hibor.fixing"));
        assert_eq!(cfg.date_field, "end_of_day");
        assert_eq!(cfg.granularity(), DateGranularity::Daily);
    }

    #[test]
    fn monthly_source_is_detected() {
        let cfg = SourceId::MoneySupply.config();
        assert_eq!(cfg.granularity(), DateGranularity::Monthly);
    }

    #[test]
    fn endpoints_share_the_api_base() {
        assert_eq!(
            INTERBANK_DAILY,
            "https://api.hkma.gov.hk/public/market-data-and-statistics/monthly-statistical-bulletin/er-ir/hk-interbank-ir-daily"
        );
        assert_eq!(
            MONEY_SUPPLY_MONTHLY,
            "https://api.hkma.gov.hk/public/market-data-and-statistics/monthly-statistical-bulletin/money/supply-adjusted"
        );
    }

    #[test]
    fn rejects_blank_fields() {
        let mut cfg = SourceId::Hibor.config();
        cfg.title = " ";
        assert!(validate_config(&cfg).is_err());

        let mut cfg = SourceId::Hibor.config();
        cfg.endpoint = "http://insecure.example";
        assert!(validate_config(&cfg).is_err());
    }
}
