//! Static catalogs: brochures and price lists.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Price shown when a service or plan is not in the table.
pub const CONTACT_SALES: &str = "Contact sales";

/// Plan used when the caller does not name one.
pub const DEFAULT_PLAN: &str = "standard";

const BROCHURE_BASE_URL: &str = "https://easymo.rw/brochures";

/// Available marketing brochures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrochureType {
    #[default]
    General,
    Insurance,
    Transport,
    Broker,
}

impl BrochureType {
    /// Resolves a requested type. Absent or unknown values fall back to
    /// [`BrochureType::General`].
    #[must_use]
    pub fn resolve(requested: Option<&str>) -> Self {
        match requested.map(|r| r.trim().to_lowercase()).as_deref() {
            Some("insurance") => Self::Insurance,
            Some("transport") => Self::Transport,
            Some("broker") => Self::Broker,
            _ => Self::General,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Insurance => "insurance",
            Self::Transport => "transport",
            Self::Broker => "broker",
        }
    }

    /// Display name, e.g. `Insurance`.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Insurance => "Insurance",
            Self::Transport => "Transport",
            Self::Broker => "Broker",
        }
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("{BROCHURE_BASE_URL}/{}.pdf", self.as_str())
    }
}

type PlanTable = &'static [(&'static str, &'static str)];

const PRICING: &[(&str, PlanTable)] = &[
    (
        "insurance",
        &[
            ("basic", "RWF 5,000/month"),
            ("standard", "RWF 10,000/month"),
            ("premium", "RWF 20,000/month"),
        ],
    ),
    (
        "transport",
        &[
            ("pay_per_ride", "RWF 200-500 per km"),
            ("monthly", "RWF 50,000/month unlimited"),
            ("premium", "RWF 100,000/month with priority"),
        ],
    ),
    (
        "broker",
        &[
            ("basic", "5% commission"),
            ("standard", "3% commission"),
            ("enterprise", "Negotiable"),
        ],
    ),
];

/// A price lookup result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub service: String,
    pub plan: String,
    pub price: String,
    /// Every plan of the service. Empty for unknown services.
    pub all_plans: Map<String, JsonValue>,
}

/// Looks up the price of `plan` (default `standard`) for `service`.
#[must_use]
pub fn quote(service: &str, plan: Option<&str>) -> PriceQuote {
    let plan = plan.unwrap_or(DEFAULT_PLAN);
    let plans = PRICING
        .iter()
        .find(|(name, _)| *name == service)
        .map(|(_, plans)| *plans)
        .unwrap_or_default();

    let price = plans
        .iter()
        .find(|(name, _)| *name == plan)
        .map_or(CONTACT_SALES, |(_, price)| *price);

    PriceQuote {
        service: service.to_string(),
        plan: plan.to_string(),
        price: price.to_string(),
        all_plans: plans
            .iter()
            .map(|(name, price)| ((*name).to_string(), JsonValue::String((*price).to_string())))
            .collect(),
    }
}
