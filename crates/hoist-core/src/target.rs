use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppFlavor {
    #[default]
    Function,
    Web,
}

impl fmt::Display for AppFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Function => "function app",
            Self::Web => "web app",
        })
    }
}

/// Azure region in its canonical form (`westeurope`, not `West Europe`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region(String);

impl Region {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

const KNOWN_REGIONS: &[&str] = &[
    "australiacentral",
    "australiacentral2",
    "australiaeast",
    "australiasoutheast",
    "brazilsouth",
    "brazilsoutheast",
    "canadacentral",
    "canadaeast",
    "centralindia",
    "centralus",
    "eastasia",
    "eastus",
    "eastus2",
    "francecentral",
    "francesouth",
    "germanynorth",
    "germanywestcentral",
    "israelcentral",
    "italynorth",
    "japaneast",
    "japanwest",
    "jioindiacentral",
    "jioindiawest",
    "koreacentral",
    "koreasouth",
    "mexicocentral",
    "northcentralus",
    "northeurope",
    "norwayeast",
    "norwaywest",
    "polandcentral",
    "qatarcentral",
    "southafricanorth",
    "southafricawest",
    "southcentralus",
    "southeastasia",
    "southindia",
    "spaincentral",
    "swedencentral",
    "switzerlandnorth",
    "switzerlandwest",
    "uaecentral",
    "uaenorth",
    "uksouth",
    "ukwest",
    "westcentralus",
    "westeurope",
    "westindia",
    "westus",
    "westus2",
    "westus3",
];

impl FromStr for Region {
    type Err = Error;

    /// Accepts display names (`West Europe`) and canonical names alike.
    fn from_str(s: &str) -> Result<Self> {
        let canonical: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match KNOWN_REGIONS.iter().find(|&&known| known == canonical) {
            Some(&known) => Ok(Self(known.to_owned())),
            None => Err(Error::UnresolvableRegion(s.to_owned())),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hosting plan SKU: size name (`P1v2`) and billing tier (`PremiumV2`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingTier {
    size: &'static str,
    tier: &'static str,
}

const KNOWN_TIERS: &[(&str, &str)] = &[
    ("F1", "Free"),
    ("D1", "Shared"),
    ("B1", "Basic"),
    ("B2", "Basic"),
    ("B3", "Basic"),
    ("S1", "Standard"),
    ("S2", "Standard"),
    ("S3", "Standard"),
    ("P1v2", "PremiumV2"),
    ("P2v2", "PremiumV2"),
    ("P3v2", "PremiumV2"),
    ("P0v3", "PremiumV3"),
    ("P1v3", "PremiumV3"),
    ("P2v3", "PremiumV3"),
    ("P3v3", "PremiumV3"),
    ("EP1", "ElasticPremium"),
    ("EP2", "ElasticPremium"),
    ("EP3", "ElasticPremium"),
];

impl PricingTier {
    /// Serverless consumption plan used when a function app has no tier.
    pub const CONSUMPTION: PricingTier = PricingTier {
        size: "Y1",
        tier: "Dynamic",
    };

    /// Default dedicated tier for web apps.
    pub const WEB_DEFAULT: PricingTier = PricingTier {
        size: "P1v2",
        tier: "PremiumV2",
    };

    pub fn size(&self) -> &'static str {
        self.size
    }

    pub fn tier(&self) -> &'static str {
        self.tier
    }
}

impl FromStr for PricingTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        KNOWN_TIERS
            .iter()
            .find(|(size, _)| size.eq_ignore_ascii_case(wanted))
            .map(|&(size, tier)| PricingTier { size, tier })
            .ok_or_else(|| Error::UnknownPricingTier(s.to_owned()))
    }
}

impl fmt::Display for PricingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.size, self.tier)
    }
}

/// Identifies exactly one remote app and the plan it runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppServiceTarget {
    pub subscription_id: String,
    pub resource_group: String,
    pub app_name: String,
    pub region: Region,
    pub pricing_tier: Option<PricingTier>,
    pub plan_name: String,
    pub plan_resource_group: String,
    pub flavor: AppFlavor,
}

impl AppServiceTarget {
    /// A tier the user asked for, as opposed to a flavor default.
    pub fn pricing_tier_specified(&self) -> bool {
        self.pricing_tier.is_some()
    }

    pub fn effective_pricing_tier(&self) -> PricingTier {
        match (&self.pricing_tier, self.flavor) {
            (Some(tier), _) => tier.clone(),
            (None, AppFlavor::Function) => PricingTier::CONSUMPTION,
            (None, AppFlavor::Web) => PricingTier::WEB_DEFAULT,
        }
    }

    pub fn plan_in_separate_group(&self) -> bool {
        self.plan_resource_group != self.resource_group
    }
}
