use serde::{Deserialize, Serialize};

use super::TierType;

/// A customer or vendor record as returned by the customer and vendor
/// services.
///
/// Customers are identified by `code` and vendors by `vendor_code`; the
/// other identifier is normally absent. Which one applies to a document
/// is decided by the tier type of its document type, never by which
/// field happens to be filled in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerVendor {
    pub code: Option<String>,
    pub vendor_code: Option<String>,
    pub name: String,
    pub address: String,
    pub city: String,
    pub country: String,
}

impl CustomerVendor {
    pub fn customer(
        code: &str,
        name: &str,
    ) -> Self {
        Self {
            code: Some(code.to_string()),
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn vendor(
        vendor_code: &str,
        name: &str,
    ) -> Self {
        Self {
            vendor_code: Some(vendor_code.to_string()),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// The identifier that `tier` reads. Blank codes count as missing.
    pub fn code_for(
        &self,
        tier: TierType,
    ) -> Option<&str> {
        let code = match tier {
            TierType::Customer => self.code.as_deref(),
            TierType::Vendor => self.vendor_code.as_deref(),
            TierType::None => None,
        };
        code.filter(|c| !c.trim().is_empty())
    }
}
