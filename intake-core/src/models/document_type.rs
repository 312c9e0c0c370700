use serde::{Deserialize, Serialize};

/// Which kind of third party a document type must be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TierType {
    #[default]
    None,
    Customer,
    Vendor,
}

impl TierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Customer => "CUSTOMER",
            Self::Vendor => "VENDOR",
        }
    }

    /// Parse the stored code. Matching is case-insensitive and an empty
    /// value is read as [`TierType::None`].
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "NONE" => Some(Self::None),
            "CUSTOMER" | "CLIENT" => Some(Self::Customer),
            "VENDOR" | "FOURNISSEUR" => Some(Self::Vendor),
            _ => None,
        }
    }

    /// True when documents of this tier must carry a customer or vendor.
    pub fn requires_customer_vendor(&self) -> bool {
        !matches!(self, Self::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentType {
    pub id: i64,
    pub type_name: String,
    pub type_key: String,
    pub tier_type: TierType,
}
