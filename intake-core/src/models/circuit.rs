use serde::{Deserialize, Serialize};

/// A named approval workflow a document may be bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circuit {
    pub id: i64,
    pub title: String,
    pub circuit_key: String,
    pub descriptif: String,
    pub is_active: bool,
    /// Document type affinity. `None` means the circuit accepts any type.
    pub document_type_id: Option<i64>,
}

impl Circuit {
    /// Active, and either type-agnostic or bound to `type_id`.
    pub fn is_eligible_for(
        &self,
        type_id: i64,
    ) -> bool {
        self.is_active && self.document_type_id.is_none_or(|affinity| affinity == type_id)
    }
}
