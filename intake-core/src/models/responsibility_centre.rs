use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsibilityCentre {
    pub id: i64,
    pub code: String,
    pub descr: String,
}
