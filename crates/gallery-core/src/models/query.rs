use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Listing filter. Both fields empty means "everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetQuery {
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub fragment: Option<String>,
}

impl AssetQuery {
    pub fn owned_by(owner_id: Uuid) -> Self {
        Self {
            owner_id: Some(owner_id),
            fragment: None,
        }
    }

    pub fn containing(fragment: impl Into<String>) -> Self {
        Self {
            owner_id: None,
            fragment: Some(fragment.into()),
        }
    }

    pub fn and_owner(mut self, owner_id: Uuid) -> Self {
        self.owner_id = Some(owner_id);
        self
    }
}
