use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Canonical vessel record.
///
/// Identity fields (`imo`) are ground truth for document validation and are
/// never written by the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Ship {
    pub id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// IMO number as a digit string. Absent for vessels without one
    /// (inland barges, some fishing vessels).
    pub imo: Option<String>,
    /// Owning tenant.
    pub company: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ship {
    pub fn new(name: impl Into<String>, imo: Option<String>, company: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            imo,
            company: company.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// IMO digits only, stripped of prefixes like "IMO 1234567".
    pub fn normalized_imo(&self) -> Option<String> {
        self.imo.as_ref().map(|imo| {
            imo.chars().filter(|c| c.is_ascii_digit()).collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_imo_strips_prefix() {
        let ship = Ship::new("MV Test", Some("IMO 9876543".to_string()), "Acme Shipping");
        assert_eq!(ship.normalized_imo().as_deref(), Some("9876543"));
    }

    #[test]
    fn test_normalized_imo_absent() {
        let ship = Ship::new("Barge 12", None, "Acme Shipping");
        assert!(ship.normalized_imo().is_none());
    }
}
