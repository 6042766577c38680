//! Duplicate Detector
//!
//! Exact-match comparison of a candidate certificate against the ship's
//! existing certificates. A duplicate requires all six compared fields to
//! match after trimming; the issuing authority is compared through its
//! normalized abbreviation so "Det Norske Veritas" and "DNV" collide.

use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use meridian_database::CertificateStore;
use meridian_models::{Certificate, DuplicateCheck, DuplicateMatch, ExtractedFields};
use meridian_utils::validation::issuer_abbreviation;

pub struct DuplicateDetector {
    certificates: Arc<dyn CertificateStore>,
}

impl DuplicateDetector {
    pub fn new(certificates: Arc<dyn CertificateStore>) -> Self {
        Self { certificates }
    }

    /// Compare the candidate against every certificate already on file for
    /// the ship. Store errors propagate; an empty result means clean.
    pub async fn check(
        &self,
        ship_id: Uuid,
        candidate: &ExtractedFields,
    ) -> Result<DuplicateCheck> {
        let existing = self.certificates.list_for_ship(ship_id).await?;

        let duplicates: Vec<DuplicateMatch> = existing
            .iter()
            .filter(|cert| is_exact_duplicate(cert, candidate))
            .map(|cert| DuplicateMatch {
                certificate_id: cert.id,
                cert_name: cert.cert_name.clone(),
                cert_no: cert.cert_no.clone(),
                similarity: 100,
            })
            .collect();

        let has_issues = !duplicates.is_empty();
        if has_issues {
            tracing::info!(
                ship_id = %ship_id,
                cert_no = %candidate.cert_no,
                matches = duplicates.len(),
                "Exact duplicate certificate detected"
            );
        }

        Ok(DuplicateCheck {
            duplicates,
            has_issues,
        })
    }
}

fn is_exact_duplicate(existing: &Certificate, candidate: &ExtractedFields) -> bool {
    let candidate_fields = [
        candidate.cert_name.as_str(),
        candidate.cert_type.as_str(),
        candidate.cert_no.as_str(),
        candidate.issue_date.as_str(),
        candidate.valid_date.as_str(),
        candidate.issued_by.as_str(),
    ];

    existing
        .compared_fields()
        .iter()
        .zip(candidate_fields.iter())
        .enumerate()
        .all(|(index, (a, b))| {
            // Last slot is the issuer; compare abbreviations.
            if index == 5 {
                issuer_abbreviation(a) == issuer_abbreviation(b)
            } else {
                a.trim() == b.trim()
            }
        })
}
