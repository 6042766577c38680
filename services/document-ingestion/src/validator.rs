//! Ship Identity Validator
//!
//! Compares the extracted vessel identity against the ship the upload was
//! addressed to. An IMO number mismatch is authoritative and blocks the
//! attachment; a ship-name mismatch on its own only annotates the record,
//! since extracted names vary with prefixes, abbreviations and OCR noise.

use meridian_models::{ExtractedFields, Ship, ValidationOutcome};
use meridian_utils::validation::{normalize_imo, normalize_ship_name};

pub struct IdentityValidator;

impl IdentityValidator {
    pub fn validate(ship: &Ship, fields: &ExtractedFields) -> ValidationOutcome {
        let extracted_imo = normalize_imo(&fields.imo_number);
        let ship_imo = ship.normalized_imo();

        if let (Some(ship_imo), extracted) = (ship_imo, extracted_imo) {
            if !extracted.is_empty() && extracted != ship_imo {
                return ValidationOutcome::Block {
                    message: format!(
                        "IMO number mismatch: document states {} but the selected ship is \
                         registered as {}. This certificate belongs to a different ship and \
                         cannot be attached to the current ship.",
                        extracted, ship_imo
                    ),
                };
            }
        }

        let extracted_name = normalize_ship_name(&fields.ship_name);
        let registered_name = normalize_ship_name(&ship.name);
        if !extracted_name.is_empty() && extracted_name != registered_name {
            return ValidationOutcome::Annotate {
                note: format!(
                    "Ship name on document (\"{}\") does not match the registered name (\"{}\")",
                    fields.ship_name.trim(),
                    ship.name
                ),
            };
        }

        ValidationOutcome::Pass
    }
}
