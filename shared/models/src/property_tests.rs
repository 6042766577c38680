//! Property-based tests for Meridian core domain models
//!
//! Serialization round-trip consistency and state-machine integrity
//! guarantees that must hold for arbitrary inputs.

use proptest::prelude::*;
use uuid::Uuid;

use crate::{
    BackgroundUploadTask, Certificate, ExtractedFields, FileResult, IngestStage, IngestSummary,
    Ship, UploadTaskState,
};

prop_compose! {
    fn arb_uuid()(bytes in prop::array::uniform16(0u8..)) -> Uuid {
        Uuid::from_bytes(bytes)
    }
}

prop_compose! {
    fn arb_imo()(digits in 1000000u32..9999999u32) -> String {
        digits.to_string()
    }
}

prop_compose! {
    fn arb_fields()(
        ship_name in "[A-Za-z ]{0,40}",
        imo_number in prop::option::of(arb_imo()),
        cert_name in "[A-Za-z ]{0,60}",
        cert_no in "[A-Z0-9-]{0,20}",
        issue_date in prop::option::of("20[0-2][0-9]-[0-1][0-9]-[0-3][0-9]"),
        issued_by in "[A-Z]{0,5}"
    ) -> ExtractedFields {
        ExtractedFields {
            ship_name,
            imo_number: imo_number.unwrap_or_default(),
            cert_name,
            cert_type: String::new(),
            cert_no,
            issue_date: issue_date.unwrap_or_default(),
            valid_date: String::new(),
            issued_by,
        }
    }
}

fn arb_stage() -> impl Strategy<Value = IngestStage> {
    prop_oneof![
        Just(IngestStage::Received),
        Just(IngestStage::Detected),
        Just(IngestStage::Extracted),
        Just(IngestStage::Validated),
        Just(IngestStage::DuplicateChecked),
        Just(IngestStage::RecordCreated),
        Just(IngestStage::UploadScheduled),
        Just(IngestStage::Done),
        Just(IngestStage::Blocked),
        Just(IngestStage::Skipped),
        Just(IngestStage::Error),
    ]
}

fn arb_task_state() -> impl Strategy<Value = UploadTaskState> {
    prop_oneof![
        Just(UploadTaskState::Pending),
        Just(UploadTaskState::Receiving),
        Just(UploadTaskState::Processing),
        Just(UploadTaskState::Completed),
        Just(UploadTaskState::Cancelled),
        Just(UploadTaskState::Failed),
    ]
}

proptest! {
    /// Extracted field bags survive a serde round trip unchanged.
    #[test]
    fn prop_fields_roundtrip(fields in arb_fields()) {
        let json = serde_json::to_string(&fields).unwrap();
        let back: ExtractedFields = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(fields, back);
    }

    /// Certificates built from a field bag carry the bag verbatim in the
    /// compared field set.
    #[test]
    fn prop_certificate_carries_fields(ship_id in arb_uuid(), fields in arb_fields()) {
        let cert = Certificate::from_extracted(ship_id, &fields);
        prop_assert_eq!(cert.cert_name, fields.cert_name);
        prop_assert_eq!(cert.cert_no, fields.cert_no);
        prop_assert_eq!(cert.issue_date, fields.issue_date);
        prop_assert_eq!(cert.issued_by, fields.issued_by);
        prop_assert!(cert.file_id.is_none());
    }

    /// Terminal ingest stages admit no outgoing transitions.
    #[test]
    fn prop_terminal_stages_are_final(from in arb_stage(), to in arb_stage()) {
        if from.is_terminal() {
            prop_assert!(!from.can_transition_to(to));
        }
    }

    /// Terminal task states admit no outgoing transitions.
    #[test]
    fn prop_terminal_task_states_are_final(from in arb_task_state(), to in arb_task_state()) {
        if from.is_terminal() {
            prop_assert!(!from.can_transition_to(to));
        }
    }

    /// No state transitions to itself.
    #[test]
    fn prop_no_self_transitions(state in arb_stage()) {
        prop_assert!(!state.can_transition_to(state));
    }

    /// Summary counters are consistent with the per-file results.
    #[test]
    fn prop_summary_counts_bounded(statuses in prop::collection::vec(arb_stage(), 0..10)) {
        let results: Vec<FileResult> = statuses
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut r = FileResult::new(format!("file-{}.pdf", i));
                r.status = *s;
                r.certificate_created = *s == IngestStage::Done;
                r
            })
            .collect();
        let summary = IngestSummary::from_results(results);
        prop_assert_eq!(summary.total_files, statuses.len());
        prop_assert!(summary.successful_uploads <= summary.total_files);
        prop_assert_eq!(summary.certificates_created, summary.successful_uploads);
    }

    /// IMO normalization only ever keeps digits.
    #[test]
    fn prop_normalized_imo_is_digits(raw in "[A-Za-z0-9 .-]{0,20}") {
        let ship = Ship::new("Test", Some(raw), "Co");
        let normalized = ship.normalized_imo().unwrap();
        prop_assert!(normalized.chars().all(|c| c.is_ascii_digit()));
    }

    /// Fresh tasks always start pending with empty queues.
    #[test]
    fn prop_new_task_pending(owner in arb_uuid(), ship in arb_uuid(), total in 0usize..50) {
        let task = BackgroundUploadTask::new(owner, ship, total);
        prop_assert_eq!(task.state, UploadTaskState::Pending);
        prop_assert_eq!(task.received_files, 0);
        prop_assert!(task.pending.is_empty());
    }
}
