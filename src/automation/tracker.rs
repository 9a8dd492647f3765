//! Detection debounce.
//!
//! Once a record has been acted on, the same physical document keeps
//! producing near-identical detections every processed frame; this check is
//! what keeps those from re-triggering the confirmation flow.

use crate::ocr::CandidateRecord;

/// Decides whether a freshly extracted record is materially different from
/// the last accepted one.
///
/// With no previous record, any record counts as changed. Otherwise the
/// record changed when a field is present in exactly one of the two, or
/// present in both with different normalized values.
pub fn has_changed(new: &CandidateRecord, last: Option<&CandidateRecord>) -> bool {
    match last {
        None => true,
        Some(last) => new.name != last.name || new.phone != last.phone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: Option<&str>, phone: Option<&str>) -> CandidateRecord {
        CandidateRecord {
            name: name.map(str::to_string),
            phone: phone.map(str::to_string),
        }
    }

    #[test]
    fn test_no_previous_record_always_changed() {
        assert!(has_changed(&record(Some("Ana Silva"), None), None));
        assert!(has_changed(&record(None, Some("11987654321")), None));
    }

    #[test]
    fn test_identical_records_unchanged() {
        let a = record(Some("Ana Silva"), None);
        let b = record(Some("Ana Silva"), None);
        assert!(!has_changed(&a, Some(&b)));

        let full = record(Some("Ana Silva"), Some("11987654321"));
        assert!(!has_changed(&full, Some(&full.clone())));
    }

    #[test]
    fn test_field_presence_differs() {
        let partial = record(Some("Ana Silva"), None);
        let full = record(Some("Ana Silva"), Some("11987654321"));
        assert!(has_changed(&partial, Some(&full)));
        assert!(has_changed(&full, Some(&partial)));
    }

    #[test]
    fn test_field_value_differs() {
        let a = record(Some("Ana Silva"), Some("11987654321"));
        let b = record(Some("Ana Souza"), Some("11987654321"));
        assert!(has_changed(&a, Some(&b)));

        let c = record(Some("Ana Silva"), Some("21998765432"));
        assert!(has_changed(&a, Some(&c)));
    }
}
