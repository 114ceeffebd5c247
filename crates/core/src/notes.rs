//! Session-local audit notes.
//!
//! Notes live only in memory for the lifetime of the process. Each patient starts with the
//! same two example notes; new notes are prepended so the newest is always first.

use chrono::NaiveDateTime;
use rav_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::MAX_NOTE_CHARS;
use crate::patient::PatientId;
use crate::{RavError, RavResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteKind {
    #[default]
    #[serde(rename = "Clinical Review")]
    ClinicalReview,
    #[serde(rename = "Care Coordination")]
    CareCoordination,
    Documentation,
}

impl NoteKind {
    pub const ALL: [NoteKind; 3] = [
        NoteKind::ClinicalReview,
        NoteKind::CareCoordination,
        NoteKind::Documentation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NoteKind::ClinicalReview => "Clinical Review",
            NoteKind::CareCoordination => "Care Coordination",
            NoteKind::Documentation => "Documentation",
        }
    }

    /// Parse a kind from its label or a kebab/snake-case form.
    pub fn from_param(value: &str) -> Option<NoteKind> {
        let normalised = value.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        NoteKind::ALL
            .into_iter()
            .find(|k| k.as_str().to_ascii_lowercase() == normalised)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Note {
    /// Per-patient sequence number, starting at 1.
    pub id: u32,
    pub author: String,
    pub timestamp: NaiveDateTime,
    pub text: NonEmptyText,
    pub kind: NoteKind,
}

/// In-memory note log for every patient in the store.
#[derive(Clone, Debug, Default)]
pub struct NoteBook {
    notes: HashMap<PatientId, Vec<Note>>,
}

impl NoteBook {
    /// Create a note book for `patients`, each seeded with the example notes.
    pub fn seeded(patients: impl IntoIterator<Item = PatientId>) -> Self {
        let notes = patients
            .into_iter()
            .map(|id| (id, seed_notes()))
            .collect();
        Self { notes }
    }

    /// Notes for a patient, newest first. Unknown patients have no notes.
    pub fn notes_for(&self, patient: PatientId) -> &[Note] {
        self.notes.get(&patient).map_or(&[], Vec::as_slice)
    }

    /// Prepend a note to a patient's log.
    ///
    /// # Errors
    ///
    /// - `RavError::PatientNotFound` if the patient has no log in this book.
    /// - `RavError::InvalidInput` if the text is blank or longer than the note limit.
    pub fn add(
        &mut self,
        patient: PatientId,
        author: &str,
        text: &str,
        kind: NoteKind,
        timestamp: NaiveDateTime,
    ) -> RavResult<&Note> {
        let text = NonEmptyText::bounded(text, MAX_NOTE_CHARS)?;
        let author = NonEmptyText::new(author)?;
        let log = self
            .notes
            .get_mut(&patient)
            .ok_or(RavError::PatientNotFound(patient))?;

        let id = log.iter().map(|n| n.id).max().unwrap_or(0) + 1;
        log.insert(
            0,
            Note {
                id,
                author: author.into_inner(),
                timestamp,
                text,
                kind,
            },
        );
        tracing::info!("added {} note {} for patient {}", kind.as_str(), id, patient);

        Ok(&log[0])
    }
}

fn seed_notes() -> Vec<Note> {
    let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").ok();
    let seeds = [
        (
            2,
            "Dr. Sarah Williams",
            "2024-12-15 14:30",
            "Reviewed missing HCC-18 code. Patient shows signs of diabetic retinopathy on recent exam. Scheduling ophthalmology consult.",
            NoteKind::ClinicalReview,
        ),
        (
            1,
            "Jane Smith, RN",
            "2024-12-10 09:15",
            "Patient education provided regarding diabetes management. Updated care plan to include quarterly HbA1c monitoring.",
            NoteKind::CareCoordination,
        ),
    ];

    seeds
        .into_iter()
        .filter_map(|(id, author, when, text, kind)| {
            Some(Note {
                id,
                author: author.to_string(),
                timestamp: at(when)?,
                text: NonEmptyText::new(text).ok()?,
                kind,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-01-02 08:00", "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn seeded_book_starts_with_example_notes_newest_first() {
        let book = NoteBook::seeded([PatientId::new(1)]);
        let notes = book.notes_for(PatientId::new(1));
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].author, "Dr. Sarah Williams");
        assert!(notes[0].timestamp > notes[1].timestamp);
    }

    #[test]
    fn add_prepends_with_next_id() {
        let mut book = NoteBook::seeded([PatientId::new(1), PatientId::new(2)]);
        let note = book
            .add(
                PatientId::new(1),
                "Current User",
                "  Ordered retinal screening.  ",
                NoteKind::Documentation,
                now(),
            )
            .unwrap();
        assert_eq!(note.id, 3);
        assert_eq!(note.text.as_str(), "Ordered retinal screening.");

        let notes = book.notes_for(PatientId::new(1));
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0].kind, NoteKind::Documentation);
        assert_eq!(book.notes_for(PatientId::new(2)).len(), 2);
    }

    #[test]
    fn add_rejects_blank_text() {
        let mut book = NoteBook::seeded([PatientId::new(1)]);
        let err = book
            .add(PatientId::new(1), "Current User", "   ", NoteKind::default(), now())
            .unwrap_err();
        assert!(matches!(err, RavError::InvalidInput(_)));
        assert_eq!(book.notes_for(PatientId::new(1)).len(), 2);
    }

    #[test]
    fn add_rejects_overlong_text() {
        let mut book = NoteBook::seeded([PatientId::new(1)]);
        let long = "x".repeat(MAX_NOTE_CHARS + 1);
        assert!(book
            .add(PatientId::new(1), "Current User", &long, NoteKind::default(), now())
            .is_err());
    }

    #[test]
    fn add_rejects_unknown_patient() {
        let mut book = NoteBook::seeded([PatientId::new(1)]);
        let err = book
            .add(PatientId::new(99), "Current User", "text", NoteKind::default(), now())
            .unwrap_err();
        assert!(matches!(err, RavError::PatientNotFound(id) if id == PatientId::new(99)));
        assert!(book.notes_for(PatientId::new(99)).is_empty());
    }

    #[test]
    fn note_kind_parses_labels_and_params() {
        assert_eq!(
            NoteKind::from_param("care-coordination"),
            Some(NoteKind::CareCoordination)
        );
        assert_eq!(
            NoteKind::from_param("Clinical Review"),
            Some(NoteKind::ClinicalReview)
        );
        assert_eq!(NoteKind::from_param("gossip"), None);
    }
}
