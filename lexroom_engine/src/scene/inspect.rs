use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectableKind {
    CaseFile,
    Evidence,
    WitnessStatement,
    Contract,
    CrimeScenePhoto,
    SuspectPhoto,
    EvidenceItemPhoto,
}

impl InspectableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InspectableKind::CaseFile => "case_file",
            InspectableKind::Evidence => "evidence",
            InspectableKind::WitnessStatement => "witness",
            InspectableKind::Contract => "contract",
            InspectableKind::CrimeScenePhoto => "crime_scene",
            InspectableKind::SuspectPhoto => "suspect",
            InspectableKind::EvidenceItemPhoto => "evidence_item",
        }
    }

    pub fn type_label(self) -> &'static str {
        match self {
            InspectableKind::CaseFile => "CASE FILE",
            InspectableKind::Evidence => "EVIDENCE",
            InspectableKind::WitnessStatement => "WITNESS",
            InspectableKind::Contract => "CONTRACT",
            InspectableKind::CrimeScenePhoto => "CRIME SCENE",
            InspectableKind::SuspectPhoto => "SUSPECT",
            InspectableKind::EvidenceItemPhoto => "EVIDENCE ITEM",
        }
    }

    pub fn is_photo(self) -> bool {
        matches!(
            self,
            InspectableKind::CrimeScenePhoto
                | InspectableKind::SuspectPhoto
                | InspectableKind::EvidenceItemPhoto
        )
    }

    fn detail_fields(self) -> [(&'static str, &'static str); 3] {
        match self {
            InspectableKind::CaseFile => [
                ("Defendant", "John Doe"),
                ("Charges", "Pending Investigation"),
                ("Status", "Active"),
            ],
            InspectableKind::Evidence => [
                ("Evidence ID", "EV-2024-456"),
                ("Category", "Physical Evidence"),
                ("Chain of Custody", "Verified"),
            ],
            InspectableKind::WitnessStatement => [
                ("Witness", "Jane Smith"),
                ("Statement Date", "October 15, 2025"),
                ("Reliability", "High"),
            ],
            InspectableKind::Contract => [
                ("Contract Type", "Legal Agreement"),
                ("Parties", "Multiple"),
                ("Status", "Under Review"),
            ],
            InspectableKind::CrimeScenePhoto => [
                ("Location", "123 Main Street"),
                ("Date Captured", "October 10, 2025"),
                ("Photographer", "CSI Team A"),
            ],
            InspectableKind::SuspectPhoto => [
                ("Subject", "Person of Interest"),
                ("ID Status", "Confirmed"),
                ("Relevance", "Primary"),
            ],
            InspectableKind::EvidenceItemPhoto => [
                ("Item", "Physical Evidence"),
                ("Collected", "October 12, 2025"),
                ("Analysis", "Complete"),
            ],
        }
    }
}

/// Immutable tag attached to a pickable group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectableMetadata {
    pub kind: InspectableKind,
    pub display_text: Option<String>,
}

impl InspectableMetadata {
    pub fn new(kind: InspectableKind, display_text: Option<&str>) -> Self {
        InspectableMetadata {
            kind,
            display_text: display_text.map(str::to_string),
        }
    }

    /// Display text when present, otherwise the kind's identifier.
    pub fn label(&self) -> &str {
        self.display_text
            .as_deref()
            .unwrap_or_else(|| self.kind.as_str())
    }
}

/// Everything the detail panel shows for an inspected object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectionDetail {
    pub kind: InspectableKind,
    pub display_text: Option<String>,
    pub title: String,
    pub lines: Vec<String>,
}

impl InspectionDetail {
    pub fn for_metadata(metadata: &InspectableMetadata) -> Self {
        let mut lines = vec![
            format!("Document Type: {}", metadata.kind.type_label()),
            String::from("CONFIDENTIAL LEGAL DOCUMENT"),
            String::from("Date: October 22, 2025"),
            String::from("Case Reference: #2024-789-XYZ"),
        ];
        lines.extend(
            metadata
                .kind
                .detail_fields()
                .iter()
                .map(|(field, value)| format!("{field}: {value}")),
        );
        InspectionDetail {
            kind: metadata.kind,
            display_text: metadata.display_text.clone(),
            title: metadata.label().to_string(),
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_falls_back_to_kind() {
        let photo = InspectableMetadata::new(InspectableKind::SuspectPhoto, None);
        assert_eq!(photo.label(), "suspect");
        let doc = InspectableMetadata::new(InspectableKind::CaseFile, Some("CASE FILE #2024-789"));
        assert_eq!(doc.label(), "CASE FILE #2024-789");
    }

    #[test]
    fn detail_lists_kind_specific_fields() {
        let detail = InspectionDetail::for_metadata(&InspectableMetadata::new(
            InspectableKind::CaseFile,
            Some("CASE FILE #2024-789"),
        ));
        assert_eq!(detail.title, "CASE FILE #2024-789");
        assert_eq!(detail.lines[0], "Document Type: CASE FILE");
        assert!(detail.lines.iter().any(|line| line == "Defendant: John Doe"));
        assert_eq!(detail.lines.len(), 7);
    }

    #[test]
    fn photo_kinds_are_flagged() {
        assert!(InspectableKind::CrimeScenePhoto.is_photo());
        assert!(!InspectableKind::Contract.is_photo());
    }
}
