//! Splitting of free-text eligibility criteria into inclusion and exclusion sections.

use crate::constants::{EXCLUSION_MARKER, INCLUSION_MARKER};

/// The two sections of an eligibility-criteria blob.
///
/// When present, `exclusion` starts with the `Exclusion Criteria` marker itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CriteriaSections<'a> {
    pub inclusion: &'a str,
    pub exclusion: Option<&'a str>,
}

impl<'a> CriteriaSections<'a> {
    /// Exclusion section text, or `""` when the blob has none.
    pub fn exclusion_text(&self) -> &'a str {
        self.exclusion.unwrap_or("")
    }
}

/// Splits `text` at the first `Exclusion Criteria` marker.
///
/// Without a marker, the whole text is the inclusion section if it starts with
/// `Inclusion Criteria`; otherwise both sections are empty.
pub fn split_criteria(text: &str) -> CriteriaSections<'_> {
    if let Some(idx) = text.find(EXCLUSION_MARKER) {
        return CriteriaSections {
            inclusion: &text[..idx],
            exclusion: Some(&text[idx..]),
        };
    }

    let inclusion = if text.starts_with(INCLUSION_MARKER) {
        text
    } else {
        ""
    };

    CriteriaSections {
        inclusion,
        exclusion: None,
    }
}
