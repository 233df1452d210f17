//! Annotation extraction
//!
//! Merges the time signatures, keys and harmony lyrics of a score into one
//! record per offset, with the measure and beat of the note or rest found at
//! that offset. Keys and Roman numerals are normalized to RomanText spelling
//! on the way.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use num_rational::Rational32;

use crate::errors::{ConversionError, Result};
use crate::score::{ElementClass, ElementKind, Offset, ScoreSource};

/// Harmonic and metric annotation at one offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub measure: u32,
    pub beat: Rational32,
    /// Ratio string such as "3/4", empty when the time signature does not change here
    pub time_signature: String,
    /// Key in RomanText spelling ("Bb", "f#"), empty when the key does not change here
    pub key: String,
    pub roman_numeral: String,
}

/// Records in ascending offset order
pub type Annotations = BTreeMap<Offset, AnnotationRecord>;

/// Humdrum flats (`-`) to RomanText flats (`b`)
pub fn format_key(key: &str) -> String {
    key.replace('-', "b")
}

/// Normalize a BCMH harmony token. The order of the rewrites matters.
pub fn format_roman_numeral(rn: &str) -> String {
    rn.replace(';', "") // phrase ending
        .replace('[', "") // tie start
        .replace(']', "") // tie end
        .replace('%', "ø")
        .replace("V(64)", "Cad64")
        .replace("V(54)", "V")
}

/// Split an inline key change: `"D:V7"` -> `(Some("D"), "V7")`
pub fn split_key_change(rn: &str) -> (Option<&str>, &str) {
    match rn.split_once(':') {
        Some((key, rn)) => (Some(key), rn),
        None => (None, rn),
    }
}

/// Collect into an offset map; a later element at the same offset replaces an earlier one
fn collect_by_offset<V, I>(what: &str, entries: I) -> BTreeMap<Offset, V>
where
    V: PartialEq + Debug,
    I: IntoIterator<Item = (Offset, V)>,
{
    let mut map = BTreeMap::new();
    for (offset, value) in entries {
        if let Some(previous) = map.insert(offset, value) {
            if map.get(&offset) != Some(&previous) {
                log::debug!("offset {}: {} {:?} replaced by {:?}", offset, what, previous, map[&offset]);
            }
        }
    }
    map
}

/// Build the offset-ordered annotation records of a score
pub fn extract_annotations<S: ScoreSource + ?Sized>(score: &S) -> Result<Annotations> {
    let positions = collect_by_offset(
        "position",
        score
            .elements(ElementClass::NotesAndRests)
            .into_iter()
            .map(|e| (e.offset, (e.measure, e.beat))),
    );
    let time_signatures = collect_by_offset(
        "time signature",
        score
            .elements(ElementClass::TimeSignature)
            .into_iter()
            .filter_map(|e| match &e.kind {
                ElementKind::TimeSignature { ratio } => Some((e.offset, ratio.clone())),
                _ => None,
            }),
    );
    let keys = collect_by_offset(
        "key",
        score
            .elements(ElementClass::Key)
            .into_iter()
            .filter_map(|e| match &e.kind {
                ElementKind::Key { tonic } => Some((e.offset, tonic.clone())),
                _ => None,
            }),
    );
    let harmonies = collect_by_offset(
        "harmony",
        score
            .elements(ElementClass::Notes)
            .into_iter()
            .filter_map(|e| e.lyric().map(|lyric| (e.offset, lyric.to_string()))),
    );

    let annotated: BTreeSet<Offset> = keys
        .keys()
        .chain(time_signatures.keys())
        .chain(harmonies.keys())
        .copied()
        .collect();

    let mut annotations = Annotations::new();
    for offset in annotated {
        let &(measure, beat) = positions
            .get(&offset)
            .ok_or(ConversionError::NoNoteAtOffset { offset })?;
        let time_signature = time_signatures.get(&offset).cloned().unwrap_or_default();
        let mut key = keys.get(&offset).map(String::as_str).unwrap_or("");
        let mut rn = harmonies.get(&offset).map(String::as_str).unwrap_or("");

        if let (Some(inline_key), harmony) = split_key_change(rn) {
            key = inline_key;
            rn = harmony;
        }

        annotations.insert(
            offset,
            AnnotationRecord {
                measure,
                beat,
                time_signature,
                key: format_key(key),
                roman_numeral: format_roman_numeral(rn),
            },
        );
    }
    Ok(annotations)
}
