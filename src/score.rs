//! Score object model consumed by the annotation extractor
//!
//! The extractor only needs a flattened, offset-ordered view of a score:
//! notes and rests with measure/beat positions, time signatures, keys, and
//! the lyric text carried by notes. [`ScoreSource`] is that narrow view;
//! [`Score`] is the in-memory implementation built by the Humdrum reader
//! (and by hand in tests).

use num_rational::Rational32;

/// Musical time from the start of the piece, in quarter notes
pub type Offset = Rational32;

/// Element classes that can be requested from a [`ScoreSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementClass {
    /// Notes and rests (music21's `notesAndRests`)
    NotesAndRests,
    /// Notes only, rests excluded
    Notes,
    TimeSignature,
    Key,
}

impl ElementClass {
    pub fn matches(self, kind: &ElementKind) -> bool {
        match self {
            ElementClass::NotesAndRests => {
                matches!(kind, ElementKind::Note { .. } | ElementKind::Rest)
            }
            ElementClass::Notes => matches!(kind, ElementKind::Note { .. }),
            ElementClass::TimeSignature => matches!(kind, ElementKind::TimeSignature { .. }),
            ElementClass::Key => matches!(kind, ElementKind::Key { .. }),
        }
    }
}

/// What a score element is, with its class-specific attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// A sounding note; `lyric` is the text attached to it, if any
    Note { lyric: Option<String> },
    Rest,
    /// Time signature as a ratio string, e.g. "3/4"
    TimeSignature { ratio: String },
    /// Key tonic with case giving the mode ("B-" major, "f#" minor)
    Key { tonic: String },
}

/// One element of the flattened score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreElement {
    pub offset: Offset,
    pub measure: u32,
    /// 1-based beat within the measure
    pub beat: Rational32,
    pub kind: ElementKind,
}

impl ScoreElement {
    /// Lyric text of a note, `None` for other kinds and for empty lyrics
    pub fn lyric(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Note { lyric: Some(text) } if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

/// Descriptive metadata of a score
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub composer: Option<String>,
    pub title: Option<String>,
}

/// Read-only, flattened access to a parsed score
pub trait ScoreSource {
    /// All elements of `class`, in score order (non-decreasing offset)
    fn elements(&self, class: ElementClass) -> Vec<&ScoreElement>;

    fn metadata(&self) -> &Metadata;
}

/// In-memory score
#[derive(Debug, Clone, Default)]
pub struct Score {
    metadata: Metadata,
    elements: Vec<ScoreElement>,
}

impl Score {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            elements: Vec::new(),
        }
    }

    /// Add an element; elements are kept sorted by offset, stable for ties
    pub fn push(&mut self, element: ScoreElement) {
        let index = self
            .elements
            .partition_point(|existing| existing.offset <= element.offset);
        self.elements.insert(index, element);
    }

    pub fn add_note(&mut self, offset: Offset, measure: u32, beat: Rational32, lyric: Option<&str>) {
        self.push(ScoreElement {
            offset,
            measure,
            beat,
            kind: ElementKind::Note {
                lyric: lyric.map(str::to_string),
            },
        });
    }

    pub fn add_rest(&mut self, offset: Offset, measure: u32, beat: Rational32) {
        self.push(ScoreElement {
            offset,
            measure,
            beat,
            kind: ElementKind::Rest,
        });
    }

    pub fn add_time_signature(&mut self, offset: Offset, measure: u32, beat: Rational32, ratio: &str) {
        self.push(ScoreElement {
            offset,
            measure,
            beat,
            kind: ElementKind::TimeSignature {
                ratio: ratio.to_string(),
            },
        });
    }

    pub fn add_key(&mut self, offset: Offset, measure: u32, beat: Rational32, tonic: &str) {
        self.push(ScoreElement {
            offset,
            measure,
            beat,
            kind: ElementKind::Key {
                tonic: tonic.to_string(),
            },
        });
    }
}

impl ScoreSource for Score {
    fn elements(&self, class: ElementClass) -> Vec<&ScoreElement> {
        self.elements
            .iter()
            .filter(|element| class.matches(&element.kind))
            .collect()
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}
