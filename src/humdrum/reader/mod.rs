//! Humdrum **kern reader
//!
//! Reads preprocessed BCMH text into a flattened [`Score`]. Only what the
//! annotation extractor consumes is modeled:
//!
//! - reference records `!!!COM` (composer) and `!!!OTL` (title)
//! - `**kern` spines: note/rest onsets, `*M` time signatures, `*X:` keys
//! - `**text` spines: lyric tokens, attached to notes through `*staff` mappings
//! - barlines, for measure numbers and beat positions
//! - spine manipulators `*^`, `*v`, `*x`, `*-`
//!
//! Every data record is one time slice. Its onsets mark their spine busy
//! until `onset + duration`; the next slice starts at the earliest time any
//! **kern spine becomes free.

mod duration;


pub use duration::{parse_kern_token, KernEvent};

use lazy_static::lazy_static;
use num_rational::Rational32;
use regex::Regex;

use crate::errors::ParseError;
use crate::score::{ElementKind, Metadata, Offset, Score, ScoreElement};

lazy_static! {
    static ref KEY_DESIGNATION: Regex =
        Regex::new(r"^\*([A-Ga-g][#-]*):([a-z]*)$").expect("key designation pattern should compile");
    static ref TIME_SIGNATURE: Regex =
        Regex::new(r"^\*M(\d+)/(\d+)$").expect("time signature pattern should compile");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpineKind {
    Kern,
    Text,
    Other,
}

impl SpineKind {
    fn from_exclusive(token: &str) -> Self {
        match token {
            "**kern" => SpineKind::Kern,
            "**text" => SpineKind::Text,
            _ => SpineKind::Other,
        }
    }
}

#[derive(Debug, Clone)]
struct Spine {
    kind: SpineKind,
    staffs: Vec<u32>,
    /// Time at which the current note or rest of a **kern spine ends
    busy_until: Offset,
}

impl Spine {
    fn shares_staff_with(&self, other: &Spine) -> bool {
        self.staffs.iter().any(|staff| other.staffs.contains(staff))
    }
}

/// A closed measure: its barline number, if any, and its time span
#[derive(Debug, Clone)]
struct MeasureSpan {
    label: Option<u32>,
    start: Offset,
    end: Offset,
}

/// Element waiting for measure numbers and beats, known only at the end
#[derive(Debug, Clone)]
struct PendingElement {
    offset: Offset,
    measure_index: usize,
    kind: ElementKind,
}

/// Parse preprocessed Humdrum text into a flattened score
pub fn parse_kern(text: &str) -> Result<Score, ParseError> {
    let mut reader = KernReader::new();
    for (index, line) in text.lines().enumerate() {
        reader.read_line(index + 1, line)?;
    }
    Ok(reader.finish())
}

struct KernReader {
    metadata: Metadata,
    spines: Option<Vec<Spine>>,
    now: Offset,
    measures: Vec<MeasureSpan>,
    open_label: Option<u32>,
    open_start: Offset,
    open_has_data: bool,
    time_signatures: Vec<(Offset, i32, i32)>,
    elements: Vec<PendingElement>,
}

impl KernReader {
    fn new() -> Self {
        Self {
            metadata: Metadata::default(),
            spines: None,
            now: Offset::from_integer(0),
            measures: Vec::new(),
            open_label: None,
            open_start: Offset::from_integer(0),
            open_has_data: false,
            time_signatures: Vec::new(),
            elements: Vec::new(),
        }
    }

    fn read_line(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        if line.is_empty() {
            return Ok(());
        }
        if line.starts_with('!') {
            self.read_comment(line);
            return Ok(());
        }

        let tokens: Vec<&str> = line.split('\t').collect();
        if tokens[0].starts_with("**") {
            self.spines = Some(
                tokens
                    .iter()
                    .map(|token| Spine {
                        kind: SpineKind::from_exclusive(token),
                        staffs: Vec::new(),
                        busy_until: self.now,
                    })
                    .collect(),
            );
            return Ok(());
        }

        let expected = match &self.spines {
            Some(spines) => spines.len(),
            None => return Err(ParseError::MissingExclusiveInterpretation { line: line_no }),
        };
        if tokens.len() != expected {
            return Err(ParseError::SpineCount {
                line: line_no,
                expected,
                found: tokens.len(),
            });
        }

        if tokens[0].starts_with('=') {
            self.read_barline(tokens[0]);
            Ok(())
        } else if tokens[0].starts_with('*') {
            self.read_interpretations(line_no, &tokens)
        } else {
            self.read_data(line_no, &tokens)
        }
    }

    fn read_comment(&mut self, line: &str) {
        let Some(reference) = line.strip_prefix("!!!") else {
            return;
        };
        let Some((key, value)) = reference.split_once(':') else {
            return;
        };
        let value = value.trim().to_string();
        match key.trim() {
            "COM" if self.metadata.composer.is_none() => self.metadata.composer = Some(value),
            "OTL" if self.metadata.title.is_none() => self.metadata.title = Some(value),
            _ => {}
        }
    }

    fn read_barline(&mut self, token: &str) {
        let digits: String = token
            .trim_start_matches('=')
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let label = digits.parse::<u32>().ok();

        if self.open_has_data {
            let closing = self.measures.len();
            self.measures.push(MeasureSpan {
                label: self.open_label,
                start: self.open_start,
                end: self.now,
            });
            // Interpretations written just before the barline belong to the next measure
            for element in self.elements.iter_mut().rev() {
                if element.measure_index != closing || element.offset != self.now {
                    break;
                }
                if matches!(
                    element.kind,
                    ElementKind::TimeSignature { .. } | ElementKind::Key { .. }
                ) {
                    element.measure_index += 1;
                }
            }
        }
        self.open_label = label;
        self.open_start = self.now;
        self.open_has_data = false;
    }

    fn read_interpretations(&mut self, line_no: usize, tokens: &[&str]) -> Result<(), ParseError> {
        let now = self.now;
        let measure_index = self.measures.len();
        let Some(spines) = self.spines.as_mut() else {
            return Err(ParseError::MissingExclusiveInterpretation { line: line_no });
        };

        for (spine, token) in spines.iter_mut().zip(tokens) {
            if let Some(list) = token.strip_prefix("*staff") {
                spine.staffs = list.split('/').filter_map(|s| s.parse().ok()).collect();
                continue;
            }
            if spine.kind != SpineKind::Kern {
                continue;
            }
            if let Some(caps) = TIME_SIGNATURE.captures(token) {
                let (Ok(numerator), Ok(denominator)) = (caps[1].parse::<i32>(), caps[2].parse::<i32>())
                else {
                    continue;
                };
                if numerator == 0 || denominator == 0 {
                    log::debug!("line {}: ignoring time signature {:?}", line_no, token);
                    continue;
                }
                self.time_signatures.push((now, numerator, denominator));
                self.elements.push(PendingElement {
                    offset: now,
                    measure_index,
                    kind: ElementKind::TimeSignature {
                        ratio: format!("{}/{}", numerator, denominator),
                    },
                });
            } else if let Some(caps) = KEY_DESIGNATION.captures(token) {
                if !caps[2].is_empty() {
                    log::debug!("line {}: reading key {:?} by its tonic only", line_no, token);
                }
                self.elements.push(PendingElement {
                    offset: now,
                    measure_index,
                    kind: ElementKind::Key {
                        tonic: caps[1].to_string(),
                    },
                });
            }
        }

        const MANIPULATORS: [&str; 5] = ["*^", "*v", "*x", "*-", "*+"];
        if tokens.iter().any(|token| MANIPULATORS.contains(token)) {
            self.apply_manipulators(line_no, tokens)?;
        }
        Ok(())
    }

    fn apply_manipulators(&mut self, line_no: usize, tokens: &[&str]) -> Result<(), ParseError> {
        let Some(spines) = self.spines.take() else {
            return Err(ParseError::MissingExclusiveInterpretation { line: line_no });
        };
        let mut next = Vec::with_capacity(spines.len() + 1);

        let mut i = 0;
        while i < tokens.len() {
            match tokens[i] {
                "*^" => {
                    next.push(spines[i].clone());
                    next.push(spines[i].clone());
                    i += 1;
                }
                "*v" => {
                    let mut merged = spines[i].clone();
                    let mut j = i + 1;
                    while j < tokens.len() && tokens[j] == "*v" {
                        merged.busy_until = merged.busy_until.max(spines[j].busy_until);
                        j += 1;
                    }
                    next.push(merged);
                    i = j;
                }
                "*x" if tokens.get(i + 1) == Some(&"*x") => {
                    next.push(spines[i + 1].clone());
                    next.push(spines[i].clone());
                    i += 2;
                }
                "*-" => i += 1,
                "*x" | "*+" => {
                    return Err(ParseError::UnsupportedManipulator {
                        line: line_no,
                        token: tokens[i].to_string(),
                    });
                }
                _ => {
                    next.push(spines[i].clone());
                    i += 1;
                }
            }
        }

        self.spines = if next.is_empty() { None } else { Some(next) };
        Ok(())
    }

    fn read_data(&mut self, line_no: usize, tokens: &[&str]) -> Result<(), ParseError> {
        let now = self.now;
        let measure_index = self.measures.len();
        let Some(spines) = self.spines.as_mut() else {
            return Err(ParseError::MissingExclusiveInterpretation { line: line_no });
        };

        // (spine index, element index) of every note starting on this record
        let mut note_onsets: Vec<(usize, usize)> = Vec::new();
        for (index, (spine, token)) in spines.iter_mut().zip(tokens).enumerate() {
            if spine.kind != SpineKind::Kern {
                continue;
            }
            let event = parse_kern_token(token).ok_or_else(|| ParseError::InvalidDuration {
                line: line_no,
                token: token.to_string(),
            })?;
            let (duration, kind) = match event {
                KernEvent::Null | KernEvent::Grace => continue,
                KernEvent::Note(duration) => (duration, ElementKind::Note { lyric: None }),
                KernEvent::Rest(duration) => (duration, ElementKind::Rest),
            };
            spine.busy_until = now + duration;
            if matches!(kind, ElementKind::Note { .. }) {
                note_onsets.push((index, self.elements.len()));
            }
            self.elements.push(PendingElement {
                offset: now,
                measure_index,
                kind,
            });
        }

        for (text_spine, token) in spines.iter().zip(tokens) {
            if text_spine.kind != SpineKind::Text || *token == "." {
                continue;
            }
            if text_spine.staffs.is_empty() {
                log::debug!("line {}: text {:?} has no staff to attach to", line_no, token);
                continue;
            }
            let mut attached = false;
            for &(spine_index, element_index) in &note_onsets {
                if spines[spine_index].shares_staff_with(text_spine) {
                    self.elements[element_index].kind = ElementKind::Note {
                        lyric: Some(token.to_string()),
                    };
                    attached = true;
                }
            }
            if !attached {
                log::warn!("line {}: dropped text {:?}, no note starts with it", line_no, token);
            }
        }

        if let Some(next) = spines
            .iter()
            .filter(|spine| spine.kind == SpineKind::Kern && spine.busy_until > now)
            .map(|spine| spine.busy_until)
            .min()
        {
            self.now = next;
        }
        self.open_has_data = true;
        Ok(())
    }

    fn finish(mut self) -> Score {
        if self.open_has_data {
            self.measures.push(MeasureSpan {
                label: self.open_label,
                start: self.open_start,
                end: self.now,
            });
        }

        let numbers = resolve_measure_numbers(&self.measures);
        let padding = self.pickup_padding();

        let mut score = Score::new(self.metadata.clone());
        for element in &self.elements {
            let (measure, beat) = match self.measures.len() {
                0 => (1, Rational32::from_integer(1)),
                count => {
                    let index = element.measure_index.min(count - 1);
                    let span = &self.measures[index];
                    let start = if index == 0 { span.start - padding } else { span.start };
                    let beat_length = beat_length(self.meter_at(element.offset));
                    (numbers[index], (element.offset - start) / beat_length + 1)
                }
            };
            score.push(ScoreElement {
                offset: element.offset,
                measure,
                beat,
                kind: element.kind.clone(),
            });
        }
        score
    }

    /// Meter in effect at `offset`, 4/4 when none has been declared
    fn meter_at(&self, offset: Offset) -> (i32, i32) {
        self.time_signatures
            .iter()
            .rev()
            .find(|(at, _, _)| *at <= offset)
            .or_else(|| self.time_signatures.first())
            .map(|&(_, numerator, denominator)| (numerator, denominator))
            .unwrap_or((4, 4))
    }

    /// Missing time at the start of an incomplete first measure
    fn pickup_padding(&self) -> Offset {
        let zero = Offset::from_integer(0);
        if self.measures.len() < 2 {
            return zero;
        }
        let first = &self.measures[0];
        let (numerator, denominator) = self.meter_at(first.start);
        let bar_length = Rational32::new(4 * numerator, denominator);
        let length = first.end - first.start;
        if length < bar_length {
            bar_length - length
        } else {
            zero
        }
    }
}

/// Quarter-note length of one beat: dotted beats for compound meters
fn beat_length((numerator, denominator): (i32, i32)) -> Rational32 {
    if numerator > 3 && numerator % 3 == 0 {
        Rational32::new(12, denominator)
    } else {
        Rational32::new(4, denominator)
    }
}

/// Measure numbers for closed measures. Unnumbered barlines count up from the
/// previous measure; an unnumbered first measure counts back from the first
/// numbered one.
fn resolve_measure_numbers(measures: &[MeasureSpan]) -> Vec<u32> {
    let mut numbers: Vec<u32> = Vec::with_capacity(measures.len());
    for (index, span) in measures.iter().enumerate() {
        let number = match (span.label, numbers.last()) {
            (Some(label), _) => label,
            (None, Some(previous)) => previous + 1,
            (None, None) => measures
                .iter()
                .enumerate()
                .skip(index + 1)
                .find_map(|(later, span)| {
                    span.label
                        .map(|label| label.saturating_sub(u32::try_from(later).unwrap_or(u32::MAX)))
                })
                .unwrap_or(1),
        };
        numbers.push(number);
    }
    numbers
}
