//! RomanText generation
//!
//! Renders offset-ordered annotation records as RomanText: the header block
//! followed by one `m<measure>` line per measure, each holding beat-prefixed
//! `key: numeral` tokens. A time signature change interrupts the measure lines
//! with its own `Time Signature:` line.
//!
//! ```text
//! Composer: Bach, Johann Sebastian
//! Title: ...
//! Analyst: ...
//! Proofreader: ...
//!
//! Time Signature: 4/4
//!
//! m0 b4 G: I
//! m1 V6 b3 I
//! ```

pub mod templates;

pub use templates::{render_header, HeaderContext};

use num_rational::Rational32;

use crate::extract::Annotations;

/// Beat prefix of a token: empty on the downbeat, `b<beat> ` elsewhere
pub fn format_beat(beat: Rational32) -> String {
    if beat == Rational32::from_integer(1) {
        String::new()
    } else if beat.is_integer() {
        format!("b{} ", beat.to_integer())
    } else {
        format!("b{} ", exact_beat(beat))
    }
}

/// Decimal form for power-of-two denominators (`1.5`, `2.25`), reduced
/// fraction otherwise (`4/3`, `21/20`)
fn exact_beat(beat: Rational32) -> String {
    let denominator = *beat.denom();
    if denominator <= 0 || denominator & (denominator - 1) != 0 {
        return beat.to_string();
    }

    // n / 2^k == n * 5^k / 10^k
    let places = denominator.trailing_zeros();
    let scale = 10i128.pow(places);
    let scaled = i128::from(*beat.numer()) * 5i128.pow(places);
    format!(
        "{}.{:0width$}",
        scaled / scale,
        scaled % scale,
        width = places as usize
    )
}

/// Render the body: measure lines and time signature announcements
pub fn render_body(annotations: &Annotations) -> String {
    let mut body = String::new();
    let mut line = String::new();
    let mut current_measure: Option<u32> = None;

    for record in annotations.values() {
        if current_measure != Some(record.measure) {
            current_measure = Some(record.measure);
            flush_line(&mut body, &mut line);
            line = format!("m{} ", record.measure);
        }
        if !record.time_signature.is_empty() {
            body.push_str(&format!("\nTime Signature: {}\n\n", record.time_signature));
        }

        let beat = format_beat(record.beat);
        if record.key.is_empty() {
            line.push_str(&format!("{}{} ", beat, record.roman_numeral));
        } else {
            line.push_str(&format!("{}{}: {} ", beat, record.key, record.roman_numeral));
        }
    }
    flush_line(&mut body, &mut line);
    body
}

/// Move a finished measure line into the body, minus its trailing separator
fn flush_line(body: &mut String, line: &mut String) {
    if line.is_empty() {
        return;
    }
    line.pop();
    body.push_str(line);
    body.push('\n');
    line.clear();
}

/// Header and body of one RomanText document
pub fn render_rntxt(header: &HeaderContext, annotations: &Annotations) -> Result<String, mustache::Error> {
    let mut rntxt = render_header(header)?;
    rntxt.push_str(&render_body(annotations));
    Ok(rntxt)
}
