//! **kern token rhythm decoding
//!
//! Durations are in quarter notes: recip `4` is a quarter, `8` an eighth,
//! `0` a breve, `00` a longa. `n%m` is the rational recip n/m. Each
//! augmentation dot adds half of the previous value.

use num_rational::Rational32;

/// What a **kern data token contributes to the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernEvent {
    /// `.`: the previous event continues
    Null,
    Note(Rational32),
    Rest(Rational32),
    /// Grace notes take no time and are not reported
    Grace,
}

/// Decode one data token of a **kern spine; `None` if the rhythm is unreadable
pub fn parse_kern_token(token: &str) -> Option<KernEvent> {
    if token == "." {
        return Some(KernEvent::Null);
    }
    // Chord members share a duration; the first one carries it
    let first = token.split(' ').find(|part| !part.is_empty())?;
    if first.contains('q') || first.contains('Q') {
        return Some(KernEvent::Grace);
    }

    let duration = parse_recip(first)?;
    if first.contains('r') {
        Some(KernEvent::Rest(duration))
    } else {
        Some(KernEvent::Note(duration))
    }
}

fn parse_recip(token: &str) -> Option<Rational32> {
    let start = token.find(|c: char| c.is_ascii_digit())?;
    let rest = &token[start..];
    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    let mut rest = &rest[digits_end..];

    let (mut numer, denom) = if digits.chars().all(|c| c == '0') {
        // 0 = breve, 00 = longa, 000 = maxima
        let exponent = u32::try_from(digits.len()).ok()?;
        (4i32.checked_mul(2i32.checked_pow(exponent)?)?, 1)
    } else {
        (4, digits.parse::<i32>().ok()?)
    };

    if let Some(after) = rest.strip_prefix('%') {
        let end = after.find(|c: char| !c.is_ascii_digit()).unwrap_or(after.len());
        let divisor: i32 = after[..end].parse().ok()?;
        if divisor == 0 {
            return None;
        }
        numer = numer.checked_mul(divisor)?;
        rest = &after[end..];
    }
    let base = Rational32::new(numer, denom);

    // n dots: base * (2^(n+1) - 1) / 2^n
    let dots = u32::try_from(rest.chars().take_while(|&c| c == '.').count()).ok()?;
    let scale = 2i32.checked_pow(dots)?;
    let factor = scale.checked_mul(2)?.checked_sub(1)?;
    Some(Rational32::new(
        base.numer().checked_mul(factor)?,
        base.denom().checked_mul(scale)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(n: i32, d: i32) -> Rational32 {
        Rational32::new(n, d)
    }

    #[test]
    fn test_basic_values() {
        assert_eq!(parse_kern_token("4c"), Some(KernEvent::Note(r(1, 1))));
        assert_eq!(parse_kern_token("2GG"), Some(KernEvent::Note(r(2, 1))));
        assert_eq!(parse_kern_token("8ee-J"), Some(KernEvent::Note(r(1, 2))));
        assert_eq!(parse_kern_token("16b"), Some(KernEvent::Note(r(1, 4))));
        assert_eq!(parse_kern_token("1d"), Some(KernEvent::Note(r(4, 1))));
    }

    #[test]
    fn test_breve_and_longa() {
        assert_eq!(parse_kern_token("0c"), Some(KernEvent::Note(r(8, 1))));
        assert_eq!(parse_kern_token("00c"), Some(KernEvent::Note(r(16, 1))));
    }

    #[test]
    fn test_dots() {
        assert_eq!(parse_kern_token("4.c"), Some(KernEvent::Note(r(3, 2))));
        assert_eq!(parse_kern_token("2..c"), Some(KernEvent::Note(r(7, 2))));
    }

    #[test]
    fn test_triplets_and_rational_recip() {
        assert_eq!(parse_kern_token("12c"), Some(KernEvent::Note(r(1, 3))));
        assert_eq!(parse_kern_token("3%2c"), Some(KernEvent::Note(r(8, 3))));
    }

    #[test]
    fn test_rests_ties_and_phrase_marks() {
        assert_eq!(parse_kern_token("4r"), Some(KernEvent::Rest(r(1, 1))));
        assert_eq!(parse_kern_token("[4.G"), Some(KernEvent::Note(r(3, 2))));
        assert_eq!(parse_kern_token("4G]"), Some(KernEvent::Note(r(1, 1))));
        assert_eq!(parse_kern_token("{4c;"), Some(KernEvent::Note(r(1, 1))));
    }

    #[test]
    fn test_chord_uses_first_member() {
        assert_eq!(parse_kern_token("2C 2E 2G"), Some(KernEvent::Note(r(2, 1))));
    }

    #[test]
    fn test_null_and_grace() {
        assert_eq!(parse_kern_token("."), Some(KernEvent::Null));
        assert_eq!(parse_kern_token("8qd"), Some(KernEvent::Grace));
    }

    #[test]
    fn test_missing_duration() {
        assert_eq!(parse_kern_token("cc#"), None);
        assert_eq!(parse_kern_token("3%0c"), None);
    }

    #[test]
    fn test_overflowing_rhythm_is_unreadable() {
        let many_dots = format!("4{}c", ".".repeat(40));
        assert_eq!(parse_kern_token(&many_dots), None);
        let many_zeros = format!("{}c", "0".repeat(40));
        assert_eq!(parse_kern_token(&many_zeros), None);
        assert_eq!(parse_kern_token("1%2000000000c"), None);
    }

    #[test]
    fn test_dotted_rational_recip() {
        assert_eq!(parse_kern_token("3%2.c"), Some(KernEvent::Note(r(4, 1))));
        assert_eq!(parse_kern_token("0.c"), Some(KernEvent::Note(r(12, 1))));
    }
}
