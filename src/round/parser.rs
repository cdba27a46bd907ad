use std::fmt;

use thiserror::Error;

use super::models::Guess;

/// Why a guess line was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorReason {
    TooFewTokens,
    NoNumber,
    EmptyName,
}

impl fmt::Display for ParseErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ParseErrorReason::TooFewTokens => "expected format \"Name Number\"",
            ParseErrorReason::NoNumber => "no valid number found",
            ParseErrorReason::EmptyName => "name is missing",
        };
        f.write_str(message)
    }
}

/// A malformed guess line, reported with its 1-based position in the input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Line {line} \"{content}\": {reason}")]
pub struct GuessParseError {
    pub line: usize,
    pub content: String,
    pub reason: ParseErrorReason,
}

/// Parses newline separated `"<name...> <number>"` lines into guesses.
///
/// The number is the last token that looks numeric, so names may contain
/// spaces and trailing words after the number are ignored. Blank lines are
/// skipped; input order is preserved.
pub fn parse_guesses(raw_text: &str) -> Result<Vec<Guess>, GuessParseError> {
    raw_text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| parse_line(index + 1, line.trim()))
        .collect()
}

fn parse_line(line_number: usize, line: &str) -> Result<Guess, GuessParseError> {
    let error = |reason| GuessParseError {
        line: line_number,
        content: line.to_string(),
        reason,
    };

    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(error(ParseErrorReason::TooFewTokens));
    }

    let (index, value) = tokens
        .iter()
        .enumerate()
        .rev()
        .find_map(|(index, token)| parse_number_token(token).map(|value| (index, value)))
        .ok_or_else(|| error(ParseErrorReason::NoNumber))?;

    let participant_name = tokens[..index].join(" ");
    if participant_name.is_empty() {
        return Err(error(ParseErrorReason::EmptyName));
    }

    Ok(Guess {
        participant_name,
        value,
    })
}

/// Accepts digits with at most one `,` or `.` separator and an optional trailing `%`.
/// Tokens too long to fit a finite `f64` are not numbers.
fn parse_number_token(token: &str) -> Option<f64> {
    let digits = token.strip_suffix('%').unwrap_or(token);

    let mut separators = 0;
    let mut has_digit = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => has_digit = true,
            ',' | '.' => separators += 1,
            _ => return None,
        }
    }

    if !has_digit || separators > 1 {
        return None;
    }

    digits
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Normalises a free-form decimal like `"12,5%"` or `"-3.25"` into a finite number
pub fn parse_decimal(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();

    trimmed
        .replacen(',', ".", 1)
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parses_name_with_spaces_and_locale_number() {
        let guesses = parse_guesses("Max Mustermann 12,5%").unwrap();
        assert_eq!(guesses, vec![Guess::new("Max Mustermann", 12.5)]);
    }

    #[rstest]
    #[case("Anna 45", "Anna", 45.0)]
    #[case("Ben 55.5", "Ben", 55.5)]
    #[case("Cara 7%", "Cara", 7.0)]
    #[case("  Dora   Maria   0,75  ", "Dora Maria", 0.75)]
    #[case("Eve 12 points", "Eve", 12.0)]
    #[case("Agent 007 42", "Agent 007", 42.0)]
    #[case("Finn 3.", "Finn", 3.0)]
    fn test_parses_single_line(#[case] line: &str, #[case] name: &str, #[case] value: f64) {
        let guesses = parse_guesses(line).unwrap();
        assert_eq!(guesses, vec![Guess::new(name, value)]);
    }

    #[rstest]
    #[case("Anna", ParseErrorReason::TooFewTokens)]
    #[case("45", ParseErrorReason::TooFewTokens)]
    #[case("Anna Bauer", ParseErrorReason::NoNumber)]
    #[case("Anna -5", ParseErrorReason::NoNumber)]
    #[case("Anna 1.2.3", ParseErrorReason::NoNumber)]
    #[case("Anna 1,2.3%", ParseErrorReason::NoNumber)]
    #[case("12 Anna", ParseErrorReason::EmptyName)]
    fn test_rejects_malformed_line(#[case] line: &str, #[case] reason: ParseErrorReason) {
        let error = parse_guesses(line).unwrap_err();
        assert_eq!(error.reason, reason);
        assert_eq!(error.line, 1);
        assert_eq!(error.content, line.trim());
    }

    #[test]
    fn test_skips_blank_lines_and_preserves_order() {
        let input = "Ben 55\n\n   \nAnna 45\nCara 50\n";
        let guesses = parse_guesses(input).unwrap();

        let names: Vec<&str> = guesses
            .iter()
            .map(|g| g.participant_name.as_str())
            .collect();
        assert_eq!(names, vec!["Ben", "Anna", "Cara"]);
    }

    #[test]
    fn test_error_reports_original_line_number() {
        let input = "Anna 45\n\nBen\nCara 50";
        let error = parse_guesses(input).unwrap_err();

        assert_eq!(error.line, 3);
        assert_eq!(error.reason, ParseErrorReason::TooFewTokens);
        assert_eq!(error.to_string(), "Line 3 \"Ben\": expected format \"Name Number\"");
    }

    #[test]
    fn test_rejects_numbers_that_overflow_to_infinity() {
        let huge = "9".repeat(400);
        let input = format!("Anna 45\nBen {huge}");

        let error = parse_guesses(&input).unwrap_err();

        assert_eq!(error.line, 2);
        assert_eq!(error.reason, ParseErrorReason::NoNumber);
        assert_eq!(error.content, format!("Ben {huge}"));
    }

    #[test]
    fn test_keeps_duplicate_names() {
        let guesses = parse_guesses("Anna 1\nAnna 2").unwrap();
        assert_eq!(guesses.len(), 2);
    }

    #[test]
    fn test_empty_input_yields_no_guesses() {
        assert!(parse_guesses("\n \n").unwrap().is_empty());
    }

    #[rstest]
    #[case("50", Some(50.0))]
    #[case(" 12,5% ", Some(12.5))]
    #[case("-3.25", Some(-3.25))]
    #[case("", None)]
    #[case("abc", None)]
    #[case("inf", None)]
    fn test_parse_decimal(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_decimal(input), expected);
    }
}
