use std::collections::BTreeSet;
use std::io::BufRead;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::ObservationRecord;

const MARKER: char = '#';
const TOKENS_PER_LINE: usize = 9;
/// Trailing garbage known to appear on some delta height tokens.
const CORRUPT_SUFFIX: &str = "-557";

/// Observations and distinct point identifiers gathered from field files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedInput {
    pub observations: Vec<ObservationRecord>,
    pub points: BTreeSet<String>,
    pub skipped_lines: usize,
}

/// Accumulates observation records over one or more input streams.
#[derive(Debug, Default)]
pub struct RecordParser {
    parsed: ParsedInput,
}

impl RecordParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every line of `reader`. `source_name` is only used in errors.
    pub fn read<R: BufRead>(&mut self, source_name: &str, reader: R) -> Result<()> {
        let before = self.parsed.observations.len();
        for line in reader.lines() {
            let line = line.map_err(|source| Error::InputRead {
                source_name: source_name.to_string(),
                source,
            })?;
            if !line.starts_with(MARKER) {
                self.parsed.skipped_lines += 1;
                continue;
            }
            let record = parse_line(&line)?;
            self.parsed.points.insert(record.from_id.clone());
            self.parsed.points.insert(record.to_id.clone());
            self.parsed.observations.push(record);
        }
        debug!(
            "Read {} observations from {}",
            self.parsed.observations.len() - before,
            source_name
        );
        Ok(())
    }

    pub fn finish(self) -> ParsedInput {
        self.parsed
    }
}

/// Parse one marked line into an observation record.
///
/// The layout is `from to - - distance dH journal - setups`.
pub fn parse_line(line: &str) -> Result<ObservationRecord> {
    let body = line.trim_start_matches(MARKER).trim();
    let tokens: Vec<&str> = body.split_whitespace().collect();
    if tokens.len() != TOKENS_PER_LINE {
        return Err(Error::MalformedInput {
            line: body.to_string(),
        });
    }

    let invalid = |field: &'static str, value: &str| Error::InvalidField {
        field,
        value: value.to_string(),
        line: body.to_string(),
    };

    let distance = tokens[4]
        .parse::<f64>()
        .map_err(|_| invalid("distance", tokens[4]))?;
    let delta_height = repair_delta_height(tokens[5])
        .parse::<f64>()
        .map_err(|_| invalid("delta height", tokens[5]))?;
    let setup_count = tokens[8]
        .parse::<u32>()
        .map_err(|_| invalid("setup count", tokens[8]))?;

    Ok(ObservationRecord {
        from_id: tokens[0].to_string(),
        to_id: tokens[1].to_string(),
        distance,
        delta_height,
        journal_id: tokens[6].to_string(),
        setup_count,
    })
}

/// Strip the literal `-557` suffix left behind by a formatting fault.
pub fn repair_delta_height(token: &str) -> &str {
    token.strip_suffix(CORRUPT_SUFFIX).unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LINE_A: &str = "# G.1 P1 12:00 a 1234.5 0.52341 J17 b 12";
    const LINE_B: &str = "#P1   P2 12:10 a 800.0 -1.10000-557 J17 b 8";

    #[test]
    fn test_parse_line() {
        let record = parse_line(LINE_A).unwrap();
        assert_eq!(record.from_id, "G.1");
        assert_eq!(record.to_id, "P1");
        assert_eq!(record.distance, 1234.5);
        assert_eq!(record.delta_height, 0.52341);
        assert_eq!(record.journal_id, "J17");
        assert_eq!(record.setup_count, 12);
    }

    #[test]
    fn test_delta_height_suffix_repair() {
        let record = parse_line(LINE_B).unwrap();
        assert_eq!(record.delta_height, -1.1);

        assert_eq!(repair_delta_height("3.25-557"), "3.25");
        assert_eq!(repair_delta_height("-0.557"), "-0.557");
        assert_eq!(repair_delta_height("0.557"), "0.557");
    }

    #[test]
    fn test_wrong_token_count_reports_line() {
        let err = parse_line("# G.1 P1 12:00 a 1234.5 0.5 J17 12").unwrap_err();
        match err {
            Error::MalformedInput { line } => {
                assert_eq!(line, "G.1 P1 12:00 a 1234.5 0.5 J17 12");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = parse_line("# G.1 P1 12:00 a 1234.5 0.5 J17 b 12 extra").unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
        assert!(err.to_string().contains("J17 b 12 extra"));
    }

    #[test]
    fn test_invalid_numeric_token() {
        let err = parse_line("# G.1 P1 12:00 a far 0.5 J17 b 12").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidField {
                field: "distance",
                ..
            }
        ));
    }

    #[test]
    fn test_negative_setup_count_is_rejected() {
        let err = parse_line("# G.1 P1 12:00 a 1234.5 0.5 J17 b -1").unwrap_err();
        match err {
            Error::InvalidField { field, value, .. } => {
                assert_eq!(field, "setup count");
                assert_eq!(value, "-1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unmarked_lines_are_skipped() {
        let text = format!("header line\n{LINE_A}\n\n  # indented is not marked\n{LINE_B}\n");
        let mut parser = RecordParser::new();
        parser.read("field.txt", Cursor::new(text)).unwrap();
        let parsed = parser.finish();

        assert_eq!(parsed.observations.len(), 2);
        assert_eq!(parsed.skipped_lines, 3);
    }

    #[test]
    fn test_point_set_is_distinct_union() {
        let first = format!("{LINE_B}\n");
        let second = format!("{LINE_A}\n# P2 G.1 x a 10 0.1 J18 b 2\n");

        let mut forward = RecordParser::new();
        forward.read("a", Cursor::new(first.clone())).unwrap();
        forward.read("b", Cursor::new(second.clone())).unwrap();

        let mut reverse = RecordParser::new();
        reverse.read("b", Cursor::new(second)).unwrap();
        reverse.read("a", Cursor::new(first)).unwrap();

        let forward = forward.finish();
        let reverse = reverse.finish();
        let expected: Vec<&str> = vec!["G.1", "P1", "P2"];
        assert_eq!(forward.points.iter().collect::<Vec<_>>(), expected);
        assert_eq!(forward.points, reverse.points);
        assert_eq!(forward.observations.len(), 3);
    }

    #[test]
    fn test_malformed_line_aborts_stream() {
        let text = format!("{LINE_A}\n# too few tokens\n{LINE_B}\n");
        let mut parser = RecordParser::new();
        let err = parser.read("field.txt", Cursor::new(text)).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
    }

    #[test]
    fn test_invalid_utf8_is_read_error() {
        let bytes: Vec<u8> = vec![b'#', b' ', 0xff, 0xfe, b'\n'];
        let mut parser = RecordParser::new();
        let err = parser.read("broken.txt", Cursor::new(bytes)).unwrap_err();
        match err {
            Error::InputRead { source_name, .. } => assert_eq!(source_name, "broken.txt"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
