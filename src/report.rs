//! Parsing and evaluation of embedded simulation check-reports.
//!
//! Simulation result rows carry their check-report as a Python-style data
//! literal (single-quoted strings, `True`/`False`/`None`). [`parse_literal`]
//! accepts exactly that grammar — mappings, sequences, strings, numbers,
//! booleans and `None` — and nothing else: identifiers, calls and operators
//! are a typed [`ReportError`], never evaluated. The resulting value is then
//! deserialized into [`SimReport`] so malformed reports fail schema
//! validation instead of slipping through as loosely-typed data.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// The six gates a candidate must pass to be eligible for submission.
///
/// Any other check returned by the simulator (UNITS warnings and the like)
/// is ignored during filtering.
pub const REQUIRED_GATES: [&str; 6] = [
    "LOW_SHARPE",
    "LOW_FITNESS",
    "LOW_TURNOVER",
    "HIGH_TURNOVER",
    "CONCENTRATED_WEIGHT",
    "LOW_SUB_UNIVERSE_SHARPE",
];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("unexpected character {ch:?} at offset {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("invalid numeric literal at offset {pos}")]
    InvalidNumber { pos: usize },

    #[error("{word:?} is not literal data (offset {pos})")]
    NotALiteral { word: String, pos: usize },

    #[error("trailing characters after literal (offset {pos})")]
    TrailingData { pos: usize },

    #[error("check report does not match the expected schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Outcome of a single named gate in a simulation check-report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum GateResult {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
    #[serde(rename = "WARNING")]
    Warning,
    /// Any result string the platform may add in the future.
    #[serde(other)]
    Unknown,
}

/// One entry of the `checks` list inside a simulation report.
#[derive(Debug, Clone, Deserialize)]
pub struct SimCheck {
    pub name: String,
    /// Absent for informational checks that carry only a value.
    #[serde(default)]
    pub result: Option<GateResult>,
}

/// The check-report embedded in a simulation result row.
#[derive(Debug, Clone, Deserialize)]
pub struct SimReport {
    #[serde(default)]
    pub checks: Vec<SimCheck>,
}

impl SimReport {
    /// Parse a Python-style literal into a schema-validated report.
    pub fn from_literal(src: &str) -> Result<Self, ReportError> {
        let value = parse_literal(src)?;
        Ok(serde_json::from_value(value)?)
    }

    /// A candidate is eligible iff every required gate resolves to exactly
    /// PASS. FAIL, WARNING and missing gates all disqualify.
    pub fn passes_required_gates(&self) -> bool {
        REQUIRED_GATES.iter().all(|gate| {
            self.checks
                .iter()
                .filter(|check| check.name == *gate)
                .next_back()
                .and_then(|check| check.result)
                == Some(GateResult::Pass)
        })
    }
}

/// Parse a Python-style data literal into a [`serde_json::Value`].
///
/// Accepted grammar: dicts with string keys, lists, tuples (read as
/// sequences), single- or double-quoted strings, integers, floats,
/// `True`, `False` and `None`. Anything else is rejected.
pub fn parse_literal(src: &str) -> Result<Value, ReportError> {
    let mut parser = Parser {
        chars: src.chars().collect(),
        pos: 0,
    };
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos != parser.chars.len() {
        return Err(ReportError::TrailingData { pos: parser.pos });
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, want: char) -> Result<(), ReportError> {
        self.skip_ws();
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(ReportError::UnexpectedChar {
                ch: c,
                pos: self.pos - 1,
            }),
            None => Err(ReportError::UnexpectedEnd),
        }
    }

    fn value(&mut self) -> Result<Value, ReportError> {
        self.skip_ws();
        match self.peek() {
            None => Err(ReportError::UnexpectedEnd),
            Some('{') => self.mapping(),
            Some('[') | Some('(') => self.sequence(),
            Some('\'') | Some('"') => self.string().map(Value::String),
            Some(c) if c == '-' || c == '+' || c.is_ascii_digit() => self.number(),
            Some(_) => self.keyword(),
        }
    }

    fn mapping(&mut self) -> Result<Value, ReportError> {
        self.bump(); // '{'
        let mut map = Map::new();
        self.skip_ws();
        if self.peek() == Some('}') {
            self.bump();
            return Ok(Value::Object(map));
        }
        loop {
            self.skip_ws();
            let key = match self.peek() {
                Some('\'') | Some('"') => self.string()?,
                Some(c) => {
                    return Err(ReportError::UnexpectedChar { ch: c, pos: self.pos });
                }
                None => return Err(ReportError::UnexpectedEnd),
            };
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);
            self.skip_ws();
            match self.bump() {
                Some(',') => {
                    self.skip_ws();
                    // trailing comma
                    if self.peek() == Some('}') {
                        self.bump();
                        break;
                    }
                }
                Some('}') => break,
                Some(c) => {
                    return Err(ReportError::UnexpectedChar {
                        ch: c,
                        pos: self.pos - 1,
                    });
                }
                None => return Err(ReportError::UnexpectedEnd),
            }
        }
        Ok(Value::Object(map))
    }

    fn sequence(&mut self) -> Result<Value, ReportError> {
        let open = self.bump().expect("sequence entered on delimiter");
        let close = if open == '[' { ']' } else { ')' };
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(close) {
            self.bump();
            return Ok(Value::Array(items));
        }
        loop {
            items.push(self.value()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => {
                    self.skip_ws();
                    if self.peek() == Some(close) {
                        self.bump();
                        break;
                    }
                }
                Some(c) if c == close => break,
                Some(c) => {
                    return Err(ReportError::UnexpectedChar {
                        ch: c,
                        pos: self.pos - 1,
                    });
                }
                None => return Err(ReportError::UnexpectedEnd),
            }
        }
        Ok(Value::Array(items))
    }

    fn string(&mut self) -> Result<String, ReportError> {
        let quote = self.bump().expect("string entered on quote");
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(ReportError::UnexpectedEnd),
                Some('\\') => match self.bump() {
                    None => return Err(ReportError::UnexpectedEnd),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('\\') => out.push('\\'),
                    Some('\'') => out.push('\''),
                    Some('"') => out.push('"'),
                    // leave escapes we do not know intact
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<Value, ReportError> {
        let start = self.pos;
        if matches!(self.peek(), Some('+') | Some('-')) {
            self.bump();
        }
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {
                    self.bump();
                }
                '.' | 'e' | 'E' => {
                    is_float = true;
                    self.bump();
                }
                '+' | '-' if is_float => {
                    self.bump();
                }
                _ => break,
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if is_float {
            let parsed: f64 = text
                .parse()
                .map_err(|_| ReportError::InvalidNumber { pos: start })?;
            serde_json::Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or(ReportError::InvalidNumber { pos: start })
        } else {
            let parsed: i64 = text
                .parse()
                .map_err(|_| ReportError::InvalidNumber { pos: start })?;
            Ok(Value::Number(parsed.into()))
        }
    }

    fn keyword(&mut self) -> Result<Value, ReportError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphabetic() || c == '_') {
            self.bump();
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            "" => match self.peek() {
                Some(c) => Err(ReportError::UnexpectedChar { ch: c, pos: start }),
                None => Err(ReportError::UnexpectedEnd),
            },
            _ => Err(ReportError::NotALiteral { word, pos: start }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report_with(results: &[(&str, &str)]) -> String {
        let checks: Vec<String> = results
            .iter()
            .map(|(name, result)| format!("{{'name': '{name}', 'result': '{result}'}}"))
            .collect();
        format!("{{'checks': [{}]}}", checks.join(", "))
    }

    #[test]
    fn parses_nested_literal() {
        let value = parse_literal(
            "{'checks': [{'name': 'LOW_SHARPE', 'result': 'PASS', 'value': 1.58}], 'selfCorrelated': False}",
        )
        .unwrap();
        assert_eq!(value["checks"][0]["name"], json!("LOW_SHARPE"));
        assert_eq!(value["checks"][0]["value"], json!(1.58));
        assert_eq!(value["selfCorrelated"], json!(false));
    }

    #[test]
    fn parses_scalars_and_tuples() {
        assert_eq!(parse_literal("True").unwrap(), json!(true));
        assert_eq!(parse_literal("None").unwrap(), json!(null));
        assert_eq!(parse_literal("-42").unwrap(), json!(-42));
        assert_eq!(parse_literal("2.5e1").unwrap(), json!(25.0));
        assert_eq!(parse_literal("(1, 2, 3)").unwrap(), json!([1, 2, 3]));
        assert_eq!(parse_literal("\"double\"").unwrap(), json!("double"));
    }

    #[test]
    fn parses_escapes_and_trailing_commas() {
        assert_eq!(
            parse_literal(r"'it\'s'").unwrap(),
            json!("it's"),
        );
        assert_eq!(parse_literal("[1, 2,]").unwrap(), json!([1, 2]));
        assert_eq!(parse_literal("{'a': 1,}").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn rejects_calls_and_identifiers() {
        assert!(matches!(
            parse_literal("__import__('os')"),
            Err(ReportError::NotALiteral { .. })
        ));
        assert!(matches!(
            parse_literal("{'a': open('x')}"),
            Err(ReportError::NotALiteral { .. })
        ));
        assert!(matches!(
            parse_literal("nan"),
            Err(ReportError::NotALiteral { .. })
        ));
    }

    #[test]
    fn rejects_trailing_and_truncated_input() {
        assert!(matches!(
            parse_literal("{'a': 1} extra"),
            Err(ReportError::TrailingData { .. })
        ));
        assert!(matches!(
            parse_literal("{'a': "),
            Err(ReportError::UnexpectedEnd)
        ));
        assert!(matches!(
            parse_literal("[1, 2"),
            Err(ReportError::UnexpectedEnd)
        ));
    }

    #[test]
    fn rejects_non_string_dict_keys() {
        assert!(matches!(
            parse_literal("{1: 'a'}"),
            Err(ReportError::UnexpectedChar { ch: '1', .. })
        ));
    }

    #[test]
    fn report_passes_when_all_required_gates_pass() {
        let src = report_with(&[
            ("LOW_SHARPE", "PASS"),
            ("LOW_FITNESS", "PASS"),
            ("LOW_TURNOVER", "PASS"),
            ("HIGH_TURNOVER", "PASS"),
            ("CONCENTRATED_WEIGHT", "PASS"),
            ("LOW_SUB_UNIVERSE_SHARPE", "PASS"),
            // extra checks are ignored
            ("UNITS", "WARNING"),
        ]);
        let report = SimReport::from_literal(&src).unwrap();
        assert!(report.passes_required_gates());
    }

    #[test]
    fn report_fails_on_fail_warning_or_missing_gate() {
        for bad in ["FAIL", "WARNING", "ERROR"] {
            let src = report_with(&[
                ("LOW_SHARPE", bad),
                ("LOW_FITNESS", "PASS"),
                ("LOW_TURNOVER", "PASS"),
                ("HIGH_TURNOVER", "PASS"),
                ("CONCENTRATED_WEIGHT", "PASS"),
                ("LOW_SUB_UNIVERSE_SHARPE", "PASS"),
            ]);
            let report = SimReport::from_literal(&src).unwrap();
            assert!(!report.passes_required_gates(), "result {bad} must disqualify");
        }

        // missing gate entirely
        let src = report_with(&[
            ("LOW_SHARPE", "PASS"),
            ("LOW_FITNESS", "PASS"),
            ("LOW_TURNOVER", "PASS"),
            ("HIGH_TURNOVER", "PASS"),
            ("CONCENTRATED_WEIGHT", "PASS"),
        ]);
        let report = SimReport::from_literal(&src).unwrap();
        assert!(!report.passes_required_gates());
    }

    #[test]
    fn report_tolerates_checks_without_result() {
        let report =
            SimReport::from_literal("{'checks': [{'name': 'UNITS', 'value': 3}]}").unwrap();
        assert_eq!(report.checks.len(), 1);
        assert_eq!(report.checks[0].result, None);
        assert!(!report.passes_required_gates());
    }

    #[test]
    fn unknown_result_string_deserializes_to_unknown() {
        let report =
            SimReport::from_literal("{'checks': [{'name': 'LOW_SHARPE', 'result': 'PENDING'}]}")
                .unwrap();
        assert_eq!(report.checks[0].result, Some(GateResult::Unknown));
    }

    #[test]
    fn schema_mismatch_is_a_typed_error() {
        // `checks` must be a sequence of mappings
        assert!(matches!(
            SimReport::from_literal("{'checks': 'nope'}"),
            Err(ReportError::Schema(_))
        ));
    }
}
