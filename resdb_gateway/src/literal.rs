//! Text form of asset payloads.
//!
//! Assets leave the gateway as literal strings such as
//! `{'data': {'currentElectionId': 'E1'}}` and come back in either that
//! notation or plain JSON. `parse(&serialize(v)) == v` holds for every
//! JSON value, and mappings keep the order their keys arrived in.

use serde_json::{Map, Number, Value};
use thiserror::Error;

const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected character '{found}' at offset {offset}")]
    Unexpected { found: char, offset: usize },

    #[error("invalid escape sequence at offset {0}")]
    InvalidEscape(usize),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unknown name '{0}'")]
    UnknownName(String),

    #[error("mapping key at offset {0} is not a string")]
    NonStringKey(usize),

    #[error("trailing input at offset {0}")]
    TrailingInput(usize),

    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),
}

/// Render a value in literal notation.
pub fn serialize(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Parse literal notation (or JSON) into a value.
pub fn parse(src: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser {
        chars: src.chars().collect(),
        pos: 0,
    };
    let value = parser.value(0)?;
    parser.skip_ws();
    if parser.pos < parser.chars.len() {
        return Err(LiteralError::TrailingInput(parser.pos));
    }
    Ok(value)
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_str(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_str(out, key);
                out.push_str(": ");
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

fn write_str(out: &mut String, s: &str) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Result<char, LiteralError> {
        let c = self.peek().ok_or(LiteralError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn unexpected(&self) -> LiteralError {
        match self.peek() {
            Some(found) => LiteralError::Unexpected {
                found,
                offset: self.pos,
            },
            None => LiteralError::UnexpectedEnd,
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, LiteralError> {
        if depth > MAX_DEPTH {
            return Err(LiteralError::TooDeep(MAX_DEPTH));
        }
        self.skip_ws();
        match self.peek() {
            Some('{') => self.mapping(depth),
            Some('[') => self.sequence(depth, ']'),
            Some('(') => self.sequence(depth, ')'),
            Some('\'') | Some('"') => Ok(Value::String(self.string()?)),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.name(),
            _ => Err(self.unexpected()),
        }
    }

    fn mapping(&mut self, depth: usize) -> Result<Value, LiteralError> {
        self.pos += 1;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                Some('\'') | Some('"') => {}
                Some(_) => return Err(LiteralError::NonStringKey(self.pos)),
                None => return Err(LiteralError::UnexpectedEnd),
            }
            let key = self.string()?;
            self.skip_ws();
            if self.bump()? != ':' {
                self.pos -= 1;
                return Err(self.unexpected());
            }
            let item = self.value(depth + 1)?;
            map.insert(key, item);

            self.skip_ws();
            match self.bump()? {
                ',' => continue,
                '}' => return Ok(Value::Object(map)),
                _ => {
                    self.pos -= 1;
                    return Err(self.unexpected());
                }
            }
        }
    }

    // `(x)` is a parenthesised value; `(x,)` and `()` are tuples
    fn sequence(&mut self, depth: usize, close: char) -> Result<Value, LiteralError> {
        self.pos += 1;
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                break;
            }
            items.push(self.value(depth + 1)?);

            self.skip_ws();
            match self.bump()? {
                ',' => saw_comma = true,
                c if c == close => break,
                _ => {
                    self.pos -= 1;
                    return Err(self.unexpected());
                }
            }
        }

        if close == ')' && items.len() == 1 && !saw_comma {
            return Ok(items.remove(0));
        }
        Ok(Value::Array(items))
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let quote = self.bump()?;
        let mut out = String::new();
        loop {
            let c = self.bump()?;
            if c == quote {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }

            let at = self.pos - 1;
            match self.bump()? {
                '\\' => out.push('\\'),
                '\'' => out.push('\''),
                '"' => out.push('"'),
                '/' => out.push('/'),
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                'b' => out.push('\u{8}'),
                'f' => out.push('\u{c}'),
                '0' => out.push('\0'),
                // escaped newline continues the literal
                '\n' => {}
                'x' => out.push(self.hex_char(2, at)?),
                'U' => out.push(self.hex_char(8, at)?),
                'u' => {
                    let high = self.hex_code(4, at)?;
                    if (0xD800..0xDC00).contains(&high) {
                        if self.bump()? != '\\' || self.bump()? != 'u' {
                            return Err(LiteralError::InvalidEscape(at));
                        }
                        let low = self.hex_code(4, at)?;
                        if !(0xDC00..0xE000).contains(&low) {
                            return Err(LiteralError::InvalidEscape(at));
                        }
                        let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                        out.push(char::from_u32(code).ok_or(LiteralError::InvalidEscape(at))?);
                    } else {
                        out.push(char::from_u32(high).ok_or(LiteralError::InvalidEscape(at))?);
                    }
                }
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
        }
    }

    fn hex_code(&mut self, digits: usize, at: usize) -> Result<u32, LiteralError> {
        let mut code = 0u32;
        for _ in 0..digits {
            let d = self
                .bump()?
                .to_digit(16)
                .ok_or(LiteralError::InvalidEscape(at))?;
            code = code * 16 + d;
        }
        Ok(code)
    }

    fn hex_char(&mut self, digits: usize, at: usize) -> Result<char, LiteralError> {
        let code = self.hex_code(digits, at)?;
        char::from_u32(code).ok_or(LiteralError::InvalidEscape(at))
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.pos += 1;
        }
        while let Some(c) = self.peek() {
            let after_exponent = matches!(self.chars.get(self.pos.wrapping_sub(1)), Some('e') | Some('E'));
            if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '_') || (after_exponent && matches!(c, '+' | '-')) {
                self.pos += 1;
            } else {
                break;
            }
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        let text = raw.replace('_', "");
        let invalid = || LiteralError::InvalidNumber(raw.clone());

        if text.contains(['.', 'e', 'E']) {
            let f: f64 = text.parse().map_err(|_| invalid())?;
            return Number::from_f64(f).map(Value::Number).ok_or_else(invalid);
        }
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Number(i.into()));
        }
        if let Ok(u) = text.parse::<u64>() {
            return Ok(Value::Number(u.into()));
        }
        let f: f64 = text.parse().map_err(|_| invalid())?;
        Number::from_f64(f).map(Value::Number).ok_or_else(invalid)
    }

    fn name(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            _ => Err(LiteralError::UnknownName(word)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_in_literal_notation() {
        let v = json!({"data": {"a": 1, "ok": true, "none": null, "xs": [1.5, "s"]}});
        assert_eq!(
            serialize(&v),
            "{'data': {'a': 1, 'ok': True, 'none': None, 'xs': [1.5, 's']}}"
        );
    }

    #[test]
    fn mapping_order_survives() {
        let text = "{'data': {'b': 1, 'a': 2, 'c': {'z': None, 'y': []}}}";
        assert_eq!(serialize(&parse(text).unwrap()), text);
        let from_json = parse(r#"{"zeta": 1, "alpha": 2}"#).unwrap();
        assert_eq!(serialize(&from_json), "{'zeta': 1, 'alpha': 2}");
    }

    #[test]
    fn quotes_like_repr() {
        assert_eq!(serialize(&json!("it's")), "\"it's\"");
        assert_eq!(serialize(&json!("say \"hi\"")), "'say \"hi\"'");
        assert_eq!(serialize(&json!("both ' \"")), "'both \\' \"'");
        assert_eq!(serialize(&json!("tab\tnl\n\u{1}")), "'tab\\tnl\\n\\x01'");
    }

    #[test]
    fn parses_literal_and_json_forms() {
        let expected = json!({"data": {"a": 1, "b": [true, null]}});
        assert_eq!(parse("{'data': {'a': 1, 'b': [True, None]}}").unwrap(), expected);
        assert_eq!(
            parse(r#"{"data": {"a": 1, "b": [true, null]}}"#).unwrap(),
            expected
        );
        assert_eq!(parse("{'data':{}}").unwrap(), json!({"data": {}}));
    }

    #[test]
    fn tuples_trailing_commas_and_grouping() {
        assert_eq!(parse("(1, 2,)").unwrap(), json!([1, 2]));
        assert_eq!(parse("(1,)").unwrap(), json!([1]));
        assert_eq!(parse("()").unwrap(), json!([]));
        assert_eq!(parse("(7)").unwrap(), json!(7));
        assert_eq!(parse("{'a': [1, ], }").unwrap(), json!({"a": [1]}));
    }

    #[test]
    fn parses_numbers() {
        assert_eq!(parse("-12").unwrap(), json!(-12));
        assert_eq!(parse("1_000").unwrap(), json!(1000));
        assert_eq!(parse("2.5e3").unwrap(), json!(2500.0));
        assert_eq!(parse("18446744073709551615").unwrap(), json!(u64::MAX));
    }

    #[test]
    fn parses_escapes() {
        assert_eq!(parse(r"'a\'b'").unwrap(), json!("a'b"));
        assert_eq!(parse(r"'\x41é'").unwrap(), json!("Aé"));
        assert_eq!(parse(r#""\ud83d\ude00""#).unwrap(), json!("😀"));
        assert_eq!(parse(r"'\d'").unwrap(), json!("\\d"));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(parse("{'a': 1"), Err(LiteralError::UnexpectedEnd)));
        assert!(matches!(parse("{1: 2}"), Err(LiteralError::NonStringKey(1))));
        assert!(matches!(parse("{'a' 1}"), Err(LiteralError::Unexpected { .. })));
        assert!(matches!(parse("nan"), Err(LiteralError::UnknownName(_))));
        assert!(matches!(parse("1 2"), Err(LiteralError::TrailingInput(2))));
        assert!(matches!(parse(""), Err(LiteralError::UnexpectedEnd)));
        assert!(matches!(parse("'open"), Err(LiteralError::UnexpectedEnd)));
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let src = "[".repeat(MAX_DEPTH + 2);
        assert!(matches!(parse(&src), Err(LiteralError::TooDeep(_))));
    }

    #[test]
    fn round_trips_ledger_assets() {
        let samples = [
            json!({"data": {}}),
            json!({"data": {"currentElectionId": "E1", "votes": [1, 2, 3]}}),
            json!({"data": {"name": "O'Brien", "quote": "\"x\"", "mixed": "'\"\\"}}),
            json!({"data": {"nested": {"deep": [{"k": null}, false, -0.25, 1e300]}}}),
            json!({"data": {"unicode": "ünï\u{7f}\u{0}", "big": u64::MAX, "neg": i64::MIN}}),
            json!([]),
            json!("plain"),
            json!(null),
        ];
        for asset in samples {
            let text = serialize(&asset);
            assert_eq!(parse(&text).unwrap(), asset, "round trip of {}", text);
        }
    }
}
