/// Parser for the OpenStep property-list dialect written by Xcode

use crate::pbxproj::value::{Dict, Entry, Node, Value};

pub struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser { input, pos: 0 }
    }

    /// Convert byte position to (line, column) for error messages
    fn pos_to_line_col(&self, pos: usize) -> (usize, usize) {
        let before = &self.input[..pos.min(self.input.len())];
        let line = before.matches('\n').count() + 1;
        let col = match before.rfind('\n') {
            Some(nl) => before[nl + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        (line, col)
    }

    /// Create an error message with position information
    fn error_at_pos(&self, message: &str) -> String {
        let (line, col) = self.pos_to_line_col(self.pos);
        format!("[Line {}:{}] {}", line, col, message)
    }

    /// Parse a whole project file. The top level must be a dictionary.
    pub fn parse(&mut self) -> Result<Dict, String> {
        // Skip UTF-8 BOM if present
        if self.input.starts_with('\u{feff}') {
            self.pos = '\u{feff}'.len_utf8();
        }

        self.skip_trivia()?;
        if self.peek_char() != Some('{') {
            return Err(self.error_at_pos("Expected '{' at start of project file"));
        }
        let root = self.parse_dict()?;

        self.skip_trivia()?;
        if let Some(ch) = self.peek_char() {
            return Err(self.error_at_pos(&format!(
                "Unexpected '{}' after end of project file",
                ch
            )));
        }

        Ok(root)
    }

    fn parse_value(&mut self) -> Result<Node, String> {
        self.skip_trivia()?;
        let start = self.pos;

        let value = match self.peek_char() {
            Some('{') => Value::Dict(self.parse_dict()?),
            Some('(') => Value::Array(self.parse_array()?),
            Some('"') | Some('\'') => Value::String(self.parse_quoted()?),
            Some('<') => Value::Data(self.parse_data()?),
            Some(ch) if is_unquoted_char(ch) => Value::String(self.parse_unquoted()),
            Some(ch) => {
                return Err(self.error_at_pos(&format!("Unexpected character '{}'", ch)))
            }
            None => return Err(self.error_at_pos("Unexpected end of input")),
        };

        Ok(Node {
            value,
            span: start..self.pos,
        })
    }

    fn parse_dict(&mut self) -> Result<Dict, String> {
        let open = self.pos;
        self.expect_char('{')?;
        let mut entries = Vec::new();

        loop {
            self.skip_trivia()?;
            match self.peek_char() {
                Some('}') => {
                    let close = self.pos;
                    self.advance_char();
                    return Ok(Dict {
                        entries,
                        open,
                        close,
                    });
                }
                None => return Err(self.error_at_pos("Unterminated dictionary")),
                _ => {}
            }

            let key_node = self.parse_value()?;
            let key = match key_node.value {
                Value::String(s) => s,
                _ => {
                    self.pos = key_node.span.start;
                    return Err(self.error_at_pos("Dictionary keys must be strings"));
                }
            };

            self.skip_trivia()?;
            self.expect_char('=')?;
            let value = self.parse_value()?;
            self.skip_trivia()?;
            self.expect_char(';')?;

            entries.push(Entry {
                key,
                key_span: key_node.span,
                value,
            });
        }
    }

    fn parse_array(&mut self) -> Result<Vec<Node>, String> {
        self.expect_char('(')?;
        let mut items = Vec::new();

        loop {
            self.skip_trivia()?;
            match self.peek_char() {
                Some(')') => {
                    self.advance_char();
                    return Ok(items);
                }
                None => return Err(self.error_at_pos("Unterminated array")),
                _ => {}
            }

            items.push(self.parse_value()?);

            // Items are comma separated; a trailing comma is allowed
            self.skip_trivia()?;
            match self.peek_char() {
                Some(',') => self.advance_char(),
                Some(')') => {}
                _ => return Err(self.error_at_pos("Expected ',' or ')' in array")),
            }
        }
    }

    fn parse_quoted(&mut self) -> Result<String, String> {
        let quote = self.peek_char().unwrap_or('"');
        let start = self.pos;
        self.advance_char();
        let mut out = String::new();

        loop {
            let ch = match self.peek_char() {
                Some(ch) => ch,
                None => {
                    self.pos = start;
                    return Err(self.error_at_pos("Unterminated string"));
                }
            };
            self.advance_char();

            if ch == quote {
                return Ok(out);
            }
            if ch != '\\' {
                out.push(ch);
                continue;
            }

            let escaped = self
                .peek_char()
                .ok_or_else(|| self.error_at_pos("Unterminated escape sequence"))?;
            self.advance_char();
            match escaped {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                'a' => out.push('\u{07}'),
                'b' => out.push('\u{08}'),
                'f' => out.push('\u{0c}'),
                'v' => out.push('\u{0b}'),
                'U' => out.push(self.parse_unicode_escape()?),
                '0'..='7' => out.push(self.parse_octal_escape(escaped)),
                // \\ \" \' and unknown escapes keep the character itself
                other => out.push(other),
            }
        }
    }

    /// \U followed by one to four hex digits, a UTF-16 code unit. A high
    /// surrogate must be followed by a `\U` low surrogate.
    fn parse_unicode_escape(&mut self) -> Result<char, String> {
        let unit = self.parse_utf16_unit()?;
        let mut units = vec![unit];
        if (0xD800..0xDC00).contains(&unit) && self.input[self.pos..].starts_with("\\U") {
            let resume = self.pos;
            self.pos += 2;
            let low = self.parse_utf16_unit()?;
            if (0xDC00..0xE000).contains(&low) {
                units.push(low);
            } else {
                self.pos = resume;
            }
        }

        match char::decode_utf16(units).next() {
            Some(Ok(ch)) => Ok(ch),
            _ => Err(self.error_at_pos("Unpaired surrogate in \\U escape")),
        }
    }

    fn parse_utf16_unit(&mut self) -> Result<u16, String> {
        let digits: String = self.input[self.pos..]
            .chars()
            .take(4)
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        if digits.is_empty() {
            return Err(self.error_at_pos("Invalid \\U escape, expected hex digits"));
        }
        self.pos += digits.len();
        u16::from_str_radix(&digits, 16)
            .map_err(|_| self.error_at_pos("Invalid \\U escape, expected hex digits"))
    }

    /// Up to three octal digits, the first already consumed
    fn parse_octal_escape(&mut self, first: char) -> char {
        let mut code = first.to_digit(8).unwrap_or(0);
        for _ in 0..2 {
            match self.peek_char().and_then(|c| c.to_digit(8)) {
                Some(d) => {
                    code = code * 8 + d;
                    self.advance_char();
                }
                None => break,
            }
        }
        char::from_u32(code).unwrap_or('\u{fffd}')
    }

    fn parse_data(&mut self) -> Result<String, String> {
        self.expect_char('<')?;
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch == '>' {
                let data: String = self.input[start..self.pos]
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                self.advance_char();
                if !data.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(self.error_at_pos("Invalid hex data"));
                }
                return Ok(data);
            }
            self.advance_char();
        }
        Err(self.error_at_pos("Unterminated data block"))
    }

    fn parse_unquoted(&mut self) -> String {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if !is_unquoted_char(ch) {
                break;
            }
            // `//` and `/*` begin a comment even without preceding whitespace
            if ch == '/' && matches!(self.peek_next_char(), Some('/') | Some('*')) {
                break;
            }
            self.advance_char();
        }
        self.input[start..self.pos].to_string()
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) -> Result<(), String> {
        loop {
            match self.peek_char() {
                Some(ch) if ch.is_whitespace() => self.advance_char(),
                Some('/') if self.peek_next_char() == Some('/') => {
                    while let Some(ch) = self.peek_char() {
                        self.advance_char();
                        if ch == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.peek_next_char() == Some('*') => {
                    let start = self.pos;
                    match self.input[self.pos + 2..].find("*/") {
                        Some(end) => self.pos += 2 + end + 2,
                        None => {
                            self.pos = start;
                            return Err(self.error_at_pos("Unterminated comment"));
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), String> {
        match self.peek_char() {
            Some(ch) if ch == expected => {
                self.advance_char();
                Ok(())
            }
            Some(ch) => Err(self.error_at_pos(&format!(
                "Expected '{}', found '{}'",
                expected, ch
            ))),
            None => Err(self.error_at_pos(&format!(
                "Expected '{}', found end of input",
                expected
            ))),
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_next_char(&self) -> Option<char> {
        self.input[self.pos..].chars().nth(1)
    }

    fn advance_char(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }
}

/// Characters allowed in an unquoted string token
pub fn is_unquoted_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '$' | '/' | ':' | '.' | '-' | '+')
}
