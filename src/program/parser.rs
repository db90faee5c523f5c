//! Reader for ground programs in the usual answer-set text syntax.
//!
//! Accepted statements:
//!
//! - facts `a.` and rules `h :- b1, not b2.`
//! - integrity constraints `:- b1, b2.`
//! - unbounded choices `{a; b} :- body.`
//! - classical negation `-a` anywhere an atom is allowed
//! - `#show` directives (ignored)
//!
//! Line comments `% ...` and block comments `%* ... *%` are skipped. Atom names
//! are normalized by dropping whitespace outside of string constants, so
//! `p(a, b)` and `p(a,b)` denote the same atom.

use miette::{NamedSource, SourceSpan};

use crate::error::ProgramError;

use super::{GroundProgram, Head, Rule};

/// Parse a ground program. `name` labels diagnostics (usually the file path).
pub fn parse_program(name: &str, text: &str) -> Result<GroundProgram, ProgramError> {
    let reader = Reader { name, text };
    let cleaned = reader.strip_comments()?;
    let mut program = GroundProgram::new();

    for (start, end) in reader.statements(&cleaned)? {
        reader.statement(&cleaned[start..end], start, &mut program)?;
    }

    program.finalize();
    tracing::debug!(
        atoms = program.atom_count(),
        rules = program.rules().len(),
        source = name,
        "parsed ground program"
    );
    Ok(program)
}

struct Reader<'a> {
    name: &'a str,
    text: &'a str,
}

impl Reader<'_> {
    fn source(&self) -> NamedSource<String> {
        NamedSource::new(self.name, self.text.to_string())
    }

    fn syntax(&self, message: impl Into<String>, offset: usize, len: usize) -> ProgramError {
        ProgramError::Syntax {
            message: message.into(),
            src: self.source(),
            span: SourceSpan::new(offset.into(), len),
        }
    }

    /// Replace comments by spaces, byte for byte, so offsets stay valid.
    fn strip_comments(&self) -> Result<String, ProgramError> {
        let bytes = self.text.as_bytes();
        let mut out = String::with_capacity(self.text.len());
        let mut chars = self.text.char_indices().peekable();
        let mut in_string = false;

        while let Some((i, c)) = chars.next() {
            if in_string {
                out.push(c);
                if c == '\\' {
                    if let Some((_, escaped)) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == '"' {
                    in_string = false;
                }
                continue;
            }
            match c {
                '"' => {
                    in_string = true;
                    out.push(c);
                }
                '%' if bytes.get(i + 1) == Some(&b'*') => {
                    let Some(close) = self.text[i + 2..].find("*%") else {
                        return Err(self.syntax("unterminated block comment", i, 2));
                    };
                    let end = i + 2 + close + 2;
                    blank(&mut out, &self.text[i..end]);
                    while chars.peek().is_some_and(|&(j, _)| j < end) {
                        chars.next();
                    }
                }
                '%' => {
                    let end = self.text[i..].find('\n').map_or(self.text.len(), |n| i + n);
                    blank(&mut out, &self.text[i..end]);
                    while chars.peek().is_some_and(|&(j, _)| j < end) {
                        chars.next();
                    }
                }
                _ => out.push(c),
            }
        }
        if in_string {
            return Err(self.syntax("unterminated string", self.text.len().saturating_sub(1), 1));
        }
        Ok(out)
    }

    /// Byte ranges of statements (without the terminating period).
    fn statements(&self, cleaned: &str) -> Result<Vec<(usize, usize)>, ProgramError> {
        let mut out = Vec::new();
        let mut start = 0;
        let mut depth = 0i32;
        let mut in_string = false;
        let mut escaped = false;

        for (i, c) in cleaned.char_indices() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '(' | '{' => depth += 1,
                ')' | '}' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(self.syntax(format!("unbalanced '{c}'"), i, 1));
                    }
                }
                '.' if depth == 0 => {
                    out.push((start, i));
                    start = i + 1;
                }
                _ => {}
            }
        }

        let rest = &cleaned[start..];
        if !rest.trim().is_empty() {
            let offset = start + (rest.len() - rest.trim_start().len());
            return Err(self.syntax(
                "statement is missing its terminating period",
                offset,
                rest.trim().len(),
            ));
        }
        Ok(out)
    }

    fn statement(&self, raw: &str, offset: usize, program: &mut GroundProgram) -> Result<(), ProgramError> {
        let (stmt, offset) = trim_with_offset(raw, offset);
        if stmt.is_empty() {
            return Err(self.syntax("empty statement", offset.saturating_sub(1), 1));
        }

        if let Some(directive) = stmt.strip_prefix('#') {
            let word: String = directive
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect();
            if word == "show" {
                tracing::trace!(statement = stmt, "ignoring #show directive");
                return Ok(());
            }
            return Err(ProgramError::UnsupportedDirective {
                directive: format!("#{word}"),
                src: self.source(),
                span: SourceSpan::new(offset.into(), word.len() + 1),
            });
        }

        let (head_text, body) = match find_top_level(stmt, ":-") {
            Some(split) => (&stmt[..split], Some((&stmt[split + 2..], offset + split + 2))),
            None => (stmt, None),
        };

        let head = self.head(head_text, offset, program)?;
        let mut rule = Rule {
            head,
            positive: Vec::new(),
            negative: Vec::new(),
        };
        if let Some((body_text, body_offset)) = body {
            self.body(body_text, body_offset, program, &mut rule)?;
        }
        program.add_rule(rule);
        Ok(())
    }

    fn head(&self, raw: &str, offset: usize, program: &mut GroundProgram) -> Result<Head, ProgramError> {
        let (text, offset) = trim_with_offset(raw, offset);
        if text.is_empty() {
            return Ok(Head::Falsum);
        }
        if let Some(inner) = text.strip_prefix('{') {
            let Some(inner) = inner.strip_suffix('}') else {
                return Err(self.syntax(
                    "choice heads with cardinality bounds are not supported",
                    offset,
                    text.len(),
                ));
            };
            let mut atoms = Vec::new();
            for (element, at) in split_top_level(inner, ';', offset + 1) {
                let (element, at) = trim_with_offset(element, at);
                if element.is_empty() {
                    continue;
                }
                let name = self.atom(element, at)?;
                atoms.push(program.intern(&name));
            }
            return Ok(Head::Choice(atoms));
        }
        if find_top_level(text, "|").is_some() || find_top_level(text, ";").is_some() {
            return Err(self.syntax("disjunctive heads are not supported", offset, text.len()));
        }
        let name = self.atom(text, offset)?;
        Ok(Head::Atom(program.intern(&name)))
    }

    fn body(
        &self,
        raw: &str,
        offset: usize,
        program: &mut GroundProgram,
        rule: &mut Rule,
    ) -> Result<(), ProgramError> {
        if let Some(at) = find_top_level(raw, ";") {
            return Err(self.syntax("disjunctive bodies are not supported", offset + at, 1));
        }
        for (literal, at) in split_top_level(raw, ',', offset) {
            let (literal, at) = trim_with_offset(literal, at);
            if literal.is_empty() {
                return Err(self.syntax("empty body literal", at.saturating_sub(1), 1));
            }
            match strip_keyword(literal, "not") {
                Some(rest) => {
                    let (rest, rest_at) = trim_with_offset(rest, at + (literal.len() - rest.len()));
                    if strip_keyword(rest, "not").is_some() {
                        return Err(self.syntax("double negation is not supported", at, literal.len()));
                    }
                    let name = self.atom(rest, rest_at)?;
                    rule.negative.push(program.intern(&name));
                }
                None => {
                    let name = self.atom(literal, at)?;
                    rule.positive.push(program.intern(&name));
                }
            }
        }
        Ok(())
    }

    /// Validate a ground atom and return its normalized name.
    fn atom(&self, text: &str, offset: usize) -> Result<String, ProgramError> {
        let mut cursor = Cursor {
            reader: self,
            text,
            pos: 0,
            offset,
            out: String::with_capacity(text.len()),
        };
        if cursor.eat('-') {
            cursor.out.push('-');
        }
        cursor.skip_ws();
        match cursor.peek() {
            Some(c) if c.is_ascii_lowercase() || c == '_' => {}
            Some(c) if c.is_ascii_uppercase() => return Err(cursor.variable()),
            _ => return Err(cursor.error("expected an atom")),
        }
        cursor.function()?;
        cursor.skip_ws();
        if cursor.pos < text.len() {
            return Err(cursor.error("unexpected input after atom"));
        }
        Ok(cursor.out)
    }
}

/// Recursive-descent validator for ground terms.
struct Cursor<'r, 't> {
    reader: &'r Reader<'r>,
    text: &'t str,
    pos: usize,
    offset: usize,
    out: String,
}

impl Cursor<'_, '_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn error(&self, message: &str) -> ProgramError {
        let len = self.peek().map_or(1, char::len_utf8);
        self.reader.syntax(message, self.offset + self.pos, len)
    }

    fn variable(&self) -> ProgramError {
        let name: String = self.text[self.pos..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '\'')
            .collect();
        ProgramError::NonGround {
            span: SourceSpan::new((self.offset + self.pos).into(), name.len().max(1)),
            term: name,
            src: self.reader.source(),
        }
    }

    fn identifier(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '\'' {
                self.out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// `ident` or `ident(term, ...)`.
    fn function(&mut self) -> Result<(), ProgramError> {
        self.identifier();
        if self.eat('(') {
            self.out.push('(');
            self.arguments()?;
        }
        Ok(())
    }

    /// Comma-separated terms up to and including the closing parenthesis.
    fn arguments(&mut self) -> Result<(), ProgramError> {
        if self.eat(')') {
            self.out.push(')');
            return Ok(());
        }
        loop {
            self.term()?;
            if self.eat(',') {
                self.out.push(',');
                continue;
            }
            if self.eat(')') {
                self.out.push(')');
                return Ok(());
            }
            return Err(self.error("expected ',' or ')'"));
        }
    }

    fn term(&mut self) -> Result<(), ProgramError> {
        self.skip_ws();
        match self.peek() {
            Some('"') => self.string(),
            Some('(') => {
                self.pos += 1;
                self.out.push('(');
                self.arguments()
            }
            Some('-') => {
                self.pos += 1;
                self.out.push('-');
                self.term()
            }
            Some(c) if c.is_ascii_digit() => {
                while let Some(d) = self.peek().filter(char::is_ascii_digit) {
                    self.out.push(d);
                    self.pos += 1;
                }
                Ok(())
            }
            Some(c) if c.is_ascii_lowercase() => self.function(),
            Some(c) if c.is_ascii_uppercase() || c == '_' => Err(self.variable()),
            _ => Err(self.error("expected a term")),
        }
    }

    fn string(&mut self) -> Result<(), ProgramError> {
        let start = self.pos;
        self.pos += 1;
        let mut escaped = false;
        while let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    self.out.push_str(&self.text[start..self.pos]);
                    return Ok(());
                }
                _ => {}
            }
        }
        Err(self.reader.syntax("unterminated string", self.offset + start, 1))
    }
}

fn blank(out: &mut String, skipped: &str) {
    for c in skipped.chars() {
        if c == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat_n(' ', c.len_utf8()));
        }
    }
}

fn trim_with_offset(text: &str, offset: usize) -> (&str, usize) {
    let leading = text.len() - text.trim_start().len();
    (text.trim(), offset + leading)
}

/// `not` followed by whitespace; returns the remainder.
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    rest.starts_with(char::is_whitespace).then_some(rest)
}

/// First occurrence of `needle` outside parentheses, braces, and strings.
fn find_top_level(text: &str, needle: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '{' => depth += 1,
            ')' | '}' => depth -= 1,
            _ if depth == 0 && text[i..].starts_with(needle) => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split on a separator at nesting depth zero, yielding each piece with its offset.
fn split_top_level(text: &str, sep: char, offset: usize) -> Vec<(&str, usize)> {
    let mut pieces = Vec::new();
    let mut rest = text;
    let mut at = offset;
    while let Some(i) = find_top_level(rest, sep.encode_utf8(&mut [0; 4])) {
        pieces.push((&rest[..i], at));
        rest = &rest[i + sep.len_utf8()..];
        at += i + sep.len_utf8();
    }
    pieces.push((rest, at));
    pieces
}
