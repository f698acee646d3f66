use arch::op::{Mnemonic, Pseudo};

use crate::source::SourceLine;

// ----------------------------------------------------------------------------
// Raw record

/// A source line split into label, mnemonic and operand fields. Nothing is
/// validated yet; see [`crate::syntax::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub line: usize,
    pub label: Option<String>,
    pub mnemonic: Option<String>,
    pub operands: Option<Vec<String>>,
}

/// Split one preprocessed line.
///
/// The first word is a label when it contains `:` (`loop:` or `loop:mov`).
/// Otherwise it is an `equ`/`set` label when the second word is one of those,
/// and the mnemonic in every other case.
pub fn lex(src: &SourceLine) -> RawRecord {
    let text = src.text.trim();
    let (first, rest) = split_word(text);

    let (label, body) = if let Some(colon) = first.find(':') {
        (Some(&text[..=colon]), text[colon + 1..].trim())
    } else {
        let (second, _) = split_word(rest);
        if second.eq_ignore_ascii_case("equ") || second.eq_ignore_ascii_case("set") {
            (Some(first), rest)
        } else {
            (None, text)
        }
    };

    if body.is_empty() {
        return RawRecord {
            line: src.line,
            label: label.map(str::to_string),
            mnemonic: None,
            operands: None,
        };
    }

    let (mnemonic, operands) = split_word(body);
    RawRecord {
        line: src.line,
        label: label.map(str::to_string),
        mnemonic: Some(mnemonic.to_string()),
        operands: Some(split_operands(operands)),
    }
}

fn split_word(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(idx) => (&s[..idx], s[idx..].trim_start()),
        None => (s, ""),
    }
}

/// Comma separated, trimmed. Commas inside `'...'` do not split.
pub fn split_operands(s: &str) -> Vec<String> {
    if s.trim().is_empty() {
        return vec![];
    }
    let mut operands = vec![];
    let mut quoted = false;
    let mut start = 0;
    for (idx, ch) in s.char_indices() {
        match ch {
            '\'' => quoted = !quoted,
            ',' if !quoted => {
                operands.push(s[start..idx].trim().to_string());
                start = idx + 1;
            }
            _ => {}
        }
    }
    operands.push(s[start..].trim().to_string());
    operands
}

// ----------------------------------------------------------------------------
// Checked record

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub text: String,
    /// Filled in by the resolver once the expression evaluates.
    pub value: Option<i64>,
}

impl Operand {
    pub fn new(text: impl Into<String>) -> Self {
        Operand {
            text: text.into(),
            value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub line: usize,
    pub label: Option<String>,
    pub mnemonic: Option<Mnemonic>,
    pub operands: Vec<Operand>,
}

impl SourceRecord {
    /// `equ` or `set`.
    pub fn is_binding(&self) -> bool {
        self.mnemonic.is_some_and(Mnemonic::is_binding)
    }

    pub fn pseudo(&self) -> Option<Pseudo> {
        match self.mnemonic {
            Some(Mnemonic::Pseudo(p)) => Some(p),
            _ => None,
        }
    }
}
