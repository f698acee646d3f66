use indexmap::IndexSet;
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

use crate::symbols::{significant, SymbolTable};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    #[error("invalid character literal `{0}`")]
    InvalidChar(String),

    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),

    #[error("unbalanced parentheses")]
    UnbalancedParens,

    #[error("malformed expression")]
    Malformed,

    #[error("division by zero")]
    DivisionByZero,

    #[error("undefined label `{0}`")]
    Undefined(String),

    #[error("circular definition of `{0}`")]
    Circular(String),

    #[error("`$` is only defined inside instruction and data operands")]
    NoLocation,
}

// ----------------------------------------------------------------------------
// Token

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    Add,
    Sub,
    Not,
    And,
    Or,
    Xor,
    Neg,
    Pos,
    LParen,
    RParen,
}

impl Op {
    fn word(s: &str) -> Option<Op> {
        match s.to_ascii_uppercase().as_str() {
            "MOD" => Some(Op::Mod),
            "SHL" => Some(Op::Shl),
            "SHR" => Some(Op::Shr),
            "NOT" => Some(Op::Not),
            "AND" => Some(Op::And),
            "OR" => Some(Op::Or),
            "XOR" => Some(Op::Xor),
            _ => None,
        }
    }

    fn symbol(c: char) -> Option<Op> {
        match c {
            '*' => Some(Op::Mul),
            '/' => Some(Op::Div),
            '+' => Some(Op::Add),
            '-' => Some(Op::Sub),
            '(' => Some(Op::LParen),
            ')' => Some(Op::RParen),
            _ => None,
        }
    }

    fn precedence(self) -> u8 {
        match self {
            Op::Neg | Op::Pos => 6,
            Op::Mul | Op::Div | Op::Mod | Op::Shl | Op::Shr => 5,
            Op::Add | Op::Sub => 4,
            Op::Not => 3,
            Op::And => 2,
            Op::Or | Op::Xor => 1,
            Op::LParen | Op::RParen => 0,
        }
    }

    fn is_unary(self) -> bool {
        matches!(self, Op::Not | Op::Neg | Op::Pos)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    Label,
    Operator(Op),
    /// `$`, the address of the record being encoded.
    Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub value: Option<i64>,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
            value: None,
        }
    }

    fn number(text: impl Into<String>, value: i64) -> Self {
        Token {
            kind: TokenKind::Number,
            text: text.into(),
            value: Some(value),
        }
    }
}

// ----------------------------------------------------------------------------
// Tokenizer

struct Lexer<'a> {
    src: &'a str,
    iter: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer {
            src,
            iter: src.char_indices().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.iter.peek().map(|&(_, c)| c)
    }

    fn consume(&mut self) -> Option<(usize, char)> {
        self.iter.next()
    }

    /// Consume while `pred` holds and return the span starting at `start`.
    fn take_while(&mut self, start: usize, pred: impl Fn(char) -> bool) -> &'a str {
        let mut end = self.src.len();
        while let Some(&(idx, c)) = self.iter.peek() {
            if !pred(c) {
                end = idx;
                break;
            }
            self.iter.next();
        }
        &self.src[start..end]
    }

    fn parse(mut self) -> Result<Vec<Token>, EvalError> {
        let mut tokens = vec![];
        while let Some(c) = self.peek() {
            // 0. Skip whitespaces
            if c.is_whitespace() {
                self.consume();
                continue;
            }

            let Some((start, _)) = self.consume() else {
                break;
            };

            // 1. Number literal
            if c.is_ascii_digit() {
                let text = self.take_while(start, |c| c.is_ascii_alphanumeric());
                tokens.push(Token::number(text, parse_number(text)?));
                continue;
            }

            // 2. Word operator or label
            if c.is_ascii_alphabetic() || c == '@' || c == '?' {
                let text = self.take_while(start, |c| {
                    c.is_ascii_alphanumeric() || matches!(c, '@' | '?' | '_')
                });
                let kind = match Op::word(text) {
                    Some(op) => TokenKind::Operator(op),
                    None => TokenKind::Label,
                };
                tokens.push(Token::new(kind, text));
                continue;
            }

            // 3. Character literal
            if c == '\'' {
                let literal = self.take_while(start + 1, |c| c != '\'');
                let text = format!("'{literal}'");
                if self.consume().is_none() {
                    return Err(EvalError::InvalidChar(text));
                }
                let mut chars = literal.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) if ch.is_ascii() => {
                        tokens.push(Token::number(text, ch as i64))
                    }
                    _ => return Err(EvalError::InvalidChar(text)),
                }
                continue;
            }

            // 4. Location counter
            if c == '$' {
                tokens.push(Token::new(TokenKind::Location, "$"));
                continue;
            }

            // 5. Single character operator
            match Op::symbol(c) {
                Some(op) => tokens.push(Token::new(TokenKind::Operator(op), c.to_string())),
                None => return Err(EvalError::UnexpectedChar(c)),
            }
        }
        Ok(tokens)
    }
}

/// `0FFh` is hex, `255` and `255d` are decimal.
fn parse_number(text: &str) -> Result<i64, EvalError> {
    let lower = text.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_suffix('h') {
        u32::from_str_radix(hex, 16)
    } else if let Some(dec) = lower.strip_suffix('d') {
        dec.parse::<u32>()
    } else {
        lower.parse::<u32>()
    };
    parsed
        .map(i64::from)
        .map_err(|_| EvalError::InvalidNumber(text.to_string()))
}

pub fn tokenize(expr: &str) -> Result<Vec<Token>, EvalError> {
    Lexer::new(expr).parse()
}

// ----------------------------------------------------------------------------
// Shunting-yard

/// Reorder infix tokens into postfix. A `+`, `-` or `NOT` where an operand is
/// expected is a prefix operator and is pushed without popping.
pub fn to_postfix(tokens: Vec<Token>) -> Result<Vec<Token>, EvalError> {
    let mut output = vec![];
    let mut stack: Vec<Token> = vec![];
    let mut prefix = true;

    for mut token in tokens {
        let op = match token.kind {
            TokenKind::Number | TokenKind::Label | TokenKind::Location => {
                if !prefix {
                    return Err(EvalError::Malformed);
                }
                output.push(token);
                prefix = false;
                continue;
            }
            TokenKind::Operator(op) => op,
        };

        match op {
            Op::LParen => {
                stack.push(token);
                prefix = true;
            }
            Op::RParen => {
                loop {
                    match stack.pop() {
                        Some(top) if top.kind == TokenKind::Operator(Op::LParen) => break,
                        Some(top) => output.push(top),
                        None => return Err(EvalError::UnbalancedParens),
                    }
                }
                prefix = false;
            }
            _ if prefix => {
                let unary = match op {
                    Op::Add => Op::Pos,
                    Op::Sub => Op::Neg,
                    Op::Not => Op::Not,
                    _ => return Err(EvalError::Malformed),
                };
                token.kind = TokenKind::Operator(unary);
                stack.push(token);
            }
            Op::Not => return Err(EvalError::Malformed),
            _ => {
                // Binary operators are left associative.
                while let Some(TokenKind::Operator(top)) = stack.last().map(|t| &t.kind) {
                    let top = *top;
                    if top == Op::LParen || top.precedence() < op.precedence() {
                        break;
                    }
                    if let Some(t) = stack.pop() {
                        output.push(t);
                    }
                }
                stack.push(token);
                prefix = true;
            }
        }
    }

    if prefix || output.is_empty() {
        return Err(EvalError::Malformed);
    }
    while let Some(top) = stack.pop() {
        if top.kind == TokenKind::Operator(Op::LParen) {
            return Err(EvalError::UnbalancedParens);
        }
        output.push(top);
    }
    Ok(output)
}

// Two's complement 32-bit arithmetic.
fn apply(op: Op, a: i32, b: i32) -> Result<i32, EvalError> {
    let shift = |a: i32, b: i32, left: bool| {
        if !(0..32).contains(&b) {
            0
        } else if left {
            ((a as u32) << b) as i32
        } else {
            ((a as u32) >> b) as i32
        }
    };
    Ok(match op {
        Op::Mul => a.wrapping_mul(b),
        Op::Div if b == 0 => return Err(EvalError::DivisionByZero),
        Op::Div => a.wrapping_div(b),
        Op::Mod if b == 0 => return Err(EvalError::DivisionByZero),
        Op::Mod => a.wrapping_rem(b),
        Op::Shl => shift(a, b, true),
        Op::Shr => shift(a, b, false),
        Op::Add => a.wrapping_add(b),
        Op::Sub => a.wrapping_sub(b),
        Op::And => a & b,
        Op::Or => a | b,
        Op::Xor => a ^ b,
        _ => return Err(EvalError::Malformed),
    })
}

// ----------------------------------------------------------------------------
// Evaluator

/// Evaluates expressions against a symbol table, resolving incomplete
/// bindings on demand and promoting them once they evaluate.
pub struct Evaluator<'a> {
    symbols: &'a mut SymbolTable,
    in_progress: IndexSet<String>,
    location: Option<u16>,
}

impl<'a> Evaluator<'a> {
    pub fn new(symbols: &'a mut SymbolTable) -> Self {
        Evaluator {
            symbols,
            in_progress: IndexSet::new(),
            location: None,
        }
    }

    /// Give `$` a value for the expressions evaluated from here on.
    pub fn at(mut self, location: u16) -> Self {
        self.location = Some(location);
        self
    }

    pub fn evaluate(&mut self, expr: &str) -> Result<i64, EvalError> {
        let tokens = tokenize(expr)?;
        if let [Token {
            kind: TokenKind::Number,
            value: Some(value),
            ..
        }] = tokens.as_slice()
        {
            return Ok(*value);
        }

        let postfix = to_postfix(tokens)?;
        let mut stack: Vec<i32> = Vec::with_capacity(postfix.len());
        for token in postfix {
            match token.kind {
                TokenKind::Number => stack.push(token.value.unwrap_or_default() as i32),
                TokenKind::Label => stack.push(self.resolve_label(&token.text)? as i32),
                TokenKind::Location => {
                    stack.push(self.location.ok_or(EvalError::NoLocation)? as i32)
                }
                TokenKind::Operator(op) if op.is_unary() => {
                    let a = stack.pop().ok_or(EvalError::Malformed)?;
                    stack.push(match op {
                        Op::Not => !a,
                        Op::Neg => a.wrapping_neg(),
                        _ => a,
                    });
                }
                TokenKind::Operator(op) => {
                    let b = stack.pop().ok_or(EvalError::Malformed)?;
                    let a = stack.pop().ok_or(EvalError::Malformed)?;
                    stack.push(apply(op, a, b)?);
                }
            }
        }

        match stack.as_slice() {
            [value] => Ok(*value as i64),
            _ => Err(EvalError::Malformed),
        }
    }

    /// Value of `name`, evaluating and promoting its pending expression when
    /// it is still incomplete.
    pub fn resolve_label(&mut self, name: &str) -> Result<i64, EvalError> {
        let label = significant(name).to_string();
        if self.in_progress.contains(&label) {
            return Err(EvalError::Circular(label));
        }
        let Some(expr) = self.symbols.pending(&label).map(str::to_string) else {
            return self
                .symbols
                .value(&label)
                .ok_or(EvalError::Undefined(label));
        };

        tracing::trace!("resolving `{label}` = {expr}");
        self.in_progress.insert(label.clone());
        let location = self.location.take();
        let result = self.evaluate(&expr);
        self.location = location;
        self.in_progress.pop();

        if let Ok(value) = result {
            self.symbols.promote(&label, value);
        }
        result
    }
}

/// Evaluate `expr` with a fresh resolution state.
pub fn evaluate(expr: &str, symbols: &mut SymbolTable) -> Result<i64, EvalError> {
    Evaluator::new(symbols).evaluate(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str) -> Result<i64, EvalError> {
        evaluate(expr, &mut SymbolTable::new())
    }

    macro_rules! test_eval {
        ($($name:ident: $expr:expr => $expected:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(eval($expr), $expected);
                }
            )*
        }
    }

    test_eval! {
        test_decimal: "42" => Ok(42),
        test_decimal_suffix: "42d" => Ok(42),
        test_hex: "0FFh" => Ok(255),
        test_hex_upper: "1AH" => Ok(26),
        test_char: "'A'" => Ok(65),
        test_mul_before_add: "2 + 3 * 4" => Ok(14),
        test_left_assoc_sub: "10 - 3 - 2" => Ok(5),
        test_left_assoc_div: "100 / 10 / 5" => Ok(2),
        test_parens: "(2 + 3) * 4" => Ok(20),
        test_mod: "17 MOD 5" => Ok(2),
        test_shl: "1 SHL 4" => Ok(16),
        test_shr: "80h shr 4" => Ok(8),
        test_shift_out: "1 SHL 32" => Ok(0),
        test_and_or: "0Fh AND 3 OR 8" => Ok(11),
        test_or_xor_same_level: "1 OR 2 XOR 3" => Ok(0),
        test_and_binds_tighter: "1 OR 6 AND 3" => Ok(3),
        test_not: "NOT 0" => Ok(-1),
        test_not_below_add: "NOT 1 + 1" => Ok(-3),
        test_not_above_and: "NOT 0 AND 0Fh" => Ok(15),
        test_neg: "-5 + 2" => Ok(-3),
        test_neg_binds_tight: "-2 * 3" => Ok(-6),
        test_double_neg: "- -4" => Ok(4),
        test_pos: "+7" => Ok(7),
        test_truncating_div: "-7 / 2" => Ok(-3),
        test_wrapping: "7FFFFFFFh + 1" => Ok(i32::MIN as i64),
        test_div_zero: "1 / 0" => Err(EvalError::DivisionByZero),
        test_mod_zero: "1 MOD 0" => Err(EvalError::DivisionByZero),
        test_binary_rejected: "101b" => Err(EvalError::InvalidNumber("101b".into())),
        test_octal_rejected: "17o" => Err(EvalError::InvalidNumber("17o".into())),
        test_bad_hex: "1G" => Err(EvalError::InvalidNumber("1G".into())),
        test_too_large: "100000000h" => Err(EvalError::InvalidNumber("100000000h".into())),
        test_trailing_op: "1 +" => Err(EvalError::Malformed),
        test_two_values: "1 2" => Err(EvalError::Malformed),
        test_empty: "" => Err(EvalError::Malformed),
        test_open_paren: "(1 + 2" => Err(EvalError::UnbalancedParens),
        test_close_paren: "1 + 2)" => Err(EvalError::UnbalancedParens),
        test_infix_not: "1 NOT 2" => Err(EvalError::Malformed),
        test_unknown_char: "1 # 2" => Err(EvalError::UnexpectedChar('#')),
        test_unclosed_char: "'A" => Err(EvalError::InvalidChar("'A'".into())),
        test_non_ascii_char: "'é'" => Err(EvalError::InvalidChar("'é'".into())),
        test_undefined: "x + 1" => Err(EvalError::Undefined("x".into())),
        test_location_outside_encoder: "$" => Err(EvalError::NoLocation),
    }

    #[test]
    fn tokens_carry_kind_and_value() {
        let tokens = tokenize("lab1 + 0Ah mod ?x").unwrap();
        let kinds: Vec<&TokenKind> = tokens.iter().map(|t| &t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &TokenKind::Label,
                &TokenKind::Operator(Op::Add),
                &TokenKind::Number,
                &TokenKind::Operator(Op::Mod),
                &TokenKind::Label,
            ]
        );
        assert_eq!(tokens[2].value, Some(10));
        assert_eq!(tokens[4].text, "?x");
    }

    #[test]
    fn postfix_order() {
        let postfix = to_postfix(tokenize("1 + 2 * (3 - 4)").unwrap()).unwrap();
        let texts: Vec<&str> = postfix.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "2", "3", "4", "-", "*", "+"]);
    }

    #[test]
    fn labels_resolve_through_table() {
        let mut table = SymbolTable::new();
        table.define("base", 0x100, false).unwrap();
        table.defer("top", "base + size", false).unwrap();
        table.defer("size", "20h", false).unwrap();

        assert_eq!(evaluate("top - base", &mut table), Ok(0x20));
        assert_eq!(table.value("top"), Some(0x120));
        assert_eq!(table.value("size"), Some(0x20));
        assert!(table.is_complete());
    }

    #[test]
    fn cycle_is_detected() {
        let mut table = SymbolTable::new();
        table.defer("a", "b", false).unwrap();
        table.defer("b", "a + 1", false).unwrap();

        let mut evaluator = Evaluator::new(&mut table);
        assert_eq!(evaluator.evaluate("a"), Err(EvalError::Circular("a".into())));
        assert!(evaluator.in_progress.is_empty());
        assert_eq!(evaluator.evaluate("b"), Err(EvalError::Circular("b".into())));
        assert_eq!(table.pending_labels(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn waiting_rebind_shadows_old_value() {
        let mut table = SymbolTable::new();
        table.define("x", 5, true).unwrap();
        table.defer("x", "y * 2", true).unwrap();
        assert_eq!(
            evaluate("x", &mut table),
            Err(EvalError::Undefined("y".into()))
        );

        table.define("y", 3, false).unwrap();
        assert_eq!(evaluate("x + 1", &mut table), Ok(7));
        assert_eq!(table.value("x"), Some(6));
        assert!(table.is_complete());
    }

    #[test]
    fn location_counter() {
        let mut table = SymbolTable::new();
        table.defer("here", "$", false).unwrap();

        let mut evaluator = Evaluator::new(&mut table).at(0x40);
        assert_eq!(evaluator.evaluate("$ + 2"), Ok(0x42));
        assert_eq!(evaluator.evaluate("here"), Err(EvalError::NoLocation));
        assert_eq!(evaluator.evaluate("$"), Ok(0x40));
    }
}
