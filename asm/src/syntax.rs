use arch::op::{is_reserved, Directive, Mnemonic, Pseudo};

use crate::{
    error::Error,
    parser::{Operand, RawRecord, SourceRecord},
    symbols::significant,
};

/// Validate a lexed record and normalize it for the later passes.
pub fn check(raw: RawRecord) -> Result<SourceRecord, Error> {
    let line = raw.line;
    check_record(raw).map_err(|e| e.at(line))
}

fn check_record(raw: RawRecord) -> Result<SourceRecord, Error> {
    let mnemonic = match &raw.mnemonic {
        Some(text) => Some(Mnemonic::parse(text).ok_or_else(|| {
            Error::InvalidToken(format!(
                "`{text}` is not an instruction, pseudo-instruction or directive"
            ))
        })?),
        None => None,
    };
    let binding = mnemonic.is_some_and(Mnemonic::is_binding);

    let label = match (&raw.label, mnemonic) {
        (Some(label), _) => Some(check_label(label, binding)?),
        (None, Some(m)) if binding => {
            return Err(Error::MissingToken(format!("`{m}` requires a label")))
        }
        (None, _) => None,
    };

    let operands = match (mnemonic, raw.operands) {
        (None, _) => vec![],
        (Some(m), None) => {
            return Err(Error::MissingToken(format!("operand list of `{m}`")));
        }
        (Some(m), Some(operands)) => {
            check_arity(m, &operands)?;
            operands.into_iter().map(Operand::new).collect()
        }
    };

    Ok(SourceRecord {
        line: raw.line,
        label,
        mnemonic,
        operands,
    })
}

/// Check the label's shape and cut it to its significant characters.
fn check_label(raw: &str, binding: bool) -> Result<String, Error> {
    let name = if binding {
        if raw.ends_with(':') {
            return Err(Error::InvalidToken(format!(
                "label `{raw}` of equ/set must not end with a colon"
            )));
        }
        raw
    } else {
        raw.strip_suffix(':').ok_or_else(|| {
            Error::InvalidToken(format!("label `{raw}` must end with a colon"))
        })?
    };

    match name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '@' || c == '?' => {}
        _ => {
            return Err(Error::InvalidToken(format!(
                "label `{name}` must start with a letter, `@` or `?`"
            )))
        }
    }
    if let Some(c) = name
        .chars()
        .find(|&c| !(c.is_ascii_alphanumeric() || matches!(c, '@' | '?' | '_')))
    {
        return Err(Error::InvalidToken(format!(
            "label `{name}` contains disallowed character `{c}`"
        )));
    }

    let name = significant(name);
    if is_reserved(name) {
        return Err(Error::InvalidToken(format!(
            "label `{name}` is a reserved word"
        )));
    }
    Ok(name.to_string())
}

fn check_arity(mnemonic: Mnemonic, operands: &[String]) -> Result<(), Error> {
    let (min, max) = match mnemonic {
        Mnemonic::Instr(inst) => (inst.arity(), Some(inst.arity())),
        Mnemonic::Pseudo(Pseudo::End) => (0, Some(1)),
        Mnemonic::Pseudo(_) => (1, Some(1)),
        Mnemonic::Directive(Directive::Ds) => (1, Some(1)),
        Mnemonic::Directive(_) => (1, None),
    };

    if operands.len() < min {
        return Err(Error::MissingToken(format!(
            "`{mnemonic}` takes {min} operand(s), found {}",
            operands.len()
        )));
    }
    if let Some(max) = max.filter(|&max| operands.len() > max) {
        return Err(Error::InvalidOperand(
            operands.join(","),
            format!("`{mnemonic}` takes {max} operand(s)"),
        ));
    }
    if operands.iter().any(String::is_empty) {
        return Err(Error::MissingToken(format!("empty operand of `{mnemonic}`")));
    }
    Ok(())
}
