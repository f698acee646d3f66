use arch::op::Pseudo;

use crate::{error::Error, expr::evaluate, parser::SourceRecord, symbols::SymbolTable};

/// Pass 1: bind every label in source order.
///
/// A label on a line of its own names the following record (`i + 1`), an
/// inline label names its own record (`i`). `equ`/`set` bindings are
/// evaluated right away and deferred when they reference something unknown.
pub fn build(records: &[SourceRecord]) -> Result<SymbolTable, Error> {
    let mut table = SymbolTable::with_registers();
    for (i, record) in records.iter().enumerate() {
        bind(&mut table, i, record).map_err(|e| e.at(record.line))?;
    }
    Ok(table)
}

fn bind(table: &mut SymbolTable, i: usize, record: &SourceRecord) -> Result<(), Error> {
    let Some(label) = &record.label else {
        return Ok(());
    };

    match record.pseudo() {
        Some(pseudo @ (Pseudo::Equ | Pseudo::Set)) => {
            let redefinable = pseudo == Pseudo::Set;
            let expr = record
                .operands
                .first()
                .map(|o| o.text.as_str())
                .ok_or_else(|| Error::MissingToken(format!("expression of `{pseudo}`")))?;
            match evaluate(expr, table) {
                Ok(value) => {
                    tracing::trace!("`{label}` = {value}");
                    table.define(label, value, redefinable)
                }
                Err(err) => {
                    tracing::debug!("`{label}` deferred: {err}");
                    table.defer(label, expr, redefinable)
                }
            }
        }
        _ if record.mnemonic.is_none() => table.define(label, i as i64 + 1, false),
        _ => table.define(label, i as i64, false),
    }
}
