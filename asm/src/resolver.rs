use arch::reg::Reg;

use crate::{
    expr::{evaluate, EvalError, Evaluator},
    parser::SourceRecord,
    symbols::SymbolTable,
};

/// What the resolution sweep left open.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Bindings still incomplete, with the reason of their last failure.
    pub unresolved: Vec<(String, EvalError)>,
    /// Operands left for the encoder to evaluate.
    pub deferred_operands: usize,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Sweep the incomplete bindings once, then evaluate every operand of every
/// instruction and directive. Failures are recorded, not raised: the encoder
/// decides whether a missing value is fatal.
pub fn resolve(table: &mut SymbolTable, records: &mut [SourceRecord]) -> Resolution {
    let mut resolution = Resolution::default();

    for label in table.pending_labels() {
        // Promoted already while resolving an earlier label.
        if table.pending(&label).is_none() {
            continue;
        }
        let result = Evaluator::new(table).resolve_label(&label);
        match result {
            Ok(value) => tracing::trace!("`{label}` = {value}"),
            Err(err) => {
                tracing::debug!("`{label}` unresolved: {err}");
                resolution.unresolved.push((label, err));
            }
        }
    }

    for record in records
        .iter_mut()
        .filter(|r| r.mnemonic.is_some() && !r.is_binding())
    {
        // Register fields are read by name in the encoder.
        for operand in record
            .operands
            .iter_mut()
            .filter(|o| Reg::parse(&o.text).is_none())
        {
            match evaluate(&operand.text, table) {
                Ok(value) => operand.value = Some(value),
                Err(err) => {
                    tracing::trace!("line {}: `{}` deferred: {err}", record.line, operand.text);
                    resolution.deferred_operands += 1;
                }
            }
        }
    }

    resolution
}
