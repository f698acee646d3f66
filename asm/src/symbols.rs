use arch::reg::Reg;
use indexmap::IndexMap;

use crate::error::Error;

/// Labels are told apart by this many leading characters.
pub const SIGNIFICANT: usize = 5;

pub fn significant(name: &str) -> &str {
    match name.char_indices().nth(SIGNIFICANT) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub value: i64,
    pub redefinable: bool,
}

/// A binding whose expression referenced a label not known yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    pub expr: String,
    pub redefinable: bool,
}

/// Complete and incomplete bindings. A label lives in at most one of the two
/// maps and only ever moves from `incomplete` to `complete`.
///
/// A `set` over a complete label whose expression is not known yet stays
/// complete and waits in `rebinds` until the resolver settles it.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    complete: IndexMap<String, Symbol>,
    incomplete: IndexMap<String, Pending>,
    rebinds: IndexMap<String, Pending>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the register names `b`..`psw` as permanent bindings.
    pub fn with_registers() -> Self {
        let mut table = Self::new();
        for reg in Reg::all() {
            table.complete.insert(
                reg.to_string(),
                Symbol {
                    value: reg.code() as i64,
                    redefinable: false,
                },
            );
        }
        table
    }

    /// Bind `label` to a known value.
    pub fn define(&mut self, label: &str, value: i64, redefinable: bool) -> Result<(), Error> {
        let label = significant(label);

        if let Some(pending) = self.incomplete.get(label) {
            if !(pending.redefinable && redefinable) {
                return Err(Error::SymbolRedefinition(label.to_string()));
            }
            self.incomplete.shift_remove(label);
        }

        match self.complete.get_mut(label) {
            Some(sym) if sym.redefinable => {
                sym.value = value;
                sym.redefinable = redefinable;
                self.rebinds.shift_remove(label);
            }
            Some(_) => return Err(Error::SymbolRedefinition(label.to_string())),
            None => {
                self.complete
                    .insert(label.to_string(), Symbol { value, redefinable });
            }
        }
        Ok(())
    }

    /// Bind `label` to an expression that cannot be evaluated yet.
    pub fn defer(&mut self, label: &str, expr: &str, redefinable: bool) -> Result<(), Error> {
        let label = significant(label);

        match self.complete.get(label) {
            Some(sym) if sym.redefinable => {
                let pending = Pending {
                    expr: expr.to_string(),
                    redefinable,
                };
                self.rebinds.insert(label.to_string(), pending);
                return Ok(());
            }
            Some(_) => return Err(Error::SymbolRedefinition(label.to_string())),
            None => {}
        }

        match self.incomplete.get_mut(label) {
            Some(pending) if pending.redefinable && redefinable => {
                pending.expr = expr.to_string();
            }
            Some(_) => return Err(Error::SymbolRedefinition(label.to_string())),
            None => {
                self.incomplete.insert(
                    label.to_string(),
                    Pending {
                        expr: expr.to_string(),
                        redefinable,
                    },
                );
            }
        }
        Ok(())
    }

    /// Move an incomplete binding to the complete map with its value, or
    /// settle a waiting rebind.
    pub fn promote(&mut self, label: &str, value: i64) {
        let label = significant(label);
        let pending = self
            .incomplete
            .shift_remove(label)
            .or_else(|| self.rebinds.shift_remove(label));
        if let Some(pending) = pending {
            self.complete.insert(
                label.to_string(),
                Symbol {
                    value,
                    redefinable: pending.redefinable,
                },
            );
        }
    }

    pub fn get(&self, label: &str) -> Option<&Symbol> {
        self.complete.get(significant(label))
    }

    pub fn value(&self, label: &str) -> Option<i64> {
        self.get(label).map(|sym| sym.value)
    }

    /// Expression of an incomplete binding or of a waiting rebind. Either one
    /// takes precedence over the complete value when resolving.
    pub fn pending(&self, label: &str) -> Option<&str> {
        let label = significant(label);
        self.incomplete
            .get(label)
            .or_else(|| self.rebinds.get(label))
            .map(|p| p.expr.as_str())
    }

    pub fn pending_labels(&self) -> Vec<String> {
        self.incomplete
            .keys()
            .chain(self.rebinds.keys())
            .cloned()
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.incomplete.is_empty() && self.rebinds.is_empty()
    }

    /// Complete bindings in insertion order, registers first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.complete.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Complete bindings other than the register names.
    pub fn user_symbols(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.iter().filter(|(name, _)| Reg::from_name(name).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_are_predefined() {
        let table = SymbolTable::with_registers();
        assert_eq!(table.value("b"), Some(0));
        assert_eq!(table.value("a"), Some(7));
        assert_eq!(table.value("psw"), Some(9));
        assert_eq!(table.value("A"), None);
        assert!(table.user_symbols().next().is_none());
    }

    #[test]
    fn registers_cannot_be_redefined() {
        let mut table = SymbolTable::with_registers();
        assert!(matches!(
            table.define("sp", 1, false),
            Err(Error::SymbolRedefinition(_))
        ));
        assert!(matches!(
            table.define("m", 1, true),
            Err(Error::SymbolRedefinition(_))
        ));
    }

    #[test]
    fn redefinable_value_is_overwritten() {
        let mut table = SymbolTable::new();
        table.define("x", 1, true).unwrap();
        table.define("x", 2, true).unwrap();
        assert_eq!(table.value("x"), Some(2));

        table.define("y", 1, false).unwrap();
        assert!(matches!(
            table.define("y", 2, false),
            Err(Error::SymbolRedefinition(_))
        ));
        assert_eq!(table.value("y"), Some(1));
    }

    #[test]
    fn lookups_use_significant_characters() {
        let mut table = SymbolTable::new();
        table.define("counter", 3, false).unwrap();
        assert_eq!(table.value("count"), Some(3));
        assert_eq!(table.value("countdown"), Some(3));
        assert_eq!(significant("ab"), "ab");
    }

    #[test]
    fn promote_moves_between_sets() {
        let mut table = SymbolTable::new();
        table.defer("a", "b + 3", false).unwrap();
        assert_eq!(table.pending("a"), Some("b + 3"));
        assert_eq!(table.value("a"), None);

        table.promote("a", 5);
        assert_eq!(table.pending("a"), None);
        assert_eq!(table.value("a"), Some(5));
        assert!(table.is_complete());
    }

    #[test]
    fn defer_never_demotes() {
        let mut table = SymbolTable::new();
        table.define("x", 1, true).unwrap();
        table.defer("x", "later", true).unwrap();
        assert_eq!(table.value("x"), Some(1));
        assert_eq!(table.pending("x"), Some("later"));
        assert_eq!(table.pending_labels(), vec!["x".to_string()]);
        assert!(!table.is_complete());

        table.promote("x", 9);
        assert_eq!(table.value("x"), Some(9));
        assert!(table.get("x").unwrap().redefinable);
        assert!(table.is_complete());

        table.define("y", 1, false).unwrap();
        assert!(matches!(
            table.defer("y", "later", false),
            Err(Error::SymbolRedefinition(_))
        ));
    }

    #[test]
    fn pending_set_is_replaced() {
        let mut table = SymbolTable::new();
        table.defer("x", "p", true).unwrap();
        table.defer("x", "q", true).unwrap();
        assert_eq!(table.pending_labels(), vec!["x".to_string()]);
        assert_eq!(table.pending("x"), Some("q"));

        table.define("x", 4, true).unwrap();
        assert_eq!(table.pending("x"), None);
        assert_eq!(table.value("x"), Some(4));

        table.defer("e", "p", false).unwrap();
        assert!(matches!(
            table.define("e", 1, false),
            Err(Error::SymbolRedefinition(_))
        ));
    }

    #[test]
    fn later_set_drops_waiting_rebind() {
        let mut table = SymbolTable::new();
        table.define("x", 5, true).unwrap();
        table.defer("x", "y", true).unwrap();
        table.define("x", 7, true).unwrap();
        assert_eq!(table.pending("x"), None);
        assert_eq!(table.value("x"), Some(7));
        assert!(table.is_complete());
    }
}
