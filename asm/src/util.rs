use color_print::cformat;
use indexmap::IndexMap;

use crate::{encoder::Listing, parser::lex, source::SourceLine, symbols::SymbolTable};

const RULE: &str = "-------------------+-----------------------------------------------------";

fn hex_bytes(bytes: &[u8]) -> String {
    let mut hex: Vec<String> = bytes.iter().take(4).map(|b| format!("{:02X}", b)).collect();
    if bytes.len() > 4 {
        hex[3] = "..".to_string();
    }
    hex.join(" ")
}

/// Print every source line next to its address and emitted bytes, followed
/// by the user symbols. Instruction lines show the decoded instruction.
pub fn print_dump(path: &str, lines: &[SourceLine], listing: &[Listing], symbols: &SymbolTable) {
    let rows: IndexMap<usize, &Listing> = listing.iter().map(|row| (row.line, row)).collect();

    println!(
        "{}+------[{}]{}",
        "-".repeat(19),
        path,
        "-".repeat(45usize.saturating_sub(path.len()))
    );

    for line in lines {
        let text = if line.text.ends_with(':') {
            cformat!("<g>{}</>", line.text)
        } else {
            line.text.clone()
        };
        let body = match rows.get(&line.line) {
            Some(Listing {
                address,
                bytes,
                inst: Some(inst),
                ..
            }) => {
                let label = lex(line)
                    .label
                    .map(|l| cformat!("<g>{}</> ", l))
                    .unwrap_or_default();
                format!(
                    "[{:04X}] {:<12}| {:>4}:   {}{}",
                    address,
                    hex_bytes(bytes),
                    line.line,
                    label,
                    inst.cformat()
                )
            }
            Some(row) => format!(
                "[{:04X}] {:<12}| {:>4}: {}",
                row.address,
                hex_bytes(&row.bytes),
                line.line,
                text
            ),
            None => cformat!("{:19}| {:>4}: <dim>{}</>", "", line.line, text),
        };
        println!("{}", body);
    }
    println!("{}", RULE);

    for (name, sym) in symbols.user_symbols() {
        let value = sym.value as u16;
        let row = if sym.redefinable {
            cformat!("<y>{:<5}</> = {:04X}h (set)", name, value)
        } else {
            cformat!("<c>{:<5}</> = {:04X}h", name, value)
        };
        println!("{:19}| {}", "", row);
    }
    for label in symbols.pending_labels() {
        println!("{:19}| {}", "", cformat!("<r,s>{:<5} = ????</>", label));
    }
    println!("{}", RULE);
}
