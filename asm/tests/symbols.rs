use asm80::{assemble_str, config::Config, error::Error};

fn case(src: &str) -> Result<asm80::Assembly, Error> {
    assemble_str(src, &Config::default())
}

#[test]
fn equ_twice_is_fatal() {
    let err = case("x equ 1\nx equ 2\nhlt\n").unwrap_err();
    assert!(matches!(err.kind(), Error::SymbolRedefinition(l) if l == "x"));
    assert_eq!(err.line(), Some(2));
}

#[test]
fn set_twice_keeps_latest() {
    let asm = case("x set 1\nx set 2\nmvi a, x\n").unwrap();
    assert_eq!(asm.symbols.value("x"), Some(2));
    assert_eq!(asm.image.program(), &[0x3E, 0x02]);
}

#[test]
fn set_waits_for_forward_reference() {
    let asm = case("x set 5\nx set y\ny equ 1\nmvi a, x\n").unwrap();
    assert_eq!(asm.symbols.value("x"), Some(1));
    assert!(asm.resolution.is_complete());
    assert_eq!(asm.image.program(), &[0x3E, 0x01]);

    let asm = case("x set 5\nx set y\nx set 7\ny equ 1\nmvi a, x\n").unwrap();
    assert_eq!(asm.image.program(), &[0x3E, 0x07]);

    let asm = case("x set 5\nx set y\nz equ x + 1\ny equ 1\n").unwrap();
    assert_eq!(asm.symbols.value("z"), Some(2));
}

#[test]
fn equ_cannot_rebind_set_forward() {
    let err = case("x equ 5\nx set y\ny equ 1\n").unwrap_err();
    assert!(matches!(err.kind(), Error::SymbolRedefinition(l) if l == "x"));
    assert_eq!(err.line(), Some(2));
}

#[test]
fn uppercase_register_names_are_symbols_in_data() {
    let asm = case("B equ 2\nmvi c, B\nmvi d, B+0\nmov a, B\n").unwrap();
    assert_eq!(asm.image.program(), &[0x0E, 0x02, 0x16, 0x02, 0x78]);
}

#[test]
fn backward_reference() {
    let asm = case("B equ 2\nA equ B + 3\n").unwrap();
    assert_eq!(asm.symbols.value("A"), Some(5));
    assert!(asm.resolution.is_complete());
}

#[test]
fn forward_reference_is_promoted() {
    let asm = case("A equ B + 3\nB equ 2\n").unwrap();
    assert_eq!(asm.symbols.value("A"), Some(5));
    assert_eq!(asm.symbols.pending("A"), None);
    assert!(asm.resolution.is_complete());
}

#[test]
fn cycle_never_resolves() {
    let asm = case("A equ B\nB equ A\nhlt\n").unwrap();
    assert_eq!(asm.symbols.value("A"), None);
    assert_eq!(asm.symbols.value("B"), None);
    let unresolved: Vec<&str> = asm
        .resolution
        .unresolved
        .iter()
        .map(|(label, _)| label.as_str())
        .collect();
    assert_eq!(unresolved, vec!["A", "B"]);

    let err = case("A equ B\nB equ A\nmvi a, A\n").unwrap_err();
    assert!(matches!(err.kind(), Error::UnresolvedSymbol(..)));
    assert_eq!(err.line(), Some(3));
}

#[test]
fn registers_are_not_labels() {
    let err = case("a: nop\n").unwrap_err();
    assert!(matches!(err.kind(), Error::InvalidToken(_)));
    let err = case("hlt equ 1\n").unwrap_err();
    assert!(matches!(err.kind(), Error::InvalidToken(_)));
}
