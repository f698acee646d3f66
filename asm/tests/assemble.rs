use arch::image::{Image, HEADER_SIZE, MAGIC};
use asm80::{
    assemble_str,
    config::Config,
    error::{Error, Warning},
    load_image,
};

const PROGRAM: &str = "\
; add two registers
    mvi a,1
    mvi b,11
    mvi c,5
    mvi d,2
    mvi h,0
    add b
    hlt
";

#[test]
fn end_to_end_bytes_and_header() {
    let asm = assemble_str(PROGRAM, &Config::default()).unwrap();
    assert_eq!(
        asm.image.program(),
        &[0x3E, 0x01, 0x06, 0x0B, 0x0E, 0x05, 0x16, 0x02, 0x26, 0x00, 0x80, 0x76]
    );
    assert!(asm.warnings.is_empty());

    let bytes = asm.image.to_bytes();
    assert_eq!(&bytes[..8], &MAGIC);
    assert_eq!(&bytes[..4], &[0xAE, b'A', b'E', b'F']);
    assert_eq!(&bytes[8..10], &[0x00, 0x00]);
    assert_eq!(&bytes[10..12], &[12, 0]);
    assert_eq!(bytes.len(), HEADER_SIZE + 12);
}

#[test]
fn image_file_loads_back() {
    let asm = assemble_str(PROGRAM, &Config::default().with_entry(2)).unwrap();
    let path = std::env::temp_dir().join(format!("asm80-{}.out", std::process::id()));
    let path = path.to_string_lossy().to_string();
    std::fs::write(&path, asm.image.to_bytes()).unwrap();

    let image = load_image(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(image.entry(), 2);
    assert_eq!(image.program(), asm.image.program());
}

#[test]
fn bad_image_is_rejected() {
    let mut bytes = Image::new().to_bytes();
    bytes[0] = 0;
    let path = std::env::temp_dir().join(format!("asm80-bad-{}.out", std::process::id()));
    let path = path.to_string_lossy().to_string();
    std::fs::write(&path, &bytes).unwrap();

    let err = load_image(&path).unwrap_err();
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(err, Error::Image(_)));
}

#[test]
fn soft_limit_is_a_warning() {
    let config = Config::default().with_soft_limit(8);
    let src = "ds 6\nlxi h, 1234h\nhlt\n";
    let asm = assemble_str(src, &config).unwrap();
    assert_eq!(asm.warnings, vec![Warning::SoftLimitExceeded { limit: 8 }]);
    assert_eq!(asm.bytes_written, 10);
    assert_eq!(
        asm.image.program(),
        &[0, 0, 0, 0, 0, 0, 0x21, 0x34, 0x12, 0x76]
    );
}

#[test]
fn default_soft_limit() {
    let src = "ds 30 * 1024\nnop\n";
    let asm = assemble_str(src, &Config::default()).unwrap();
    assert_eq!(
        asm.warnings,
        vec![Warning::SoftLimitExceeded { limit: 30 * 1024 }]
    );
    assert_eq!(asm.image.size() as usize, 30 * 1024 + 1);
}

#[test]
fn ds_advances_cursor() {
    let asm = assemble_str("ds 4\ndb 0AAh\ndw 0BBCCh\n", &Config::default()).unwrap();
    assert_eq!(asm.bytes_written, 7);
    assert_eq!(asm.image.program(), &[0, 0, 0, 0, 0xAA, 0xCC, 0xBB]);
    let addresses: Vec<u16> = asm.listing.iter().map(|row| row.address).collect();
    assert_eq!(addresses, vec![0, 4, 5]);
}

#[test]
fn full_program() {
    let src = "\
count   equ 3
        lxi sp, 0FF00h
        mvi b, count
loop:   dcr b           ; count down
        jnz loop
        push psw
        call subr
        pop psw
        hlt
subr:   xra a
        ret
        end
";
    let asm = assemble_str(src, &Config::default()).unwrap();
    assert_eq!(asm.symbols.value("count"), Some(3));
    assert_eq!(asm.symbols.value("loop"), Some(3));
    assert_eq!(asm.symbols.value("subr"), Some(9));
    assert_eq!(
        asm.image.program(),
        &[
            0x31, 0x00, 0xFF, // lxi sp
            0x06, 0x03, // mvi b
            0x05, // dcr b
            0xC2, 0x03, 0x00, // jnz loop
            0xF5, // push psw
            0xCD, 0x09, 0x00, // call subr
            0xF1, // pop psw
            0x76, // hlt
            0xAF, // xra a
            0xC9, // ret
        ]
    );
}

#[test]
fn fatal_errors_stop_the_run() {
    let cases = [
        ("mvx a, 1", "InvalidToken"),
        ("loop mov a, b", "InvalidToken"),
        ("x: equ 1", "InvalidToken"),
        ("set 4", "MissingToken"),
        ("mov m, m", "InvalidOperand"),
        ("jmp nowhere", "UnresolvedSymbol"),
    ];
    for (src, kind) in cases {
        let err = assemble_str(src, &Config::default()).unwrap_err();
        println!("{src:<16} => {err}");
        assert!(format!("{:?}", err.kind()).starts_with(kind), "{src}");
        assert_eq!(err.line(), Some(1));
    }
}
