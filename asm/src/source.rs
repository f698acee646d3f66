use std::path::Path;

use crate::error::Error;

/// Source file extensions accepted by the assembler.
pub const EXTENSIONS: [&str; 3] = ["s", "as", "asm"];

pub fn check_extension(path: &str) -> Result<(), Error> {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if EXTENSIONS.contains(&ext) => Ok(()),
        _ => Err(Error::InvalidExtension(path.to_string())),
    }
}

/// A non-blank source line with its comment removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number in the input file.
    pub line: usize,
    pub text: String,
}

/// Strip `;` comments and surrounding blanks, dropping lines left empty.
pub fn preprocess(src: &str) -> Vec<SourceLine> {
    src.lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let text = strip_comment(raw).trim();
            (!text.is_empty()).then(|| SourceLine {
                line: idx + 1,
                text: text.to_string(),
            })
        })
        .collect()
}

// A `;` inside a quoted character string is data, not a comment.
fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '\'' => quoted = !quoted,
            ';' if !quoted => return &line[..idx],
            _ => {}
        }
    }
    line
}
