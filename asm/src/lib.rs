pub mod builder;
pub mod config;
pub mod encoder;
pub mod error;
pub mod expr;
pub mod parser;
pub mod resolver;
pub mod source;
pub mod symbols;
pub mod syntax;
pub mod util;

use arch::image::Image;

use crate::{
    config::Config,
    encoder::Listing,
    error::{Error, Warning},
    parser::SourceRecord,
    resolver::Resolution,
    source::SourceLine,
    symbols::SymbolTable,
};

/// Pipeline stages, entered strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Lexed,
    Checked,
    SymbolsBuilt,
    SymbolsResolved,
    Encoded,
    Finalized,
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub records: Vec<SourceRecord>,
    pub symbols: SymbolTable,
    pub resolution: Resolution,
    pub image: Image,
    pub bytes_written: usize,
    pub warnings: Vec<Warning>,
    pub listing: Vec<Listing>,
}

pub fn assemble_str(src: &str, config: &Config) -> Result<Assembly, Error> {
    assemble(&source::preprocess(src), config)
}

/// Run both passes over preprocessed lines. Any error aborts the run.
pub fn assemble(lines: &[SourceLine], config: &Config) -> Result<Assembly, Error> {
    let raw: Vec<_> = lines.iter().map(parser::lex).collect();
    enter(Stage::Lexed, raw.len());

    let mut records = raw
        .into_iter()
        .map(syntax::check)
        .collect::<Result<Vec<_>, _>>()?;
    enter(Stage::Checked, records.len());

    let mut symbols = builder::build(&records)?;
    enter(Stage::SymbolsBuilt, symbols.pending_labels().len());

    let resolution = resolver::resolve(&mut symbols, &mut records);
    for (label, err) in &resolution.unresolved {
        tracing::info!("`{label}` is unresolved: {err}");
    }
    enter(Stage::SymbolsResolved, resolution.deferred_operands);

    let encoded = encoder::encode(&records, &mut symbols, config)?;
    enter(Stage::Encoded, encoded.bytes_written);

    for warning in &encoded.warnings {
        tracing::info!("{warning}");
    }
    enter(Stage::Finalized, encoded.image.size() as usize);

    Ok(Assembly {
        records,
        symbols,
        resolution,
        image: encoded.image,
        bytes_written: encoded.bytes_written,
        warnings: encoded.warnings,
        listing: encoded.listing,
    })
}

fn enter(stage: Stage, count: usize) {
    tracing::debug!(?stage, count, "stage complete");
}

/// Read an AEF file back, checking its header.
pub fn load_image(path: &str) -> Result<Image, Error> {
    let bytes = std::fs::read(path).map_err(|e| Error::FileOpen(path.to_string(), e))?;
    Ok(Image::from_bytes(&bytes)?)
}
