pub mod alu;
pub mod cond;
pub mod image;
pub mod inst;
pub mod op;
pub mod reg;
