use arch::{
    alu::ALU,
    image::{Image, MAX_PROGRAM, MEM_SIZE},
    inst::Inst,
    op::{Branch, Directive, Instr, Mnemonic, Pseudo},
    reg::{Pair, Reg},
};

use crate::{
    config::Config,
    error::{Error, Warning},
    expr::Evaluator,
    parser::SourceRecord,
    symbols::SymbolTable,
};

/// Bytes emitted for one record, for the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub line: usize,
    pub address: u16,
    pub bytes: Vec<u8>,
    pub inst: Option<Inst>,
}

#[derive(Debug, Clone)]
pub struct Encoded {
    pub image: Image,
    pub bytes_written: usize,
    pub warnings: Vec<Warning>,
    pub listing: Vec<Listing>,
}

/// Pass 2: walk the records and write the memory image.
pub fn encode(
    records: &[SourceRecord],
    symbols: &mut SymbolTable,
    config: &Config,
) -> Result<Encoded, Error> {
    let mut encoder = Encoder::new(symbols, config);
    for record in records {
        if encoder.halted {
            break;
        }
        encoder.record(record).map_err(|e| e.at(record.line))?;
    }
    Ok(encoder.finish())
}

struct Encoder<'a> {
    symbols: &'a mut SymbolTable,
    config: &'a Config,
    image: Image,
    address: usize,
    /// Address of the record being encoded, the value of `$`.
    origin: usize,
    bytes_written: usize,
    soft_exceeded: bool,
    hard_exceeded: bool,
    halted: bool,
    entry: Option<u16>,
    emitted: Vec<u8>,
    listing: Vec<Listing>,
}

impl<'a> Encoder<'a> {
    fn new(symbols: &'a mut SymbolTable, config: &'a Config) -> Self {
        Encoder {
            symbols,
            config,
            image: Image::new(),
            address: 0,
            origin: 0,
            bytes_written: 0,
            soft_exceeded: false,
            hard_exceeded: false,
            halted: false,
            entry: None,
            emitted: vec![],
            listing: vec![],
        }
    }

    /// The single path every emitted byte goes through.
    fn write_byte(&mut self, byte: u8) {
        if self.hard_exceeded {
            return;
        }
        if self.address >= self.config.limits.hard.min(MEM_SIZE)
            || self.bytes_written >= MAX_PROGRAM
        {
            self.hard_exceeded = true;
            self.halted = true;
            return;
        }
        if self.address >= self.config.limits.soft {
            self.soft_exceeded = true;
        }
        self.image.write(self.address as u16, byte);
        self.emitted.push(byte);
        self.address += 1;
        self.bytes_written += 1;
    }

    fn record(&mut self, record: &SourceRecord) -> Result<(), Error> {
        self.origin = self.address;
        self.emitted.clear();
        let mut built = None;

        match record.mnemonic {
            None => {}
            Some(Mnemonic::Pseudo(Pseudo::Equ | Pseudo::Set)) => {}
            Some(Mnemonic::Pseudo(Pseudo::Org)) => {
                let addr = self.value(record, 0)?;
                if !(0..MEM_SIZE as i64).contains(&addr) {
                    return Err(Error::InvalidOperand(
                        record.operands[0].text.clone(),
                        "origin outside of memory".to_string(),
                    ));
                }
                self.address = addr as usize;
                self.origin = self.address;
                if self.address >= self.config.limits.soft {
                    self.soft_exceeded = true;
                }
            }
            Some(Mnemonic::Pseudo(Pseudo::End)) => {
                if !record.operands.is_empty() {
                    self.entry = Some(self.value(record, 0)? as u16);
                }
                self.halted = true;
            }
            Some(Mnemonic::Directive(directive)) => self.directive(directive, record)?,
            Some(Mnemonic::Instr(instr)) => {
                let inst = self.inst(instr, record)?;
                for byte in inst.encode() {
                    self.write_byte(byte);
                }
                built = Some(inst);
            }
        }

        self.listing.push(Listing {
            line: record.line,
            address: self.origin as u16,
            bytes: self.emitted.clone(),
            inst: built,
        });
        Ok(())
    }

    fn directive(&mut self, directive: Directive, record: &SourceRecord) -> Result<(), Error> {
        match directive {
            Directive::Ds => {
                let count = self.value(record, 0)?;
                if count < 0 {
                    return Err(Error::InvalidOperand(
                        record.operands[0].text.clone(),
                        "negative storage size".to_string(),
                    ));
                }
                for _ in 0..count {
                    if self.hard_exceeded {
                        break;
                    }
                    self.write_byte(0);
                }
            }
            Directive::Db => {
                for idx in 0..record.operands.len() {
                    match quoted(&record.operands[idx].text) {
                        Some(text) if !text.is_ascii() => {
                            return Err(Error::InvalidOperand(
                                record.operands[idx].text.clone(),
                                "strings must be ASCII".to_string(),
                            ));
                        }
                        Some(text) => {
                            for byte in text.bytes() {
                                self.write_byte(byte);
                            }
                        }
                        None => {
                            let value = self.value(record, idx)?;
                            self.write_byte(value as u8);
                        }
                    }
                }
            }
            Directive::Dw => {
                for idx in 0..record.operands.len() {
                    let [lo, hi] = (self.value(record, idx)? as u16).to_le_bytes();
                    self.write_byte(lo);
                    self.write_byte(hi);
                }
            }
        }
        Ok(())
    }

    fn inst(&mut self, instr: Instr, record: &SourceRecord) -> Result<Inst, Error> {
        use Instr::*;

        const RP_ALL: &[Pair] = &[Pair::B, Pair::D, Pair::H, Pair::SP];
        const RP_STACK: &[Pair] = &[Pair::B, Pair::D, Pair::H, Pair::PSW];
        const RP_INDIRECT: &[Pair] = &[Pair::B, Pair::D];

        if let Some((branch, cond)) = instr.branch() {
            return Ok(match (branch, cond) {
                (Branch::Jump, None) => Inst::JMP(self.word(record, 0)?),
                (Branch::Jump, Some(cc)) => Inst::JCC(cc, self.word(record, 0)?),
                (Branch::Call, None) => Inst::CALL(self.word(record, 0)?),
                (Branch::Call, Some(cc)) => Inst::CCC(cc, self.word(record, 0)?),
                (Branch::Return, None) => Inst::RET(),
                (Branch::Return, Some(cc)) => Inst::RCC(cc),
            });
        }

        let inst = match instr {
            Mov => {
                let dst = self.reg(record, 0)?;
                let src = self.reg(record, 1)?;
                if dst == Reg::M && src == Reg::M {
                    return Err(Error::InvalidOperand(
                        "m,m".to_string(),
                        "memory to memory move does not exist".to_string(),
                    ));
                }
                Inst::MOV(dst, src)
            }
            Mvi => Inst::MVI(self.reg(record, 0)?, self.byte(record, 1)?),
            Lxi => Inst::LXI(self.pair(record, 0, RP_ALL)?, self.word(record, 1)?),
            Lda => Inst::LDA(self.word(record, 0)?),
            Sta => Inst::STA(self.word(record, 0)?),
            Lhld => Inst::LHLD(self.word(record, 0)?),
            Shld => Inst::SHLD(self.word(record, 0)?),
            Ldax => Inst::LDAX(self.pair(record, 0, RP_INDIRECT)?),
            Stax => Inst::STAX(self.pair(record, 0, RP_INDIRECT)?),
            Xchg => Inst::XCHG(),

            Add | Adc | Sub | Sbb | Ana | Xra | Ora | Cmp => {
                let alu = alu_of(instr)?;
                Inst::ALU(alu, self.reg(record, 0)?)
            }
            Adi | Aci | Sui | Sbi | Ani | Xri | Ori | Cpi => {
                let alu = alu_of(instr)?;
                Inst::ALUI(alu, self.byte(record, 0)?)
            }
            Inr => Inst::INR(self.reg(record, 0)?),
            Dcr => Inst::DCR(self.reg(record, 0)?),
            Inx => Inst::INX(self.pair(record, 0, RP_ALL)?),
            Dcx => Inst::DCX(self.pair(record, 0, RP_ALL)?),
            Dad => Inst::DAD(self.pair(record, 0, RP_ALL)?),
            Daa => Inst::DAA(),
            Cma => Inst::CMA(),
            Stc => Inst::STC(),
            Cmc => Inst::CMC(),
            Rlc => Inst::RLC(),
            Rrc => Inst::RRC(),
            Ral => Inst::RAL(),
            Rar => Inst::RAR(),

            Rst => {
                let vector = self.value(record, 0)?;
                if !(0..=7).contains(&vector) {
                    return Err(Error::InvalidOperand(
                        record.operands[0].text.clone(),
                        "restart vector must be 0 to 7".to_string(),
                    ));
                }
                Inst::RST(vector as u8)
            }
            Pchl => Inst::PCHL(),

            Push => Inst::PUSH(self.pair(record, 0, RP_STACK)?),
            Pop => Inst::POP(self.pair(record, 0, RP_STACK)?),
            Xthl => Inst::XTHL(),
            Sphl => Inst::SPHL(),
            In => Inst::IN(self.byte(record, 0)?),
            Out => Inst::OUT(self.byte(record, 0)?),
            Ei => Inst::EI(),
            Di => Inst::DI(),
            Hlt => Inst::HLT(),
            Nop => Inst::NOP(),

            _ => {
                return Err(Error::InvalidToken(format!(
                    "`{instr}` has no encoding"
                )))
            }
        };
        Ok(inst)
    }

    // ------------------------------------------------------------------------
    // Operands

    /// Value computed by the resolver, or evaluated now with `$` bound.
    fn value(&mut self, record: &SourceRecord, idx: usize) -> Result<i64, Error> {
        let operand = record
            .operands
            .get(idx)
            .ok_or_else(|| Error::MissingToken(format!("operand {}", idx + 1)))?;
        if let Some(value) = operand.value {
            return Ok(value);
        }
        let result = Evaluator::new(&mut *self.symbols)
            .at(self.origin as u16)
            .evaluate(&operand.text);
        result.map_err(|e| Error::UnresolvedSymbol(operand.text.clone(), e))
    }

    fn byte(&mut self, record: &SourceRecord, idx: usize) -> Result<u8, Error> {
        Ok(self.value(record, idx)? as u8)
    }

    fn word(&mut self, record: &SourceRecord, idx: usize) -> Result<u16, Error> {
        Ok(self.value(record, idx)? as u16)
    }

    /// A register name in any case, otherwise an expression giving its code.
    fn reg_code(&mut self, record: &SourceRecord, idx: usize) -> Result<i64, Error> {
        match record.operands.get(idx).and_then(|o| Reg::parse(&o.text)) {
            Some(reg) => Ok(reg.code() as i64),
            None => self.value(record, idx),
        }
    }

    fn reg(&mut self, record: &SourceRecord, idx: usize) -> Result<Reg, Error> {
        let code = self.reg_code(record, idx)?;
        Reg::from_code(code).ok_or_else(|| {
            Error::InvalidOperand(
                record.operands[idx].text.clone(),
                "expected one of b, c, d, e, h, l, m, a".to_string(),
            )
        })
    }

    fn pair(&mut self, record: &SourceRecord, idx: usize, allowed: &[Pair]) -> Result<Pair, Error> {
        let code = self.reg_code(record, idx)?;
        Pair::from_code(code)
            .filter(|pair| allowed.contains(pair))
            .ok_or_else(|| {
                let names: Vec<String> = allowed.iter().map(Pair::to_string).collect();
                Error::InvalidOperand(
                    record.operands[idx].text.clone(),
                    format!("expected one of {}", names.join(", ")),
                )
            })
    }

    fn finish(self) -> Encoded {
        let mut warnings = vec![];
        if self.hard_exceeded {
            warnings.push(Warning::HardLimitExceeded {
                limit: self.config.limits.hard,
            });
        } else if self.soft_exceeded {
            warnings.push(Warning::SoftLimitExceeded {
                limit: self.config.limits.soft,
            });
        }

        let mut image = self.image;
        image.set_size(u16::try_from(self.bytes_written).unwrap_or(u16::MAX));
        image.set_entry(self.entry.unwrap_or(self.config.entry));

        Encoded {
            image,
            bytes_written: self.bytes_written,
            warnings,
            listing: self.listing,
        }
    }
}

fn alu_of(instr: Instr) -> Result<ALU, Error> {
    instr
        .alu()
        .ok_or_else(|| Error::InvalidToken(format!("`{instr}` is not an accumulator operation")))
}

/// Contents of a `'...'` string of more than one character.
fn quoted(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    (inner.chars().count() > 1 && !inner.contains('\'')).then_some(inner)
}
