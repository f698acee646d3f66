use crate::{alu::ALU, cond::Cond, reg::Reg};
use std::{fmt, str::FromStr};
use strum::{Display, EnumIter, EnumString};

/// Machine instruction mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Instr {
    // Data transfer
    Mov,
    Mvi,
    Lxi,
    Lda,
    Sta,
    Lhld,
    Shld,
    Ldax,
    Stax,
    Xchg,

    // Arithmetic and logic
    Add,
    Adc,
    Sub,
    Sbb,
    Ana,
    Xra,
    Ora,
    Cmp,
    Adi,
    Aci,
    Sui,
    Sbi,
    Ani,
    Xri,
    Ori,
    Cpi,
    Inr,
    Dcr,
    Inx,
    Dcx,
    Dad,
    Daa,
    Cma,
    Stc,
    Cmc,
    Rlc,
    Rrc,
    Ral,
    Rar,

    // Branch
    Jmp,
    Jnz,
    Jz,
    Jnc,
    Jc,
    Jpo,
    Jpe,
    Jp,
    Jm,
    Call,
    Cnz,
    Cz,
    Cnc,
    Cc,
    Cpo,
    Cpe,
    Cp,
    Cm,
    Ret,
    Rnz,
    Rz,
    Rnc,
    Rc,
    Rpo,
    Rpe,
    Rp,
    Rm,
    Rst,
    Pchl,

    // Stack, I/O and machine control
    Push,
    Pop,
    Xthl,
    Sphl,
    In,
    Out,
    Ei,
    Di,
    Hlt,
    Nop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Jump,
    Call,
    Return,
}

impl Instr {
    /// Number of comma separated operands the instruction takes.
    pub fn arity(self) -> usize {
        use Instr::*;
        match self {
            Mov | Mvi | Lxi => 2,
            Lda | Sta | Lhld | Shld | Ldax | Stax => 1,
            Add | Adc | Sub | Sbb | Ana | Xra | Ora | Cmp => 1,
            Adi | Aci | Sui | Sbi | Ani | Xri | Ori | Cpi => 1,
            Inr | Dcr | Inx | Dcx | Dad => 1,
            Push | Pop | Rst | In | Out => 1,
            Jmp | Jnz | Jz | Jnc | Jc | Jpo | Jpe | Jp | Jm => 1,
            Call | Cnz | Cz | Cnc | Cc | Cpo | Cpe | Cp | Cm => 1,
            _ => 0,
        }
    }

    /// Accumulator operation of the register or immediate arithmetic forms.
    pub fn alu(self) -> Option<ALU> {
        use Instr::*;
        match self {
            Add | Adi => Some(ALU::ADD),
            Adc | Aci => Some(ALU::ADC),
            Sub | Sui => Some(ALU::SUB),
            Sbb | Sbi => Some(ALU::SBB),
            Ana | Ani => Some(ALU::ANA),
            Xra | Xri => Some(ALU::XRA),
            Ora | Ori => Some(ALU::ORA),
            Cmp | Cpi => Some(ALU::CMP),
            _ => None,
        }
    }

    /// Jump/call/return family and the condition spelled by the mnemonic
    /// suffix (`jpe` -> `pe`). Unconditional forms carry no condition.
    pub fn branch(self) -> Option<(Branch, Option<Cond>)> {
        use Instr::*;
        let branch = match self {
            Jmp | Jnz | Jz | Jnc | Jc | Jpo | Jpe | Jp | Jm => Branch::Jump,
            Call | Cnz | Cz | Cnc | Cc | Cpo | Cpe | Cp | Cm => Branch::Call,
            Ret | Rnz | Rz | Rnc | Rc | Rpo | Rpe | Rp | Rm => Branch::Return,
            _ => return None,
        };
        let name = self.to_string();
        Some((branch, name[1..].parse::<Cond>().ok()))
    }
}

/// Pseudo-instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Pseudo {
    Org,
    Equ,
    Set,
    End,
}

/// Data definition directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Directive {
    Db,
    Dw,
    Ds,
}

/// Anything that may stand in the mnemonic field of a source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Instr(Instr),
    Pseudo(Pseudo),
    Directive(Directive),
}

impl Mnemonic {
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// `equ` and `set` bind their label instead of occupying memory.
    pub fn is_binding(self) -> bool {
        matches!(self, Mnemonic::Pseudo(Pseudo::Equ | Pseudo::Set))
    }
}

impl FromStr for Mnemonic {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Instr>()
            .map(Mnemonic::Instr)
            .or_else(|_| s.parse::<Pseudo>().map(Mnemonic::Pseudo))
            .or_else(|_| s.parse::<Directive>().map(Mnemonic::Directive))
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mnemonic::Instr(i) => write!(f, "{i}"),
            Mnemonic::Pseudo(p) => write!(f, "{p}"),
            Mnemonic::Directive(d) => write!(f, "{d}"),
        }
    }
}

/// Words that may never be used as a label. Mnemonics are reserved in any
/// case; register names only in the lowercase spelling they are bound under,
/// since labels are case sensitive.
pub fn is_reserved(word: &str) -> bool {
    Mnemonic::parse(word).is_some() || Reg::from_name(word).is_some()
}
