use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::Display;

/// Accumulator group operations. The discriminant is the 3-bit operation
/// field shared by the register (`10AAASSS`) and immediate (`11AAA110`) forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, Display)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum ALU {
    ADD,
    ADC,
    SUB,
    SBB,
    ANA,
    XRA,
    ORA,
    CMP,
}

impl ALU {
    pub fn bits(self) -> u8 {
        self.into()
    }

    /// Mnemonic of the immediate form.
    pub fn immediate(self) -> &'static str {
        match self {
            ALU::ADD => "adi",
            ALU::ADC => "aci",
            ALU::SUB => "sui",
            ALU::SBB => "sbi",
            ALU::ANA => "ani",
            ALU::XRA => "xri",
            ALU::ORA => "ori",
            ALU::CMP => "cpi",
        }
    }
}
