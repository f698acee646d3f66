use crate::{alu::ALU, cond::Cond, reg::Pair, reg::Reg};

use color_print::cformat;

/// A fully resolved machine instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    MOV(Reg, Reg),
    MVI(Reg, u8),
    LXI(Pair, u16),
    LDA(u16),
    STA(u16),
    LHLD(u16),
    SHLD(u16),
    LDAX(Pair),
    STAX(Pair),
    XCHG(),

    ALU(ALU, Reg),
    ALUI(ALU, u8),
    INR(Reg),
    DCR(Reg),
    INX(Pair),
    DCX(Pair),
    DAD(Pair),
    DAA(),
    CMA(),
    STC(),
    CMC(),
    RLC(),
    RRC(),
    RAL(),
    RAR(),

    JMP(u16),
    JCC(Cond, u16),
    CALL(u16),
    CCC(Cond, u16),
    RET(),
    RCC(Cond),
    RST(u8),
    PCHL(),

    PUSH(Pair),
    POP(Pair),
    XTHL(),
    SPHL(),
    IN(u8),
    OUT(u8),
    EI(),
    DI(),
    HLT(),
    NOP(),
}

impl Inst {
    fn opcode(&self) -> u8 {
        match self {
            Inst::MOV(dst, src) => 0b01_000_000 | dst.code() << 3 | src.code(),
            Inst::MVI(dst, _) => 0b00_000_110 | dst.code() << 3,
            Inst::LXI(rp, _) => 0b00_00_0001 | rp.bits() << 4,
            Inst::LDA(_) => 0x3A,
            Inst::STA(_) => 0x32,
            Inst::LHLD(_) => 0x2A,
            Inst::SHLD(_) => 0x22,
            Inst::LDAX(rp) => 0b00_00_1010 | rp.bits() << 4,
            Inst::STAX(rp) => 0b00_00_0010 | rp.bits() << 4,
            Inst::XCHG() => 0xEB,

            Inst::ALU(alu, src) => 0b10_000_000 | alu.bits() << 3 | src.code(),
            Inst::ALUI(alu, _) => 0b11_000_110 | alu.bits() << 3,
            Inst::INR(dst) => 0b00_000_100 | dst.code() << 3,
            Inst::DCR(dst) => 0b00_000_101 | dst.code() << 3,
            Inst::INX(rp) => 0b00_00_0011 | rp.bits() << 4,
            Inst::DCX(rp) => 0b00_00_1011 | rp.bits() << 4,
            Inst::DAD(rp) => 0b00_00_1001 | rp.bits() << 4,
            Inst::DAA() => 0x27,
            Inst::CMA() => 0x2F,
            Inst::STC() => 0x37,
            Inst::CMC() => 0x3F,
            Inst::RLC() => 0x07,
            Inst::RRC() => 0x0F,
            Inst::RAL() => 0x17,
            Inst::RAR() => 0x1F,

            Inst::JMP(_) => 0xC3,
            Inst::JCC(cc, _) => 0b11_000_010 | cc.bits() << 3,
            Inst::CALL(_) => 0xCD,
            Inst::CCC(cc, _) => 0b11_000_100 | cc.bits() << 3,
            Inst::RET() => 0xC9,
            Inst::RCC(cc) => 0b11_000_000 | cc.bits() << 3,
            Inst::RST(n) => 0b11_000_111 | (n & 0b111) << 3,
            Inst::PCHL() => 0xE9,

            Inst::PUSH(rp) => 0b11_00_0101 | rp.bits() << 4,
            Inst::POP(rp) => 0b11_00_0001 | rp.bits() << 4,
            Inst::XTHL() => 0xE3,
            Inst::SPHL() => 0xF9,
            Inst::IN(_) => 0xDB,
            Inst::OUT(_) => 0xD3,
            Inst::EI() => 0xFB,
            Inst::DI() => 0xF3,
            Inst::HLT() => 0x76,
            Inst::NOP() => 0x00,
        }
    }

    /// Opcode followed by its data bytes, 16-bit data low byte first.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = vec![self.opcode()];
        match self {
            Inst::MVI(_, d8) | Inst::ALUI(_, d8) | Inst::IN(d8) | Inst::OUT(d8) => {
                bytes.push(*d8);
            }
            Inst::LXI(_, d16)
            | Inst::LDA(d16)
            | Inst::STA(d16)
            | Inst::LHLD(d16)
            | Inst::SHLD(d16)
            | Inst::JMP(d16)
            | Inst::JCC(_, d16)
            | Inst::CALL(d16)
            | Inst::CCC(_, d16) => {
                bytes.extend_from_slice(&d16.to_le_bytes());
            }
            _ => {}
        }
        bytes
    }
}

impl Inst {
    pub fn cformat(&self) -> String {
        macro_rules! op {
            ($name:expr) => {
                cformat!("<r>{:<5}</>", $name)
            };
            ($name:expr, $arg:expr) => {
                cformat!("<r>{:<5}</><b>{}</>", $name, $arg)
            };
            ($name:expr, $a:expr, $b:expr) => {
                cformat!("<r>{:<5}</><b>{},{}</>", $name, $a, $b)
            };
        }
        macro_rules! imm {
            ($v:expr) => {
                cformat!("<y>{:02X}h</>", $v)
            };
        }
        macro_rules! addr {
            ($v:expr) => {
                cformat!("<y>{:04X}h</>", $v)
            };
        }

        match self {
            Inst::MOV(dst, src) => op!("mov", dst, src),
            Inst::MVI(dst, d8) => op!("mvi", dst, imm!(d8)),
            Inst::LXI(rp, d16) => op!("lxi", rp, addr!(d16)),
            Inst::LDA(a) => op!("lda", addr!(a)),
            Inst::STA(a) => op!("sta", addr!(a)),
            Inst::LHLD(a) => op!("lhld", addr!(a)),
            Inst::SHLD(a) => op!("shld", addr!(a)),
            Inst::LDAX(rp) => op!("ldax", rp),
            Inst::STAX(rp) => op!("stax", rp),
            Inst::XCHG() => op!("xchg"),
            Inst::ALU(alu, src) => op!(alu, src),
            Inst::ALUI(alu, d8) => op!(alu.immediate(), imm!(d8)),
            Inst::INR(r) => op!("inr", r),
            Inst::DCR(r) => op!("dcr", r),
            Inst::INX(rp) => op!("inx", rp),
            Inst::DCX(rp) => op!("dcx", rp),
            Inst::DAD(rp) => op!("dad", rp),
            Inst::DAA() => op!("daa"),
            Inst::CMA() => op!("cma"),
            Inst::STC() => op!("stc"),
            Inst::CMC() => op!("cmc"),
            Inst::RLC() => op!("rlc"),
            Inst::RRC() => op!("rrc"),
            Inst::RAL() => op!("ral"),
            Inst::RAR() => op!("rar"),
            Inst::JMP(a) => op!("jmp", addr!(a)),
            Inst::JCC(cc, a) => op!(format!("j{cc}"), addr!(a)),
            Inst::CALL(a) => op!("call", addr!(a)),
            Inst::CCC(cc, a) => op!(format!("c{cc}"), addr!(a)),
            Inst::RET() => op!("ret"),
            Inst::RCC(cc) => op!(format!("r{cc}")),
            Inst::RST(n) => op!("rst", n),
            Inst::PCHL() => op!("pchl"),
            Inst::PUSH(rp) => op!("push", rp),
            Inst::POP(rp) => op!("pop", rp),
            Inst::XTHL() => op!("xthl"),
            Inst::SPHL() => op!("sphl"),
            Inst::IN(port) => op!("in", imm!(port)),
            Inst::OUT(port) => op!("out", imm!(port)),
            Inst::EI() => op!("ei"),
            Inst::DI() => op!("di"),
            Inst::HLT() => op!("hlt"),
            Inst::NOP() => op!("nop"),
        }
    }
}
