use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Register names. The discriminant is the value the name is bound to in the
/// symbol table, so `b`..`a` double as the 3-bit register field.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    EnumString,
    EnumIter,
    Display,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[repr(u8)]
pub enum Reg {
    B,
    C,
    D,
    E,
    H,
    L,
    M,
    A,
    SP,
    PSW,
}

impl Reg {
    pub fn parse(s: &str) -> Option<Self> {
        s.parse::<Self>().ok()
    }

    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Register whose name is exactly `name`, in the lowercase spelling the
    /// symbol table binds it under.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().find(|r| r.to_string() == name)
    }

    /// Single register from an evaluated operand (`b`=0 .. `a`=7).
    pub fn from_code(code: i64) -> Option<Self> {
        match u8::try_from(code) {
            Ok(c) if c <= 7 => Self::try_from(c).ok(),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self.into()
    }
}

/// Register pair operand. `SP` and `PSW` share the `11` encoding and are only
/// told apart by the instruction accepting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Pair {
    B,
    D,
    H,
    SP,
    PSW,
}

impl Pair {
    /// Collapse an evaluated register operand (0, 2, 4, 8, 9) into a pair.
    pub fn from_code(code: i64) -> Option<Self> {
        let reg = u8::try_from(code).ok().and_then(|c| Reg::try_from(c).ok())?;
        match reg {
            Reg::B => Some(Pair::B),
            Reg::D => Some(Pair::D),
            Reg::H => Some(Pair::H),
            Reg::SP => Some(Pair::SP),
            Reg::PSW => Some(Pair::PSW),
            _ => None,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Pair::B => 0b00,
            Pair::D => 0b01,
            Pair::H => 0b10,
            Pair::SP | Pair::PSW => 0b11,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Reg::parse("a"), Some(Reg::A));
        assert_eq!(Reg::parse("PSW"), Some(Reg::PSW));
        assert_eq!(Reg::parse("Sp"), Some(Reg::SP));
        assert_eq!(Reg::parse("x"), None);
        assert_eq!(Reg::from_name("sp"), Some(Reg::SP));
        assert_eq!(Reg::from_name("SP"), None);
    }

    #[test]
    fn codes_follow_declaration_order() {
        let codes: Vec<u8> = Reg::iter().map(Reg::code).collect();
        assert_eq!(codes, (0..10).collect::<Vec<u8>>());
        assert_eq!(Reg::M.to_string(), "m");
    }

    #[test]
    fn single_register_rejects_pairs() {
        assert_eq!(Reg::from_code(7), Some(Reg::A));
        assert_eq!(Reg::from_code(8), None);
        assert_eq!(Reg::from_code(-1), None);
    }

    #[test]
    fn pair_collapse() {
        let bits: Vec<Option<u8>> = [0, 2, 4, 8, 9, 1, 7]
            .iter()
            .map(|&c| Pair::from_code(c).map(Pair::bits))
            .collect();
        assert_eq!(
            bits,
            vec![Some(0b00), Some(0b01), Some(0b10), Some(0b11), Some(0b11), None, None]
        );
    }
}
