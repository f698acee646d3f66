use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::{Display, EnumString};

/// Condition field of the conditional jump/call/return families.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, EnumString, Display,
)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Cond {
    NZ,
    Z,
    NC,
    C,
    PO,
    PE,
    P,
    M,
}

impl Cond {
    pub fn bits(self) -> u8 {
        self.into()
    }
}
