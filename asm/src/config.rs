use arch::image::MEM_SIZE;

/// Default code and data budget, 30 KiB.
pub const SOFT_LIMIT: usize = 30 * 1024;

/// Layout limits checked by the encoder on every written byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub soft: usize,
    pub hard: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            soft: SOFT_LIMIT,
            hard: MEM_SIZE,
        }
    }
}

/// Settings for one assembly run, built once and passed by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub limits: Limits,
    pub entry: u16,
}

impl Config {
    pub fn with_soft_limit(mut self, soft: usize) -> Self {
        self.limits.soft = soft.min(self.limits.hard);
        self
    }

    pub fn with_entry(mut self, entry: u16) -> Self {
        self.entry = entry;
        self
    }
}
