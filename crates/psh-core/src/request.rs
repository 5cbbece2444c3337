use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// File mode for transferred files, written and parsed as octal (`0644`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission(u32);

impl Permission {
    pub fn new(mode: u32) -> Option<Self> {
        (mode <= 0o7777).then_some(Self(mode))
    }

    pub fn mode(&self) -> u32 {
        self.0
    }
}

impl Default for Permission {
    fn default() -> Self {
        Self(0o644)
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        if digits.is_empty() || digits.len() > 4 {
            return Err(format!("invalid permission '{}': expected up to four octal digits", s));
        }
        let mode = u32::from_str_radix(digits, 8)
            .map_err(|_| format!("invalid permission '{}': not an octal number", s))?;
        Permission::new(mode).ok_or_else(|| format!("invalid permission '{}'", s))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOptions {
    pub decompress: bool,
    pub create_dir: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub source: PathBuf,
    pub dest: String,
    pub permission: Permission,
    pub options: TransferOptions,
}

/// The single action applied to every target of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionRequest {
    Command { command: String },
    Transfer(TransferRequest),
}
