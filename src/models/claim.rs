use std::fmt;
use std::str::FromStr;

/// Side of a boat's room pair a connection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Boat,
    Observer,
}

impl Role {
    /// Wire name used by issued credentials.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Boat => "boat",
            Role::Observer => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boat" => Ok(Role::Boat),
            "user" => Ok(Role::Observer),
            other => Err(anyhow::anyhow!("unknown credential type '{}'", other)),
        }
    }
}

/// Identity asserted by a verified credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub role: Role,
    pub identifier: String,
}

impl Claim {
    pub fn new(role: Role, identifier: impl Into<String>) -> Self {
        Self {
            role,
            identifier: identifier.into(),
        }
    }
}
