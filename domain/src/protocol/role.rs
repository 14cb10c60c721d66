//! Role value object representing one phase of a protocol

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A protocol role (Value Object)
///
/// Each role is one phase of a run; the six thinking hats are built in,
/// any other protocol can name its own roles via `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Facts, data, information
    White,
    /// Emotions, intuition, gut feelings
    Red,
    /// Caution, risks, problems
    Black,
    /// Benefits, optimism, value
    Yellow,
    /// Creativity, alternatives, new ideas
    Green,
    /// Process control, synthesis, decisions
    Blue,
    /// Protocol-defined role
    Custom(String),
}

impl Role {
    /// Get the string identifier for this role
    pub fn as_str(&self) -> &str {
        match self {
            Role::White => "white",
            Role::Red => "red",
            Role::Black => "black",
            Role::Yellow => "yellow",
            Role::Green => "green",
            Role::Blue => "blue",
            Role::Custom(s) => s,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Role::White => "White Hat",
            Role::Red => "Red Hat",
            Role::Black => "Black Hat",
            Role::Yellow => "Yellow Hat",
            Role::Green => "Green Hat",
            Role::Blue => "Blue Hat",
            Role::Custom(s) => s,
        }
    }

    /// The six thinking hats in their canonical running order
    pub fn six_hats() -> Vec<Role> {
        vec![
            Role::White,
            Role::Red,
            Role::Black,
            Role::Yellow,
            Role::Green,
            Role::Blue,
        ]
    }

    /// Check if this is one of the built-in hats
    pub fn is_hat(&self) -> bool {
        !matches!(self, Role::Custom(_))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "white" => Role::White,
            "red" => Role::Red,
            "black" => Role::Black,
            "yellow" => Role::Yellow,
            "green" => Role::Green,
            "blue" => Role::Blue,
            _ => Role::Custom(s.trim().to_string()),
        })
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(role) => role,
            Err(never) => match never {},
        }
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Role::from(s.as_str()))
    }
}
