//! Session identity value objects.

use std::fmt;

use uuid::Uuid;

use super::error::UsernameError;

/// The reserved name a client requests to get a synthesized one
pub const ANONYMOUS: &str = "anonymous";

/// Maximum length of a display name, in characters
pub const MAX_USERNAME_LEN: usize = 64;

/// A validated display name.
///
/// Surrounding whitespace is trimmed; the result must be non-empty, at most
/// [`MAX_USERNAME_LEN`] characters and free of control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Username(String);

impl Username {
    pub fn new(value: impl AsRef<str>) -> Result<Self, UsernameError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UsernameError::Empty);
        }
        if trimmed.chars().count() > MAX_USERNAME_LEN {
            return Err(UsernameError::TooLong {
                max: MAX_USERNAME_LEN,
            });
        }
        if trimmed.chars().any(char::is_control) {
            return Err(UsernameError::ControlCharacter);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Synthesized name for the `n`-th anonymous client (`anonymous<n>`)
    pub fn anonymous(n: u64) -> Self {
        Self(format!("{ANONYMOUS}{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_reserved_anonymous(&self) -> bool {
        self.0 == ANONYMOUS
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Username {
    type Error = UsernameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one admitted connection.
///
/// A name can be reused after its holder disconnects; the id tells the old
/// and the new session apart so a late teardown never removes the newcomer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Name and id of a registered session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    pub name: Username,
    pub id: SessionId,
}

impl SessionHandle {
    pub fn new(name: Username) -> Self {
        Self {
            name,
            id: SessionId::new(),
        }
    }
}
