//! Domain errors.

use thiserror::Error;

/// Why a requested display name could not be turned into a [`Username`](super::Username)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameError {
    #[error("username is empty")]
    Empty,

    #[error("username is longer than {max} characters")]
    TooLong { max: usize },

    #[error("username contains control characters")]
    ControlCharacter,
}

/// Admission-time errors, answered with `401 Unauthorized` and the error text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// No `Username` header was supplied
    #[error("no username")]
    MissingIdentity,

    /// The header was repeated or its value is not a usable name
    #[error("invalid username")]
    MalformedIdentity,

    /// Another live session already holds the name
    #[error("username already exists")]
    NameTaken(String),
}

impl From<UsernameError> for IdentityError {
    fn from(_: UsernameError) -> Self {
        IdentityError::MalformedIdentity
    }
}

/// Registry mutation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("username '{0}' is already registered")]
    NameTaken(String),
}

impl From<RegistryError> for IdentityError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NameTaken(name) => IdentityError::NameTaken(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_error_messages_are_sent_to_rejected_clients() {
        // テスト項目: 拒否されたクライアントに返すエラーメッセージが固定文言である
        // then (期待する結果):
        assert_eq!(IdentityError::MissingIdentity.to_string(), "no username");
        assert_eq!(IdentityError::MalformedIdentity.to_string(), "invalid username");
        assert_eq!(
            IdentityError::NameTaken("bob".to_string()).to_string(),
            "username already exists"
        );
    }

    #[test]
    fn test_registry_error_converts_to_name_taken() {
        // テスト項目: RegistryError::NameTaken が IdentityError::NameTaken に変換される
        // given (前提条件):
        let err = RegistryError::NameTaken("alice".to_string());

        // when (操作):
        let converted: IdentityError = err.into();

        // then (期待する結果):
        assert_eq!(converted, IdentityError::NameTaken("alice".to_string()));
    }
}
