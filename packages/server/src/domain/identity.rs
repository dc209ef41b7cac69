//! Parsing of the client-supplied identity header.

use super::{error::IdentityError, username::Username};

/// Name requested during the handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedName {
    /// The reserved literal `anonymous`: the registry synthesizes a name
    Anonymous,
    /// A specific name, subject to uniqueness
    Named(Username),
}

/// Turn the raw values of the identity header into a [`RequestedName`].
///
/// This is the stateless half of identity validation; uniqueness is decided
/// by the registry.
///
/// # Errors
///
/// * [`IdentityError::MissingIdentity`] - the header is absent
/// * [`IdentityError::MalformedIdentity`] - the header is repeated, is not
///   UTF-8, or does not hold a valid [`Username`]
pub fn parse_identity<V: AsRef<[u8]>>(values: &[V]) -> Result<RequestedName, IdentityError> {
    let value = match values {
        [] => return Err(IdentityError::MissingIdentity),
        [value] => value,
        _ => return Err(IdentityError::MalformedIdentity),
    };

    let value =
        std::str::from_utf8(value.as_ref()).map_err(|_| IdentityError::MalformedIdentity)?;
    let name = Username::new(value)?;

    if name.is_reserved_anonymous() {
        Ok(RequestedName::Anonymous)
    } else {
        Ok(RequestedName::Named(name))
    }
}
