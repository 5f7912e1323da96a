//! Full user identifiers of the form `acct:{username}@{authority}`.

use crate::error::CoreError;

const PREFIX: &str = "acct:";

/// Build the userid for `username` under `authority`.
pub fn format_userid(username: &str, authority: &str) -> String {
    format!("{PREFIX}{username}@{authority}")
}

/// Split a userid into `(username, authority)`.
///
/// The split happens on the last `@` so usernames containing `@` survive.
pub fn split_userid(userid: &str) -> Result<(&str, &str), CoreError> {
    let invalid = || CoreError::Validation(format!("'{userid}' is not a valid userid"));

    let rest = userid.strip_prefix(PREFIX).ok_or_else(invalid)?;
    let (username, authority) = rest.rsplit_once('@').ok_or_else(invalid)?;
    if username.is_empty() || authority.is_empty() {
        return Err(invalid());
    }
    Ok((username, authority))
}
