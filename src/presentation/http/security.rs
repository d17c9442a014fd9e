use poem::{Error as PoemError, Result as PoemResult, http::StatusCode};

/// Checks the shared key sent in `x-dispatch-key`. Without a configured key
/// every caller is accepted.
pub fn ensure_dispatch_key(expected: Option<&str>, provided: Option<&str>) -> PoemResult<()> {
    match expected {
        None => Ok(()),
        Some(expected) if provided == Some(expected) => Ok(()),
        Some(_) => Err(PoemError::from_string(
            "missing or invalid dispatch key",
            StatusCode::UNAUTHORIZED,
        )),
    }
}
