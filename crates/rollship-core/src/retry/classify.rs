//! Classify delivery failures into transient or permanent.

use super::error::{ErrorClass, Retryability};

/// Permanent iff the error carries the non-retryable flag; everything else is transient.
pub fn classify<E>(error: &E) -> ErrorClass
where
    E: Retryability + ?Sized,
{
    if error.is_permanent() {
        ErrorClass::Permanent
    } else {
        ErrorClass::Transient
    }
}

/// Predicate form of [`classify`], suitable for `retry::execute`.
pub fn should_retry<E>(error: &E) -> bool
where
    E: Retryability + ?Sized,
{
    classify(error) == ErrorClass::Transient
}

/// Classify an HTTP status for responses that carry no explicit flag.
///
/// Bad request, auth failures and missing resources cannot be fixed by retrying;
/// throttling, timeouts, server errors and anything unexpected can.
pub fn classify_http_status(code: u32) -> ErrorClass {
    match code {
        400 | 401 | 403 | 404 => ErrorClass::Permanent,
        _ => ErrorClass::Transient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{DeliveryError, RemoteError};
    use std::io;

    fn remote(permanent: bool) -> RemoteError {
        RemoteError {
            status: Some(400),
            code: Some("BadRequest_InvalidMapping".to_string()),
            message: "Bad mapping".to_string(),
            permanent,
        }
    }

    #[test]
    fn flagged_remote_error_is_permanent() {
        assert_eq!(classify(&remote(true)), ErrorClass::Permanent);
        assert!(!should_retry(&remote(true)));
    }

    #[test]
    fn unflagged_remote_error_is_transient() {
        assert_eq!(classify(&remote(false)), ErrorClass::Transient);
    }

    #[test]
    fn io_errors_are_transient() {
        let e = io::Error::new(io::ErrorKind::NotFound, "no such file");
        assert_eq!(classify(&e), ErrorClass::Transient);
    }

    #[test]
    fn wrapped_errors_keep_their_flag() {
        let permanent = DeliveryError::from_flagged(remote(true));
        let transient = DeliveryError::from_flagged(remote(false));
        assert_eq!(classify(&permanent), ErrorClass::Permanent);
        assert_eq!(classify(&transient), ErrorClass::Transient);
        assert_eq!(
            classify(&DeliveryError::transient("connection reset")),
            ErrorClass::Transient
        );
    }

    #[test]
    fn http_client_errors_permanent() {
        for code in [400, 401, 403, 404] {
            assert_eq!(classify_http_status(code), ErrorClass::Permanent, "{}", code);
        }
    }

    #[test]
    fn http_throttling_and_5xx_transient() {
        for code in [408, 429, 500, 502, 503, 504] {
            assert_eq!(classify_http_status(code), ErrorClass::Transient, "{}", code);
        }
    }
}
