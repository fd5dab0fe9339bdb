//! Response sizing and health-check validation.
//!
//! Responses are not length-prefixed for this client, so every operation reads
//! into a buffer whose size is derived from the request kind.
//!
//! # Response Sizes
//!
//! | Request | Buffer | Validated |
//! |---------|--------|-----------|
//! | Health check | 30 bytes | exactly 18 bytes |
//! | Read / bit read | `22 + 2 * num_points` bytes | no |
//! | Write | 22 bytes | no |
//!
//! # Health Check Layout
//!
//! | Offset | Size | Expected |
//! |--------|------|----------|
//! | 0..11 | 11 bytes | 3E response header (not checked) |
//! | 11..13 | 2 bytes | `05 00` (loopback byte count) |
//! | 13..18 | 5 bytes | `41 42 43 44 45` (ASCII "ABCDE") |
//!
//! # Example
//!
//! ```
//! use melsec_mc::response::{read_response_capacity, validate_health_check};
//!
//! assert_eq!(read_response_capacity(10), 42);
//!
//! let mut frame = vec![0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x09, 0x00, 0x00, 0x00];
//! frame.extend_from_slice(&[0x05, 0x00]);
//! frame.extend_from_slice(b"ABCDE");
//! assert!(validate_health_check(&frame).is_ok());
//! ```

use crate::error::{HealthCheckField, McError, Result};

/// Buffer size used to read a health-check response.
pub const HEALTH_CHECK_BUFFER_SIZE: usize = 30;

/// Exact length of a valid health-check response.
pub const HEALTH_CHECK_RESPONSE_LEN: usize = 18;

/// Loopback byte count expected at offset 11..13.
pub const HEALTH_CHECK_HEADER: [u8; 2] = [0x05, 0x00];

/// Loopback data expected at offset 13..18.
pub const HEALTH_CHECK_ECHO: [u8; 5] = *b"ABCDE";

/// Fixed response header size used to size read and write buffers.
pub const RESPONSE_HEADER_SIZE: usize = 22;

/// Bytes per point in a read response.
pub const WORD_SIZE: usize = 2;

/// Buffer size used to read a write acknowledgment.
pub const WRITE_RESPONSE_SIZE: usize = RESPONSE_HEADER_SIZE;

const HEADER_RANGE: std::ops::Range<usize> = 11..13;
const BODY_RANGE: std::ops::Range<usize> = 13..18;

/// Returns the read buffer size for `num_points` points.
///
/// Bit reads use the same word-sized formula.
pub fn read_response_capacity(num_points: u16) -> usize {
    RESPONSE_HEADER_SIZE + WORD_SIZE * usize::from(num_points)
}

/// Validates a health-check response.
///
/// Checks run in order: length, header, body. The first failing check is
/// reported, carrying the whole response as hex.
///
/// # Errors
///
/// Returns [`McError::Validation`] naming the failed [`HealthCheckField`].
pub fn validate_health_check(response: &[u8]) -> Result<()> {
    if response.len() != HEALTH_CHECK_RESPONSE_LEN {
        return Err(McError::validation(
            HealthCheckField::Length,
            HEALTH_CHECK_RESPONSE_LEN.to_string(),
            response.len().to_string(),
            response,
        ));
    }

    let header = &response[HEADER_RANGE];
    if header != HEALTH_CHECK_HEADER {
        return Err(McError::validation(
            HealthCheckField::Header,
            hex::encode_upper(HEALTH_CHECK_HEADER),
            hex::encode_upper(header),
            response,
        ));
    }

    let body = &response[BODY_RANGE];
    if body != HEALTH_CHECK_ECHO {
        return Err(McError::validation(
            HealthCheckField::Body,
            hex::encode_upper(HEALTH_CHECK_ECHO),
            hex::encode_upper(body),
            response,
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> Vec<u8> {
        let mut frame = vec![0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x09, 0x00, 0x00, 0x00];
        frame.extend_from_slice(&HEALTH_CHECK_HEADER);
        frame.extend_from_slice(&HEALTH_CHECK_ECHO);
        frame
    }

    fn field_of(err: McError) -> HealthCheckField {
        match err {
            McError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_read_response_capacity() {
        assert_eq!(read_response_capacity(0), 22);
        assert_eq!(read_response_capacity(1), 24);
        assert_eq!(read_response_capacity(10), 42);
        assert_eq!(read_response_capacity(u16::MAX), 22 + 2 * 65535);
    }

    #[test]
    fn test_health_check_constants() {
        assert_eq!(hex::encode_upper(HEALTH_CHECK_HEADER), "0500");
        assert_eq!(hex::encode_upper(HEALTH_CHECK_ECHO), "4142434445");
        assert_eq!(WRITE_RESPONSE_SIZE, 22);
        assert!(HEALTH_CHECK_BUFFER_SIZE > HEALTH_CHECK_RESPONSE_LEN);
    }

    #[test]
    fn test_valid_health_check() {
        let frame = healthy();
        assert_eq!(frame.len(), 18);
        assert!(validate_health_check(&frame).is_ok());
    }

    #[test]
    fn test_health_check_short() {
        let frame = healthy();
        let err = validate_health_check(&frame[..17]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(&hex::encode_upper(&frame[..17])));
        assert_eq!(field_of(err), HealthCheckField::Length);
    }

    #[test]
    fn test_health_check_long() {
        let mut frame = healthy();
        frame.push(0x00);
        assert_eq!(
            field_of(validate_health_check(&frame).unwrap_err()),
            HealthCheckField::Length
        );
    }

    #[test]
    fn test_health_check_bad_header() {
        let mut frame = healthy();
        frame[11] = 0x04;
        let err = validate_health_check(&frame).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("[0400]"));
        assert!(message.contains(&hex::encode_upper(&frame)));
        assert_eq!(field_of(err), HealthCheckField::Header);
    }

    #[test]
    fn test_health_check_bad_body() {
        let mut frame = healthy();
        frame[17] = b'F';
        let err = validate_health_check(&frame).unwrap_err();
        assert!(err.to_string().contains("[4142434446]"));
        assert_eq!(field_of(err), HealthCheckField::Body);
    }

    #[test]
    fn test_health_check_empty() {
        let err = validate_health_check(&[]).unwrap_err();
        assert_eq!(field_of(err), HealthCheckField::Length);
    }
}
