//! Helpers for inspecting raw 3E binary responses.
//!
//! The client returns responses as raw bytes. These functions pull the common
//! pieces out of a binary 3E response for applications that want them.
//!
//! # Example
//!
//! ```
//! use melsec_mc::utils::{end_code, response_data, words_from_data};
//!
//! let response = [
//!     0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x06, 0x00, // header
//!     0x00, 0x00, // end code
//!     0x34, 0x12, 0x78, 0x56, // data
//! ];
//!
//! assert_eq!(end_code(&response), Some(0x0000));
//! assert_eq!(words_from_data(response_data(&response)), vec![0x1234, 0x5678]);
//! ```

/// Offset of the end (completion) code in a 3E binary response.
pub const END_CODE_OFFSET: usize = 9;

/// Offset of the first data byte in a 3E binary response.
pub const DATA_OFFSET: usize = 11;

/// Formats bytes as upper-case hex pairs separated by spaces.
///
/// # Example
///
/// ```
/// use melsec_mc::utils::format_frame;
///
/// assert_eq!(format_frame(&[0x50, 0x00, 0xff]), "50 00 FF");
/// assert_eq!(format_frame(&[]), "");
/// ```
pub fn format_frame(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns the little-endian end code, or `None` if the response is too short.
///
/// Zero means the PLC completed the request.
pub fn end_code(response: &[u8]) -> Option<u16> {
    response
        .get(END_CODE_OFFSET..DATA_OFFSET)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
}

/// Returns the bytes after the response header.
pub fn response_data(response: &[u8]) -> &[u8] {
    response.get(DATA_OFFSET..).unwrap_or(&[])
}

/// Splits data into little-endian words. A trailing odd byte is ignored.
pub fn words_from_data(data: &[u8]) -> Vec<u16> {
    data.chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
