//! Frame-building collaborator.
//!
//! A [`Station`] turns a semantic request (device name, offset, point count,
//! optional payload) into the hex string of a binary 3E frame. The client never
//! builds frames itself; it only decodes what the station returns and puts it
//! on the wire. This keeps device-address resolution out of the connection code
//! and lets tests substitute a stub.
//!
//! # Example
//!
//! ```
//! use melsec_mc::Station;
//!
//! /// Station that always sends the same canned frames.
//! struct Canned;
//!
//! impl Station for Canned {
//!     fn build_health_check_request(&self) -> String {
//!         "500000FFFF03000D00100019060000050041424344".into()
//!     }
//!     fn build_read_request(&self, _device: &str, _offset: u32, _points: u16) -> String {
//!         String::new()
//!     }
//!     fn build_bit_read_request(&self, _device: &str, _offset: u32, _points: u16) -> String {
//!         String::new()
//!     }
//!     fn build_write_request(&self, _device: &str, _offset: u32, _points: u16, _data: &[u8]) -> String {
//!         String::new()
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::error::Result;

/// Builds hex-encoded MC 3E request frames.
///
/// Each method returns an even-length string of hex digit pairs. A string that
/// does not decode surfaces as [`McError::FrameEncoding`](crate::McError::FrameEncoding)
/// before any socket I/O.
pub trait Station {
    /// Builds the loopback (self-test) request.
    fn build_health_check_request(&self) -> String;

    /// Builds a word-unit batch read of `num_points` points from `device_name` at `offset`.
    fn build_read_request(&self, device_name: &str, offset: u32, num_points: u16) -> String;

    /// Builds a bit-unit batch read of `num_points` points from `device_name` at `offset`.
    fn build_bit_read_request(&self, device_name: &str, offset: u32, num_points: u16) -> String;

    /// Builds a batch write of `data` covering `num_points` points.
    fn build_write_request(
        &self,
        device_name: &str,
        offset: u32,
        num_points: u16,
        data: &[u8],
    ) -> String;
}

impl<S: Station + ?Sized> Station for &S {
    fn build_health_check_request(&self) -> String {
        (**self).build_health_check_request()
    }

    fn build_read_request(&self, device_name: &str, offset: u32, num_points: u16) -> String {
        (**self).build_read_request(device_name, offset, num_points)
    }

    fn build_bit_read_request(&self, device_name: &str, offset: u32, num_points: u16) -> String {
        (**self).build_bit_read_request(device_name, offset, num_points)
    }

    fn build_write_request(
        &self,
        device_name: &str,
        offset: u32,
        num_points: u16,
        data: &[u8],
    ) -> String {
        (**self).build_write_request(device_name, offset, num_points, data)
    }
}

impl<S: Station + ?Sized> Station for Box<S> {
    fn build_health_check_request(&self) -> String {
        (**self).build_health_check_request()
    }

    fn build_read_request(&self, device_name: &str, offset: u32, num_points: u16) -> String {
        (**self).build_read_request(device_name, offset, num_points)
    }

    fn build_bit_read_request(&self, device_name: &str, offset: u32, num_points: u16) -> String {
        (**self).build_bit_read_request(device_name, offset, num_points)
    }

    fn build_write_request(
        &self,
        device_name: &str,
        offset: u32,
        num_points: u16,
        data: &[u8],
    ) -> String {
        (**self).build_write_request(device_name, offset, num_points, data)
    }
}

impl<S: Station + ?Sized> Station for Arc<S> {
    fn build_health_check_request(&self) -> String {
        (**self).build_health_check_request()
    }

    fn build_read_request(&self, device_name: &str, offset: u32, num_points: u16) -> String {
        (**self).build_read_request(device_name, offset, num_points)
    }

    fn build_bit_read_request(&self, device_name: &str, offset: u32, num_points: u16) -> String {
        (**self).build_bit_read_request(device_name, offset, num_points)
    }

    fn build_write_request(
        &self,
        device_name: &str,
        offset: u32,
        num_points: u16,
        data: &[u8],
    ) -> String {
        (**self).build_write_request(device_name, offset, num_points, data)
    }
}

/// Decodes a station frame from hex into wire bytes.
///
/// # Errors
///
/// Returns [`McError::FrameEncoding`](crate::McError::FrameEncoding) for
/// odd-length strings or non-hex characters.
///
/// # Example
///
/// ```
/// use melsec_mc::station::decode_frame;
///
/// assert_eq!(decode_frame("5000ff").unwrap(), vec![0x50, 0x00, 0xFF]);
/// assert!(decode_frame("500").is_err());
/// ```
pub fn decode_frame(frame: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(frame)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::McError;

    struct Fixed(&'static str);

    impl Station for Fixed {
        fn build_health_check_request(&self) -> String {
            self.0.to_string()
        }

        fn build_read_request(&self, device_name: &str, offset: u32, num_points: u16) -> String {
            format!("{}{:06X}{:04X}", self.0, offset, num_points) + &hex::encode(device_name)
        }

        fn build_bit_read_request(&self, _: &str, _: u32, _: u16) -> String {
            self.0.to_string()
        }

        fn build_write_request(&self, _: &str, _: u32, _: u16, data: &[u8]) -> String {
            format!("{}{}", self.0, hex::encode(data))
        }
    }

    #[test]
    fn test_decode_frame_valid() {
        assert_eq!(decode_frame("").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_frame("0A0b").unwrap(), vec![0x0A, 0x0B]);
    }

    #[test]
    fn test_decode_frame_odd_length() {
        let err = decode_frame("ABC").unwrap_err();
        assert!(matches!(err, McError::FrameEncoding(hex::FromHexError::OddLength)));
    }

    #[test]
    fn test_decode_frame_non_hex() {
        let err = decode_frame("ZZ").unwrap_err();
        assert!(matches!(
            err,
            McError::FrameEncoding(hex::FromHexError::InvalidHexCharacter { c: 'Z', index: 0 })
        ));
    }

    #[test]
    fn test_station_through_pointers() {
        let station = Fixed("50");
        let by_ref: &dyn Station = &station;
        let boxed: Box<dyn Station> = Box::new(Fixed("50"));
        let shared = Arc::new(Fixed("50"));

        assert_eq!(by_ref.build_health_check_request(), "50");
        assert_eq!(boxed.build_write_request("D", 0, 1, &[0x01]), "5001");
        assert_eq!(
            (&shared).build_read_request("D", 100, 10),
            "50000064000A44"
        );
    }
}
