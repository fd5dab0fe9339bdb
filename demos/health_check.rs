//! Example: health check, read and write against a PLC
//!
//! Run with: cargo run --example health_check
//!
//! This example demonstrates:
//! - A minimal binary 3E station for D and M devices
//! - The persistent client (lazy dial, redial after failures)
//! - The explicit client (caller-managed connect/close)
//! - Pulling end code and words out of raw responses

use melsec_mc::utils::{end_code, format_frame, response_data, words_from_data};
use melsec_mc::{ClientConfig, ExplicitClient, PersistentClient, Station};
use std::time::Duration;

/// Binary 3E frames for network 0, PC 0xFF, CPU module 0x03FF.
struct BinaryStation;

impl BinaryStation {
    fn frame(command: u16, subcommand: u16, body: &[u8]) -> String {
        // monitoring timer (2) + command (2) + subcommand (2) + body
        let length = (6 + body.len()) as u16;

        let mut frame = vec![0x50, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00];
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&0x0010u16.to_le_bytes());
        frame.extend_from_slice(&command.to_le_bytes());
        frame.extend_from_slice(&subcommand.to_le_bytes());
        frame.extend_from_slice(body);
        hex::encode_upper(frame)
    }

    fn device(device_name: &str, offset: u32, num_points: u16) -> Vec<u8> {
        let code = match device_name {
            "M" => 0x90,
            _ => 0xA8, // D
        };
        let mut body = offset.to_le_bytes()[..3].to_vec();
        body.push(code);
        body.extend_from_slice(&num_points.to_le_bytes());
        body
    }
}

impl Station for BinaryStation {
    fn build_health_check_request(&self) -> String {
        let mut body = 5u16.to_le_bytes().to_vec();
        body.extend_from_slice(b"ABCDE");
        Self::frame(0x0619, 0x0000, &body)
    }

    fn build_read_request(&self, device_name: &str, offset: u32, num_points: u16) -> String {
        Self::frame(0x0401, 0x0000, &Self::device(device_name, offset, num_points))
    }

    fn build_bit_read_request(&self, device_name: &str, offset: u32, num_points: u16) -> String {
        Self::frame(0x0401, 0x0001, &Self::device(device_name, offset, num_points))
    }

    fn build_write_request(
        &self,
        device_name: &str,
        offset: u32,
        num_points: u16,
        data: &[u8],
    ) -> String {
        let mut body = Self::device(device_name, offset, num_points);
        body.extend_from_slice(data);
        Self::frame(0x1401, 0x0000, &body)
    }
}

fn main() -> melsec_mc::Result<()> {
    let config = ClientConfig::new("192.168.3.39", 5000)
        .with_connect_timeout(Duration::from_secs(3))
        .with_read_timeout(Duration::from_secs(3));

    // =========================================================================
    // Persistent client
    // =========================================================================

    println!("=== Persistent client ===\n");

    let client = PersistentClient::new(config.clone(), BinaryStation)?;

    client.health_check()?;
    println!("Health check OK");

    let response = client.read("D", 100, 4)?;
    println!("Raw response: {}", format_frame(&response));
    println!("End code: {:?}", end_code(&response));
    println!("D100-D103: {:?}", words_from_data(response_data(&response)));

    let ack = client.write("D", 200, 2, &[0x34, 0x12, 0x78, 0x56])?;
    println!("Write ack end code: {:?}", end_code(&ack));

    let bits = client.bit_read("M", 0, 8)?;
    println!("M0-M7 raw: {}", format_frame(response_data(&bits)));

    client.close()?;

    // =========================================================================
    // Explicit client
    // =========================================================================

    println!("\n=== Explicit client ===\n");

    let client = ExplicitClient::new(config, BinaryStation)?;
    client.connect()?;
    client.health_check()?;
    println!("Health check OK");
    client.close()?;

    println!("\nExample completed!");
    Ok(())
}
