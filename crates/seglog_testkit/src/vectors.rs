//! On-disk format vectors.
//!
//! These pin the exact bytes of store frames and index entries so that any
//! implementation reading or writing seglog files can be checked against
//! them.

use serde::{Deserialize, Serialize};

/// A store frame vector: a payload and the frame bytes it must produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Payload bytes (hex-encoded).
    pub payload_hex: String,
    /// Expected frame bytes (hex-encoded).
    pub frame_hex: String,
}

/// An index entry vector: an entry and the slot bytes it must produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Relative offset.
    pub offset: u32,
    /// Store position.
    pub position: u64,
    /// Expected slot bytes (hex-encoded).
    pub slot_hex: String,
}

/// Store frame vectors.
pub fn frame_vectors() -> Vec<FrameVector> {
    vec![
        FrameVector {
            id: "frame_empty".into(),
            description: "Empty payload is a bare length prefix".into(),
            payload_hex: String::new(),
            frame_hex: "0000000000000000".into(),
        },
        FrameVector {
            id: "frame_hello".into(),
            description: "Five-byte payload".into(),
            payload_hex: "68656c6c6f".into(),
            frame_hex: "000000000000000568656c6c6f".into(),
        },
        FrameVector {
            id: "frame_world".into(),
            description: "Six-byte payload".into(),
            payload_hex: "776f726c6421".into(),
            frame_hex: "0000000000000006776f726c6421".into(),
        },
        FrameVector {
            id: "frame_256".into(),
            description: "Length crossing a byte boundary is big-endian".into(),
            payload_hex: "00".repeat(256),
            frame_hex: format!("0000000000000100{}", "00".repeat(256)),
        },
    ]
}

/// Index entry vectors.
pub fn entry_vectors() -> Vec<EntryVector> {
    vec![
        EntryVector {
            id: "entry_zero".into(),
            description: "First record of a segment".into(),
            offset: 0,
            position: 0,
            slot_hex: "000000000000000000000000".into(),
        },
        EntryVector {
            id: "entry_second".into(),
            description: "Second record after a five-byte payload".into(),
            offset: 1,
            position: 13,
            slot_hex: "00000001000000000000000d".into(),
        },
        EntryVector {
            id: "entry_byte_order".into(),
            description: "Both fields are big-endian".into(),
            offset: 0x0102_0304,
            position: 0x0506_0708_090a_0b0c,
            slot_hex: "0102030405060708090a0b0c".into(),
        },
        EntryVector {
            id: "entry_max".into(),
            description: "Largest representable values".into(),
            offset: u32::MAX,
            position: u64::MAX,
            slot_hex: "ff".repeat(12),
        },
    ]
}

/// Exports all vectors as JSON.
pub fn all_vectors_json() -> String {
    let vectors = AllVectors {
        frames: frame_vectors(),
        entries: entry_vectors(),
    };
    serde_json::to_string_pretty(&vectors).expect("Failed to serialize vectors")
}

#[derive(Debug, Serialize, Deserialize)]
struct AllVectors {
    frames: Vec<FrameVector>,
    entries: Vec<EntryVector>,
}

/// Encodes bytes as hexadecimal string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decodes hexadecimal string to bytes.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    let hex = hex.replace([' ', '\n', '\r'], "");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}
