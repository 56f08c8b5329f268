//! The fixed-size header that precedes every write-log record's payload.

use crate::error::{Error, Result};

/// Length in bytes of an encoded [`LogHeader`]: `operation(4) + start_time(8) + end_time(8) +
/// offset(8) + length(4)`.
pub const HEADER_LEN: usize = 32;

/// `operation` value meaning "no-op": the record carries no payload and yields no [`crate::Write`].
pub const OP_NONE: u32 = 0;

/// `operation` value meaning "a block write": the record's payload is applied at `offset`.
pub const OP_WRITE: u32 = 1;

/// The big-endian, fixed-width header fronting each record in a write-log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogHeader {
    pub operation: u32,
    pub start_time: f64,
    pub end_time: f64,
    pub offset: u64,
    pub length: i32,
}

impl LogHeader {
    /// Encode into the wire's big-endian `>IddQi` layout.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&self.operation.to_be_bytes());
        buf[4..12].copy_from_slice(&self.start_time.to_be_bytes());
        buf[12..20].copy_from_slice(&self.end_time.to_be_bytes());
        buf[20..28].copy_from_slice(&self.offset.to_be_bytes());
        buf[28..32].copy_from_slice(&self.length.to_be_bytes());
        buf
    }

    /// Decode from the wire's big-endian `>IddQi` layout.
    ///
    /// Rejects an `operation` outside `{OP_NONE, OP_WRITE}` and a negative `length`, both of which
    /// indicate a corrupt or foreign log rather than a record this format can represent.
    pub fn decode(buf: &[u8; HEADER_LEN]) -> Result<Self> {
        let operation = u32::from_be_bytes(buf[0..4].try_into().expect("4 bytes"));
        let start_time = f64::from_be_bytes(buf[4..12].try_into().expect("8 bytes"));
        let end_time = f64::from_be_bytes(buf[12..20].try_into().expect("8 bytes"));
        let offset = u64::from_be_bytes(buf[20..28].try_into().expect("8 bytes"));
        let length = i32::from_be_bytes(buf[28..32].try_into().expect("4 bytes"));

        if operation != OP_NONE && operation != OP_WRITE {
            return Err(Error::ProtocolState(format!("unknown log operation {operation}")));
        }
        if length < 0 {
            return Err(Error::ProtocolState(format!("negative record length {length}")));
        }

        Ok(Self { operation, start_time, end_time, offset, length })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_write_header() {
        let header = LogHeader {
            operation: OP_WRITE,
            start_time: 1_700_000_000.125,
            end_time: 1_700_000_000.25,
            offset: 0x1_0000,
            length: 4096,
        };
        let encoded = header.encode();
        assert_eq!(encoded.len(), HEADER_LEN);
        assert_eq!(LogHeader::decode(&encoded).unwrap(), header);
    }

    #[test]
    fn rejects_unknown_operation() {
        let mut header = LogHeader {
            operation: OP_WRITE,
            start_time: 0.0,
            end_time: 0.0,
            offset: 0,
            length: 0,
        };
        header.operation = 7;
        let encoded = header.encode();
        assert!(LogHeader::decode(&encoded).is_err());
    }

    #[test]
    fn rejects_negative_length() {
        let header = LogHeader {
            operation: OP_WRITE,
            start_time: 0.0,
            end_time: 0.0,
            offset: 0,
            length: -1,
        };
        let encoded = header.encode();
        assert!(LogHeader::decode(&encoded).is_err());
    }
}
