//! Handling of NBD protocol replies (`">IIQ"` on the wire).
//!
//! Unlike requests, a reply's payload length is not carried on the wire: a READ reply's data
//! length must be recovered from a side-channel populated when the matching request was sent.
//! [`PendingReads`] is that side-channel.

use std::collections::HashMap;
use std::io::{Read, Write};

use crate::constants::Magic;
use crate::error::{Error, Result};
use crate::framing::read_exact_or_truncated;

/// Size of the fixed reply header: magic, error, handle.
const HEADER_LEN: usize = 4 + 4 + 8;

/// Maps an in-flight request's handle to the number of payload bytes its reply should carry.
///
/// Populated by the request side when a READ is issued, and drained by [`NBDResponse::read_from`]
/// as replies arrive.
pub type PendingReads = HashMap<u64, usize>;

/// A single NBD protocol reply, as sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NBDResponse {
    pub error: u32,
    pub handle: u64,
    /// Present for successful READ replies; absent for WRITE/FLUSH/TRIM acknowledgements.
    pub data: Option<Vec<u8>>,
}

impl NBDResponse {
    /// Read a single reply off of `reader`.
    ///
    /// If the reply reports success and `pending` has a registered length for its handle, that
    /// many payload bytes are read and the entry is removed from `pending`. A nonzero error code
    /// is surfaced as [`Error::ProtocolState`] rather than being paired with a payload read.
    pub fn read_from<R: Read>(mut reader: R, pending: &mut PendingReads) -> Result<Self> {
        let mut header = [0_u8; HEADER_LEN];
        read_exact_or_truncated(&mut reader, &mut header)?;

        let magic = u32::from_be_bytes(header[0..4].try_into().expect("4 bytes"));
        if magic != Magic::REPLY {
            return Err(Error::ProtocolMagic { expected: Magic::REPLY, found: magic });
        }

        let error = u32::from_be_bytes(header[4..8].try_into().expect("4 bytes"));
        let handle = u64::from_be_bytes(header[8..16].try_into().expect("8 bytes"));

        if error != 0 {
            return Err(Error::ProtocolState(format!(
                "NBD reply for handle {handle:#x} carried error code {error}",
            )));
        }

        let data = match pending.remove(&handle) {
            Some(len) => {
                let mut payload = vec![0_u8; len];
                read_exact_or_truncated(&mut reader, &mut payload)?;
                Some(payload)
            }
            None => None,
        };

        Ok(Self { error, handle, data })
    }

    /// Serialize this reply to `writer`, including its payload (if any).
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&Magic::REPLY.to_be_bytes())?;
        writer.write_all(&self.error.to_be_bytes())?;
        writer.write_all(&self.handle.to_be_bytes())?;

        if let Some(data) = &self.data {
            writer.write_all(data)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_read_reply_and_drains_the_pending_map() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0x67, 0x44, 0x66, 0x98]);
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(&[0x50, 0xe4, 0x93, 0x01, 0x00, 0x88, 0xff, 0xff]);
        bytes.extend(std::iter::repeat(0_u8).take(4096));

        let mut pending = PendingReads::new();
        pending.insert(0x50e4_9301_0088_ffff, 4096);

        let resp = NBDResponse::read_from(&bytes[..], &mut pending).unwrap();

        assert_eq!(resp.error, 0);
        assert_eq!(resp.handle, 0x50e4_9301_0088_ffff);
        assert_eq!(resp.data, Some(vec![0_u8; 4096]));
        assert!(pending.is_empty());
    }

    #[test]
    fn surfaces_nonzero_error_codes() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&Magic::REPLY.to_be_bytes());
        bytes.extend_from_slice(&5_u32.to_be_bytes());
        bytes.extend_from_slice(&1_u64.to_be_bytes());

        let mut pending = PendingReads::new();
        let err = NBDResponse::read_from(&bytes[..], &mut pending).unwrap_err();
        assert!(matches!(err, Error::ProtocolState(_)));
    }

    #[test]
    fn round_trips_a_write_ack_with_no_payload() {
        let resp = NBDResponse { error: 0, handle: 42, data: None };
        let mut buf = Vec::new();
        resp.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_LEN);

        let mut pending = PendingReads::new();
        let decoded = NBDResponse::read_from(&buf[..], &mut pending).unwrap();
        assert_eq!(decoded, resp);
    }
}
