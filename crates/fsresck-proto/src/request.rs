//! Handling of NBD protocol requests (`">IIQQI"` on the wire).

use std::io::{Read, Write};

use crate::constants::{Magic, RequestType};
use crate::error::{Error, Result};
use crate::framing::read_exact_or_truncated;

/// Size of the fixed request header: magic, type, handle, offset, length.
const HEADER_LEN: usize = 4 + 4 + 8 + 8 + 4;

/// A single NBD protocol request, as sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NBDRequest {
    pub req_type: RequestType,
    pub handle: u64,
    pub data_from: u64,
    pub data_length: u32,
    /// Present only for [`RequestType::Write`] requests.
    pub data: Option<Vec<u8>>,
}

impl NBDRequest {
    /// Read a single request off of `reader`, including its payload if it is a write.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut header = [0_u8; HEADER_LEN];
        read_exact_or_truncated(&mut reader, &mut header)?;

        let magic = u32::from_be_bytes(header[0..4].try_into().expect("4 bytes"));
        if magic != Magic::REQUEST {
            return Err(Error::ProtocolMagic { expected: Magic::REQUEST, found: magic });
        }

        let req_type_raw = u32::from_be_bytes(header[4..8].try_into().expect("4 bytes"));
        let req_type = RequestType::from_wire(req_type_raw)
            .ok_or_else(|| Error::ProtocolState(format!("unknown NBD request type {req_type_raw}")))?;
        let handle = u64::from_be_bytes(header[8..16].try_into().expect("8 bytes"));
        let data_from = u64::from_be_bytes(header[16..24].try_into().expect("8 bytes"));
        let data_length = u32::from_be_bytes(header[24..28].try_into().expect("4 bytes"));

        let data = if req_type == RequestType::Write {
            let mut payload = vec![0_u8; data_length as usize];
            read_exact_or_truncated(&mut reader, &mut payload)?;
            Some(payload)
        } else {
            None
        };

        Ok(Self { req_type, handle, data_from, data_length, data })
    }

    /// Serialize this request to `writer`, appending the payload for write requests.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&Magic::REQUEST.to_be_bytes())?;
        writer.write_all(&self.req_type.to_wire().to_be_bytes())?;
        writer.write_all(&self.handle.to_be_bytes())?;
        writer.write_all(&self.data_from.to_be_bytes())?;
        writer.write_all(&self.data_length.to_be_bytes())?;

        if self.req_type == RequestType::Write {
            if let Some(data) = &self.data {
                writer.write_all(data)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_read_request() {
        let req = NBDRequest {
            req_type: RequestType::Read,
            handle: 0x0102_0304_0506_0708,
            data_from: 4096,
            data_length: 512,
            data: None,
        };

        let mut buf = Vec::new();
        req.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_LEN);

        let decoded = NBDRequest::read_from(&buf[..]).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn round_trips_a_write_request_with_payload() {
        let req = NBDRequest {
            req_type: RequestType::Write,
            handle: 7,
            data_from: 0,
            data_length: 4,
            data: Some(vec![1, 2, 3, 4]),
        };

        let mut buf = Vec::new();
        req.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_LEN + 4);

        let decoded = NBDRequest::read_from(&buf[..]).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = vec![0_u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&0xdead_beef_u32.to_be_bytes());

        let err = NBDRequest::read_from(&buf[..]).unwrap_err();
        assert!(matches!(err, Error::ProtocolMagic { .. }));
    }

    #[test]
    fn reports_truncated_header() {
        let buf = vec![0_u8; HEADER_LEN - 1];
        let err = NBDRequest::read_from(&buf[..]).unwrap_err();
        assert!(matches!(err, Error::Truncated { .. }));
    }
}
