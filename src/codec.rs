use bytes::{Buf, BufMut, BytesMut};
use log::trace;
use rasn::error::DecodeErrorKind;
use rasn::{ber, de::Decode};
use rasn_ldap::LdapMessage;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::Error;

/// Frames BER-encoded `LdapMessage`s on a byte stream.
pub(crate) struct LdapCodec;

impl Decoder for LdapCodec {
    type Item = LdapMessage;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !src.has_remaining() {
            return Ok(None);
        }

        let mut decoder = ber::de::Decoder::new(src, ber::de::DecoderOptions::ber());
        match LdapMessage::decode(&mut decoder) {
            Ok(msg) => {
                let len = decoder.decoded_len();
                src.advance(len);
                trace!("decoded message of {len} bytes: {msg:?}");
                Ok(Some(msg))
            }
            // a partial message is not an error, wait for more data
            Err(err) => match *err.kind {
                DecodeErrorKind::Incomplete { needed } => {
                    trace!("partial message in the buffer, needed: {needed:?}");
                    Ok(None)
                }
                _ => Err(err.into()),
            },
        }
    }
}

impl Encoder<LdapMessage> for LdapCodec {
    type Error = Error;

    fn encode(&mut self, item: LdapMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let encoded = ber::encode(&item)?;
        trace!("encoded message of {} bytes: {:?}", encoded.len(), item);
        dst.reserve(encoded.len());
        dst.put_slice(&encoded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rasn_ldap::{ProtocolOp, UnbindRequest};

    use super::*;

    fn unbind_msg(id: u32) -> LdapMessage {
        LdapMessage::new(id, ProtocolOp::UnbindRequest(UnbindRequest))
    }

    #[test]
    fn roundtrip_two_messages_in_one_buffer() {
        let mut buf = BytesMut::new();
        LdapCodec.encode(unbind_msg(1), &mut buf).unwrap();
        LdapCodec.encode(unbind_msg(2), &mut buf).unwrap();

        let mut codec = LdapCodec;
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(unbind_msg(1)));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(unbind_msg(2)));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_message_yields_none() {
        let mut buf = BytesMut::new();
        LdapCodec.encode(unbind_msg(7), &mut buf).unwrap();
        let full = buf.len();
        let mut partial = buf.split_to(full - 1);

        let mut codec = LdapCodec;
        assert_eq!(codec.decode(&mut partial).unwrap(), None);
        partial.unsplit(buf);
        assert_eq!(codec.decode(&mut partial).unwrap(), Some(unbind_msg(7)));
    }
}
