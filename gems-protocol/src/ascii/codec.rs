use bytes::{Bytes, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use super::FRAME_END;

/// Default cap on a single buffered frame. The length field allows ten
/// decimal digits, but nothing legitimate approaches that.
const DEFAULT_MAX_FRAME_LEN: usize = 8 * 1024 * 1024;

/// Frame-boundary codec for GEMS-ASCII streams, for use with
/// [`tokio_util::codec::Framed`].
///
/// The stream is not newline-framed; the `|END` trailer is the only frame
/// delimiter. Decoding yields the raw bytes of one frame including the
/// trailer; message-level validation happens above this layer so that a bad
/// frame does not poison the stream. Encoding passes pre-encoded frames
/// through unchanged.
#[derive(Debug, Clone)]
pub struct GemsFrameCodec {
    max_frame_len: usize,
}

impl GemsFrameCodec {
    pub fn new() -> Self {
        GemsFrameCodec {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        GemsFrameCodec { max_frame_len }
    }
}

impl Default for GemsFrameCodec {
    fn default() -> Self {
        GemsFrameCodec::new()
    }
}

fn find_trailer(buf: &[u8]) -> Option<usize> {
    let trailer = FRAME_END.as_bytes();
    buf.windows(trailer.len()).position(|w| w == trailer)
}

impl Decoder for GemsFrameCodec {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match find_trailer(src) {
            Some(i) => {
                let frame = src.split_to(i + FRAME_END.len());
                Ok(Some(frame))
            }
            None => {
                if src.len() > self.max_frame_len {
                    src.clear();
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "GEMS-ASCII frame exceeds maximum length",
                    ));
                }
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "received partial GEMS-ASCII message",
            )),
        }
    }
}

impl Encoder<Bytes> for GemsFrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_frames_on_trailer() {
        let mut codec = GemsFrameCodec::new();
        let mut buf = BytesMut::from(&b"|GEMS|14|x|END|GEMS|14|y|ENDtrailing"[..]);

        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&first[..], b"|GEMS|14|x|END");
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&second[..], b"|GEMS|14|y|END");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(&buf[..], b"trailing");
    }

    #[test]
    fn waits_for_more_data_without_trailer() {
        let mut codec = GemsFrameCodec::new();
        let mut buf = BytesMut::from(&b"|GEMS|14|partial"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        // The partial bytes stay buffered.
        assert_eq!(&buf[..], b"|GEMS|14|partial");
    }

    #[test]
    fn partial_frame_at_eof_is_an_error() {
        let mut codec = GemsFrameCodec::new();
        let mut buf = BytesMut::from(&b"|GEMS|14|partial"[..]);
        let err = codec.decode_eof(&mut buf).unwrap_err();
        assert!(err.to_string().contains("partial GEMS-ASCII message"));
    }

    #[test]
    fn clean_eof_yields_nothing() {
        let mut codec = GemsFrameCodec::new();
        let mut buf = BytesMut::new();
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn oversized_buffer_is_rejected() {
        let mut codec = GemsFrameCodec::with_max_frame_len(16);
        let mut buf = BytesMut::from(&b"|GEMS|14|no trailer here at all"[..]);
        assert!(codec.decode(&mut buf).unwrap_err().to_string().contains("maximum length"));
    }
}
