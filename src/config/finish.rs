//! Close-to-finalize contract for streaming writers.
//!
//! Compressing and encrypting sinks buffer internally; callers must `finish`
//! them on every exit path or the written envelope is truncated.

use age::stream::StreamWriter;
use liblzma::write::XzEncoder;
use lz4_flex::frame::FrameEncoder;
use std::io::{Error, ErrorKind, Write};

pub trait Finish<O> {
    fn finish(self) -> Result<O, Error>;
}

impl<W: Write> Finish<W> for XzEncoder<W> {
    fn finish(self) -> Result<W, Error> {
        self.finish()
    }
}

impl<W: Write> Finish<W> for FrameEncoder<W> {
    fn finish(self) -> Result<W, Error> {
        self.finish().map_err(|e| Error::new(ErrorKind::Other, e))
    }
}

impl<W: Write> Finish<W> for StreamWriter<W> {
    fn finish(self) -> Result<W, Error> {
        self.finish()
    }
}
