//! Streaming image source backed by an external decoder process.
//!
//! [`FrameStream`] spawns `ffmpeg` as a subprocess, asks it for raw pixel
//! output over a pipe at a fixed channel order and bit depth, and yields one
//! [`IndexedImage`] per fixed-size frame read from the child's stdout. The
//! sequence is finite but its length is not known ahead of consumption — it
//! ends when the child closes its output.
//!
//! The child's exit status and stderr are inspected only after the output
//! stream is exhausted. A non-zero exit at that point is reported through
//! [`log::warn!`] rather than as a hard error: every frame already yielded
//! remains valid, the failure only terminates further production.
//!
//! # Example
//!
//! ```no_run
//! use savebench::{FrameStream, ImageBatch, PixelFormat};
//!
//! let stream = FrameStream::spawn("input.mp4", 512, 512, PixelFormat::Rgb8)?;
//! let batch = ImageBatch::from_stream(stream);
//! # Ok::<(), savebench::SaveBenchError>(())
//! ```

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};

use crate::batch::{IndexedImage, PixelFormat};
use crate::error::SaveBenchError;

/// Decoder binary invoked for streaming sources.
const DECODER_BIN: &str = "ffmpeg";

impl PixelFormat {
    /// The decoder's name for this raw pixel layout.
    fn decoder_pixel_format(self) -> &'static str {
        match self {
            PixelFormat::Gray8 => "gray",
            PixelFormat::Rgb8 => "rgb24",
            PixelFormat::Rgba8 => "rgba",
        }
    }
}

/// Fill `buffer` from `reader`, retrying interrupted reads.
///
/// Returns the number of bytes filled; anything short of the buffer length
/// means the stream ended.
fn fill_frame(reader: &mut impl Read, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
    Ok(filled)
}

/// A lazy sequence of frames decoded by an external subprocess.
///
/// Implements [`Iterator`]; each call to `next()` reads exactly one
/// fixed-size raw frame from the child's stdout and tags it with the next
/// sequence index, monotonically increasing from zero.
pub struct FrameStream {
    child: Child,
    stdout: ChildStdout,
    stderr: Option<ChildStderr>,
    input: PathBuf,
    frame_len: usize,
    width: u32,
    height: u32,
    format: PixelFormat,
    next_index: u64,
    finished: bool,
}

impl FrameStream {
    /// Spawn the decoder for `input`, scaling every frame to
    /// `width × height` in the channel layout of `format`.
    ///
    /// Failing to start the subprocess is a hard error; everything that goes
    /// wrong after the stream has started producing is reported via the
    /// stream-end inspection instead.
    pub fn spawn(
        input: impl AsRef<Path>,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self, SaveBenchError> {
        let input = input.as_ref().to_path_buf();

        let mut command = Command::new(DECODER_BIN);
        command
            .arg("-v")
            .arg("error")
            .arg("-i")
            .arg(&input)
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg(format.decoder_pixel_format())
            .arg("-s")
            .arg(format!("{width}x{height}"))
            .arg("pipe:1");

        Self::from_command(command, input, width, height, format)
    }

    /// Spawn an arbitrary producer command emitting raw frames on stdout.
    ///
    /// Tests inject fake producers here; [`FrameStream::spawn`] is the
    /// production entry point and always runs the real decoder.
    fn from_command(
        mut command: Command,
        input: PathBuf,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self, SaveBenchError> {
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| SaveBenchError::DecoderSpawn {
                path: input.clone(),
                reason: error.to_string(),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| SaveBenchError::DecoderSpawn {
            path: input.clone(),
            reason: "decoder stdout was not captured".to_string(),
        })?;
        let stderr = child.stderr.take();

        Ok(Self {
            child,
            stdout,
            stderr,
            input,
            frame_len: format.frame_len(width, height),
            width,
            height,
            format,
            next_index: 0,
            finished: false,
        })
    }

    /// Read exactly one frame, or detect end of stream.
    ///
    /// Returns `None` on a clean end (EOF at a frame boundary). A trailing
    /// partial frame is logged and treated as end of stream.
    fn read_frame(&mut self) -> Option<Vec<u8>> {
        let mut buffer = vec![0_u8; self.frame_len];

        match fill_frame(&mut self.stdout, &mut buffer) {
            Ok(0) => None,
            Ok(filled) if filled == self.frame_len => Some(buffer),
            Ok(filled) => {
                log::warn!(
                    "decoder stream for {} ended mid-frame: got {filled} of {} bytes",
                    self.input.display(),
                    self.frame_len,
                );
                None
            }
            Err(error) => {
                log::warn!(
                    "failed to read decoder stream for {}: {error}",
                    self.input.display(),
                );
                None
            }
        }
    }

    /// Reap the child and report any post-stream failure.
    ///
    /// Called once, after stdout is exhausted. A non-zero exit or stderr
    /// output is logged, not propagated — already-yielded frames are valid.
    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let mut diagnostics = String::new();
        if let Some(mut stderr) = self.stderr.take() {
            let _ = stderr.read_to_string(&mut diagnostics);
        }

        match self.child.wait() {
            Ok(status) if status.success() => {
                if !diagnostics.trim().is_empty() {
                    log::warn!(
                        "decoder for {} reported: {}",
                        self.input.display(),
                        diagnostics.trim(),
                    );
                }
            }
            Ok(status) => {
                log::warn!(
                    "decoder for {} exited with {status} after {} frames: {}",
                    self.input.display(),
                    self.next_index,
                    diagnostics.trim(),
                );
            }
            Err(error) => {
                log::warn!(
                    "failed to reap decoder for {}: {error}",
                    self.input.display(),
                );
            }
        }
    }
}

impl Iterator for FrameStream {
    type Item = IndexedImage;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let Some(buffer) = self.read_frame() else {
            self.finish();
            return None;
        };

        // The buffer is sized exactly for the dimensions, so this cannot fail.
        let image =
            IndexedImage::from_raw(self.next_index, self.width, self.height, self.format, buffer)
                .expect("frame buffer length matches dimensions");
        self.next_index += 1;
        Some(image)
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        // Abandoned mid-stream: the child may be blocked writing to the
        // pipe, so stop it before reaping.
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
            self.finished = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Error;

    use super::*;

    /// Yields one scripted outcome per `read` call, then EOF.
    struct ScriptedReader {
        script: VecDeque<Result<Vec<u8>, ErrorKind>>,
    }

    impl ScriptedReader {
        fn new(script: Vec<Result<Vec<u8>, ErrorKind>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
            match self.script.pop_front() {
                Some(Ok(bytes)) => {
                    buffer[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(kind)) => Err(Error::from(kind)),
                None => Ok(0),
            }
        }
    }

    #[test]
    fn fill_frame_retries_interrupted_reads() {
        let mut reader = ScriptedReader::new(vec![
            Ok(vec![1, 2]),
            Err(ErrorKind::Interrupted),
            Ok(vec![3, 4]),
        ]);
        let mut buffer = [0_u8; 4];

        assert_eq!(fill_frame(&mut reader, &mut buffer).unwrap(), 4);
        assert_eq!(buffer, [1, 2, 3, 4]);
    }

    #[test]
    fn fill_frame_reports_short_fill_at_eof() {
        let mut reader = ScriptedReader::new(vec![Ok(vec![1, 2])]);
        let mut buffer = [0_u8; 4];

        assert_eq!(fill_frame(&mut reader, &mut buffer).unwrap(), 2);
    }

    #[test]
    fn fill_frame_propagates_hard_errors() {
        let mut reader = ScriptedReader::new(vec![Err(ErrorKind::BrokenPipe)]);
        let mut buffer = [0_u8; 4];

        assert!(fill_frame(&mut reader, &mut buffer).is_err());
    }

    /// A fake producer writing raw bytes to stdout, replacing the decoder.
    fn producer(script: &str) -> FrameStream {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        // 2x2 gray frames: 4 bytes each.
        FrameStream::from_command(
            command,
            PathBuf::from("fake-input"),
            2,
            2,
            PixelFormat::Gray8,
        )
        .unwrap()
    }

    #[test]
    fn stream_yields_one_image_per_full_frame() {
        let frames: Vec<_> = producer("head -c 12 /dev/zero").collect();

        let indices: Vec<u64> = frames.iter().map(|image| image.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(frames.iter().all(|image| image.width() == 2 && image.height() == 2));
    }

    #[test]
    fn stream_drops_a_trailing_partial_frame() {
        // 10 bytes: two full frames plus half of a third.
        assert_eq!(producer("head -c 10 /dev/zero").count(), 2);
    }

    #[test]
    fn stream_keeps_frames_from_a_failing_producer() {
        // The producer dies after two frames; both stay valid and the
        // failure terminates production without surfacing an error.
        let stream = producer("head -c 8 /dev/zero; echo boom >&2; exit 3");
        assert_eq!(stream.count(), 2);
    }

    #[test]
    fn missing_producer_binary_is_a_hard_error() {
        let outcome = FrameStream::from_command(
            Command::new("savebench-missing-decoder"),
            PathBuf::from("fake-input"),
            2,
            2,
            PixelFormat::Gray8,
        );
        assert!(matches!(
            outcome,
            Err(SaveBenchError::DecoderSpawn { .. })
        ));
    }
}
