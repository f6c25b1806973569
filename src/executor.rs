//! Line-oriented protocol driver shared by the instrument and relay links

use std::{ fmt, io };
use tokio::io::{ AsyncReadExt, AsyncWriteExt };

/// Sends `Display`-serialized commands over a byte stream and reads
/// LF-terminated reply lines for the commands that produce one.
///
/// Neither device in this system acknowledges writes, and only the
/// instrument's measurement query carries a reply, so writing and reading
/// are exposed as separate operations rather than a combined
/// request/response call.
pub(crate) struct LineExecutor<T>
{
    line_ending: &'static str,
    io_handle: T,
    read_buf: Vec<u8>,
}

impl <T> LineExecutor<T>
    where T: AsyncReadExt + AsyncWriteExt + Unpin + Send
{
    pub(crate) fn with(line_ending: &'static str, io_handle: T) -> Self
    {
        Self {
            line_ending: line_ending,
            io_handle: io_handle,
            read_buf: Vec::with_capacity(128),
        }
    }

    /// Hands the underlying stream back to the caller
    pub(crate) fn into_inner(self) -> T
    {
        self.io_handle
    }

    /// Serializes and sends a single command without waiting for any reply
    pub(crate) async fn send(&mut self, cmd: impl fmt::Display) -> Result<(), io::Error>
    {
        let serialized = format!("{}{}", cmd, self.line_ending);
        self.io_handle.write_all(serialized.as_bytes()).await?;

        Ok(())
    }

    /// Sends a command and reads one reply line
    ///
    /// The returned line has its line ending stripped. Replies are decoded
    /// lossily: a garbled byte becomes a replacement character and fails the
    /// numeric parse downstream instead of killing the link here.
    pub(crate) async fn query(&mut self, cmd: impl fmt::Display) -> Result<String, io::Error>
    {
        self.send(cmd).await?;
        let line_len = self.read_line().await?;

        Ok(self.take_line(line_len))
    }

    /// Reads until the buffer holds at least one LF (0x0A) and returns the
    /// length of the first buffered line, terminator included
    async fn read_line(&mut self) -> Result<usize, io::Error>
    {
        let mut scanned = 0;

        loop {
            if let Some(offset) = self.read_buf[scanned..].iter().position(|byte| *byte == 0x0A) {
                return Ok(scanned + offset + 1);
            }
            scanned = self.read_buf.len();

            let mut chunk = [0u8; 64];
            let bytes_read = self.io_handle.read(&mut chunk[..]).await?;

            if bytes_read == 0 {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
            }
            self.read_buf.extend_from_slice(&chunk[..bytes_read]);
        }
    }

    /// Removes the first `len` bytes from the read buffer and returns them
    /// as a string with the trailing line ending trimmed
    fn take_line(&mut self, len: usize) -> String
    {
        let line: Vec<u8> = self.read_buf.drain(..len).collect();

        String::from_utf8_lossy(&line)
            .trim_end_matches(['\r', '\n'])
            .to_string()
    }
}

#[cfg(test)]
mod tests
{
    use super::LineExecutor;
    use std::time::Duration;
    use tokio::io::{ AsyncReadExt, AsyncWriteExt };

    #[tokio::test]
    async fn send_appends_line_ending()
    {
        let (io_handle, mut peer) = tokio::io::duplex(64);
        let mut executor = LineExecutor::with("\n", io_handle);

        executor.send("0 1").await.unwrap();

        let mut sent = [0u8; 16];
        let sent_len = peer.read(&mut sent).await.unwrap();
        assert_eq!(&sent[..sent_len], b"0 1\n");
    }

    #[tokio::test]
    async fn query_assembles_one_line_from_chunked_input()
    {
        let (io_handle, mut peer) = tokio::io::duplex(64);
        let mut executor = LineExecutor::with("\n", io_handle);

        let feeder = tokio::spawn(async move {
            peer.write_all(b"+1.0,+2.0").await.unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
            peer.write_all(b",+3.0\r\n+4.0\n").await.unwrap();
            peer
        });

        let first = executor.query(":READ?").await.unwrap();
        assert_eq!(first, "+1.0,+2.0,+3.0");

        // the second line arrived in the same chunk and must survive in the buffer
        let second = executor.query(":READ?").await.unwrap();
        assert_eq!(second, "+4.0");

        feeder.await.unwrap();
    }
}
