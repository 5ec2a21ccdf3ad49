use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::Result;
use crate::message::Message;

/// Decodes LSP's `Content-Length`-framed JSON-RPC messages from a byte
/// stream, one message at a time.
///
/// A `Framer` is stateful only in the sense of remembering whether the last
/// read hit a clean end-of-stream before a complete header was seen
/// ([`Framer::header_truncated_at_eof`]) — the decision of whether that is
/// worth logging belongs to the caller, since it depends on whether the
/// owning server has already received a `shutdown` response, which
/// the Framer itself has no notion of.
pub struct Framer<R> {
	reader: R,
	header_truncated_at_eof: bool,
}

impl<R> Framer<R> {
	pub fn new(reader: R) -> Self {
		Framer { reader, header_truncated_at_eof: false }
	}

	/// True if the most recent [`Framer::read_message`] call hit a clean
	/// end-of-stream before finding the header/body separator.
	pub fn header_truncated_at_eof(&self) -> bool {
		self.header_truncated_at_eof
	}

	pub fn into_inner(self) -> R {
		self.reader
	}
}

impl<R: AsyncBufRead + Unpin> Framer<R> {
	/// Reads and decodes one message, or `Ok(None)` for any of the
	/// recoverable parse failures (truncated header, missing/invalid
	/// `Content-Length`, short body, invalid JSON). Only a genuine I/O error
	/// propagates as `Err`.
	pub async fn read_message(&mut self) -> Result<Option<Message>> {
		self.header_truncated_at_eof = false;

		let content_length = match self.read_headers().await? {
			Some(len) => len,
			None => {
				self.header_truncated_at_eof = true;
				return Ok(None);
			}
		};

		let mut body = vec![0u8; content_length];
		if content_length > 0 {
			if let Err(err) = self.reader.read_exact(&mut body).await {
				if err.kind() == std::io::ErrorKind::UnexpectedEof {
					tracing::warn!(declared = content_length, "lsp message body shorter than declared Content-Length");
					return Ok(None);
				}
				return Err(err.into());
			}
		}

		match serde_json::from_slice::<Message>(&body) {
			Ok(msg) => Ok(Some(msg)),
			Err(err) => {
				tracing::warn!(error = %err, "invalid JSON in lsp message body");
				Ok(None)
			}
		}
	}

	/// Reads header lines up to and including the blank line separator.
	/// Returns the declared `Content-Length` (0 if missing or unparsable),
	/// or `None` if end-of-stream was reached before the blank line.
	async fn read_headers(&mut self) -> Result<Option<usize>> {
		let mut content_length = None;
		let mut line = Vec::new();
		loop {
			line.clear();
			let bytes_read = self.reader.read_until(b'\n', &mut line).await?;
			if bytes_read == 0 {
				return Ok(None);
			}
			let trimmed = trim_crlf(&line);
			if trimmed.is_empty() {
				break;
			}
			if let Some(colon) = trimmed.iter().position(|&b| b == b':') {
				let (key, rest) = trimmed.split_at(colon);
				let value = &rest[1..];
				if key.eq_ignore_ascii_case(b"content-length") {
					let value = std::str::from_utf8(value).unwrap_or("").trim();
					content_length = value.parse::<usize>().ok();
				}
				// other headers (e.g. Content-Type) are tolerated and ignored.
			}
		}
		Ok(Some(content_length.unwrap_or(0)))
	}
}

fn trim_crlf(line: &[u8]) -> &[u8] {
	line.strip_suffix(b"\r\n").or_else(|| line.strip_suffix(b"\n")).unwrap_or(line)
}

/// Encodes a message as `Content-Length: <n>\r\n\r\n<json>`. No other
/// headers are emitted.
pub fn encode(msg: &Message) -> Result<Vec<u8>> {
	let body = serde_json::to_vec(msg).map_err(crate::error::Error::Encode)?;
	let mut out = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
	out.extend_from_slice(&body);
	Ok(out)
}

pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, msg: &Message) -> Result<()> {
	let bytes = encode(msg)?;
	writer.write_all(&bytes).await?;
	writer.flush().await?;
	Ok(())
}

/// Bound required of a Framer's underlying reader in generic code; kept as
/// a named alias so `proxy-core` can stay agnostic of the concrete stream
/// type (stdio pipe vs TCP socket).
pub trait FramedRead: AsyncRead + AsyncBufRead + Unpin + Send {}
impl<T: AsyncRead + AsyncBufRead + Unpin + Send> FramedRead for T {}
