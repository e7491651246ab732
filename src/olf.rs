//! The on-disk record stream: tags, word widths and the iterator that walks a metadata
//! section without trusting its contents.
//!
//! The stream has no length prefix. A word-sized tag names each record's kind; the reserved
//! tag [`END_TAG`] is the only well-formed termination. Payload shapes are fixed per
//! (kind, word width) pair, so the iterator can advance by exact record sizes and cut out
//! [`RawRecord`] views for the decoder.

/// Tag value terminating a well-formed record stream.
pub const END_TAG: u64 = 0;

/// Word size of a module's record stream, fixed per file by its machine code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordWidth {
	W32,
	W64,
}

impl WordWidth {
	/// Size in bytes of one word-sized field.
	pub const fn bytes(self) -> usize {
		match self {
			Self::W32 => 4,
			Self::W64 => 8,
		}
	}

	/// Reads one little-endian word from the start of `bytes`, if enough bytes remain.
	pub(crate) fn read(self, bytes: &[u8]) -> Option<u64> {
		match self {
			Self::W32 => bytes.get(..4).map(|b| u32::from_le_bytes(b.try_into().unwrap()) as u64),
			Self::W64 => bytes.get(..8).map(|b| u64::from_le_bytes(b.try_into().unwrap())),
		}
	}
}

/// The kind of one metadata record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
	ImportInterface,
	ExportInterface,
	ExportObject,
	ExportLocal,
	ImportObject,
	ModuleStartup,
}

impl RecordKind {
	/// Record kind by on-disk tag value. Tag 0 is the end sentinel, not a kind.
	pub fn from_tag(tag: u64) -> Option<Self> {
		Some(match tag {
			1 => Self::ImportInterface,
			2 => Self::ExportInterface,
			3 => Self::ExportObject,
			4 => Self::ExportLocal,
			5 => Self::ImportObject,
			6 => Self::ModuleStartup,
			_ => return None,
		})
	}

	/// Number of word-sized payload fields following the tag.
	pub const fn payload_words(self) -> usize {
		match self {
			Self::ImportInterface | Self::ImportObject => 2, // name, interface id
			Self::ExportInterface => 2,                      // name, interface
			Self::ExportObject | Self::ExportLocal => 2,     // name, servant
			Self::ModuleStartup => 2,                        // startup, flags
		}
	}
}

/// One record cut out of the metadata stream, not yet translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
	tag: u64,
	width: WordWidth,
	payload: &'a [u8],
}

impl<'a> RawRecord<'a> {
	#[cfg(test)]
	pub(crate) fn new(tag: u64, width: WordWidth, payload: &'a [u8]) -> Self {
		Self { tag, width, payload }
	}

	/// The raw tag value.
	pub fn tag(&self) -> u64 {
		self.tag
	}

	/// The record kind, if the tag is recognised.
	pub fn kind(&self) -> Option<RecordKind> {
		RecordKind::from_tag(self.tag)
	}

	pub fn width(&self) -> WordWidth {
		self.width
	}

	/// Payload field `index` as a word value.
	///
	/// The iterator guarantees the payload holds exactly `payload_words` fields.
	pub fn word(&self, index: usize) -> u64 {
		let word = self.width.bytes();
		debug_assert!(self.payload.len() >= (index + 1) * word);
		self.width.read(&self.payload[index * word..]).unwrap()
	}
}

/// Ways a record stream can fail to terminate normally.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
	/// The stream ran out of bytes without reaching the end sentinel.
	#[error("metadata stream is truncated")]
	Truncated,

	/// A tag value that names no record kind.
	#[error("unrecognised record tag {0:#x}")]
	UnknownTag(u64),
}

/// Walks a metadata section's raw bytes as a lazy sequence of records.
///
/// The only well-formed termination is the end sentinel. Running out of bytes, an unknown
/// tag or a payload extending past the end of the buffer yield one `Err` item, after which
/// the iterator is exhausted; callers can therefore distinguish a normal end from an
/// invalid, truncated stream.
pub struct OlfIterator<'a> {
	data: &'a [u8],
	width: WordWidth,
	pos: usize,
	done: bool,
}

impl<'a> OlfIterator<'a> {
	pub fn new(data: &'a [u8], width: WordWidth) -> Self {
		Self {
			data,
			width,
			pos: 0,
			done: false,
		}
	}
}

impl<'a> Iterator for OlfIterator<'a> {
	type Item = Result<RawRecord<'a>, StreamError>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}

		let word = self.width.bytes();

		let tag = match self.data.get(self.pos..).and_then(|rest| self.width.read(rest)) {
			Some(tag) => tag,
			None => {
				// ran off the end without seeing the sentinel
				self.done = true;
				return Some(Err(StreamError::Truncated));
			}
		};

		if tag == END_TAG {
			self.done = true;
			return None;
		}

		let kind = match RecordKind::from_tag(tag) {
			Some(kind) => kind,
			None => {
				self.done = true;
				return Some(Err(StreamError::UnknownTag(tag)));
			}
		};

		let start = self.pos + word;
		let len = kind.payload_words() * word;
		let payload = match self.data.get(start..start + len) {
			Some(payload) => payload,
			None => {
				self.done = true;
				return Some(Err(StreamError::Truncated));
			}
		};

		self.pos = start + len;
		Some(Ok(RawRecord {
			tag,
			width: self.width,
			payload,
		}))
	}
}

impl std::iter::FusedIterator for OlfIterator<'_> {}
