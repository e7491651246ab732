//! Turns raw records into typed metadata entries.

use super::{
	address::{AddrError, AddressSpace},
	metadata::MetadataEntry,
};
use crate::olf::{OlfIterator, RawRecord, RecordKind, StreamError, WordWidth};

/// Errors produced while decoding the record stream.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
	/// The record stream itself is malformed.
	#[error("{0}")]
	Stream(#[from] StreamError),

	/// A tag value that names no record kind. The iterator rejects these before they
	/// reach the decoder; this guards records constructed by other means.
	#[error("unknown record kind {0:#x}")]
	UnknownRecordKind(u64),

	/// More than one startup record in one module.
	#[error("duplicate module startup record")]
	DuplicateStartup,

	/// A pointer field of the record could not be resolved.
	#[error("{0}")]
	AddressResolution(#[from] AddrError),
}

/// Decodes one record against the module's address space.
///
/// Stateless per call; startup uniqueness is cross-record state and is enforced by
/// [`decode_stream`].
pub fn decode_record(record: &RawRecord, space: &AddressSpace) -> Result<MetadataEntry, DecodeError> {
	let kind = record
		.kind()
		.ok_or(DecodeError::UnknownRecordKind(record.tag()))?;

	let entry = match kind {
		RecordKind::ImportInterface | RecordKind::ImportObject => MetadataEntry {
			kind,
			flags: 0,
			name: space.read_string(record.word(0))?,
			interface_id: space.read_string(record.word(1))?,
		},

		// exports carry a pointer into their dispatch structure rather than a direct
		// interface-id pointer
		RecordKind::ExportInterface | RecordKind::ExportObject | RecordKind::ExportLocal => MetadataEntry {
			kind,
			flags: 0,
			name: space.read_string(record.word(0))?,
			interface_id: space.resolve_interface_id(record.word(1))?,
		},

		RecordKind::ModuleStartup => MetadataEntry {
			kind,
			flags: record.word(1) as u32,
			name: String::new(),
			interface_id: space.resolve_interface_id(record.word(0))?,
		},
	};

	Ok(entry)
}

/// Folds a metadata section's record stream into entries, in encounter order.
///
/// Stops at the first malformed record; a second startup record rejects the stream
/// outright rather than keeping the first.
pub(crate) fn decode_stream(
	data: &[u8],
	width: WordWidth,
	space: &AddressSpace,
) -> Result<Vec<MetadataEntry>, DecodeError> {
	let mut entries = Vec::new();
	let mut startup_seen = false;

	for record in OlfIterator::new(data, width) {
		let entry = decode_record(&record?, space)?;
		if entry.kind == RecordKind::ModuleStartup && std::mem::replace(&mut startup_seen, true) {
			return Err(DecodeError::DuplicateStartup);
		}
		entries.push(entry);
	}

	Ok(entries)
}
