//! olfmeta decodes the linkage metadata that a component build toolchain embeds in the `.olf`
//! section of its modules.
//!
//! A module records the interfaces and objects it imports, the interfaces and objects it
//! exports and an optional startup binding as a stream of fixed-shape, word-size-dependent
//! records. The pointer fields inside those records are virtual addresses; olfmeta translates
//! every one of them back into file bytes through a range-checked section map instead of
//! trusting the embedded offsets, so arbitrary (possibly corrupt or foreign) binaries can be
//! inspected safely.
//!
//! olfmeta reads PE images and bare COFF objects, in both 32-bit and 64-bit word widths.
//!
//! # Usage
//!
//! ```no_run
//! // Open a module file from the filesystem.
//! let mut binary: std::fs::File = olfmeta::open_binary("module.dll").unwrap();
//!
//! // Alternatively, work directly on a memory buffer using a `std::io::Cursor`.
//! let bytes: Vec<u8> = std::fs::read("module.dll").unwrap();
//! let mut binary = std::io::Cursor::new(bytes.as_slice());
//!
//! // Malformed metadata is reported through the status, never as a panic.
//! let metadata = olfmeta::module_metadata(&mut binary);
//! olfmeta::report::write_report(&mut std::io::stdout(), &metadata, false).unwrap();
//! ```

#[cfg(test)]
mod tests;

mod olf;
mod read;
pub mod report;

/// Errors that can occur while opening and parsing a module file.
///
/// These cover the container layer only. Anything wrong *inside* the metadata section is a
/// property of the input file, not a fault, and is reported through
/// [`ModuleMetadata::status`](ModuleStatus).
#[derive(thiserror::Error, Debug)]
pub enum Error {
	/// An error occured whilst parsing the executable format.
	#[error("{0}")]
	Goblin(#[from] goblin::error::Error),

	/// The executable format is not recognised
	#[error("Unknown binary format")]
	Unrecognised,

	/// I/O error
	#[error("I/O error: {0}")]
	IoError(#[from] std::io::Error),
}

// Public exports
pub use goblin;

pub use olf::{OlfIterator, RawRecord, RecordKind, StreamError, WordWidth, END_TAG};

pub use read::{
	address::{AddrError, AddressSpace},
	decode::{decode_record, DecodeError},
	metadata::{
		assemble, MetadataEntry, ModuleMetadata, ModuleStatus, ModuleType, FLAG_SINGLETON,
		METADATA_SECTION,
	},
	module_metadata, open_binary,
	sections::{ParsedModule, Section, SectionMap},
	ModuleFile,
};

/// A handle to a binary module file that olfmeta can read.
///
/// ## Implementors
///
/// [`std::fs::File`]
///
/// [`std::io::Cursor<&[u8]>`](https://doc.rust-lang.org/stable/std/io/struct.Cursor.html)
///
/// ## Example
///
/// ```no_run
/// // Open a module file for use with olfmeta
/// let mut file: std::fs::File = olfmeta::open_binary("module.dll").unwrap();
///
/// // Alternatively, use a memory buffer
/// let memory: Vec<u8> = std::fs::read("module.dll").unwrap();
/// let mut memory = std::io::Cursor::new(memory.as_slice());
/// ```
pub trait BinaryHandle<'a>: read::io::BinaryHandle<'a> {}
impl<'a, PRIVATE: read::io::BinaryHandle<'a>> BinaryHandle<'a> for PRIVATE {}
