//! The assembled decode result for one module file, and the assembler that produces it.

use goblin::pe::header::{COFF_MACHINE_ARM64, COFF_MACHINE_X86_64};

use super::{
	address::AddressSpace,
	decode::decode_stream,
	sections::ParsedModule,
};
use crate::olf::{RecordKind, WordWidth};

/// Name of the section the build toolchain places the metadata stream in.
pub const METADATA_SECTION: &str = ".olf";

/// Startup flags bit marking a singleton module.
pub const FLAG_SINGLETON: u32 = 1;

/// One decoded metadata record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
	pub kind: RecordKind,
	pub flags: u32,
	/// Empty for startup entries.
	pub name: String,
	pub interface_id: String,
}

/// Decode outcome for one file.
///
/// Malformed input is a data outcome carried here, not a fault of the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleStatus {
	Valid,
	Error(String),
}

/// How a module presents itself to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleType {
	Unknown,
	ClassLibrary,
	Singleton,
	Executable,
	Error,
}

/// The decoded linkage metadata of one module file.
///
/// Constructed once per input file by [`assemble`] (or the higher-level
/// [`module_metadata`](crate::module_metadata)) and immutable afterwards. Entries keep
/// their stream encounter order; grouping and sorting are left to the reporting layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMetadata {
	pub status: ModuleStatus,
	/// Machine code from the container header.
	pub platform: u16,
	pub entries: Vec<MetadataEntry>,
}

impl ModuleMetadata {
	pub(crate) fn error(platform: u16, message: impl Into<String>) -> Self {
		Self {
			status: ModuleStatus::Error(message.into()),
			platform,
			entries: Vec::new(),
		}
	}

	pub fn is_valid(&self) -> bool {
		self.status == ModuleStatus::Valid
	}

	/// The startup entry, if the module has one.
	pub fn startup(&self) -> Option<&MetadataEntry> {
		self.entries
			.iter()
			.find(|entry| entry.kind == RecordKind::ModuleStartup)
	}

	/// Classifies the module from its metadata. `executable` marks files known to be
	/// program images (the CLI derives this from the file extension).
	pub fn module_type(&self, executable: bool) -> ModuleType {
		if !self.is_valid() {
			return ModuleType::Error;
		}
		match self.startup() {
			Some(startup) if startup.flags & FLAG_SINGLETON != 0 => ModuleType::Singleton,
			Some(_) => ModuleType::ClassLibrary,
			None if executable => ModuleType::Executable,
			None => ModuleType::Unknown,
		}
	}
}

/// Word width implied by a machine code: the two 64-bit machines, 32-bit otherwise.
pub(crate) fn word_width(machine: u16) -> WordWidth {
	match machine {
		COFF_MACHINE_X86_64 | COFF_MACHINE_ARM64 => WordWidth::W64,
		_ => WordWidth::W32,
	}
}

/// Decodes the metadata section of a parsed module.
///
/// Every malformed-input condition ends up in the returned status; this function does not
/// fail and nothing below it is allowed to abort the process.
pub fn assemble(module: &ParsedModule) -> ModuleMetadata {
	let platform = module.platform;
	let width = word_width(platform);

	let olf = match module.sections.by_name(METADATA_SECTION) {
		Some(section) => section,
		None => return ModuleMetadata::error(platform, "Metadata not found"),
	};

	let space = AddressSpace::new(module.image_base, width, &module.sections);
	match decode_stream(olf.data, width, &space) {
		Ok(entries) => ModuleMetadata {
			status: ModuleStatus::Valid,
			platform,
			entries,
		},
		Err(_) => ModuleMetadata::error(platform, "Invalid metadata"),
	}
}
