//! Human-readable rendering of a module's metadata.
//!
//! The decoding core is output-format agnostic and keeps entries in stream order;
//! everything about grouping, sorting and labels lives here.

use std::io::{self, Write};

use goblin::pe::header::{
	COFF_MACHINE_ARM, COFF_MACHINE_ARM64, COFF_MACHINE_ARMNT, COFF_MACHINE_X86,
	COFF_MACHINE_X86_64,
};

use crate::{MetadataEntry, ModuleMetadata, ModuleStatus, ModuleType, RecordKind};

/// Human-readable label for a machine code.
pub fn platform_label(machine: u16) -> String {
	match machine {
		COFF_MACHINE_X86 => "x86".to_string(),
		COFF_MACHINE_X86_64 => "x64".to_string(),
		COFF_MACHINE_ARM | COFF_MACHINE_ARMNT => "ARM".to_string(),
		COFF_MACHINE_ARM64 => "ARM64".to_string(),
		other => format!("{other:#06x}"),
	}
}

fn type_label(module_type: ModuleType) -> &'static str {
	match module_type {
		ModuleType::Unknown => "unknown",
		ModuleType::ClassLibrary => "class library",
		ModuleType::Singleton => "singleton",
		ModuleType::Executable => "executable",
		ModuleType::Error => "error",
	}
}

fn group_label(kind: RecordKind) -> &'static str {
	match kind {
		RecordKind::ImportInterface => "Imported interfaces",
		RecordKind::ImportObject => "Imported objects",
		RecordKind::ExportInterface => "Exported interfaces",
		RecordKind::ExportObject => "Exported objects",
		RecordKind::ExportLocal => "Exported local objects",
		RecordKind::ModuleStartup => "Startup",
	}
}

/// Writes the report for one module: platform, type, entries grouped by kind and sorted
/// by name within each group, and the startup binding last.
///
/// `executable` marks files known to be program images.
pub fn write_report<W: Write>(out: &mut W, metadata: &ModuleMetadata, executable: bool) -> io::Result<()> {
	if let ModuleStatus::Error(message) = &metadata.status {
		return writeln!(out, "Error: {message}");
	}

	writeln!(out, "Platform: {}", platform_label(metadata.platform))?;
	writeln!(out, "Module type: {}", type_label(metadata.module_type(executable)))?;

	const GROUPS: [RecordKind; 5] = [
		RecordKind::ImportInterface,
		RecordKind::ImportObject,
		RecordKind::ExportInterface,
		RecordKind::ExportObject,
		RecordKind::ExportLocal,
	];
	for kind in GROUPS {
		let mut group: Vec<&MetadataEntry> =
			metadata.entries.iter().filter(|entry| entry.kind == kind).collect();
		if group.is_empty() {
			continue;
		}
		group.sort_by(|a, b| a.name.cmp(&b.name));

		writeln!(out, "{}:", group_label(kind))?;
		for entry in group {
			writeln!(out, "  {}: {}", entry.name, entry.interface_id)?;
		}
	}

	if let Some(startup) = metadata.startup() {
		writeln!(out, "Startup: {} (flags {:#x})", startup.interface_id, startup.flags)?;
	}

	Ok(())
}
