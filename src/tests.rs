use std::io::Cursor;

use goblin::pe::header::{COFF_MACHINE_X86, COFF_MACHINE_X86_64};

use crate::*;

const BASE: u64 = 0x0040_0000;

fn words(width: WordWidth, values: &[u64]) -> Vec<u8> {
	let mut bytes = Vec::new();
	for &value in values {
		match width {
			WordWidth::W32 => bytes.extend_from_slice(&(value as u32).to_le_bytes()),
			WordWidth::W64 => bytes.extend_from_slice(&value.to_le_bytes()),
		}
	}
	bytes
}

/// One import record naming `"Foo"`/`"IDL:test/Foo:1.0"`, the end sentinel, then both
/// strings, self-contained in a single section at `va`.
fn scenario_section(width: WordWidth, base: u64, va: u32) -> Vec<u8> {
	let word = width.bytes();
	let name_off = 4 * word; // tag + two payload fields + sentinel
	let id_off = name_off + 4;
	let name_addr = base + va as u64 + name_off as u64;
	let id_addr = base + va as u64 + id_off as u64;

	let mut data = words(width, &[1, name_addr, id_addr, 0]);
	data.extend_from_slice(b"Foo\0");
	data.extend_from_slice(b"IDL:test/Foo:1.0\0");
	data
}

fn foo_import() -> MetadataEntry {
	MetadataEntry {
		kind: RecordKind::ImportInterface,
		flags: 0,
		name: "Foo".to_string(),
		interface_id: "IDL:test/Foo:1.0".to_string(),
	}
}

fn olf_section(data: &[u8], va: u32) -> Section<'_> {
	Section {
		name: METADATA_SECTION.to_string(),
		virtual_address: va,
		virtual_size: data.len() as u32,
		data,
	}
}

/// Startup record(s) pointing through a dispatch structure in the same section.
fn startup_section(width: WordWidth, base: u64, va: u32, flags: u64, records: usize) -> Vec<u8> {
	let word = width.bytes();
	let stream_words = records * 3 + 1;
	let cell_off = stream_words * word;
	let dispatch_off = cell_off + word;
	let id_off = dispatch_off + word;
	let cell_addr = base + va as u64 + cell_off as u64;

	let mut stream = Vec::new();
	for _ in 0..records {
		stream.extend([6, cell_addr, flags]);
	}
	stream.push(END_TAG);

	let mut data = words(width, &stream);
	data.extend(words(width, &[base + va as u64 + dispatch_off as u64]));
	data.extend(words(width, &[base + va as u64 + id_off as u64]));
	data.extend_from_slice(b"IDL:test/Startup:1.0\0");
	data
}

#[test]
fn import_scenario_decodes_exactly() {
	let data = scenario_section(WordWidth::W32, BASE, 0x1000);
	let module = ParsedModule {
		platform: COFF_MACHINE_X86,
		image_base: BASE,
		sections: SectionMap::new(vec![olf_section(&data, 0x1000)]),
	};

	assert_eq!(
		assemble(&module),
		ModuleMetadata {
			status: ModuleStatus::Valid,
			platform: COFF_MACHINE_X86,
			entries: vec![foo_import()],
		}
	);
}

#[test]
fn word_widths_decode_equivalently() {
	let mut decoded = Vec::new();
	for (machine, width) in [
		(COFF_MACHINE_X86, WordWidth::W32),
		(COFF_MACHINE_X86_64, WordWidth::W64),
	] {
		let data = scenario_section(width, BASE, 0x1000);
		let module = ParsedModule {
			platform: machine,
			image_base: BASE,
			sections: SectionMap::new(vec![olf_section(&data, 0x1000)]),
		};
		let metadata = assemble(&module);
		assert!(metadata.is_valid());
		decoded.push(metadata.entries);
	}

	assert_eq!(decoded[0], decoded[1]);
	assert_eq!(decoded[0], vec![foo_import()]);
}

#[test]
fn missing_metadata_section() {
	let data = [0u8; 16];
	let module = ParsedModule {
		platform: COFF_MACHINE_X86,
		image_base: BASE,
		sections: SectionMap::new(vec![Section {
			name: ".text".to_string(),
			virtual_address: 0x1000,
			virtual_size: data.len() as u32,
			data: &data,
		}]),
	};

	let metadata = assemble(&module);
	assert_eq!(metadata.status, ModuleStatus::Error("Metadata not found".to_string()));
	assert!(metadata.entries.is_empty());
}

#[test]
fn untranslatable_pointer_invalidates_the_file() {
	// a good import record followed by one whose name address maps to no section
	let word = WordWidth::W32.bytes();
	let name_off = 7 * word;
	let id_off = name_off + 4;
	let name_addr = BASE + 0x1000 + name_off as u64;
	let id_addr = BASE + 0x1000 + id_off as u64;

	let mut data = words(
		WordWidth::W32,
		&[1, name_addr, id_addr, 1, BASE + 0x9000, id_addr, 0],
	);
	data.extend_from_slice(b"Foo\0");
	data.extend_from_slice(b"IDL:test/Foo:1.0\0");

	let module = ParsedModule {
		platform: COFF_MACHINE_X86,
		image_base: BASE,
		sections: SectionMap::new(vec![olf_section(&data, 0x1000)]),
	};

	// no partial success: the whole file is classified invalid
	let metadata = assemble(&module);
	assert_eq!(metadata.status, ModuleStatus::Error("Invalid metadata".to_string()));
	assert!(metadata.entries.is_empty());
}

#[test]
fn truncated_stream_is_invalid() {
	// ends exactly at a record boundary with no sentinel
	let data = words(WordWidth::W32, &[1, BASE + 0x1000, BASE + 0x1000]);
	let module = ParsedModule {
		platform: COFF_MACHINE_X86,
		image_base: BASE,
		sections: SectionMap::new(vec![olf_section(&data, 0x1000)]),
	};

	assert_eq!(
		assemble(&module).status,
		ModuleStatus::Error("Invalid metadata".to_string())
	);
}

#[test]
fn single_startup_is_valid() {
	let data = startup_section(WordWidth::W32, BASE, 0x1000, FLAG_SINGLETON as u64, 1);
	let module = ParsedModule {
		platform: COFF_MACHINE_X86,
		image_base: BASE,
		sections: SectionMap::new(vec![olf_section(&data, 0x1000)]),
	};

	let metadata = assemble(&module);
	assert!(metadata.is_valid());
	let startup = metadata.startup().unwrap();
	assert_eq!(startup.interface_id, "IDL:test/Startup:1.0");
	assert_eq!(startup.flags, FLAG_SINGLETON);
	assert_eq!(startup.name, "");
	assert_eq!(metadata.module_type(false), ModuleType::Singleton);
}

#[test]
fn duplicate_startup_is_rejected() {
	for width in [WordWidth::W32, WordWidth::W64] {
		let data = startup_section(width, BASE, 0x1000, 0, 2);
		let machine = match width {
			WordWidth::W32 => COFF_MACHINE_X86,
			WordWidth::W64 => COFF_MACHINE_X86_64,
		};
		let module = ParsedModule {
			platform: machine,
			image_base: BASE,
			sections: SectionMap::new(vec![olf_section(&data, 0x1000)]),
		};

		assert_eq!(
			assemble(&module).status,
			ModuleStatus::Error("Invalid metadata".to_string())
		);
	}
}

fn push_str(strings: &mut Vec<u8>, va: u32, s: &str) -> u64 {
	let addr = BASE + va as u64 + strings.len() as u64;
	strings.extend_from_slice(s.as_bytes());
	strings.push(0);
	addr
}

#[test]
fn entries_keep_encounter_order() {
	let mut strings = Vec::new();
	let zebra_name = push_str(&mut strings, 0x2000, "Zebra");
	let zebra_id = push_str(&mut strings, 0x2000, "IDL:test/Zebra:1.0");
	let alpha_name = push_str(&mut strings, 0x2000, "Alpha");
	let alpha_id = push_str(&mut strings, 0x2000, "IDL:test/Alpha:1.0");

	let olf = words(
		WordWidth::W32,
		&[1, zebra_name, zebra_id, 5, alpha_name, alpha_id, 0],
	);
	let module = ParsedModule {
		platform: COFF_MACHINE_X86,
		image_base: BASE,
		sections: SectionMap::new(vec![
			olf_section(&olf, 0x1000),
			Section {
				name: ".rdata".to_string(),
				virtual_address: 0x2000,
				virtual_size: strings.len() as u32,
				data: &strings,
			},
		]),
	};

	// stream order is preserved; sorting is a presentation concern
	let metadata = assemble(&module);
	assert!(metadata.is_valid());
	let names: Vec<&str> = metadata.entries.iter().map(|entry| entry.name.as_str()).collect();
	assert_eq!(names, ["Zebra", "Alpha"]);
	assert_eq!(metadata.entries[0].kind, RecordKind::ImportInterface);
	assert_eq!(metadata.entries[1].kind, RecordKind::ImportObject);
}

#[test]
fn export_resolves_through_dispatch_structure() {
	// strings and dispatch structure live in a separate section from the records
	let mut rdata = Vec::new();
	rdata.extend_from_slice(b"Bar\0"); // 0x2000
	rdata.extend_from_slice(b"IDL:test/Bar:1.0\0"); // 0x2004
	rdata.extend(words(WordWidth::W32, &[BASE + 0x2019])); // 0x2015: interface pointer cell
	rdata.extend(words(WordWidth::W32, &[BASE + 0x2004])); // 0x2019: dispatch -> interface id

	let olf = words(WordWidth::W32, &[2, BASE + 0x2000, BASE + 0x2015, 0]);

	let module = ParsedModule {
		platform: COFF_MACHINE_X86,
		image_base: BASE,
		sections: SectionMap::new(vec![
			olf_section(&olf, 0x1000),
			Section {
				name: ".rdata".to_string(),
				virtual_address: 0x2000,
				virtual_size: rdata.len() as u32,
				data: &rdata,
			},
		]),
	};

	let metadata = assemble(&module);
	assert!(metadata.is_valid());
	assert_eq!(
		metadata.entries,
		vec![MetadataEntry {
			kind: RecordKind::ExportInterface,
			flags: 0,
			name: "Bar".to_string(),
			interface_id: "IDL:test/Bar:1.0".to_string(),
		}]
	);
}

/// A minimal COFF object: file header, section headers, raw data, then an empty string
/// table so the symbol-table pointer stays inside the file.
fn coff_module(machine: u16, sections: &[(&str, u32, u32, &[u8])]) -> Vec<u8> {
	let headers_len = 20 + 40 * sections.len();
	let raw_len: usize = sections.iter().map(|(_, _, _, data)| data.len()).sum();
	let symtab_offset = (headers_len + raw_len) as u32;

	let mut bytes = Vec::new();
	bytes.extend_from_slice(&machine.to_le_bytes());
	bytes.extend_from_slice(&(sections.len() as u16).to_le_bytes());
	bytes.extend_from_slice(&0u32.to_le_bytes()); // timestamp
	bytes.extend_from_slice(&symtab_offset.to_le_bytes());
	bytes.extend_from_slice(&0u32.to_le_bytes()); // symbol count
	bytes.extend_from_slice(&0u16.to_le_bytes()); // optional header size
	bytes.extend_from_slice(&0u16.to_le_bytes()); // characteristics

	let mut raw_offset = headers_len as u32;
	for (name, va, vsize, data) in sections {
		let mut name_bytes = [0u8; 8];
		name_bytes[..name.len()].copy_from_slice(name.as_bytes());
		bytes.extend_from_slice(&name_bytes);
		bytes.extend_from_slice(&vsize.to_le_bytes());
		bytes.extend_from_slice(&va.to_le_bytes());
		bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
		bytes.extend_from_slice(&raw_offset.to_le_bytes());
		bytes.extend_from_slice(&[0u8; 12]); // relocation/line number pointers and counts
		bytes.extend_from_slice(&0u32.to_le_bytes()); // characteristics
		raw_offset += data.len() as u32;
	}
	for (_, _, _, data) in sections {
		bytes.extend_from_slice(data);
	}
	bytes.extend_from_slice(&4u32.to_le_bytes()); // string table holds only its own length
	bytes
}

#[test]
fn coff_object_end_to_end() {
	// object files have image base 0 and leave virtual_size zero
	let olf = scenario_section(WordWidth::W32, 0, 0x1000);
	let bytes = coff_module(COFF_MACHINE_X86, &[(".olf", 0x1000, 0, &olf)]);

	let mut cursor = Cursor::new(bytes.as_slice());
	let metadata = module_metadata(&mut cursor);

	assert_eq!(metadata.platform, COFF_MACHINE_X86);
	assert!(metadata.is_valid());
	assert_eq!(metadata.entries, vec![foo_import()]);
}

#[test]
fn module_file_exposes_sections() {
	let olf = scenario_section(WordWidth::W32, 0, 0x1000);
	let bytes = coff_module(COFF_MACHINE_X86, &[(".olf", 0x1000, 0, &olf)]);

	let mut cursor = Cursor::new(bytes.as_slice());
	let module = ModuleFile::new(&mut cursor).unwrap();

	assert_eq!(module.platform(), COFF_MACHINE_X86);
	assert!(module.metadata().is_valid());
	assert_eq!(module.raw_section(METADATA_SECTION).unwrap(), olf.as_slice());
	assert!(module.raw_section(".text").is_none());
}

#[test]
fn foreign_container_is_an_error_status() {
	let mut cursor = Cursor::new(&b"\x7fELF but nothing like a real one"[..]);
	let metadata = module_metadata(&mut cursor);

	match &metadata.status {
		ModuleStatus::Error(message) => assert!(message.starts_with("Can't read module file")),
		ModuleStatus::Valid => panic!("foreign input decoded as a module"),
	}
	assert!(metadata.entries.is_empty());
}
