use super::*;
use crate::read::sections::{Section, SectionMap};

pub(super) fn parse_module<'a>(bytes: &'a [u8], pe: &goblin::pe::PE<'a>) -> ParsedModule<'a> {
	let sections = pe
		.sections
		.iter()
		.map(|section| Section {
			name: section_name(&section.name),
			virtual_address: section.virtual_address,
			virtual_size: effective_virtual_size(section.virtual_size, section.size_of_raw_data),
			data: section_data(bytes, section.pointer_to_raw_data, section.size_of_raw_data),
		})
		.collect();

	ParsedModule {
		platform: pe.header.coff_header.machine,
		image_base: pe.image_base as u64,
		sections: SectionMap::new(sections),
	}
}
