use super::*;
use crate::read::sections::{Section, SectionMap};

pub(super) fn parse_module<'a>(bytes: &'a [u8], coff: &goblin::pe::Coff<'a>) -> ParsedModule<'a> {
	let sections = coff
		.sections
		.iter()
		.map(|section| Section {
			name: section_name(&section.name),
			virtual_address: section.virtual_address,
			virtual_size: effective_virtual_size(section.virtual_size, section.size_of_raw_data),
			data: section_data(bytes, section.pointer_to_raw_data, section.size_of_raw_data),
		})
		.collect();

	// object files are not based anywhere; their section addresses are absolute
	ParsedModule {
		platform: coff.header.machine,
		image_base: 0,
		sections: SectionMap::new(sections),
	}
}
