use super::sections::ParsedModule;
use crate::Error;

mod coff;
mod pe;

/// Builds the core's view of the container: platform code, image base and section table.
///
/// The accepted container family is PE images and bare COFF objects. goblin does not
/// detect bare COFF, so unknown objects get one COFF parse attempt before being rejected;
/// every other object kind is not a module format olfmeta reads.
pub(super) fn parse_module<'a>(
	bytes: &'a [u8],
	object: &goblin::Object<'a>,
) -> Result<ParsedModule<'a>, Error> {
	match object {
		goblin::Object::PE(pe) => Ok(pe::parse_module(bytes, pe)),

		goblin::Object::Unknown(_) => {
			if let Ok(coff) = goblin::pe::Coff::parse(bytes) {
				return Ok(coff::parse_module(bytes, &coff));
			}
			Err(Error::Unrecognised)
		}

		_ => Err(Error::Unrecognised),
	}
}

/// Section name field as text, trimmed at the first NUL.
fn section_name(raw: &[u8; 8]) -> String {
	let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
	String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// A section header's raw bytes, bounds-checked against the file buffer.
///
/// Headers with raw ranges outside the file get empty data rather than an abort; any
/// address resolved into such a section then fails translation.
fn section_data(bytes: &[u8], pointer_to_raw_data: u32, size_of_raw_data: u32) -> &[u8] {
	let start = pointer_to_raw_data as usize;
	start
		.checked_add(size_of_raw_data as usize)
		.and_then(|end| bytes.get(start..end))
		.unwrap_or(&[])
}

/// Object files leave `virtual_size` zero; the raw size is the section's extent then.
fn effective_virtual_size(virtual_size: u32, size_of_raw_data: u32) -> u32 {
	if virtual_size == 0 {
		size_of_raw_data
	} else {
		virtual_size
	}
}
