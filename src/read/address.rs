//! Bounds-checked translation of module-relative virtual addresses back into file bytes.
//!
//! This is the single trust boundary of the decoder: every string pointer and indirect
//! interface pointer in the record stream passes through [`AddressSpace::translate`]
//! before it is dereferenced. A pointer that leaves the mapped ranges produces a typed
//! error, never an out-of-bounds read.

use super::sections::SectionMap;
use crate::olf::WordWidth;

/// A virtual address that cannot be resolved to bytes of the file.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrError {
	/// No section covers the address, or the addressed data runs past the end of its
	/// section's raw bytes.
	#[error("can not translate address {0:#x}")]
	Untranslatable(u64),
}

/// A module's virtual address space: image base plus section table.
pub struct AddressSpace<'a, 'data> {
	image_base: u64,
	width: WordWidth,
	sections: &'a SectionMap<'data>,
}

impl<'a, 'data> AddressSpace<'a, 'data> {
	pub fn new(image_base: u64, width: WordWidth, sections: &'a SectionMap<'data>) -> Self {
		Self {
			image_base,
			width,
			sections,
		}
	}

	/// Resolves a virtual address to the owning section's raw bytes, starting at the
	/// addressed byte and running to the end of the section's data.
	///
	/// The image-base-relative offset must be representable in the container's 32-bit
	/// address convention and fall inside a section's virtual range and stored data.
	pub fn translate(&self, addr: u64) -> Result<&'data [u8], AddrError> {
		let err = AddrError::Untranslatable(addr);
		let offset = addr.checked_sub(self.image_base).ok_or(err)?;
		let va = u32::try_from(offset).map_err(|_| err)?;
		let section = self.sections.find(va).ok_or(err)?;
		let start = (va - section.virtual_address) as usize;
		match section.data.get(start..) {
			Some(data) if !data.is_empty() => Ok(data),
			_ => Err(err),
		}
	}

	/// Reads one word-sized value at a virtual address.
	pub fn read_word(&self, addr: u64) -> Result<u64, AddrError> {
		let data = self.translate(addr)?;
		self.width.read(data).ok_or(AddrError::Untranslatable(addr))
	}

	/// Reads a NUL-terminated string at a virtual address.
	///
	/// The terminator must appear before the owning section's data ends.
	pub fn read_string(&self, addr: u64) -> Result<String, AddrError> {
		let data = self.translate(addr)?;
		let nul = data
			.iter()
			.position(|&b| b == 0)
			.ok_or(AddrError::Untranslatable(addr))?;
		Ok(String::from_utf8_lossy(&data[..nul]).into_owned())
	}

	/// Resolves an export's interface id through its dispatch structure: `addr` points at
	/// an interface pointer whose target's first field is the interface-id string pointer.
	///
	/// Malformed binaries surface here more than anywhere else; each of the three hops is
	/// translated independently.
	pub fn resolve_interface_id(&self, addr: u64) -> Result<String, AddrError> {
		let itf = self.read_word(addr)?;
		let interface_id = self.read_word(itf)?;
		self.read_string(interface_id)
	}
}
