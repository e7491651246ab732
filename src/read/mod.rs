pub(crate) mod address;
pub(crate) mod decode;
mod formats;
pub(crate) mod io;
pub(crate) mod metadata;
pub(crate) mod sections;

use std::borrow::Cow;

use io::BinaryHandle;
use metadata::ModuleMetadata;

use crate::Error;

/// Opens a binary file in read-only mode.
///
/// The returned [`std::fs::File`] is suitable for use with [`ModuleFile`].
pub fn open_binary<P: AsRef<std::path::Path>>(path: P) -> Result<std::fs::File, Error> {
	Ok(std::fs::OpenOptions::new().read(true).open(path)?)
}

#[ouroboros::self_referencing]
struct OwnedObject<'a, IO>
where
	IO: BinaryHandle<'a>,
{
	handle: &'a mut IO,

	#[borrows(handle)]
	#[covariant]
	bytes: Cow<'this, [u8]>,

	#[borrows(bytes)]
	#[covariant]
	object: goblin::Object<'this>,
}

#[must_use]
/// A module file opened for metadata extraction.
///
/// ## Example
///
/// ```no_run
/// let mut binary = olfmeta::open_binary("module.dll").unwrap();
/// let module = olfmeta::ModuleFile::new(&mut binary).unwrap();
///
/// println!("platform {:#06x}", module.platform());
/// for entry in &module.metadata().entries {
///     println!("{:?} {} {}", entry.kind, entry.name, entry.interface_id);
/// }
/// ```
pub struct ModuleFile<'a, IO>
where
	IO: BinaryHandle<'a>,
{
	object: OwnedObject<'a, IO>,
	metadata: ModuleMetadata,
}

impl<'a, IO> ModuleFile<'a, IO>
where
	IO: BinaryHandle<'a>,
{
	/// Parses the container and decodes its metadata section.
	///
	/// Errors here mean the container itself could not be read or recognised; a malformed
	/// metadata section is reported through [`ModuleMetadata::status`] instead.
	///
	/// The handle must implement [`BinaryHandle`](crate::BinaryHandle)!
	pub fn new(handle: &'a mut IO) -> Result<ModuleFile<'a, IO>, Error> {
		let bytes = handle.get_memory()?;

		let object = OwnedObjectTryBuilder {
			handle,
			bytes_builder: |handle| Ok(bytes.map(Cow::Owned).or_else(|| handle.get_memory_ref().map(Cow::Borrowed)).unwrap()),
			object_builder: |bytes| Ok::<_, Error>(goblin::Object::parse(bytes.as_ref())?),
		}
		.try_build()?;

		let metadata = {
			let parsed = formats::parse_module(object.borrow_bytes().as_ref(), object.borrow_object())?;
			metadata::assemble(&parsed)
		};

		Ok(ModuleFile { object, metadata })
	}

	/// The decoded metadata.
	pub fn metadata(&self) -> &ModuleMetadata {
		&self.metadata
	}

	pub fn into_metadata(self) -> ModuleMetadata {
		self.metadata
	}

	/// Machine code of the container header.
	pub fn platform(&self) -> u16 {
		self.metadata.platform
	}

	/// Raw bytes of a named section, if the container has one.
	pub fn raw_section(&self, name: &str) -> Option<&[u8]> {
		let parsed = formats::parse_module(self.object.borrow_bytes().as_ref(), self.object.borrow_object()).ok()?;
		parsed.sections.by_name(name).map(|section| section.data)
	}
}

/// Reads one module file end to end, classifying every failure into the returned status.
///
/// This never fails and never panics on malformed, truncated or foreign input: a file
/// that cannot be opened, parsed or decoded yields an error status, and the caller gets
/// either a full result or a one-line diagnostic.
pub fn module_metadata<'a, IO>(handle: &'a mut IO) -> ModuleMetadata
where
	IO: BinaryHandle<'a>,
{
	match ModuleFile::new(handle) {
		Ok(module) => module.into_metadata(),
		Err(err) => ModuleMetadata::error(0, format!("Can't read module file: {err}")),
	}
}
