//! Contains the precompiled format handles, which parse a format string once
//! and reuse the compiled descriptor across any number of pack and unpack
//! operations.

use indexmap::IndexMap;

use crate::codec::{self, CodecError};
use crate::format::{FormatInfo, FormatParseError};
use crate::value::Value;

/// A format string compiled once, for repeated packing and unpacking of the
/// same record layout.
///
/// The handle holds no mutable state: shared references to it may pack and
/// unpack concurrently from any number of threads. Cloning it yields an
/// independent handle with an identical descriptor.
///
/// To persist a handle across process boundaries, store the string returned
/// by [`format`](Self::format) and compile it again with
/// [`new`](Self::new); the descriptor itself has no serialized form.
#[derive(Clone, Debug)]
pub struct CompiledFormat {
	info: FormatInfo,
	format: String
}

impl CompiledFormat {
	/// Compiles the specified format string.
	pub fn new(format: &str) -> Result<Self, FormatParseError> {
		Ok(Self {
			info: FormatInfo::parse(format)?,
			format: format.to_owned()
		})
	}

	/// Packs the specified values into a new byte buffer. See
	/// [`pack`](crate::pack).
	pub fn pack(&self, values: &[Value<'_>]) -> Result<Vec<u8>, CodecError> {
		codec::pack_with_info(&self.info, values)
	}

	/// Packs the specified values into `buf` at the specified bit offset,
	/// preserving the bits outside the written range. See
	/// [`pack_into`](crate::pack_into).
	pub fn pack_into(
		&self,
		buf: &mut [u8],
		bit_offset: u64,
		values: &[Value<'_>]
	) -> Result<(), CodecError> {
		codec::pack_into_with_info(&self.info, buf, bit_offset, values)
	}

	/// Unpacks the non-padding field values from the start of `data`. See
	/// [`unpack`](crate::unpack).
	pub fn unpack(
		&self,
		data: &[u8],
		allow_truncated: bool
	) -> Result<Vec<Value<'static>>, CodecError> {
		codec::unpack_with_info(&self.info, data, 0, allow_truncated)
	}

	/// Unpacks the non-padding field values starting at the specified bit
	/// offset into `data`. See [`unpack_from`](crate::unpack_from).
	pub fn unpack_from(
		&self,
		data: &[u8],
		bit_offset: u64,
		allow_truncated: bool
	) -> Result<Vec<Value<'static>>, CodecError> {
		codec::unpack_with_info(&self.info, data, bit_offset, allow_truncated)
	}

	/// The number of bits the fields of this format add up to.
	pub fn size_in_bits(&self) -> u64 {
		self.info.bit_width()
	}

	/// The format string this handle was compiled from.
	pub fn format(&self) -> &str {
		&self.format
	}
}

/// A format string and field name list compiled once, for repeated packing
/// and unpacking of the same record layout through name-keyed mappings.
///
/// The same sharing, cloning and persistence properties as
/// [`CompiledFormat`] apply; persistence additionally stores the name list
/// returned by [`names`](Self::names).
#[derive(Clone, Debug)]
pub struct CompiledFormatDict {
	info: FormatInfo,
	format: String,
	names: Vec<String>
}

impl CompiledFormatDict {
	/// Compiles the specified format string with the specified field names,
	/// consumed by the non-padding fields in declaration order.
	///
	/// The name list must have at least as many entries as the format has
	/// non-padding fields.
	pub fn new(format: &str, names: &[&str]) -> Result<Self, CodecError> {
		let info = FormatInfo::parse(format)?;

		if names.len() < info.non_padding_field_count() {
			return Err(CodecError::TooFewNames {
				expected: info.non_padding_field_count(),
				actual: names.len()
			});
		}

		Ok(Self {
			info,
			format: format.to_owned(),
			names: names.iter().map(|&name| name.to_owned()).collect()
		})
	}

	/// Packs the values under this handle's field names into a new byte
	/// buffer. See [`pack_dict`](crate::pack_dict).
	pub fn pack(&self, values: &IndexMap<&str, Value<'_>>) -> Result<Vec<u8>, CodecError> {
		codec::pack_dict_with_info(&self.info, &self.names, values)
	}

	/// Packs the values under this handle's field names into `buf` at the
	/// specified bit offset, preserving the bits outside the written range.
	/// See [`pack_into_dict`](crate::pack_into_dict).
	pub fn pack_into(
		&self,
		buf: &mut [u8],
		bit_offset: u64,
		values: &IndexMap<&str, Value<'_>>
	) -> Result<(), CodecError> {
		codec::pack_into_dict_with_info(&self.info, &self.names, buf, bit_offset, values)
	}

	/// Unpacks the non-padding field values from the start of `data` into a
	/// mapping keyed by this handle's field names. See
	/// [`unpack_dict`](crate::unpack_dict).
	pub fn unpack(
		&self,
		data: &[u8],
		allow_truncated: bool
	) -> Result<IndexMap<String, Value<'static>>, CodecError> {
		codec::unpack_dict_with_info(&self.info, &self.names, data, 0, allow_truncated)
	}

	/// Unpacks the non-padding field values starting at the specified bit
	/// offset into `data`, into a mapping keyed by this handle's field names.
	/// See [`unpack_from_dict`](crate::unpack_from_dict).
	pub fn unpack_from(
		&self,
		data: &[u8],
		bit_offset: u64,
		allow_truncated: bool
	) -> Result<IndexMap<String, Value<'static>>, CodecError> {
		codec::unpack_dict_with_info(&self.info, &self.names, data, bit_offset, allow_truncated)
	}

	/// The number of bits the fields of this format add up to.
	pub fn size_in_bits(&self) -> u64 {
		self.info.bit_width()
	}

	/// The format string this handle was compiled from.
	pub fn format(&self) -> &str {
		&self.format
	}

	/// The field names of this handle, in the order the non-padding fields
	/// consume them.
	pub fn names(&self) -> &[String] {
		&self.names
	}
}
