//! Contains the pack and unpack dispatch, which walks a compiled format
//! descriptor and drives the per-field codecs against caller values and byte
//! buffers, plus the one-shot operations built on top of it.

use std::string::FromUtf8Error;

use indexmap::IndexMap;
use log::trace;
use msb_bitstream::{BitstreamReader, BitstreamWriter};
use thiserror::Error;

use crate::field;
use crate::format::{FormatInfo, FormatParseError};
use crate::value::Value;

#[cfg(test)]
mod test;

/// An error that may happen while packing or unpacking values.
///
/// When a pack or unpack operation fails, it stops at the first error, and
/// any partial output it produced is unspecified; callers must discard it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
	/// The format string did not compile.
	#[error("invalid format string: {0}")]
	Format(#[from] FormatParseError),
	/// A pack operation received fewer values than the format has
	/// non-padding fields.
	#[error("too few values: the format has {expected} non-padding fields, got {actual}")]
	TooFewValues {
		/// The number of non-padding fields in the format.
		expected: usize,
		/// The number of values supplied.
		actual: usize
	},
	/// A named operation received fewer names than the format has
	/// non-padding fields.
	#[error("too few names: the format has {expected} non-padding fields, got {actual}")]
	TooFewNames {
		/// The number of non-padding fields in the format.
		expected: usize,
		/// The number of names supplied.
		actual: usize
	},
	/// A named pack operation found no value under the name of a field.
	#[error("no value for field \"{0}\"")]
	MissingValue(String),
	/// An integer does not fit in the signed field it was packed into.
	#[error("value {value} does not fit in a {bit_width} bit signed field")]
	SignedOutOfRange {
		/// The offending value.
		value: i128,
		/// The width of the field, in bits.
		bit_width: u32
	},
	/// An integer does not fit in the unsigned field it was packed into.
	#[error("value {value} does not fit in a {bit_width} bit unsigned field")]
	UnsignedOutOfRange {
		/// The offending value.
		value: i128,
		/// The width of the field, in bits.
		bit_width: u32
	},
	/// A value cannot be converted to the type of its field.
	#[error("expected a {expected} value, got {actual}")]
	UnexpectedValueType {
		/// The kind of value the field takes.
		expected: &'static str,
		/// The kind of value that was supplied.
		actual: &'static str
	},
	/// The UTF-8 encoding of a text value is shorter than its field.
	#[error("short text: the field takes {expected} bytes, the encoded text has {actual}")]
	ShortText {
		/// The field width, in bytes.
		expected: usize,
		/// The encoded text length, in bytes.
		actual: usize
	},
	/// A raw byte value is shorter than its field.
	#[error("short raw data: the field takes {expected} bytes, got {actual}")]
	ShortRaw {
		/// The field width, in bytes.
		expected: usize,
		/// The supplied length, in bytes.
		actual: usize
	},
	/// The bytes of an unpacked text field are not valid UTF-8.
	#[error("text field is not valid UTF-8: {0}")]
	InvalidText(#[from] FromUtf8Error),
	/// The data buffer ends before the last field does.
	#[error("short data: {needed} bits needed, {available} available")]
	ShortData {
		/// The bits the format needs, counted from the start of the buffer.
		needed: u64,
		/// The bits the buffer holds.
		available: u64
	},
	/// The destination buffer cannot hold the packed fields at the requested
	/// bit offset.
	#[error("short destination buffer: {needed} bits needed, {available} available")]
	ShortDestination {
		/// The bits the format needs, counted from the start of the buffer.
		needed: u64,
		/// The bits the buffer holds.
		available: u64
	},
	/// A byteswap group size character is not one of `1`, `2`, `4` or `8`.
	#[error("bad byteswap group size '{0}'")]
	BadSwapGroup(char)
}

/// Drives the per-field pack codecs over every field of a format, pulling
/// each non-padding field's value from the `next_value` conduit by its
/// zero-based non-padding position.
fn pack_fields<'values, 'data: 'values>(
	info: &FormatInfo,
	writer: &mut BitstreamWriter<'_>,
	mut next_value: impl FnMut(usize) -> Result<&'values Value<'data>, CodecError>
) -> Result<(), CodecError> {
	let mut consumed_values = 0;

	for field in info.fields() {
		if field.is_padding() {
			field::pack_padding(writer, field);
		} else {
			field::pack_field(writer, field, next_value(consumed_values)?)?;
			consumed_values += 1;
		}
	}

	trace!(
		"Packed {} values into {} fields",
		consumed_values,
		info.fields().len()
	);

	Ok(())
}

/// Packs fields into a fresh zeroed buffer of exactly the format's size.
fn pack_to_vec<'values, 'data: 'values>(
	info: &FormatInfo,
	next_value: impl FnMut(usize) -> Result<&'values Value<'data>, CodecError>
) -> Result<Vec<u8>, CodecError> {
	let mut packed = vec![0; info.size_in_bytes()];
	let mut writer = BitstreamWriter::new(&mut packed);

	pack_fields(info, &mut writer, next_value)?;

	Ok(packed)
}

/// Packs fields into the middle of an existing buffer, starting at an
/// arbitrary bit offset, preserving every bit outside the written range even
/// when a field fails to pack.
fn pack_into_buf<'values, 'data: 'values>(
	info: &FormatInfo,
	buf: &mut [u8],
	bit_offset: u64,
	next_value: impl FnMut(usize) -> Result<&'values Value<'data>, CodecError>
) -> Result<(), CodecError> {
	let available = 8 * buf.len() as u64;
	let needed = info.bit_width().saturating_add(bit_offset);

	if available < needed {
		return Err(CodecError::ShortDestination { needed, available });
	}

	let mut writer = BitstreamWriter::new(buf);

	writer.with_bounds(bit_offset, info.bit_width(), |writer| {
		writer.seek(bit_offset as i64);

		pack_fields(info, writer, next_value)
	})
}

/// Checks that enough positional values were supplied for a format.
fn check_value_count(info: &FormatInfo, values: &[Value<'_>]) -> Result<(), CodecError> {
	if values.len() < info.non_padding_field_count() {
		return Err(CodecError::TooFewValues {
			expected: info.non_padding_field_count(),
			actual: values.len()
		});
	}

	Ok(())
}

/// Checks that enough field names were supplied for a format.
fn check_name_count<N: AsRef<str>>(info: &FormatInfo, names: &[N]) -> Result<(), CodecError> {
	if names.len() < info.non_padding_field_count() {
		return Err(CodecError::TooFewNames {
			expected: info.non_padding_field_count(),
			actual: names.len()
		});
	}

	Ok(())
}

/// Looks the value of the `index`-th non-padding field up in a name-keyed
/// mapping.
fn mapping_conduit<'values, 'data, N: AsRef<str>>(
	names: &'values [N],
	values: &'values IndexMap<&str, Value<'data>>
) -> impl FnMut(usize) -> Result<&'values Value<'data>, CodecError> {
	move |index| {
		let name = names[index].as_ref();

		values
			.get(name)
			.ok_or_else(|| CodecError::MissingValue(name.to_owned()))
	}
}

pub(crate) fn pack_with_info(
	info: &FormatInfo,
	values: &[Value<'_>]
) -> Result<Vec<u8>, CodecError> {
	check_value_count(info, values)?;

	pack_to_vec(info, |index| Ok(&values[index]))
}

pub(crate) fn pack_into_with_info(
	info: &FormatInfo,
	buf: &mut [u8],
	bit_offset: u64,
	values: &[Value<'_>]
) -> Result<(), CodecError> {
	check_value_count(info, values)?;

	pack_into_buf(info, buf, bit_offset, |index| Ok(&values[index]))
}

pub(crate) fn pack_dict_with_info<N: AsRef<str>>(
	info: &FormatInfo,
	names: &[N],
	values: &IndexMap<&str, Value<'_>>
) -> Result<Vec<u8>, CodecError> {
	check_name_count(info, names)?;

	pack_to_vec(info, mapping_conduit(names, values))
}

pub(crate) fn pack_into_dict_with_info<N: AsRef<str>>(
	info: &FormatInfo,
	names: &[N],
	buf: &mut [u8],
	bit_offset: u64,
	values: &IndexMap<&str, Value<'_>>
) -> Result<(), CodecError> {
	check_name_count(info, names)?;

	pack_into_buf(info, buf, bit_offset, mapping_conduit(names, values))
}

pub(crate) fn unpack_with_info(
	info: &FormatInfo,
	data: &[u8],
	bit_offset: u64,
	allow_truncated: bool
) -> Result<Vec<Value<'static>>, CodecError> {
	let available = 8 * data.len() as u64;
	let needed = info.bit_width().saturating_add(bit_offset);

	if !allow_truncated && available < needed {
		return Err(CodecError::ShortData { needed, available });
	}

	// Only reachable with allow_truncated: not even the offset fits, so no
	// field does either
	if bit_offset > available {
		return Ok(Vec::new());
	}

	let mut reader = BitstreamReader::new(data);
	reader.seek(bit_offset as i64);

	let mut values = Vec::with_capacity(info.non_padding_field_count());

	for field in info.fields() {
		// A field counts only if its bit extent fits entirely in the data
		if available - reader.tell() < u64::from(field.bit_width) {
			if allow_truncated {
				break;
			}

			return Err(CodecError::ShortData { needed, available });
		}

		if let Some(value) = field::unpack_field(&mut reader, field)? {
			values.push(value);
		}
	}

	trace!(
		"Unpacked {} values from {} fields",
		values.len(),
		info.fields().len()
	);

	Ok(values)
}

pub(crate) fn unpack_dict_with_info<N: AsRef<str>>(
	info: &FormatInfo,
	names: &[N],
	data: &[u8],
	bit_offset: u64,
	allow_truncated: bool
) -> Result<IndexMap<String, Value<'static>>, CodecError> {
	check_name_count(info, names)?;

	let values = unpack_with_info(info, data, bit_offset, allow_truncated)?;

	Ok(names
		.iter()
		.map(|name| name.as_ref().to_owned())
		.zip(values)
		.collect())
}

/// Packs the specified values into a new byte buffer as the fields the format
/// string describes, in order, first field in the most significant bits of
/// the first byte.
///
/// Values are consumed positionally by the non-padding fields; supernumerary
/// values are ignored. The returned buffer is the total field width rounded
/// up to whole bytes, with any trailing bits of its last byte zeroed.
pub fn pack(format: &str, values: &[Value<'_>]) -> Result<Vec<u8>, CodecError> {
	pack_with_info(&FormatInfo::parse(format)?, values)
}

/// Packs the specified values into `buf` starting at the specified bit
/// offset, leaving every bit outside the written range untouched.
pub fn pack_into(
	format: &str,
	buf: &mut [u8],
	bit_offset: u64,
	values: &[Value<'_>]
) -> Result<(), CodecError> {
	pack_into_with_info(&FormatInfo::parse(format)?, buf, bit_offset, values)
}

/// Unpacks the fields the format string describes from the start of `data`,
/// returning the values of its non-padding fields in order.
///
/// With `allow_truncated`, data shorter than the format is not an error:
/// unpacking stops before the first field whose bit extent does not fit
/// entirely in the data, and the values produced so far are returned.
pub fn unpack(
	format: &str,
	data: &[u8],
	allow_truncated: bool
) -> Result<Vec<Value<'static>>, CodecError> {
	unpack_with_info(&FormatInfo::parse(format)?, data, 0, allow_truncated)
}

/// As [`unpack`], but starts reading at the specified bit offset into `data`.
pub fn unpack_from(
	format: &str,
	data: &[u8],
	bit_offset: u64,
	allow_truncated: bool
) -> Result<Vec<Value<'static>>, CodecError> {
	unpack_with_info(&FormatInfo::parse(format)?, data, bit_offset, allow_truncated)
}

/// As [`pack`], but the non-padding fields take their values from a mapping
/// instead of a positional list: the `index`-th non-padding field is packed
/// from `values[names[index]]`. A name with no value in the mapping is an
/// error.
pub fn pack_dict(
	format: &str,
	names: &[&str],
	values: &IndexMap<&str, Value<'_>>
) -> Result<Vec<u8>, CodecError> {
	pack_dict_with_info(&FormatInfo::parse(format)?, names, values)
}

/// As [`pack_into`], with the values taken from a mapping as in
/// [`pack_dict`].
pub fn pack_into_dict(
	format: &str,
	names: &[&str],
	buf: &mut [u8],
	bit_offset: u64,
	values: &IndexMap<&str, Value<'_>>
) -> Result<(), CodecError> {
	pack_into_dict_with_info(&FormatInfo::parse(format)?, names, buf, bit_offset, values)
}

/// As [`unpack`], but returns the values in a mapping keyed by the specified
/// field names, in field order.
pub fn unpack_dict(
	format: &str,
	names: &[&str],
	data: &[u8],
	allow_truncated: bool
) -> Result<IndexMap<String, Value<'static>>, CodecError> {
	unpack_dict_with_info(&FormatInfo::parse(format)?, names, data, 0, allow_truncated)
}

/// As [`unpack_dict`], but starts reading at the specified bit offset into
/// `data`.
pub fn unpack_from_dict(
	format: &str,
	names: &[&str],
	data: &[u8],
	bit_offset: u64,
	allow_truncated: bool
) -> Result<IndexMap<String, Value<'static>>, CodecError> {
	unpack_dict_with_info(&FormatInfo::parse(format)?, names, data, bit_offset, allow_truncated)
}

/// Returns the number of bits the fields of the format string add up to.
pub fn size_in_bits(format: &str) -> Result<u64, FormatParseError> {
	Ok(FormatInfo::parse(format)?.bit_width())
}
