//! Contains the per-field codecs: the conversions between one semantic
//! [`Value`] and the raw bits of one field, driven by the dispatch loops in
//! [`crate::codec`].

use std::borrow::Cow;

use msb_bitstream::{BitstreamReader, BitstreamWriter};

use crate::codec::CodecError;
use crate::format::{FieldCodec, FieldInfo};
use crate::value::Value;

#[cfg(test)]
mod test;

/// Packs one non-padding field: checks that `value` is convertible to the
/// field type and within its range, then emits its bits at the writer cursor.
pub(crate) fn pack_field(
	writer: &mut BitstreamWriter<'_>,
	field: &FieldInfo,
	value: &Value<'_>
) -> Result<(), CodecError> {
	match field.codec {
		FieldCodec::Signed { min, max } => {
			let signed = match *value {
				Value::Signed(signed) => {
					if signed < min || signed > max {
						return Err(CodecError::SignedOutOfRange {
							value: signed.into(),
							bit_width: field.bit_width
						});
					}

					signed
				}
				// max is never negative, so an unsigned value fits iff
				// it does not exceed it
				Value::Unsigned(unsigned) => {
					if unsigned > max as u64 {
						return Err(CodecError::SignedOutOfRange {
							value: unsigned.into(),
							bit_width: field.bit_width
						});
					}

					unsigned as i64
				}
				ref value => {
					return Err(CodecError::UnexpectedValueType {
						expected: "integer",
						actual: value.kind_name()
					});
				}
			};

			let mut bits = signed as u64;

			if field.bit_width < 64 {
				bits &= (1 << field.bit_width) - 1;
			}

			writer.write_u64_bits(bits, field.bit_width);
		}
		FieldCodec::Unsigned { max } => {
			let unsigned = match *value {
				Value::Unsigned(unsigned) => {
					if unsigned > max {
						return Err(CodecError::UnsignedOutOfRange {
							value: unsigned.into(),
							bit_width: field.bit_width
						});
					}

					unsigned
				}
				Value::Signed(signed) => {
					if signed < 0 || signed as u64 > max {
						return Err(CodecError::UnsignedOutOfRange {
							value: signed.into(),
							bit_width: field.bit_width
						});
					}

					signed as u64
				}
				ref value => {
					return Err(CodecError::UnexpectedValueType {
						expected: "integer",
						actual: value.kind_name()
					});
				}
			};

			writer.write_u64_bits(unsigned, field.bit_width);
		}
		FieldCodec::Bool => {
			let Value::Bool(flag) = value else {
				return Err(CodecError::UnexpectedValueType {
					expected: "boolean",
					actual: value.kind_name()
				});
			};

			writer.write_u64_bits(u64::from(*flag), field.bit_width);
		}
		FieldCodec::Float16 => {
			let Value::Float(float) = value else {
				return Err(CodecError::UnexpectedValueType {
					expected: "float",
					actual: value.kind_name()
				});
			};

			writer.write_bytes(&float16_pack(*float).to_be_bytes());
		}
		FieldCodec::Float32 => {
			let Value::Float(float) = value else {
				return Err(CodecError::UnexpectedValueType {
					expected: "float",
					actual: value.kind_name()
				});
			};

			writer.write_u32((*float as f32).to_bits());
		}
		FieldCodec::Float64 => {
			let Value::Float(float) = value else {
				return Err(CodecError::UnexpectedValueType {
					expected: "float",
					actual: value.kind_name()
				});
			};

			writer.write_u64_bits(float.to_bits(), 64);
		}
		FieldCodec::Text => {
			let Value::Text(text) = value else {
				return Err(CodecError::UnexpectedValueType {
					expected: "text",
					actual: value.kind_name()
				});
			};

			let byte_width = (field.bit_width / 8) as usize;
			let bytes = text.as_bytes();

			// Longer text is silently cut at the field width; shorter text
			// cannot fill the field
			if bytes.len() < byte_width {
				return Err(CodecError::ShortText {
					expected: byte_width,
					actual: bytes.len()
				});
			}

			writer.write_bytes(&bytes[..byte_width]);
		}
		FieldCodec::Raw => {
			let Value::Raw(bytes) = value else {
				return Err(CodecError::UnexpectedValueType {
					expected: "raw bytes",
					actual: value.kind_name()
				});
			};

			let byte_width = (field.bit_width / 8) as usize;

			if bytes.len() < byte_width {
				return Err(CodecError::ShortRaw {
					expected: byte_width,
					actual: bytes.len()
				});
			}

			writer.write_bytes(&bytes[..byte_width]);
		}
		FieldCodec::ZeroPadding | FieldCodec::OnePadding => pack_padding(writer, field)
	}

	Ok(())
}

/// Emits the fixed bits of a padding field at the writer cursor. Padding
/// consumes no value.
pub(crate) fn pack_padding(writer: &mut BitstreamWriter<'_>, field: &FieldInfo) {
	writer.write_repeated_bit(
		field.codec == FieldCodec::OnePadding,
		u64::from(field.bit_width)
	);
}

/// Unpacks one field at the reader cursor. Padding fields are skipped over
/// and yield `None`; every other field yields its semantic value.
pub(crate) fn unpack_field(
	reader: &mut BitstreamReader<'_>,
	field: &FieldInfo
) -> Result<Option<Value<'static>>, CodecError> {
	let value = match field.codec {
		FieldCodec::Signed { .. } => {
			let raw = reader.read_u64_bits(field.bit_width);

			Value::Signed(sign_extend(raw, field.bit_width))
		}
		FieldCodec::Unsigned { .. } => Value::Unsigned(reader.read_u64_bits(field.bit_width)),
		FieldCodec::Bool => Value::Bool(reader.read_u64_bits(field.bit_width) != 0),
		FieldCodec::Float16 => {
			let mut bytes = [0u8; 2];
			reader.read_bytes(&mut bytes);

			Value::Float(float16_unpack(u16::from_be_bytes(bytes)))
		}
		FieldCodec::Float32 => Value::Float(f64::from(f32::from_bits(reader.read_u32()))),
		FieldCodec::Float64 => Value::Float(f64::from_bits(reader.read_u64())),
		FieldCodec::Text => {
			let mut bytes = vec![0; (field.bit_width / 8) as usize];
			reader.read_bytes(&mut bytes);

			Value::Text(Cow::Owned(String::from_utf8(bytes)?))
		}
		FieldCodec::Raw => {
			let mut bytes = vec![0; (field.bit_width / 8) as usize];
			reader.read_bytes(&mut bytes);

			Value::Raw(Cow::Owned(bytes))
		}
		FieldCodec::ZeroPadding | FieldCodec::OnePadding => {
			reader.seek(i64::from(field.bit_width));

			return Ok(None);
		}
	};

	Ok(Some(value))
}

/// Converts the specified variable-width signed integer in an unsigned
/// constant-size word to a native 64-bit signed integer.
const fn sign_extend(integer: u64, bit_width: u32) -> i64 {
	let extended_bits = 64 - bit_width;
	(integer as i64) << extended_bits >> extended_bits
}

/// Converts the specified double-precision floating point number to the
/// 16-bit IEEE 754 binary16 interchange format.
///
/// The binary16 format differs from the IEEE 754 binary32 floating point
/// number type in the following aspects:
///
/// - 10-bit mantissa (significand) vs. 23-bit in binary32.
/// - 5-bit exponent vs. 8-bit in binary32.
/// - 15 exponent bias vs. 127 in binary32.
///
/// The narrowing happens in two rounding steps: the `as f32` cast first, then
/// the mantissa truncation to 10 bits, rounding to nearest with ties to even.
/// Values whose magnitude exceeds the largest representable binary16 value
/// (65504) convert to an infinity of the same sign, and NaNs stay NaNs.
fn float16_pack(float: f64) -> u16 {
	let single = (float as f32).to_bits();

	let sign = ((single >> 16) & 0x8000) as u16;
	let exponent = ((single >> 23) & 0xFF) as i32 - 127;
	let mantissa = single & 0x7F_FFFF;

	// Infinities and NaNs have all exponent bits set. A NaN payload that
	// would truncate away entirely gets the quiet bit instead, so the
	// result still reads back as a NaN
	if exponent == 128 {
		let payload = (mantissa >> 13) as u16;

		return if mantissa != 0 && payload == 0 {
			sign | 0x7E00
		} else {
			sign | 0x7C00 | payload
		};
	}

	// Too large for the 5-bit exponent: saturate to infinity
	if exponent > 15 {
		return sign | 0x7C00;
	}

	// Normal halves. Round the 13 truncated mantissa bits to nearest, ties
	// to even; the increment may carry into the exponent, which yields the
	// next binade (or infinity) as it should
	if exponent >= -14 {
		let half = sign | (((exponent + 15) as u16) << 10) | (mantissa >> 13) as u16;
		let round_bits = mantissa & 0x1FFF;

		return if round_bits > 0x1000 || (round_bits == 0x1000 && half & 1 == 1) {
			half + 1
		} else {
			half
		};
	}

	// Subnormal halves, whose fixed scale is 2^-24 per mantissa unit. Shift
	// the significand (with its implicit bit restored) down to that scale,
	// rounding as above. Exponent -25 still rounds up to the smallest
	// subnormal for mantissas past the halfway point
	if exponent >= -25 {
		let mantissa = mantissa | 0x80_0000;
		let shift = (-exponent - 1) as u32;
		let half = sign | (mantissa >> shift) as u16;
		let halfway = 1 << (shift - 1);
		let round_bits = mantissa & ((1 << shift) - 1);

		return if round_bits > halfway || (round_bits == halfway && half & 1 == 1) {
			half + 1
		} else {
			half
		};
	}

	// Too small to round away from a (signed) zero
	sign
}

/// Converts the specified 16-bit IEEE 754 binary16 word to a native
/// double-precision floating point number.
///
/// Every binary16 value is exactly representable as a binary32 value, and
/// every binary32 value as a binary64 one, so the conversion is lossless.
fn float16_unpack(half: u16) -> f64 {
	let sign = (u32::from(half) & 0x8000) << 16;
	let exponent = u32::from(half >> 10) & 0x1F;
	let mantissa = u32::from(half) & 0x3FF;

	let single = if exponent == 0x1F {
		// Infinities and NaNs, with the NaN payload left-aligned
		sign | 0x7F80_0000 | (mantissa << 13)
	} else if exponent != 0 {
		// Normal halves only translate the exponent bias (15 to 127)
		sign | ((exponent + 112) << 23) | (mantissa << 13)
	} else if mantissa != 0 {
		// Subnormal halves are normal singles: renormalize the mantissa and
		// fold the shift into the exponent
		let leading = mantissa.leading_zeros() - 22;

		sign | ((112 - leading) << 23) | ((mantissa << (leading + 14)) & 0x7F_FFFF)
	} else {
		// Signed zero
		sign
	};

	f64::from(f32::from_bits(single))
}
