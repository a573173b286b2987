//! Contains the format string compiler, which turns the textual field
//! descriptions into the [`FormatInfo`] descriptor driven by the packing and
//! unpacking dispatch.

use log::trace;
use thiserror::Error;
use tinyvec::TinyVec;


/// The widest field the compiler accepts, in bits. Wider fields are rejected
/// while their width digits are still being accumulated, so the total bit
/// width of a format cannot overflow either.
const MAX_FIELD_WIDTH: u32 = u32::MAX / 100;

/// An error that may happen when compiling a format string.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatParseError {
	/// A field type character is not one of `s`, `u`, `f`, `b`, `t`, `r`,
	/// `p` or `P`.
	#[error("bad format field type '{0}'")]
	BadFieldType(char),
	/// A field type character is not followed by any width digits.
	#[error("field of type '{0}' has no width")]
	MissingFieldWidth(char),
	/// A field declares a width of zero bits.
	#[error("field of type '{0}' has zero width")]
	ZeroFieldWidth(char),
	/// A field width has too many digits to be taken seriously.
	#[error("field width over the implementation limit")]
	FieldWidthOverflow,
	/// A signed integer field is wider than 64 bits.
	#[error("signed integer field over 64 bits: {0}")]
	TooWideSigned(u32),
	/// An unsigned integer field is wider than 64 bits.
	#[error("unsigned integer field over 64 bits: {0}")]
	TooWideUnsigned(u32),
	/// A boolean field is wider than 64 bits.
	#[error("boolean field over 64 bits: {0}")]
	TooWideBool(u32),
	/// A float field is not 16, 32 or 64 bits wide.
	#[error("float field width not 16, 32 or 64 bits: {0}")]
	BadFloatWidth(u32),
	/// A text field width is not a whole number of bytes.
	#[error("text field width not a multiple of 8 bits: {0}")]
	UnalignedTextWidth(u32),
	/// A raw field width is not a whole number of bytes.
	#[error("raw field width not a multiple of 8 bits: {0}")]
	UnalignedRawWidth(u32)
}

/// How a field converts between semantic values and raw bits, together with
/// whatever bounds that conversion needs at pack time.
///
/// Integer bounds are computed once at compile time, so the pack hot loop
/// only compares against them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum FieldCodec {
	/// Two's complement signed integer.
	Signed { min: i64, max: i64 },
	/// Unsigned integer.
	Unsigned { max: u64 },
	/// IEEE 754 binary16 float.
	Float16,
	/// IEEE 754 binary32 float.
	Float32,
	/// IEEE 754 binary64 float.
	Float64,
	/// Boolean, stored as a small unsigned integer.
	Bool,
	/// UTF-8 text of a fixed byte length.
	Text,
	/// Raw bytes of a fixed length.
	Raw,
	/// All-zero padding. Consumes and produces no value.
	#[default]
	ZeroPadding,
	/// All-one padding. Consumes and produces no value.
	OnePadding
}

/// One compiled field record: its codec and its width in bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct FieldInfo {
	pub(crate) codec: FieldCodec,
	pub(crate) bit_width: u32
}

impl FieldInfo {
	/// Builds the field record for a type character and width, validating the
	/// per-type width constraints.
	fn new(kind: char, bit_width: u32) -> Result<Self, FormatParseError> {
		let codec = match kind {
			's' => {
				if bit_width > 64 {
					return Err(FormatParseError::TooWideSigned(bit_width));
				}

				if bit_width == 64 {
					FieldCodec::Signed {
						min: i64::MIN,
						max: i64::MAX
					}
				} else {
					FieldCodec::Signed {
						min: -(1 << (bit_width - 1)),
						max: (1 << (bit_width - 1)) - 1
					}
				}
			}
			'u' => {
				if bit_width > 64 {
					return Err(FormatParseError::TooWideUnsigned(bit_width));
				}

				FieldCodec::Unsigned {
					max: if bit_width == 64 {
						u64::MAX
					} else {
						(1 << bit_width) - 1
					}
				}
			}
			'f' => match bit_width {
				16 => FieldCodec::Float16,
				32 => FieldCodec::Float32,
				64 => FieldCodec::Float64,
				_ => return Err(FormatParseError::BadFloatWidth(bit_width))
			},
			'b' => {
				if bit_width > 64 {
					return Err(FormatParseError::TooWideBool(bit_width));
				}

				FieldCodec::Bool
			}
			't' => {
				if bit_width % 8 != 0 {
					return Err(FormatParseError::UnalignedTextWidth(bit_width));
				}

				FieldCodec::Text
			}
			'r' => {
				if bit_width % 8 != 0 {
					return Err(FormatParseError::UnalignedRawWidth(bit_width));
				}

				FieldCodec::Raw
			}
			'p' => FieldCodec::ZeroPadding,
			'P' => FieldCodec::OnePadding,
			_ => return Err(FormatParseError::BadFieldType(kind))
		};

		Ok(Self { codec, bit_width })
	}

	/// Whether this field is zero or one padding, which consumes and produces
	/// no value.
	pub(crate) fn is_padding(&self) -> bool {
		matches!(
			self.codec,
			FieldCodec::ZeroPadding | FieldCodec::OnePadding
		)
	}
}

/// The compiled representation of a format string: the field records in
/// declaration order, plus the totals the dispatch loops need.
///
/// A descriptor is immutable after compilation, so any number of pack and
/// unpack operations may share it concurrently.
#[derive(Clone, Debug)]
pub(crate) struct FormatInfo {
	/// Most formats describe small records, so a handful of fields live
	/// inline without a heap allocation per one-shot call
	fields: TinyVec<[FieldInfo; 16]>,
	bit_width: u64,
	non_padding_field_count: usize
}

impl FormatInfo {
	/// Compiles a format string into its descriptor.
	///
	/// The format is a sequence of `<type><width>` tokens, optionally
	/// separated by whitespace, where the type is one of `s`, `u`, `f`, `b`,
	/// `t`, `r`, `p` or `P` and the width is a positive decimal number of
	/// bits.
	pub(crate) fn parse(format: &str) -> Result<Self, FormatParseError> {
		let mut fields = TinyVec::default();
		let mut bit_width = 0u64;
		let mut non_padding_field_count = 0;

		let mut characters = format.chars().peekable();

		while let Some(kind) = characters.next() {
			if kind.is_whitespace() {
				continue;
			}

			if !matches!(kind, 's' | 'u' | 'f' | 'b' | 't' | 'r' | 'p' | 'P') {
				return Err(FormatParseError::BadFieldType(kind));
			}

			let mut width: u32 = 0;
			let mut width_has_digits = false;

			while let Some(digit) = characters.peek().and_then(|character| character.to_digit(10))
			{
				characters.next();
				width_has_digits = true;

				width = width
					.checked_mul(10)
					.and_then(|width| width.checked_add(digit))
					.filter(|&width| width <= MAX_FIELD_WIDTH)
					.ok_or(FormatParseError::FieldWidthOverflow)?;
			}

			if !width_has_digits {
				return Err(FormatParseError::MissingFieldWidth(kind));
			}

			if width == 0 {
				return Err(FormatParseError::ZeroFieldWidth(kind));
			}

			let field = FieldInfo::new(kind, width)?;

			if !field.is_padding() {
				non_padding_field_count += 1;
			}

			bit_width += u64::from(width);
			fields.push(field);
		}

		trace!(
			"Compiled format \"{}\": {} fields, {} bits",
			format,
			fields.len(),
			bit_width
		);

		Ok(Self {
			fields,
			bit_width,
			non_padding_field_count
		})
	}

	/// The compiled field records, in declaration order.
	pub(crate) fn fields(&self) -> &[FieldInfo] {
		&self.fields
	}

	/// The sum of all field widths, in bits.
	pub(crate) fn bit_width(&self) -> u64 {
		self.bit_width
	}

	/// The number of bytes a buffer needs to hold every field, rounding the
	/// last partial byte up.
	pub(crate) fn size_in_bytes(&self) -> usize {
		self.bit_width.div_ceil(8) as usize
	}

	/// The number of fields that consume or produce a value, i.e. all the
	/// non-padding ones.
	pub(crate) fn non_padding_field_count(&self) -> usize {
		self.non_padding_field_count
	}
}
