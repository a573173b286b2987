//! Contains the [`Value`] type, which carries field contents into and out of
//! the codec.

use std::borrow::Cow;

/// A semantic value flowing through the codec: what a single non-padding
/// field packs from or unpacks to.
///
/// Values supplied to a pack operation may borrow their text and raw byte
/// payloads; values produced by an unpack operation always own theirs, so
/// they are `Value<'static>`.
///
/// Integer fields accept either integer variant, with the field's range check
/// deciding whether the value fits. The other field types each take exactly
/// their matching variant.
#[derive(Clone, Debug, PartialEq)]
pub enum Value<'data> {
	/// A signed integer, for `s` fields.
	Signed(i64),
	/// An unsigned integer, for `u` fields.
	Unsigned(u64),
	/// A floating point number, for `f` fields.
	Float(f64),
	/// A boolean, for `b` fields.
	Bool(bool),
	/// UTF-8 text, for `t` fields.
	Text(Cow<'data, str>),
	/// Raw bytes, for `r` fields.
	Raw(Cow<'data, [u8]>)
}

impl Value<'_> {
	/// A short human-readable name for the kind of this value, for error
	/// messages.
	pub(crate) fn kind_name(&self) -> &'static str {
		match self {
			Self::Signed(_) => "signed integer",
			Self::Unsigned(_) => "unsigned integer",
			Self::Float(_) => "float",
			Self::Bool(_) => "boolean",
			Self::Text(_) => "text",
			Self::Raw(_) => "raw bytes"
		}
	}

	/// Clones any borrowed payload, yielding a value without lifetime ties to
	/// its source.
	pub fn into_owned(self) -> Value<'static> {
		match self {
			Self::Signed(value) => Value::Signed(value),
			Self::Unsigned(value) => Value::Unsigned(value),
			Self::Float(value) => Value::Float(value),
			Self::Bool(value) => Value::Bool(value),
			Self::Text(text) => Value::Text(Cow::Owned(text.into_owned())),
			Self::Raw(bytes) => Value::Raw(Cow::Owned(bytes.into_owned()))
		}
	}
}

impl From<i64> for Value<'_> {
	fn from(value: i64) -> Self {
		Self::Signed(value)
	}
}

impl From<i32> for Value<'_> {
	fn from(value: i32) -> Self {
		Self::Signed(value.into())
	}
}

impl From<u64> for Value<'_> {
	fn from(value: u64) -> Self {
		Self::Unsigned(value)
	}
}

impl From<u32> for Value<'_> {
	fn from(value: u32) -> Self {
		Self::Unsigned(value.into())
	}
}

impl From<f64> for Value<'_> {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<f32> for Value<'_> {
	fn from(value: f32) -> Self {
		Self::Float(value.into())
	}
}

impl From<bool> for Value<'_> {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl<'data> From<&'data str> for Value<'data> {
	fn from(text: &'data str) -> Self {
		Self::Text(Cow::Borrowed(text))
	}
}

impl From<String> for Value<'_> {
	fn from(text: String) -> Self {
		Self::Text(Cow::Owned(text))
	}
}

impl<'data> From<&'data [u8]> for Value<'data> {
	fn from(bytes: &'data [u8]) -> Self {
		Self::Raw(Cow::Borrowed(bytes))
	}
}

impl From<Vec<u8>> for Value<'_> {
	fn from(bytes: Vec<u8>) -> Self {
		Self::Raw(Cow::Owned(bytes))
	}
}
