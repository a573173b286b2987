//! bitfmt is a Rust library for packing and unpacking sequences of
//! heterogeneous scalar values into and out of byte buffers at bit
//! granularity, driven by a compact textual format string.
//!
//! Unlike byte-aligned record codecs, every field is addressed in bits:
//! successive fields straddle byte boundaries however their widths dictate,
//! with no implicit alignment or padding. The encoding is big-endian by
//! definition: the first field of a format occupies the most significant
//! bits of the first byte of the output, and multi-byte integers are stored
//! most significant byte first.
//!
//! The format string is the schema, supplied out of band. Packed buffers are
//! not self-describing: there is no length framing, no field tags and no
//! version negotiation, which is exactly what makes the encoding suitable
//! for fixed wire formats, file headers, registers and protocol fields that
//! are specified down to the bit.
//!
//! # Format strings
//!
//! A format string is a sequence of `<type><width>` tokens, optionally
//! separated by whitespace, where the width is a positive decimal number of
//! bits:
//!
//! | Type | Field | Width constraint |
//! |------|-------|------------------|
//! | `s`  | signed integer, two's complement | 1 to 64 |
//! | `u`  | unsigned integer | 1 to 64 |
//! | `f`  | IEEE 754 float | 16, 32 or 64 |
//! | `b`  | boolean | 1 to 64 |
//! | `t`  | UTF-8 text | multiple of 8 |
//! | `r`  | raw bytes | multiple of 8 |
//! | `p`  | zero padding | any |
//! | `P`  | one padding | any |
//!
//! Padding fields emit fixed bits when packing and are skipped when
//! unpacking; they neither consume nor produce a [`Value`].
//!
//! For example, `"u4s12p8f32"` describes a 4-bit unsigned integer followed
//! by a 12-bit signed integer, a zero-padded byte and a single-precision
//! float, 56 bits in total.
//!
//! # One-shot operations and compiled formats
//!
//! The free functions ([`pack`], [`unpack`], [`pack_into`], [`unpack_from`]
//! and their `_dict` variants keyed by field names) compile the format
//! string on every call, which is convenient for occasional use. Code that
//! packs or unpacks the same layout repeatedly should compile it once into a
//! [`CompiledFormat`] or [`CompiledFormatDict`] and reuse the handle; the
//! handles hold no mutable state and may be shared freely across threads.
//!
//! # Example
//!
//! ```
//! # fn main() -> Result<(), bitfmt::CodecError> {
//! use bitfmt::{CompiledFormat, Value, pack, unpack};
//!
//! // Two flags, a 6-bit counter and a byte of one padding
//! let data = pack(
//! 	"u1u1u6P8",
//! 	&[Value::Unsigned(1), Value::Unsigned(0), Value::Unsigned(0x2A)]
//! )?;
//! assert_eq!(data, [0xAA, 0xFF]);
//!
//! // Padding produces no value on the way back out
//! let values = unpack("u1u1u6P8", &data, false)?;
//! assert_eq!(
//! 	values,
//! 	[Value::Unsigned(1), Value::Unsigned(0), Value::Unsigned(0x2A)]
//! );
//!
//! // Compile formats that are used repeatedly
//! let heartbeat = CompiledFormat::new("u4u12t48")?;
//! assert_eq!(heartbeat.size_in_bits(), 64);
//!
//! let message = heartbeat.pack(&[
//! 	Value::Unsigned(7),
//! 	Value::Unsigned(1530),
//! 	"onward".into()
//! ])?;
//! assert_eq!(message[..2], [0x75, 0xFA]);
//! assert_eq!(message[2..], *b"onward");
//! # Ok(())
//! # }
//! ```
//!
//! # Error handling
//!
//! Errors are surfaced at the operation boundary: format and width problems
//! as [`FormatParseError`], everything that can go wrong while packing or
//! unpacking as [`CodecError`]. An operation stops at its first error and
//! leaves any partial output in an unspecified state, so callers must
//! discard it. The one recoverable condition is unpacking with
//! `allow_truncated`, where data ending mid-field simply ends the output
//! early and is reported as success with partial results.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://crates.io/crates/log) crate for
//! logging diagnostic messages to any interested consumers. Executables can
//! customize the verbosity of this logging, and even compile it out, [as
//! explained in the `log` crate documentation](https://docs.rs/log/0.4.28/log).

#![forbid(unsafe_code)]
#![forbid(unsafe_op_in_unsafe_fn)]
#![forbid(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]
#![deny(non_ascii_idents)]
#![deny(clippy::print_stdout)]
#![deny(clippy::unimplemented)]
#![warn(explicit_outlives_requirements)]
#![warn(noop_method_call)]
#![warn(unreachable_pub)]
#![warn(unused_import_braces)]
#![warn(unused_qualifications)]
#![warn(variant_size_differences)]
#![warn(clippy::empty_enum)]
#![warn(clippy::enum_glob_use)]
#![warn(clippy::float_cmp_const)]
#![warn(clippy::invalid_upcast_comparisons)]
#![warn(clippy::multiple_inherent_impl)]
#![warn(clippy::use_self)]
#![warn(clippy::used_underscore_binding)]
#![warn(clippy::redundant_feature_names)]

pub use byteswap::byteswap;
pub use codec::{
	CodecError, pack, pack_dict, pack_into, pack_into_dict, size_in_bits, unpack, unpack_dict,
	unpack_from, unpack_from_dict
};
pub use compiled::{CompiledFormat, CompiledFormatDict};
pub use format::FormatParseError;
pub use value::Value;

mod byteswap;
mod codec;
mod compiled;
mod field;
mod format;
mod value;
