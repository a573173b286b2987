use indexmap::IndexMap;

use super::*;
use crate::compiled::{CompiledFormat, CompiledFormatDict};

#[test_log::test]
fn packing_unsigned_fields_works() {
	let data = pack(
		"u1u1u6",
		&[Value::Unsigned(1), Value::Unsigned(0), Value::Unsigned(0x2A)]
	)
	.expect("Unexpected pack error");

	assert_eq!(data, [0xAA]);
	assert_eq!(
		unpack("u1u1u6", &data, false).expect("Unexpected unpack error"),
		[Value::Unsigned(1), Value::Unsigned(0), Value::Unsigned(0x2A)]
	);
}

#[test_log::test]
fn packing_signed_fields_works() {
	let data = pack("s8", &[Value::Signed(-1)]).expect("Unexpected pack error");

	assert_eq!(data, [0xFF]);
	assert_eq!(
		unpack("s8", &data, false).expect("Unexpected unpack error"),
		[Value::Signed(-1)]
	);
}

#[test_log::test]
fn zero_padding_is_emitted_and_skipped() {
	let data = pack("u5p3u8", &[Value::Unsigned(0x1F), Value::Unsigned(0xAB)])
		.expect("Unexpected pack error");

	assert_eq!(data, [0xF8, 0xAB]);
	assert_eq!(
		unpack("u5p3u8", &data, false).expect("Unexpected unpack error"),
		[Value::Unsigned(0x1F), Value::Unsigned(0xAB)],
		"Padding unexpectedly produced a value"
	);
}

#[test_log::test]
fn one_padding_is_emitted_and_skipped() {
	let data = pack("P4u4", &[Value::Unsigned(5)]).expect("Unexpected pack error");

	assert_eq!(data, [0xF5]);
	assert_eq!(
		unpack("P4u4", &data, false).expect("Unexpected unpack error"),
		[Value::Unsigned(5)]
	);
}

#[test_log::test]
fn mixed_format_round_trip_works() {
	let format = "u3s5b1f32u7s64p4P4f64u1";
	let values = [
		Value::Unsigned(5),
		Value::Signed(-3),
		Value::Bool(true),
		Value::Float(0.25),
		Value::Unsigned(100),
		Value::Signed(i64::MIN),
		Value::Float(-1.5),
		Value::Unsigned(1)
	];

	let data = pack(format, &values).expect("Unexpected pack error");

	assert_eq!(data.len(), 24);
	assert_eq!(
		unpack(format, &data, false).expect("Unexpected unpack error"),
		values
	);
}

#[test_log::test]
fn float_fields_work() {
	let data = pack("f16", &[Value::Float(1.0)]).expect("Unexpected pack error");
	assert_eq!(data, [0x3C, 0x00]);

	let data = pack("f32", &[Value::Float(-2.5)]).expect("Unexpected pack error");
	assert_eq!(data, [0xC0, 0x20, 0x00, 0x00]);
	assert_eq!(
		unpack("f32", &data, false).expect("Unexpected unpack error"),
		[Value::Float(-2.5)]
	);

	let data = pack("p1f64", &[Value::Float(1.5)]).expect("Unexpected pack error");
	assert_eq!(
		unpack("p1f64", &data, false).expect("Unexpected unpack error"),
		[Value::Float(1.5)]
	);
}

#[test_log::test]
fn bool_fields_work() {
	let data = pack("b1u7", &[Value::Bool(true), Value::Unsigned(0)])
		.expect("Unexpected pack error");
	assert_eq!(data, [0x80]);

	let data = pack("b8", &[Value::Bool(true)]).expect("Unexpected pack error");
	assert_eq!(data, [0x01]);

	assert_eq!(
		unpack("b2b2", &[0b01_00_0000], false).expect("Unexpected unpack error"),
		[Value::Bool(true), Value::Bool(false)]
	);
}

#[test_log::test]
fn text_and_raw_fields_work() {
	let data = pack("t40r24", &["hello".into(), Value::Raw((&[1u8, 2, 3][..]).into())])
		.expect("Unexpected pack error");

	assert_eq!(data, *b"hello\x01\x02\x03");
	assert_eq!(
		unpack("t40r24", &data, false).expect("Unexpected unpack error"),
		[
			Value::Text("hello".into()),
			Value::Raw((&[1u8, 2, 3][..]).into())
		]
	);
}

#[test_log::test]
fn long_text_and_raw_are_cut_at_the_field_width() {
	assert_eq!(
		pack("t16", &["hello".into()]).expect("Unexpected pack error"),
		*b"he"
	);
	assert_eq!(
		pack("r8", &[Value::Raw((&[9u8, 8, 7][..]).into())]).expect("Unexpected pack error"),
		[9]
	);
}

#[test_log::test]
fn short_text_and_raw_are_errors() {
	assert!(matches!(
		pack("t40", &["hi".into()]),
		Err(CodecError::ShortText {
			expected: 5,
			actual: 2
		})
	));
	assert!(matches!(
		pack("r16", &[Value::Raw((&[1u8][..]).into())]),
		Err(CodecError::ShortRaw {
			expected: 2,
			actual: 1
		})
	));
}

#[test_log::test]
fn invalid_utf8_text_is_an_unpack_error() {
	assert!(matches!(
		unpack("t8", &[0xFF], false),
		Err(CodecError::InvalidText(_))
	));
}

#[test_log::test]
fn integer_range_boundaries_are_enforced() {
	// The extreme representable values pack fine
	assert_eq!(
		pack("u8", &[Value::Unsigned(255)]).expect("Unexpected pack error"),
		[0xFF]
	);
	assert_eq!(
		pack("s8", &[Value::Signed(-128)]).expect("Unexpected pack error"),
		[0x80]
	);
	assert_eq!(
		pack("s8", &[Value::Signed(127)]).expect("Unexpected pack error"),
		[0x7F]
	);
	assert_eq!(
		pack("u64", &[Value::Unsigned(u64::MAX)]).expect("Unexpected pack error"),
		[0xFF; 8]
	);
	assert_eq!(
		pack("s64", &[Value::Signed(i64::MIN)]).expect("Unexpected pack error"),
		[0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
	);

	// One past either end does not
	assert!(matches!(
		pack("u8", &[Value::Unsigned(256)]),
		Err(CodecError::UnsignedOutOfRange {
			value: 256,
			bit_width: 8
		})
	));
	assert!(matches!(
		pack("s8", &[Value::Signed(128)]),
		Err(CodecError::SignedOutOfRange {
			value: 128,
			bit_width: 8
		})
	));
	assert!(matches!(
		pack("s8", &[Value::Signed(-129)]),
		Err(CodecError::SignedOutOfRange {
			value: -129,
			bit_width: 8
		})
	));
}

#[test_log::test]
fn cross_signedness_integer_values_are_accepted_in_range() {
	assert_eq!(
		pack("s8", &[Value::Unsigned(127)]).expect("Unexpected pack error"),
		[0x7F]
	);
	assert_eq!(
		pack("u8", &[Value::Signed(255)]).expect("Unexpected pack error"),
		[0xFF]
	);

	assert!(matches!(
		pack("s8", &[Value::Unsigned(128)]),
		Err(CodecError::SignedOutOfRange { .. })
	));
	assert!(matches!(
		pack("u8", &[Value::Signed(-1)]),
		Err(CodecError::UnsignedOutOfRange { .. })
	));
	assert!(matches!(
		pack("s16", &[Value::Unsigned(u64::MAX)]),
		Err(CodecError::SignedOutOfRange { .. })
	));
}

#[test_log::test]
fn unconvertible_values_are_type_errors() {
	assert!(matches!(
		pack("u8", &["text".into()]),
		Err(CodecError::UnexpectedValueType {
			expected: "integer",
			actual: "text"
		})
	));
	assert!(matches!(
		pack("b1", &[Value::Unsigned(1)]),
		Err(CodecError::UnexpectedValueType {
			expected: "boolean",
			..
		})
	));
	assert!(matches!(
		pack("f32", &[Value::Unsigned(1)]),
		Err(CodecError::UnexpectedValueType {
			expected: "float",
			..
		})
	));
	assert!(matches!(
		pack("t8", &[Value::Raw((&[0u8][..]).into())]),
		Err(CodecError::UnexpectedValueType {
			expected: "text",
			..
		})
	));
}

#[test_log::test]
fn too_few_values_is_an_error_and_extra_values_are_ignored() {
	assert!(matches!(
		pack("u8u8", &[Value::Unsigned(1)]),
		Err(CodecError::TooFewValues {
			expected: 2,
			actual: 1
		})
	));

	assert_eq!(
		pack("u8", &[Value::Unsigned(1), Value::Unsigned(2)]).expect("Unexpected pack error"),
		[0x01],
		"Supernumerary values should be ignored"
	);
}

#[test_log::test]
fn packing_into_a_buffer_preserves_neighbour_bits() {
	let mut buf = [0u8; 2];
	pack_into("u4", &mut buf, 6, &[Value::Unsigned(0xF)]).expect("Unexpected pack error");
	assert_eq!(buf, [0x03, 0xC0]);

	let mut buf = [0xFFu8; 3];
	pack_into("u4s4", &mut buf, 10, &[Value::Unsigned(0xA), Value::Signed(-2)])
		.expect("Unexpected pack error");
	assert_eq!(buf, [0xFF, 0xEB, 0xBF]);
}

#[test_log::test]
fn packing_into_a_buffer_restores_neighbour_bits_on_error() {
	let mut buf = [0xAB, 0xCD];
	let result = pack_into(
		"u4u4",
		&mut buf,
		4,
		&[Value::Unsigned(0xF), Value::Unsigned(0x10)]
	);

	assert!(matches!(
		result,
		Err(CodecError::UnsignedOutOfRange { .. })
	));
	// The written range is unspecified after an error, but its
	// surroundings must be intact
	assert_eq!(buf[0] >> 4, 0xA);
	assert_eq!(buf[1] & 0x0F, 0xD);
}

#[test_log::test]
fn packing_into_a_short_buffer_is_an_error() {
	let mut buf = [0u8; 1];

	assert!(matches!(
		pack_into("u16", &mut buf, 0, &[Value::Unsigned(1)]),
		Err(CodecError::ShortDestination {
			needed: 16,
			available: 8
		})
	));
	assert!(matches!(
		pack_into("u8", &mut buf, 1, &[Value::Unsigned(1)]),
		Err(CodecError::ShortDestination {
			needed: 9,
			available: 8
		})
	));
}

#[test_log::test]
fn unpacking_from_an_offset_works() {
	assert_eq!(
		unpack_from("u4", &[0x03, 0xC0], 6, false).expect("Unexpected unpack error"),
		[Value::Unsigned(0xF)]
	);
}

#[test_log::test]
fn unpacking_short_data_is_an_error() {
	assert!(matches!(
		unpack("u8u8u8", &[0x01, 0x02], false),
		Err(CodecError::ShortData {
			needed: 24,
			available: 16
		})
	));
	assert!(matches!(
		unpack_from("u8", &[0xFF], 4, false),
		Err(CodecError::ShortData {
			needed: 12,
			available: 8
		})
	));
}

#[test_log::test]
fn truncated_unpacking_returns_the_fields_that_fit() {
	assert_eq!(
		unpack("u8u8u8", &[0x01, 0x02], true).expect("Unexpected unpack error"),
		[Value::Unsigned(1), Value::Unsigned(2)]
	);

	// The second field starts inside the data but does not fit entirely
	assert_eq!(
		unpack("u4u8", &[0x12], true).expect("Unexpected unpack error"),
		[Value::Unsigned(1)]
	);

	// Trailing padding that does not fit ends the walk
	assert_eq!(
		unpack("u4p12", &[0x12], true).expect("Unexpected unpack error"),
		[Value::Unsigned(1)]
	);

	assert_eq!(
		unpack("u8", &[], true).expect("Unexpected unpack error"),
		[]
	);
	assert_eq!(
		unpack_from("u8", &[0xFF], 4, true).expect("Unexpected unpack error"),
		[]
	);
	assert_eq!(
		unpack_from("u8", &[0xFF], 1000, true).expect("Unexpected unpack error"),
		[],
		"An offset past the data should unpack to nothing"
	);
}

#[test_log::test]
fn named_packing_and_unpacking_work() {
	let names = ["kind", "flags"];
	let values = IndexMap::from([
		("kind", Value::Unsigned(3)),
		("flags", Value::Unsigned(0xA))
	]);

	let data = pack_dict("u4u4", &names, &values).expect("Unexpected pack error");
	assert_eq!(data, [0x3A]);

	assert_eq!(
		unpack_dict("u4u4", &names, &data, false).expect("Unexpected unpack error"),
		IndexMap::from([
			("kind".to_owned(), Value::Unsigned(3)),
			("flags".to_owned(), Value::Unsigned(0xA))
		])
	);
}

#[test_log::test]
fn named_fields_skip_padding() {
	let names = ["first", "second"];
	let values = IndexMap::from([
		("first", Value::Unsigned(0xF)),
		("second", Value::Unsigned(0x1))
	]);

	let data = pack_dict("u4p4u4", &names, &values).expect("Unexpected pack error");
	assert_eq!(data, [0xF0, 0x10]);

	let unpacked =
		unpack_dict("u4p4u4", &names, &data, false).expect("Unexpected unpack error");
	assert_eq!(unpacked.len(), 2);
	assert_eq!(unpacked["first"], Value::Unsigned(0xF));
	assert_eq!(unpacked["second"], Value::Unsigned(0x1));
}

#[test_log::test]
fn named_packing_reports_missing_values() {
	let values = IndexMap::from([("present", Value::Unsigned(1))]);

	assert!(matches!(
		pack_dict("u4u4", &["present", "absent"], &values),
		Err(CodecError::MissingValue(name)) if name == "absent"
	));
}

#[test_log::test]
fn too_few_names_is_an_error() {
	let values = IndexMap::from([("lonely", Value::Unsigned(1))]);

	assert!(matches!(
		pack_dict("u4u4", &["lonely"], &values),
		Err(CodecError::TooFewNames {
			expected: 2,
			actual: 1
		})
	));
	assert!(matches!(
		unpack_dict("u4u4", &["lonely"], &[0x00], false),
		Err(CodecError::TooFewNames { .. })
	));
}

#[test_log::test]
fn truncated_named_unpacking_keeps_field_order() {
	let names = ["a", "b", "c"];
	let unpacked = unpack_dict("u8u8u8", &names, &[0x01, 0x02], true)
		.expect("Unexpected unpack error");

	assert_eq!(unpacked.len(), 2);
	assert_eq!(
		unpacked.keys().map(String::as_str).collect::<Vec<_>>(),
		["a", "b"],
		"Truncated results should keep declaration order"
	);
}

#[test_log::test]
fn named_in_place_operations_work() {
	let names = ["value"];
	let values = IndexMap::from([("value", Value::Unsigned(0x5))]);

	let mut buf = [0xFFu8; 2];
	pack_into_dict("u4", &names, &mut buf, 6, &values).expect("Unexpected pack error");
	assert_eq!(buf, [0xFD, 0x7F]);

	assert_eq!(
		unpack_from_dict("u4", &names, &buf, 6, false).expect("Unexpected unpack error"),
		IndexMap::from([("value".to_owned(), Value::Unsigned(0x5))])
	);
}

#[test_log::test]
fn compiled_formats_are_reusable() {
	let format = CompiledFormat::new("u1s7").expect("Unexpected parse error");

	assert_eq!(format.size_in_bits(), 8);
	assert_eq!(format.format(), "u1s7");

	for value in [-64i64, -1, 0, 63] {
		let data = format
			.pack(&[Value::Unsigned(1), Value::Signed(value)])
			.expect("Unexpected pack error");
		assert_eq!(
			format.unpack(&data, false).expect("Unexpected unpack error"),
			[Value::Unsigned(1), Value::Signed(value)]
		);
	}

	// A deep copy behaves exactly like the original, and recompiling the
	// stored format string does too
	let copy = format.clone();
	let recompiled = CompiledFormat::new(format.format()).expect("Unexpected parse error");
	let data = [0xC1];

	assert_eq!(
		copy.unpack(&data, false).expect("Unexpected unpack error"),
		recompiled.unpack(&data, false).expect("Unexpected unpack error")
	);
}

#[test_log::test]
fn compiled_format_in_place_operations_work() {
	let format = CompiledFormat::new("u4").expect("Unexpected parse error");
	let mut buf = [0u8; 2];

	format
		.pack_into(&mut buf, 6, &[Value::Unsigned(0xF)])
		.expect("Unexpected pack error");
	assert_eq!(buf, [0x03, 0xC0]);

	assert_eq!(
		format
			.unpack_from(&buf, 6, false)
			.expect("Unexpected unpack error"),
		[Value::Unsigned(0xF)]
	);
}

#[test_log::test]
fn compiled_dict_formats_are_reusable() {
	let format =
		CompiledFormatDict::new("u4p4u4", &["high", "low"]).expect("Unexpected parse error");

	assert_eq!(format.size_in_bits(), 12);
	assert_eq!(format.format(), "u4p4u4");
	assert_eq!(format.names(), ["high", "low"]);

	let values = IndexMap::from([
		("high", Value::Unsigned(0xA)),
		("low", Value::Unsigned(0xB))
	]);
	let data = format.pack(&values).expect("Unexpected pack error");

	assert_eq!(data, [0xA0, 0xB0]);
	assert_eq!(
		format.unpack(&data, false).expect("Unexpected unpack error"),
		IndexMap::from([
			("high".to_owned(), Value::Unsigned(0xA)),
			("low".to_owned(), Value::Unsigned(0xB))
		])
	);

	assert!(matches!(
		CompiledFormatDict::new("u4u4", &["only"]),
		Err(CodecError::TooFewNames { .. })
	));
}

#[test_log::test]
fn invalid_formats_surface_as_codec_errors() {
	assert!(matches!(
		pack("z8", &[]),
		Err(CodecError::Format(FormatParseError::BadFieldType('z')))
	));
	assert!(matches!(
		unpack("u0", &[], false),
		Err(CodecError::Format(FormatParseError::ZeroFieldWidth('u')))
	));
}

#[test_log::test]
fn size_in_bits_sums_field_widths() {
	assert_eq!(size_in_bits("u1u1u6p8").expect("Unexpected parse error"), 16);
	assert_eq!(size_in_bits("").expect("Unexpected parse error"), 0);
	assert_eq!(
		size_in_bits("f16t12").unwrap_err(),
		FormatParseError::UnalignedTextWidth(12)
	);
}
