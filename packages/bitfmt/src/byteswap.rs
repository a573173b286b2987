//! Contains the byteswap helper, which flips the endianness of groups of
//! bytes in an already-encoded buffer.

use crate::codec::CodecError;


/// Returns a copy of `data` with consecutive groups of bytes reversed as
/// described by `sizes`.
///
/// Every character of `sizes` is a group size in bytes, one of `1`, `2`, `4`
/// or `8`; each group is reversed in place and the next group starts where
/// the previous one ended, from the beginning of the buffer. Bytes past the
/// last group are copied unchanged. A group running off the end of the buffer
/// is an error.
///
/// This is a purely byte-level operation, useful to convert whole-byte
/// encoded fields between big-endian and little-endian layouts; bit offsets
/// are not involved.
pub fn byteswap(sizes: &str, data: &[u8]) -> Result<Vec<u8>, CodecError> {
	let mut swapped = data.to_vec();
	let mut offset = 0;

	for group in sizes.chars() {
		let length = match group {
			'1' => 1,
			'2' => 2,
			'4' => 4,
			'8' => 8,
			_ => return Err(CodecError::BadSwapGroup(group))
		};

		let end = offset + length;

		if end > swapped.len() {
			return Err(CodecError::ShortData {
				needed: 8 * end as u64,
				available: 8 * swapped.len() as u64
			});
		}

		swapped[offset..end].reverse();
		offset = end;
	}

	Ok(swapped)
}
