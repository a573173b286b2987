use bitfmt::{byteswap, unpack};

fn main() {
	afl::fuzz!(|data: &[u8]| {
		// Each fuzz run has to be pretty fast. Split the input into a format
		// string and a data buffer and just check that no crashes happen
		let Some(split) = data.iter().position(|&byte| byte == b'\n') else {
			return;
		};

		let Ok(format) = std::str::from_utf8(&data[..split]) else {
			return;
		};
		let buf = &data[split + 1..];

		unpack(format, buf, false).ok();
		unpack(format, buf, true).ok();
		byteswap(format, buf).ok();
	})
}
