/// Container magic and the single bitstream version this build reads
/// and writes.
pub const DRACO_MAGIC: &[u8; 5] = b"DRACO";
pub const BITSTREAM_VERSION_MAJOR: u8 = 2;
pub const BITSTREAM_VERSION_MINOR: u8 = 2;

/// Versions the decoder accepts.
pub fn is_supported_version(major: u8, minor: u8) -> bool {
    major == BITSTREAM_VERSION_MAJOR && minor <= BITSTREAM_VERSION_MINOR
}
