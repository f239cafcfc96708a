use http::Version;

use crate::error::MessageError;

/// Parses a protocol version as it appears after `HTTP/`, e.g. `"1.1"` or `"2"`.
pub(crate) fn parse_version(version: &str) -> Result<Version, MessageError> {
    match version.trim() {
        "0.9" => Ok(Version::HTTP_09),
        "1.0" => Ok(Version::HTTP_10),
        "1.1" => Ok(Version::HTTP_11),
        "2" | "2.0" => Ok(Version::HTTP_2),
        "3" | "3.0" => Ok(Version::HTTP_3),
        _ => Err(MessageError::invalid_argument(format!("unsupported protocol version {version:?}"))),
    }
}

/// The version number without the `HTTP/` prefix.
pub(crate) fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
