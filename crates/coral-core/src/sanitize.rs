//! Log hygiene for array output
//!
//! CLI commands such as certificate imports can echo whole PEM blocks back in
//! their output. Anything written to debug logs goes through here first.

const CERT_BEGIN: &str = "-BEGIN CERTIFICATE-";
const CERT_END: &str = "-END CERTIFICATE-";
const REPLACEMENT: &str = "sanitized";

/// Replace the body of every PEM certificate block with `sanitized`.
///
/// The begin/end markers themselves are kept so the log still shows that a
/// certificate was present. An unterminated block is sanitized to the end of
/// the text.
pub fn sanitize_certificates(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(begin) = rest.find(CERT_BEGIN) {
        let after_begin = begin + CERT_BEGIN.len();
        out.push_str(&rest[..after_begin]);
        out.push_str(REPLACEMENT);

        match rest[after_begin..].find(CERT_END) {
            Some(end) => {
                rest = &rest[after_begin + end..];
            }
            None => return out,
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_single_block() {
        let input = "prefix -BEGIN CERTIFICATE-XYZ-END CERTIFICATE- suffix";
        assert_eq!(
            sanitize_certificates(input),
            "prefix -BEGIN CERTIFICATE-sanitized-END CERTIFICATE- suffix"
        );
    }

    #[test]
    fn test_sanitize_multiple_blocks() {
        let input = "-BEGIN CERTIFICATE-a-END CERTIFICATE- and -BEGIN CERTIFICATE-b-END CERTIFICATE-";
        assert_eq!(
            sanitize_certificates(input),
            "-BEGIN CERTIFICATE-sanitized-END CERTIFICATE- and -BEGIN CERTIFICATE-sanitized-END CERTIFICATE-"
        );
    }

    #[test]
    fn test_sanitize_unterminated_block() {
        let input = "before -BEGIN CERTIFICATE-secret material";
        assert_eq!(
            sanitize_certificates(input),
            "before -BEGIN CERTIFICATE-sanitized"
        );
    }

    #[test]
    fn test_sanitize_no_block_is_identity() {
        let input = "showvv output with no certificates";
        assert_eq!(sanitize_certificates(input), input);
    }
}
