use bytes::BytesMut;
use resp_proto::Request;

use crate::error::EncodingError;

/// Check each argument against its declared length.
pub(crate) fn check_lengths<A: AsRef<[u8]>>(
    argv: &[A],
    lengths: &[usize],
) -> Result<(), EncodingError> {
    if argv.len() != lengths.len() {
        return Err(EncodingError::LengthCountMismatch {
            args: argv.len(),
            lengths: lengths.len(),
        });
    }
    for (index, (arg, &declared)) in argv.iter().zip(lengths).enumerate() {
        let actual = arg.as_ref().len();
        if actual != declared {
            return Err(EncodingError::LengthMismatch {
                index,
                declared,
                actual,
            });
        }
    }
    Ok(())
}

/// Frame `argv` as a multi-bulk command at the end of `out`.
///
/// Returns the number of bytes appended. `out` is untouched on error.
pub(crate) fn encode_command<A: AsRef<[u8]>>(
    argv: &[A],
    out: &mut BytesMut,
) -> Result<usize, EncodingError> {
    if argv.is_empty() {
        return Err(EncodingError::EmptyCommand);
    }
    let request = Request::new(argv.iter().map(|arg| arg.as_ref()).collect());
    let len = request.encoded_len();
    out.reserve(len);
    request.encode_into(out);
    Ok(len)
}
