//! Verification URL assembly.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Build `{base}/api/qr/check/{product}/serial={serial}&token={token}`.
///
/// One trailing `/` is stripped from `base`. `product`, `serial` and `token`
/// are each percent-encoded as URI components; `base` is used verbatim.
pub fn build_check_url(base: &str, product: &str, serial: &str, token: &str) -> String {
    let base = base.strip_suffix('/').unwrap_or(base);
    format!(
        "{base}/api/qr/check/{}/serial={}&token={}",
        utf8_percent_encode(product, URI_COMPONENT),
        utf8_percent_encode(serial, URI_COMPONENT),
        utf8_percent_encode(token, URI_COMPONENT),
    )
}
