pub mod base_uri;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

/// Characters `encodeURIComponent` leaves unescaped, on top of alphanumerics:
/// `- _ . ~ ! * ' ( )`. Used for redirect-target URLs embedded in a query
/// string, where a literal `.` (e.g. in a hostname) shouldn't be escaped.
pub const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'!')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');
