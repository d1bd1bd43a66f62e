//! Escaping helpers for building filters and DNs from untrusted input.

use std::borrow::Cow;

fn hex_escape(output: &mut String, c: u8) {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    output.push('\\');
    output.push(DIGITS[usize::from(c >> 4)] as char);
    output.push(DIGITS[usize::from(c & 0xf)] as char);
}

fn escape_with<'a, S, F>(lit: S, needs_escape: F) -> Cow<'a, str>
where
    S: Into<Cow<'a, str>>,
    F: Fn(u8) -> bool,
{
    let lit = lit.into();
    if !lit.bytes().any(&needs_escape) {
        return lit;
    }

    let mut output = String::with_capacity(lit.len() + 8);
    for ch in lit.chars() {
        if ch.is_ascii() && needs_escape(ch as u8) {
            hex_escape(&mut output, ch as u8);
        } else {
            output.push(ch);
        }
    }
    Cow::Owned(output)
}

/// Escape a literal value for use inside a filter string.
///
/// Parentheses, the asterisk, the backslash and NUL must be hex-escaped in
/// the RFC 4515 string representation. Only allocates when escaping is
/// actually needed.
pub fn ldap_escape<'a, S: Into<Cow<'a, str>>>(lit: S) -> Cow<'a, str> {
    escape_with(lit, |c| {
        matches!(c, b'\\' | b'*' | b'(' | b')' | 0)
    })
}

/// Escape an attribute value for use inside a distinguished name.
///
/// The characters special in a DN (space, quote, number sign, plus, comma,
/// semicolon, angle brackets, equals sign, backslash, NUL) are hex-escaped.
pub fn dn_escape<'a, S: Into<Cow<'a, str>>>(lit: S) -> Cow<'a, str> {
    escape_with(lit, |c| {
        matches!(
            c,
            b' ' | b'"' | b'#' | b'+' | b',' | b';' | b'<' | b'=' | b'>' | b'\\' | 0
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_escaping() {
        assert_eq!(ldap_escape("plain"), "plain");
        assert!(matches!(ldap_escape("plain"), Cow::Borrowed(_)));
        assert_eq!(ldap_escape("a*(b)\\c"), "a\\2a\\28b\\29\\5cc");
    }

    #[test]
    fn dn_escaping() {
        assert_eq!(dn_escape("Doe, John"), "Doe\\2c\\20John");
        assert_eq!(dn_escape("simple"), "simple");
    }

    #[test]
    fn escaped_filter_parses_back() {
        let filter = format!("(cn={})", ldap_escape("star*name"));
        assert!(crate::filter::parse_filter(&filter).is_ok());
    }
}
