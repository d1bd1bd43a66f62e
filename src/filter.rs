//! RFC 4515 search filter parser.
//!
//! Turns the string representation into a [`rasn_ldap::Filter`] tree.
//! Hex escapes (`\2a` and friends) in assertion values are decoded; an
//! escaped asterisk stays a literal byte and does not split a substring
//! match.

use bytes::Bytes;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::{char, digit1, satisfy};
use nom::combinator::{all_consuming, map, opt, recognize, verify};
use nom::multi::many0;
use nom::sequence::{pair, preceded};
use nom::IResult;
use rasn::types::SetOf;
use rasn_ldap::{
    AttributeValueAssertion, Filter, MatchingRuleAssertion, SubstringChoice, SubstringFilter,
};

use crate::error::Error;

pub(crate) fn parse_filter<S: AsRef<str>>(input: S) -> Result<Filter, Error> {
    match all_consuming(filter)(input.as_ref()) {
        Ok((_, f)) => Ok(f),
        Err(e) => Err(Error::InvalidFilter(e.to_string())),
    }
}

fn filter(i: &str) -> IResult<&str, Filter> {
    let (i, _) = char('(')(i)?;
    let (i, f) = filter_comp(i)?;
    let (i, _) = char(')')(i)?;
    Ok((i, f))
}

fn filter_comp(i: &str) -> IResult<&str, Filter> {
    alt((and, or, not, item))(i)
}

fn filter_set(i: &str) -> IResult<&str, SetOf<Filter>> {
    let (i, first) = filter(i)?;
    let (i, rest) = many0(filter)(i)?;
    let mut set = SetOf::with_capacity(rest.len() + 1);
    set.insert(first);
    for f in rest {
        set.insert(f);
    }
    Ok((i, set))
}

fn and(i: &str) -> IResult<&str, Filter> {
    map(preceded(char('&'), filter_set), Filter::And)(i)
}

fn or(i: &str) -> IResult<&str, Filter> {
    map(preceded(char('|'), filter_set), Filter::Or)(i)
}

fn not(i: &str) -> IResult<&str, Filter> {
    map(preceded(char('!'), filter), |f| Filter::Not(Box::new(f)))(i)
}

fn item(i: &str) -> IResult<&str, Filter> {
    alt((simple, extensible))(i)
}

#[derive(Clone, Copy)]
enum FilterType {
    Equality,
    Greater,
    Less,
    Approx,
}

fn filter_type(i: &str) -> IResult<&str, FilterType> {
    alt((
        map(tag(">="), |_| FilterType::Greater),
        map(tag("<="), |_| FilterType::Less),
        map(tag("~="), |_| FilterType::Approx),
        map(char('='), |_| FilterType::Equality),
    ))(i)
}

fn simple(i: &str) -> IResult<&str, Filter> {
    let (i, attr) = attribute_description(i)?;
    let (i, ftype) = filter_type(i)?;
    let (i, raw) = verify(take_while(is_raw_value_char), |v: &str| !v.contains("**"))(i)?;

    match build_simple(attr, ftype, raw) {
        Some(f) => Ok((i, f)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            i,
            nom::error::ErrorKind::Verify,
        ))),
    }
}

fn build_simple(attr: &str, ftype: FilterType, raw: &str) -> Option<Filter> {
    let filter = match ftype {
        FilterType::Equality if raw == "*" => Filter::Present(attr.into()),
        FilterType::Equality if raw.contains('*') => substring(attr, raw)?,
        FilterType::Equality => Filter::EqualityMatch(assertion(attr, raw)?),
        FilterType::Greater => Filter::GreaterOrEqual(assertion(attr, raw)?),
        FilterType::Less => Filter::LessOrEqual(assertion(attr, raw)?),
        FilterType::Approx => Filter::ApproxMatch(assertion(attr, raw)?),
    };
    Some(filter)
}

fn assertion(attr: &str, raw: &str) -> Option<AttributeValueAssertion> {
    Some(AttributeValueAssertion::new(
        attr.into(),
        unescape(raw)?.into(),
    ))
}

// A hex escape cannot contain '*', so splitting the raw value on stars
// before unescaping keeps a literal '\2a' intact.
fn substring(attr: &str, raw: &str) -> Option<Filter> {
    let segments: Vec<&str> = raw.split('*').collect();
    let last = segments.len() - 1;

    let mut choices = Vec::new();
    for (idx, seg) in segments.iter().enumerate() {
        if seg.is_empty() {
            continue;
        }
        let value: Bytes = unescape(seg)?.into();
        choices.push(if idx == 0 {
            SubstringChoice::Initial(value)
        } else if idx == last {
            SubstringChoice::Final(value)
        } else {
            SubstringChoice::Any(value)
        });
    }
    Some(Filter::Substrings(SubstringFilter::new(
        attr.into(),
        choices,
    )))
}

fn extensible(i: &str) -> IResult<&str, Filter> {
    alt((attr_dn_mrule, dn_mrule))(i)
}

fn attr_dn_mrule(i: &str) -> IResult<&str, Filter> {
    let (i, attr) = attribute_description(i)?;
    let (i, dn) = opt(tag(":dn"))(i)?;
    let (i, mrule) = opt(preceded(char(':'), attribute_type))(i)?;
    let (i, _) = tag(":=")(i)?;
    let (i, raw) = take_while(is_ext_value_char)(i)?;

    match extensible_filter(mrule, Some(attr), raw, dn.is_some()) {
        Some(f) => Ok((i, f)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            i,
            nom::error::ErrorKind::Verify,
        ))),
    }
}

fn dn_mrule(i: &str) -> IResult<&str, Filter> {
    let (i, dn) = opt(tag(":dn"))(i)?;
    let (i, mrule) = preceded(char(':'), attribute_type)(i)?;
    let (i, _) = tag(":=")(i)?;
    let (i, raw) = take_while(is_ext_value_char)(i)?;

    match extensible_filter(Some(mrule), None, raw, dn.is_some()) {
        Some(f) => Ok((i, f)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            i,
            nom::error::ErrorKind::Verify,
        ))),
    }
}

fn extensible_filter(
    mrule: Option<&str>,
    attr: Option<&str>,
    raw: &str,
    dn_attributes: bool,
) -> Option<Filter> {
    Some(Filter::ExtensibleMatch(MatchingRuleAssertion::new(
        mrule.map(Into::into),
        attr.map(Into::into),
        unescape(raw)?.into(),
        dn_attributes,
    )))
}

fn is_raw_value_char(c: char) -> bool {
    c != '\0' && c != '(' && c != ')'
}

fn is_ext_value_char(c: char) -> bool {
    is_raw_value_char(c) && c != '*'
}

/// Decode `\XX` hex escapes; any other use of a backslash is an error.
fn unescape(raw: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(raw.len());
    let bytes = raw.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'\\' {
            let hex = raw.get(idx + 1..idx + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            idx += 3;
        } else {
            out.push(bytes[idx]);
            idx += 1;
        }
    }
    Some(out)
}

fn attribute_description(i: &str) -> IResult<&str, &str> {
    recognize(pair(
        attribute_type,
        many0(preceded(char(';'), take_while1(is_alnum_hyphen))),
    ))(i)
}

fn attribute_type(i: &str) -> IResult<&str, &str> {
    alt((numeric_oid, descr))(i)
}

fn numeric_oid(i: &str) -> IResult<&str, &str> {
    recognize(pair(number, many0(preceded(char('.'), number))))(i)
}

fn number(i: &str) -> IResult<&str, &str> {
    verify(digit1, |d: &str| d.len() == 1 || !d.starts_with('0'))(i)
}

fn descr(i: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic()),
        take_while(is_alnum_hyphen),
    ))(i)
}

fn is_alnum_hyphen(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}
