//! Type parsing and DATE / TIME literal validation.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::ast::{DateValue, TimeValue, TypeName};
use crate::lexer::{LiteralValue, Span, Token, TokenKind};

use super::error::ParseError;
use super::node::{NodeKind, ParseNode};
use super::view::TokenView;

/// Strict shape of a DATE literal: `YYYY-MM-DD`.
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern"));

/// Strict shape of a TIME literal: `HH:MM:SS[.fraction][±HH:MM]`.
static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2})(?:\.(\d+))?(?:([+-])(\d{2}):(\d{2}))?$")
        .expect("time pattern")
});

/// Parses a type reference: a name from the closed type table with an
/// optional parenthesized parameter list, checked against the name's
/// arity, plus the `WITH TIME ZONE` suffix for `TIME`.
pub(super) fn parse_type(view: TokenView<'_>) -> Result<ParseNode<'_>, ParseError> {
    let Some(head) = view.head() else {
        return Err(ParseError::ExpectedTypeName { span: view.span() });
    };
    let name = match head.kind {
        TokenKind::Null => "null",
        TokenKind::Missing => "missing",
        TokenKind::Keyword => match head.text() {
            Some(text) if TypeName::from_keyword(text).is_some() => text,
            _ => return Err(ParseError::ExpectedTypeName { span: head.span }),
        },
        _ => return Err(ParseError::ExpectedTypeName { span: head.span }),
    };
    let type_name = TypeName::from_keyword(name).unwrap_or(match head.kind {
        TokenKind::Missing => TypeName::Missing,
        _ => TypeName::Null,
    });
    let type_span = head.span;
    let mut rest = view.tail();
    let mut args: Vec<ParseNode<'_>> = Vec::new();

    if rest.kind() == TokenKind::LeftParen {
        rest = rest.tail();
        loop {
            let arg = rest
                .head()
                .filter(|t| t.kind == TokenKind::Literal)
                .filter(|t| t.value.as_ref().is_some_and(LiteralValue::is_unsigned_integer))
                .ok_or(ParseError::InvalidTypeParameter { span: rest.span() })?;
            rest = rest.tail();
            args.push(ParseNode::with_token(NodeKind::Atom, arg.clone(), rest));
            match rest.kind() {
                TokenKind::Comma => rest = rest.tail(),
                TokenKind::RightParen => {
                    rest = rest.tail();
                    break;
                }
                _ => {
                    return Err(ParseError::Expected2TokenTypes {
                        first: TokenKind::Comma,
                        second: TokenKind::RightParen,
                        found: rest.kind(),
                        span: rest.span(),
                    });
                }
            }
        }
    }

    let (min, max) = type_name.arity();
    if args.len() < min || args.len() > max {
        return Err(ParseError::CastArityMismatch {
            type_name: String::from(type_name.as_str()),
            min,
            max,
            found: args.len(),
            span: type_span,
        });
    }

    let mut final_name = String::from(name);
    if type_name == TypeName::Time {
        if let Some(arg) = args.first() {
            let precision = arg
                .token
                .as_ref()
                .and_then(|t| t.value.as_ref())
                .and_then(LiteralValue::as_i64)
                .unwrap_or(-1);
            if !(0..=9).contains(&precision) {
                return Err(ParseError::InvalidPrecisionForTime { span: arg.span() });
            }
        }
        if rest.is_keyword("with") {
            rest = rest.tail().expect_keyword("time")?.expect_keyword("zone")?;
            final_name = String::from("time_with_time_zone");
        }
    }

    Ok(ParseNode::with_token(
        NodeKind::Type,
        Token::with_text(TokenKind::Keyword, final_name, type_span),
        rest,
    )
    .with_children(args))
}

/// Validates a DATE literal string and extracts its value.
///
/// # Errors
///
/// Returns `InvalidDateString` when the string does not match the
/// strict `YYYY-MM-DD` shape or is not a valid calendar date.
pub(super) fn validate_date(text: &str, span: Span) -> Result<DateValue, ParseError> {
    let invalid = || ParseError::InvalidDateString {
        literal: String::from(text),
        span,
    };
    if !DATE_PATTERN.is_match(text) {
        return Err(invalid());
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| invalid())?;
    use chrono::Datelike;
    Ok(DateValue {
        year: date.year(),
        month: date.month(),
        day: date.day(),
    })
}

/// Validates a TIME literal string and extracts its value.
///
/// When `with_time_zone` is set and the string carries no offset, the
/// system's local offset is substituted. An explicit precision wins
/// over the one derived from the fractional digits present.
///
/// # Errors
///
/// Returns `InvalidTimeString` when the string does not match the
/// strict shape, names an invalid time of day, carries more than nine
/// fractional digits, or carries an offset outside [-18:00, +18:00].
pub(super) fn validate_time(
    text: &str,
    explicit_precision: Option<u32>,
    with_time_zone: bool,
    span: Span,
) -> Result<TimeValue, ParseError> {
    let invalid = || ParseError::InvalidTimeString {
        literal: String::from(text),
        span,
    };
    let captures = TIME_PATTERN.captures(text).ok_or_else(invalid)?;

    let hour: u32 = captures[1].parse().map_err(|_| invalid())?;
    let minute: u32 = captures[2].parse().map_err(|_| invalid())?;
    let second: u32 = captures[3].parse().map_err(|_| invalid())?;

    let fraction = captures.get(4).map(|m| m.as_str()).unwrap_or("");
    if fraction.len() > 9 {
        return Err(invalid());
    }
    let mut nanosecond: u32 = 0;
    if !fraction.is_empty() {
        let digits: u32 = fraction.parse().map_err(|_| invalid())?;
        nanosecond = digits * 10u32.pow(9 - fraction.len() as u32);
    }

    NaiveTime::from_hms_nano_opt(hour, minute, second, nanosecond).ok_or_else(invalid)?;

    let offset = match captures.get(5) {
        Some(sign) => {
            let offset_hours: i32 = captures[6].parse().map_err(|_| invalid())?;
            let offset_minutes: i32 = captures[7].parse().map_err(|_| invalid())?;
            if offset_minutes >= 60 {
                return Err(invalid());
            }
            let total = offset_hours * 60 + offset_minutes;
            if total > 18 * 60 {
                return Err(invalid());
            }
            let total = if sign.as_str() == "-" { -total } else { total };
            Some(total)
        }
        None => None,
    };

    let tz_offset_minutes = if with_time_zone {
        Some(offset.unwrap_or_else(system_offset_minutes))
    } else {
        offset
    };

    let precision = explicit_precision.unwrap_or(fraction.len() as u32);

    Ok(TimeValue {
        hour,
        minute,
        second,
        nanosecond,
        precision,
        with_time_zone,
        tz_offset_minutes,
    })
}

/// Returns the system's local UTC offset in minutes.
fn system_offset_minutes() -> i32 {
    chrono::Local::now().offset().local_minus_utc() / 60
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn view_of(tokens: &[Token]) -> TokenView<'_> {
        TokenView::new(tokens)
    }

    fn lex(input: &str) -> Vec<Token> {
        Lexer::new(input).tokenize().expect("tokenize failed")
    }

    #[test]
    fn test_parse_simple_type() {
        let tokens = lex("integer");
        let node = parse_type(view_of(&tokens)).unwrap();
        assert_eq!(node.kind, NodeKind::Type);
        assert_eq!(node.token.as_ref().unwrap().text(), Some("integer"));
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_parse_parameterized_type() {
        let tokens = lex("decimal(10, 2)");
        let node = parse_type(view_of(&tokens)).unwrap();
        assert_eq!(node.children.len(), 2);
    }

    #[test]
    fn test_type_arity_mismatch() {
        let tokens = lex("decimal(1, 2, 3)");
        let err = parse_type(view_of(&tokens)).unwrap_err();
        assert_eq!(err.code(), "cast_arity_mismatch");

        let tokens = lex("integer(1)");
        let err = parse_type(view_of(&tokens)).unwrap_err();
        assert_eq!(err.code(), "cast_arity_mismatch");
    }

    #[test]
    fn test_negative_type_parameter() {
        let tokens = lex("varchar(-1)");
        let err = parse_type(view_of(&tokens)).unwrap_err();
        assert_eq!(err.code(), "invalid_type_parameter");
    }

    #[test]
    fn test_time_with_time_zone_rewrite() {
        let tokens = lex("time (3) with time zone");
        let node = parse_type(view_of(&tokens)).unwrap();
        assert_eq!(
            node.token.as_ref().unwrap().text(),
            Some("time_with_time_zone")
        );
    }

    #[test]
    fn test_time_precision_out_of_range() {
        let tokens = lex("time (10)");
        let err = parse_type(view_of(&tokens)).unwrap_err();
        assert_eq!(err.code(), "invalid_precision_for_time");
    }

    #[test]
    fn test_null_and_missing_are_types() {
        let tokens = lex("null");
        assert!(parse_type(view_of(&tokens)).is_ok());
        let tokens = lex("missing");
        assert!(parse_type(view_of(&tokens)).is_ok());
    }

    #[test]
    fn test_validate_date() {
        let value = validate_date("2021-02-28", Span::default()).unwrap();
        assert_eq!((value.year, value.month, value.day), (2021, 2, 28));

        assert!(validate_date("2021-02-30", Span::default()).is_err());
        assert!(validate_date("+99999-01-01", Span::default()).is_err());
        assert!(validate_date("2021-2-1", Span::default()).is_err());
    }

    #[test]
    fn test_validate_time() {
        let value = validate_time("23:59:59.25", None, false, Span::default()).unwrap();
        assert_eq!(value.hour, 23);
        assert_eq!(value.nanosecond, 250_000_000);
        assert_eq!(value.precision, 2);
        assert_eq!(value.tz_offset_minutes, None);

        let value = validate_time("10:00:00+05:30", None, true, Span::default()).unwrap();
        assert_eq!(value.tz_offset_minutes, Some(330));

        // Zoneless TIME WITH TIME ZONE takes the system offset.
        let value = validate_time("10:00:00", None, true, Span::default()).unwrap();
        assert!(value.tz_offset_minutes.is_some());
    }

    #[test]
    fn test_validate_time_rejects() {
        assert!(validate_time("24:00:00", None, false, Span::default()).is_err());
        assert!(validate_time("10:60:00", None, false, Span::default()).is_err());
        assert!(validate_time("10:00:00.0123456789", None, false, Span::default()).is_err());
        assert!(validate_time("10:00:00+19:00", None, false, Span::default()).is_err());
        assert!(validate_time("1:00:00", None, false, Span::default()).is_err());
    }
}
