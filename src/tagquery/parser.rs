//! Tag query expression parser
//!
//! Grammar of a single expression:
//!
//! ```text
//! <key>[!|^]=[~]<value>
//! ```
//!
//! The value may be empty. `;` separates expressions upstream and is
//! rejected anywhere inside one. The operator is derived from the
//! combination of `!`, `^`, `~` and whether the value is empty:
//!
//! | text          | operator      |
//! |---------------|---------------|
//! | `k=v`         | `Equal`       |
//! | `k!=v`        | `NotEqual`    |
//! | `k=~v`        | `Match`       |
//! | `k!=~v`       | `NotMatch`    |
//! | `k^=v`        | `Prefix`      |
//! | `k!=`, `k^=`  | `HasTag`      |
//! | `k=`, `k=~`   | `NotHasTag`   |
//! | `__tag^=v`    | `PrefixTag`   |
//! | `__tag=~v`    | `MatchTag`    |

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::metrics;

use super::expression::{Expression, ExpressionCommon, RegexExpression, TAG_KEY};
use super::expressions::Expressions;
use super::operator::ExpressionOperator;
use super::validate::validate_query_expression_tag_key;

/// Parse a single expression
pub fn parse_expression(expr: &str) -> Result<Expression> {
    match parse_expression_internal(expr) {
        Ok(expression) => {
            metrics::record_parsed(expression.operator().as_str());
            Ok(expression)
        }
        Err(e) => {
            debug!(expression = %expr, error = %e, "rejected tag query expression");
            metrics::record_parse_error(e.kind());
            Err(e)
        }
    }
}

/// Parse a list of expressions, failing on the first invalid one
pub fn parse_expressions<S: AsRef<str>>(expressions: &[S]) -> Result<Expressions> {
    expressions
        .iter()
        .map(|e| parse_expression(e.as_ref()))
        .collect::<Result<Vec<_>>>()
        .map(Expressions::from)
}

fn invalid(expr: &str) -> Error {
    Error::InvalidExpression(expr.to_string())
}

fn parse_expression_internal(expr: &str) -> Result<Expression> {
    let bytes = expr.as_bytes();
    let mut pos = 0;
    let mut not = false;
    let mut prefix = false;

    // scan up to the operator to find the key
    while pos < bytes.len() {
        match bytes[pos] {
            b'=' => break,
            b'!' => {
                not = true;
                break;
            }
            b'^' => {
                prefix = true;
                break;
            }
            b';' => return Err(invalid(expr)),
            _ => pos += 1,
        }
    }

    if pos == 0 {
        return Err(invalid(expr));
    }

    let key = &expr[..pos];
    validate_query_expression_tag_key(key).map_err(|source| Error::InvalidKey {
        key: key.to_string(),
        expression: expr.to_string(),
        source,
    })?;

    // step over ! or ^
    if not || prefix {
        pos += 1;
    }

    if bytes.get(pos) != Some(&b'=') {
        return Err(invalid(expr));
    }
    pos += 1;

    let mut regex = false;
    if bytes.get(pos) == Some(&b'~') {
        // ^=~ is not an operator
        if prefix {
            return Err(invalid(expr));
        }
        regex = true;
        pos += 1;
    }

    let value = &expr[pos..];
    if value.contains(';') {
        return Err(invalid(expr));
    }

    let mut operator = match (not, prefix, regex, value.is_empty()) {
        (true, _, _, true) => ExpressionOperator::HasTag,
        (true, _, true, false) => ExpressionOperator::NotMatch,
        (true, _, false, false) => ExpressionOperator::NotEqual,
        (false, true, _, true) => ExpressionOperator::HasTag,
        (false, true, _, false) => ExpressionOperator::Prefix,
        (false, false, _, true) => ExpressionOperator::NotHasTag,
        (false, false, true, false) => ExpressionOperator::Match,
        (false, false, false, false) => ExpressionOperator::Equal,
    };

    if key == TAG_KEY {
        // negation is not supported on tag names and a value is required
        if not || value.is_empty() {
            return Err(invalid(expr));
        }

        operator = match operator {
            ExpressionOperator::Prefix => ExpressionOperator::PrefixTag,
            ExpressionOperator::Match => ExpressionOperator::MatchTag,
            other => other,
        };
    }

    let common = ExpressionCommon {
        key: key.to_string(),
        value: value.to_string(),
    };

    let expression = match operator {
        ExpressionOperator::Equal => Expression::Equal(common),
        ExpressionOperator::NotEqual => Expression::NotEqual(common),
        ExpressionOperator::Prefix => Expression::Prefix(common),
        ExpressionOperator::PrefixTag => Expression::PrefixTag(common),
        ExpressionOperator::HasTag => Expression::HasTag(common),
        ExpressionOperator::NotHasTag => Expression::NotHasTag(common),
        ExpressionOperator::Match => {
            let re = compile_anchored(value)?;
            Expression::Match(RegexExpression::new(common, re))
        }
        ExpressionOperator::NotMatch => {
            let re = compile_anchored(value)?;
            Expression::NotMatch(RegexExpression::new(common, re))
        }
        ExpressionOperator::MatchTag => {
            let re = compile_anchored(value)?;
            Expression::MatchTag(RegexExpression::new(common, re))
        }
        ExpressionOperator::MatchAll | ExpressionOperator::MatchNone => {
            return Err(invalid(expr));
        }
    };

    Ok(expression)
}

/// Compile `pattern`, anchoring it to the start of the value unless it
/// already is
fn compile_anchored(pattern: &str) -> Result<Regex> {
    let anchored;
    let source = if !pattern.is_empty() && !pattern.starts_with('^') {
        anchored = format!("^(?:{})", pattern);
        anchored.as_str()
    } else {
        pattern
    };

    Ok(Regex::new(source)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_parses(text: &str, operator: ExpressionOperator, key: &str, value: &str) {
        let e = parse_expression(text).unwrap_or_else(|e| panic!("{}: {}", text, e));
        assert_eq!(e.operator(), operator, "{}", text);
        assert_eq!(e.key(), key, "{}", text);
        assert_eq!(e.value(), value, "{}", text);
    }

    fn assert_invalid_expression(text: &str) {
        match parse_expression(text) {
            Err(Error::InvalidExpression(msg)) => assert_eq!(msg, text),
            other => panic!("{}: expected invalid expression, got {:?}", text, other),
        }
    }

    #[test]
    fn test_operator_table() {
        use ExpressionOperator::*;
        assert_parses("host=web01", Equal, "host", "web01");
        assert_parses("host!=web01", NotEqual, "host", "web01");
        assert_parses("host=~web.*", Match, "host", "web.*");
        assert_parses("host!=~web.*", NotMatch, "host", "web.*");
        assert_parses("host^=web", Prefix, "host", "web");
        assert_parses("host!=", HasTag, "host", "");
        assert_parses("host!=~", HasTag, "host", "");
        assert_parses("host^=", HasTag, "host", "");
        assert_parses("host=", NotHasTag, "host", "");
        assert_parses("host=~", NotHasTag, "host", "");
    }

    #[test]
    fn test_tag_key() {
        use ExpressionOperator::*;
        assert_parses("__tag^=ho", PrefixTag, "__tag", "ho");
        assert_parses("__tag=~ho.*", MatchTag, "__tag", "ho.*");
        assert_parses("__tag=host", Equal, "__tag", "host");
        assert_invalid_expression("__tag!=x");
        assert_invalid_expression("__tag!=~x");
        assert_invalid_expression("__tag=");
        assert_invalid_expression("__tag^=");
    }

    #[test]
    fn test_value_is_verbatim() {
        assert_parses("a=b=c", ExpressionOperator::Equal, "a", "b=c");
        assert_parses("a=!b", ExpressionOperator::Equal, "a", "!b");
        assert_parses("a!=~=~x", ExpressionOperator::NotMatch, "a", "=~x");
        assert_parses("a= b ", ExpressionOperator::Equal, "a", " b ");
    }

    #[test]
    fn test_malformed() {
        assert_invalid_expression("");
        assert_invalid_expression("=value");
        assert_invalid_expression("!=value");
        assert_invalid_expression("^=value");
        assert_invalid_expression("host");
        assert_invalid_expression("host!");
        assert_invalid_expression("host!x");
        assert_invalid_expression("host^~x");
        assert_invalid_expression("host^=~x");
        assert_invalid_expression("ho;st=x");
        assert_invalid_expression("host=x;y");
        assert_invalid_expression("host=~x;");
    }

    #[test]
    fn test_invalid_key() {
        let err = parse_expression("ho\u{7}st=x").unwrap_err();
        assert!(matches!(err, Error::InvalidKey { .. }));
        assert!(err.to_string().contains("Error when validating key"));
    }

    #[test]
    fn test_invalid_regex_is_passed_through() {
        let err = parse_expression("host=~web(").unwrap_err();
        match err {
            Error::Regex(_) => {}
            other => panic!("expected regex error, got {:?}", other),
        }
    }

    #[test]
    fn test_regex_anchoring() {
        let e = parse_expression("host=~web").unwrap();
        let re = e.regex_expression().unwrap().regex();
        assert_eq!(re.as_str(), "^(?:web)");
        assert!(re.is_match("web01"));
        assert!(!re.is_match("myweb"));

        // already anchored patterns are not wrapped again
        let e = parse_expression("host=~^web").unwrap();
        assert_eq!(e.regex_expression().unwrap().regex().as_str(), "^web");

        // alternation stays inside the anchor
        let e = parse_expression("host=~a|b").unwrap();
        assert!(!e.value_passes("xb"));
        assert!(e.value_passes("b"));
    }

    #[test]
    fn test_large_unicode_classes_compile() {
        for text in ["host=~\\w{50}", "host=~\\w{100}"] {
            let e = parse_expression(text).unwrap_or_else(|e| panic!("{}: {}", text, e));
            assert_eq!(e.operator(), ExpressionOperator::Match);
        }
        let e = parse_expression("host=~\\w{50}").unwrap();
        assert!(e.value_passes(&"a".repeat(50)));
        assert!(!e.value_passes(&"a".repeat(49)));
    }

    #[test]
    fn test_matches_empty() {
        let e = parse_expression("host!=~.*").unwrap();
        assert!(e.regex_expression().unwrap().matches_empty());
        let e = parse_expression("host!=~abc").unwrap();
        assert!(!e.regex_expression().unwrap().matches_empty());
    }

    #[test]
    fn test_multibyte_key_and_value() {
        assert_parses("région=été", ExpressionOperator::Equal, "région", "été");
        assert_parses("ключ!=~зн.*", ExpressionOperator::NotMatch, "ключ", "зн.*");
    }

    #[test]
    fn test_parse_expressions() {
        let expressions = parse_expressions(&["a=b", "c!=d"]).unwrap();
        assert_eq!(expressions.len(), 2);
        assert!(parse_expressions(&["a=b", "c"]).is_err());
        assert!(parse_expressions::<&str>(&[]).unwrap().is_empty());
    }
}
