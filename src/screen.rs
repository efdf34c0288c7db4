//! Syntactic screening of expressions before execution.
//!
//! The evaluator wraps every expression as the implicit return value of a
//! strict-mode function body. An input whose head is a function literal would
//! smuggle an arbitrary statement sequence through that wrapper, so the
//! screener classifies the syntactic head and rejects function forms unless
//! the session opts in via
//! [`EvalOptions::allow_function_forms`](crate::EvalOptions).
//!
//! This is a bounded head classification, not a grammar validator. It sees
//! through superficial disguise (unicode and hex escapes, whitespace,
//! comments, stacked parentheses) but makes no claim to defeat arbitrary
//! obfuscation. The realm, not the screener, is the isolation boundary; the
//! screener exists to keep statement sequences and long-running function
//! bodies out of sessions that asked for plain expressions.

use crate::{Fault, Result};
use regex::Regex;
use std::sync::LazyLock;

const LOG_TARGET: &str = "    screen";

static FUNCTION_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:async\s+)?function\b").expect("invalid regex"));

static ARROW_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:async\s+)?(?:\([^()]*\)|[A-Za-z_$][A-Za-z0-9_$]*)\s*=>").expect("invalid regex")
});

static STATEMENT_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:var|let|const|if|else|for|while|do|switch|case|try|catch|finally|return|throw|break|continue|debugger|with|import|export)\b",
    )
    .expect("invalid regex")
});

/// Classification of an expression's syntactic head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeShape {
    /// A plain value-producing expression.
    PlainExpression,
    /// A function literal at the head, optionally parenthesized and
    /// immediately applied.
    InvokedFunctionForm,
    /// A statement-keyword head that cannot be a single expression.
    Other,
}

/// Classifies the syntactic head of `code`.
///
/// Escapes are decoded and leading trivia (whitespace, comments) skipped
/// before matching, so `function () {}` classifies the same as
/// `function () {}`.
#[must_use]
pub fn classify(code: &str) -> CodeShape {
    let decoded = decode_escapes(code);
    let mut head = decoded.as_str();
    loop {
        head = skip_trivia(head);
        if FUNCTION_HEAD.is_match(head) || ARROW_HEAD.is_match(head) {
            return CodeShape::InvokedFunctionForm;
        }
        // Peel one grouping paren and look again, so `((function () {})())`
        // classifies like its innermost head.
        match head.strip_prefix('(') {
            Some(rest) => head = rest,
            None => break,
        }
    }
    if STATEMENT_HEAD.is_match(head) {
        return CodeShape::Other;
    }
    CodeShape::PlainExpression
}

/// Applies the session policy to a classified head.
pub(crate) fn screen(code: &str, allow_function_forms: bool) -> Result<()> {
    match classify(code) {
        CodeShape::PlainExpression => Ok(()),
        CodeShape::InvokedFunctionForm if allow_function_forms => Ok(()),
        CodeShape::InvokedFunctionForm => {
            log::debug!(target: LOG_TARGET, "rejected function form at expression head");
            Err(Fault::Syntax(
                "function forms are not allowed; pass a plain expression or enable allow_function_forms".to_owned(),
            ))
        }
        CodeShape::Other => {
            log::debug!(target: LOG_TARGET, "rejected statement keyword at expression head");
            Err(Fault::Syntax(
                "input starts with a statement keyword and cannot be a single expression".to_owned(),
            ))
        }
    }
}

/// Skips leading whitespace, `//` line comments, and `/* */` block comments.
fn skip_trivia(mut head: &str) -> &str {
    loop {
        let trimmed = head.trim_start();
        if let Some(rest) = trimmed.strip_prefix("//") {
            head = rest.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(rest) = trimmed.strip_prefix("/*") {
            match rest.split_once("*/") {
                Some((_, tail)) => head = tail,
                // Unterminated comment: nothing left to classify.
                None => return "",
            }
        } else {
            return trimmed;
        }
    }
}

/// Decodes `\uXXXX`, `\u{...}`, and `\xXX` escapes so an escaped keyword
/// classifies like the keyword it spells. Malformed escapes pass through
/// verbatim; the realm's own parser will reject them.
fn decode_escapes(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    let mut out = String::with_capacity(code.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() {
            let (decoded, consumed) = match chars[i + 1] {
                'u' if chars.get(i + 2) == Some(&'{') => decode_braced(&chars[i + 3..]),
                'u' => decode_fixed(&chars[i + 2..], 4),
                'x' => decode_fixed(&chars[i + 2..], 2),
                _ => (None, 0),
            };
            if let Some(c) = decoded {
                out.push(c);
                i += consumed;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// Decodes exactly `digits` hex digits; `consumed` covers the `\u`/`\x`
/// prefix too.
fn decode_fixed(chars: &[char], digits: usize) -> (Option<char>, usize) {
    if chars.len() < digits || !chars[..digits].iter().all(char::is_ascii_hexdigit) {
        return (None, 0);
    }
    let text: String = chars[..digits].iter().collect();
    let code = u32::from_str_radix(&text, 16).ok().and_then(char::from_u32);
    (code, 2 + digits)
}

/// Decodes `\u{...}`; `consumed` covers the `\u{` prefix and closing brace.
fn decode_braced(chars: &[char]) -> (Option<char>, usize) {
    let Some(close) = chars.iter().position(|c| *c == '}') else {
        return (None, 0);
    };
    if close == 0 || close > 6 || !chars[..close].iter().all(char::is_ascii_hexdigit) {
        return (None, 0);
    }
    let text: String = chars[..close].iter().collect();
    let code = u32::from_str_radix(&text, 16).ok().and_then(char::from_u32);
    (code, 3 + close + 1)
}
