//! Identifier-safe names for C++ operator symbols.
//!
//! An operator whose signature mentions a loaded type is re-exposed under a
//! plain identifier (`operator_plus_BE`), since its Interface-typed overload
//! cannot share the original operator's name. Symbols missing from this
//! table cannot be wrapped.

const OPERATOR_NAMES: &[(&str, &str)] = &[
    ("=", "equal"),
    ("+", "plus"),
    ("-", "minus"),
    ("*", "asterix"),
    ("/", "slash"),
    ("%", "percent"),
    ("^", "caret"),
    ("&", "ampersand"),
    ("|", "pipe"),
    ("~", "tilde"),
    ("!", "not"),
    ("<", "less"),
    (">", "greater"),
    ("+=", "plus_equal"),
    ("-=", "minus_equal"),
    ("*=", "asterix_equal"),
    ("/=", "slash_equal"),
    ("%=", "percent_equal"),
    ("^=", "caret_equal"),
    ("&=", "ampersand_equal"),
    ("|=", "pipe_equal"),
    ("<<", "shift_left"),
    (">>", "shift_right"),
    ("<<=", "shift_left_equal"),
    (">>=", "shift_right_equal"),
    ("==", "equal_equal"),
    ("!=", "not_equal"),
    ("<=", "less_equal"),
    (">=", "greater_equal"),
    ("&&", "and"),
    ("||", "or"),
    ("++", "plus_plus"),
    ("--", "minus_minus"),
    (",", "comma"),
    ("->*", "arrow_asterix"),
    ("->", "arrow"),
    ("()", "call"),
    ("[]", "square_bracket_pair"),
];

/// Identifier for an operator symbol, if the symbol is supported.
pub fn operator_name(symbol: &str) -> Option<&'static str> {
    let symbol = symbol.trim();
    let symbol = symbol.strip_prefix("operator").unwrap_or(symbol).trim();
    OPERATOR_NAMES
        .iter()
        .find(|(sym, _)| *sym == symbol)
        .map(|(_, name)| *name)
}
