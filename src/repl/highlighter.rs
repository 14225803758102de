use crate::ast::Builtin;
use crate::symbols::PIPELINE_VARIABLES;
use crate::typechecker::types::Type;

pub fn normalize_line(input: &str) -> String {
    input.trim_end().to_string()
}

const ANSI_RESET: &str = "\x1b[0m";
const ANSI_KEYWORD: &str = "\x1b[94m";
const ANSI_TYPE: &str = "\x1b[96m";
const ANSI_BUILTIN: &str = "\x1b[95m";
const ANSI_NUMBER: &str = "\x1b[93m";
const ANSI_COMMENT: &str = "\x1b[90m";

const KEYWORDS: &[&str] = &["if", "else", "const", "true", "false"];

const FUNCTIONS: &[Builtin] = &[Builtin::Dp3, Builtin::Rsq, Builtin::Lit];

/// Whether `source` still has an open brace, bracket, paren or block comment, or
/// ends in the middle of an expression.
pub fn needs_more_input(source: &str) -> bool {
    let mut paren_depth: i32 = 0;
    let mut brace_depth: i32 = 0;
    let mut bracket_depth: i32 = 0;
    let mut in_block_comment = false;
    let mut chars = source.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_block_comment {
            if ch == '*' && chars.peek() == Some(&'/') {
                let _ = chars.next();
                in_block_comment = false;
            }
            continue;
        }

        if ch == '/' && chars.peek() == Some(&'/') {
            while let Some(next) = chars.peek() {
                if *next == '\n' {
                    break;
                }
                let _ = chars.next();
            }
            continue;
        }

        if ch == '/' && chars.peek() == Some(&'*') {
            let _ = chars.next();
            in_block_comment = true;
            continue;
        }

        match ch {
            '(' => paren_depth += 1,
            ')' => paren_depth -= 1,
            '{' => brace_depth += 1,
            '}' => brace_depth -= 1,
            '[' => bracket_depth += 1,
            ']' => bracket_depth -= 1,
            _ => {}
        }
    }

    if in_block_comment {
        return true;
    }
    if paren_depth > 0 || brace_depth > 0 || bracket_depth > 0 {
        return true;
    }

    let trimmed = source.trim_end();
    if trimmed.is_empty() {
        return false;
    }
    ["+", "-", "*", "/", "^", "=", ",", "&&", "||", "!"]
        .iter()
        .any(|suffix| trimmed.ends_with(suffix))
}

pub fn colorize(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 16);
    let chars = input.chars().collect::<Vec<_>>();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if ch == '/' && chars.get(i + 1) == Some(&'/') {
            out.push_str(ANSI_COMMENT);
            while i < chars.len() && chars[i] != '\n' {
                out.push(chars[i]);
                i += 1;
            }
            out.push_str(ANSI_RESET);
            continue;
        }

        if ch == '/' && chars.get(i + 1) == Some(&'*') {
            out.push_str(ANSI_COMMENT);
            out.push_str("/*");
            i += 2;
            while i < chars.len() {
                if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                    out.push_str("*/");
                    i += 2;
                    break;
                }
                out.push(chars[i]);
                i += 1;
            }
            out.push_str(ANSI_RESET);
            continue;
        }

        if ch.is_ascii_digit() || (ch == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit))
        {
            out.push_str(ANSI_NUMBER);
            out.push(ch);
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                out.push(chars[i]);
                i += 1;
            }
            out.push_str(ANSI_RESET);
            continue;
        }

        if ch == '_' || ch.is_ascii_alphabetic() {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i] == '_' || chars[i].is_ascii_alphanumeric()) {
                i += 1;
            }
            let word = chars[start..i].iter().collect::<String>();
            let color = if KEYWORDS.contains(&word.as_str()) {
                Some(ANSI_KEYWORD)
            } else if Type::from_keyword(&word).is_some() {
                Some(ANSI_TYPE)
            } else if Builtin::from_name(&word).is_some() {
                Some(ANSI_BUILTIN)
            } else {
                None
            };
            match color {
                Some(color) => {
                    out.push_str(color);
                    out.push_str(&word);
                    out.push_str(ANSI_RESET);
                }
                None => out.push_str(&word),
            }
            continue;
        }

        out.push(ch);
        i += 1;
    }

    out
}

/// Keywords, type names, built-in functions, pipeline variables and `symbols`
/// starting with `prefix`, sorted.
pub fn complete(prefix: &str, symbols: &[String]) -> Vec<String> {
    let mut candidates = KEYWORDS
        .iter()
        .map(|keyword| keyword.to_string())
        .collect::<Vec<_>>();
    candidates.extend(Type::ALL.iter().map(|ty| ty.keyword().to_string()));
    candidates.extend(FUNCTIONS.iter().map(|func| func.name().to_string()));
    candidates.extend(PIPELINE_VARIABLES.iter().map(|var| var.name.to_string()));
    candidates.extend(symbols.iter().cloned());
    candidates.sort();
    candidates.dedup();
    candidates
        .into_iter()
        .filter(|candidate| candidate.starts_with(prefix))
        .collect()
}
