//! Search-path template resolver.
//!
//! Definitions carry URL path templates like
//! `/search?q={{ .Keywords }}&u={{ .Config.username }}`. Rather than expose
//! a general templating engine to untrusted definitions, this is a minimal
//! evaluator restricted to the documented substitutions and two transform
//! functions (`re_replace`, `replace`). Anything else in a `{{ ... }}`
//! construct yields [`TemplateError::Unresolved`] and callers fall back to
//! the indexer's bare base link: a half-rendered path is worse than no path.

use std::collections::BTreeMap;

use regex_lite::Regex;
use thiserror::Error;
use tracing::warn;

use crate::definition::IndexerDefinition;

/// Substituted for config placeholders with no declared value, so templates
/// referencing credentials still render for unauthenticated access.
pub const CONFIG_FALLBACK: &str = "guest";

/// Template rendering failure. Recoverable: callers fall back to the base
/// link instead of dereferencing a partially rendered path.
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    #[error("template could not be fully resolved: {construct:?}")]
    Unresolved { construct: String },
}

/// Render a search-path template against a keyword/config binding.
///
/// The keyword substitution is percent-encoded for URL-path safety. Missing
/// config keys substitute `fallback` rather than failing, so unauthenticated
/// probing of definitions that reference credentials still works.
pub fn render(
    template: &str,
    keywords: &str,
    config: &BTreeMap<String, String>,
    fallback: &str,
) -> Result<String, TemplateError> {
    let encoded_keywords = urlencoding::encode(keywords).into_owned();
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return Err(TemplateError::Unresolved {
                construct: rest[start..].to_string(),
            });
        };
        let construct = after[..end].trim();
        out.push_str(&eval_construct(
            construct,
            &encoded_keywords,
            config,
            fallback,
        )?);
        rest = &after[end + 2..];
    }
    out.push_str(rest);

    Ok(out)
}

/// Build the target URL for a definition: render its first search path
/// against the keywords and the settings-declared config values, then join
/// onto the base link. An unresolvable template falls back to the bare base
/// link. `None` only when the definition declares no links at all.
pub fn build_search_url(def: &IndexerDefinition, keywords: &str) -> Option<String> {
    let base = def.base_link()?;
    let Some(search_path) = def.first_search_path() else {
        return Some(base.to_string());
    };

    match render(
        &search_path.path,
        keywords,
        &def.config_values(),
        CONFIG_FALLBACK,
    ) {
        Ok(rendered) => Some(join_url(base, &rendered)),
        Err(TemplateError::Unresolved { construct }) => {
            warn!(
                indexer = %def.id,
                construct = %construct,
                "search path template unresolved, falling back to base link"
            );
            Some(base.to_string())
        }
    }
}

/// Join a rendered relative path onto a base link: exactly one trailing
/// slash is trimmed from the base and exactly one separator is inserted.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.strip_suffix('/').unwrap_or(base);
    if path.is_empty() {
        return base.to_string();
    }
    let path = path.strip_prefix('/').unwrap_or(path);
    format!("{base}/{path}")
}

fn eval_construct(
    construct: &str,
    keywords: &str,
    config: &BTreeMap<String, String>,
    fallback: &str,
) -> Result<String, TemplateError> {
    let tokens = tokenize(construct).ok_or_else(|| TemplateError::Unresolved {
        construct: construct.to_string(),
    })?;

    match tokens.as_slice() {
        [expr] if !expr.quoted => eval_expr(&expr.text, keywords, config, fallback).ok_or_else(
            || TemplateError::Unresolved {
                construct: construct.to_string(),
            },
        ),
        [func, input, a, b] if !func.quoted && func.text == "re_replace" => {
            let input = eval_arg(input, keywords, config, fallback, construct)?;
            // An invalid pattern leaves the input unchanged rather than
            // failing the whole render.
            Ok(match Regex::new(&a.text) {
                Ok(re) => re.replace_all(&input, b.text.as_str()).into_owned(),
                Err(_) => input,
            })
        }
        [func, input, a, b] if !func.quoted && func.text == "replace" => {
            let input = eval_arg(input, keywords, config, fallback, construct)?;
            Ok(input.replace(&a.text, &b.text))
        }
        _ => Err(TemplateError::Unresolved {
            construct: construct.to_string(),
        }),
    }
}

fn eval_arg(
    token: &Token,
    keywords: &str,
    config: &BTreeMap<String, String>,
    fallback: &str,
    construct: &str,
) -> Result<String, TemplateError> {
    if token.quoted {
        return Ok(token.text.clone());
    }
    eval_expr(&token.text, keywords, config, fallback).ok_or_else(|| TemplateError::Unresolved {
        construct: construct.to_string(),
    })
}

fn eval_expr(
    expr: &str,
    keywords: &str,
    config: &BTreeMap<String, String>,
    fallback: &str,
) -> Option<String> {
    if expr == ".Keywords" {
        return Some(keywords.to_string());
    }
    if let Some(name) = expr.strip_prefix(".Config.") {
        return Some(
            config
                .get(name)
                .cloned()
                .unwrap_or_else(|| fallback.to_string()),
        );
    }
    None
}

#[derive(Debug)]
struct Token {
    text: String,
    quoted: bool,
}

/// Split a construct into whitespace-separated tokens, honoring double
/// quotes with `\"` and `\\` escapes. Returns `None` on unbalanced quoting.
fn tokenize(construct: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = construct.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next()? {
                    '"' => break,
                    '\\' => match chars.next()? {
                        '"' => text.push('"'),
                        '\\' => text.push('\\'),
                        other => {
                            // Pass unknown escapes through as written.
                            text.push('\\');
                            text.push(other);
                        }
                    },
                    other => text.push(other),
                }
            }
            tokens.push(Token { text, quoted: true });
        } else {
            let mut text = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                text.push(c);
                chars.next();
            }
            tokens.push(Token {
                text,
                quoted: false,
            });
        }
    }

    Some(tokens)
}
