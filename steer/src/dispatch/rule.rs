use crate::config::{RuleSubject, RuleType};
use crate::dispatch::ecma::EcmaRegex;
use crate::dispatch::RequestInfo;
use regex::Regex;
use std::fmt::{Debug, Display, Formatter};

#[derive(Debug, Clone)]
pub enum PatternImpl {
    ShExp(Regex),
    Regex(EcmaRegex),
    Exact(String),
    /// A pattern that failed to compile; it never matches.
    Invalid(String),
}

impl PatternImpl {
    pub fn compile(rule_type: RuleType, pattern: &str) -> Self {
        match rule_type {
            RuleType::Shexp => match Regex::new(&shexp_to_regex(pattern)) {
                Ok(r) => PatternImpl::ShExp(r),
                Err(e) => {
                    tracing::warn!("Shell expression {:?} treated as non-match: {}", pattern, e);
                    PatternImpl::Invalid(pattern.to_string())
                }
            },
            RuleType::Regex => match EcmaRegex::new(pattern) {
                Ok(r) => PatternImpl::Regex(r),
                Err(e) => {
                    tracing::warn!("Regex {:?} treated as non-match: {}", pattern, e);
                    PatternImpl::Invalid(pattern.to_string())
                }
            },
            RuleType::Exact => PatternImpl::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, subject: &str) -> bool {
        match self {
            PatternImpl::ShExp(r) => r.is_match(subject),
            PatternImpl::Regex(r) => r.is_match(subject),
            PatternImpl::Exact(s) => s == subject,
            PatternImpl::Invalid(_) => false,
        }
    }
}

impl Display for PatternImpl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternImpl::ShExp(r) => write!(f, "SHEXP,{}", r),
            PatternImpl::Regex(r) => write!(f, "REGEX,{}", r),
            PatternImpl::Exact(s) => write!(f, "EXACT,{}", s),
            PatternImpl::Invalid(s) => write!(f, "INVALID,{}", s),
        }
    }
}

/// Anchored translation of a shell expression: `*` is any run, `?` any single
/// character, everything else is literal. Wildcards also match line breaks.
pub fn shexp_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 6);
    out.push_str("(?s)^");
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    out.push('$');
    out
}

pub struct CompiledRule<T: Clone> {
    subject: RuleSubject,
    pattern: PatternImpl,
    result: T,
}

impl<T: Clone> CompiledRule<T> {
    pub(crate) fn new(subject: RuleSubject, pattern: PatternImpl, result: T) -> Self {
        Self {
            subject,
            pattern,
            result,
        }
    }

    pub fn matches(&self, info: &RequestInfo) -> Option<T> {
        self.pattern
            .matches(info.subject(self.subject))
            .then(|| self.result.clone())
    }
}

impl<T: Clone> Debug for CompiledRule<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.pattern, self.subject)
    }
}

impl<T: Clone> Display for CompiledRule<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.pattern, self.subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shexp() {
        let m = |p: &str, s: &str| PatternImpl::compile(RuleType::Shexp, p).matches(s);
        assert!(m("*.example.com", "a.example.com"));
        assert!(m("*.example.com", "a.b.example.com"));
        assert!(!m("*.example.com", "example.com"));
        assert!(!m("*.example.com", "a.example.com.evil"));
        assert!(!m("*.example.com", "aXexample.com"));
        assert!(m("host-?", "host-1"));
        assert!(!m("host-?", "host-12"));
        assert!(!m("Example.com", "example.com"));
        assert!(m("a+b(c)[d]", "a+b(c)[d]"));
        assert!(m("*", ""));
        assert!(m("http://*/path?q=1", "http://x/path?q=1"));
        assert!(m("a*b", "a\nb"));
        assert_eq!(shexp_to_regex("*.a?"), r"(?s)^.*\.a.$");
    }

    #[test]
    fn test_regex_and_exact() {
        let regex = PatternImpl::compile(RuleType::Regex, r"internal\.");
        assert!(regex.matches("https://svc.internal.corp/"));
        assert!(!regex.matches("https://internalXcorp/"));
        let exact = PatternImpl::compile(RuleType::Exact, "example.com");
        assert!(exact.matches("example.com"));
        assert!(!exact.matches("www.example.com"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_invalid_regex() {
        let bad = PatternImpl::compile(RuleType::Regex, "(unclosed");
        assert!(matches!(bad, PatternImpl::Invalid(_)));
        assert!(!bad.matches("(unclosed"));
        assert!(logs_contain("treated as non-match"));
    }

    #[test]
    fn test_regex_uses_javascript_dialect() {
        // Inline flags are Rust-only syntax; a PAC script rejects them too.
        let flags = PatternImpl::compile(RuleType::Regex, "(?i)example");
        assert!(matches!(flags, PatternImpl::Invalid(_)));
        assert!(!flags.matches("EXAMPLE.com"));

        let digits = PatternImpl::compile(RuleType::Regex, r"/\d+$");
        assert!(digits.matches("http://x/7"));
        assert!(!digits.matches("http://x/\u{663}"));

        let lookahead = PatternImpl::compile(RuleType::Regex, r"^(?!www\.)");
        assert!(lookahead.matches("api.example.com"));
        assert!(!lookahead.matches("www.example.com"));
        assert_eq!(lookahead.to_string(), r"REGEX,^(?!www\.)");
    }
}
