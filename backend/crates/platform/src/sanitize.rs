//! Malicious Input Detection and Sanitization
//!
//! Stateless per-string scanning against known attack signatures.
//! Detection and sanitization are separate: a high-risk match on a
//! request body must reject the request, not merely clean it up.

use std::sync::LazyLock;

use regex::Regex;

/// Attack signature families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatCategory {
    SqlInjection,
    CrossSiteScripting,
    PathTraversal,
    CommandInjection,
}

impl ThreatCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatCategory::SqlInjection => "sql_injection",
            ThreatCategory::CrossSiteScripting => "xss",
            ThreatCategory::PathTraversal => "path_traversal",
            ThreatCategory::CommandInjection => "command_injection",
        }
    }

    /// SQL and command injection reach the data layer or the shell;
    /// XSS and traversal are serious but bounded by output encoding
    pub fn risk_level(&self) -> RiskLevel {
        match self {
            ThreatCategory::SqlInjection | ThreatCategory::CommandInjection => RiskLevel::High,
            ThreatCategory::CrossSiteScripting | ThreatCategory::PathTraversal => RiskLevel::Medium,
        }
    }
}

impl std::fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk classification of a scanned string
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Outcome of scanning one string
#[derive(Debug, Clone)]
pub struct ThreatReport {
    pub categories: Vec<ThreatCategory>,
    pub risk_level: RiskLevel,
}

impl ThreatReport {
    pub fn is_malicious(&self) -> bool {
        !self.categories.is_empty()
    }
}

static SQL_INJECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)('\s*(or|and)\b[^']{0,40}(=|<|>|\blike\b|\bin\b))|(\bunion\b.{0,30}\bselect\b)|(\bselect\b.{0,40}\bfrom\b)|(\binsert\s+into\b)|(\bdelete\s+from\b)|(\bdrop\s+(table|database|schema)\b)|(\bupdate\b\s+\S+\s+\bset\b)|(--\s|--$)|(/\*.*\*/)|(;\s*(select|insert|update|delete|drop)\b)|(\bexec(ute)?\s*\()|(\bxp_cmdshell\b)|(\bsleep\s*\(\s*\d)|(\bbenchmark\s*\()"#,
    )
    .expect("sql injection pattern must compile")
});

static CROSS_SITE_SCRIPTING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(<\s*/?\s*script\b)|(javascript\s*:)|(vbscript\s*:)|(\bon(abort|blur|click|dblclick|error|focus|keydown|keypress|keyup|load|mousedown|mouseover|mouseout|mouseup|submit|unload)\s*=)|(<\s*(iframe|embed|object|applet)\b)|(document\s*\.\s*(cookie|write|location))|(\beval\s*\()|(\bexpression\s*\()|(srcdoc\s*=)"#,
    )
    .expect("xss pattern must compile")
});

static PATH_TRAVERSAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(\.\./)|(\.\.\\)|(%2e%2e[/\\])|(%2e%2e%2f)|(\.\.%2f)|(\.\.%5c)|(%252e%252e)|(/etc/(passwd|shadow|hosts)\b)|([a-z]:\\windows\\)"#,
    )
    .expect("path traversal pattern must compile")
});

static COMMAND_INJECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)([;&|]\s*(cat|ls|pwd|whoami|id|rm|mv|cp|wget|curl|nc|ncat|bash|sh|zsh|cmd|powershell|ping|chmod|chown)\b)|(\$\([^)]{0,80}\))|(\$\{[^}]{0,80}\})|(`[^`]{1,80}`)|(\brm\s+-rf?\b)|(>+\s*/dev/(null|tcp))|(\|\s*tee\b)"#,
    )
    .expect("command injection pattern must compile")
});

/// Scan a string for attack signatures.
///
/// Returns every matched family; the overall risk is the highest
/// per-family risk, `Low` when nothing matched.
pub fn detect(text: &str) -> ThreatReport {
    let mut categories = Vec::new();

    if SQL_INJECTION.is_match(text) {
        categories.push(ThreatCategory::SqlInjection);
    }
    if CROSS_SITE_SCRIPTING.is_match(text) {
        categories.push(ThreatCategory::CrossSiteScripting);
    }
    if PATH_TRAVERSAL.is_match(text) {
        categories.push(ThreatCategory::PathTraversal);
    }
    if COMMAND_INJECTION.is_match(text) {
        categories.push(ThreatCategory::CommandInjection);
    }

    let risk_level = categories
        .iter()
        .map(|c| c.risk_level())
        .max()
        .unwrap_or(RiskLevel::Low);

    ThreatReport {
        categories,
        risk_level,
    }
}

/// Sanitization options
#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    /// Replace HTML-significant characters with entities
    pub escape_html: bool,
    /// Drop C0 control characters except `\n` and `\t`
    pub strip_control: bool,
    /// Maximum length in characters; excess is truncated
    pub max_length: Option<usize>,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            escape_html: true,
            strip_control: true,
            max_length: Some(10_000),
        }
    }
}

/// Clean a string for storage or display.
///
/// This never replaces detection: callers must run [`detect`] first and
/// reject high-risk input outright.
pub fn sanitize(text: &str, options: &SanitizeOptions) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        if options.strip_control && c.is_control() && c != '\n' && c != '\t' {
            continue;
        }
        if options.escape_html {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#x27;"),
                _ => out.push(c),
            }
        } else {
            out.push(c);
        }
    }

    if let Some(max) = options.max_length {
        if out.chars().count() > max {
            out = out.chars().take(max).collect();
        }
    }

    out
}
