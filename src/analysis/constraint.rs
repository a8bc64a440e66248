//! Build constraint evaluation.
//!
//! Decides whether a Go source file takes part in the build, from its
//! `//go:build` or legacy `// +build` lines and its `_GOOS` / `_GOARCH`
//! file name suffixes.

use std::collections::HashSet;
use std::env;

use thiserror::Error;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

/// A malformed `//go:build` expression.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConstraintError {
    #[error("unexpected token {found:?} in build constraint")]
    UnexpectedToken { found: String },

    #[error("unexpected end of build constraint")]
    UnexpectedEnd,
}

/// Target platform and tags that build constraints are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    pub cgo_enabled: bool,
    pub tags: HashSet<String>,
}

impl BuildContext {
    /// Creates a context for an explicit platform.
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
            cgo_enabled: true,
            tags: tags.into_iter().collect(),
        }
    }

    /// Creates a context from `GOOS`, `GOARCH` and `CGO_ENABLED`, falling back
    /// to the host platform.
    pub fn from_env(tags: Vec<String>) -> Self {
        let goos = env::var("GOOS").unwrap_or_else(|_| host_goos().to_string());
        let goarch = env::var("GOARCH").unwrap_or_else(|_| host_goarch().to_string());
        let mut context = Self::new(goos, goarch, tags);
        context.cgo_enabled = env::var("CGO_ENABLED").map_or(true, |v| v != "0");
        context
    }

    /// Reports whether a single build tag is satisfied.
    pub fn matches_tag(&self, tag: &str) -> bool {
        if self.tags.contains(tag) {
            return true;
        }
        match tag {
            "gc" => true,
            "cgo" => self.cgo_enabled,
            "unix" => UNIX_OS.contains(&self.goos.as_str()),
            "linux" if self.goos == "android" => true,
            "solaris" if self.goos == "illumos" => true,
            "darwin" if self.goos == "ios" => true,
            _ if tag == self.goos || tag == self.goarch => true,
            _ => is_release_tag(tag),
        }
    }

    /// Evaluates a `//go:build` expression.
    ///
    /// # Example
    ///
    /// ```
    /// use godepgraph::analysis::constraint::BuildContext;
    ///
    /// let ctx = BuildContext::new("linux", "amd64", vec!["integration".to_string()]);
    /// assert!(ctx.eval("linux && (amd64 || arm64)").unwrap());
    /// assert!(ctx.eval("integration && !windows").unwrap());
    /// assert!(!ctx.eval("ignore").unwrap());
    /// ```
    pub fn eval(&self, expr: &str) -> Result<bool, ConstraintError> {
        let tokens = tokenize(expr)?;
        let mut parser = ExprParser {
            tokens: &tokens,
            pos: 0,
            context: self,
        };
        let value = parser.or_expr()?;
        match parser.peek() {
            None => Ok(value),
            Some(tok) => Err(ConstraintError::UnexpectedToken {
                found: tok.to_string(),
            }),
        }
    }

    /// Evaluates one legacy `// +build` line.
    ///
    /// Space separated options are OR-ed, comma separated terms within an
    /// option are AND-ed, and a leading `!` negates a term.
    ///
    /// # Example
    ///
    /// ```
    /// use godepgraph::analysis::constraint::BuildContext;
    ///
    /// let ctx = BuildContext::new("linux", "amd64", Vec::new());
    /// assert!(ctx.eval_plus_build("darwin linux,amd64").unwrap());
    /// assert!(!ctx.eval_plus_build("ignore").unwrap());
    /// ```
    pub fn eval_plus_build(&self, line: &str) -> Result<bool, ConstraintError> {
        let mut any = false;
        for option in line.split_whitespace() {
            let mut all = true;
            for term in option.split(',') {
                let (negated, tag) = match term.strip_prefix('!') {
                    Some(tag) => (true, tag),
                    None => (false, term),
                };
                if tag.is_empty() || !tag.bytes().all(is_tag_byte) {
                    return Err(ConstraintError::UnexpectedToken {
                        found: term.to_string(),
                    });
                }
                if self.matches_tag(tag) == negated {
                    all = false;
                }
            }
            any |= all;
        }
        Ok(any)
    }

    /// Reports whether the header constraints of a source file admit it.
    ///
    /// A `//go:build` line wins; otherwise every `// +build` line must hold.
    pub fn matches_source(&self, source: &str) -> Result<bool, ConstraintError> {
        if let Some(expr) = find_build_expr(source) {
            return self.eval(expr);
        }
        for line in find_plus_build_lines(source) {
            if !self.eval_plus_build(line)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Checks the `_GOOS`, `_GOARCH` and `_GOOS_GOARCH` file name suffixes.
    ///
    /// The part of the name before the first underscore never counts, so
    /// `linux.go` is unconstrained while `poll_linux.go` is not.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        let stem = file_name.strip_suffix(".go").unwrap_or(file_name);
        let Some(idx) = stem.find('_') else {
            return true;
        };
        let stem = &stem[idx..];
        let stem = stem.strip_suffix("_test").unwrap_or(stem);

        let parts: Vec<&str> = stem.split('_').collect();
        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.matches_tag(parts[n - 2]) && self.matches_tag(parts[n - 1]);
        }
        if n >= 1 {
            let last = parts[n - 1];
            if KNOWN_OS.contains(&last) || KNOWN_ARCH.contains(&last) {
                return self.matches_tag(last);
            }
        }
        true
    }
}

/// Returns the `//go:build` expression in a file header, if any.
///
/// Only the leading run of blank lines and line comments before the package
/// clause is searched.
pub fn find_build_expr(source: &str) -> Option<&str> {
    for line in source.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(comment) = line.strip_prefix("//") else {
            return None;
        };
        if let Some(expr) = comment.strip_prefix("go:build") {
            if expr.is_empty() || expr.starts_with([' ', '\t']) {
                return Some(expr.trim());
            }
        }
    }
    None
}

/// Returns the legacy `// +build` lines in a file header.
pub fn find_plus_build_lines(source: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    for line in source.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(comment) = line.strip_prefix("//") else {
            break;
        };
        if let Some(rest) = comment.trim_start().strip_prefix("+build") {
            if rest.is_empty() || rest.starts_with([' ', '\t']) {
                lines.push(rest.trim());
            }
        }
    }
    lines
}

fn is_release_tag(tag: &str) -> bool {
    tag.strip_prefix("go1.")
        .is_some_and(|minor| !minor.is_empty() && minor.chars().all(|c| c.is_ascii_digit()))
}

/// Maps the host OS to its GOOS name.
pub fn host_goos() -> &'static str {
    match env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Maps the host architecture to its GOARCH name.
pub fn host_goarch() -> &'static str {
    match env::consts::ARCH {
        "x86" => "386",
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "loongarch64" => "loong64",
        "powerpc" => "ppc",
        "powerpc64" => "ppc64",
        "wasm32" => "wasm",
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Tag(&'a str),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Tag(t) => write!(f, "{}", t),
            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
            Token::Not => write!(f, "!"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(expr: &str) -> Result<Vec<Token<'_>>, ConstraintError> {
    let mut tokens = Vec::new();
    let bytes = expr.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' => i += 1,
            b'(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            b')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            b'!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            b'&' | b'|' => {
                if bytes.get(i + 1) != Some(&c) {
                    return Err(ConstraintError::UnexpectedToken {
                        found: (c as char).to_string(),
                    });
                }
                tokens.push(if c == b'&' { Token::And } else { Token::Or });
                i += 2;
            }
            _ if is_tag_byte(c) => {
                let start = i;
                while i < bytes.len() && is_tag_byte(bytes[i]) {
                    i += 1;
                }
                tokens.push(Token::Tag(&expr[start..i]));
            }
            _ => {
                let found = expr[i..].chars().next().map(String::from).unwrap_or_default();
                return Err(ConstraintError::UnexpectedToken { found });
            }
        }
    }

    Ok(tokens)
}

fn is_tag_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'.'
}

struct ExprParser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    context: &'t BuildContext,
}

impl ExprParser<'_, '_> {
    fn peek(&self) -> Option<&Token<'_>> {
        self.tokens.get(self.pos)
    }

    fn or_expr(&mut self) -> Result<bool, ConstraintError> {
        let mut value = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.and_expr()?;
            value = value || rhs;
        }
        Ok(value)
    }

    fn and_expr(&mut self) -> Result<bool, ConstraintError> {
        let mut value = self.not_expr()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.not_expr()?;
            value = value && rhs;
        }
        Ok(value)
    }

    fn not_expr(&mut self) -> Result<bool, ConstraintError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(ConstraintError::UnexpectedEnd)?;
        self.pos += 1;

        match token {
            Token::Not => Ok(!self.not_expr()?),
            Token::LParen => {
                let value = self.or_expr()?;
                match self.tokens.get(self.pos) {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(value)
                    }
                    Some(other) => Err(ConstraintError::UnexpectedToken {
                        found: other.to_string(),
                    }),
                    None => Err(ConstraintError::UnexpectedEnd),
                }
            }
            Token::Tag(tag) => Ok(self.context.matches_tag(tag)),
            other => Err(ConstraintError::UnexpectedToken {
                found: other.to_string(),
            }),
        }
    }
}
