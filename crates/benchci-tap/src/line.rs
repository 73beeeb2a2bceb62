use std::fmt;

/// Directive attached to a result line.
///
/// Either form exempts a `not ok` result from failing the transcript:
/// `TODO` marks a known, tolerated failure and `SKIP` marks a test that was
/// never run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Todo,
    Skip,
}

/// One parsed line of TAP output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapLine {
    /// `TAP version 13`
    Version(u32),
    /// `1..N`
    Plan { count: usize },
    /// `ok N - description`, `not ok N - description`, or a directive form
    /// such as `ok N # SKIP reason`.
    TestResult {
        passed: bool,
        number: usize,
        description: String,
        directive: Option<Directive>,
    },
    /// `# text`
    Diagnostic(String),
    /// Anything outside the grammar, preserved verbatim. Boards print
    /// banners and debug noise between protocol lines; those lines stay in
    /// the transcript but carry no protocol meaning.
    Other(String),
}

impl TapLine {
    /// Parses one raw line. Never fails: unrecognized input comes back as
    /// [`TapLine::Other`]. Trailing CR/LF is stripped first.
    pub fn parse(line: &str) -> TapLine {
        let trimmed = line.trim_end_matches(['\r', '\n']);

        if let Some(rest) = trimmed.strip_prefix("TAP version ") {
            if let Ok(version) = rest.trim().parse() {
                return TapLine::Version(version);
            }
        }
        if let Some(rest) = trimmed.strip_prefix("1..") {
            if let Ok(count) = rest.trim().parse() {
                return TapLine::Plan { count };
            }
        }
        if let Some(rest) = trimmed.strip_prefix("not ok") {
            if let Some(parsed) = parse_result(false, rest) {
                return parsed;
            }
        } else if let Some(rest) = trimmed.strip_prefix("ok") {
            if let Some(parsed) = parse_result(true, rest) {
                return parsed;
            }
        }
        if let Some(rest) = trimmed.strip_prefix("# ") {
            return TapLine::Diagnostic(rest.to_string());
        }
        if trimmed == "#" {
            return TapLine::Diagnostic(String::new());
        }
        TapLine::Other(trimmed.to_string())
    }

    /// True for a result line that fails the transcript: `not ok` with no
    /// exempting directive.
    pub fn is_unexempted_failure(&self) -> bool {
        matches!(
            self,
            TapLine::TestResult {
                passed: false,
                directive: None,
                ..
            }
        )
    }

    pub fn is_result(&self) -> bool {
        matches!(self, TapLine::TestResult { .. })
    }
}

impl fmt::Display for TapLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapLine::Version(version) => write!(f, "TAP version {version}"),
            TapLine::Plan { count } => write!(f, "1..{count}"),
            TapLine::TestResult {
                passed,
                number,
                description,
                directive,
            } => {
                let status = if *passed { "ok" } else { "not ok" };
                match directive {
                    Some(Directive::Todo) => write!(f, "{status} {number} # TODO {description}"),
                    Some(Directive::Skip) => write!(f, "{status} {number} # SKIP {description}"),
                    None if description.is_empty() => write!(f, "{status} {number}"),
                    None => write!(f, "{status} {number} - {description}"),
                }
            }
            TapLine::Diagnostic(text) => write!(f, "# {text}"),
            TapLine::Other(text) => write!(f, "{text}"),
        }
    }
}

/// Parses the remainder of a result line after the `ok`/`not ok` keyword.
/// Accepts ` N - description`, the ordinal-adjacent directive form
/// ` N # TODO description`, and the suffix form ` N - description # SKIP why`.
fn parse_result(passed: bool, rest: &str) -> Option<TapLine> {
    let rest = rest.strip_prefix(' ')?;
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let tail = &rest[digits_end..];
    if !tail.is_empty() && !tail.starts_with(' ') {
        // "ok 1x" is not a result line
        return None;
    }
    let number = rest[..digits_end].parse().ok()?;

    let (body, directive) = split_directive(tail.trim_start());
    let body = body
        .strip_prefix('-')
        .map(str::trim_start)
        .unwrap_or(body)
        .trim_end();
    let description = if body.is_empty() {
        directive.map(|(_, text)| text).unwrap_or_default()
    } else {
        body
    };

    Some(TapLine::TestResult {
        passed,
        number,
        description: description.to_string(),
        directive: directive.map(|(d, _)| d),
    })
}

/// Splits a `# TODO ...` / `# SKIP ...` directive off a result body,
/// returning the body and the directive with its trailing text.
fn split_directive(tail: &str) -> (&str, Option<(Directive, &str)>) {
    let mut search = 0;
    while let Some(pos) = tail[search..].find('#') {
        let at = search + pos;
        let after = tail[at + 1..].trim_start();
        for (keyword, directive) in [("TODO", Directive::Todo), ("SKIP", Directive::Skip)] {
            if let Some(text) = after.strip_prefix(keyword) {
                if text.is_empty() || text.starts_with(' ') {
                    return (tail[..at].trim_end(), Some((directive, text.trim_start())));
                }
            }
        }
        search = at + 1;
    }
    (tail, None)
}
