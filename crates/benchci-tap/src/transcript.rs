use crate::line::TapLine;

/// Overall outcome of a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

/// Accumulates parsed TAP lines and tracks completion against the plan.
///
/// The expected test count is fixed by the first `1..N` marker seen; later
/// plan lines are kept in the transcript but do not move the target. A
/// transcript with no result lines at all passes at this level; deciding
/// whether silence is acceptable is the caller's business (the harness
/// treats it as a timeout).
#[derive(Debug, Default)]
pub struct Transcript {
    lines: Vec<TapLine>,
    plan: Option<usize>,
    results_seen: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and appends one raw line.
    pub fn push_raw(&mut self, raw: &str) {
        self.push(TapLine::parse(raw));
    }

    pub fn push(&mut self, line: TapLine) {
        match &line {
            TapLine::Plan { count } if self.plan.is_none() => self.plan = Some(*count),
            TapLine::TestResult { .. } => self.results_seen += 1,
            _ => {}
        }
        self.lines.push(line);
    }

    /// Expected result count from the first plan marker, if one arrived.
    pub fn plan(&self) -> Option<usize> {
        self.plan
    }

    pub fn results_seen(&self) -> usize {
        self.results_seen
    }

    /// True once a plan was announced and at least that many result lines
    /// have arrived. This is the collection termination rule.
    pub fn plan_satisfied(&self) -> bool {
        matches!(self.plan, Some(count) if self.results_seen >= count)
    }

    pub fn lines(&self) -> &[TapLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Result lines that fail the transcript.
    pub fn failures(&self) -> Vec<&TapLine> {
        self.lines
            .iter()
            .filter(|line| line.is_unexempted_failure())
            .collect()
    }

    /// Fail iff at least one result line is `not ok` without a TODO or
    /// SKIP directive.
    pub fn verdict(&self) -> Verdict {
        if self.lines.iter().any(TapLine::is_unexempted_failure) {
            Verdict::Fail
        } else {
            Verdict::Pass
        }
    }
}
