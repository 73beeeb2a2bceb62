use std::io::{self, Write};

/// Emits TAP version 13 output to an underlying writer.
///
/// Test ordinals start at 1 and advance on every result line regardless of
/// outcome, so a transcript's result count can be checked against its plan.
///
/// # Example
///
/// ```
/// use benchci_tap::TapProducer;
///
/// let mut tap = TapProducer::new(Vec::new());
/// tap.header(2).unwrap();
/// tap.pass("spi configure").unwrap();
/// tap.fail("i2c read").unwrap();
/// let out = String::from_utf8(tap.into_inner()).unwrap();
/// assert_eq!(out, "TAP version 13\n1..2\nok 1 - spi configure\nnot ok 2 - i2c read\n");
/// ```
pub struct TapProducer<W: Write> {
    next_test_number: usize,
    /// When set, result lines use the `# TODO` directive form instead of
    /// the plain `- description` form. TODO failures do not fail a
    /// transcript.
    pub todo: bool,
    out: W,
}

impl<W: Write> TapProducer<W> {
    pub fn new(out: W) -> Self {
        Self {
            next_test_number: 1,
            todo: false,
            out,
        }
    }

    /// Writes the version line and, for a non-zero count, the `1..N` plan.
    pub fn header(&mut self, test_count: usize) -> io::Result<()> {
        writeln!(self.out, "TAP version 13")?;
        if test_count > 0 {
            writeln!(self.out, "1..{test_count}")?;
        }
        Ok(())
    }

    /// Emits one result line and advances the ordinal.
    pub fn ok(&mut self, passed: bool, description: &str) -> io::Result<()> {
        let status = if passed { "ok" } else { "not ok" };
        if self.todo {
            writeln!(
                self.out,
                "{status} {} # TODO {description}",
                self.next_test_number
            )?;
        } else {
            writeln!(
                self.out,
                "{status} {} - {description}",
                self.next_test_number
            )?;
        }
        self.next_test_number += 1;
        Ok(())
    }

    pub fn fail(&mut self, description: &str) -> io::Result<()> {
        self.ok(false, description)
    }

    pub fn pass(&mut self, description: &str) -> io::Result<()> {
        self.ok(true, description)
    }

    /// Emits `count` consecutive skipped results with contiguous ordinals.
    pub fn skip(&mut self, count: usize, description: &str) -> io::Result<()> {
        for _ in 0..count {
            writeln!(
                self.out,
                "ok {} # SKIP {description}",
                self.next_test_number
            )?;
            self.next_test_number += 1;
        }
        Ok(())
    }

    /// Emits a diagnostic. Every line of a multi-line message is prefixed
    /// with `# `; trailing newlines are trimmed first so the output stays
    /// one diagnostic block.
    pub fn diagnostic(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "# {}", reprefix_newlines(message))
    }

    /// Ordinal the next result line will carry.
    pub fn next_test_number(&self) -> usize {
        self.next_test_number
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn reprefix_newlines(s: &str) -> String {
    s.trim_end_matches('\n').replace('\n', "\n# ")
}
