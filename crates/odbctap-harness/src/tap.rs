//! TAP report stream
//!
//! Output format:
//!
//! ```text
//! 1..<N>
//! <ordinal> ok - <name>
//! <ordinal> not ok - <name>
//! # <diagnostic line>
//! ```

use std::fmt;
use std::io::{self, Write};

/// Result of a single test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestOutcome {
    Pass,
    Fail,
}

impl TestOutcome {
    /// TAP status keyword
    pub const fn status(self) -> &'static str {
        match self {
            TestOutcome::Pass => "ok",
            TestOutcome::Fail => "not ok",
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status())
    }
}

/// Receiver for `#` diagnostic lines
pub trait DiagnosticSink {
    /// Write one diagnostic; the `# ` prefix is added by the sink
    fn diagnostic(&mut self, line: &str);
}

/// One result line of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapLine {
    pub ordinal: usize,
    pub outcome: TestOutcome,
    pub name: String,
}

/// Plan and results of a run, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TapReport {
    pub plan: usize,
    pub lines: Vec<TapLine>,
}

impl TapReport {
    pub fn passed(&self) -> usize {
        self.count(TestOutcome::Pass)
    }

    pub fn failed(&self) -> usize {
        self.count(TestOutcome::Fail)
    }

    /// Every planned test has a result line
    pub fn is_complete(&self) -> bool {
        self.lines.len() == self.plan
    }

    fn count(&self, outcome: TestOutcome) -> usize {
        self.lines.iter().filter(|line| line.outcome == outcome).count()
    }
}

/// Writes the TAP stream and keeps the matching `TapReport`
///
/// Diagnostics written between `begin_test` and `result` are held back and
/// follow that test's result line; outside a test they are written at once.
///
/// Write errors never interrupt a run: the first one is kept and returned
/// by `finish`, later writes are skipped.
pub struct TapWriter<W: Write> {
    out: W,
    report: TapReport,
    in_test: bool,
    held: Vec<String>,
    error: Option<io::Error>,
}

impl<W: Write> TapWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            report: TapReport::default(),
            in_test: false,
            held: Vec::new(),
            error: None,
        }
    }

    /// Emit the plan line `1..count`
    pub fn plan(&mut self, count: usize) {
        self.report.plan = count;
        self.write_line(format_args!("1..{}", count));
        self.flush();
    }

    /// Start holding diagnostics for the test about to run
    pub fn begin_test(&mut self) {
        self.in_test = true;
    }

    /// Emit the result line of the next test, then its held diagnostics,
    /// and return its ordinal
    pub fn result(&mut self, outcome: TestOutcome, name: &str) -> usize {
        let ordinal = self.report.lines.len() + 1;
        self.write_line(format_args!("{} {} - {}", ordinal, outcome.status(), name));
        self.in_test = false;
        for line in std::mem::take(&mut self.held) {
            self.write_line(format_args!("{}", line));
        }
        self.flush();
        self.report.lines.push(TapLine {
            ordinal,
            outcome,
            name: name.to_string(),
        });
        ordinal
    }

    pub fn report(&self) -> &TapReport {
        &self.report
    }

    /// Flush the stream and hand back the report, or the first write error
    pub fn finish(mut self) -> io::Result<TapReport> {
        for line in std::mem::take(&mut self.held) {
            self.write_line(format_args!("{}", line));
        }
        self.flush();
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.report),
        }
    }

    fn write_line(&mut self, line: fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.out.write_fmt(format_args!("{}\n", line)) {
            tracing::warn!(error = %err, "failed to write TAP output");
            self.error = Some(err);
        }
    }

    fn flush(&mut self) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.out.flush() {
            tracing::warn!(error = %err, "failed to flush TAP output");
            self.error = Some(err);
        }
    }
}

impl<W: Write> DiagnosticSink for TapWriter<W> {
    fn diagnostic(&mut self, line: &str) {
        // Driver messages may span lines; every physical line needs the prefix.
        let prefixed: Vec<String> = if line.is_empty() {
            vec!["#".to_string()]
        } else {
            line.lines().map(|part| format!("# {}", part)).collect()
        };

        if self.in_test {
            self.held.extend(prefixed);
        } else {
            for line in prefixed {
                self.write_line(format_args!("{}", line));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plan_results_and_diagnostics() {
        let mut buffer = Vec::new();
        let mut tap = TapWriter::new(&mut buffer);
        tap.plan(2);
        tap.begin_test();
        assert_eq!(tap.result(TestOutcome::Pass, "first"), 1);
        tap.begin_test();
        tap.diagnostic("something went wrong\nsecond line");
        assert_eq!(tap.result(TestOutcome::Fail, "second"), 2);
        tap.diagnostic("outside any test");
        let report = tap.finish().expect("writing to a Vec cannot fail");

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            indoc! {"
                1..2
                1 ok - first
                2 not ok - second
                # something went wrong
                # second line
                # outside any test
            "}
        );
        assert_eq!(report.plan, 2);
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.is_complete());
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_error_is_kept_until_finish() {
        let mut tap = TapWriter::new(BrokenPipe);
        tap.plan(1);
        tap.result(TestOutcome::Pass, "still recorded");
        assert_eq!(tap.report().lines.len(), 1);

        let err = tap.finish().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
