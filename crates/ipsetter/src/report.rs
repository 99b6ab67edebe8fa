//! Outcome reporting
//!
//! One line per pass, written to the report writer (stdout, plus the log file
//! when one is configured). `--silent` hides only the "nothing to do" line.

use std::io::Write;
use std::net::IpAddr;

use ipsetter_core::{Error, Outcome};
use tracing_subscriber::fmt::MakeWriter;

/// Writes the user-facing result of a pass
pub struct Reporter<W> {
    make_writer: W,
    silent: bool,
}

impl<W> Reporter<W>
where
    W: for<'a> MakeWriter<'a>,
{
    pub fn new(make_writer: W, silent: bool) -> Self {
        Self {
            make_writer,
            silent,
        }
    }

    #[cfg(test)]
    fn writer(&self) -> &W {
        &self.make_writer
    }

    /// Report a successful pass
    pub fn outcome(&self, name: &str, ip: IpAddr, outcome: &Outcome) {
        if self.silent && !outcome.wrote() {
            return;
        }
        self.emit(&outcome_message(name, ip, outcome));
    }

    /// Report a failed pass; `ip` is known once discovery succeeded
    pub fn failure(&self, name: &str, ip: Option<IpAddr>, err: &Error) {
        self.emit(&failure_message(name, ip, err));
    }

    fn emit(&self, line: &str) {
        let mut writer = self.make_writer.make_writer();
        if let Err(e) = writeln!(writer, "{}", line) {
            tracing::warn!("Failed to write report: {}", e);
        }
    }
}

fn outcome_message(name: &str, ip: IpAddr, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Created(_) => {
            format!("Successfully set the '{name}' record to point to '{ip}'")
        }
        Outcome::Updated { .. } => {
            format!("Successfully updated the '{name}' record to point to '{ip}'")
        }
        Outcome::AlreadyCurrent(_) => format!("The '{name}' record already points to '{ip}'"),
    }
}

fn failure_message(name: &str, ip: Option<IpAddr>, err: &Error) -> String {
    match ip {
        Some(ip) if err.is_unknown_outcome() => {
            format!("There was an unknown error setting the '{name}' record to '{ip}'")
        }
        _ => format!("Could not update record: {err}"),
    }
}
