//! Executes text commands against a replicated system

use std::io::{self, BufRead, Write};

use replog_core::{ReplicaId, ReplicatedSystem};
use replog_logging::ReplicaContextGuard;
use tracing::{debug, info_span, warn};
use uuid::Uuid;

use crate::command::{Command, help_text};
use crate::error::CommandError;
use crate::format::{format_state, format_value};

/// A command session over one replicated system
pub struct Session {
    system: ReplicatedSystem,
    instance_id: Uuid,
}

impl Session {
    /// Create a session over `replica_count` fresh replicas.
    pub fn new(replica_count: usize) -> Result<Self, CommandError> {
        Ok(Self::with_system(ReplicatedSystem::new(replica_count)?))
    }

    pub fn with_system(system: ReplicatedSystem) -> Self {
        Self {
            system,
            instance_id: Uuid::new_v4(),
        }
    }

    pub fn system(&self) -> &ReplicatedSystem {
        &self.system
    }

    pub fn into_system(self) -> ReplicatedSystem {
        self.system
    }

    /// Unique id tagging this session's log output
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Execute one command, returning the text to print (if any).
    pub fn execute(&self, command: &Command) -> Result<Option<String>, CommandError> {
        let replica = command.target_replica();
        let _context =
            replica.map(|replica| ReplicaContextGuard::with_instance_id(replica, self.instance_id));
        let _span = info_span!(
            "command",
            ?command,
            replica = replica.map(ReplicaId::get),
            instance = %self.instance_id
        )
        .entered();

        let output = match command {
            Command::Local { kind, replica, key } => {
                self.system.local_op(*replica, *kind, key)?;
                None
            }
            Command::GetValue { replica, key } => {
                Some(format_value(self.system.query(*replica, key)?))
            }
            Command::PrintState { replica } => {
                Some(format_state(&self.system.dump_state(*replica)?))
            }
            Command::SendLog {
                source,
                destination,
            } => {
                let id = self.system.send(*source, *destination)?;
                Some(format!("Transmission number: {id}"))
            }
            Command::ReceiveLog { transmission } => {
                self.system.deliver(*transmission)?;
                None
            }
            Command::DropLog { transmission } => {
                self.system.drop_transmission(*transmission)?;
                None
            }
            Command::DuplicateLog { transmission } => {
                let id = self.system.duplicate_transmission(*transmission)?;
                Some(format!("Transmission number: {id}"))
            }
            Command::Help => Some(help_text().to_string()),
        };
        Ok(output)
    }

    /// Parse and execute one line.
    pub fn execute_line(&self, line: &str) -> Result<Option<String>, CommandError> {
        self.execute(&Command::parse(line)?)
    }

    /// Run commands from `input` until a blank line or end of input.
    ///
    /// Output goes to `out` and errors to `err` as `Error: ...`; an error
    /// does not end the session. Returns the number of failed commands.
    pub fn run_interactive(
        &self,
        input: impl BufRead,
        mut out: impl Write,
        mut err: impl Write,
    ) -> io::Result<usize> {
        let mut failures = 0;
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                debug!("Blank line, ending session");
                break;
            }
            failures += self.run_one(&line, &mut out, &mut err)?;
        }
        Ok(failures)
    }

    /// Run a command script.
    ///
    /// Unlike interactive input, blank lines and `#` comments are skipped.
    pub fn run_script(
        &self,
        script: &str,
        mut out: impl Write,
        mut err: impl Write,
    ) -> io::Result<usize> {
        let mut failures = 0;
        for line in script.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            failures += self.run_one(trimmed, &mut out, &mut err)?;
        }
        Ok(failures)
    }

    fn run_one(&self, line: &str, out: &mut impl Write, err: &mut impl Write) -> io::Result<usize> {
        match self.execute_line(line) {
            Ok(Some(text)) => {
                writeln!(out, "{text}")?;
                Ok(0)
            }
            Ok(None) => Ok(0),
            Err(e) => {
                warn!(line, error = %e, "Command failed");
                writeln!(err, "Error: {e}")?;
                Ok(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use replog_core::TransmissionId;
    use tracing::field::{Field, Visit};
    use tracing::span;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use tracing_subscriber::registry::LookupSpan;

    fn run(session: &Session, line: &str) -> Option<String> {
        session.execute_line(line).unwrap()
    }

    #[test]
    fn test_get_value_absent_prints_null() {
        let session = Session::new(3).unwrap();
        assert_eq!(run(&session, "GetValue(1,X)").as_deref(), Some("null"));
        run(&session, "Increment(1,X)");
        assert_eq!(run(&session, "GetValue(1,X)").as_deref(), Some("1"));
    }

    #[test]
    fn test_send_prints_transmission_number() {
        let session = Session::new(2).unwrap();
        run(&session, "Increment(1,X)");
        assert_eq!(
            run(&session, "SendLog(1,2)").as_deref(),
            Some("Transmission number: 1")
        );
        assert_eq!(run(&session, "ReceiveLog(1)"), None);
        assert_eq!(run(&session, "GetValue(2,X)").as_deref(), Some("1"));
    }

    #[test]
    fn test_duplicate_and_drop() {
        let session = Session::new(2).unwrap();
        run(&session, "Increment(1,X)");
        run(&session, "SendLog(1,2)");
        assert_eq!(
            run(&session, "DuplicateLog(1)").as_deref(),
            Some("Transmission number: 2")
        );
        run(&session, "DropLog(1)");
        assert_eq!(
            session.system().pending_transmissions(),
            vec![TransmissionId::new(2)]
        );
        assert!(matches!(
            session.execute_line("ReceiveLog(1)"),
            Err(CommandError::System(_))
        ));
    }

    #[test]
    fn test_unknown_replica_reports_error() {
        let session = Session::new(3).unwrap();
        let err = session.execute_line("Increment(7,X)").unwrap_err();
        assert_eq!(err.to_string(), "Replica with ID \"7\" does not exist");
    }

    #[test]
    fn test_help() {
        let session = Session::new(1).unwrap();
        assert!(run(&session, "Help").unwrap().starts_with("-- Help --"));
    }

    #[test]
    fn test_interactive_stops_at_blank_line() {
        let session = Session::new(2).unwrap();
        let input = "Increment(1,X)\nBogus(1)\nGetValue(1,X)\n\nIncrement(1,X)\n";
        let mut out = Vec::new();
        let mut err = Vec::new();

        let failures = session
            .run_interactive(input.as_bytes(), &mut out, &mut err)
            .unwrap();

        assert_eq!(failures, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "1\n");
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "Error: Unknown command: Bogus\n"
        );
        assert_eq!(session.system().query(ReplicaId::new(1), "X").unwrap(), Some(1));
    }

    #[test]
    fn test_script_skips_blank_lines_and_comments() {
        let session = Session::new(2).unwrap();
        let script = "# setup\nIncrement(1,X)\n\nSendLog(1,2)\nReceiveLog(1)\nGetValue(2,X)\n";
        let mut out = Vec::new();

        let failures = session.run_script(script, &mut out, io::sink()).unwrap();

        assert_eq!(failures, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Transmission number: 1\n1\n"
        );
    }

    /// Collects the fields of every new span
    #[derive(Default)]
    struct SpanFields(BTreeMap<String, String>);

    impl Visit for SpanFields {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            self.0.insert(field.name().to_string(), format!("{value:?}"));
        }
    }

    struct Recorder(Arc<Mutex<Vec<BTreeMap<String, String>>>>);

    impl<S> Layer<S> for Recorder
    where
        S: tracing::Subscriber + for<'lookup> LookupSpan<'lookup>,
    {
        fn on_new_span(&self, attrs: &span::Attributes<'_>, _id: &span::Id, _ctx: Context<'_, S>) {
            let mut fields = SpanFields::default();
            attrs.record(&mut fields);
            self.0.lock().unwrap().push(fields.0);
        }
    }

    #[test]
    fn test_command_span_carries_replica_and_instance() {
        let spans = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(Recorder(Arc::clone(&spans)));
        let session = Session::new(2).unwrap();

        tracing::subscriber::with_default(subscriber, || {
            run(&session, "Increment(2,X)");
            run(&session, "Help");
        });

        let spans = spans.lock().unwrap();
        let instance = session.instance_id().to_string();
        assert_eq!(spans[0].get("replica").map(String::as_str), Some("2"));
        assert_eq!(spans[0].get("instance"), Some(&instance));
        assert!(!spans[1].contains_key("replica"));
        assert_eq!(spans[1].get("instance"), Some(&instance));
    }
}
