// Parsing of dcron job labels
//
// Job definitions ride on container labels:
//
//   dcron.jobs.<name>.rule    = <cron expression>
//   dcron.jobs.<name>.execute = <shell command>   (".run" is a synonym)

use std::collections::BTreeMap;

use tracing::{debug, warn};

/// Label prefix that marks a key as a dcron job definition field.
pub const JOB_LABEL_PREFIX: &str = "dcron.jobs.";

/// Compose grouping label used to scope discovery to one deployment.
pub const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";

/// Field selector of a job label key (the fourth dot-segment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobField {
    Rule,
    Command,
    /// Unrecognized selector; ignored so newer label schemas stay readable.
    Unknown,
}

impl JobField {
    fn from_segment(segment: &str) -> Self {
        match segment {
            "rule" => JobField::Rule,
            "execute" | "run" => JobField::Command,
            _ => JobField::Unknown,
        }
    }
}

/// Classification of one raw label key against the job schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelKey<'a> {
    /// Not a dcron label at all.
    Foreign,
    /// Carries the dcron prefix but fewer than four dot-segments, or an
    /// empty job name.
    Malformed,
    /// A well-formed job field key.
    Job { name: &'a str, field: JobField },
}

/// Classify a raw label key.
pub fn classify(key: &str) -> LabelKey<'_> {
    if !key.starts_with(JOB_LABEL_PREFIX) {
        return LabelKey::Foreign;
    }
    let mut segments = key.split('.');
    // "dcron" and "jobs" are guaranteed by the prefix check
    let _ = segments.next();
    let _ = segments.next();
    let name = segments.next().unwrap_or("");
    let field = match segments.next() {
        Some(segment) => JobField::from_segment(segment),
        None => return LabelKey::Malformed,
    };
    if name.is_empty() {
        return LabelKey::Malformed;
    }
    LabelKey::Job { name, field }
}

/// One job's definition as assembled from a single container's labels.
///
/// Fields may arrive in any label-iteration order; a partially filled
/// definition is an intermediate state, not an error. The definition is
/// usable only once both the rule and the command are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobDefinition {
    pub name: String,
    pub rule: Option<String>,
    pub command: Option<String>,
}

impl JobDefinition {
    /// Scan the full label map of one container and collect the fields
    /// belonging to `name`.
    ///
    /// Malformed keys are reported as warnings and skipped; unknown field
    /// selectors are ignored. Neither aborts the scan.
    pub fn collect(labels: &BTreeMap<String, String>, name: &str) -> Self {
        let mut definition = JobDefinition {
            name: name.to_string(),
            ..Default::default()
        };
        for (key, value) in labels {
            match classify(key) {
                LabelKey::Foreign => {}
                LabelKey::Malformed => {
                    warn!(key = %key, value = %value, "unable to parse dcron job label");
                }
                LabelKey::Job {
                    name: key_name,
                    field,
                } if key_name == name => match field {
                    JobField::Rule => definition.rule = Some(value.clone()),
                    JobField::Command => definition.command = Some(value.clone()),
                    JobField::Unknown => {
                        debug!(key = %key, "ignoring unknown dcron job field");
                    }
                },
                LabelKey::Job { .. } => {}
            }
        }
        definition
    }

    /// True once both the cron rule and the command are known.
    pub fn is_complete(&self) -> bool {
        self.rule.is_some() && self.command.is_some()
    }
}
