use serde_json::Value;
use std::fmt;

/// The parts of an EAS build webhook the relay understands. The provider owns
/// the schema, so anything missing or of an unexpected type is left empty.
#[derive(Debug, Default, PartialEq)]
pub struct BuildEvent {
    pub id: Option<String>,
    pub status: Option<Status>,
    pub platform: Option<String>,
    pub account: Option<String>,
    pub project: Option<String>,
    pub app_id: Option<String>,
    pub app_name: Option<String>,
    pub details_url: Option<String>,
    pub artifact_url: Option<String>,
    pub profile: Option<String>,
    pub version: Option<String>,
    pub build_version: Option<String>,
    pub commit: Option<String>,
    pub commit_message: Option<String>,
    pub error: Option<BuildError>,
}

#[derive(Debug, PartialEq)]
pub struct BuildError {
    pub message: Option<String>,
    pub code: Option<String>,
}

impl BuildEvent {
    /// Extract an event from a JSON document, returns `None` if the document
    /// is not an object
    pub fn from_value(value: &Value) -> Option<BuildEvent> {
        if !value.is_object() {
            return None;
        }

        let error = match (
            string(value, "/error/message"),
            string(value, "/error/errorCode"),
        ) {
            (None, None) => None,
            (message, code) => Some(BuildError { message, code }),
        };

        Some(BuildEvent {
            id: string(value, "/id"),
            status: string(value, "/status").map(Status::from),
            platform: string(value, "/platform"),
            account: string(value, "/accountName"),
            project: string(value, "/projectName"),
            app_id: string(value, "/appId"),
            app_name: string(value, "/metadata/appName"),
            details_url: string(value, "/buildDetailsPageUrl"),
            artifact_url: string(value, "/artifacts/buildUrl"),
            profile: string(value, "/metadata/buildProfile"),
            version: string(value, "/metadata/appVersion"),
            build_version: string(value, "/metadata/appBuildVersion"),
            commit: string(value, "/metadata/gitCommitHash"),
            commit_message: string(value, "/metadata/gitCommitMessage"),
            error,
        })
    }

    /// What the build was for, preferring `<account>/<project>`
    pub fn target(&self) -> Option<String> {
        match (&self.account, &self.project) {
            (Some(account), Some(project)) => Some(format!("{}/{}", account, project)),
            (None, Some(project)) => Some(project.clone()),
            (Some(account), None) => match &self.app_name {
                Some(name) => Some(format!("{}/{}", account, name)),
                None => Some(account.clone()),
            },
            (None, None) => self.app_name.clone().or_else(|| self.app_id.clone()),
        }
    }

    /// Whether enough was recognized to describe the build
    pub fn is_recognized(&self) -> bool {
        self.status.is_some()
            || self.platform.is_some()
            || self.id.is_some()
            || self.target().is_some()
    }
}

/// Get a non-empty string at the JSON pointer
fn string(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// The state of a build
#[derive(Clone, Debug, PartialEq)]
pub enum Status {
    New,
    InQueue,
    InProgress,
    Finished,
    Errored,
    Canceled,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::New => "new",
            Status::InQueue => "in-queue",
            Status::InProgress => "in-progress",
            Status::Finished => "finished",
            Status::Errored => "errored",
            Status::Canceled => "canceled",
            Status::Other(s) => s,
        }
    }
}

impl From<String> for Status {
    fn from(raw: String) -> Status {
        match raw.as_str() {
            "new" => Status::New,
            "in-queue" => Status::InQueue,
            "in-progress" => Status::InProgress,
            "finished" => Status::Finished,
            "errored" => Status::Errored,
            "canceled" | "cancelled" => Status::Canceled,
            _ => Status::Other(raw),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
