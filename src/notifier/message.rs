use crate::event::{BuildEvent, Status};
use serde::Serialize;
use std::borrow::Cow;

/// Sent when nothing in the payload could be recognized
const GENERIC_SUMMARY: &str = "EAS build update received";

/// A Slack incoming webhook message
#[derive(Debug, Serialize)]
pub struct Message<'e> {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment<'e>>,
}

/// Secondary content, rendered with a coloured bar beside it
#[derive(Debug, Serialize)]
pub struct Attachment<'e> {
    pub color: Color,
    pub fields: Vec<Field<'e>>,
}

#[derive(Debug, Serialize)]
pub struct Field<'e> {
    pub title: &'static str,
    pub value: Cow<'e, str>,
    pub short: bool,
}

impl<'e> Field<'e> {
    fn new<V>(title: &'static str, value: V, short: bool) -> Field<'e>
    where
        V: Into<Cow<'e, str>>,
    {
        Field {
            title,
            value: value.into(),
            short,
        }
    }
}

/// The colour of an attachment
type Color = &'static str;

fn color(status: Option<&Status>) -> Color {
    match status {
        Some(Status::Finished) => "#53be0c",
        Some(Status::Errored) => "#a51717",
        Some(Status::Canceled) => "#808080",
        Some(Status::New | Status::InQueue | Status::InProgress) => "#a77b0b",
        Some(Status::Other(_)) | None => "#439fe0",
    }
}

impl<'e> From<&'e BuildEvent> for Message<'e> {
    fn from(event: &'e BuildEvent) -> Message<'e> {
        let fields = fields(event);
        let attachments = if fields.is_empty() {
            Vec::new()
        } else {
            vec![Attachment {
                color: color(event.status.as_ref()),
                fields,
            }]
        };

        Message {
            text: summary(event),
            attachments,
        }
    }
}

/// Escape the characters Slack treats as control sequences in mrkdwn so
/// payload text can't mention channels or forge links
pub fn escape(raw: &str) -> Cow<'_, str> {
    if !raw.contains(|c: char| matches!(c, '&' | '<' | '>')) {
        return Cow::Borrowed(raw);
    }

    let mut escaped = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Render the one line summary along with any links and errors
pub fn summary(event: &BuildEvent) -> String {
    if !event.is_recognized() {
        return GENERIC_SUMMARY.into();
    }

    let mut text = String::from("EAS build");
    if let Some(status) = &event.status {
        text += &format!(" *{}*", escape(status.as_str()));
    }
    if let Some(target) = event.target() {
        text += &format!(" for `{}`", escape(&target));
    }
    if let Some(platform) = &event.platform {
        text += &format!(" on *{}*", escape(platform));
    }
    if let Some(id) = &event.id {
        text += &format!(" (build `{}`)", escape(id));
    }

    if let Some(url) = &event.details_url {
        text += &format!("\n{}", escape(url));
    }
    if let Some(message) = event.error.as_ref().and_then(|e| e.message.as_ref()) {
        text += &format!("\nError: `{}`", escape(message));
    }

    text
}

fn fields(event: &BuildEvent) -> Vec<Field<'_>> {
    let mut fields = Vec::new();

    if let Some(profile) = &event.profile {
        fields.push(Field::new("Profile", escape(profile), true));
    }

    let version = match (&event.version, &event.build_version) {
        (Some(version), Some(build)) => Some(format!("{} ({})", version, build)),
        (Some(version), None) => Some(version.clone()),
        (None, Some(build)) => Some(format!("({})", build)),
        (None, None) => None,
    };
    if let Some(version) = version {
        fields.push(Field::new("Version", escape(&version).into_owned(), true));
    }

    if let Some(commit) = &event.commit {
        let short = commit.get(..7).unwrap_or(commit);
        let value = match &event.commit_message {
            Some(message) => format!("`{}` {}", escape(short), escape(message)),
            None => format!("`{}`", escape(short)),
        };
        fields.push(Field::new("Commit", value, false));
    }

    if let Some(url) = &event.artifact_url {
        fields.push(Field::new(
            "Artifact",
            format!("<{}|Download>", escape(url)),
            true,
        ));
    }

    if let Some(code) = event.error.as_ref().and_then(|e| e.code.as_ref()) {
        fields.push(Field::new("Error Code", escape(code), true));
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::{escape, summary, Message, GENERIC_SUMMARY};
    use crate::event::BuildEvent;
    use serde_json::{json, Value};
    use std::fs;

    fn fixture(name: &str) -> BuildEvent {
        let content = fs::read_to_string(format!("testdata/webhooks/{}", name))
            .expect("failed to read test data");
        let value: Value = serde_json::from_str(&content).expect("invalid JSON format");
        BuildEvent::from_value(&value).unwrap()
    }

    #[test]
    fn minimal_event() {
        let event = BuildEvent::from_value(&json!({
            "status": "finished",
            "platform": "ios",
            "id": "abc123"
        }))
        .unwrap();

        assert_eq!(
            "EAS build *finished* on *ios* (build `abc123`)",
            summary(&event)
        );

        let message = serde_json::to_value(Message::from(&event)).unwrap();
        assert_eq!(
            json!({ "text": "EAS build *finished* on *ios* (build `abc123`)" }),
            message
        );
    }

    #[test]
    fn finished_build() {
        let event = fixture("eas-build-finished.json");
        let message = Message::from(&event);

        assert_eq!(
            "EAS build *finished* for `dsokal/example` on *ios* (build `147a3212-49fd-446f-b4e3-a6519acf264a`)\n\
             https://expo.dev/accounts/dsokal/projects/example/builds/147a3212-49fd-446f-b4e3-a6519acf264a",
            message.text
        );

        let attachment = &message.attachments[0];
        assert_eq!("#53be0c", attachment.color);

        let titles: Vec<_> = attachment.fields.iter().map(|f| f.title).collect();
        assert_eq!(vec!["Profile", "Version", "Commit", "Artifact"], titles);
        assert_eq!("1.0.2 (123)", attachment.fields[1].value);
        assert_eq!("`564b61e` Add home screen", attachment.fields[2].value);
    }

    #[test]
    fn errored_build() {
        let event = fixture("eas-build-errored.json");
        let message = Message::from(&event);

        assert!(message
            .text
            .ends_with("\nError: `Gradle build failed with unknown error.`"));
        assert!(message.text.contains("*errored*"));
        assert!(message.text.contains("*android*"));

        let attachment = &message.attachments[0];
        assert_eq!("#a51717", attachment.color);
        let code = attachment.fields.last().unwrap();
        assert_eq!("Error Code", code.title);
        assert_eq!("EAS_BUILD_UNKNOWN_GRADLE_ERROR", code.value);
    }

    #[test]
    fn generic_message() {
        let event = BuildEvent::from_value(&json!({ "unexpected": true })).unwrap();
        let message = Message::from(&event);

        assert_eq!(GENERIC_SUMMARY, message.text);
        assert!(message.attachments.is_empty());
    }

    #[test]
    fn short_commit_hash() {
        let event = BuildEvent::from_value(&json!({
            "status": "in-progress",
            "metadata": { "gitCommitHash": "abc" }
        }))
        .unwrap();
        let message = Message::from(&event);

        assert_eq!("#a77b0b", message.attachments[0].color);
        assert_eq!("`abc`", message.attachments[0].fields[0].value);
    }

    #[test]
    fn escapes_control_sequences() {
        assert_eq!("plain text", escape("plain text"));
        assert_eq!(
            "&lt;!here&gt; fish &amp; chips",
            escape("<!here> fish & chips")
        );
    }

    #[test]
    fn payload_cannot_ping_or_forge_links() {
        let event = BuildEvent::from_value(&json!({
            "status": "errored",
            "error": { "message": "<!channel> see <https://evil.example|logs> & more" },
            "metadata": {
                "gitCommitHash": "abcdef1234567",
                "gitCommitMessage": "<!here> ship it"
            },
            "artifacts": { "buildUrl": "https://expo.dev/a.apk?x=1&y=<2>" }
        }))
        .unwrap();
        let message = Message::from(&event);

        assert!(!message.text.contains("<!channel>"));
        assert!(!message.text.contains("<https://evil.example|logs>"));
        assert!(message.text.ends_with(
            "\nError: `&lt;!channel&gt; see &lt;https://evil.example|logs&gt; &amp; more`"
        ));

        let fields = &message.attachments[0].fields;
        assert_eq!("`abcdef1` &lt;!here&gt; ship it", fields[0].value);
        assert_eq!(
            "<https://expo.dev/a.apk?x=1&amp;y=&lt;2&gt;|Download>",
            fields[1].value
        );
    }
}
