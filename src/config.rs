use crate::args::{Args, BuildArgs};
use serde::{Deserialize, Serialize};
use std::{
    io::Error as IoError,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::Path,
    sync::Arc,
    time::Duration,
};
use thiserror::Error as ThisError;
use tokio::fs;
use url::{ParseError, Url};

/// The header EAS sends the body signature in
const DEFAULT_SIGNATURE_HEADER: &str = "expo-signature";

/// Largest request body accepted, EAS payloads are a few kilobytes
const DEFAULT_MAX_BODY: usize = 1024 * 1024;

pub type SharedConfig = Arc<Config>;

pub type Result<T> = std::result::Result<T, Error>;

/// Reasons the configuration could not be assembled
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("failed to read configuration file")]
    Io(#[from] IoError),
    #[error("failed to parse configuration file")]
    Parse(#[from] toml::de::Error),
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("could not parse Slack webhook URL")]
    InvalidUrl(#[from] ParseError),
    #[error("Slack webhook URL must use http or https, got `{0}`")]
    UnsupportedScheme(String),
    #[error("webhook path must start with `/`")]
    InvalidPath,
    #[error("webhook path `{0}` is reserved")]
    ReservedPath(String),
}

/// The fully resolved, immutable configuration for the relay
#[derive(Debug)]
pub struct Config {
    pub server: Server,
    pub webhook: Webhook,
    pub slack: Slack,
    pub build: BuildInfo,
}

#[derive(Debug)]
pub struct Server {
    pub address: SocketAddr,
    pub log: String,
    pub path: String,
    pub max_body: usize,
    pub sentry: Option<String>,
}

#[derive(Debug)]
pub struct Webhook {
    pub secret: String,
    pub header: String,
}

#[derive(Debug)]
pub struct Slack {
    pub url: Url,
    pub timeout: Duration,
}

/// Version information reported by the health check
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BuildInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub built: Option<String>,
}

impl From<BuildArgs> for BuildInfo {
    fn from(args: BuildArgs) -> BuildInfo {
        BuildInfo {
            version: args.app_version,
            commit: args.commit_sha,
            branch: args.git_branch,
            built: args.build_date,
        }
    }
}

/// The configuration file as it appears on disk, every setting is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct File {
    server: FileServer,
    webhook: FileWebhook,
    slack: FileSlack,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileServer {
    host: Option<IpAddr>,
    port: Option<u16>,
    log: Option<String>,
    path: Option<String>,
    max_body: Option<usize>,
    sentry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileWebhook {
    secret: Option<String>,
    header: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSlack {
    url: Option<String>,
    timeout: Option<u64>,
}

/// Parse the configuration file at the given path
async fn parse<P: AsRef<Path>>(path: P) -> Result<File> {
    let raw = fs::read(path).await?;
    let data = toml::from_slice(&raw)?;
    Ok(data)
}

/// Load the configuration from the optional file and the command line, with
/// the command line taking precedence
pub async fn load(args: Args) -> Result<SharedConfig> {
    let file = match &args.config {
        Some(path) => parse(path).await?,
        None => File::default(),
    };

    resolve(args, file).map(Arc::new)
}

/// Merge the sources and validate the result
fn resolve(args: Args, file: File) -> Result<Config> {
    let secret = args
        .secret
        .or(file.webhook.secret)
        .filter(|s| !s.is_empty())
        .ok_or(Error::Missing("WEBHOOK_SECRET"))?;

    let raw_url = args
        .slack_url
        .or(file.slack.url)
        .filter(|s| !s.is_empty())
        .ok_or(Error::Missing("SLACK_WEBHOOK_URL"))?;
    let url = Url::parse(&raw_url)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::UnsupportedScheme(url.scheme().to_owned()));
    }

    let path = file.server.path.unwrap_or_else(|| "/webhook".into());
    if !path.starts_with('/') {
        return Err(Error::InvalidPath);
    }
    if path == "/health" {
        return Err(Error::ReservedPath(path));
    }

    let host = args
        .host
        .or(file.server.host)
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let port = args.port.or(file.server.port).unwrap_or(3000);

    Ok(Config {
        server: Server {
            address: SocketAddr::new(host, port),
            log: args
                .log_level
                .or(file.server.log)
                .unwrap_or_else(|| "info".into()),
            path,
            max_body: file.server.max_body.unwrap_or(DEFAULT_MAX_BODY),
            sentry: args.sentry_dsn.or(file.server.sentry),
        },
        webhook: Webhook {
            secret,
            header: file
                .webhook
                .header
                .unwrap_or_else(|| DEFAULT_SIGNATURE_HEADER.into()),
        },
        slack: Slack {
            url,
            timeout: Duration::from_secs(file.slack.timeout.unwrap_or(5)),
        },
        build: args.build.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::{load, resolve, Error, File};
    use crate::args::{Args, BuildArgs};
    use std::{path::PathBuf, time::Duration};

    fn required() -> Args {
        Args {
            secret: Some("the-amazing-test-secret".into()),
            slack_url: Some("https://hooks.slack.com/services/T000/B000/XXXX".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn parse_config() {
        let args = Args {
            config: Some(PathBuf::from("./buildrelay.example.toml")),
            ..Default::default()
        };
        let config = load(args).await.expect("failed to parse configuration");

        assert_eq!("127.0.0.1:8000", &config.server.address.to_string());
        assert_eq!("debug", &config.server.log);
        assert_eq!("/hooks/eas", &config.server.path);
        assert_eq!(65536, config.server.max_body);
        assert_eq!(None, config.server.sentry);

        assert_eq!("please-change-this-secret", &config.webhook.secret);
        assert_eq!("expo-signature", &config.webhook.header);

        assert_eq!(
            "https://hooks.slack.com/services/T000/B000/XXXX",
            config.slack.url.as_str()
        );
        assert_eq!(Duration::from_secs(10), config.slack.timeout);
    }

    #[test]
    fn defaults() {
        let config = resolve(required(), File::default()).expect("valid configuration");

        assert_eq!("0.0.0.0:3000", &config.server.address.to_string());
        assert_eq!("info", &config.server.log);
        assert_eq!("/webhook", &config.server.path);
        assert_eq!(1024 * 1024, config.server.max_body);
        assert_eq!("expo-signature", &config.webhook.header);
        assert_eq!(Duration::from_secs(5), config.slack.timeout);
        assert_eq!(None, config.build.version);
    }

    #[tokio::test]
    async fn arguments_override_file() {
        let args = Args {
            config: Some(PathBuf::from("./buildrelay.example.toml")),
            port: Some(9000),
            secret: Some("from-the-environment".into()),
            build: BuildArgs {
                app_version: Some("1.2.3".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let config = load(args).await.expect("failed to parse configuration");

        assert_eq!("127.0.0.1:9000", &config.server.address.to_string());
        assert_eq!("from-the-environment", &config.webhook.secret);
        assert_eq!(Some("1.2.3"), config.build.version.as_deref());
    }

    #[test]
    fn missing_secret() {
        let args = Args {
            secret: None,
            ..required()
        };
        let error = resolve(args, File::default()).unwrap_err();
        assert!(matches!(error, Error::Missing("WEBHOOK_SECRET")));
    }

    #[test]
    fn empty_secret() {
        let args = Args {
            secret: Some(String::new()),
            ..required()
        };
        let error = resolve(args, File::default()).unwrap_err();
        assert!(matches!(error, Error::Missing("WEBHOOK_SECRET")));
    }

    #[test]
    fn missing_slack_url() {
        let args = Args {
            slack_url: None,
            ..required()
        };
        let error = resolve(args, File::default()).unwrap_err();
        assert!(matches!(error, Error::Missing("SLACK_WEBHOOK_URL")));
    }

    #[test]
    fn invalid_slack_url() {
        let args = Args {
            slack_url: Some("not a url".into()),
            ..required()
        };
        let error = resolve(args, File::default()).unwrap_err();
        assert!(matches!(error, Error::InvalidUrl(_)));

        let args = Args {
            slack_url: Some("ftp://hooks.slack.com/services".into()),
            ..required()
        };
        let error = resolve(args, File::default()).unwrap_err();
        assert!(matches!(error, Error::UnsupportedScheme(s) if s == "ftp"));
    }

    #[test]
    fn reserved_path() {
        let file: File = toml::from_str("[server]\npath = \"/health\"").unwrap();
        let error = resolve(required(), file).unwrap_err();
        assert!(matches!(error, Error::ReservedPath(_)));

        let file: File = toml::from_str("[server]\npath = \"webhook\"").unwrap();
        let error = resolve(required(), file).unwrap_err();
        assert!(matches!(error, Error::InvalidPath));
    }
}
