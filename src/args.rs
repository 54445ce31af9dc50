use std::{net::IpAddr, path::PathBuf};
use structopt::StructOpt;

#[derive(Debug, Default, StructOpt)]
#[structopt(
    name = "buildrelay",
    about = "Relay signed EAS build webhooks to a Slack channel"
)]
pub struct Args {
    /// The address to listen on
    #[structopt(long, env = "LISTEN_ADDRESS")]
    pub host: Option<IpAddr>,

    /// The port to listen on
    ///
    /// The port where the server should listen to receive webhooks. Defaults
    /// to 3000 when neither this nor the configuration file sets it.
    #[structopt(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// The configuration file location
    ///
    /// An optional TOML file providing any of the settings below. Values
    /// passed on the command line or through the environment take precedence.
    #[structopt(short, long, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// The shared secret used to sign webhooks
    #[structopt(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// The Slack incoming webhook to deliver notifications to
    #[structopt(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
    pub slack_url: Option<String>,

    /// The minimum level to log at
    ///
    /// The minimum log level specification, supports the rust log format. The
    /// environment variable RUST_LOG can also be used.
    #[structopt(short, long, env = "RUST_LOG")]
    pub log_level: Option<String>,

    /// Where to report errors to
    #[structopt(long, env = "SENTRY_DSN", hide_env_values = true)]
    pub sentry_dsn: Option<String>,

    #[structopt(flatten)]
    pub build: BuildArgs,
}

/// Metadata about the running build, only used for diagnostics
#[derive(Debug, Default, StructOpt)]
pub struct BuildArgs {
    /// The version of the deployed application
    #[structopt(long, env = "APP_VERSION")]
    pub app_version: Option<String>,

    /// The commit the application was built from
    #[structopt(long, env = "COMMIT_SHA")]
    pub commit_sha: Option<String>,

    /// The branch the application was built from
    #[structopt(long, env = "GIT_BRANCH")]
    pub git_branch: Option<String>,

    /// When the application was built
    #[structopt(long, env = "BUILD_DATE")]
    pub build_date: Option<String>,
}
