use crate::{config, event::BuildEvent};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

mod error;
mod message;

pub use error::{Error, Result};
pub use message::Message;

/// Delivers build summaries to a Slack incoming webhook
#[derive(Debug)]
pub struct Notifier {
    url: Url,
    client: Client,
}

impl Notifier {
    /// Create a notifier from the Slack configuration
    pub fn new(cfg: &config::Slack) -> Result<Notifier> {
        let client = Client::builder()
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(cfg.timeout)
            .build()
            .map_err(Error::Builder)?;

        Ok(Notifier {
            url: cfg.url.clone(),
            client,
        })
    }

    /// Send a summary of the event. Makes exactly one attempt, a failed
    /// delivery is left for the provider to redeliver.
    #[instrument(skip_all, fields(build = ?event.id, status = ?event.status))]
    pub async fn notify(&self, event: &BuildEvent) -> Result<()> {
        let message = Message::from(event);

        let response = self
            .client
            .post(self.url.clone())
            .json(&message)
            .send()
            .await?
            .error_for_status()?;
        debug!(status = %response.status(), "successfully dispatched notification");

        Ok(())
    }
}
