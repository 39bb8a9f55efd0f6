//! Console channel: reads lines from stdin, asks the session, prints the
//! reply to stdout. Runs until the shutdown token is cancelled or stdin is
//! closed.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::SharedSession;
use crate::error::AppError;
use crate::runtime::{Component, ComponentFuture};

pub struct ConsoleChannel {
    channel_id: String,
    session: SharedSession,
}

impl ConsoleChannel {
    pub fn new(channel_id: impl Into<String>, session: SharedSession) -> Self {
        Self { channel_id: channel_id.into(), session }
    }
}

impl Component for ConsoleChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(async move {
            info!(channel_id = %self.channel_id, "console channel started");
            println!("─────────────────────────────────");
            println!(" Cocktail sandbox  (Ctrl-C to quit)");
            println!("─────────────────────────────────");

            let stdin = BufReader::new(tokio::io::stdin());
            let stdout = tokio::io::stdout();
            run_console(&self.channel_id, &self.session, stdin, stdout, shutdown).await
        })
    }
}

/// The read/ask/print loop over any line source and sink.
pub async fn run_console<R, W>(
    channel_id: &str,
    session: &SharedSession,
    input: R,
    mut output: W,
    shutdown: CancellationToken,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output.write_all(b"> ").await?;
        output.flush().await?;

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                info!(%channel_id, "console channel shutting down");
                break;
            }

            line = lines.next_line() => {
                let input = match line {
                    Err(e) => {
                        warn!(%channel_id, "console read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        info!(%channel_id, "stdin closed");
                        break;
                    }
                    Ok(Some(input)) => input.trim().to_string(),
                };
                if input.is_empty() {
                    continue;
                }
                debug!(%channel_id, %input, "console received line");

                let reply = {
                    let mut s = session.lock().await;
                    s.ask(&input).await
                };
                let text = match reply {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(%channel_id, "ask failed: {e}");
                        format!("error: {e}")
                    }
                };
                output.write_all(text.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
        }
    }

    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}
