use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::loop_worker::{sampling_loop, SamplerContext};

/// Owns the periodic sampling task for one session at a time.
pub(crate) struct SamplerController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl SamplerController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start(&mut self, ctx: SamplerContext) -> Result<()> {
        if self.handle.is_some() {
            bail!("sampler already running");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sampling_loop(ctx, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        info!("sampler started");
        Ok(())
    }

    /// Cancels the loop and waits for it, so no callback can run afterwards.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("sampling loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}
