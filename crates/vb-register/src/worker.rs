//! Background worker that keeps network I/O off the host's primary context.
//!
//! `submit` spawns one task per command invocation on a dedicated tokio
//! runtime and returns immediately. Finished results come back over an mpsc
//! channel and are collected with `drain`, which never blocks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};
use vb_plugin_api::PluginPlayer;

use crate::client::{RegistrationLinkClient, RegistrationResult};

/// A finished request, addressed to the player who asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRegistration {
    pub player: PluginPlayer,
    pub result: RegistrationResult,
}

pub struct RegistrationWorker {
    runtime: Option<Runtime>,
    client: RegistrationLinkClient,
    results_tx: UnboundedSender<CompletedRegistration>,
    results_rx: UnboundedReceiver<CompletedRegistration>,
    in_flight: Arc<AtomicUsize>,
}

impl RegistrationWorker {
    pub fn new(client: RegistrationLinkClient, worker_threads: usize) -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("vb-register-worker")
            .enable_all()
            .build()?;
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Ok(Self {
            runtime: Some(runtime),
            client,
            results_tx,
            results_rx,
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Queue a registration request for `player`. Returns `false` if the
    /// worker has already been shut down.
    pub fn submit(&self, player: PluginPlayer) -> bool {
        let Some(runtime) = &self.runtime else {
            warn!("Registration worker is shut down; dropping request for {}", player.name);
            return false;
        };

        let client = self.client.clone();
        let results_tx = self.results_tx.clone();
        let in_flight = self.in_flight.clone();
        in_flight.fetch_add(1, Ordering::SeqCst);
        debug!("Queued registration request for {}", player.name);

        runtime.spawn(async move {
            let result = client.request_registration_link(&player.name).await;
            if results_tx
                .send(CompletedRegistration { player, result })
                .is_err()
            {
                // Receiver dropped with the worker; nobody is left to tell.
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        });
        true
    }

    /// Collect every result that has finished so far.
    pub fn drain(&mut self) -> Vec<CompletedRegistration> {
        let mut completed = Vec::new();
        loop {
            match self.results_rx.try_recv() {
                Ok(done) => completed.push(done),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        if !completed.is_empty() {
            self.in_flight.fetch_sub(completed.len(), Ordering::SeqCst);
        }
        completed
    }

    /// Requests submitted but not yet drained.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.runtime.is_some()
    }

    /// Stop the runtime without waiting for outstanding requests. Safe to call
    /// from inside another runtime.
    pub fn shutdown(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let abandoned = self.in_flight();
            if abandoned > 0 {
                warn!("Shutting down registration worker with {abandoned} request(s) in flight");
            }
            runtime.shutdown_background();
        }
    }
}

impl Drop for RegistrationWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
