// Copyright 2022. The Tari Project
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! # PBX server
//!
//! A telephone exchange simulation: clients connect over TCP, are assigned an extension, and
//! drive their telephone unit with a small line-oriented command language (`pickup`,
//! `hangup`, `dial <ext>`, `chat <msg>`).
//!
//! Usage: `pbx_server -p <port>`. Sending the process SIGHUP (or an interrupt) stops the
//! accept loop, drains every connection and exits cleanly.

mod cli;

use std::{process, sync::Arc};

use anyhow::Context;
use clap::Parser;
use log::*;
use pbx_core::{Pbx, PbxConfig, PbxListener};
use pbx_shutdown::Shutdown;

use crate::cli::Cli;

const LOG_TARGET: &str = "pbx::app";

fn main() {
    if let Err(err) = main_inner() {
        eprintln!("{:?}", err);
        error!(target: LOG_TARGET, "Exiting with an error: {:?}", err);
        process::exit(1);
    }
}

fn main_inner() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = cli.config();
    info!(target: LOG_TARGET, "Starting PBX server on port {}", cli.port);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build the runtime")?;
    runtime.block_on(run(config))
}

async fn run(config: PbxConfig) -> Result<(), anyhow::Error> {
    let mut shutdown = Shutdown::new();
    let pbx = Arc::new(Pbx::new(config.max_extensions));
    let listener = PbxListener::bind(&config, pbx.clone(), shutdown.to_signal())
        .await
        .with_context(|| format!("Failed to listen on {}", config.listen_addr))?;
    let listener_task = tokio::spawn(listener.run());

    wait_for_shutdown_request().await?;
    shutdown.trigger();
    listener_task.await.context("The accept loop panicked")?;
    pbx.shutdown().await;
    info!(target: LOG_TARGET, "PBX server shut down cleanly");
    Ok(())
}

/// Resolves when the process is asked to shut down: SIGHUP in keeping with the exchange's
/// lineage, or a plain interrupt.
#[cfg(unix)]
async fn wait_for_shutdown_request() -> Result<(), anyhow::Error> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut hangup = signal(SignalKind::hangup()).context("Failed to install the SIGHUP handler")?;
    tokio::select! {
        _ = hangup.recv() => info!(target: LOG_TARGET, "SIGHUP received; shutting down"),
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for an interrupt")?;
            info!(target: LOG_TARGET, "Interrupt received; shutting down");
        },
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown_request() -> Result<(), anyhow::Error> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for an interrupt")?;
    info!(target: LOG_TARGET, "Interrupt received; shutting down");
    Ok(())
}
