// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]

//! The firewall access-domain daemon: loads the model datasets, then
//! serves access queries over gRPC until interrupted.

use args::{CmdArgs, LaunchConfiguration, Parser};
use mgmt::{MgmtParams, start_mgmt};
use model::StaticModelManager;
use std::sync::Arc;
use tracing::info;

fn init_tracing(config: &LaunchConfiguration) {
    tracing_subscriber::fmt()
        .with_max_level(config.tracing.level())
        .with_target(true)
        .with_thread_names(true)
        .init();
}

fn main() {
    let (shutdown_tx, shutdown_rx) = std::sync::mpsc::channel();
    // a dropped receiver at exit time is not worth panicking over
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })
    .expect("unable to install the interrupt handler");

    let args = CmdArgs::parse();
    let config = match LaunchConfiguration::try_from(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    init_tracing(&config);

    let manager = match StaticModelManager::from_dir(&config.models.dataset_dir) {
        Ok(manager) => manager,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let _mgmt = start_mgmt(MgmtParams {
        address: config.config_server.address.clone(),
        manager: Arc::new(manager),
    })
    .expect("failed to start management thread");
    info!(address = ?config.config_server.address, "fwspaced is up");

    shutdown_rx.recv().expect("interrupt handler went away");
    info!("interrupt received, stopping fwspaced");
    std::process::exit(0);
}
