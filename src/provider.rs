use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use anyhow::Result;

use crate::config::AppConfig;
use crate::demo_feed::DemoPlayerSource;
use crate::player_fetch::{BalldontlieSource, PlayerSource};
use crate::state::{Delta, ProviderCommand};

pub fn build_source(config: &AppConfig) -> Result<Box<dyn PlayerSource>> {
    if config.use_demo_source() {
        return Ok(Box::new(DemoPlayerSource::new(config.demo.clone())));
    }
    Ok(Box::new(BalldontlieSource::new(config)?))
}

/// Runs page requests off the UI thread. One command in, one delta out, in order.
pub fn spawn_provider(
    mut source: Box<dyn PlayerSource>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let _ = tx.send(Delta::Log(format!(
            "[INFO] Player source: {}",
            source.label()
        )));

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::FetchPlayers(request) => {
                    let result = source.fetch_page(request.cursor.as_deref(), request.per_page);
                    let delta = Delta::PlayersFetched {
                        ticket: request.ticket,
                        result,
                    };
                    if tx.send(delta).is_err() {
                        break;
                    }
                }
                ProviderCommand::Shutdown => break,
            }
        }
    })
}
