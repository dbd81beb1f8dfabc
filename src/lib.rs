pub mod aux_send;
pub mod buffer;
pub mod control;
pub mod devices;
pub mod exchange;
pub mod fader;
pub mod insert;
pub mod logging;
pub mod message;
pub mod midi;
pub mod param;
pub mod state;

use tokio::sync::mpsc::{Sender, channel};
use tokio::task::JoinHandle;

/// Spawns the configuration controller and returns the command channel.
pub fn init() -> (Sender<message::Message>, JoinHandle<()>) {
    let (tx, rx) = channel::<message::Message>(32);
    let mut controller = control::Controller::new(rx, tx.clone());
    let handle = tokio::spawn(async move {
        controller.work().await;
    });
    (tx, handle)
}
