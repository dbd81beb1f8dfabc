use crate::aux_send::AuxSend;
use crate::devices::DeviceInfo;
use crate::insert::InsertRouting;
use crate::state::{AuxSendState, InsertState};
use tokio::sync::mpsc::Sender;

/// Configuration commands handled by the controller, plus the variants it
/// answers with. Everything that used to be a property-change notification
/// in the host arrives here as an explicit command.
#[derive(Clone, Debug)]
pub enum Action {
    AddInsert(InsertRouting),
    RemoveInsert(String),
    SetInsertInput {
        insert: String,
        device: String,
    },
    SetInsertOutput {
        insert: String,
        device: String,
    },
    SetManualAdjustMs {
        insert: String,
        ms: f64,
    },
    /// The device manager's view changed; every insert re-resolves.
    DevicesChanged {
        inputs: Vec<DeviceInfo>,
        outputs: Vec<DeviceInfo>,
    },
    AddAuxSend {
        name: String,
        send: AuxSend,
    },
    RemoveAuxSend(String),
    SetAuxGainDb {
        name: String,
        db: f32,
    },
    SetAuxMute {
        name: String,
        mute: bool,
    },
    SetAuxBusName {
        name: String,
        bus_name: Option<String>,
    },
    GetStates,
    States {
        inserts: Vec<InsertState>,
        aux_sends: Vec<AuxSendState>,
    },
    Quit,
}

#[derive(Clone, Debug)]
pub enum Message {
    Channel(Sender<Self>),
    Request(Action),
    Response(Result<Action, String>),
}
