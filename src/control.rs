//! Control-thread command loop owning the configuration side of every
//! insert and aux send.
//!
//! Device rebinds and catalog refreshes only ever store capability tags
//! through [`crate::insert::InsertShared`]; the render and I/O threads are
//! never blocked by anything happening here.

use crate::aux_send::AuxSend;
use crate::devices::{DeviceCatalog, DeviceDirection};
use crate::insert::InsertRouting;
use crate::message::{Action, Message};
use std::collections::HashMap;
use tokio::sync::mpsc::{Receiver, Sender};
use tracing::debug;

pub struct Controller {
    rx: Receiver<Message>,
    tx: Sender<Message>,
    clients: Vec<Sender<Message>>,
    inserts: HashMap<String, InsertRouting>,
    aux_sends: HashMap<String, AuxSend>,
    inputs: DeviceCatalog,
    outputs: DeviceCatalog,
}

impl Controller {
    pub fn new(rx: Receiver<Message>, tx: Sender<Message>) -> Self {
        Self {
            rx,
            tx,
            clients: vec![],
            inserts: HashMap::new(),
            aux_sends: HashMap::new(),
            inputs: DeviceCatalog::default(),
            outputs: DeviceCatalog::default(),
        }
    }

    pub fn sender(&self) -> Sender<Message> {
        self.tx.clone()
    }

    async fn notify_clients(&self, action: Result<Action, String>) {
        for client in &self.clients {
            let _ = client.send(Message::Response(action.clone())).await;
        }
    }

    fn insert_mut(&mut self, name: &str) -> Result<&mut InsertRouting, String> {
        self.inserts
            .get_mut(name)
            .ok_or_else(|| format!("Unknown insert '{name}'"))
    }

    fn aux_send_mut(&mut self, name: &str) -> Result<&mut AuxSend, String> {
        self.aux_sends
            .get_mut(name)
            .ok_or_else(|| format!("Unknown aux send '{name}'"))
    }

    async fn handle_request(&mut self, a: Action) {
        let result = match a {
            Action::AddInsert(ref routing) => {
                let key = routing.display_name();
                if self.inserts.contains_key(&key) {
                    Err(format!("Insert '{key}' already exists"))
                } else {
                    routing.update_device_types(&self.inputs, &self.outputs);
                    self.inserts.insert(key, routing.clone());
                    Ok(a.clone())
                }
            }
            Action::RemoveInsert(ref name) => {
                if self.inserts.remove(name).is_some() {
                    Ok(a.clone())
                } else {
                    Err(format!("Unknown insert '{name}'"))
                }
            }
            Action::SetInsertInput {
                ref insert,
                ref device,
            } => match self.inserts.get_mut(insert) {
                Some(routing) => {
                    routing.set_input_device(device.clone(), &self.inputs, &self.outputs);
                    Ok(a.clone())
                }
                None => Err(format!("Unknown insert '{insert}'")),
            },
            Action::SetInsertOutput {
                ref insert,
                ref device,
            } => match self.inserts.get_mut(insert) {
                Some(routing) => {
                    routing.set_output_device(device.clone(), &self.inputs, &self.outputs);
                    Ok(a.clone())
                }
                None => Err(format!("Unknown insert '{insert}'")),
            },
            Action::SetManualAdjustMs { ref insert, ms } => self.insert_mut(insert).map(|routing| {
                routing.set_manual_adjust_ms(ms);
                a.clone()
            }),
            Action::DevicesChanged {
                ref inputs,
                ref outputs,
            } => {
                self.inputs = DeviceCatalog::enumerate(DeviceDirection::Input, inputs);
                self.outputs = DeviceCatalog::enumerate(DeviceDirection::Output, outputs);
                debug!(
                    "device set changed: {} inputs, {} outputs",
                    self.inputs.devices().len(),
                    self.outputs.devices().len()
                );
                for routing in self.inserts.values() {
                    routing.update_device_types(&self.inputs, &self.outputs);
                }
                Ok(a.clone())
            }
            Action::AddAuxSend { ref name, ref send } => {
                if self.aux_sends.contains_key(name) {
                    Err(format!("Aux send '{name}' already exists"))
                } else {
                    self.aux_sends.insert(name.clone(), send.clone());
                    Ok(a.clone())
                }
            }
            Action::RemoveAuxSend(ref name) => {
                if self.aux_sends.remove(name).is_some() {
                    Ok(a.clone())
                } else {
                    Err(format!("Unknown aux send '{name}'"))
                }
            }
            Action::SetAuxGainDb { ref name, db } => self.aux_send_mut(name).map(|send| {
                send.set_gain_db(db);
                a.clone()
            }),
            Action::SetAuxMute { ref name, mute } => self.aux_send_mut(name).map(|send| {
                send.set_mute(mute);
                a.clone()
            }),
            Action::SetAuxBusName {
                ref name,
                ref bus_name,
            } => self.aux_send_mut(name).map(|send| {
                send.set_bus_name(bus_name.clone());
                a.clone()
            }),
            Action::GetStates => {
                let mut inserts: Vec<_> = self.inserts.values().map(|r| r.to_state()).collect();
                inserts.sort_by(|a, b| a.name.cmp(&b.name));
                let mut aux_names: Vec<_> = self.aux_sends.keys().cloned().collect();
                aux_names.sort();
                let aux_sends = aux_names
                    .iter()
                    .map(|n| self.aux_sends[n].to_state())
                    .collect();
                Ok(Action::States { inserts, aux_sends })
            }
            Action::States { .. } => Ok(a.clone()),
            Action::Quit => Ok(a.clone()),
        };
        self.notify_clients(result).await;
    }

    pub async fn work(&mut self) {
        while let Some(message) = self.rx.recv().await {
            match message {
                Message::Channel(s) => {
                    self.clients.push(s);
                }
                Message::Request(a) => {
                    let quit = matches!(a, Action::Quit);
                    self.handle_request(a).await;
                    if quit {
                        return;
                    }
                }
                Message::Response(_) => {}
            }
        }
    }
}
