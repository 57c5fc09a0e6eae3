//! Connected controllers and palette sync across them.
//!
//! Device discovery happens on the page; this module only needs a device's
//! firmware type and its raw sysex send / listen capability.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, warn};
use wasm_bindgen::prelude::*;

use crate::error::Result;
use crate::palette::PaletteStore;
use crate::protocol::{
    build_upload_message, has_only_data_bytes, SessionState, Slot, SysexConfig, SysexOutcome,
    TransferSession,
};

/// Firmware running on a connected controller.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareType {
    /// Stock firmware, no palette commands.
    Stock = 0,
    /// Custom firmware exposing palette upload/download.
    Custom = 1,
    /// Bootloader or anything unrecognized.
    Other = 2,
}

/// Callback receiving raw inbound sysex bytes.
pub type SysexListener = Box<dyn FnMut(&[u8])>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

/// Capability interface of a connected controller.
pub trait SysexDevice {
    /// Stable identity used to key transfer sessions.
    fn id(&self) -> &str;

    fn firmware(&self) -> FirmwareType;

    /// Send one complete sysex message.
    fn send(&self, message: &[u8]) -> Result<()>;

    fn add_sysex_listener(&self, listener: SysexListener) -> ListenerId;

    /// Returns false if `id` was not registered.
    fn remove_sysex_listener(&self, id: ListenerId) -> bool;
}

type SharedListener = Rc<RefCell<SysexListener>>;

/// Listener bookkeeping for [`SysexDevice`] implementations.
///
/// Listeners may add or remove listeners while a message is being
/// dispatched. A listener removed mid-dispatch is not called again; one added
/// mid-dispatch first hears the next message.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RefCell<Vec<(ListenerId, SharedListener)>>,
    next_id: Cell<u32>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: SysexListener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0.wrapping_add(1));
        self.listeners
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(listener))));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|(lid, _)| *lid == id)
    }

    /// Deliver one inbound message to every listener, in registration order.
    pub fn dispatch(&self, data: &[u8]) {
        let listeners: Vec<_> = self
            .listeners
            .borrow()
            .iter()
            .map(|(id, listener)| (*id, Rc::clone(listener)))
            .collect();

        for (id, listener) in listeners {
            if !self.contains(id) {
                continue;
            }
            match listener.try_borrow_mut() {
                Ok(mut listener) => (*listener)(data),
                Err(_) => warn!("sysex listener re-entered, dropping nested message"),
            }
        }
    }
}

/// A custom-firmware device subscribed to palette downloads.
///
/// Owns the listener registration and removes it when dropped.
pub struct DeviceLink {
    device: Rc<dyn SysexDevice>,
    listener: ListenerId,
    session: Rc<RefCell<TransferSession>>,
}

impl DeviceLink {
    /// Subscribe to `device`. Returns `None` unless it runs custom firmware.
    pub fn connect(
        device: Rc<dyn SysexDevice>,
        store: Rc<PaletteStore>,
        config: SysexConfig,
    ) -> Option<Self> {
        if device.firmware() != FirmwareType::Custom {
            debug!("device {} has {:?} firmware, not linking", device.id(), device.firmware());
            return None;
        }

        let session = Rc::new(RefCell::new(TransferSession::new(config)));
        let listener_session = Rc::clone(&session);

        // The session borrow ends before the store notifies its observers.
        let listener = device.add_sysex_listener(Box::new(move |data| {
            let outcome = listener_session.borrow_mut().feed(data);
            if let SysexOutcome::Completed(palette) = outcome {
                store.replace_all(palette);
            }
        }));

        debug!("linked device {}", device.id());
        Some(Self {
            device,
            listener,
            session,
        })
    }

    pub fn id(&self) -> &str {
        self.device.id()
    }

    pub fn session_state(&self) -> SessionState {
        self.session.borrow().state()
    }

    pub fn send(&self, message: &[u8]) -> Result<()> {
        self.device.send(message)
    }
}

impl Drop for DeviceLink {
    fn drop(&mut self) {
        if !self.device.remove_sysex_listener(self.listener) {
            warn!("device {} had already dropped its palette listener", self.device.id());
        }
        debug!("unlinked device {}", self.device.id());
    }
}

/// Keeps one transfer session per linked device and fans uploads out.
pub struct PaletteSync {
    store: Rc<PaletteStore>,
    config: SysexConfig,
    links: Vec<DeviceLink>,
}

impl PaletteSync {
    pub fn new(store: Rc<PaletteStore>, config: SysexConfig) -> Self {
        Self {
            store,
            config,
            links: Vec::new(),
        }
    }

    pub fn config(&self) -> &SysexConfig {
        &self.config
    }

    /// Replace the framing config and resubscribe every linked device.
    /// Partially received transfers are discarded.
    pub fn set_config(&mut self, config: SysexConfig) {
        self.config = config;

        let devices: Vec<_> = self.links.drain(..).map(|link| Rc::clone(&link.device)).collect();
        for device in devices {
            self.attach(device);
        }
    }

    /// Link a device. Returns false when the device is inert (not custom
    /// firmware) or already linked.
    pub fn attach(&mut self, device: Rc<dyn SysexDevice>) -> bool {
        if self.is_linked(device.id()) {
            return false;
        }

        match DeviceLink::connect(device, Rc::clone(&self.store), self.config.clone()) {
            Some(link) => {
                self.links.push(link);
                true
            }
            None => false,
        }
    }

    /// Unlink a device, removing its listener.
    pub fn detach(&mut self, id: &str) -> bool {
        let before = self.links.len();
        self.links.retain(|link| link.id() != id);
        self.links.len() != before
    }

    pub fn detach_all(&mut self) {
        self.links.clear();
    }

    pub fn is_linked(&self, id: &str) -> bool {
        self.links.iter().any(|link| link.id() == id)
    }

    pub fn linked_count(&self) -> usize {
        self.links.len()
    }

    pub fn session_state(&self, id: &str) -> Option<SessionState> {
        self.links
            .iter()
            .find(|link| link.id() == id)
            .map(DeviceLink::session_state)
    }

    /// Send the current palette to `slot` on every linked device.
    /// Returns the number of devices that accepted the message.
    pub fn upload(&self, slot: Slot) -> usize {
        if self.links.is_empty() {
            return 0;
        }

        let message = build_upload_message(&self.store.palette(), slot, &self.config);
        if !has_only_data_bytes(&message) {
            warn!("palette has channel values above 127, strict MIDI ports will reject the upload");
        }

        let mut written = 0;
        for link in &self.links {
            match link.send(&message) {
                Ok(()) => written += 1,
                Err(err) => warn!("{err}"),
            }
        }

        debug!(
            "uploaded palette to slot {} on {}/{} device(s)",
            slot.number(),
            written,
            self.links.len()
        );
        written
    }
}
