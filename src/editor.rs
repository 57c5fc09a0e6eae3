//! Palette editor state exposed to the page.
//!
//! This module wires the store, the picker selection, file import/export and
//! device sync behind one JavaScript-facing object. Its methods take `&self`
//! so a change callback may call back into the editor.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Function, Uint8Array};
use log::{debug, warn};
use wasm_bindgen::prelude::*;

use crate::color::{Hsv, Rgb};
use crate::device::{
    FirmwareType, ListenerId, ListenerRegistry, PaletteSync, SysexDevice, SysexListener,
};
use crate::error::PaletteError;
use crate::palette::{
    decode_palette_file, encode_palette_file, move_cursor, Direction, ObserverId, PaletteEvent,
    PaletteStore, PALETTE_SIZE,
};
use crate::protocol::{Slot, SysexConfig};

/// A MIDI device supplied by the page.
///
/// Outbound messages go through the `send` callback; the page forwards every
/// inbound sysex message to `dispatchSysex`.
#[wasm_bindgen]
pub struct JsSysexDevice {
    inner: Rc<JsDeviceInner>,
}

struct JsDeviceInner {
    id: String,
    firmware: FirmwareType,
    send: Function,
    listeners: ListenerRegistry,
}

impl SysexDevice for JsDeviceInner {
    fn id(&self) -> &str {
        &self.id
    }

    fn firmware(&self) -> FirmwareType {
        self.firmware
    }

    fn send(&self, message: &[u8]) -> crate::error::Result<()> {
        let bytes = Uint8Array::from(message);
        self.send
            .call1(&JsValue::NULL, &bytes)
            .map(drop)
            .map_err(|err| PaletteError::SendFailed {
                device: self.id.clone(),
                reason: format!("{err:?}"),
            })
    }

    fn add_sysex_listener(&self, listener: SysexListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_sysex_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

#[wasm_bindgen]
impl JsSysexDevice {
    #[wasm_bindgen(constructor)]
    pub fn new(id: String, firmware: FirmwareType, send: Function) -> Self {
        Self {
            inner: Rc::new(JsDeviceInner {
                id,
                firmware,
                send,
                listeners: ListenerRegistry::new(),
            }),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn id(&self) -> String {
        self.inner.id.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn firmware(&self) -> FirmwareType {
        self.inner.firmware
    }

    /// Feed one inbound sysex message (including the leading F0).
    #[wasm_bindgen(js_name = dispatchSysex)]
    pub fn dispatch_sysex(&self, data: &[u8]) {
        self.inner.listeners.dispatch(data);
    }
}

/// Palette editor: the palette, the selected entry, picker HSV and device sync.
#[wasm_bindgen]
pub struct PaletteEditor {
    store: Rc<PaletteStore>,
    sync: RefCell<PaletteSync>,
    selected: Cell<usize>,
    hsv: Cell<Hsv>,
    slot: Cell<Slot>,
}

#[wasm_bindgen]
impl PaletteEditor {
    /// Create an editor seeded with the default palette.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::with_store(PaletteStore::with_default_palette())
    }

    /// Create an editor with an empty palette.
    pub fn empty() -> Self {
        Self::with_store(PaletteStore::new())
    }

    /// Number of populated entries.
    #[wasm_bindgen(getter)]
    pub fn count(&self) -> usize {
        self.store.palette().len()
    }

    #[wasm_bindgen(getter)]
    pub fn dirty(&self) -> bool {
        self.store.is_dirty()
    }

    /// Acknowledge an export or upload.
    #[wasm_bindgen(js_name = clearDirty)]
    pub fn clear_dirty(&self) {
        self.store.clear_dirty();
    }

    /// Color at `index` as `#rrggbb`, or undefined when absent.
    #[wasm_bindgen(js_name = getColor)]
    pub fn get_color(&self, index: usize) -> Option<String> {
        self.store.get(index).map(Rgb::to_hex)
    }

    #[wasm_bindgen(js_name = setColor)]
    pub fn set_color(&self, index: usize, hex: &str) -> Result<(), JsError> {
        let color = Rgb::from_hex(hex)?;
        self.store.set(index, color)?;
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn selected(&self) -> usize {
        self.selected.get()
    }

    /// Select an entry and load its color into the picker.
    pub fn select(&self, index: usize) -> Result<(), JsError> {
        if index >= PALETTE_SIZE {
            return Err(PaletteError::IndexOutOfRange(index).into());
        }
        self.set_selected(index);
        Ok(())
    }

    /// Move the selection one step. Returns the new index.
    #[wasm_bindgen(js_name = moveSelection)]
    pub fn move_selection(&self, direction: Direction) -> usize {
        // The selection is always in range, so navigation cannot fail.
        let current = self.selected.get();
        let next = move_cursor(current, direction).unwrap_or(current);
        self.set_selected(next);
        next
    }

    /// Handle a `KeyboardEvent.key`. Returns true if it was a navigation key.
    #[wasm_bindgen(js_name = handleKey)]
    pub fn handle_key(&self, key: &str) -> bool {
        match Direction::from_key(key) {
            Some(direction) => {
                self.move_selection(direction);
                true
            }
            None => false,
        }
    }

    /// Current picker color.
    #[wasm_bindgen(getter)]
    pub fn hsv(&self) -> Hsv {
        self.hsv.get()
    }

    /// Write a picker color (hex) into the selected entry.
    #[wasm_bindgen(js_name = applyPickerColor)]
    pub fn apply_picker_color(&self, hex: &str) -> Result<(), JsError> {
        let color = Rgb::from_hex(hex)?;
        self.hsv.set(color.to_hsv());
        self.store.set(self.selected.get(), color)?;
        Ok(())
    }

    /// Write a picker color (HSV) into the selected entry, keeping the
    /// picker's hue even for achromatic colors.
    #[wasm_bindgen(js_name = applyPickerHsv)]
    pub fn apply_picker_hsv(&self, hsv: Hsv) -> Result<(), JsError> {
        self.hsv.set(hsv);
        self.store.set(self.selected.get(), hsv.to_rgb())?;
        Ok(())
    }

    /// Replace the palette with the contents of a palette file.
    #[wasm_bindgen(js_name = importPalette)]
    pub fn import_palette(&self, data: &[u8]) -> Result<(), JsError> {
        let palette = decode_palette_file(data)?;
        let selected = palette.get(self.selected.get()).unwrap_or_default();
        self.hsv.set(selected.to_hsv());
        self.store.replace_all(palette);
        debug!("imported palette file ({} bytes)", data.len());
        Ok(())
    }

    /// Serialize the palette for download.
    #[wasm_bindgen(js_name = exportPalette)]
    pub fn export_palette(&self) -> Vec<u8> {
        encode_palette_file(&self.store.palette())
    }

    /// Target upload slot (1-3).
    #[wasm_bindgen(getter)]
    pub fn slot(&self) -> u8 {
        self.slot.get().number()
    }

    #[wasm_bindgen(js_name = setSlot)]
    pub fn set_slot(&self, slot: u8) -> Result<(), JsError> {
        self.slot.set(Slot::new(slot)?);
        Ok(())
    }

    /// When enabled, inbound frames must start with the configured header.
    #[wasm_bindgen(js_name = setMatchHeader)]
    pub fn set_match_header(&self, enabled: bool) {
        let mut sync = self.sync.borrow_mut();
        let config = SysexConfig {
            match_header: enabled,
            ..sync.config().clone()
        };
        sync.set_config(config);
    }

    /// Subscribe to palette downloads from a device. Returns false for
    /// devices without custom firmware and for devices already connected.
    #[wasm_bindgen(js_name = connectDevice)]
    pub fn connect_device(&self, device: &JsSysexDevice) -> bool {
        self.sync.borrow_mut().attach(device.inner.clone())
    }

    #[wasm_bindgen(js_name = disconnectDevice)]
    pub fn disconnect_device(&self, id: &str) -> bool {
        self.sync.borrow_mut().detach(id)
    }

    /// Upload the palette to the selected slot on every connected
    /// custom-firmware device. Returns the number of devices whose `send`
    /// accepted the message; a throwing `send` is not counted.
    pub fn upload(&self) -> usize {
        self.sync.borrow().upload(self.slot.get())
    }

    /// Register `callback(kind, index)` for palette changes. `kind` is
    /// `"entry"`, `"replaced"` or `"clean"`; `index` is -1 unless `kind`
    /// is `"entry"`.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: Function) -> u32 {
        let id = self.store.subscribe(move |event| {
            let (kind, index) = match *event {
                PaletteEvent::EntryChanged { index, .. } => ("entry", index as i32),
                PaletteEvent::Replaced => ("replaced", -1),
                PaletteEvent::DirtyCleared => ("clean", -1),
            };
            let kind = JsValue::from_str(kind);
            if let Err(err) = callback.call2(&JsValue::NULL, &kind, &JsValue::from(index)) {
                warn!("palette change callback failed: {:?}", err);
            }
        });
        id.raw()
    }

    #[wasm_bindgen(js_name = offChange)]
    pub fn off_change(&self, id: u32) -> bool {
        self.store.unsubscribe(ObserverId::from_raw(id))
    }

    /// Disconnect every device.
    #[wasm_bindgen]
    pub fn dispose(&self) {
        self.sync.borrow_mut().detach_all();
    }
}

impl PaletteEditor {
    fn with_store(store: PaletteStore) -> Self {
        let store = Rc::new(store);
        let editor = Self {
            sync: RefCell::new(PaletteSync::new(Rc::clone(&store), SysexConfig::default())),
            store,
            selected: Cell::new(0),
            hsv: Cell::new(Hsv::default()),
            slot: Cell::new(Slot::default()),
        };
        editor.refresh_picker();
        editor
    }

    pub fn store(&self) -> Rc<PaletteStore> {
        Rc::clone(&self.store)
    }

    fn set_selected(&self, index: usize) {
        if index != self.selected.replace(index) {
            self.refresh_picker();
        }
    }

    /// Load the selected entry into the picker; absent entries show as black.
    fn refresh_picker(&self) {
        let color = self.store.get(self.selected.get()).unwrap_or_default();
        self.hsv.set(color.to_hsv());
    }
}

impl Default for PaletteEditor {
    fn default() -> Self {
        Self::new()
    }
}
