//! Sparse 128-entry palette and the observable store that owns it.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use log::trace;

use crate::color::Rgb;
use crate::error::{PaletteError, Result};

/// Number of palette entries (indices 0..=127).
pub const PALETTE_SIZE: usize = 128;

/// Sparse mapping from palette index to color.
///
/// An absent entry is distinct from black: it has simply not been populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [Option<Rgb>; PALETTE_SIZE],
}

impl Palette {
    /// An empty palette with no populated indices.
    pub fn new() -> Self {
        Self {
            entries: [None; PALETTE_SIZE],
        }
    }

    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.entries.get(index).copied().flatten()
    }

    /// Insert or overwrite an entry.
    pub fn insert(&mut self, index: usize, color: Rgb) -> Result<()> {
        let slot = self
            .entries
            .get_mut(index)
            .ok_or(PaletteError::IndexOutOfRange(index))?;
        *slot = Some(color);
        Ok(())
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.entries.iter().all(Option::is_some)
    }

    pub fn clear(&mut self) {
        self.entries = [None; PALETTE_SIZE];
    }

    /// Populated entries in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Rgb)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.map(|c| (i, c)))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[Rgb; PALETTE_SIZE]> for Palette {
    /// A fully populated palette.
    fn from(colors: [Rgb; PALETTE_SIZE]) -> Self {
        Self {
            entries: colors.map(Some),
        }
    }
}

/// Change notifications delivered to store observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteEvent {
    /// A single entry was set by an edit.
    EntryChanged { index: usize, color: Rgb },
    /// The whole palette was replaced (file import or device download).
    Replaced,
    /// The caller acknowledged an export or upload.
    DirtyCleared,
}

/// Handle returned by [`PaletteStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u32);

type Observer = Rc<RefCell<dyn FnMut(&PaletteEvent)>>;

#[derive(Debug, Default)]
struct StoreState {
    palette: Palette,
    dirty: bool,
}

/// The canonical palette plus the dirty flag, shared as `Rc<PaletteStore>`.
///
/// Every mutation sets `dirty`; only [`PaletteStore::clear_dirty`] resets it.
/// Observers run after the state borrow is released, so they may read the
/// store, mutate it, or unsubscribe. An observer is not re-entered by the
/// notifications its own mutations cause.
pub struct PaletteStore {
    state: RefCell<StoreState>,
    observers: RefCell<Vec<(ObserverId, Observer)>>,
    next_observer: Cell<u32>,
}

impl PaletteStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::from_palette(Palette::new())
    }

    /// Create a store seeded with the generated startup palette.
    pub fn with_default_palette() -> Self {
        Self::from_palette(super::default_palette())
    }

    /// Create a store holding `palette`. The store starts clean.
    pub fn from_palette(palette: Palette) -> Self {
        Self {
            state: RefCell::new(StoreState {
                palette,
                dirty: false,
            }),
            observers: RefCell::new(Vec::new()),
            next_observer: Cell::new(0),
        }
    }

    /// Borrow the current palette. Release it before mutating the store.
    pub fn palette(&self) -> Ref<'_, Palette> {
        Ref::map(self.state.borrow(), |state| &state.palette)
    }

    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.state.borrow().palette.get(index)
    }

    pub fn is_dirty(&self) -> bool {
        self.state.borrow().dirty
    }

    /// Set one entry, replacing any existing color.
    pub fn set(&self, index: usize, color: Rgb) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            state.palette.insert(index, color)?;
            state.dirty = true;
        }
        self.notify(PaletteEvent::EntryChanged { index, color });
        Ok(())
    }

    /// Replace the whole palette, dropping indices absent from `palette`.
    pub fn replace_all(&self, palette: Palette) {
        *self.state.borrow_mut() = StoreState {
            palette,
            dirty: true,
        };
        self.notify(PaletteEvent::Replaced);
    }

    pub fn clear_dirty(&self) {
        self.state.borrow_mut().dirty = false;
        self.notify(PaletteEvent::DirtyCleared);
    }

    /// Register a change observer.
    pub fn subscribe(&self, observer: impl FnMut(&PaletteEvent) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer.get());
        self.next_observer.set(id.0.wrapping_add(1));
        let observer: Observer = Rc::new(RefCell::new(observer));
        self.observers.borrow_mut().push((id, observer));
        id
    }

    /// Remove an observer. Returns false if `id` was not registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(oid, _)| *oid != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    fn is_subscribed(&self, id: ObserverId) -> bool {
        self.observers.borrow().iter().any(|(oid, _)| *oid == id)
    }

    fn notify(&self, event: PaletteEvent) {
        let observers: Vec<_> = self
            .observers
            .borrow()
            .iter()
            .map(|(id, observer)| (*id, Rc::clone(observer)))
            .collect();

        for (id, observer) in observers {
            // Unsubscribed by an earlier observer in this round.
            if !self.is_subscribed(id) {
                continue;
            }
            match observer.try_borrow_mut() {
                Ok(mut observer) => (*observer)(&event),
                Err(_) => trace!("observer {} busy, skipping nested {event:?}", id.0),
            }
        }
    }
}

impl Default for PaletteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObserverId {
    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}
