//! The ordered collection of stream slots.
//!
//! Order is meaningful: a slot's 1-based position is its on-screen number and
//! the address used by the select-then-assign flow. Edits to a single slot
//! are addressed by [`SlotId`], which survives reordering and channel changes.
//!
//! Every mutating method takes the current [`Capabilities`] and silently
//! refuses what the tier does not allow. Slots sitting at an index beyond
//! `caps.max_slots` (left over after a trial lapses) are frozen: they stay
//! visible but accept no edits.

use serde::{Deserialize, Serialize};

use crate::arrange::Framed;
use crate::entitlement::{Capabilities, MAX_SLOTS};
use crate::layout::{
    Frame, LayoutMode, Placement, Row, StreamSize, SLOT_DEFAULT_SIZE, SLOT_GRID_COLUMNS,
    SLOT_PITCH_X, SLOT_PITCH_Y,
};
use crate::platform::{catalog, CatalogEntry, Platform};

/// Stable identity of a slot for the lifetime of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(u64);

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamSlot {
    pub id: SlotId,
    pub channel: String,
    pub platform: Platform,
    pub size: StreamSize,
    pub row: Row,
    pub frame: Frame,
}

impl StreamSlot {
    /// Project the slot onto the fields `mode` actually renders.
    pub fn placement(&self, mode: LayoutMode) -> Placement {
        match mode {
            LayoutMode::Grid => Placement::Grid {
                span: self.size.column_span(),
            },
            LayoutMode::TopBottom => Placement::TopBottom { row: self.row },
            LayoutMode::Freeform => Placement::Freeform { frame: self.frame },
        }
    }
}

impl Framed for StreamSlot {
    fn frame(&self) -> Frame {
        self.frame
    }

    fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }
}

/// Frame of default grid cell `cell` (row-major, three columns).
pub fn default_frame(cell: usize) -> Frame {
    let col = cell % SLOT_GRID_COLUMNS;
    let row = cell / SLOT_GRID_COLUMNS;
    Frame::new(
        col as f64 * SLOT_PITCH_X,
        row as f64 * SLOT_PITCH_Y,
        SLOT_DEFAULT_SIZE.width,
        SLOT_DEFAULT_SIZE.height,
    )
}

/// The six slots a premium viewer starts from, in display order.
pub const PREMIUM_DEFAULTS: [(&str, Platform); MAX_SLOTS] = [
    ("xqc", Platform::Twitch),
    ("shroud", Platform::Twitch),
    ("pokimane", Platform::Twitch),
    ("summit1g", Platform::Twitch),
    ("lirik", Platform::Twitch),
    ("timthetatman", Platform::Twitch),
];

/// Grid cells searched for a free position before falling back.
pub const FREE_CELL_SEARCH: usize = MAX_SLOTS * SLOT_GRID_COLUMNS * 4;

/// Where [`SlotModel::restore_defaults`] puts each of the six defaults:
/// origin and row, in the same order as [`PREMIUM_DEFAULTS`]. The last one
/// takes the top-right cell but keeps its bottom-row assignment.
pub const PREMIUM_DEFAULT_PLACES: [(f64, f64, Row); MAX_SLOTS] = [
    (0.0, 0.0, Row::Top),
    (SLOT_PITCH_X, 0.0, Row::Top),
    (0.0, SLOT_PITCH_Y, Row::Bottom),
    (SLOT_PITCH_X, SLOT_PITCH_Y, Row::Bottom),
    (2.0 * SLOT_PITCH_X, SLOT_PITCH_Y, Row::Bottom),
    (2.0 * SLOT_PITCH_X, 0.0, Row::Bottom),
];

/// How many default slots the trial fills in.
pub const TRIAL_DEFAULT_COUNT: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct SlotModel {
    slots: Vec<StreamSlot>,
    next_id: u64,
}

impl SlotModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two free-tier slots every new session starts with.
    pub fn with_defaults() -> Self {
        let mut model = Self::new();
        for (channel, platform) in PREMIUM_DEFAULTS.iter().take(2) {
            let frame = default_frame(model.slots.len());
            model.push(channel, *platform, frame);
        }
        model
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[StreamSlot] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&StreamSlot> {
        self.slots.get(index)
    }

    pub fn index_of(&self, id: SlotId) -> Option<usize> {
        self.slots.iter().position(|s| s.id == id)
    }

    pub fn by_id(&self, id: SlotId) -> Option<&StreamSlot> {
        self.slots.iter().find(|s| s.id == id)
    }

    /// Fixed-length view for the arrangement engine; it moves frames but can
    /// never add or drop slots.
    pub(crate) fn slots_mut(&mut self) -> &mut [StreamSlot] {
        &mut self.slots
    }

    /// True when the slot at `index` is retained beyond the tier's cap.
    pub fn is_frozen(&self, index: usize, caps: &Capabilities) -> bool {
        index >= caps.max_slots
    }

    fn allocate_id(&mut self) -> SlotId {
        let id = SlotId(self.next_id);
        self.next_id += 1;
        id
    }

    fn push(&mut self, channel: &str, platform: Platform, frame: Frame) -> SlotId {
        let row = if frame.origin.y > 0.0 { Row::Bottom } else { Row::Top };
        self.push_placed(channel, platform, frame, row)
    }

    fn push_placed(&mut self, channel: &str, platform: Platform, frame: Frame, row: Row) -> SlotId {
        let id = self.allocate_id();
        self.slots.push(StreamSlot {
            id,
            channel: channel.to_string(),
            platform,
            size: StreamSize::Medium,
            row,
            frame,
        });
        id
    }

    fn has_room(&self, caps: &Capabilities) -> bool {
        self.slots.len() < caps.max_slots.min(MAX_SLOTS)
    }

    /// First default grid cell whose frame overlaps no existing slot, or the
    /// cell matching the current length when none of the first
    /// [`FREE_CELL_SEARCH`] cells is free.
    pub fn next_free_frame(&self) -> Frame {
        (0..FREE_CELL_SEARCH)
            .map(default_frame)
            .find(|candidate| !self.slots.iter().any(|s| s.frame.overlaps(candidate)))
            .unwrap_or_else(|| default_frame(self.slots.len()))
    }

    /// Append a slot at the next free default position. `None` when the
    /// collection is at the tier's cap or the channel is blank.
    pub fn add_slot(
        &mut self,
        channel: &str,
        platform: Platform,
        caps: &Capabilities,
    ) -> Option<SlotId> {
        let channel = channel.trim();
        if channel.is_empty() {
            return None;
        }
        if !self.has_room(caps) {
            tracing::debug!(len = self.slots.len(), cap = caps.max_slots, "add_slot rejected at capacity");
            return None;
        }
        let frame = self.next_free_frame();
        Some(self.push(channel, platform, frame))
    }

    /// Remove the slot at `index`. Requires the remove capability.
    pub fn remove_slot(&mut self, index: usize, caps: &Capabilities) -> Option<StreamSlot> {
        if !caps.remove || index >= self.slots.len() {
            tracing::debug!(index, "remove_slot rejected");
            return None;
        }
        Some(self.slots.remove(index))
    }

    /// Bind `channel`/`platform` into the slot at `index`. An index at or past
    /// the end appends one new slot instead, subject to the usual capacity
    /// rules. Frozen slots are left alone.
    pub fn assign_to_slot(
        &mut self,
        index: usize,
        channel: &str,
        platform: Platform,
        caps: &Capabilities,
    ) -> Option<SlotId> {
        let channel = channel.trim();
        if channel.is_empty() || self.is_frozen(index, caps) {
            return None;
        }
        match self.slots.get_mut(index) {
            Some(slot) => {
                slot.channel = channel.to_string();
                slot.platform = platform;
                Some(slot.id)
            }
            None => self.add_slot(channel, platform, caps),
        }
    }

    fn editable(&mut self, id: SlotId, caps: &Capabilities) -> Option<&mut StreamSlot> {
        let index = self.index_of(id)?;
        if self.is_frozen(index, caps) {
            tracing::debug!(slot = %id, "edit rejected on frozen slot");
            return None;
        }
        self.slots.get_mut(index)
    }

    /// Rename the channel shown in a slot. Allowed on every tier.
    pub fn change_channel(&mut self, id: SlotId, new_channel: &str, caps: &Capabilities) -> bool {
        let new_channel = new_channel.trim();
        if new_channel.is_empty() {
            return false;
        }
        match self.editable(id, caps) {
            Some(slot) => {
                slot.channel = new_channel.to_string();
                true
            }
            None => false,
        }
    }

    pub fn change_platform(&mut self, id: SlotId, platform: Platform, caps: &Capabilities) -> bool {
        if !caps.switch_platform {
            return false;
        }
        match self.editable(id, caps) {
            Some(slot) => {
                slot.platform = platform;
                true
            }
            None => false,
        }
    }

    pub fn cycle_size(&mut self, id: SlotId, caps: &Capabilities) -> bool {
        if !caps.cycle_size {
            return false;
        }
        match self.editable(id, caps) {
            Some(slot) => {
                slot.size = slot.size.next();
                true
            }
            None => false,
        }
    }

    /// Move a slot between rows; only meaningful in the top/bottom layout.
    pub fn toggle_row(&mut self, id: SlotId, mode: LayoutMode, caps: &Capabilities) -> bool {
        if !caps.arrange || mode != LayoutMode::TopBottom {
            return false;
        }
        match self.editable(id, caps) {
            Some(slot) => {
                slot.row = slot.row.flipped();
                true
            }
            None => false,
        }
    }

    /// Replace everything with the six premium defaults at their fixed
    /// places.
    pub fn restore_defaults(&mut self, caps: &Capabilities) -> bool {
        if caps.max_slots < MAX_SLOTS {
            return false;
        }
        self.slots.clear();
        for ((channel, platform), (x, y, row)) in PREMIUM_DEFAULTS.into_iter().zip(PREMIUM_DEFAULT_PLACES) {
            let frame = Frame::new(x, y, SLOT_DEFAULT_SIZE.width, SLOT_DEFAULT_SIZE.height);
            self.push_placed(channel, platform, frame, row);
        }
        true
    }

    /// Append default slots, skipping channels already on screen, until the
    /// collection holds `target` slots or the tier's cap.
    pub fn populate_defaults(&mut self, target: usize, caps: &Capabilities) {
        for (channel, platform) in PREMIUM_DEFAULTS {
            if self.slots.len() >= target || !self.has_room(caps) {
                break;
            }
            if self.slot_number(channel, platform).is_some() {
                continue;
            }
            let frame = self.next_free_frame();
            self.push(channel, platform, frame);
        }
    }

    /// Replace the collection with `entries` at fixed default cells. Used
    /// by onboarding; extra entries past the free cap are dropped.
    pub fn seed(&mut self, entries: &[(String, Platform)], caps: &Capabilities) {
        self.slots.clear();
        for (channel, platform) in entries {
            if !self.has_room(caps) {
                break;
            }
            let channel = channel.trim();
            if channel.is_empty() {
                continue;
            }
            let frame = default_frame(self.slots.len());
            self.push(channel, *platform, frame);
        }
    }

    /// 1-based number of the first slot showing `channel` on `platform`.
    pub fn slot_number(&self, channel: &str, platform: Platform) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.channel == channel && s.platform == platform)
            .map(|i| i + 1)
    }

    /// Catalog entries for `platform` that no slot is showing yet.
    pub fn available_channels(&self, platform: Platform) -> Vec<&'static CatalogEntry> {
        catalog(platform)
            .filter(|e| self.slot_number(e.channel, platform).is_none())
            .collect()
    }
}
