//! The dashboard session: one aggregate, one action type, one reducer.
//!
//! Every user interaction arrives as an [`Action`] and goes through
//! [`DashboardSession::apply`]. Trial countdown ticks and checkout results
//! come in through their own entry points. Nothing here blocks or does I/O;
//! side effects the caller must perform are returned as [`Effect`]s.

use serde::{Deserialize, Serialize};

use crate::arrange::{Corner, Tracker};
use crate::chat::{ChatPopouts, ChatWindow, CHAT_MIN_SIZE};
use crate::checkout::{failure_notice, CheckoutError, CheckoutRedirect, Plan};
use crate::entitlement::{Capabilities, Entitlement, TickOutcome, Tier, DEFAULT_TRIAL_SECS, MAX_SLOTS};
use crate::layout::{ClampPolicy, LayoutMode, Placement, Point, Size, StreamSize, SLOT_MIN_SIZE};
use crate::onboarding::{Onboarding, OnboardingStep};
use crate::platform::{chat_url, video_url, CatalogEntry, EmbedOptions, Platform};
use crate::slots::{SlotId, SlotModel, TRIAL_DEFAULT_COUNT};

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// Accent colours offered to premium viewers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeColor {
    #[default]
    Purple,
    Blue,
    Green,
    Red,
    Orange,
}

impl ThemeColor {
    pub const ALL: [ThemeColor; 5] = [
        ThemeColor::Purple,
        ThemeColor::Blue,
        ThemeColor::Green,
        ThemeColor::Red,
        ThemeColor::Orange,
    ];

    pub fn hex(self) -> &'static str {
        match self {
            ThemeColor::Purple => "#9333ea",
            ThemeColor::Blue => "#2563eb",
            ThemeColor::Green => "#16a34a",
            ThemeColor::Red => "#dc2626",
            ThemeColor::Orange => "#ea580c",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub muted: bool,
    /// Inline chat panels under each slot.
    pub show_chats: bool,
    pub dark_mode: bool,
    pub theme: ThemeColor,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            muted: false,
            show_chats: true,
            dark_mode: false,
            theme: ThemeColor::default(),
        }
    }
}

/// Per-platform sign-in state as reported by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthState {
    pub twitch: bool,
    pub kick: bool,
    pub youtube: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            twitch: true,
            kick: false,
            youtube: false,
        }
    }
}

impl AuthState {
    pub fn is_signed_in(&self, platform: Platform) -> bool {
        match platform {
            Platform::Twitch => self.twitch,
            Platform::Kick => self.kick,
            Platform::Youtube => self.youtube,
        }
    }

    fn set(&mut self, platform: Platform, signed_in: bool) {
        match platform {
            Platform::Twitch => self.twitch = signed_in,
            Platform::Kick => self.kick = signed_in,
            Platform::Youtube => self.youtube = signed_in,
        }
    }
}

// ---------------------------------------------------------------------------
// Actions and effects
// ---------------------------------------------------------------------------

fn default_chat_corner() -> Corner {
    Corner::Se
}

/// One user interaction, as posted by the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    AddSlot { channel: String, platform: Platform },
    RemoveSlot { index: usize },
    AssignToSlot { index: usize, channel: String, platform: Platform },
    ChangeChannel { slot: SlotId, channel: String },
    ChangePlatform { slot: SlotId, platform: Platform },
    CycleSize { slot: SlotId },
    ToggleRow { slot: SlotId },
    RestoreDefaults,

    SelectSlot { index: usize },
    AssignStreamer { channel: String, platform: Platform },

    OpenChat { channel: String, platform: Platform },
    CloseChat { index: usize },

    DragSlot { index: usize, pointer: Point },
    ResizeSlot { index: usize, corner: Corner, pointer: Point },
    DragChat { index: usize, pointer: Point },
    ResizeChat {
        index: usize,
        #[serde(default = "default_chat_corner")]
        corner: Corner,
        pointer: Point,
    },
    PointerMove { pointer: Point },
    PointerUp,

    SetLayout { mode: LayoutMode },
    CycleLayout,
    ToggleMute,
    ToggleChats,
    ToggleDarkMode,
    SetTheme { color: ThemeColor },
    SetAuth { platform: Platform, signed_in: bool },

    StartTrial,
    DismissTrialPrompt,
    OpenPlans,
    ClosePlans,
    DismissNotice,

    OnboardingPlatform { platform: Platform },
    OnboardingBack,
    OnboardingComplete { channels: Vec<String> },
    OnboardingSkip,
}

/// Work the owner of the session must carry out after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Write the onboarding-completed flag.
    PersistOnboarding,
    /// Begin the one-second countdown driver.
    StartTrialTimer,
    /// Tear down a running countdown driver.
    StopTrialTimer,
}

/// Result of [`DashboardSession::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    /// Whether anything observable changed.
    pub changed: bool,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged() -> Self {
        Self::default()
    }

    fn changed(changed: bool) -> Self {
        Self {
            changed,
            effects: Vec::new(),
        }
    }

    fn with(effect: Effect) -> Self {
        Self {
            changed: true,
            effects: vec![effect],
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A checkout the viewer was sent off to pay for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingCheckout {
    pub plan: Plan,
    pub session_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub trial_secs: u32,
    pub clamp_policy: ClampPolicy,
    /// Persisted flag read at startup.
    pub onboarding_completed: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            trial_secs: DEFAULT_TRIAL_SECS,
            clamp_policy: ClampPolicy::default(),
            onboarding_completed: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardSession {
    slots: SlotModel,
    chats: ChatPopouts,
    entitlement: Entitlement,
    slot_tracker: Tracker,
    chat_tracker: Tracker,
    layout: LayoutMode,
    selected_slot: Option<usize>,
    prefs: Preferences,
    auth: AuthState,
    onboarding: Onboarding,
    plans_open: bool,
    notice: Option<String>,
    pending_checkout: Option<PendingCheckout>,
    trial_secs: u32,
}

impl DashboardSession {
    pub fn new(opts: SessionOptions) -> Self {
        Self {
            slots: SlotModel::with_defaults(),
            chats: ChatPopouts::new(),
            entitlement: Entitlement::new(),
            slot_tracker: Tracker::new(SLOT_MIN_SIZE, opts.clamp_policy),
            chat_tracker: Tracker::new(CHAT_MIN_SIZE, opts.clamp_policy),
            layout: LayoutMode::default(),
            selected_slot: None,
            prefs: Preferences::default(),
            auth: AuthState::default(),
            onboarding: Onboarding::new(opts.onboarding_completed),
            plans_open: false,
            notice: None,
            pending_checkout: None,
            trial_secs: opts.trial_secs,
        }
    }

    pub fn slots(&self) -> &SlotModel {
        &self.slots
    }

    pub fn chats(&self) -> &ChatPopouts {
        &self.chats
    }

    pub fn entitlement(&self) -> &Entitlement {
        &self.entitlement
    }

    pub fn capabilities(&self) -> Capabilities {
        self.entitlement.capabilities()
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn selected_slot(&self) -> Option<usize> {
        self.selected_slot
    }

    pub fn preferences(&self) -> Preferences {
        self.prefs
    }

    pub fn onboarding(&self) -> &Onboarding {
        &self.onboarding
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn plans_open(&self) -> bool {
        self.plans_open
    }

    pub fn pending_checkout(&self) -> Option<&PendingCheckout> {
        self.pending_checkout.as_ref()
    }

    /// True while either tracker is mid-gesture.
    pub fn is_interacting(&self) -> bool {
        !self.slot_tracker.is_idle() || !self.chat_tracker.is_idle()
    }

    pub fn apply(&mut self, action: Action) -> Transition {
        let caps = self.capabilities();
        match action {
            Action::AddSlot { channel, platform } => {
                Transition::changed(self.slots.add_slot(&channel, platform, &caps).is_some())
            }
            Action::RemoveSlot { index } => Transition::changed(self.remove_slot(index, &caps)),
            Action::AssignToSlot {
                index,
                channel,
                platform,
            } => Transition::changed(
                self.slots
                    .assign_to_slot(index, &channel, platform, &caps)
                    .is_some(),
            ),
            Action::ChangeChannel { slot, channel } => {
                Transition::changed(self.slots.change_channel(slot, &channel, &caps))
            }
            Action::ChangePlatform { slot, platform } => {
                Transition::changed(self.slots.change_platform(slot, platform, &caps))
            }
            Action::CycleSize { slot } => Transition::changed(self.slots.cycle_size(slot, &caps)),
            Action::ToggleRow { slot } => {
                Transition::changed(self.slots.toggle_row(slot, self.layout, &caps))
            }
            Action::RestoreDefaults => {
                let restored = self.slots.restore_defaults(&caps);
                if restored {
                    self.slot_tracker.pointer_up();
                    self.selected_slot = None;
                }
                Transition::changed(restored)
            }

            Action::SelectSlot { index } => Transition::changed(self.select_slot(index, &caps)),
            Action::AssignStreamer { channel, platform } => {
                Transition::changed(self.assign_streamer(&channel, platform, &caps))
            }

            Action::OpenChat { channel, platform } => {
                if !caps.pop_out_chat {
                    tracing::debug!(channel = %channel, "chat pop-out requires premium");
                    return Transition::unchanged();
                }
                Transition::changed(self.chats.open(channel.trim(), platform).is_some())
            }
            Action::CloseChat { index } => {
                let closed = self.chats.close(index).is_some();
                if closed {
                    self.chat_tracker.on_removed(index);
                }
                Transition::changed(closed)
            }

            Action::DragSlot { index, pointer } => {
                if !self.slot_gesture_allowed(index, &caps) {
                    return Transition::unchanged();
                }
                Transition::changed(self.slot_tracker.begin_drag(self.slots.slots(), index, pointer))
            }
            Action::ResizeSlot {
                index,
                corner,
                pointer,
            } => {
                if !self.slot_gesture_allowed(index, &caps) {
                    return Transition::unchanged();
                }
                Transition::changed(self.slot_tracker.begin_resize(
                    self.slots.slots(),
                    index,
                    corner,
                    pointer,
                ))
            }
            Action::DragChat { index, pointer } => {
                if !caps.pop_out_chat {
                    tracing::debug!(index, "chat gesture refused");
                    return Transition::unchanged();
                }
                Transition::changed(self.chat_tracker.begin_drag(self.chats.windows(), index, pointer))
            }
            Action::ResizeChat {
                index,
                corner,
                pointer,
            } => {
                if !caps.pop_out_chat {
                    tracing::debug!(index, "chat gesture refused");
                    return Transition::unchanged();
                }
                Transition::changed(self.chat_tracker.begin_resize(
                    self.chats.windows(),
                    index,
                    corner,
                    pointer,
                ))
            }
            Action::PointerMove { pointer } => {
                let moved_slot = self.slot_tracker.pointer_move(self.slots.slots_mut(), pointer);
                let moved_chat = self.chat_tracker.pointer_move(self.chats.windows_mut(), pointer);
                Transition::changed(moved_slot || moved_chat)
            }
            Action::PointerUp => {
                let was_active = self.is_interacting();
                self.slot_tracker.pointer_up();
                self.chat_tracker.pointer_up();
                Transition::changed(was_active)
            }

            Action::SetLayout { mode } => Transition::changed(self.set_layout(mode)),
            Action::CycleLayout => Transition::changed(self.set_layout(self.layout.cycled())),
            Action::ToggleMute => {
                self.prefs.muted = !self.prefs.muted;
                Transition::changed(true)
            }
            Action::ToggleChats => {
                self.prefs.show_chats = !self.prefs.show_chats;
                Transition::changed(true)
            }
            Action::ToggleDarkMode => {
                if !caps.dark_mode && !self.prefs.dark_mode {
                    tracing::debug!("dark mode requires premium");
                    return Transition::unchanged();
                }
                self.prefs.dark_mode = !self.prefs.dark_mode;
                Transition::changed(true)
            }
            Action::SetTheme { color } => {
                if !caps.theme_colors || self.prefs.theme == color {
                    return Transition::unchanged();
                }
                self.prefs.theme = color;
                Transition::changed(true)
            }
            Action::SetAuth {
                platform,
                signed_in,
            } => {
                let before = self.auth.is_signed_in(platform);
                self.auth.set(platform, signed_in);
                Transition::changed(before != signed_in)
            }

            Action::StartTrial => self.start_trial(),
            Action::DismissTrialPrompt => {
                let shown = self.entitlement.trial_ended() || self.plans_open;
                self.entitlement.dismiss_trial_prompt();
                self.plans_open = false;
                Transition::changed(shown)
            }
            Action::OpenPlans => {
                if self.entitlement.tier() == Tier::Premium || self.plans_open {
                    return Transition::unchanged();
                }
                self.plans_open = true;
                Transition::changed(true)
            }
            Action::ClosePlans => {
                let was_open = self.plans_open;
                self.plans_open = false;
                Transition::changed(was_open)
            }
            Action::DismissNotice => Transition::changed(self.notice.take().is_some()),

            Action::OnboardingPlatform { platform } => {
                Transition::changed(self.onboarding.choose_platform(platform))
            }
            Action::OnboardingBack => Transition::changed(self.onboarding.back()),
            Action::OnboardingComplete { channels } => match self.onboarding.complete(&channels) {
                Some(seeds) => {
                    if !seeds.is_empty() {
                        self.slots.seed(&seeds, &caps);
                        self.selected_slot = None;
                        self.slot_tracker.pointer_up();
                    }
                    tracing::info!(seeded = seeds.len(), "onboarding completed");
                    Transition::with(Effect::PersistOnboarding)
                }
                None => Transition::unchanged(),
            },
            Action::OnboardingSkip => {
                if self.onboarding.skip() {
                    tracing::info!("onboarding skipped");
                    Transition::with(Effect::PersistOnboarding)
                } else {
                    Transition::unchanged()
                }
            }
        }
    }

    fn remove_slot(&mut self, index: usize, caps: &Capabilities) -> bool {
        if self.slots.remove_slot(index, caps).is_none() {
            return false;
        }
        self.slot_tracker.on_removed(index);
        self.selected_slot = match self.selected_slot {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        true
    }

    /// First step of the two-step assignment. Selecting the selected slot
    /// again clears the selection.
    fn select_slot(&mut self, index: usize, caps: &Capabilities) -> bool {
        if index >= caps.max_slots || index > self.slots.len() {
            tracing::debug!(index, cap = caps.max_slots, "slot selection refused");
            return false;
        }
        self.selected_slot = if self.selected_slot == Some(index) {
            None
        } else {
            Some(index)
        };
        true
    }

    fn assign_streamer(&mut self, channel: &str, platform: Platform, caps: &Capabilities) -> bool {
        let Some(index) = self.selected_slot.take() else {
            return false;
        };
        self.slots.assign_to_slot(index, channel, platform, caps);
        true
    }

    fn slot_gesture_allowed(&self, index: usize, caps: &Capabilities) -> bool {
        if self.layout != LayoutMode::Freeform || !caps.arrange {
            tracing::debug!(index, layout = ?self.layout, "slot gesture refused");
            return false;
        }
        !self.slots.is_frozen(index, caps)
    }

    fn set_layout(&mut self, mode: LayoutMode) -> bool {
        if self.layout == mode {
            return false;
        }
        self.layout = mode;
        self.slot_tracker.pointer_up();
        true
    }

    fn start_trial(&mut self) -> Transition {
        if !self.entitlement.start_trial(self.trial_secs) {
            tracing::debug!(tier = %self.entitlement.tier(), "trial not available");
            return Transition::unchanged();
        }
        let caps = self.capabilities();
        self.slots.populate_defaults(TRIAL_DEFAULT_COUNT, &caps);
        self.plans_open = false;
        tracing::info!(secs = self.trial_secs, slots = self.slots.len(), "trial started");
        Transition::with(Effect::StartTrialTimer)
    }

    /// One second of trial countdown. On expiry the plan chooser reopens,
    /// running gestures are dropped and pop-out chats go dormant until an
    /// upgrade brings them back.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.entitlement.tick();
        if outcome == TickOutcome::Expired {
            let caps = self.capabilities();
            self.slot_tracker.pointer_up();
            self.chat_tracker.pointer_up();
            if self.selected_slot.is_some_and(|s| s >= caps.max_slots) {
                self.selected_slot = None;
            }
            self.plans_open = true;
            tracing::info!(
                slots = self.slots.len(),
                frozen = self.slots.len().saturating_sub(caps.max_slots),
                "trial expired"
            );
        }
        outcome
    }

    /// Payment went through: unlock premium and fill the dashboard up to six
    /// slots.
    pub fn checkout_succeeded(&mut self, plan: Plan) -> Transition {
        let was_trial = self.entitlement.tier() == Tier::TrialPremium;
        if !self.entitlement.upgrade() {
            return Transition::unchanged();
        }
        self.pending_checkout = None;
        let caps = self.capabilities();
        self.slots.populate_defaults(MAX_SLOTS, &caps);
        self.plans_open = false;
        self.notice = Some("Premium upgrade successful! You now have access to all streams.".to_string());
        tracing::info!(plan = %plan, was_trial, "upgraded to premium");
        Transition::with(Effect::StopTrialTimer)
    }

    /// The viewer was handed a payment page for `plan`. The tier stays as it
    /// is until [`checkout_confirmed`](Self::checkout_confirmed).
    pub fn checkout_started(&mut self, plan: Plan, redirect: &CheckoutRedirect) -> Transition {
        if self.entitlement.tier() == Tier::Premium {
            return Transition::unchanged();
        }
        tracing::info!(plan = %plan, session = %redirect.session_id, "checkout awaiting payment");
        self.pending_checkout = Some(PendingCheckout {
            plan,
            session_id: redirect.session_id.clone(),
        });
        self.plans_open = false;
        self.notice = Some(format!(
            "Finish paying for the {} plan in the checkout page. Premium unlocks once the payment is confirmed.",
            plan
        ));
        Transition::changed(true)
    }

    /// The backend confirmed `session_id` as paid. Ignored unless it is the
    /// checkout this session is waiting on.
    pub fn checkout_confirmed(&mut self, session_id: &str) -> Transition {
        match self.pending_checkout.take() {
            Some(pending) if pending.session_id == session_id => self.checkout_succeeded(pending.plan),
            other => {
                tracing::warn!(session = session_id, "confirmation for an unknown checkout session");
                self.pending_checkout = other;
                Transition::unchanged()
            }
        }
    }

    /// The backend has no payment for the pending checkout yet. It stays
    /// pending so a later confirmation can still land.
    pub fn checkout_unpaid(&mut self, plan: Plan) -> Transition {
        tracing::info!(plan = %plan, "checkout not paid yet");
        self.notice = Some(format!(
            "Payment for the {} plan has not been completed yet.",
            plan
        ));
        Transition::changed(true)
    }

    pub fn checkout_failed(&mut self, plan: Plan, err: &CheckoutError) -> Transition {
        tracing::warn!(plan = %plan, error = %err, "checkout failed");
        self.notice = Some(failure_notice(plan, err));
        Transition::changed(true)
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Everything the page needs to draw, with embed URLs resolved for the
    /// embedding `host`.
    pub fn view(&self, host: &str) -> DashboardView {
        let caps = self.capabilities();
        let dark_mode = self.prefs.dark_mode && caps.dark_mode;
        let theme = if caps.theme_colors {
            self.prefs.theme
        } else {
            ThemeColor::default()
        };
        let opts = EmbedOptions {
            parent_host: host.to_string(),
            muted: self.prefs.muted,
            dark_mode,
        };

        let slots = self
            .slots
            .slots()
            .iter()
            .enumerate()
            .map(|(i, s)| SlotView {
                id: s.id,
                number: i + 1,
                channel: s.channel.clone(),
                platform: s.platform,
                size: s.size,
                placement: s.placement(self.layout),
                frozen: self.slots.is_frozen(i, &caps),
                selected: self.selected_slot == Some(i),
                video_url: video_url(s.platform, &s.channel, &opts),
                chat_url: chat_url(s.platform, &s.channel, &opts),
            })
            .collect();

        // Pop-outs are kept across a lapsed trial but only drawn while the
        // tier allows them.
        let popouts: &[ChatWindow] = if caps.pop_out_chat { self.chats.windows() } else { &[] };
        let chats = popouts
            .iter()
            .enumerate()
            .map(|(i, w)| ChatView {
                index: i,
                channel: w.channel.clone(),
                platform: w.platform,
                position: w.position,
                size: w.size,
                url: w.embed_url(&opts),
            })
            .collect();

        let browse = Platform::ALL
            .into_iter()
            .filter(|p| self.auth.is_signed_in(*p))
            .map(|p| BrowseGroup {
                platform: p,
                placeholder: p.placeholder(),
                channels: self.slots.available_channels(p),
            })
            .collect();

        DashboardView {
            tier: self.entitlement.tier(),
            trial_seconds_remaining: self.entitlement.trial_seconds_remaining(),
            trial_ended: self.entitlement.trial_ended(),
            trial_available: self.entitlement.trial_available(),
            capabilities: caps,
            layout: self.layout,
            selected_slot: self.selected_slot,
            preferences: Preferences {
                dark_mode,
                theme,
                ..self.prefs
            },
            theme_hex: theme.hex(),
            auth: self.auth,
            slots,
            chats,
            browse,
            onboarding: OnboardingView {
                active: self.onboarding.is_active(),
                step: self.onboarding.step(),
                platform: self.onboarding.platform(),
            },
            plans_open: self.plans_open,
            notice: self.notice.clone(),
            pending_checkout: self.pending_checkout.clone(),
            interacting: self.is_interacting(),
        }
    }
}

impl Default for DashboardSession {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotView {
    pub id: SlotId,
    /// 1-based on-screen number.
    pub number: usize,
    pub channel: String,
    pub platform: Platform,
    pub size: StreamSize,
    pub placement: Placement,
    pub frozen: bool,
    pub selected: bool,
    pub video_url: String,
    pub chat_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatView {
    pub index: usize,
    pub channel: String,
    pub platform: Platform,
    pub position: Point,
    pub size: Size,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrowseGroup {
    pub platform: Platform,
    pub placeholder: &'static str,
    pub channels: Vec<&'static CatalogEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnboardingView {
    pub active: bool,
    pub step: OnboardingStep,
    pub platform: Option<Platform>,
}

/// Render snapshot of a session.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub tier: Tier,
    pub trial_seconds_remaining: Option<u32>,
    pub trial_ended: bool,
    pub trial_available: bool,
    pub capabilities: Capabilities,
    pub layout: LayoutMode,
    pub selected_slot: Option<usize>,
    pub preferences: Preferences,
    pub theme_hex: &'static str,
    pub auth: AuthState,
    pub slots: Vec<SlotView>,
    pub chats: Vec<ChatView>,
    pub browse: Vec<BrowseGroup>,
    pub onboarding: OnboardingView,
    pub plans_open: bool,
    pub notice: Option<String>,
    pub pending_checkout: Option<PendingCheckout>,
    pub interacting: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Frame;

    fn session() -> DashboardSession {
        DashboardSession::new(SessionOptions {
            onboarding_completed: true,
            ..SessionOptions::default()
        })
    }

    fn premium_session() -> DashboardSession {
        let mut s = session();
        s.checkout_succeeded(Plan::Monthly);
        s
    }

    fn add(channel: &str, platform: Platform) -> Action {
        Action::AddSlot {
            channel: channel.to_string(),
            platform,
        }
    }

    fn channels(s: &DashboardSession) -> Vec<String> {
        s.slots().slots().iter().map(|x| x.channel.clone()).collect()
    }

    #[test]
    fn test_new_session_has_two_default_slots() {
        let s = session();
        assert_eq!(channels(&s), ["xqc", "shroud"]);
        assert_eq!(s.entitlement().tier(), Tier::Free);
        assert_eq!(s.layout(), LayoutMode::Grid);
    }

    #[test]
    fn test_free_add_slot_is_noop() {
        let mut s = session();
        let t = s.apply(add("chanC", Platform::Kick));
        assert!(!t.changed);
        assert_eq!(s.slots().len(), 2);
    }

    #[test]
    fn test_premium_add_slot_appends() {
        let mut s = session();
        s.apply(Action::StartTrial);
        s.apply(Action::RemoveSlot { index: 3 });
        s.apply(Action::RemoveSlot { index: 2 });
        assert!(s.apply(add("chanC", Platform::Kick)).changed);
        assert_eq!(s.slots().len(), 3);
        let last = s.slots().slots().last().unwrap();
        assert_eq!((last.channel.as_str(), last.platform), ("chanC", Platform::Kick));
    }

    #[test]
    fn test_remove_slot_gated_and_shifts() {
        let mut s = session();
        assert!(!s.apply(Action::RemoveSlot { index: 0 }).changed);
        assert_eq!(s.slots().len(), 2);

        let mut p = premium_session();
        assert!(p.apply(Action::RemoveSlot { index: 0 }).changed);
        assert_eq!(channels(&p)[0], "shroud");
        assert_eq!(p.slots().len(), 5);
    }

    #[test]
    fn test_chat_drag_scenario() {
        let mut s = premium_session();
        s.apply(Action::OpenChat {
            channel: "xqc".into(),
            platform: Platform::Twitch,
        });
        assert_eq!(s.chats().windows()[0].position, Point::new(100.0, 100.0));
        s.apply(Action::DragChat {
            index: 0,
            pointer: Point::new(120.0, 130.0),
        });
        s.apply(Action::PointerMove {
            pointer: Point::new(200.0, 250.0),
        });
        assert_eq!(s.chats().windows()[0].position, Point::new(180.0, 220.0));
        assert!(s.apply(Action::PointerUp).changed);
        assert!(!s.is_interacting());
    }

    #[test]
    fn test_trial_expires_exactly_once_after_full_countdown() {
        let mut s = session();
        assert_eq!(
            s.apply(Action::StartTrial).effects,
            vec![Effect::StartTrialTimer]
        );
        let mut expirations = 0;
        for i in 1..=900 {
            match s.tick() {
                TickOutcome::Expired => {
                    expirations += 1;
                    assert_eq!(i, 900);
                }
                TickOutcome::Counting(_) => assert_eq!(s.entitlement().tier(), Tier::TrialPremium),
                TickOutcome::Idle => panic!("idle during trial at tick {}", i),
            }
        }
        assert_eq!(expirations, 1);
        assert_eq!(s.entitlement().tier(), Tier::Free);
        assert!(s.plans_open());
        assert_eq!(s.tick(), TickOutcome::Idle);
    }

    #[test]
    fn test_trial_populates_four_defaults() {
        let mut s = session();
        s.apply(Action::StartTrial);
        assert_eq!(channels(&s), ["xqc", "shroud", "pokimane", "summit1g"]);
    }

    #[test]
    fn test_trial_cannot_restart() {
        let mut s = DashboardSession::new(SessionOptions {
            trial_secs: 1,
            onboarding_completed: true,
            ..SessionOptions::default()
        });
        s.apply(Action::StartTrial);
        s.tick();
        assert!(!s.apply(Action::StartTrial).changed);
    }

    #[test]
    fn test_expired_trial_freezes_extra_slots() {
        let mut s = DashboardSession::new(SessionOptions {
            trial_secs: 1,
            onboarding_completed: true,
            ..SessionOptions::default()
        });
        s.apply(Action::StartTrial);
        s.tick();
        assert_eq!(s.slots().len(), 4);
        let v = s.view("localhost");
        let frozen: Vec<bool> = v.slots.iter().map(|x| x.frozen).collect();
        assert_eq!(frozen, [false, false, true, true]);

        let third = s.slots().slots()[2].id;
        assert!(!s
            .apply(Action::ChangeChannel {
                slot: third,
                channel: "ninja".into()
            })
            .changed);
        // Slots under the cap remain editable.
        let first = s.slots().slots()[0].id;
        assert!(s
            .apply(Action::ChangeChannel {
                slot: first,
                channel: "ninja".into()
            })
            .changed);
    }

    #[test]
    fn test_checkout_success_stops_trial_timer() {
        let mut s = session();
        s.apply(Action::StartTrial);
        let t = s.checkout_succeeded(Plan::Yearly);
        assert_eq!(t.effects, vec![Effect::StopTrialTimer]);
        assert_eq!(s.entitlement().tier(), Tier::Premium);
        assert_eq!(s.slots().len(), MAX_SLOTS);
        assert!(s.notice().is_some());
        assert!(!s.checkout_succeeded(Plan::Yearly).changed);
    }

    #[test]
    fn test_checkout_failure_sets_notice_only() {
        let mut s = session();
        s.checkout_failed(Plan::Monthly, &CheckoutError::NotConfigured);
        assert_eq!(s.entitlement().tier(), Tier::Free);
        assert!(s.notice().unwrap().contains("monthly"));
        assert!(s.apply(Action::DismissNotice).changed);
        assert!(s.notice().is_none());
    }

    #[test]
    fn test_select_then_assign() {
        let mut s = session();
        assert!(s.apply(Action::SelectSlot { index: 1 }).changed);
        assert_eq!(s.selected_slot(), Some(1));
        s.apply(Action::AssignStreamer {
            channel: "destiny".into(),
            platform: Platform::Kick,
        });
        assert_eq!(s.selected_slot(), None);
        let slot = &s.slots().slots()[1];
        assert_eq!((slot.channel.as_str(), slot.platform), ("destiny", Platform::Kick));
    }

    #[test]
    fn test_select_same_slot_toggles_off() {
        let mut s = session();
        s.apply(Action::SelectSlot { index: 0 });
        s.apply(Action::SelectSlot { index: 0 });
        assert_eq!(s.selected_slot(), None);
    }

    #[test]
    fn test_select_beyond_free_cap_refused() {
        let mut s = session();
        assert!(!s.apply(Action::SelectSlot { index: 2 }).changed);
        assert_eq!(s.selected_slot(), None);
    }

    #[test]
    fn test_assign_without_selection_is_noop() {
        let mut s = session();
        let t = s.apply(Action::AssignStreamer {
            channel: "x".into(),
            platform: Platform::Twitch,
        });
        assert!(!t.changed);
        assert_eq!(channels(&s), ["xqc", "shroud"]);
    }

    #[test]
    fn test_remove_adjusts_selection() {
        let mut s = premium_session();
        s.apply(Action::SelectSlot { index: 3 });
        s.apply(Action::RemoveSlot { index: 1 });
        assert_eq!(s.selected_slot(), Some(2));
        s.apply(Action::RemoveSlot { index: 2 });
        assert_eq!(s.selected_slot(), None);
    }

    #[test]
    fn test_slot_drag_requires_freeform() {
        let mut s = premium_session();
        let drag = Action::DragSlot {
            index: 0,
            pointer: Point::new(10.0, 10.0),
        };
        assert!(!s.apply(drag.clone()).changed);
        s.apply(Action::CycleLayout);
        assert_eq!(s.layout(), LayoutMode::Freeform);
        assert!(s.apply(drag).changed);
        s.apply(Action::PointerMove {
            pointer: Point::new(60.0, 30.0),
        });
        assert_eq!(s.slots().slots()[0].frame.origin, Point::new(50.0, 20.0));
    }

    #[test]
    fn test_slot_drag_refused_for_free_tier() {
        let mut s = session();
        s.apply(Action::SetLayout {
            mode: LayoutMode::Freeform,
        });
        assert!(!s
            .apply(Action::DragSlot {
                index: 0,
                pointer: Point::default()
            })
            .changed);
    }

    #[test]
    fn test_slot_resize_respects_slot_minimum() {
        let mut s = premium_session();
        s.apply(Action::SetLayout {
            mode: LayoutMode::Freeform,
        });
        s.apply(Action::ResizeSlot {
            index: 0,
            corner: Corner::Se,
            pointer: Point::new(600.0, 400.0),
        });
        s.apply(Action::PointerMove {
            pointer: Point::new(-5000.0, -5000.0),
        });
        assert_eq!(s.slots().slots()[0].frame, Frame::new(0.0, 0.0, 300.0, 200.0));
    }

    #[test]
    fn test_chat_resize_respects_chat_minimum() {
        let mut s = premium_session();
        s.apply(Action::OpenChat {
            channel: "a".into(),
            platform: Platform::Twitch,
        });
        s.apply(Action::ResizeChat {
            index: 0,
            corner: Corner::Se,
            pointer: Point::new(500.0, 600.0),
        });
        s.apply(Action::PointerMove {
            pointer: Point::new(0.0, 0.0),
        });
        assert_eq!(s.chats().windows()[0].size, Size::new(300.0, 300.0));
    }

    #[test]
    fn test_closing_chat_mid_drag_cancels_gesture() {
        let mut s = premium_session();
        s.apply(Action::OpenChat {
            channel: "a".into(),
            platform: Platform::Twitch,
        });
        s.apply(Action::DragChat {
            index: 0,
            pointer: Point::default(),
        });
        s.apply(Action::CloseChat { index: 0 });
        assert!(!s.is_interacting());
        assert!(!s
            .apply(Action::PointerMove {
                pointer: Point::new(5.0, 5.0)
            })
            .changed);
    }

    #[test]
    fn test_open_chat_requires_premium() {
        let mut s = session();
        assert!(!s
            .apply(Action::OpenChat {
                channel: "xqc".into(),
                platform: Platform::Twitch
            })
            .changed);
        assert!(s.chats().is_empty());
    }

    #[test]
    fn test_dark_mode_and_theme_gated() {
        let mut s = session();
        assert!(!s.apply(Action::ToggleDarkMode).changed);
        assert!(!s.apply(Action::SetTheme { color: ThemeColor::Red }).changed);

        let mut p = premium_session();
        assert!(p.apply(Action::ToggleDarkMode).changed);
        assert!(p.apply(Action::SetTheme { color: ThemeColor::Red }).changed);
        let v = p.view("h");
        assert!(v.preferences.dark_mode);
        assert_eq!(v.theme_hex, "#dc2626");
    }

    #[test]
    fn test_dark_mode_lapses_with_trial() {
        let mut s = DashboardSession::new(SessionOptions {
            trial_secs: 1,
            onboarding_completed: true,
            ..SessionOptions::default()
        });
        s.apply(Action::StartTrial);
        s.apply(Action::ToggleDarkMode);
        assert!(s.view("h").preferences.dark_mode);
        s.tick();
        assert!(!s.view("h").preferences.dark_mode);
        // Turning it off is always allowed.
        assert!(s.apply(Action::ToggleDarkMode).changed);
    }

    #[test]
    fn test_view_resolves_embed_urls() {
        let mut s = session();
        s.apply(Action::ToggleMute);
        let v = s.view("watch.example.com:8888");
        assert_eq!(
            v.slots[0].video_url,
            "https://player.twitch.tv/?channel=xqc&parent=watch.example.com&muted=true"
        );
        assert_eq!(v.slots[1].number, 2);
    }

    #[test]
    fn test_view_placement_follows_layout() {
        let mut s = session();
        assert!(matches!(s.view("h").slots[0].placement, Placement::Grid { span: 2 }));
        s.apply(Action::SetLayout {
            mode: LayoutMode::TopBottom,
        });
        assert!(matches!(s.view("h").slots[0].placement, Placement::TopBottom { .. }));
    }

    #[test]
    fn test_browse_list_follows_auth() {
        let mut s = session();
        let platforms: Vec<Platform> = s.view("h").browse.iter().map(|g| g.platform).collect();
        assert_eq!(platforms, [Platform::Twitch]);
        s.apply(Action::SetAuth {
            platform: Platform::Kick,
            signed_in: true,
        });
        let v = s.view("h");
        assert_eq!(v.browse.len(), 2);
        assert_eq!(v.browse[0].channels.len(), 8);
    }

    #[test]
    fn test_onboarding_complete_seeds_and_persists() {
        let mut s = DashboardSession::new(SessionOptions::default());
        assert!(s.view("h").onboarding.active);
        s.apply(Action::OnboardingPlatform {
            platform: Platform::Kick,
        });
        let t = s.apply(Action::OnboardingComplete {
            channels: vec!["destiny".into(), "".into()],
        });
        assert_eq!(t.effects, vec![Effect::PersistOnboarding]);
        assert_eq!(channels(&s), ["destiny"]);
        assert!(!s.onboarding().is_active());
    }

    #[test]
    fn test_onboarding_complete_with_no_names_keeps_defaults() {
        let mut s = DashboardSession::new(SessionOptions::default());
        s.apply(Action::OnboardingPlatform {
            platform: Platform::Twitch,
        });
        let t = s.apply(Action::OnboardingComplete {
            channels: vec!["  ".into()],
        });
        assert_eq!(t.effects, vec![Effect::PersistOnboarding]);
        assert_eq!(channels(&s), ["xqc", "shroud"]);
    }

    #[test]
    fn test_onboarding_skip_persists_once() {
        let mut s = DashboardSession::new(SessionOptions::default());
        assert_eq!(s.apply(Action::OnboardingSkip).effects, vec![Effect::PersistOnboarding]);
        assert!(s.apply(Action::OnboardingSkip).effects.is_empty());
        assert_eq!(channels(&s), ["xqc", "shroud"]);
    }

    #[test]
    fn test_action_json_shape() {
        let a: Action = serde_json::from_str(
            r#"{"type":"resize_chat","index":0,"pointer":{"x":1.0,"y":2.0}}"#,
        )
        .unwrap();
        assert_eq!(
            a,
            Action::ResizeChat {
                index: 0,
                corner: Corner::Se,
                pointer: Point::new(1.0, 2.0)
            }
        );
        let b: Action = serde_json::from_str(r#"{"type":"change_channel","slot":1,"channel":"x"}"#).unwrap();
        assert!(matches!(b, Action::ChangeChannel { .. }));
    }

    #[test]
    fn test_plans_dialog() {
        let mut s = session();
        assert!(s.apply(Action::OpenPlans).changed);
        assert!(s.plans_open());
        assert!(s.apply(Action::ClosePlans).changed);
        let mut p = premium_session();
        assert!(!p.apply(Action::OpenPlans).changed);
    }

    fn redirect(id: &str) -> CheckoutRedirect {
        CheckoutRedirect {
            session_id: id.to_string(),
            url: Some(format!("https://pay.example/{}", id)),
        }
    }

    #[test]
    fn test_checkout_redirect_alone_does_not_upgrade() {
        let mut s = session();
        assert!(s.checkout_started(Plan::Monthly, &redirect("cs_1")).changed);
        assert_eq!(s.entitlement().tier(), Tier::Free);
        assert_eq!(s.slots().len(), 2);
        let v = s.view("h");
        assert_eq!(v.pending_checkout.unwrap().session_id, "cs_1");
        assert_eq!(v.capabilities.max_slots, 2);
    }

    #[test]
    fn test_checkout_confirmation_upgrades_matching_session_only() {
        let mut s = session();
        s.checkout_started(Plan::Quarterly, &redirect("cs_1"));
        assert!(!s.checkout_confirmed("cs_other").changed);
        assert_eq!(s.entitlement().tier(), Tier::Free);
        assert!(s.pending_checkout().is_some());

        let t = s.checkout_confirmed("cs_1");
        assert_eq!(t.effects, vec![Effect::StopTrialTimer]);
        assert_eq!(s.entitlement().tier(), Tier::Premium);
        assert!(s.pending_checkout().is_none());
        assert_eq!(s.slots().len(), MAX_SLOTS);
    }

    #[test]
    fn test_unpaid_checkout_stays_pending() {
        let mut s = session();
        s.checkout_started(Plan::Yearly, &redirect("cs_2"));
        s.checkout_unpaid(Plan::Yearly);
        assert_eq!(s.entitlement().tier(), Tier::Free);
        assert!(s.notice().unwrap().contains("not been completed"));
        assert!(s.checkout_confirmed("cs_2").changed);
        assert_eq!(s.entitlement().tier(), Tier::Premium);
    }

    #[test]
    fn test_confirmation_without_pending_checkout_is_ignored() {
        let mut s = session();
        assert!(!s.checkout_confirmed("cs_1").changed);
        assert_eq!(s.entitlement().tier(), Tier::Free);
    }

    #[test]
    fn test_chat_popouts_go_dormant_when_trial_lapses() {
        let mut s = DashboardSession::new(SessionOptions {
            trial_secs: 1,
            onboarding_completed: true,
            ..SessionOptions::default()
        });
        s.apply(Action::StartTrial);
        s.apply(Action::OpenChat {
            channel: "xqc".into(),
            platform: Platform::Twitch,
        });
        s.apply(Action::DragChat {
            index: 0,
            pointer: Point::new(110.0, 110.0),
        });
        assert_eq!(s.view("h").chats.len(), 1);

        s.tick();
        assert!(!s.is_interacting());
        assert!(s.view("h").chats.is_empty());
        assert!(!s
            .apply(Action::DragChat {
                index: 0,
                pointer: Point::new(110.0, 110.0)
            })
            .changed);
        assert!(!s
            .apply(Action::ResizeChat {
                index: 0,
                corner: Corner::Se,
                pointer: Point::new(500.0, 600.0)
            })
            .changed);
        assert!(!s
            .apply(Action::PointerMove {
                pointer: Point::new(900.0, 900.0)
            })
            .changed);
        assert_eq!(s.chats().windows()[0].position, Point::new(100.0, 100.0));

        // Upgrading brings the same window back.
        s.checkout_succeeded(Plan::Monthly);
        assert_eq!(s.view("h").chats.len(), 1);
    }

    #[test]
    fn test_huge_slot_resize_does_not_stall_add_slot() {
        let mut s = premium_session();
        s.apply(Action::SetLayout {
            mode: LayoutMode::Freeform,
        });
        s.apply(Action::ResizeSlot {
            index: 0,
            corner: Corner::Se,
            pointer: Point::new(600.0, 400.0),
        });
        s.apply(Action::PointerMove {
            pointer: Point::new(1e300, 1e300),
        });
        s.apply(Action::PointerUp);
        let f = s.slots().slots()[0].frame;
        assert!(f.size.width.is_finite() && f.size.height.is_finite());

        s.apply(Action::RemoveSlot { index: 5 });
        assert!(s.apply(add("late", Platform::Kick)).changed);
        assert_eq!(s.slots().len(), MAX_SLOTS);
        let json = serde_json::to_value(s.view("h")).unwrap();
        assert!(json["slots"][0]["placement"]["frame"]["size"]["width"].is_number());
    }
}
