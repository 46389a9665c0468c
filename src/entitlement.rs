//! Free / premium / trial status and the capabilities each one grants.
//!
//! Transitions:
//!
//! ```text
//! Free ──start_trial──▶ TrialPremium ──countdown hits 0──▶ Free
//!   │                        │
//!   └──────upgrade───────────┴──────────▶ Premium
//! ```
//!
//! There is no way back from `Premium`.

use serde::{Deserialize, Serialize};

/// Slots a free viewer may have.
pub const FREE_SLOT_CAP: usize = 2;
/// Hard ceiling on slots for every tier.
pub const MAX_SLOTS: usize = 6;
/// Length of the free trial.
pub const DEFAULT_TRIAL_SECS: u32 = 900;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    #[default]
    Free,
    Premium,
    TrialPremium,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Premium => write!(f, "premium"),
            Tier::TrialPremium => write!(f, "trial-premium"),
        }
    }
}

/// Affordances unlocked by the current tier. Pure function of [`Entitlement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub max_slots: usize,
    pub arrange: bool,
    pub remove: bool,
    pub pop_out_chat: bool,
    pub switch_platform: bool,
    pub cycle_size: bool,
    pub dark_mode: bool,
    pub theme_colors: bool,
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No trial is running.
    Idle,
    /// Seconds left after this tick.
    Counting(u32),
    /// This tick ended the trial; the tier is now `Free`.
    Expired,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Entitlement {
    tier: Tier,
    trial_seconds_remaining: Option<u32>,
    /// Set when a trial runs out; cleared when the viewer dismisses the prompt.
    trial_ended: bool,
    trial_used: bool,
}

impl Entitlement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn premium() -> Self {
        Self {
            tier: Tier::Premium,
            ..Self::default()
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn is_premium(&self) -> bool {
        self.tier != Tier::Free
    }

    pub fn trial_seconds_remaining(&self) -> Option<u32> {
        self.trial_seconds_remaining
    }

    pub fn trial_ended(&self) -> bool {
        self.trial_ended
    }

    /// Whether the free trial can still be started this session.
    pub fn trial_available(&self) -> bool {
        self.tier == Tier::Free && !self.trial_used
    }

    pub fn capabilities(&self) -> Capabilities {
        let premium = self.is_premium();
        Capabilities {
            max_slots: if premium { MAX_SLOTS } else { FREE_SLOT_CAP },
            arrange: premium,
            remove: premium,
            pop_out_chat: premium,
            switch_platform: premium,
            cycle_size: premium,
            dark_mode: premium,
            theme_colors: premium,
        }
    }

    /// `Free → TrialPremium`. Returns false when a trial is not available.
    pub fn start_trial(&mut self, duration_secs: u32) -> bool {
        if !self.trial_available() || duration_secs == 0 {
            return false;
        }
        self.tier = Tier::TrialPremium;
        self.trial_seconds_remaining = Some(duration_secs);
        self.trial_used = true;
        self.trial_ended = false;
        true
    }

    /// `Free | TrialPremium → Premium`. Cancels any running countdown.
    /// Returns false when already premium.
    pub fn upgrade(&mut self) -> bool {
        if self.tier == Tier::Premium {
            return false;
        }
        self.tier = Tier::Premium;
        self.trial_seconds_remaining = None;
        self.trial_ended = false;
        true
    }

    /// Advance the trial countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(remaining) = self.trial_seconds_remaining else {
            return TickOutcome::Idle;
        };
        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            self.trial_seconds_remaining = Some(remaining);
            return TickOutcome::Counting(remaining);
        }
        self.trial_seconds_remaining = None;
        self.tier = Tier::Free;
        self.trial_ended = true;
        TickOutcome::Expired
    }

    pub fn dismiss_trial_prompt(&mut self) {
        self.trial_ended = false;
    }
}
