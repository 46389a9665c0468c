//! First-run wizard and the one persisted flag that suppresses it.
//!
//! The wizard asks for a platform, then for up to two channel names, and hands
//! the names back so the session can seed its slots. Whether it ever shows is
//! decided by a boolean kept in a small local key-value file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::DashboardError;
use crate::platform::Platform;

/// Key under which completion (or skip) is recorded.
pub const ONBOARDING_FLAG: &str = "onboarding_completed";
/// Channel names the wizard accepts.
pub const ONBOARDING_MAX_CHANNELS: usize = 2;

// ---------------------------------------------------------------------------
// Flag storage
// ---------------------------------------------------------------------------

/// Local boolean key-value storage.
pub trait FlagStore: Send {
    fn get(&self, key: &str) -> Result<bool, DashboardError>;
    fn set(&mut self, key: &str, value: bool) -> Result<(), DashboardError>;
}

/// Flags in a JSON object on disk, e.g. `{"onboarding_completed": true}`.
/// A missing file reads as all-false.
#[derive(Debug, Clone)]
pub struct FileFlagStore {
    path: PathBuf,
}

impl FileFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, bool>, DashboardError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(DashboardError::io(self.path.display().to_string(), e)),
        }
    }
}

impl FlagStore for FileFlagStore {
    fn get(&self, key: &str) -> Result<bool, DashboardError> {
        Ok(self.load()?.get(key).copied().unwrap_or(false))
    }

    fn set(&mut self, key: &str, value: bool) -> Result<(), DashboardError> {
        let mut flags = self.load()?;
        flags.insert(key.to_string(), value);
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| DashboardError::io(dir.display().to_string(), e))?;
        }
        let text = serde_json::to_string_pretty(&flags)?;
        std::fs::write(&self.path, text)
            .map_err(|e| DashboardError::io(self.path.display().to_string(), e))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryFlagStore {
    flags: BTreeMap<String, bool>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> Result<bool, DashboardError> {
        Ok(self.flags.get(key).copied().unwrap_or(false))
    }

    fn set(&mut self, key: &str, value: bool) -> Result<(), DashboardError> {
        self.flags.insert(key.to_string(), value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnboardingStep {
    PlatformChoice,
    StreamerChoice,
    Done,
}

#[derive(Debug, Clone, Serialize)]
pub struct Onboarding {
    step: OnboardingStep,
    platform: Option<Platform>,
}

impl Onboarding {
    /// `completed` is the persisted flag read at startup.
    pub fn new(completed: bool) -> Self {
        Self {
            step: if completed {
                OnboardingStep::Done
            } else {
                OnboardingStep::PlatformChoice
            },
            platform: None,
        }
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }

    pub fn is_active(&self) -> bool {
        self.step != OnboardingStep::Done
    }

    pub fn choose_platform(&mut self, platform: Platform) -> bool {
        if self.step != OnboardingStep::PlatformChoice {
            return false;
        }
        self.platform = Some(platform);
        self.step = OnboardingStep::StreamerChoice;
        true
    }

    /// Return to the platform step.
    pub fn back(&mut self) -> bool {
        if self.step != OnboardingStep::StreamerChoice {
            return false;
        }
        self.step = OnboardingStep::PlatformChoice;
        true
    }

    /// Finish the wizard with the names typed in. Returns the slots to seed:
    /// the first two non-blank names on the chosen platform. An empty result
    /// means there is nothing to seed and the default slots stay.
    ///
    /// Returns `None` if the wizard was not on the streamer step.
    pub fn complete(&mut self, names: &[String]) -> Option<Vec<(String, Platform)>> {
        if self.step != OnboardingStep::StreamerChoice {
            return None;
        }
        let platform = self.platform.unwrap_or(Platform::Twitch);
        self.step = OnboardingStep::Done;
        Some(
            names
                .iter()
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .take(ONBOARDING_MAX_CHANNELS)
                .map(|n| (n.to_string(), platform))
                .collect(),
        )
    }

    /// Dismiss the wizard without seeding. Returns false if already done.
    pub fn skip(&mut self) -> bool {
        if self.step == OnboardingStep::Done {
            return false;
        }
        self.step = OnboardingStep::Done;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_completed_flag_skips_wizard() {
        assert!(!Onboarding::new(true).is_active());
        assert_eq!(Onboarding::new(false).step(), OnboardingStep::PlatformChoice);
    }

    #[test]
    fn test_wizard_happy_path() {
        let mut w = Onboarding::new(false);
        assert!(w.choose_platform(Platform::Kick));
        assert_eq!(w.step(), OnboardingStep::StreamerChoice);
        let seeds = w.complete(&names(&["destiny", "xposed"])).unwrap();
        assert_eq!(
            seeds,
            vec![
                ("destiny".to_string(), Platform::Kick),
                ("xposed".to_string(), Platform::Kick)
            ]
        );
        assert!(!w.is_active());
    }

    #[test]
    fn test_complete_drops_blank_and_extra_names() {
        let mut w = Onboarding::new(false);
        w.choose_platform(Platform::Twitch);
        let seeds = w.complete(&names(&["  ", " ninja ", "tfue", "lirik"])).unwrap();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].0, "ninja");
    }

    #[test]
    fn test_complete_before_platform_choice_is_rejected() {
        let mut w = Onboarding::new(false);
        assert!(w.complete(&names(&["x"])).is_none());
        assert!(w.is_active());
    }

    #[test]
    fn test_back_returns_to_platform_choice() {
        let mut w = Onboarding::new(false);
        w.choose_platform(Platform::Youtube);
        assert!(w.back());
        assert_eq!(w.step(), OnboardingStep::PlatformChoice);
        assert!(!w.back());
    }

    #[test]
    fn test_skip_from_any_active_step() {
        let mut w = Onboarding::new(false);
        w.choose_platform(Platform::Twitch);
        assert!(w.skip());
        assert!(!w.skip());
    }

    #[test]
    fn test_memory_flag_store_defaults_false() {
        let mut s = MemoryFlagStore::new();
        assert!(!s.get(ONBOARDING_FLAG).unwrap());
        s.set(ONBOARDING_FLAG, true).unwrap();
        assert!(s.get(ONBOARDING_FLAG).unwrap());
    }

    #[test]
    fn test_file_flag_store_missing_file_reads_false() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileFlagStore::new(dir.path().join("flags.json"));
        assert!(!s.get(ONBOARDING_FLAG).unwrap());
    }

    #[test]
    fn test_file_flag_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("flags.json");
        FileFlagStore::new(&path).set(ONBOARDING_FLAG, true).unwrap();
        let reopened = FileFlagStore::new(&path);
        assert!(reopened.get(ONBOARDING_FLAG).unwrap());
        assert!(!reopened.get("other").unwrap());
    }

    #[test]
    fn test_file_flag_store_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(FileFlagStore::new(&path).get(ONBOARDING_FLAG).is_err());
    }
}
