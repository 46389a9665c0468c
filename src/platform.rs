//! Streaming platforms, embed URL templates and the preset channel catalog.
//!
//! Embeds are opaque: a channel identifier goes into a URL template and the
//! third-party player reports unknown channels on its own. Nothing here
//! touches the network.

use clap::ValueEnum;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitch,
    Kick,
    Youtube,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Twitch, Platform::Kick, Platform::Youtube];

    /// Hint shown in the channel input for this platform.
    pub fn placeholder(&self) -> &'static str {
        match self {
            Platform::Twitch => "Enter Twitch username...",
            Platform::Kick => "Enter Kick username...",
            Platform::Youtube => "Enter YouTube channel/video ID...",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Twitch => write!(f, "twitch"),
            Platform::Kick => write!(f, "kick"),
            Platform::Youtube => write!(f, "youtube"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "twitch" => Ok(Platform::Twitch),
            "kick" => Ok(Platform::Kick),
            "youtube" => Ok(Platform::Youtube),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// Embed URL resolution
// ---------------------------------------------------------------------------

/// Render-time inputs for embed URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedOptions {
    /// Hostname of the page embedding the player. Twitch and YouTube refuse
    /// to render without it.
    pub parent_host: String,
    pub muted: bool,
    pub dark_mode: bool,
}

impl EmbedOptions {
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            parent_host: host.into(),
            ..Self::default()
        }
    }

    fn parent(&self) -> String {
        // Strip any port: embed parents are bare hostnames.
        let host = self.parent_host.split(':').next().unwrap_or("").trim();
        if host.is_empty() {
            "localhost".to_string()
        } else {
            encode_component(host)
        }
    }
}

/// Video player URL for `channel` on `platform`.
pub fn video_url(platform: Platform, channel: &str, opts: &EmbedOptions) -> String {
    let c = encode_component(channel);
    match platform {
        Platform::Twitch => format!(
            "https://player.twitch.tv/?channel={}&parent={}&muted={}",
            c,
            opts.parent(),
            opts.muted
        ),
        Platform::Kick => format!("https://player.kick.com/{}", c),
        Platform::Youtube => format!(
            "https://www.youtube.com/embed/live_stream?channel={}&autoplay=1&mute={}",
            c,
            if opts.muted { 1 } else { 0 }
        ),
    }
}

/// Chat embed URL for `channel` on `platform`.
pub fn chat_url(platform: Platform, channel: &str, opts: &EmbedOptions) -> String {
    let c = encode_component(channel);
    match platform {
        Platform::Twitch => format!(
            "https://www.twitch.tv/embed/{}/chat?parent={}{}",
            c,
            opts.parent(),
            if opts.dark_mode { "&darkpopout" } else { "" }
        ),
        Platform::Kick => format!("https://kick.com/{}/chatroom", c),
        Platform::Youtube => format!(
            "https://www.youtube.com/live_chat?v={}&embed_domain={}",
            c,
            opts.parent()
        ),
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Preset catalog
// ---------------------------------------------------------------------------

/// One entry of the browsing list of candidate channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub platform: Platform,
    /// Identifier that goes into the embed URL.
    pub channel: &'static str,
    pub display_name: &'static str,
    pub viewers: &'static str,
}

const fn entry(
    platform: Platform,
    channel: &'static str,
    display_name: &'static str,
    viewers: &'static str,
) -> CatalogEntry {
    CatalogEntry {
        platform,
        channel,
        display_name,
        viewers,
    }
}

static CATALOG: Lazy<Vec<CatalogEntry>> = Lazy::new(|| {
    use Platform::*;
    vec![
        entry(Twitch, "xqc", "xQc", "78K"),
        entry(Twitch, "shroud", "shroud", "32K"),
        entry(Twitch, "pokimane", "Pokimane", "25K"),
        entry(Twitch, "summit1g", "summit1g", "28K"),
        entry(Twitch, "lirik", "LIRIK", "22K"),
        entry(Twitch, "timthetatman", "TimTheTatman", "41K"),
        entry(Twitch, "ninja", "Ninja", "45K"),
        entry(Twitch, "tfue", "Tfue", "18K"),
        entry(Twitch, "sodapoppin", "Sodapoppin", "15K"),
        entry(Twitch, "asmongold", "Asmongold", "52K"),
        entry(Kick, "trainwreckstv", "Trainwreckstv", "42K"),
        entry(Kick, "adin_ross", "Adin Ross", "38K"),
        entry(Kick, "xposed", "xPosed", "15K"),
        entry(Kick, "jasontheween", "JasonTheWeen", "12K"),
        entry(Kick, "destiny", "Destiny", "18K"),
        entry(Kick, "gmhikaru", "GMHikaru", "22K"),
        entry(Kick, "ice_poseidon", "Ice Poseidon", "28K"),
        entry(Kick, "suspendas", "Suspendas", "9K"),
        entry(Youtube, "UCX6OQ3DkcsbYNE6H8uQQuVA", "MrBeast Gaming", "125K"),
        entry(Youtube, "UC-lHJZR3Gqxm24_Vd_AJ5Yw", "PewDiePie", "89K"),
        entry(Youtube, "UCq-Fj5jknLsUf-MWSy4_brA", "T-Series", "156K"),
        entry(Youtube, "UCbCmjCuTUZos6Inko4u57UQ", "Cocomelon", "98K"),
        entry(Youtube, "UCYfdidRxbB8Qhf0Nx7ioOYw", "News Live", "45K"),
        entry(Youtube, "UCpEhnqL0y41EpW2TvWAHD7Q", "Lofi Girl", "67K"),
    ]
});

/// Catalog entries for one platform, in display order.
pub fn catalog(platform: Platform) -> impl Iterator<Item = &'static CatalogEntry> {
    CATALOG.iter().filter(move |e| e.platform == platform)
}
