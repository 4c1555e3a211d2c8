//! Listen.moe stream selection.

use std::fmt;

pub const JPOP_URL: &str = "https://listen.moe/opus";
pub const KPOP_URL: &str = "https://listen.moe/kpop/opus";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Station {
    JPop,
    KPop,
}

impl Station {
    /// Maps the `audio_stream` command option to a station.
    ///
    /// `1` is J-Pop and `2` is K-Pop. Anything else falls back to J-Pop.
    pub fn from_selector(selector: i64) -> Self {
        match selector {
            1 => Station::JPop,
            2 => Station::KPop,
            other => {
                log::error!("Bad stream selector {other}, falling back to J-Pop");
                Station::JPop
            }
        }
    }

    pub fn url(self) -> &'static str {
        match self {
            Station::JPop => JPOP_URL,
            Station::KPop => KPOP_URL,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Station::JPop => "J-Pop",
            Station::KPop => "K-Pop",
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
