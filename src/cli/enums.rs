//! CLI enum types.

use clap::ValueEnum;
use std::sync::Arc;

use crate::camera::fake::FakeHost;
use crate::camera::{default_host, MediaHost};

/// Which media host to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Backend {
    /// Cameras attached to this machine (needs the `native` feature)
    #[default]
    Native,
    /// Built-in simulated cameras streaming a test pattern
    Fake,
}

impl Backend {
    pub fn host(self) -> Arc<dyn MediaHost> {
        match self {
            Backend::Native => default_host(),
            Backend::Fake => Arc::new(FakeHost::demo()),
        }
    }
}
