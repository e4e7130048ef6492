//! Handlers bundled with the binary, referenced by the manifests in `commands/`.

mod choose;
mod coinflip;
mod help;
mod ping;
mod roll;
mod uptime;

pub use choose::{ChooseHandler, parse_choices};
pub use coinflip::CoinflipHandler;
pub use help::HelpHandler;
pub use ping::PingHandler;
pub use roll::{DEFAULT_SIDES, RollHandler};
pub use uptime::{UptimeHandler, format_duration};

use crate::HandlerCatalog;
use std::sync::Arc;

/// Add every bundled handler to `catalog` under its command name.
pub fn register(catalog: &mut HandlerCatalog) {
    catalog.insert("ping", Arc::new(PingHandler));
    catalog.insert("coinflip", Arc::new(CoinflipHandler));
    catalog.insert("roll", Arc::new(RollHandler));
    catalog.insert("choose", Arc::new(ChooseHandler));
    catalog.insert("uptime", Arc::new(UptimeHandler));
    catalog.insert("help", Arc::new(HelpHandler));
}
