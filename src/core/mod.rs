mod effects;
mod infra;
mod reducer;

pub use effects::{CoreEffect, CoreEffects, PlaythroughDone};
pub use reducer::spawn_app_actor;
