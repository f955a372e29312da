// External collaborators: identity and rendering

pub mod identity;
pub mod render;

// Re-export client types
pub use identity::{IdentityProvider, WalletIdentityProvider};
pub use render::{
    DashboardFrame, JsonLinesSink, Notice, NoticeLevel, Recording, RecordingSink, RenderMode,
    RenderSink, TracingRenderSink,
};
