#![no_std]

extern crate alloc;

pub mod animation;
pub mod animator;
pub mod channel;
pub mod effect;
pub mod effect_stack;
pub mod error;
pub mod lookup_table;
pub mod transfer;
pub mod virtual_display;

pub use animation::{AlertAnimation, AlertCommand, AlertStage, AlertTimings, Animation, Frame};
pub use animator::{
    AnimationHandle, Animator, AnimatorConfig, ClockStart, DEFAULT_UPDATE_INTERVAL,
    ForeignUpdatePolicy,
};
pub use channel::{AnimationChannels, CancelHandle, EventSender, Outcome, Termination};
pub use effect::{EffectId, EffectSlot};
pub use effect_stack::EffectStack;
pub use error::{AnimationError, DeviceError};
pub use lookup_table::LookupTable;
pub use transfer::{Channel, TransferFn};
pub use virtual_display::VirtualDisplay;

pub use embassy_time::{Duration, Instant};

/// Abstract display trait
///
/// Implement this trait to support different display stacks.
/// The animator is generic over this trait.
pub trait GammaDevice {
    /// Open session with the display
    type Session: GammaSession;

    /// Open a session.
    ///
    /// This may be slow (hundreds of milliseconds on some stacks).
    fn open(&mut self) -> Result<Self::Session, DeviceError>;
}

/// Session with a display, closed on drop
pub trait GammaSession {
    /// Program the lookup tables of every controller with `curve`
    fn set_gamma(&mut self, curve: &TransferFn) -> Result<(), DeviceError>;

    /// Read back the current lookup tables.
    ///
    /// Display stacks don't reliably read back non-primary controllers, so
    /// implementations capture the primary controller only while
    /// [`GammaSession::set_gamma`] writes all of them. Foreign updates that
    /// touch only secondary controllers therefore go unnoticed.
    fn lookup_table(&mut self) -> Result<LookupTable, DeviceError>;
}
