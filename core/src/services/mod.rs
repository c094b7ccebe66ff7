//! Business services

pub mod session;

pub use session::{
    Clock, FixedClock, Lifetime, SessionCleanupConfig, SessionCleanupService, SessionConfig,
    SessionService, SignRequest, SignedToken, SystemClock, TokenCodec, TokenRefreshResult,
};
