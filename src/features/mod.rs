//! Optional companion features
//!
//! Speech, notifications and proactive re-engagement are host capabilities
//! expressed as ports. Each has a no-op implementation so the chat works
//! without them.

pub mod activity;
pub mod notify;
pub mod proactive;
pub mod speech;

pub use activity::ActivityTracker;
pub use notify::{NoopNotifier, Notification, Notifier, TerminalNotifier};
pub use proactive::{should_reach_out, ProactiveScheduler, PROACTIVE_MESSAGES};
pub use speech::{
    select_voice, NoopRecognizer, NoopSpeech, SpeechRecognizer, SpeechSynthesizer, Voice,
    VoiceParams,
};
