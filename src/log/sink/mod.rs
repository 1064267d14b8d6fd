mod console_sink;
mod memory_sink;
mod noop_sink;
mod record;
mod registry;
mod track_timer;
mod trait_;

pub use console_sink::{ConsoleProvider, ConsoleProviderConfig, ConsoleSink, Target};
pub use memory_sink::{
    MemoryBuffer, MemoryProvider, MemoryProviderConfig, MemorySink, Telemetry, TelemetryRecord,
};
pub use noop_sink::{NoopProvider, NoopProviderConfig, NoopSink};
pub use record::{EventInfo, PageViewInfo};
pub use registry::{create_provider_from_options, register_providers};
pub use track_timer::TrackTimer;
pub use trait_::{LoggerProvider, LoggingSink};
