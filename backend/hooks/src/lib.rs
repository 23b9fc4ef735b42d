pub mod api;
pub mod builtin;
pub mod bus;
pub mod debounce;
pub mod performance;
pub mod pipeline;
pub mod registry;
pub mod types;

pub use api::{ApiInterceptor, ApiRequest, ApiResponse, AuthToken, HttpTransport};
pub use builtin::{GlobalErrorHook, InteractionHook, NavigationHook, ResizeHook, VisibilityHook};
pub use bus::EnvBus;
pub use debounce::Debouncer;
pub use performance::{MemoryProbe, MemorySample, NullProbe, PerformanceHook, ProcStatusProbe};
pub use pipeline::{EnvironmentHooks, HookSettings};
pub use registry::{Hook, HookHandle, HookRegistry, attach};
pub use types::{ElementInfo, EnvEvent, FormInfo, NavigationTiming};
