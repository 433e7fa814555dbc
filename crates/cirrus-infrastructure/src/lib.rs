pub mod config_service;
pub mod http_backend;
pub mod logging;
pub mod paths;
pub mod router;
pub mod socket;
pub mod storage;

pub use config_service::ConfigService;
pub use http_backend::HttpBackend;
pub use logging::init_logging;
pub use paths::CirrusPaths;
pub use router::HistoryRouter;
pub use socket::{decode_socket_frame, pump_frames};
pub use storage::{InMemoryStore, JsonDirStore};
