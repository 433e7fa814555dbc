mod gate;

pub use gate::{BootstrapGate, BootstrapState, GateView, InitPhase, Initializer};
