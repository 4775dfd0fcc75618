mod command;
mod http;
mod output;
mod retry;
mod scripted;
mod settings;
mod spawner;
mod traits;

pub use command::CommandOracle;
pub use http::HttpOracle;
pub use output::Completion;
pub use retry::RetryingOracle;
pub use scripted::{ScriptedCall, ScriptedOracle};
pub use settings::{create_oracle, OracleSettings};
pub use spawner::{ProcessOutput, ProcessSpawner};
pub use traits::{GenerationParams, Oracle, OracleError, OracleKind};
