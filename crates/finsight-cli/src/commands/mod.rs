//! Command implementations.

pub mod index;
pub mod rate;
pub mod run;
pub mod runs;
pub mod serve;
pub mod show;

pub use self::index::execute_index;
pub use self::rate::execute_rate;
pub use self::run::execute_run;
pub use self::runs::execute_runs;
pub use self::serve::execute_serve;
pub use self::show::execute_show;
