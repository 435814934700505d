mod deploy;
mod package;
mod pipeline;
mod plan;
mod run;

pub use deploy::deploy;
pub use package::package;
pub use plan::plan;
pub use run::run;
