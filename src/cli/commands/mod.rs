mod add;
mod collection;
mod config;
mod ingest;
mod models;
mod query;

pub use add::AddArgs;
pub use collection::CollectionCommand;
pub use config::ConfigCommand;
pub use ingest::IngestArgs;
pub use query::QueryArgs;

pub use add::handle_add;
pub use collection::handle_collection;
pub use config::handle_config;
pub use ingest::handle_ingest;
pub use models::handle_models;
pub use query::handle_query;
