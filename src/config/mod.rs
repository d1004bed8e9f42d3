/// Store connection and table creation
pub mod database;

/// Form-to-feature access map loading from forms.toml
pub mod forms;

pub use forms::{FeatureRef, FormAccess, FormAccessMap};
