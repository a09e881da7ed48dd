mod error;
mod id;
mod instance;
mod paths;
mod schema;

pub use error::InstanceError;
pub use id::{instance_label, InstanceId, LABEL_KEY};
pub use instance::{read_metadata, Instance};
pub use paths::{
    cache_root, devcontainer_dir, metadata_path, workspace_dir, APP_DIR, DEVCONTAINER_DIR,
    METADATA_FILE,
};
pub use schema::InstanceMetadata;
