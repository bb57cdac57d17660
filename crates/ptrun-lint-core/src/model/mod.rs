pub mod checksum;
pub mod github;
pub mod metadata;

pub use checksum::Checksum;
pub use github::{Asset, License, Readme, Release, Repository, User};
pub use metadata::Metadata;
