//! Build and version information shared by the admin panel binaries.

pub mod version_info;
