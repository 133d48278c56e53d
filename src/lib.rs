pub mod build;
pub mod descriptor;
pub mod error;
pub mod fs_util;
pub mod layout;
pub mod scan;
pub mod settings;
