pub mod fs;
pub mod references;
