/// Versioned API route definitions shared by the server and its clients
pub mod v1 {
    pub const ROOT: &str = "/api/v1";
    pub const VERSION: &str = "v1";

    pub mod files {
        pub const COLLECTION: &str = v1_path!("/files");
    }

    pub mod task {
        pub const START: &str = v1_path!("/task/start");
        pub const STOP: &str = v1_path!("/task/stop");
        pub const CONFIGURE: &str = v1_path!("/task/configure");
        pub const STATUS: &str = v1_path!("/task/status");
        pub const SCAN: &str = v1_path!("/task/scan");
    }
}

/// Unversioned paths kept for clients of the first release
pub mod legacy {
    pub const FILES: &str = "/files";
    pub const TASK_START: &str = "/taskStart";
    pub const TASK_STOP: &str = "/taskStop";
    pub const CONFIGURE_TASK: &str = "/configureTask";
}

pub const HEALTH: &str = "/health";

pub mod utils {
    /// Strip the version prefix so a route can be mounted under a nested
    /// router.
    pub fn relative(path: &str) -> &str {
        path.strip_prefix(super::v1::ROOT).unwrap_or(path)
    }
}
