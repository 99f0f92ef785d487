//! API-facing facade (route constants and transport DTOs).

#[macro_use]
mod macros {
    macro_rules! v1_path {
        ($path:literal) => {
            concat!("/api/v1", $path)
        };
    }
}

pub mod routes;
pub mod types;
