//! Progress reporting for translate-and-run requests

pub mod reporter;
