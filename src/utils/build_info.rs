/// Build metadata embedded by `build.rs`.
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_status: &'static str,
    pub timestamp: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

pub const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn current() -> BuildInfo {
    BuildInfo {
        version: PACKAGE_VERSION,
        git_hash: option_env!("MAPOCKET_BUILD_HASH").unwrap_or("unknown"),
        git_status: option_env!("MAPOCKET_BUILD_STATUS").unwrap_or("unknown"),
        timestamp: option_env!("MAPOCKET_BUILD_TIMESTAMP").unwrap_or("unknown"),
        target: option_env!("MAPOCKET_BUILD_TARGET").unwrap_or("unknown"),
        profile: option_env!("MAPOCKET_BUILD_PROFILE").unwrap_or("unknown"),
        rustc: option_env!("MAPOCKET_BUILD_RUSTC").unwrap_or("unknown"),
    }
}

impl BuildInfo {
    /// `0.1.0 (abc1234, clean)`
    pub fn short(&self) -> String {
        format!("{} ({}, {})", self.version, self.git_hash, self.git_status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_form_starts_with_version() {
        let info = current();
        assert!(info.short().starts_with(PACKAGE_VERSION));
    }
}
