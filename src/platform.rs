use anyhow::Result;

/// Get platform name
pub fn get_platform_name() -> &'static str {
    #[cfg(target_os = "windows")]
    return "windows";

    #[cfg(target_os = "macos")]
    return "macos";

    #[cfg(target_os = "linux")]
    return "linux";

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    return "unknown";
}

/// Get primary display size
pub fn get_primary_display_size() -> Result<(u32, u32)> {
    #[cfg(target_os = "linux")]
    {
        linux_display_size()
    }

    #[cfg(not(target_os = "linux"))]
    {
        anyhow::bail!("Display size detection is not supported on {}", get_platform_name())
    }
}

#[cfg(target_os = "linux")]
fn linux_display_size() -> Result<(u32, u32)> {
    use anyhow::Context;

    let output = std::process::Command::new("xdpyinfo")
        .output()
        .context("Failed to execute xdpyinfo")?;

    if !output.status.success() {
        anyhow::bail!("xdpyinfo failed: {}", String::from_utf8_lossy(&output.stderr).trim());
    }

    parse_xdpyinfo_dimensions(&String::from_utf8_lossy(&output.stdout))
        .context("xdpyinfo output has no screen dimensions")
}

/// Parse the first `dimensions:    1920x1080 pixels (...)` line
pub fn parse_xdpyinfo_dimensions(output: &str) -> Option<(u32, u32)> {
    output
        .lines()
        .filter(|line| line.trim_start().starts_with("dimensions:"))
        .find_map(|line| {
            let (w, h) = line.split_whitespace().nth(1)?.split_once('x')?;
            Some((w.parse().ok()?, h.parse().ok()?))
        })
}
