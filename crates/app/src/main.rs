//! Entry point for the globe viewer.

use std::path::PathBuf;

use anyhow::Result;
use platform::ViewerConfig;

fn parse_backend_arg(args: &[String]) -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all();
    for arg in args {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{other}', falling back to auto.");
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_bool_flag(args: &[String], name: &str) -> Option<bool> {
    let mut out = None;
    for arg in args {
        let Some(rest) = arg.strip_prefix("--").and_then(|a| a.strip_prefix(name)) else {
            continue;
        };
        if rest.is_empty() {
            out = Some(true);
        } else if let Some(val) = rest.strip_prefix('=') {
            match val.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => out = Some(true),
                "0" | "false" | "off" | "no" => out = Some(false),
                _ => log::warn!("Ignoring --{name}={val}: expected on or off"),
            }
        }
    }
    out
}

fn parse_size_args(args: &[String]) -> (u32, u32) {
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in args {
        if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    w = Some(pw);
                    h = Some(ph);
                }
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            w = v.parse().ok().or(w);
        } else if let Some(v) = arg.strip_prefix("--height=") {
            h = v.parse().ok().or(h);
        }
    }

    (w.unwrap_or(1280).max(1), h.unwrap_or(720).max(1))
}

/// Last `--name=value` parsed as f64; unparsable values are reported and skipped.
fn parse_f64_arg(args: &[String], name: &str) -> Option<f64> {
    let prefix = format!("--{name}=");
    let mut out = None;
    for arg in args {
        if let Some(v) = arg.strip_prefix(&prefix) {
            match v.parse::<f64>() {
                Ok(x) if x.is_finite() => out = Some(x),
                _ => log::warn!("Ignoring --{name}={v}: not a number"),
            }
        }
    }
    out
}

fn parse_background_arg(args: &[String]) -> corelib::CoreResult<Option<[f32; 3]>> {
    let Some(tok) = args.iter().rev().find_map(|a| a.strip_prefix("--bg=")) else {
        return Ok(None);
    };
    let [r, g, b, _] = corelib::parse_hex_color(tok)?;
    Ok(Some([r, g, b]))
}

/// `value` when `valid` accepts it, otherwise a warning and `None`.
fn checked_arg(name: &str, value: Option<f64>, valid: impl Fn(f64) -> bool, expected: &str) -> Option<f64> {
    let v = value?;
    if valid(v) {
        Some(v)
    } else {
        log::warn!("Ignoring --{name}={v}: expected {expected}");
        None
    }
}

fn parse_config(args: &[String]) -> ViewerConfig {
    let defaults = ViewerConfig::default();
    let (width, height) = parse_size_args(args);
    let texture = args
        .iter()
        .rev()
        .find_map(|a| a.strip_prefix("--texture="))
        .map(PathBuf::from);

    let background = match parse_background_arg(args) {
        Ok(bg) => bg.unwrap_or(defaults.background),
        Err(err) => {
            log::warn!("Ignoring --bg: {err}");
            defaults.background
        }
    };

    ViewerConfig {
        backends: parse_backend_arg(args),
        width,
        height,
        texture,
        background,
        show_axes: parse_bool_flag(args, "axes").unwrap_or(defaults.show_axes),
        lon_deg: parse_f64_arg(args, "lon").unwrap_or(defaults.lon_deg),
        lat_deg: parse_f64_arg(args, "lat")
            .map(|lat| lat.clamp(-90.0, 90.0))
            .unwrap_or(defaults.lat_deg),
        dist: checked_arg("dist", parse_f64_arg(args, "dist"), |d| d > 0.0, "a positive distance")
            .unwrap_or(defaults.dist),
        fov_deg: checked_arg("fov", parse_f64_arg(args, "fov"), |f| f > 0.0 && f < 180.0, "0 < fov < 180")
            .unwrap_or(defaults.fov_deg),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = parse_config(&args);
    log::info!(
        "Starting globe viewer. Backend: {:?}, window_size={}x{}, texture={:?}, axes={}",
        config.backends,
        config.width,
        config.height,
        config.texture,
        config.show_axes
    );

    platform::run_viewer(config)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_without_flags() {
        let cfg = parse_config(&[]);
        assert_eq!((cfg.width, cfg.height), (1280, 720));
        assert_eq!(cfg.background, [0.0, 0.0, 0.0]);
        assert!(!cfg.show_axes);
        assert!(cfg.texture.is_none());
        assert_eq!(cfg.dist, 10.0);
        assert_eq!(cfg.fov_deg, 30.0);
    }

    #[test]
    fn flags_fill_the_config() {
        let cfg = parse_config(&args(&[
            "--size=800x600",
            "--bg=#336699",
            "--axes",
            "--lon=-45.5",
            "--lat=120",
            "--texture=earth.png",
            "--gpu-backend=vk",
        ]));
        assert_eq!((cfg.width, cfg.height), (800, 600));
        assert_eq!(cfg.background, [0.2, 0.4, 0.6]);
        assert!(cfg.show_axes);
        assert_eq!(cfg.lon_deg, -45.5);
        assert_eq!(cfg.lat_deg, 90.0);
        assert_eq!(cfg.texture, Some(PathBuf::from("earth.png")));
        assert_eq!(cfg.backends, wgpu::Backends::VULKAN);
    }

    #[test]
    fn axes_can_be_switched_off_and_bad_numbers_ignored() {
        let cfg = parse_config(&args(&["--axes=off", "--dist=abc", "--fov=0"]));
        assert!(!cfg.show_axes);
        assert_eq!(cfg.dist, 10.0);
        assert_eq!(cfg.fov_deg, 30.0);

        let cfg = parse_config(&args(&["--dist=-3", "--fov=200"]));
        assert_eq!(cfg.dist, 10.0);
        assert_eq!(cfg.fov_deg, 30.0);
    }

    #[test]
    fn unrecognized_axes_value_keeps_earlier_setting() {
        assert!(parse_config(&args(&["--axes", "--axes=maybe"])).show_axes);
        assert!(!parse_config(&args(&["--axes=maybe"])).show_axes);
    }

    #[test]
    fn malformed_background_falls_back_to_default() {
        for bad in ["--bg=blue", "--bg=336699", "--bg=#33669"] {
            let cfg = parse_config(&args(&[bad, "--size=640x480"]));
            assert_eq!(cfg.background, [0.0, 0.0, 0.0], "{bad}");
            assert_eq!((cfg.width, cfg.height), (640, 480));
        }
    }
}
