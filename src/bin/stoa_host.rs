//=========================================================================
// stoa_host
//
// Demo host: one window, one browser.
//
// Environment:
// - STOA_CHROMIUM_AUTOSTART_URL    page loaded at start-up
// - STOA_CHROMIUM_DUMP_FRAME_PATH  first frame written here as PNG
// - STOA_CEF_LOG_PATH, STOA_CEF_ALLOW_KEYCHAIN, STOA_CHROMIUM_DEBUG
//   (see `Settings::apply_env`)
//
//=========================================================================

use std::env;
use std::process::ExitCode;

use stoa_bridge::config::{Settings, ENV_AUTOSTART_URL, ENV_DUMP_FRAME_PATH};
use stoa_bridge::engine::ProcessRole;
use stoa_bridge::{runtime, HostBuilder};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    //--- Helper processes exit here --------------------------------------
    if let ProcessRole::Helper(code) = runtime::execute_process(&args) {
        std::process::exit(code);
    }

    let settings = Settings::builder().with_args(args).apply_env().build();

    let mut host = HostBuilder::new();
    if let Some(url) = env::var(ENV_AUTOSTART_URL).ok().filter(|u| !u.is_empty()) {
        host = host.with_url(url);
    }
    if let Some(path) = env::var_os(ENV_DUMP_FRAME_PATH).filter(|p| !p.is_empty()) {
        host = host.with_dump_path(path);
    }

    match host.build().run(&settings) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!(target: "host", "stoa_host failed: {}", e);
            eprintln!("stoa_host: {}", e);
            ExitCode::FAILURE
        }
    }
}
