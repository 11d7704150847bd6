use std::env;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};

use crabrecorder::channel::{self, Response};
use crabrecorder::{audio, CrabRecorderConfig, SystemAudioService};

const USAGE: &str = "Usage: crabrecorder-cli <command> [args]

Commands:
  record [--seconds <n>]     Record until Ctrl-C (or for n seconds)
  list [--json]              List recordings in the cache directory
  play <path>                Play a recording until it ends or Ctrl-C
  devices [--json]           List input and output devices
  permission                 Show microphone permission status
  call <method> [json-args]  Invoke a method on the audio_recorder channel";

fn main() -> Result<()> {
    crabrecorder::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    let config = CrabRecorderConfig::load_or_default();
    let mut service = SystemAudioService::system(&config, None);
    let interrupted = interrupt_channel()?;

    let result = match args[1].as_str() {
        "record" => cmd_record(&mut service, &args, &interrupted),
        "list" => cmd_list(&service, &args),
        "play" => cmd_play(&mut service, &args, &interrupted),
        "devices" => cmd_devices(&args),
        "permission" => cmd_permission(&service),
        "call" => cmd_call(&mut service, &args),
        other => {
            eprintln!("Unknown command: {}\n\n{}", other, USAGE);
            std::process::exit(1);
        }
    };

    service.shutdown();
    result
}

fn interrupt_channel() -> Result<Receiver<()>> {
    let (tx, rx) = bounded(1);
    ctrlc::set_handler(move || {
        let _ = tx.try_send(());
    })
    .context("Failed to install Ctrl-C handler")?;
    Ok(rx)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn cmd_record(
    service: &mut SystemAudioService,
    args: &[String],
    interrupted: &Receiver<()>,
) -> Result<()> {
    let seconds = flag_value(args, "--seconds")
        .map(|v| v.parse::<u64>())
        .transpose()
        .context("--seconds expects a whole number")?;

    println!("{}", service.start_recording()?);
    if let Some(path) = service.recording_session().map(|s| s.output_path().to_path_buf()) {
        println!("Writing {}", path.display());
    }

    match seconds {
        Some(secs) => match interrupted.recv_timeout(Duration::from_secs(secs)) {
            Ok(()) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => bail!("Interrupt handler dropped"),
        },
        None => {
            println!("Press Ctrl-C to stop");
            interrupted
                .recv()
                .map_err(|_| anyhow!("Interrupt handler dropped"))?;
        }
    }

    println!("{}", service.stop_recording());
    Ok(())
}

fn cmd_list(service: &SystemAudioService, args: &[String]) -> Result<()> {
    let recordings: Vec<String> = service
        .get_recordings()
        .into_iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();

    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string(&recordings)?);
    } else if recordings.is_empty() {
        println!("No recordings in {}", service.store().directory().display());
    } else {
        for path in recordings {
            println!("{}", path);
        }
    }
    Ok(())
}

fn cmd_play(
    service: &mut SystemAudioService,
    args: &[String],
    interrupted: &Receiver<()>,
) -> Result<()> {
    let path = args.get(2).map(String::as_str);
    println!("{}", service.play_recording(path)?);

    while service.is_playing() {
        match interrupted.recv_timeout(Duration::from_millis(100)) {
            Ok(()) => break,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => bail!("Interrupt handler dropped"),
        }
    }

    println!("{}", service.stop_playback());
    Ok(())
}

fn cmd_devices(args: &[String]) -> Result<()> {
    let inputs = audio::list_input_devices()?;
    let outputs = audio::list_output_devices()?;

    if args.iter().any(|a| a == "--json") {
        let json = serde_json::json!({ "inputs": inputs, "outputs": outputs });
        println!("{}", serde_json::to_string(&json)?);
        return Ok(());
    }

    println!("Inputs:");
    for d in inputs {
        let marker = if d.is_default { "*" } else { " " };
        println!("{} {}: {} ({} Hz, {} ch)", marker, d.id, d.name, d.sample_rate, d.channels);
    }
    println!("Outputs:");
    for d in outputs {
        let marker = if d.is_default { "*" } else { " " };
        println!("{} {}: {} ({} Hz, {} ch)", marker, d.id, d.name, d.sample_rate, d.channels);
    }
    Ok(())
}

fn cmd_permission(service: &SystemAudioService) -> Result<()> {
    let info = service.permission_status();
    println!("{}: {}", info.status, info.message);
    Ok(())
}

fn cmd_call(service: &mut SystemAudioService, args: &[String]) -> Result<()> {
    let method = args
        .get(2)
        .ok_or_else(|| anyhow!("Usage: crabrecorder-cli call <method> [json-args]"))?;
    let call_args = match args.get(3) {
        Some(raw) => serde_json::from_str(raw).context("Arguments must be a JSON object")?,
        None => serde_json::Value::Null,
    };

    let response = channel::handle(service, method, &call_args);
    println!("{}", serde_json::to_string(&response)?);
    if let Response::Error(e) = response {
        bail!(e);
    }
    Ok(())
}
